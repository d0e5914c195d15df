//! Polynomial least-squares fitting
//!
//! Both the Savitzky-Golay coefficients and the iterative baseline reduce to
//! fitting a low-order polynomial to a handful of abscissae. The design
//! matrix pseudo-inverse is computed once per abscissa set and reused.

use growth_core::{PrepError, PrepResult};
use nalgebra::{DMatrix, DVector};

/// Vandermonde matrix with increasing powers: `a[i][j] = x[i]^j`
pub fn vandermonde(x: &[f64], order: usize) -> DMatrix<f64> {
    DMatrix::from_fn(x.len(), order + 1, |i, j| x[i].powi(j as i32))
}

/// Least-squares polynomial fit over fixed abscissae
#[derive(Debug, Clone)]
pub struct PolynomialFit {
    design: DMatrix<f64>,
    pinv: DMatrix<f64>,
}

impl PolynomialFit {
    /// Prepare a fit of the given order over `x`
    pub fn new(x: &[f64], order: usize) -> PrepResult<Self> {
        if x.is_empty() {
            return Err(PrepError::Numerical {
                reason: "cannot fit a polynomial to zero points".to_string(),
            });
        }

        let design = vandermonde(x, order);
        let svd = design.clone().svd(true, true);

        // Same cutoff as the usual pinv rcond: singular values below
        // eps * max(rows, cols) * largest are treated as zero.
        let largest = svd.singular_values.max();
        let cutoff = f64::EPSILON * design.nrows().max(design.ncols()) as f64 * largest;

        let pinv = svd
            .pseudo_inverse(cutoff)
            .map_err(|e| PrepError::Numerical {
                reason: format!("pseudo-inverse failed: {}", e),
            })?;

        Ok(Self { design, pinv })
    }

    /// Number of abscissae
    pub fn len(&self) -> usize {
        self.design.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.design.nrows() == 0
    }

    /// Pseudo-inverse of the design matrix, `(order + 1) x len`
    pub fn pinv(&self) -> &DMatrix<f64> {
        &self.pinv
    }

    /// Polynomial coefficients (increasing powers) best fitting `y`
    pub fn coefficients(&self, y: &[f64]) -> DVector<f64> {
        &self.pinv * DVector::from_column_slice(y)
    }

    /// Fitted values at the abscissae
    pub fn evaluate(&self, coefficients: &DVector<f64>) -> DVector<f64> {
        &self.design * coefficients
    }
}

/// Evaluate the `deriv`-th derivative of a polynomial (increasing powers) at `t`
pub fn polyval_deriv(coefficients: &DVector<f64>, t: f64, deriv: usize) -> f64 {
    coefficients
        .iter()
        .enumerate()
        .skip(deriv)
        .map(|(power, &c)| {
            let falling: f64 = ((power - deriv + 1)..=power).map(|k| k as f64).product();
            c * falling * t.powi((power - deriv) as i32)
        })
        .sum()
}

/// `n!` as a float
pub fn factorial(n: usize) -> f64 {
    (1..=n).map(|k| k as f64).product()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_exact_quadratic_fit() {
        let x: Vec<f64> = (0..6).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|t| 2.0 - 3.0 * t + 0.5 * t * t).collect();

        let fit = PolynomialFit::new(&x, 2).unwrap();
        let coeffs = fit.coefficients(&y);

        assert_abs_diff_eq!(coeffs[0], 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(coeffs[1], -3.0, epsilon = 1e-9);
        assert_abs_diff_eq!(coeffs[2], 0.5, epsilon = 1e-9);

        let fitted = fit.evaluate(&coeffs);
        for (a, b) in fitted.iter().zip(&y) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_polyval_deriv() {
        // 1 + 2t + 3t^2
        let coeffs = DVector::from_vec(vec![1.0, 2.0, 3.0]);
        assert_abs_diff_eq!(polyval_deriv(&coeffs, 2.0, 0), 17.0);
        assert_abs_diff_eq!(polyval_deriv(&coeffs, 2.0, 1), 14.0);
        assert_abs_diff_eq!(polyval_deriv(&coeffs, 2.0, 2), 6.0);
        assert_abs_diff_eq!(polyval_deriv(&coeffs, 2.0, 3), 0.0);
    }

    #[test]
    fn test_degenerate_abscissae() {
        // All-zero abscissae: only the constant term is identifiable
        let fit = PolynomialFit::new(&[0.0, 0.0, 0.0, 0.0], 3).unwrap();
        let coeffs = fit.coefficients(&[1.0, 2.0, 3.0, 4.0]);
        let fitted = fit.evaluate(&coeffs);
        for v in fitted.iter() {
            assert_abs_diff_eq!(*v, 2.5, epsilon = 1e-9);
        }

        assert!(PolynomialFit::new(&[], 1).is_err());
        assert_eq!(factorial(0), 1.0);
        assert_eq!(factorial(4), 24.0);
    }
}
