//! Polynomial baseline estimation and subtraction
//!
//! The baseline is found iteratively: fit a polynomial, clamp the working
//! series down to the fit, refit, until the coefficients settle. Peaks rising
//! above the trend are progressively cut away so the fit converges to the
//! lower envelope of the series.

use crate::lstsq::PolynomialFit;
use crate::transform::{TableTransform, TransformKind, TransformTimer};
use growth_core::{empty_input, invalid_parameter, PrepResult, SeriesStats, Table};
use nalgebra::DVector;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

/// Suffix of baseline-corrected output columns
pub const BASELINE_SUFFIX: &str = "_bc";

/// Degree used by [`correct_baseline`]
pub const DEFAULT_BASELINE_DEGREE: usize = 3;

/// Iterative baseline fit parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaselineConfig {
    /// Degree of the baseline polynomial
    pub degree: usize,
    /// Upper bound on refit iterations
    pub max_iterations: usize,
    /// Relative coefficient change at which the fit is considered converged
    pub tolerance: f64,
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self {
            degree: DEFAULT_BASELINE_DEGREE,
            max_iterations: 100,
            tolerance: 1e-3,
        }
    }
}

impl BaselineConfig {
    pub fn with_degree(degree: usize) -> Self {
        Self {
            degree,
            ..Self::default()
        }
    }

    /// Fewest samples a series needs for this degree
    pub fn min_series_len(&self) -> usize {
        self.degree + 1
    }

    pub fn validate(&self) -> PrepResult<()> {
        if self.max_iterations == 0 {
            return Err(invalid_parameter!("max_iterations", "must be at least 1"));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(invalid_parameter!(
                "tolerance",
                "must be a positive finite number, got {}",
                self.tolerance
            ));
        }
        Ok(())
    }

    pub fn validate_for_len(&self, len: usize) -> PrepResult<()> {
        self.validate()?;
        if len < self.min_series_len() {
            return Err(invalid_parameter!(
                "degree",
                "a degree-{} baseline needs at least {} points, series has {}",
                self.degree,
                self.min_series_len(),
                len
            ));
        }
        Ok(())
    }
}

/// Estimate the baseline of one series
pub fn estimate_baseline(series: &[f64], config: &BaselineConfig) -> PrepResult<Vec<f64>> {
    config.validate_for_len(series.len())?;

    let n = series.len();
    let order = config.degree + 1;

    // Abscissa spans [0, max|y|^(1/order)] to keep the design matrix conditioned.
    let mut span = SeriesStats::calculate(series).max_abs().powf(1.0 / order as f64);
    if !(span.is_finite() && span > 0.0) {
        span = 1.0;
    }
    let step = if n > 1 { span / (n - 1) as f64 } else { 0.0 };
    let x: Vec<f64> = (0..n).map(|i| i as f64 * step).collect();

    let fit = PolynomialFit::new(&x, config.degree)?;

    let mut working = series.to_vec();
    let mut coefficients = DVector::from_element(order, 1.0);
    let mut baseline = working.clone();
    let mut converged = false;

    for iteration in 0..config.max_iterations {
        let next = fit.coefficients(&working);
        let reference = coefficients.norm();
        let change = (&next - &coefficients).norm();
        if change <= config.tolerance * reference {
            trace!(iteration, "baseline converged");
            converged = true;
            break;
        }

        coefficients = next;
        baseline = fit.evaluate(&coefficients).iter().copied().collect();
        for (w, b) in working.iter_mut().zip(&baseline) {
            *w = w.min(*b);
        }
    }

    if !converged {
        warn!(
            max_iterations = config.max_iterations,
            "baseline did not converge, using last fit"
        );
    }

    Ok(baseline)
}

/// Subtract a degree-3 baseline from every column, producing `<name>_bc` columns
pub fn correct_baseline(table: &Table) -> PrepResult<Table> {
    correct_baseline_with(table, &BaselineConfig::default())
}

/// Subtract a baseline with the given parameters from every column
pub fn correct_baseline_with(table: &Table, config: &BaselineConfig) -> PrepResult<Table> {
    let timer = TransformTimer::start("correct_baseline");

    if table.n_columns() == 0 {
        return Err(empty_input!("table has no columns to correct"));
    }
    if table.n_rows() == 0 {
        return Err(empty_input!("table has no rows to correct"));
    }
    config.validate_for_len(table.n_rows())?;

    debug!(
        rows = table.n_rows(),
        columns = table.n_columns(),
        degree = config.degree,
        "correcting baseline"
    );

    let output = table.map_columns(BASELINE_SUFFIX, |column| {
        trace!(column = %column.name, "fitting baseline");
        let baseline = estimate_baseline(&column.values, config)?;
        Ok(column
            .values
            .iter()
            .zip(&baseline)
            .map(|(v, b)| v - b)
            .collect())
    })?;

    timer.finish(&output);
    Ok(output)
}

/// [`TableTransform`] wrapper around [`correct_baseline_with`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BaselineCorrector {
    config: BaselineConfig,
}

impl BaselineCorrector {
    pub fn new(config: BaselineConfig) -> PrepResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &BaselineConfig {
        &self.config
    }
}

impl TableTransform for BaselineCorrector {
    fn apply(&self, input: &Table) -> PrepResult<Table> {
        correct_baseline_with(input, &self.config)
    }

    fn name(&self) -> &str {
        "Polynomial Baseline Corrector"
    }

    fn kind(&self) -> TransformKind {
        TransformKind::BaselineCorrection
    }

    fn column_suffix(&self) -> Option<&'static str> {
        Some(BASELINE_SUFFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use growth_core::{Column, PrepError, RowKey};

    #[test]
    fn test_cubic_is_removed() {
        let series: Vec<f64> = (0..40)
            .map(|i| {
                let t = i as f64 / 10.0;
                0.2 + 0.5 * t - 0.3 * t * t + 0.05 * t * t * t
            })
            .collect();

        let baseline = estimate_baseline(&series, &BaselineConfig::default()).unwrap();
        for (b, y) in baseline.iter().zip(&series) {
            assert_abs_diff_eq!(*b, *y, epsilon = 1e-8);
        }
    }

    #[test]
    fn test_linear_columns_correct_to_zero() {
        let table = Table::from_columns(vec![
            Column::new("A", vec![1.0, 2.0, 3.0, 4.0]),
            Column::new("B", vec![5.0, 6.0, 7.0, 8.0]),
            Column::new("C", vec![10.0, 11.0, 12.0, 13.0]),
        ])
        .unwrap();

        let corrected = correct_baseline(&table).unwrap();
        assert_eq!(corrected.column_names(), vec!["A_bc", "B_bc", "C_bc"]);
        assert_eq!(corrected.row_keys(), table.row_keys());
        for column in corrected.columns() {
            for v in &column.values {
                assert_abs_diff_eq!(*v, 0.0, epsilon = 1e-8);
            }
        }
    }

    #[test]
    fn test_peak_survives_correction() {
        let series: Vec<f64> = (0..100)
            .map(|i| {
                let t = i as f64;
                let drift = 1.0 + 0.02 * t;
                let peak = 10.0 * (-((t - 50.0) / 2.0).powi(2) / 2.0).exp();
                drift + peak
            })
            .collect();

        let baseline = estimate_baseline(&series, &BaselineConfig::default()).unwrap();
        let corrected: Vec<f64> = series.iter().zip(&baseline).map(|(y, b)| y - b).collect();

        assert!(corrected[50] > 8.0);
        assert!(corrected[5].abs() < 1.0);
        assert!(corrected[95].abs() < 1.0);
    }

    #[test]
    fn test_zero_series() {
        let baseline = estimate_baseline(&[0.0; 8], &BaselineConfig::default()).unwrap();
        assert!(baseline.iter().all(|b| b.abs() < 1e-12));
    }

    #[test]
    fn test_short_series_rejected() {
        let table = Table::from_columns(vec![Column::new("A", vec![1.0, 2.0, 3.0])]).unwrap();
        assert!(matches!(
            correct_baseline(&table),
            Err(PrepError::InvalidParameter { parameter: "degree", .. })
        ));

        let lower = BaselineConfig::with_degree(1);
        assert!(correct_baseline_with(&table, &lower).is_ok());
    }

    #[test]
    fn test_empty_inputs() {
        let no_columns = Table::with_row_keys(vec![RowKey::Index(0); 4]);
        assert!(matches!(correct_baseline(&no_columns), Err(PrepError::EmptyInput { .. })));

        let no_rows = Table::new(vec![], vec![Column::new("A", vec![])]).unwrap();
        assert!(matches!(correct_baseline(&no_rows), Err(PrepError::EmptyInput { .. })));
    }

    #[test]
    fn test_config_validation() {
        let mut config = BaselineConfig::default();
        assert!(config.validate().is_ok());

        config.max_iterations = 0;
        assert!(config.validate().is_err());

        config.max_iterations = 10;
        config.tolerance = -1.0;
        assert!(BaselineCorrector::new(config).is_err());
    }

    #[test]
    fn test_deterministic() {
        let series: Vec<f64> = (0..30).map(|i| ((i as f64) * 0.7).sin() + 0.1 * i as f64).collect();
        let config = BaselineConfig::default();
        assert_eq!(
            estimate_baseline(&series, &config).unwrap(),
            estimate_baseline(&series, &config).unwrap()
        );
    }
}
