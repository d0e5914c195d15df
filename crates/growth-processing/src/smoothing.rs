//! Savitzky-Golay smoothing of table columns

use crate::lstsq::{factorial, polyval_deriv, PolynomialFit};
use crate::transform::{TableTransform, TransformKind, TransformTimer};
use growth_core::{empty_input, invalid_parameter, PrepError, PrepResult, Table};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Suffix of smoothed output columns
pub const SMOOTHED_SUFFIX: &str = "_ftrd";

/// How the filter window is completed near the ends of a series
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum BoundaryMode {
    /// Fit a polynomial to the first/last window and evaluate it at the edge samples
    #[default]
    Interp,
    /// Reflect about the edge sample, which is not repeated
    Mirror,
    /// Repeat the edge sample
    Nearest,
    /// Continue from the opposite end
    Wrap,
    /// Pad with a constant
    Constant { cval: f64 },
}

/// Smoothing filter parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmoothingConfig {
    /// Number of samples in the fitting window (odd)
    pub window_length: usize,
    /// Order of the fitted polynomial, less than `window_length`
    pub polyorder: usize,
    /// Derivative order to evaluate (0 smooths the values themselves)
    #[serde(default)]
    pub deriv: usize,
    /// Sample spacing, only used when `deriv > 0`
    #[serde(default = "default_delta")]
    pub delta: f64,
    #[serde(default)]
    pub mode: BoundaryMode,
}

fn default_delta() -> f64 {
    1.0
}

impl SmoothingConfig {
    /// Smoothing configuration with default derivative, spacing and boundary mode
    pub fn new(window_length: usize, polyorder: usize) -> Self {
        Self {
            window_length,
            polyorder,
            deriv: 0,
            delta: 1.0,
            mode: BoundaryMode::Interp,
        }
    }

    /// Evaluate a derivative instead of the smoothed values
    pub fn with_derivative(mut self, deriv: usize, delta: f64) -> Self {
        self.deriv = deriv;
        self.delta = delta;
        self
    }

    pub fn with_mode(mut self, mode: BoundaryMode) -> Self {
        self.mode = mode;
        self
    }

    /// Check the parameters on their own
    pub fn validate(&self) -> PrepResult<()> {
        if self.window_length == 0 || self.window_length % 2 == 0 {
            return Err(invalid_parameter!(
                "window_length",
                "must be a positive odd integer, got {}",
                self.window_length
            ));
        }
        if self.polyorder >= self.window_length {
            return Err(invalid_parameter!(
                "polyorder",
                "must be less than window_length ({}), got {}",
                self.window_length,
                self.polyorder
            ));
        }
        if self.deriv > self.polyorder {
            return Err(invalid_parameter!(
                "deriv",
                "must not exceed polyorder ({}), got {}",
                self.polyorder,
                self.deriv
            ));
        }
        if !(self.delta.is_finite() && self.delta > 0.0) {
            return Err(invalid_parameter!(
                "delta",
                "must be a positive finite number, got {}",
                self.delta
            ));
        }
        Ok(())
    }

    /// Check the parameters against a series of `len` samples
    pub fn validate_for_len(&self, len: usize) -> PrepResult<()> {
        self.validate()?;
        if self.window_length > len {
            return Err(invalid_parameter!(
                "window_length",
                "{} exceeds series length {}",
                self.window_length,
                len
            ));
        }
        Ok(())
    }
}

/// Filter coefficients for one window
///
/// `coeffs[j]` multiplies the sample at offset `j - window_length / 2` from
/// the output position.
pub fn savgol_coeffs(config: &SmoothingConfig) -> PrepResult<Vec<f64>> {
    config.validate()?;

    let half = (config.window_length / 2) as f64;
    let x: Vec<f64> = (0..config.window_length).map(|i| i as f64 - half).collect();
    let fit = PolynomialFit::new(&x, config.polyorder)?;

    let scale = factorial(config.deriv) / config.delta.powi(config.deriv as i32);
    Ok(fit.pinv().row(config.deriv).iter().map(|c| c * scale).collect())
}

/// Apply the smoothing filter to one series
pub fn savgol_filter(series: &[f64], config: &SmoothingConfig) -> PrepResult<Vec<f64>> {
    config.validate_for_len(series.len())?;

    let n = series.len();
    let half = config.window_length / 2;
    let coeffs = savgol_coeffs(config)?;

    let mut output = vec![0.0; n];
    match config.mode {
        BoundaryMode::Interp => {
            for i in half..n - half {
                output[i] = dot(&coeffs, &series[i - half..=i + half]);
            }
            if half > 0 {
                interpolate_edges(series, config, &mut output)?;
            }
        }
        mode => {
            for (i, out) in output.iter_mut().enumerate() {
                *out = coeffs
                    .iter()
                    .enumerate()
                    .map(|(j, c)| c * padded_sample(series, i as isize + j as isize - half as isize, mode))
                    .sum();
            }
        }
    }

    Ok(output)
}

fn dot(coeffs: &[f64], window: &[f64]) -> f64 {
    coeffs.iter().zip(window).map(|(c, x)| c * x).sum()
}

/// Sample of the series extended past its ends according to `mode`
fn padded_sample(series: &[f64], k: isize, mode: BoundaryMode) -> f64 {
    let n = series.len() as isize;
    if (0..n).contains(&k) {
        return series[k as usize];
    }

    match mode {
        BoundaryMode::Mirror => {
            let idx = if k < 0 { -k } else { 2 * (n - 1) - k };
            series[idx.clamp(0, n - 1) as usize]
        }
        BoundaryMode::Nearest => series[k.clamp(0, n - 1) as usize],
        BoundaryMode::Wrap => series[k.rem_euclid(n) as usize],
        BoundaryMode::Constant { cval } => cval,
        // Interior-only path never pads
        BoundaryMode::Interp => series[k.clamp(0, n - 1) as usize],
    }
}

/// Fill the first and last `window_length / 2` outputs from polynomials
/// fitted to the first and last full windows.
fn interpolate_edges(series: &[f64], config: &SmoothingConfig, output: &mut [f64]) -> PrepResult<()> {
    let n = series.len();
    let w = config.window_length;
    let half = w / 2;

    let t: Vec<f64> = (0..w).map(|i| i as f64).collect();
    let fit = PolynomialFit::new(&t, config.polyorder)?;
    let scale = config.delta.powi(config.deriv as i32);

    let head = fit.coefficients(&series[..w]);
    for (i, out) in output.iter_mut().enumerate().take(half) {
        *out = polyval_deriv(&head, i as f64, config.deriv) / scale;
    }

    let start = n - w;
    let tail = fit.coefficients(&series[start..]);
    for (i, out) in output.iter_mut().enumerate().skip(n - half) {
        *out = polyval_deriv(&tail, (i - start) as f64, config.deriv) / scale;
    }

    Ok(())
}

/// Smooth every column of `table`, producing `<name>_ftrd` columns
pub fn smooth(table: &Table, config: &SmoothingConfig) -> PrepResult<Table> {
    let timer = TransformTimer::start("smooth");

    if table.n_columns() == 0 {
        return Err(empty_input!("table has no columns to smooth"));
    }
    if table.n_rows() == 0 {
        return Err(empty_input!("table has no rows to smooth"));
    }
    config.validate_for_len(table.n_rows())?;

    debug!(
        rows = table.n_rows(),
        columns = table.n_columns(),
        window_length = config.window_length,
        polyorder = config.polyorder,
        deriv = config.deriv,
        mode = ?config.mode,
        "smoothing table"
    );

    let output = table.map_columns(SMOOTHED_SUFFIX, |column| {
        trace!(column = %column.name, "smoothing column");
        savgol_filter(&column.values, config)
    })?;

    timer.finish(&output);
    Ok(output)
}

/// [`TableTransform`] wrapper around [`smooth`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Smoother {
    config: SmoothingConfig,
}

impl Smoother {
    pub fn new(config: SmoothingConfig) -> PrepResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SmoothingConfig {
        &self.config
    }
}

impl TableTransform for Smoother {
    fn apply(&self, input: &Table) -> PrepResult<Table> {
        smooth(input, &self.config)
    }

    fn name(&self) -> &str {
        "Savitzky-Golay Smoother"
    }

    fn kind(&self) -> TransformKind {
        TransformKind::Smoothing
    }

    fn column_suffix(&self) -> Option<&'static str> {
        Some(SMOOTHED_SUFFIX)
    }
}

impl TryFrom<SmoothingConfig> for Smoother {
    type Error = PrepError;

    fn try_from(config: SmoothingConfig) -> PrepResult<Self> {
        Smoother::new(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use growth_core::{Column, RowKey};

    const SCIPY_INPUT: [f64; 9] = [2.0, 2.0, 5.0, 2.0, 1.0, 0.0, 1.0, 4.0, 9.0];

    fn assert_series_eq(actual: &[f64], expected: &[f64], epsilon: f64) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert_abs_diff_eq!(*a, *e, epsilon = epsilon);
        }
    }

    #[test]
    fn test_coefficients_window5_order2() {
        let coeffs = savgol_coeffs(&SmoothingConfig::new(5, 2)).unwrap();
        let expected: Vec<f64> = [-3.0, 12.0, 17.0, 12.0, -3.0].iter().map(|c| c / 35.0).collect();
        assert_series_eq(&coeffs, &expected, 1e-12);
    }

    #[test]
    fn test_interp_mode() {
        let output = savgol_filter(&SCIPY_INPUT, &SmoothingConfig::new(5, 2)).unwrap();
        assert_series_eq(
            &output,
            &[1.65714286, 3.17142857, 3.54285714, 2.85714286, 0.65714286, 0.17142857, 1.0, 4.0, 9.0],
            1e-7,
        );
    }

    #[test]
    fn test_nearest_mode() {
        let config = SmoothingConfig::new(5, 2).with_mode(BoundaryMode::Nearest);
        let output = savgol_filter(&SCIPY_INPUT, &config).unwrap();
        assert_series_eq(
            &output,
            &[1.74285714, 3.02857143, 3.54285714, 2.85714286, 0.65714286, 0.17142857, 1.0, 4.6, 7.97142857],
            1e-7,
        );
    }

    #[test]
    fn test_other_boundary_modes_first_sample() {
        let first = |mode| savgol_filter(&SCIPY_INPUT, &SmoothingConfig::new(5, 2).with_mode(mode)).unwrap()[0];

        // Padded windows: mirror [5,2,2,2,5], wrap [4,9,2,2,5], constant [0,0,2,2,5]
        assert_abs_diff_eq!(first(BoundaryMode::Mirror), 52.0 / 35.0, epsilon = 1e-12);
        assert_abs_diff_eq!(first(BoundaryMode::Wrap), 139.0 / 35.0, epsilon = 1e-12);
        assert_abs_diff_eq!(first(BoundaryMode::Constant { cval: 0.0 }), 43.0 / 35.0, epsilon = 1e-12);
    }

    #[test]
    fn test_other_boundary_modes_last_samples() {
        let tail = |mode| {
            let output = savgol_filter(&SCIPY_INPUT, &SmoothingConfig::new(5, 2).with_mode(mode)).unwrap();
            [output[7], output[8]]
        };

        // mirror [0,1,4,9,4] and [1,4,9,4,1]
        let mirror = tail(BoundaryMode::Mirror);
        assert_abs_diff_eq!(mirror[0], 176.0 / 35.0, epsilon = 1e-12);
        assert_abs_diff_eq!(mirror[1], 243.0 / 35.0, epsilon = 1e-12);

        // wrap [0,1,4,9,2] and [1,4,9,2,2]
        let wrap = tail(BoundaryMode::Wrap);
        assert_abs_diff_eq!(wrap[0], 182.0 / 35.0, epsilon = 1e-12);
        assert_abs_diff_eq!(wrap[1], 216.0 / 35.0, epsilon = 1e-12);

        // constant [0,1,4,9,0] and [1,4,9,0,0]
        let constant = tail(BoundaryMode::Constant { cval: 0.0 });
        assert_abs_diff_eq!(constant[0], 188.0 / 35.0, epsilon = 1e-12);
        assert_abs_diff_eq!(constant[1], 198.0 / 35.0, epsilon = 1e-12);
    }

    #[test]
    fn test_window_spanning_whole_series() {
        let series = [2.0, 2.0, 5.0, 2.0, 1.0];
        let config = SmoothingConfig::new(5, 2);
        assert!(config.validate_for_len(series.len()).is_ok());

        // A single quadratic fitted to all five samples
        let output = savgol_filter(&series, &config).unwrap();
        let expected = [58.0 / 35.0, 111.0 / 35.0, 124.0 / 35.0, 97.0 / 35.0, 30.0 / 35.0];
        assert_series_eq(&output, &expected, 1e-10);

        for mode in [BoundaryMode::Mirror, BoundaryMode::Nearest, BoundaryMode::Wrap] {
            let padded = savgol_filter(&series, &config.clone().with_mode(mode)).unwrap();
            assert_eq!(padded.len(), series.len());
            assert_abs_diff_eq!(padded[2], 124.0 / 35.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_linear_series_is_reproduced() {
        let output = savgol_filter(&[1.0, 2.0, 3.0, 4.0], &SmoothingConfig::new(3, 1)).unwrap();
        assert_series_eq(&output, &[1.0, 2.0, 3.0, 4.0], 1e-12);
    }

    #[test]
    fn test_derivative_uses_delta() {
        let series: Vec<f64> = (0..11).map(|i| 3.0 * i as f64 + 1.0).collect();
        let config = SmoothingConfig::new(5, 2).with_derivative(1, 0.5);
        let output = savgol_filter(&series, &config).unwrap();
        for v in output {
            assert_abs_diff_eq!(v, 6.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_window_of_one_is_identity() {
        let output = savgol_filter(&SCIPY_INPUT, &SmoothingConfig::new(1, 0)).unwrap();
        assert_series_eq(&output, &SCIPY_INPUT, 1e-12);
    }

    #[test]
    fn test_parameter_validation() {
        let invalid = |config: SmoothingConfig| {
            matches!(
                savgol_filter(&SCIPY_INPUT, &config),
                Err(PrepError::InvalidParameter { .. })
            )
        };

        assert!(invalid(SmoothingConfig::new(4, 2)));
        assert!(invalid(SmoothingConfig::new(0, 0)));
        assert!(invalid(SmoothingConfig::new(5, 5)));
        assert!(invalid(SmoothingConfig::new(11, 2)));
        assert!(invalid(SmoothingConfig::new(5, 2).with_derivative(3, 1.0)));
        assert!(invalid(SmoothingConfig::new(5, 2).with_derivative(1, 0.0)));
        assert!(invalid(SmoothingConfig::new(5, 2).with_derivative(1, f64::NAN)));
    }

    #[test]
    fn test_smooth_table() {
        let table = Table::from_columns(vec![
            Column::new("A", vec![1.0, 2.0, 3.0, 4.0]),
            Column::new("B", vec![5.0, 6.0, 7.0, 8.0]),
            Column::new("C", vec![10.0, 11.0, 12.0, 13.0]),
        ])
        .unwrap();

        let smoothed = smooth(&table, &SmoothingConfig::new(3, 1)).unwrap();

        assert_eq!(smoothed.row_keys(), table.row_keys());
        assert_eq!(smoothed.column_names(), vec!["A_ftrd", "B_ftrd", "C_ftrd"]);
        assert_series_eq(smoothed.column("B_ftrd").unwrap(), &[5.0, 6.0, 7.0, 8.0], 1e-12);
        assert_series_eq(smoothed.column("C_ftrd").unwrap(), &[10.0, 11.0, 12.0, 13.0], 1e-12);
    }

    #[test]
    fn test_smooth_empty_inputs() {
        let no_columns = Table::with_row_keys(vec![RowKey::Index(0)]);
        assert!(matches!(
            smooth(&no_columns, &SmoothingConfig::new(1, 0)),
            Err(PrepError::EmptyInput { .. })
        ));

        let no_rows = Table::new(vec![], vec![Column::new("A", vec![])]).unwrap();
        assert!(matches!(
            smooth(&no_rows, &SmoothingConfig::new(1, 0)),
            Err(PrepError::EmptyInput { .. })
        ));
    }

    #[test]
    fn test_smoother_transform() {
        let smoother = Smoother::new(SmoothingConfig::new(3, 1)).unwrap();
        assert_eq!(smoother.kind(), TransformKind::Smoothing);
        assert_eq!(smoother.column_suffix(), Some("_ftrd"));
        assert!(Smoother::try_from(SmoothingConfig::new(2, 1)).is_err());

        let table = Table::from_columns(vec![Column::new("A", vec![1.0, 5.0, 1.0, 5.0, 1.0])]).unwrap();
        let output = smoother.apply(&table).unwrap();
        assert_eq!(output.column_names(), vec!["A_ftrd"]);
    }

    #[test]
    fn test_config_json() {
        let config = SmoothingConfig::new(7, 3).with_mode(BoundaryMode::Constant { cval: 1.5 });
        let json = serde_json::to_string(&config).unwrap();
        let back: SmoothingConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);

        let minimal: SmoothingConfig = serde_json::from_str(r#"{"window_length":5,"polyorder":2}"#).unwrap();
        assert_eq!(minimal, SmoothingConfig::new(5, 2));
    }
}
