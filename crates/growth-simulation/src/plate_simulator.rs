//! Synthetic growth-curve tables with noise, drift and injected peaks

use crate::curve_patterns::CurvePattern;
use growth_core::{invalid_parameter, PrepError, PrepResult, RowKey, Table};
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

/// One simulated column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub pattern: CurvePattern,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, pattern: CurvePattern) -> Self {
        Self {
            name: name.into(),
            pattern,
        }
    }
}

/// Gaussian bump added on top of one column
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InjectedPeak {
    /// Index of the target column
    pub column: usize,
    /// Row position of the peak centre
    pub position: usize,
    pub amplitude: f64,
    /// Standard deviation of the bump, in rows
    pub width: f64,
}

/// Noise configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoiseConfig {
    /// Gaussian noise standard deviation (0.0 = no noise)
    pub gaussian_std: f64,
    /// Linear drift added per row to every column
    pub drift_per_row: f64,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            gaussian_std: 0.01,
            drift_per_row: 0.0,
        }
    }
}

/// Configuration for plate simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Number of rows (time points or samples)
    pub n_rows: usize,
    /// Time between consecutive rows
    pub time_step: f64,
    pub columns: Vec<ColumnSpec>,
    /// Labels cycled over rows as `<label>_<n>` keys; empty gives a `0..n` index
    pub row_labels: Vec<String>,
    pub noise: NoiseConfig,
    pub peaks: Vec<InjectedPeak>,
    /// Random seed for reproducibility
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            n_rows: 96,
            time_step: 1.0,
            columns: CurvePattern::presets()
                .into_iter()
                .map(|(name, pattern)| ColumnSpec::new(name, pattern))
                .collect(),
            row_labels: Vec::new(),
            noise: NoiseConfig::default(),
            peaks: Vec::new(),
            seed: 42,
        }
    }
}

impl SimulationConfig {
    /// Noise-free configuration with the given columns
    pub fn clean(n_rows: usize, columns: Vec<ColumnSpec>) -> Self {
        Self {
            n_rows,
            columns,
            noise: NoiseConfig {
                gaussian_std: 0.0,
                drift_per_row: 0.0,
            },
            ..Self::default()
        }
    }

    pub fn with_labels<S: Into<String>>(mut self, labels: impl IntoIterator<Item = S>) -> Self {
        self.row_labels = labels.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_peak(mut self, peak: InjectedPeak) -> Self {
        self.peaks.push(peak);
        self
    }

    pub fn with_noise(mut self, noise: NoiseConfig) -> Self {
        self.noise = noise;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> PrepResult<()> {
        if self.n_rows == 0 {
            return Err(invalid_parameter!("n_rows", "must be at least 1"));
        }
        if self.columns.is_empty() {
            return Err(invalid_parameter!("columns", "at least one column is required"));
        }
        if !(self.time_step.is_finite() && self.time_step > 0.0) {
            return Err(invalid_parameter!(
                "time_step",
                "must be a positive finite number, got {}",
                self.time_step
            ));
        }
        if !(self.noise.gaussian_std.is_finite() && self.noise.gaussian_std >= 0.0) {
            return Err(invalid_parameter!(
                "noise",
                "gaussian_std must be a non-negative finite number, got {}",
                self.noise.gaussian_std
            ));
        }
        if !self.noise.drift_per_row.is_finite() {
            return Err(invalid_parameter!(
                "noise",
                "drift_per_row must be finite, got {}",
                self.noise.drift_per_row
            ));
        }
        for peak in &self.peaks {
            if peak.column >= self.columns.len() {
                return Err(invalid_parameter!(
                    "peaks",
                    "column index {} out of range for {} columns",
                    peak.column,
                    self.columns.len()
                ));
            }
            if !(peak.width.is_finite() && peak.width > 0.0) {
                return Err(invalid_parameter!("peaks", "width must be positive, got {}", peak.width));
            }
        }
        Ok(())
    }
}

/// Seeded generator of synthetic tables
pub struct PlateSimulator {
    config: SimulationConfig,
    rng: rand::rngs::StdRng,
    normal_dist: Normal<f64>,
}

impl PlateSimulator {
    pub fn new(config: SimulationConfig) -> PrepResult<Self> {
        config.validate()?;

        let rng = rand::rngs::StdRng::seed_from_u64(config.seed);
        let normal_dist =
            Normal::new(0.0, config.noise.gaussian_std).map_err(|e| PrepError::Configuration {
                message: format!("Failed to create normal distribution: {}", e),
            })?;

        Ok(PlateSimulator {
            config,
            rng,
            normal_dist,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Row keys for the configured labels
    pub fn row_keys(&self) -> Vec<RowKey> {
        let labels = &self.config.row_labels;
        (0..self.config.n_rows)
            .map(|i| {
                if labels.is_empty() {
                    RowKey::Index(i as i64)
                } else {
                    let label = &labels[i % labels.len()];
                    RowKey::Label(format!("{}_{}", label, i / labels.len() + 1))
                }
            })
            .collect()
    }

    /// Generate one table; successive calls draw fresh noise
    pub fn generate(&mut self) -> PrepResult<Table> {
        let n = self.config.n_rows;
        let mut table = Table::with_row_keys(self.row_keys());

        for (column_idx, spec) in self.config.columns.iter().enumerate() {
            let mut values: Vec<f64> = (0..n)
                .map(|i| {
                    let t = i as f64 * self.config.time_step;
                    spec.pattern.value_at(t) + self.config.noise.drift_per_row * i as f64
                })
                .collect();

            for peak in self.config.peaks.iter().filter(|p| p.column == column_idx) {
                for (i, v) in values.iter_mut().enumerate() {
                    let z = (i as f64 - peak.position as f64) / peak.width;
                    *v += peak.amplitude * (-0.5 * z * z).exp();
                }
            }

            if self.config.noise.gaussian_std > 0.0 {
                for v in values.iter_mut() {
                    *v += self.normal_dist.sample(&mut self.rng);
                }
            }

            table.push_column(spec.name.clone(), values)?;
        }

        Ok(table)
    }
}
