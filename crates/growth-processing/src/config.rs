//! Configuration bundle for the preprocessing transforms

use crate::baseline::BaselineConfig;
use crate::labels::LabelPolicy;
use crate::peaks::{PeakConfig, ValueRange};
use crate::smoothing::{BoundaryMode, SmoothingConfig};
use growth_core::{PrepError, PrepResult};
use serde::{Deserialize, Serialize};

/// Parameters for every transform, as a caller would keep them in one file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Configuration name/profile
    pub name: String,
    pub smoothing: SmoothingConfig,
    #[serde(default)]
    pub baseline: BaselineConfig,
    #[serde(default)]
    pub peaks: PeakConfig,
    #[serde(default)]
    pub labels: LabelPolicy,
}

impl ProcessingConfig {
    /// Plate-reader growth curves: moderate smoothing, prominent peaks only
    pub fn growth_curve() -> Self {
        ProcessingConfig {
            name: "Growth curve".to_string(),
            smoothing: SmoothingConfig::new(11, 3),
            baseline: BaselineConfig::default(),
            peaks: PeakConfig::default()
                .with_distance(5)
                .with_prominence(ValueRange::at_least(0.05)),
            labels: LabelPolicy::Strict,
        }
    }

    /// Raw absorbance traces: heavier smoothing and mirrored edges
    pub fn raw_absorbance() -> Self {
        ProcessingConfig {
            name: "Raw absorbance".to_string(),
            smoothing: SmoothingConfig::new(21, 2).with_mode(BoundaryMode::Mirror),
            baseline: BaselineConfig::default(),
            peaks: PeakConfig::default()
                .with_height(ValueRange::at_least(0.0))
                .with_distance(10),
            labels: LabelPolicy::PassThrough,
        }
    }

    /// Validate every section
    pub fn validate(&self) -> PrepResult<()> {
        if self.name.is_empty() {
            return Err(PrepError::Configuration {
                message: "Configuration name cannot be empty".to_string(),
            });
        }

        self.smoothing.validate()?;
        self.baseline.validate()?;
        self.peaks.validate()?;
        Ok(())
    }

    /// Export configuration to JSON
    pub fn to_json(&self) -> PrepResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| PrepError::Configuration {
            message: format!("Failed to serialize configuration: {}", e),
        })
    }

    /// Import configuration from JSON and validate it
    pub fn from_json(json: &str) -> PrepResult<Self> {
        let config: ProcessingConfig = serde_json::from_str(json).map_err(|e| PrepError::Configuration {
            message: format!("Failed to deserialize configuration: {}", e),
        })?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self::growth_curve()
    }
}
