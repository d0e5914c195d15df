//! Pre-defined curve shapes for synthetic growth data

use serde::{Deserialize, Serialize};

/// Noise-free curve shapes, evaluated at a time point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum CurvePattern {
    /// Flat signal
    Constant { level: f64 },
    /// Straight line
    Linear { intercept: f64, slope: f64 },
    /// Cubic polynomial, coefficients in increasing power
    Cubic { coefficients: [f64; 4] },
    /// Logistic growth from `floor` towards `floor + capacity`
    Logistic {
        floor: f64,
        capacity: f64,
        rate: f64,
        midpoint: f64,
    },
}

impl CurvePattern {
    /// Value at time `t`
    pub fn value_at(&self, t: f64) -> f64 {
        match self {
            CurvePattern::Constant { level } => *level,

            CurvePattern::Linear { intercept, slope } => intercept + slope * t,

            CurvePattern::Cubic { coefficients } => coefficients
                .iter()
                .rev()
                .fold(0.0, |acc, c| acc * t + c),

            CurvePattern::Logistic {
                floor,
                capacity,
                rate,
                midpoint,
            } => floor + capacity / (1.0 + (-rate * (t - midpoint)).exp()),
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            CurvePattern::Constant { .. } => "Constant level",
            CurvePattern::Linear { .. } => "Linear drift",
            CurvePattern::Cubic { .. } => "Cubic trend",
            CurvePattern::Logistic { .. } => "Logistic growth",
        }
    }

    /// Common shapes for plate-reader style data
    pub fn presets() -> Vec<(&'static str, CurvePattern)> {
        vec![
            ("Blank", CurvePattern::Constant { level: 0.05 }),
            (
                "Slow Drift",
                CurvePattern::Linear {
                    intercept: 0.05,
                    slope: 0.002,
                },
            ),
            (
                "Cubic Trend",
                CurvePattern::Cubic {
                    coefficients: [0.1, 0.02, -0.001, 0.00002],
                },
            ),
            (
                "Fast Growth",
                CurvePattern::Logistic {
                    floor: 0.05,
                    capacity: 1.2,
                    rate: 0.25,
                    midpoint: 20.0,
                },
            ),
            (
                "Slow Growth",
                CurvePattern::Logistic {
                    floor: 0.05,
                    capacity: 0.8,
                    rate: 0.08,
                    midpoint: 45.0,
                },
            ),
        ]
    }
}
