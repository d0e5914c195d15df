//! Common trait and timing helper for table transforms

use growth_core::{PrepResult, Table};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

/// Stateless transform from one table to another
///
/// Implementations never mutate their input and hold only configuration,
/// so the same value can be applied to any number of tables.
pub trait TableTransform {
    /// Apply the transform, producing a new table
    fn apply(&self, input: &Table) -> PrepResult<Table>;

    /// Transform name for logging
    fn name(&self) -> &str;

    /// Which kind of transform this is
    fn kind(&self) -> TransformKind;

    /// Suffix appended to derived column names, if the transform renames columns
    fn column_suffix(&self) -> Option<&'static str> {
        None
    }
}

/// Kinds of transforms provided by this crate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransformKind {
    /// Savitzky-Golay smoothing
    Smoothing,
    /// Polynomial baseline subtraction
    BaselineCorrection,
    /// Row selection by detected peaks
    PeakFilter,
}

/// Helper for timing a transform call
pub struct TransformTimer {
    name: &'static str,
    start_time: Instant,
}

impl TransformTimer {
    /// Start timing the named transform
    pub fn start(name: &'static str) -> Self {
        Self {
            name,
            start_time: Instant::now(),
        }
    }

    /// Log the elapsed time together with the output shape, returning microseconds
    pub fn finish(self, output: &Table) -> u64 {
        let elapsed_us = self.start_time.elapsed().as_micros() as u64;
        debug!(
            transform = self.name,
            rows = output.n_rows(),
            columns = output.n_columns(),
            elapsed_us,
            "transform finished"
        );
        elapsed_us
    }
}
