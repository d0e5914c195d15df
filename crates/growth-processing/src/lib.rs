//! growth-processing: preprocessing transforms for growth curves
//!
//! Four independent, stateless transforms over a [`growth_core::Table`]:
//! Savitzky-Golay smoothing, polynomial baseline correction, peak-based row
//! filtering and label extraction from row keys. The caller decides the
//! order in which they are chained.

pub mod baseline;
pub mod config;
pub mod labels;
pub mod lstsq;
pub mod peaks;
pub mod smoothing;
pub mod transform;

pub use baseline::{
    correct_baseline, correct_baseline_with, estimate_baseline, BaselineConfig, BaselineCorrector,
    BASELINE_SUFFIX,
};
pub use config::ProcessingConfig;
pub use labels::{extract_labels, extract_labels_with, split_label, LabelPolicy};
pub use peaks::{
    filter_peaks, find_peaks, peak_indicators, peak_prominences, PeakConfig, PeakFilter,
    PeakIndicators, ValueRange, PEAK_SUFFIX,
};
pub use smoothing::{
    savgol_coeffs, savgol_filter, smooth, BoundaryMode, Smoother, SmoothingConfig, SMOOTHED_SUFFIX,
};
pub use transform::{TableTransform, TransformKind};
