//! Error handling for the growth-curve preprocessing workspace
//!
//! Every transform reports failures through [`PrepError`]. Errors are raised
//! synchronously at the offending call and never carry partial results.

use thiserror::Error;

/// Result type alias for preprocessing operations
pub type PrepResult<T> = Result<T, PrepError>;

/// Error type for all table and transform operations
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum PrepError {
    /// Table has no rows or no columns where some are required
    #[error("Empty input: {reason}")]
    EmptyInput {
        /// What was empty
        reason: String,
    },

    /// Parameter incompatible with the series length or shape
    #[error("Invalid parameter `{parameter}`: {reason}")]
    InvalidParameter {
        /// Parameter name as it appears in the configuration
        parameter: &'static str,
        /// Description of the violated constraint
        reason: String,
    },

    /// Value does not follow the expected textual pattern
    #[error("Invalid format for {value:?}: {reason}")]
    InvalidFormat {
        /// Offending value
        value: String,
        /// Expected pattern
        reason: &'static str,
    },

    /// Column length differs from the row-key count
    #[error("Column '{column}' has {actual} values, expected {expected}")]
    ShapeMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    /// Column name already present in the table
    #[error("Duplicate column '{name}'")]
    DuplicateColumn { name: String },

    /// Column name not present in the table
    #[error("Unknown column '{name}'")]
    UnknownColumn { name: String },

    /// Configuration could not be serialized or deserialized
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Least-squares solve failed
    #[error("Numerical failure: {reason}")]
    Numerical { reason: String },
}

impl PrepError {
    /// Short machine-friendly name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            PrepError::EmptyInput { .. } => "empty_input",
            PrepError::InvalidParameter { .. } => "invalid_parameter",
            PrepError::InvalidFormat { .. } => "invalid_format",
            PrepError::ShapeMismatch { .. } => "shape_mismatch",
            PrepError::DuplicateColumn { .. } => "duplicate_column",
            PrepError::UnknownColumn { .. } => "unknown_column",
            PrepError::Configuration { .. } => "configuration",
            PrepError::Numerical { .. } => "numerical",
        }
    }
}

/// Convenience macro for creating parameter errors
#[macro_export]
macro_rules! invalid_parameter {
    ($parameter:literal, $($arg:tt)+) => {
        $crate::error::PrepError::InvalidParameter {
            parameter: $parameter,
            reason: format!($($arg)+),
        }
    };
}

/// Convenience macro for creating empty-input errors
#[macro_export]
macro_rules! empty_input {
    ($($arg:tt)+) => {
        $crate::error::PrepError::EmptyInput {
            reason: format!($($arg)+),
        }
    };
}
