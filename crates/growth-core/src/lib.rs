//! growth-core: foundation types for growth-curve preprocessing
//!
//! A [`Table`] of named numeric series indexed by [`RowKey`], and the
//! [`PrepError`] type shared by every transform.

pub mod error;
pub mod stats;
pub mod table;

pub use error::{PrepError, PrepResult};
pub use stats::SeriesStats;
pub use table::{Column, RowKey, Table};
