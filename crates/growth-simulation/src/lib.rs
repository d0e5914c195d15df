//! growth-simulation: synthetic growth-curve tables
//!
//! Seeded, reproducible data for tests and benchmarks of the preprocessing
//! transforms.

pub mod curve_patterns;
pub mod plate_simulator;

pub use curve_patterns::*;
pub use plate_simulator::*;
