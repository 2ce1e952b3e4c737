//! Metrics for dmbridge over the `metrics` crate facade.
//!
//! Metric names live in [`definitions`]. Without the `prometheus` feature no
//! recorder is installed and every macro call is a no-op.

mod definitions;
mod recorder;

pub use {
    definitions::*,
    recorder::{MetricsRecorderConfig, init_metrics},
};

// Re-export metrics macros for convenience
pub use metrics::{counter, gauge, histogram};
