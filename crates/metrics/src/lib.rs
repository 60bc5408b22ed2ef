//! Metrics collection and export for updraft.
//!
//! Metric names live in [`definitions`] so every crate records against the
//! same keys. Recording goes through the `metrics` facade, which is a no-op
//! until a recorder is installed with [`init_metrics`].
//!
//! # Features
//!
//! - `prometheus`: serve recorded metrics on an HTTP listener in Prometheus
//!   text format.

mod definitions;
mod error;
mod recorder;

pub use {
    definitions::*,
    error::{Error, Result},
    recorder::{MetricsRecorderConfig, init_metrics},
};

// Re-export metrics macros for convenience
pub use metrics::{counter, gauge, histogram};
