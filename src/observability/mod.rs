//! Observability module providing logging and metrics.
//!
//! This module initializes and configures:
//! - Structured logging with configurable formats (pretty, compact, JSON)
//! - Prometheus metrics for sweep runs and deletions
//! - The [`MetricsSink`] the sweeper reports into

pub mod metrics;
mod sink;
mod tracing_init;

#[cfg(test)]
pub use sink::RecordingSink;
pub use sink::{MetricsSink, NoopSink, PrometheusSink};
pub use tracing_init::*;
