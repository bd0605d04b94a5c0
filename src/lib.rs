//! Scheduled retention maintenance for Elasticsearch indices.
//!
//! For each configured name prefix the newest indices are kept and the rest
//! are deleted, oldest first. Health and Prometheus metrics are served over
//! HTTP while the sweep loop runs.

pub mod config;
pub mod observability;
pub mod retry;
pub mod routes;
pub mod scheduler;
pub mod store;
pub mod sweeper;

#[cfg(test)]
mod tests;
