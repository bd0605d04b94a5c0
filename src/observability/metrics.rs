//! Prometheus metrics for the maintenance daemon.
//!
//! Provides metrics for:
//! - Sweep runs by outcome
//! - Indices deleted and failed deletions per prefix
//! - Run duration

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};

use crate::config::MetricsConfig;

/// Sweep runs, labeled by `status` (`ok` or `failed`).
pub const RUNS_TOTAL: &str = "elasticsearch_index_maint_runs_total";

/// Indices deleted, labeled by `prefix`.
pub const INDICES_DELETED_TOTAL: &str = "elasticsearch_indices_deleted_total";

/// Failed index deletions, labeled by `prefix`.
pub const DELETE_FAILURES_TOTAL: &str = "elasticsearch_index_delete_failures_total";

/// Run duration, labeled by `operation`.
pub const RUN_DURATION_SECONDS: &str = "elasticsearch_index_maint_duration_seconds";

/// Build a Prometheus recorder with the configured histogram buckets.
pub fn build_recorder(
    config: &MetricsConfig,
) -> Result<metrics_exporter_prometheus::PrometheusRecorder, MetricsError> {
    let recorder = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Suffix("_duration_seconds".to_string()),
            &config.duration_buckets_secs,
        )
        .map_err(|e| MetricsError::Setup(e.to_string()))?
        .build_recorder();
    Ok(recorder)
}

/// Initialize the metrics system with the given configuration.
///
/// Installs the global recorder and returns the handle used by the metrics
/// endpoint, or `None` when metrics are disabled.
pub fn init_metrics(config: &MetricsConfig) -> Result<Option<PrometheusHandle>, MetricsError> {
    if !config.enabled {
        return Ok(None);
    }

    let recorder = build_recorder(config)?;
    let handle = recorder.handle();
    metrics::set_global_recorder(recorder)
        .map_err(|_| MetricsError::Setup("Metrics already initialized".to_string()))?;

    Ok(Some(handle))
}

// ─────────────────────────────────────────────────────────────────────────────
// Metric Recording Functions
// ─────────────────────────────────────────────────────────────────────────────

/// Record a finished sweep run.
///
/// # Arguments
/// * `status` - The run outcome: "ok" or "failed"
/// * `operation` - The operation label for the duration histogram (e.g., "delete")
/// * `duration_secs` - Wall-clock duration of the run including retries
pub fn record_run(status: &str, operation: &str, duration_secs: f64) {
    counter!(RUNS_TOTAL, "status" => status.to_string()).increment(1);
    histogram!(RUN_DURATION_SECONDS, "operation" => operation.to_string()).record(duration_secs);
}

/// Record a deleted index.
pub fn record_index_deleted(prefix: &str) {
    counter!(INDICES_DELETED_TOTAL, "prefix" => prefix.to_string()).increment(1);
}

/// Record a failed index deletion.
pub fn record_deletion_failure(prefix: &str) {
    counter!(DELETE_FAILURES_TOTAL, "prefix" => prefix.to_string()).increment(1);
}

/// Metrics initialization errors.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("Failed to set up metrics: {0}")]
    Setup(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_functions_render() {
        let recorder = build_recorder(&MetricsConfig::default()).unwrap();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            record_run("ok", "delete", 12.5);
            record_run("failed", "delete", 900.0);
            record_index_deleted("logstash-");
            record_index_deleted("logstash-");
            record_deletion_failure("metrics-");
        });

        let rendered = handle.render();
        assert!(rendered.contains(r#"elasticsearch_index_maint_runs_total{status="ok"} 1"#));
        assert!(rendered.contains(r#"elasticsearch_index_maint_runs_total{status="failed"} 1"#));
        assert!(rendered.contains(r#"elasticsearch_indices_deleted_total{prefix="logstash-"} 2"#));
        assert!(
            rendered.contains(r#"elasticsearch_index_delete_failures_total{prefix="metrics-"} 1"#)
        );
        assert!(rendered.contains("elasticsearch_index_maint_duration_seconds_bucket"));
    }

    #[test]
    fn test_disabled_metrics_returns_no_handle() {
        let config = MetricsConfig {
            enabled: false,
            ..Default::default()
        };
        assert!(init_metrics(&config).unwrap().is_none());
    }

    #[test]
    fn test_empty_buckets_rejected() {
        let config = MetricsConfig {
            duration_buckets_secs: vec![],
            ..Default::default()
        };
        assert!(matches!(build_recorder(&config), Err(MetricsError::Setup(_))));
    }
}
