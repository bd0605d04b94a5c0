use crate::{observability::metrics, sweeper::RunOutcome};

/// Destination for sweep outcomes.
///
/// Injected into the sweeper and scheduler instead of touching process-wide
/// counters directly. Implementations must tolerate concurrent calls.
pub trait MetricsSink: Send + Sync {
    /// An index was deleted.
    fn index_deleted(&self, prefix: &str, index: &str);

    /// Deleting an index failed. The sweep continued.
    fn deletion_failed(&self, prefix: &str, index: &str);

    /// A scheduled run finished, successfully or not.
    fn run_finished(&self, outcome: &RunOutcome);
}

/// Reports into the `metrics` facade, rendered by the Prometheus exporter.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrometheusSink;

impl MetricsSink for PrometheusSink {
    fn index_deleted(&self, prefix: &str, _index: &str) {
        metrics::record_index_deleted(prefix);
    }

    fn deletion_failed(&self, prefix: &str, _index: &str) {
        metrics::record_deletion_failure(prefix);
    }

    fn run_finished(&self, outcome: &RunOutcome) {
        metrics::record_run(
            outcome.status.as_str(),
            "delete",
            outcome.duration.as_secs_f64(),
        );
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl MetricsSink for NoopSink {
    fn index_deleted(&self, _prefix: &str, _index: &str) {}

    fn deletion_failed(&self, _prefix: &str, _index: &str) {}

    fn run_finished(&self, _outcome: &RunOutcome) {}
}

/// Keeps every reported event for assertions.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingSink {
    deleted: std::sync::Mutex<Vec<(String, String)>>,
    failed: std::sync::Mutex<Vec<(String, String)>>,
    runs: std::sync::Mutex<Vec<RunOutcome>>,
}

#[cfg(test)]
impl RecordingSink {
    pub fn deleted(&self) -> Vec<(String, String)> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn failed(&self) -> Vec<(String, String)> {
        self.failed.lock().unwrap().clone()
    }

    pub fn runs(&self) -> Vec<RunOutcome> {
        self.runs.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl MetricsSink for RecordingSink {
    fn index_deleted(&self, prefix: &str, index: &str) {
        self.deleted
            .lock()
            .unwrap()
            .push((prefix.to_string(), index.to_string()));
    }

    fn deletion_failed(&self, prefix: &str, index: &str) {
        self.failed
            .lock()
            .unwrap()
            .push((prefix.to_string(), index.to_string()));
    }

    fn run_finished(&self, outcome: &RunOutcome) {
        self.runs.lock().unwrap().push(outcome.clone());
    }
}
