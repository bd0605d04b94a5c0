//! Results of a sweep and of a scheduled run.

use std::time::Duration;

use super::{DeletionError, Selection};

/// What happened to one prefix during a sweep.
#[derive(Debug, Default)]
pub struct PrefixReport {
    pub prefix: String,
    /// Indices that matched the prefix.
    pub matched: usize,
    /// Indices kept, oldest first.
    pub retained: Vec<String>,
    /// Indices deleted, in deletion order.
    pub deleted: Vec<String>,
    /// Indices that would have been deleted in dry-run mode.
    pub skipped: Vec<String>,
    pub failures: Vec<DeletionError>,
}

impl PrefixReport {
    pub(super) fn new(prefix: &str, selection: &Selection) -> Self {
        Self {
            prefix: prefix.to_string(),
            matched: selection.matched(),
            retained: selection.retained.clone(),
            ..Default::default()
        }
    }
}

/// Results from a single sweep over all prefixes.
#[derive(Debug, Default)]
pub struct SweepReport {
    pub prefixes: Vec<PrefixReport>,
}

impl SweepReport {
    /// Number of indices deleted across all prefixes.
    pub fn deleted_count(&self) -> usize {
        self.prefixes.iter().map(|p| p.deleted.len()).sum()
    }

    /// Number of failed deletions across all prefixes.
    pub fn failed_count(&self) -> usize {
        self.prefixes.iter().map(|p| p.failures.len()).sum()
    }

    /// Check if any index was deleted.
    pub fn has_deletions(&self) -> bool {
        self.deleted_count() > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Ok,
    Failed,
}

impl RunStatus {
    /// Label value used on the runs counter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Failed => "failed",
        }
    }
}

/// Outcome of one scheduled run, reported to the metrics sink.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub status: RunStatus,
    /// Wall time of the whole run, retries included.
    pub duration: Duration,
    pub deleted: u64,
    pub failed_deletions: u64,
}
