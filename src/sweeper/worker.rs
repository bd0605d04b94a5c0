//! The retention sweeper.
//!
//! For every configured prefix, in order: list all indices, select the
//! victims, and delete them oldest first. A failed deletion is logged and
//! counted and the batch moves on. A failed listing aborts the sweep so the
//! retry envelope can start over with a fresh connection.

use std::{sync::Arc, time::Duration};

use tokio_util::sync::CancellationToken;

use super::{
    DeletionError, PrefixReport, SweepError, SweepReport, selection::select_victims,
};
use crate::{config::RetentionConfig, observability::MetricsSink, store::IndexStore};

/// What the sweeper deletes and how fast.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepPolicy {
    pub prefixes: Vec<String>,
    pub keep: u32,
    /// Wait between two consecutive deletions of the same batch.
    pub delete_pause: Duration,
    pub dry_run: bool,
}

impl SweepPolicy {
    pub fn from_config(config: &RetentionConfig) -> Self {
        Self {
            prefixes: config.prefixes(),
            keep: config.keep,
            delete_pause: config.delete_pause(),
            dry_run: config.dry_run,
        }
    }
}

pub struct Sweeper {
    policy: SweepPolicy,
    sink: Arc<dyn MetricsSink>,
}

impl Sweeper {
    pub fn new(policy: SweepPolicy, sink: Arc<dyn MetricsSink>) -> Self {
        Self { policy, sink }
    }

    pub fn policy(&self) -> &SweepPolicy {
        &self.policy
    }

    /// Run one sweep over every prefix against `store`.
    pub async fn sweep(
        &self,
        store: &dyn IndexStore,
        cancel: &CancellationToken,
    ) -> Result<SweepReport, SweepError> {
        let mut report = SweepReport::default();
        self.sweep_into(store, cancel, &mut report).await?;
        Ok(report)
    }

    /// Like [`Sweeper::sweep`], but records into `report` as it goes.
    ///
    /// On error `report` still holds every deletion made before the failure.
    pub async fn sweep_into(
        &self,
        store: &dyn IndexStore,
        cancel: &CancellationToken,
        report: &mut SweepReport,
    ) -> Result<(), SweepError> {
        for prefix in &self.policy.prefixes {
            if cancel.is_cancelled() {
                return Err(SweepError::Cancelled);
            }
            self.sweep_prefix(store, prefix, cancel, report).await?;
        }
        Ok(())
    }

    async fn sweep_prefix(
        &self,
        store: &dyn IndexStore,
        prefix: &str,
        cancel: &CancellationToken,
        report: &mut SweepReport,
    ) -> Result<(), SweepError> {
        let names = store
            .index_names()
            .await
            .map_err(|source| SweepError::Enumeration {
                prefix: prefix.to_string(),
                source,
            })?;

        let selection = select_victims(&names, prefix, self.policy.keep);
        tracing::debug!(
            prefix,
            num_victims = selection.matched(),
            retention = self.policy.keep,
            to_delete = selection.deletions.len(),
            retained = ?selection.retained,
            "Prefix status"
        );

        let mut prefix_report = PrefixReport::new(prefix, &selection);

        if self.policy.dry_run {
            for index in &selection.deletions {
                tracing::info!(prefix, index = %index, "DRY RUN: Would delete index");
            }
            prefix_report.skipped = selection.deletions;
            report.prefixes.push(prefix_report);
            return Ok(());
        }

        let result = self
            .delete_batch(store, prefix, selection.deletions, cancel, &mut prefix_report)
            .await;
        report.prefixes.push(prefix_report);
        result
    }

    async fn delete_batch(
        &self,
        store: &dyn IndexStore,
        prefix: &str,
        deletions: Vec<String>,
        cancel: &CancellationToken,
        report: &mut PrefixReport,
    ) -> Result<(), SweepError> {
        let total = deletions.len();
        for (position, index) in deletions.into_iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(SweepError::Cancelled);
            }

            match store.delete_index(&index).await {
                Ok(()) => {
                    tracing::info!(prefix, index = %index, "Deleted index");
                    self.sink.index_deleted(prefix, &index);
                    report.deleted.push(index);

                    let more_to_go = position + 1 < total;
                    if more_to_go && !self.policy.delete_pause.is_zero() {
                        tracing::debug!(
                            pause_ms = self.policy.delete_pause.as_millis(),
                            "Pausing before next deletion"
                        );
                        tokio::select! {
                            _ = cancel.cancelled() => return Err(SweepError::Cancelled),
                            _ = tokio::time::sleep(self.policy.delete_pause) => {}
                        }
                    }
                }
                Err(source) => {
                    tracing::error!(prefix, index = %index, error = %source, "Failed to delete index");
                    self.sink.deletion_failed(prefix, &index);
                    report.failures.push(DeletionError { index, source });
                }
            }
        }

        Ok(())
    }
}
