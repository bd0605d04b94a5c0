//! Drives the sweeper on a fixed interval.
//!
//! Each run wraps connect + sweep in the retry envelope, then reports the
//! outcome to the metrics sink. A failed run never stops the loop. With an
//! interval below one second a single run is performed and the scheduler
//! returns.

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use rand::Rng;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::{
    config::MaintConfig,
    observability::MetricsSink,
    retry::{BackoffPolicy, with_backoff},
    store::StoreConnector,
    sweeper::{RunOutcome, RunStatus, SweepError, SweepPolicy, SweepReport, Sweeper},
};

/// Why [`Scheduler::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleExit {
    /// Interval below one second: one run was performed.
    RunOnce,
    /// The cancellation token fired.
    Cancelled,
}

pub struct Scheduler {
    connector: Arc<dyn StoreConnector>,
    sweeper: Sweeper,
    sink: Arc<dyn MetricsSink>,
    retry: BackoffPolicy,
    interval: Duration,
    startup_jitter: Duration,
}

impl Scheduler {
    pub fn new(
        connector: Arc<dyn StoreConnector>,
        sweeper: Sweeper,
        sink: Arc<dyn MetricsSink>,
        retry: BackoffPolicy,
        interval: Duration,
    ) -> Self {
        Self {
            connector,
            sweeper,
            sink,
            retry,
            interval,
            startup_jitter: Duration::ZERO,
        }
    }

    pub fn from_config(
        config: &MaintConfig,
        connector: Arc<dyn StoreConnector>,
        sink: Arc<dyn MetricsSink>,
    ) -> Self {
        let sweeper = Sweeper::new(SweepPolicy::from_config(&config.retention), sink.clone());
        Self::new(
            connector,
            sweeper,
            sink,
            config.retry.policy(),
            config.retention.interval(),
        )
        .with_startup_jitter(config.retention.startup_jitter())
    }

    /// Wait a random `0..jitter` before the first run.
    pub fn with_startup_jitter(mut self, jitter: Duration) -> Self {
        self.startup_jitter = jitter;
        self
    }

    fn is_run_once(&self) -> bool {
        self.interval < Duration::from_secs(1)
    }

    /// Run until cancelled, or once when the interval is below one second.
    pub async fn run(&self, cancel: CancellationToken) -> ScheduleExit {
        let policy = self.sweeper.policy();
        tracing::info!(
            endpoint = %self.connector.endpoint(),
            prefixes = ?policy.prefixes,
            keep = policy.keep,
            effective_keep = u64::from(policy.keep) + 1,
            interval_secs = self.interval.as_secs(),
            run_once = self.is_run_once(),
            dry_run = policy.dry_run,
            "Starting index maintenance{}",
            if policy.dry_run { " (DRY RUN)" } else { "" }
        );

        if !self.startup_jitter.is_zero() {
            let delay = Duration::from_millis(
                rand::thread_rng().gen_range(0..=self.startup_jitter.as_millis() as u64),
            );
            tracing::info!(delay_ms = delay.as_millis(), "Delaying first run");
            tokio::select! {
                _ = cancel.cancelled() => return ScheduleExit::Cancelled,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        loop {
            self.run_once(&cancel).await;

            if cancel.is_cancelled() {
                tracing::info!("Index maintenance cancelled");
                return ScheduleExit::Cancelled;
            }

            if self.is_run_once() {
                tracing::info!("Interval below one second, exiting after a single run");
                return ScheduleExit::RunOnce;
            }

            tracing::info!(
                interval_secs = self.interval.as_secs(),
                "Waiting until next run"
            );
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Index maintenance cancelled");
                    return ScheduleExit::Cancelled;
                }
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
    }

    /// Perform one connect + sweep under the retry envelope and report it.
    pub async fn run_once(&self, cancel: &CancellationToken) -> RunOutcome {
        let started = Instant::now();
        let connector = &self.connector;
        let sweeper = &self.sweeper;
        let tally = &RunTally::default();

        let result = with_backoff(
            &self.retry,
            "index_sweep",
            SweepError::is_retryable,
            cancel,
            move || async move {
                let store = connector.connect().await.map_err(SweepError::Connection)?;
                let mut report = SweepReport::default();
                let result = sweeper.sweep_into(store.as_ref(), cancel, &mut report).await;
                tally.add(&report);
                result
            },
        )
        .await;

        let duration = started.elapsed();
        let deleted = tally.deleted.load(Ordering::Relaxed);
        let failed_deletions = tally.failed.load(Ordering::Relaxed);
        let status = match result {
            Ok(()) => {
                if failed_deletions > 0 {
                    tracing::warn!(
                        deleted,
                        failed = failed_deletions,
                        duration_ms = duration.as_millis(),
                        "Index maintenance complete with failed deletions"
                    );
                } else if deleted > 0 {
                    tracing::info!(
                        deleted,
                        duration_ms = duration.as_millis(),
                        "Index maintenance complete"
                    );
                } else {
                    tracing::debug!("Index maintenance complete, no indices to delete");
                }
                RunStatus::Ok
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    deleted,
                    failed = failed_deletions,
                    duration_ms = duration.as_millis(),
                    "Failed to delete indices"
                );
                RunStatus::Failed
            }
        };
        let outcome = RunOutcome {
            status,
            duration,
            deleted,
            failed_deletions,
        };

        self.sink.run_finished(&outcome);
        outcome
    }
}

/// Deletions across every attempt of one run.
#[derive(Default)]
struct RunTally {
    deleted: AtomicU64,
    failed: AtomicU64,
}

impl RunTally {
    fn add(&self, report: &SweepReport) {
        self.deleted
            .fetch_add(report.deleted_count() as u64, Ordering::Relaxed);
        self.failed
            .fetch_add(report.failed_count() as u64, Ordering::Relaxed);
    }
}
