//! Retry logic with exponential backoff.
//!
//! Used at two levels:
//! - around a whole scheduled run (connect + sweep), bounded by a total
//!   elapsed-time budget;
//! - around individual store requests, bounded by a retry count.
//!
//! Waits between attempts are cancellable so a shutdown never has to sit out
//! a long backoff.

use std::{future::Future, time::Duration};

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Exponential backoff parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffPolicy {
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Cap on any single delay.
    pub max_delay: Duration,
    /// Multiplier applied per attempt.
    pub multiplier: f64,
    /// Random jitter (fraction of the delay, 0.0-1.0).
    pub jitter: f64,
    /// Maximum number of retries, not counting the initial attempt.
    pub max_retries: Option<u32>,
    /// Total time budget across all attempts and waits.
    pub max_elapsed: Option<Duration>,
}

impl BackoffPolicy {
    /// Calculate the delay for a given retry attempt (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let initial_ms = self.initial_delay.as_millis() as f64;
        let max_ms = self.max_delay.as_millis() as f64;
        let exponent = attempt.min(i32::MAX as u32) as i32;
        let base_delay = initial_ms * self.multiplier.powi(exponent);
        let capped_delay = base_delay.min(max_ms);

        let jitter_range = capped_delay * self.jitter;
        let jitter = if jitter_range > 0.0 {
            use rand::Rng;
            rand::thread_rng().gen_range(-jitter_range..jitter_range)
        } else {
            0.0
        };

        let final_delay = (capped_delay + jitter).clamp(0.0, max_ms);
        Duration::from_millis(final_delay as u64)
    }

    /// Delay before the next attempt, or `None` once the policy is exhausted.
    ///
    /// The last wait is shortened so the final attempt starts no later than
    /// the elapsed-time budget.
    pub fn next_delay(&self, attempt: u32, elapsed: Duration) -> Option<Duration> {
        if let Some(max_retries) = self.max_retries
            && attempt >= max_retries
        {
            return None;
        }

        let delay = self.delay_for_attempt(attempt);

        match self.max_elapsed {
            Some(budget) if elapsed >= budget => None,
            Some(budget) => Some(delay.min(budget - elapsed)),
            None => Some(delay),
        }
    }
}

/// Execute an async operation with exponential backoff.
///
/// The `operation` function is called for each attempt. Errors for which
/// `is_retryable` returns false end the loop immediately. When the policy is
/// exhausted or `cancel` fires during a wait, the last error is returned.
pub async fn with_backoff<F, Fut, T, E, P>(
    policy: &BackoffPolicy,
    operation_name: &str,
    is_retryable: P,
    cancel: &CancellationToken,
    operation: F,
) -> Result<T, E>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let started = Instant::now();
    let mut attempt: u32 = 0;

    loop {
        let error = match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    debug!(
                        operation = operation_name,
                        attempt = attempt + 1,
                        "Operation succeeded after retry"
                    );
                }
                return Ok(value);
            }
            Err(error) => error,
        };

        if !is_retryable(&error) {
            if attempt > 0 {
                warn!(
                    operation = operation_name,
                    error = %error,
                    attempts = attempt + 1,
                    "Non-retryable error after retries"
                );
            }
            return Err(error);
        }

        let Some(delay) = policy.next_delay(attempt, started.elapsed()) else {
            warn!(
                operation = operation_name,
                error = %error,
                attempts = attempt + 1,
                elapsed_ms = started.elapsed().as_millis(),
                "Operation failed after all retry attempts"
            );
            return Err(error);
        };

        warn!(
            operation = operation_name,
            error = %error,
            attempt = attempt + 1,
            delay_ms = delay.as_millis(),
            "Retryable error, will retry after delay"
        );

        tokio::select! {
            _ = cancel.cancelled() => {
                debug!(operation = operation_name, "Retry wait cancelled");
                return Err(error);
            }
            _ = tokio::time::sleep(delay) => {}
        }

        attempt += 1;
    }
}
