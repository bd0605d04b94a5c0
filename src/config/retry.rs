//! Backoff envelope configuration for scheduled runs.
//!
//! Each run (connect + sweep) is retried with exponential backoff until it
//! succeeds or the total time budget is spent.

use std::time::Duration;

use super::ConfigError;
use crate::retry::BackoffPolicy;

/// Retry envelope around a whole scheduled run.
#[derive(clap::Args, Debug, Clone)]
pub struct RetryConfig {
    /// Delay before the first retry, in milliseconds.
    #[arg(long = "retry-initial-delay-ms", env = "RETRY_INITIAL_DELAY_MS", default_value_t = default_initial_delay_ms())]
    pub initial_delay_ms: u64,

    /// Maximum delay between retries, in milliseconds.
    #[arg(long = "retry-max-delay-ms", env = "RETRY_MAX_DELAY_MS", default_value_t = default_max_delay_ms())]
    pub max_delay_ms: u64,

    /// Total time budget for one run including retries, in seconds.
    #[arg(long = "retry-max-elapsed-secs", env = "RETRY_MAX_ELAPSED_SECS", default_value_t = default_max_elapsed_secs())]
    pub max_elapsed_secs: u64,

    /// Multiplier for exponential backoff.
    #[arg(long = "retry-backoff-multiplier", env = "RETRY_BACKOFF_MULTIPLIER", default_value_t = default_backoff_multiplier())]
    pub backoff_multiplier: f64,

    /// Random jitter applied to each delay (fraction, 0.0-1.0).
    #[arg(long = "retry-jitter", env = "RETRY_JITTER", default_value_t = default_jitter())]
    pub jitter: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            max_elapsed_secs: default_max_elapsed_secs(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: default_jitter(),
        }
    }
}

fn default_initial_delay_ms() -> u64 {
    1_000
}

fn default_max_delay_ms() -> u64 {
    60_000
}

fn default_max_elapsed_secs() -> u64 {
    15 * 60
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_jitter() -> f64 {
    0.1
}

impl RetryConfig {
    /// Backoff policy for the run envelope. Bounded by elapsed time only.
    pub fn policy(&self) -> BackoffPolicy {
        BackoffPolicy {
            initial_delay: Duration::from_millis(self.initial_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            multiplier: self.backoff_multiplier,
            jitter: self.jitter,
            max_retries: None,
            max_elapsed: Some(Duration::from_secs(self.max_elapsed_secs)),
        }
    }

    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_delay_ms > self.max_delay_ms {
            return Err(ConfigError::Validation(format!(
                "retry-initial-delay-ms ({}) exceeds retry-max-delay-ms ({})",
                self.initial_delay_ms, self.max_delay_ms
            )));
        }
        if self.backoff_multiplier < 1.0 {
            return Err(ConfigError::Validation(
                "retry-backoff-multiplier must be at least 1.0".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.jitter) {
            return Err(ConfigError::Validation(
                "retry-jitter must be between 0.0 and 1.0".into(),
            ));
        }
        Ok(())
    }
}
