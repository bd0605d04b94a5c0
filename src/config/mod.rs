//! Configuration module for the index maintenance daemon.
//!
//! Every setting is available both as a command-line flag and as an
//! environment variable. Flags take precedence over the environment, which
//! takes precedence over the built-in defaults.
//!
//! # Example
//!
//! ```text
//! HOST=es.internal:9200 KEEP=14 PREFIX=logstash-,metrics- es-maint-index --interval 12
//! ```

mod observability;
mod retention;
mod retry;
mod store;

pub use observability::*;
pub use retention::*;
pub use retry::*;
pub use store::*;

/// Root configuration for the maintenance daemon.
///
/// Sections are flattened into a single flat set of flags so the command
/// line stays compatible with `--host`, `--keep`, `--prefix` and
/// `--interval`.
#[derive(clap::Parser, Debug, Clone)]
#[command(
    name = "es-maint-index",
    version,
    about = "Deletes all but the newest indices per prefix on an Elasticsearch cluster",
    long_about = None
)]
pub struct MaintConfig {
    /// Store endpoint and client settings.
    #[command(flatten)]
    pub store: StoreConfig,

    /// Retention policy and schedule.
    #[command(flatten)]
    pub retention: RetentionConfig,

    /// Backoff envelope around each scheduled run.
    #[command(flatten)]
    pub retry: RetryConfig,

    /// Logging and metrics.
    #[command(flatten)]
    pub observability: ObservabilityConfig,
}

impl MaintConfig {
    /// Validate the configuration for consistency and completeness.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.store.validate()?;
        self.retention.validate()?;
        self.retry.validate()?;
        self.observability.validate()?;
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid store endpoint '{endpoint}': {source}")]
    Endpoint {
        endpoint: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Invalid listen address '{0}'")]
    ListenAddr(String),

    #[error("Configuration validation error: {0}")]
    Validation(String),
}
