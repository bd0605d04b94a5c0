//! Store (Elasticsearch) endpoint configuration.

use std::time::Duration;

use url::Url;

use super::ConfigError;
use crate::retry::BackoffPolicy;

/// Connection settings for the index store.
#[derive(clap::Args, Debug, Clone)]
pub struct StoreConfig {
    /// Store endpoint, either `host:port` or a full `http(s)://` URL.
    #[arg(long = "host", env = "HOST", default_value = "localhost:9200")]
    pub host: String,

    /// Retries of a single store request on transient failures
    /// (not including the initial attempt).
    #[arg(long = "store-max-retries", env = "STORE_MAX_RETRIES", default_value_t = default_max_retries())]
    pub max_retries: u32,

    /// Timeout for a single store request, in seconds.
    #[arg(long = "store-timeout-secs", env = "STORE_TIMEOUT_SECS", default_value_t = default_timeout_secs())]
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            host: "localhost:9200".to_string(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_max_retries() -> u32 {
    10
}

fn default_timeout_secs() -> u64 {
    30
}

/// Initial delay between request retries inside the store client.
const REQUEST_RETRY_INITIAL_DELAY_MS: u64 = 100;

/// Cap on the delay between request retries inside the store client.
const REQUEST_RETRY_MAX_DELAY_MS: u64 = 5_000;

impl StoreConfig {
    /// Base URL of the store.
    ///
    /// A bare `host:port` is treated as plain HTTP.
    pub fn url(&self) -> Result<Url, ConfigError> {
        endpoint_url(&self.host)
    }

    /// Get the request timeout as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Backoff policy for retrying individual store requests.
    pub fn request_policy(&self) -> BackoffPolicy {
        BackoffPolicy {
            initial_delay: Duration::from_millis(REQUEST_RETRY_INITIAL_DELAY_MS),
            max_delay: Duration::from_millis(REQUEST_RETRY_MAX_DELAY_MS),
            multiplier: 2.0,
            jitter: 0.1,
            max_retries: Some(self.max_retries),
            max_elapsed: None,
        }
    }

    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        self.url()?;
        if self.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "store-timeout-secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// Turn a `host:port` or URL string into a base URL.
pub fn endpoint_url(endpoint: &str) -> Result<Url, ConfigError> {
    let endpoint = endpoint.trim();
    let candidate = if endpoint.contains("://") {
        endpoint.to_string()
    } else {
        format!("http://{endpoint}")
    };

    let url = Url::parse(&candidate).map_err(|source| ConfigError::Endpoint {
        endpoint: endpoint.to_string(),
        source,
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation(format!(
            "store endpoint '{endpoint}' must use http or https"
        )));
    }

    Ok(url)
}
