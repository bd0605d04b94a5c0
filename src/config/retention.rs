//! Retention policy and schedule configuration.
//!
//! # Example
//!
//! ```text
//! --prefix logstash-,metrics- --keep 7 --interval 24 --delete-pause-secs 30
//! ```

use std::time::Duration;

use super::ConfigError;

/// Retention policy applied on every sweep.
#[derive(clap::Args, Debug, Clone)]
pub struct RetentionConfig {
    /// Number of newest indices to keep per prefix.
    ///
    /// The sweeper keeps `keep + 1` indices; see `effective_keep`.
    #[arg(long = "keep", env = "KEEP", default_value_t = default_keep())]
    pub keep: u32,

    /// Comma-separated list of index name prefixes, each swept independently.
    #[arg(long = "prefix", env = "PREFIX", default_value = "logstash-")]
    pub prefix: String,

    /// Hours between runs. Zero or a negative value runs a single sweep and exits.
    #[arg(
        long = "interval",
        env = "INTERVAL",
        allow_negative_numbers = true,
        default_value_t = default_interval_hours()
    )]
    pub interval_hours: i64,

    /// Pause between two consecutive deletions, in seconds.
    /// Bounds the load placed on the cluster. Set to 0 to disable.
    #[arg(long, env = "DELETE_PAUSE_SECS", default_value_t = default_delete_pause_secs())]
    pub delete_pause_secs: u64,

    /// Upper bound of the random delay before the first run, in seconds.
    /// Spreads out replicas that start at the same time. Set to 0 to disable.
    #[arg(long, env = "STARTUP_JITTER_SECS", default_value_t = default_startup_jitter_secs())]
    pub startup_jitter_secs: u64,

    /// Log what would be deleted without issuing any delete request.
    #[arg(
        long,
        env = "DRY_RUN",
        action = clap::ArgAction::SetTrue,
        value_parser = clap::builder::BoolishValueParser::new()
    )]
    pub dry_run: bool,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            keep: default_keep(),
            prefix: "logstash-".to_string(),
            interval_hours: default_interval_hours(),
            delete_pause_secs: default_delete_pause_secs(),
            startup_jitter_secs: default_startup_jitter_secs(),
            dry_run: false,
        }
    }
}

fn default_keep() -> u32 {
    7
}

fn default_interval_hours() -> i64 {
    24
}

fn default_delete_pause_secs() -> u64 {
    30
}

fn default_startup_jitter_secs() -> u64 {
    30
}

impl RetentionConfig {
    /// The prefixes to sweep, in the order given.
    ///
    /// Segments are trimmed and empty segments dropped, so `"a-, ,b-"`
    /// yields `["a-", "b-"]`. An empty prefix would match every index.
    pub fn prefixes(&self) -> Vec<String> {
        parse_prefixes(&self.prefix)
    }

    /// Number of indices actually kept per prefix.
    ///
    /// The deletion window keeps one more index than `keep`. This matches the
    /// long-standing behavior of the daemon and is left as-is so existing
    /// deployments retain the same indices.
    pub fn effective_keep(&self) -> u64 {
        u64::from(self.keep) + 1
    }

    /// Get the interval as a Duration. Non-positive intervals are zero.
    pub fn interval(&self) -> Duration {
        let hours = u64::try_from(self.interval_hours).unwrap_or(0);
        Duration::from_secs(hours.saturating_mul(3600))
    }

    /// Whether the daemon runs a single sweep and exits.
    pub fn is_run_once(&self) -> bool {
        self.interval() < Duration::from_secs(1)
    }

    /// Get the inter-delete pause as a Duration.
    pub fn delete_pause(&self) -> Duration {
        Duration::from_secs(self.delete_pause_secs)
    }

    /// Get the startup jitter bound as a Duration.
    pub fn startup_jitter(&self) -> Duration {
        Duration::from_secs(self.startup_jitter_secs)
    }

    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        if self.prefixes().is_empty() {
            return Err(ConfigError::Validation(format!(
                "prefix list '{}' contains no usable prefix",
                self.prefix
            )));
        }
        Ok(())
    }
}

/// Split a comma-separated prefix list.
pub fn parse_prefixes(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RetentionConfig::default();
        assert_eq!(config.keep, 7);
        assert_eq!(config.effective_keep(), 8);
        assert_eq!(config.interval_hours, 24);
        assert_eq!(config.delete_pause(), Duration::from_secs(30));
        assert!(!config.dry_run);
        assert!(!config.is_run_once());
    }

    #[test]
    fn test_parse_prefixes() {
        assert_eq!(
            parse_prefixes("logstash-,metrics-"),
            vec!["logstash-".to_string(), "metrics-".to_string()]
        );
        assert_eq!(parse_prefixes(" a- , ,b-,"), vec!["a-".to_string(), "b-".to_string()]);
        assert!(parse_prefixes(",,").is_empty());
    }

    #[test]
    fn test_parse_prefixes_preserves_order_and_duplicates() {
        assert_eq!(
            parse_prefixes("z-,a-,z-"),
            vec!["z-".to_string(), "a-".to_string(), "z-".to_string()]
        );
    }

    #[test]
    fn test_interval_duration() {
        let mut config = RetentionConfig::default();
        assert_eq!(config.interval(), Duration::from_secs(24 * 3600));

        config.interval_hours = 6;
        assert_eq!(config.interval(), Duration::from_secs(6 * 3600));

        config.interval_hours = 0;
        assert!(config.is_run_once());
    }

    #[test]
    fn test_negative_interval_is_run_once() {
        let config = RetentionConfig {
            interval_hours: -3,
            ..Default::default()
        };
        assert_eq!(config.interval(), Duration::ZERO);
        assert!(config.is_run_once());
    }

    #[test]
    fn test_effective_keep_zero() {
        let config = RetentionConfig {
            keep: 0,
            ..Default::default()
        };
        assert_eq!(config.effective_keep(), 1);
    }

    #[test]
    fn test_validate() {
        assert!(RetentionConfig::default().validate().is_ok());

        let config = RetentionConfig {
            prefix: ",".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
