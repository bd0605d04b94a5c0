use std::net::SocketAddr;

use super::ConfigError;

/// Observability configuration.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ObservabilityConfig {
    /// Logging configuration.
    #[command(flatten)]
    pub logging: LoggingConfig,

    /// Metrics configuration.
    #[command(flatten)]
    pub metrics: MetricsConfig,
}

impl ObservabilityConfig {
    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        self.metrics.listen_addr()?;
        if self.metrics.duration_buckets_secs.is_empty() {
            return Err(ConfigError::Validation(
                "metrics-duration-buckets must not be empty".into(),
            ));
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Logging
// ─────────────────────────────────────────────────────────────────────────────

/// Logging configuration.
#[derive(clap::Args, Debug, Clone)]
pub struct LoggingConfig {
    /// Log level.
    #[arg(long = "log-level", env = "LOG_LEVEL", value_enum, default_value_t = LogLevel::Info)]
    pub level: LogLevel,

    /// Log format. Defaults to `json` when ENVIRONMENT is `prod` or `stage`,
    /// `compact` otherwise.
    #[arg(long = "log-format", env = "LOG_FORMAT", value_enum)]
    pub format: Option<LogFormat>,

    /// Include file/line information.
    #[arg(
        long = "log-file-line",
        env = "LOG_FILE_LINE",
        action = clap::ArgAction::SetTrue,
        value_parser = clap::builder::BoolishValueParser::new()
    )]
    pub file_line: bool,

    /// Filter directives (e.g., "reqwest=debug,hyper=warn").
    #[arg(long = "log-filter", env = "LOG_FILTER")]
    pub filter: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: None,
            file_line: false,
            filter: None,
        }
    }
}

impl LoggingConfig {
    /// The format to use, falling back to the deployment environment.
    pub fn resolved_format(&self) -> LogFormat {
        self.format.unwrap_or_else(|| {
            LogFormat::for_environment(std::env::var("ENVIRONMENT").ok().as_deref())
        })
    }
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_directive(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable multi-line format.
    Pretty,
    /// Compact single-line format.
    #[default]
    Compact,
    /// JSON format (for log aggregation).
    Json,
}

impl LogFormat {
    /// Production-like environments log JSON for aggregation.
    pub fn for_environment(environment: Option<&str>) -> Self {
        match environment {
            Some("prod") | Some("stage") => LogFormat::Json,
            _ => LogFormat::Compact,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Metrics
// ─────────────────────────────────────────────────────────────────────────────

/// Metrics configuration.
#[derive(clap::Args, Debug, Clone)]
pub struct MetricsConfig {
    /// Enable metrics gathering.
    #[arg(
        long = "metrics-enabled",
        env = "METRICS_ENABLED",
        default_value_t = true,
        action = clap::ArgAction::Set,
        value_parser = clap::builder::BoolishValueParser::new()
    )]
    pub enabled: bool,

    /// Address of the health and metrics server. `:port` binds all interfaces.
    #[arg(long = "listen", env = "LISTEN", default_value = ":8080")]
    pub listen: String,

    /// Histogram buckets for run duration metrics (in seconds).
    #[arg(
        long = "metrics-duration-buckets",
        env = "METRICS_DURATION_BUCKETS",
        value_delimiter = ',',
        default_values_t = default_duration_buckets()
    )]
    pub duration_buckets_secs: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            listen: ":8080".to_string(),
            duration_buckets_secs: default_duration_buckets(),
        }
    }
}

fn default_duration_buckets() -> Vec<f64> {
    vec![
        1.0, 5.0, 15.0, 30.0, 60.0, 300.0, 600.0, 1800.0, 3600.0, 7200.0,
    ]
}

impl MetricsConfig {
    /// Socket address of the health and metrics server.
    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        let listen = self.listen.trim();
        let candidate = if listen.starts_with(':') {
            format!("0.0.0.0{listen}")
        } else {
            listen.to_string()
        };
        candidate
            .parse()
            .map_err(|_| ConfigError::ListenAddr(self.listen.clone()))
    }
}
