//! Logging
//!
//! Resolution and markdown reconciliation report through `tracing`. This
//! module installs a stderr subscriber for binaries that want to see those
//! events. Stdout stays free for command output such as a resolved catalog.
//!
//! ```ignore
//! use tailor::observability::{init_tracing, LogConfig, LogFormat};
//!
//! let config = LogConfig::builder().format(LogFormat::Compact).filter("tailor=debug").build();
//! init_tracing(&config)?;
//! ```

use std::env;

use serde::Deserialize;
use tracing::Subscriber;
use tracing_subscriber::{fmt, fmt::MakeWriter, layer::SubscriberExt, EnvFilter};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable format for interactive use
    #[default]
    Pretty,
    /// JSON lines for log aggregation
    Json,
    /// Compact single-line format
    Compact,
}

impl LogFormat {
    /// Parse a format name; unknown names yield `None`
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "pretty" => Some(Self::Pretty),
            "json" => Some(Self::Json),
            "compact" => Some(Self::Compact),
            _ => None,
        }
    }
}

/// Subscriber configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub format: LogFormat,
    /// Filter directive (e.g., "info", "tailor=debug")
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            filter: "info".to_string(),
        }
    }
}

impl LogConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `TAILOR_LOG_FORMAT`: "pretty", "json", or "compact" (default: "pretty")
    /// - `RUST_LOG`: Log filter directive (default: "info")
    pub fn from_env() -> Self {
        let format = env::var("TAILOR_LOG_FORMAT")
            .ok()
            .and_then(|v| LogFormat::parse(&v))
            .unwrap_or_default();
        let filter = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
        Self { format, filter }
    }

    pub fn builder() -> LogConfigBuilder {
        LogConfigBuilder::default()
    }
}

/// Builder for LogConfig
#[derive(Default)]
pub struct LogConfigBuilder {
    config: LogConfig,
}

impl LogConfigBuilder {
    pub fn format(mut self, format: LogFormat) -> Self {
        self.config.format = format;
        self
    }

    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.config.filter = filter.into();
        self
    }

    pub fn build(self) -> LogConfig {
        self.config
    }
}

/// Logging setup errors
#[derive(Debug, thiserror::Error)]
pub enum ObservabilityError {
    #[error("Invalid log filter: {0}")]
    Filter(String),

    #[error("Failed to init tracing: {0}")]
    Init(String),
}

/// Build a subscriber that writes formatted events to `writer`
fn subscriber<W>(format: LogFormat, filter: EnvFilter, writer: W) -> Box<dyn Subscriber + Send + Sync>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Pretty => Box::new(registry.with(
            fmt::layer()
                .pretty()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_writer(writer),
        )),
        LogFormat::Json => Box::new(registry.with(
            fmt::layer()
                .json()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_writer(writer),
        )),
        LogFormat::Compact => Box::new(registry.with(
            fmt::layer().compact().with_target(true).with_writer(writer),
        )),
    }
}

/// Install the global stderr subscriber.
///
/// `RUST_LOG` takes precedence over the configured filter. Fails if a global
/// subscriber is already set.
pub fn init_tracing(config: &LogConfig) -> Result<(), ObservabilityError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .map_err(|e| ObservabilityError::Filter(e.to_string()))?;

    tracing::subscriber::set_global_default(subscriber(config.format, filter, std::io::stderr))
        .map_err(|e| ObservabilityError::Init(e.to_string()))?;

    tracing::debug!(format = ?config.format, filter = %config.filter, "Tracing initialized");
    Ok(())
}
