//! Library configuration
//!
//! Groups resolution options and logging settings so binaries can load
//! them from the environment or build them programmatically.
//!
//! # Example
//!
//! ```ignore
//! use tailor::TailorConfig;
//!
//! // Load from environment variables
//! let config = TailorConfig::from_env();
//!
//! // Or build programmatically
//! let config = TailorConfig::builder()
//!     .retain_withdrawn(true)
//!     .log_filter("tailor=debug")
//!     .build();
//! ```

use crate::observability::{LogConfig, LogFormat};
use crate::resolve::ResolveOptions;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TailorConfig {
    /// Options passed to every profile resolution
    pub resolve: ResolveOptions,
    pub log: LogConfig,
}

impl TailorConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `TAILOR_RETAIN_WITHDRAWN`: "true"/"1" to keep withdrawn controls (default: "false")
    /// - `TAILOR_LOG_FORMAT`: "pretty", "json", or "compact" (default: "pretty")
    /// - `RUST_LOG`: Log filter directive (default: "info")
    pub fn from_env() -> Self {
        let retain_withdrawn = std::env::var("TAILOR_RETAIN_WITHDRAWN")
            .map(|s| parse_flag(&s))
            .unwrap_or(false);

        let config = Self {
            resolve: ResolveOptions { retain_withdrawn },
            log: LogConfig::from_env(),
        };
        tracing::debug!(
            retain_withdrawn,
            log_format = ?config.log.format,
            "Loaded configuration from environment"
        );
        config
    }

    pub fn builder() -> TailorConfigBuilder {
        TailorConfigBuilder::default()
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

/// Builder for TailorConfig
#[derive(Debug, Clone, Default)]
pub struct TailorConfigBuilder {
    config: TailorConfig,
}

impl TailorConfigBuilder {
    /// Keep withdrawn controls in resolved catalogs.
    pub fn retain_withdrawn(mut self, retain: bool) -> Self {
        self.config.resolve.retain_withdrawn = retain;
        self
    }

    pub fn log_format(mut self, format: LogFormat) -> Self {
        self.config.log.format = format;
        self
    }

    pub fn log_filter(mut self, filter: impl Into<String>) -> Self {
        self.config.log.filter = filter.into();
        self
    }

    pub fn build(self) -> TailorConfig {
        self.config
    }
}
