//! Configuration parsing for tailor.toml
//!
//! The file is optional. When it is absent the CLI falls back to
//! [`TailorConfig::from_env`].

use serde::Deserialize;
use std::path::{Path, PathBuf};

use tailor::{LogConfig, LogFormat, ResolveOptions, TailorConfig};

use crate::error::{CliError, Result};

/// Root configuration structure for tailor.toml
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TailorToml {
    #[serde(default)]
    pub resolve: ResolveSection,

    #[serde(default)]
    pub logging: LoggingSection,

    #[serde(default)]
    pub workspace: WorkspaceSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResolveSection {
    /// Keep withdrawn controls in resolved catalogs
    #[serde(default)]
    pub retain_withdrawn: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSection {
    #[serde(default)]
    pub format: LogFormat,

    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            filter: default_filter(),
        }
    }
}

fn default_filter() -> String {
    "warn".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkspaceSection {
    /// Directory relative hrefs are resolved against
    #[serde(default = "default_root")]
    pub root: PathBuf,
}

impl Default for WorkspaceSection {
    fn default() -> Self {
        Self {
            root: default_root(),
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

impl TailorToml {
    /// Load configuration from a file path
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| CliError::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::from_str(&content, path)
    }

    /// Parse configuration from a string
    pub fn from_str(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| CliError::ConfigParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Load `path` if it exists; otherwise defaults with the environment applied
    pub fn load_or_env(path: &Path) -> Result<(Self, TailorConfig)> {
        if path.exists() {
            let file = Self::from_file(path)?;
            let config = file.to_config();
            Ok((file, config))
        } else {
            Ok((Self::default(), TailorConfig::from_env()))
        }
    }

    pub fn to_config(&self) -> TailorConfig {
        TailorConfig {
            resolve: ResolveOptions {
                retain_withdrawn: self.resolve.retain_withdrawn,
            },
            log: LogConfig {
                format: self.logging.format,
                filter: self.logging.filter.clone(),
            },
        }
    }
}

/// Starter tailor.toml written by `tailor init`
pub fn init_template(root: &str) -> String {
    format!(
        r#"# Tailor Configuration

[workspace]
# Relative document hrefs are resolved against this directory
root = "{}"

[resolve]
# Keep controls marked withdrawn in resolved catalogs
retain_withdrawn = false

[logging]
# pretty, json, or compact
format = "pretty"
# RUST_LOG overrides this when set
filter = "warn"
"#,
        root
    )
}
