//! Error types for the tailor CLI

use std::path::PathBuf;
use thiserror::Error;

use tailor::{ControlError, ErrorCategory, LoadError, MarkdownError, ResolveError};

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Failed to read configuration file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration file {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    /// `init` refuses to clobber an existing file without `--force`
    #[error("{path} already exists. Use --force to overwrite.")]
    AlreadyExists { path: PathBuf },

    #[error("Failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Control {control_id} not found in {catalog}")]
    ControlNotFound { control_id: String, catalog: String },

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Control(#[from] ControlError),

    #[error(transparent)]
    Markdown(#[from] MarkdownError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Category of a library error, if this wraps one
    pub fn category(&self) -> Option<ErrorCategory> {
        match self {
            Self::Resolve(e) => Some(e.category()),
            Self::Load(e) => Some(e.category()),
            Self::Control(e) => Some(e.category()),
            Self::Markdown(e) => Some(e.category()),
            Self::ConfigParse { .. } | Self::InvalidValue { .. } => {
                Some(ErrorCategory::Configuration)
            }
            Self::ControlNotFound { .. } => Some(ErrorCategory::Reference),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_passthrough() {
        let err = CliError::from(ResolveError::CyclicImport {
            chain: vec!["a.json".into(), "b.json".into(), "a.json".into()],
        });
        assert_eq!(err.category(), Some(ErrorCategory::Configuration));

        let err = CliError::from(MarkdownError::Unterminated);
        assert_eq!(err.category(), Some(ErrorCategory::Format));

        let err = CliError::ControlNotFound {
            control_id: "ac-1".into(),
            catalog: "cat.json".into(),
        };
        assert_eq!(err.category(), Some(ErrorCategory::Reference));
    }

    #[test]
    fn test_invalid_message() {
        let err = CliError::invalid("rep", "unknown representation: fancy");
        assert_eq!(err.to_string(), "Invalid value for rep: unknown representation: fancy");
    }
}
