//! Error types
//!
//! Four classes of failure show up across the crate:
//!
//! - **Configuration**: the profile graph itself is unusable (cyclic import,
//!   unsupported merge directive). Fatal to a resolution.
//! - **Reference**: a directive names something that does not exist. Fatal
//!   when the resolution cannot continue without it (a missing source
//!   document), otherwise reported as an [`AlterWarning`](crate::resolve::AlterWarning)
//!   and skipped.
//! - **Data consistency**: property metadata is duplicated or out of order.
//!   Fatal to the single lookup that found it.
//! - **Format**: a render template is malformed. Fatal to that render call.

use std::path::PathBuf;

use thiserror::Error;

/// Broad class of an error, independent of the concrete variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Reference,
    DataConsistency,
    Format,
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration => write!(f, "configuration"),
            Self::Reference => write!(f, "reference"),
            Self::DataConsistency => write!(f, "data consistency"),
            Self::Format => write!(f, "format"),
            Self::Io => write!(f, "io"),
        }
    }
}

/// Errors raised by control-interface lookups and renders
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ControlError {
    /// Two `rule_name_id` properties claim the same rule id
    #[error("Duplicate rule {rule_id} found in properties")]
    DuplicateRuleMetadata { rule_id: String },

    /// Two `param_id` properties for the same rule
    #[error("Duplicate param {param_name} found for rule {rule_id}")]
    DuplicateParamMetadata { rule_id: String, param_name: String },

    /// A `param_description` or `param_options` property with no preceding `param_id`
    #[error("Param {field} for rule {rule_id} found with no param_id")]
    OrphanParamMetadata { rule_id: String, field: String },

    /// Render template with more than one `.` marker
    #[error("Additional text {template} for the parameters cannot contain multiple dots (.)")]
    Format { template: String },

    /// Label that cannot be reduced to an NCName
    #[error("Unable to convert label {label} to NCNAME format")]
    NcName { label: String },
}

impl ControlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::DuplicateRuleMetadata { .. }
            | Self::DuplicateParamMetadata { .. }
            | Self::OrphanParamMetadata { .. } => ErrorCategory::DataConsistency,
            Self::Format { .. } | Self::NcName { .. } => ErrorCategory::Format,
        }
    }
}

/// Errors reading or writing markdown front matter
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarkdownError {
    /// The YAML between the `---` fences does not parse
    #[error("Invalid markdown header: {message}")]
    InvalidHeader { message: String },

    /// The header parses but is not a mapping
    #[error("Markdown header must be a mapping")]
    HeaderNotMapping,

    /// An opening `---` fence with no closing fence
    #[error("Markdown header is not terminated by ---")]
    Unterminated,

    #[error("Failed to render markdown header: {message}")]
    Render { message: String },
}

impl MarkdownError {
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::Format
    }
}

/// Failure to produce a document for an href
#[derive(Error, Debug)]
pub enum LoadError {
    /// Nothing is registered or stored under this href
    #[error("Document not found: {href}")]
    NotFound { href: String },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Failed to serialize {name}: {message}")]
    Serialize { name: String, message: String },

    /// The document exists but is neither a catalog nor a profile
    #[error("{href} is a {kind}, expected a catalog or profile")]
    UnsupportedKind { href: String, kind: String },
}

impl LoadError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound { .. } => ErrorCategory::Reference,
            Self::UnsupportedKind { .. } => ErrorCategory::Configuration,
            _ => ErrorCategory::Io,
        }
    }
}

/// Fatal resolution failures; no partial catalog is returned with any of these
#[derive(Error, Debug)]
pub enum ResolveError {
    /// A profile imports itself, directly or transitively
    #[error("Cyclic import: {}", chain.join(" -> "))]
    CyclicImport { chain: Vec<String> },

    #[error("Unsupported merge directive '{directive}' in profile {profile}")]
    UnsupportedMerge { profile: String, directive: String },

    /// `as-is` merging passes exactly one source through
    #[error("Profile {profile} uses as-is merge with {count} imports; exactly one is required")]
    AsIsImportCount { profile: String, count: usize },

    /// The profile handed to the resolver could not be loaded
    #[error("Unable to load {href}: {source}")]
    Load {
        href: String,
        #[source]
        source: LoadError,
    },

    /// The document handed to the resolver is not a profile
    #[error("{href} is a {found}, expected a {expected}")]
    WrongDocumentKind {
        href: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Unable to load {href} imported by {importer}: {source}")]
    MissingSource {
        href: String,
        importer: String,
        #[source]
        source: LoadError,
    },

    /// An alter with a before/after add targets a control absent from the catalog
    #[error("Alter {alter_index} in profile {profile} targets missing control {control_id}")]
    MissingControl {
        profile: String,
        control_id: String,
        alter_index: usize,
    },

    #[error("Duplicate {kind} id '{id}' in resolved catalog for profile {profile}")]
    DuplicateId {
        profile: String,
        kind: &'static str,
        id: String,
    },

    #[error("Invalid control selector pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
}

impl ResolveError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::CyclicImport { .. }
            | Self::UnsupportedMerge { .. }
            | Self::AsIsImportCount { .. }
            | Self::DuplicateId { .. }
            | Self::InvalidPattern { .. }
            | Self::WrongDocumentKind { .. } => ErrorCategory::Configuration,
            Self::Load { source, .. } | Self::MissingSource { source, .. } => source.category(),
            Self::MissingControl { .. } => ErrorCategory::Reference,
        }
    }
}

/// Result type alias for resolution
pub type Result<T> = std::result::Result<T, ResolveError>;
