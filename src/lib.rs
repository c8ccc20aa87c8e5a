//! # Tailor
//!
//! OSCAL profile resolution and control document utilities.
//!
//! This crate turns layered OSCAL profiles into resolved catalogs and
//! provides the control-level helpers needed to author and regenerate
//! control documents.
//!
//! ## Features
//!
//! - **Document Model**: serde types for catalogs, profiles, component
//!   definitions and SSPs in the OSCAL JSON/YAML wire format
//! - **Profile Resolution**: import selection, merge, alters and parameter
//!   settings, producing a resolved catalog plus any reference warnings
//! - **Control Interface**: property, part, parameter and component helpers
//! - **Markdown Headers**: deep merge of generated YAML headers into edited
//!   control markdown
//! - **Document Store**: JSON/YAML files under a workspace root, with
//!   unchanged writes skipped
//!
//! ## Quick Start
//!
//! ```ignore
//! use tailor::{init_tracing, DocumentStore, ProfileResolver, TailorConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = TailorConfig::from_env();
//!     init_tracing(&config.log)?;
//!
//!     let store = DocumentStore::new("workspace");
//!     let resolution = ProfileResolver::new(&store)
//!         .with_options(config.resolve)
//!         .resolve("profiles/moderate/profile.json")?;
//!     store.save(&resolution.catalog.into(), "catalogs/moderate-resolved.json")?;
//!     Ok(())
//! }
//! ```

mod config;
pub mod control;
pub mod error;
pub mod markdown;
pub mod model;
pub mod observability;
pub mod resolve;
pub mod store;

// Re-exports
pub use config::{TailorConfig, TailorConfigBuilder};
pub use error::{ControlError, ErrorCategory, LoadError, MarkdownError, ResolveError};
pub use markdown::{reconcile_header, reconcile_markdown, HeaderMerge};
pub use model::{Catalog, OscalDocument, Profile};
pub use observability::{init_tracing, LogConfig, LogFormat};
pub use resolve::{AlterWarning, DocumentLoader, ProfileResolver, Resolution, ResolveOptions};
pub use store::{DocumentFormat, DocumentStore};
