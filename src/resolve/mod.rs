//! Profile Resolution
//!
//! Turns a profile and its transitive import graph into one resolved
//! catalog. Resolution is a single synchronous pass:
//!
//! 1. Each import is loaded through a [`DocumentLoader`]; imported profiles
//!    are resolved first, depth first, with cycles reported as
//!    [`ResolveError::CyclicImport`].
//! 2. The import's include/exclude selectors are applied to the source.
//! 3. Sources are merged in import order according to the merge directive.
//! 4. Alters are applied (removes before adds), then set-parameters.
//! 5. Withdrawn controls are dropped unless [`ResolveOptions::retain_withdrawn`].
//!
//! Recoverable reference problems do not stop resolution; they come back as
//! [`AlterWarning`]s alongside the catalog and are logged at `warn`.
//!
//! # Usage
//!
//! ```ignore
//! use tailor::resolve::{MemoryLoader, ProfileResolver, ResolveOptions};
//!
//! let loader = MemoryLoader::new()
//!     .with("catalogs/nist.json", catalog)
//!     .with("profiles/moderate.json", profile);
//! let resolution = ProfileResolver::new(&loader)
//!     .with_options(ResolveOptions { retain_withdrawn: false })
//!     .resolve("profiles/moderate.json")?;
//! for warning in &resolution.warnings {
//!     eprintln!("{warning}");
//! }
//! ```

mod loader;
mod merge;
mod modify;
mod select;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ResolveError, Result};
use crate::model::{Catalog, Import, Position, Profile};

pub use loader::{Document, DocumentLoader, MemoryLoader};

use merge::{merge_sources, MergePlan};
use modify::{apply_alters, apply_set_parameters, drop_withdrawn};
use select::select_controls;

/// Caller-controlled resolution policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveOptions {
    /// Keep controls marked `status = withdrawn` in the output
    pub retain_withdrawn: bool,
}

/// Why a directive was skipped
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ReferenceIssue {
    /// The alter's control is not in the resolved catalog
    MissingControl,
    /// The add's `by-id` names nothing in the control
    MissingTarget { by_id: String },
    /// `before`/`after` given without `by-id`
    TargetRequired { position: Position },
    /// A set-parameter names a parameter absent from the catalog
    UnknownParameter { param_id: String },
}

impl std::fmt::Display for ReferenceIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingControl => write!(f, "control not found"),
            Self::MissingTarget { by_id } => write!(f, "target {by_id} not found"),
            Self::TargetRequired { position } => {
                write!(f, "position {position} requires a by-id target")
            }
            Self::UnknownParameter { param_id } => write!(f, "parameter {param_id} not found"),
        }
    }
}

/// A skipped directive, with enough context to find it in the profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlterWarning {
    /// Profile the directive came from
    pub profile: String,
    /// Target control; absent for set-parameter warnings
    pub control_id: Option<String>,
    /// Index of the alter (or set-parameter) in the profile
    pub alter_index: usize,
    /// Index of the add within the alter
    pub add_index: Option<usize>,
    pub issue: ReferenceIssue,
}

impl AlterWarning {
    pub(crate) fn for_alter(
        profile: &str,
        control_id: &str,
        alter_index: usize,
        add_index: Option<usize>,
        issue: ReferenceIssue,
    ) -> Self {
        Self {
            profile: profile.to_string(),
            control_id: Some(control_id.to_string()),
            alter_index,
            add_index,
            issue,
        }
    }

    pub(crate) fn for_set_parameter(profile: &str, index: usize, param_id: &str) -> Self {
        Self {
            profile: profile.to_string(),
            control_id: None,
            alter_index: index,
            add_index: None,
            issue: ReferenceIssue::UnknownParameter {
                param_id: param_id.to_string(),
            },
        }
    }

    /// Log the warning and record it
    pub(crate) fn emit(self, warnings: &mut Vec<AlterWarning>) {
        tracing::warn!(
            profile = %self.profile,
            control_id = self.control_id.as_deref().unwrap_or_default(),
            alter_index = self.alter_index,
            add_index = ?self.add_index,
            issue = %self.issue,
            "Skipping profile directive"
        );
        warnings.push(self);
    }
}

impl std::fmt::Display for AlterWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.control_id, self.add_index) {
            (Some(control_id), Some(add)) => write!(
                f,
                "{}: alter {} add {} on {}: {}",
                self.profile, self.alter_index, add, control_id, self.issue
            ),
            (Some(control_id), None) => write!(
                f,
                "{}: alter {} on {}: {}",
                self.profile, self.alter_index, control_id, self.issue
            ),
            (None, _) => write!(
                f,
                "{}: set-parameter {}: {}",
                self.profile, self.alter_index, self.issue
            ),
        }
    }
}

/// A resolved catalog and the directives skipped while producing it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub catalog: Catalog,
    pub warnings: Vec<AlterWarning>,
}

/// Deterministic id of the catalog resolved from a profile
fn resolved_uuid(profile_uuid: &str) -> String {
    let name = format!("urn:oscal:resolved-profile:{profile_uuid}");
    Uuid::new_v5(&Uuid::NAMESPACE_URL, name.as_bytes()).to_string()
}

/// Resolves profiles against documents supplied by a loader
pub struct ProfileResolver<'a> {
    loader: &'a dyn DocumentLoader,
    options: ResolveOptions,
}

impl<'a> ProfileResolver<'a> {
    pub fn new(loader: &'a dyn DocumentLoader) -> Self {
        Self {
            loader,
            options: ResolveOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ResolveOptions) -> Self {
        self.options = options;
        self
    }

    /// Load the profile at `href` and resolve it
    pub fn resolve(&self, href: &str) -> Result<Resolution> {
        let doc = self.loader.load(href).map_err(|source| ResolveError::Load {
            href: href.to_string(),
            source,
        })?;
        match doc {
            Document::Profile(profile) => self.resolve_profile(&profile, href),
            other => Err(ResolveError::WrongDocumentKind {
                href: href.to_string(),
                expected: "profile",
                found: other.kind(),
            }),
        }
    }

    /// Resolve an in-memory profile; `name` identifies it in errors and cycle checks
    pub fn resolve_profile(&self, profile: &Profile, name: &str) -> Result<Resolution> {
        let mut warnings = Vec::new();
        let mut chain = vec![name.to_string()];
        let catalog = self.resolve_node(profile, name, &mut chain, &mut warnings)?;

        tracing::info!(
            profile = name,
            controls = catalog.all_controls().len(),
            warnings = warnings.len(),
            "Profile resolved"
        );
        Ok(Resolution { catalog, warnings })
    }

    fn resolve_node(
        &self,
        profile: &Profile,
        name: &str,
        chain: &mut Vec<String>,
        warnings: &mut Vec<AlterWarning>,
    ) -> Result<Catalog> {
        let plan = MergePlan::from_directive(name, profile.merge.as_ref(), profile.imports.len())?;

        let mut sources = Vec::with_capacity(profile.imports.len());
        for import in &profile.imports {
            let source = self.load_import(import, name, chain, warnings)?;
            sources.push(select_controls(&source, import)?);
        }

        let mut catalog = merge_sources(name, plan, sources)?;
        apply_alters(&mut catalog, profile, name, warnings)?;
        apply_set_parameters(&mut catalog, profile, name, warnings);

        if !self.options.retain_withdrawn {
            let dropped = drop_withdrawn(&mut catalog);
            if dropped > 0 {
                tracing::debug!(profile = name, dropped, "Dropped withdrawn controls");
            }
        }

        catalog.uuid = resolved_uuid(&profile.uuid);
        catalog.metadata = profile.metadata.clone();
        Ok(catalog)
    }

    fn load_import(
        &self,
        import: &Import,
        importer: &str,
        chain: &mut Vec<String>,
        warnings: &mut Vec<AlterWarning>,
    ) -> Result<Catalog> {
        let href = import.href.as_str();
        if chain.iter().any(|h| h == href) {
            let mut cycle = chain.clone();
            cycle.push(href.to_string());
            return Err(ResolveError::CyclicImport { chain: cycle });
        }

        tracing::debug!(importer, href, depth = chain.len(), "Loading import");
        let doc = self
            .loader
            .load(href)
            .map_err(|source| ResolveError::MissingSource {
                href: href.to_string(),
                importer: importer.to_string(),
                source,
            })?;

        match doc {
            Document::Catalog(catalog) => Ok(catalog),
            Document::Profile(profile) => {
                chain.push(href.to_string());
                let resolved = self.resolve_node(&profile, href, chain, warnings);
                chain.pop();
                resolved
            }
        }
    }
}
