//! Sources of catalogs and profiles for the resolver

use std::collections::HashMap;

use crate::error::LoadError;
use crate::model::{Catalog, OscalDocument, Profile};

/// A document that can appear in an import graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Document {
    Catalog(Catalog),
    Profile(Profile),
}

impl Document {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Catalog(_) => "catalog",
            Self::Profile(_) => "profile",
        }
    }

    /// Unwrap an on-disk envelope; only catalogs and profiles are importable
    pub fn from_oscal(href: &str, doc: OscalDocument) -> Result<Self, LoadError> {
        match doc {
            OscalDocument::Catalog(catalog) => Ok(Self::Catalog(catalog)),
            OscalDocument::Profile(profile) => Ok(Self::Profile(profile)),
            other => Err(LoadError::UnsupportedKind {
                href: href.to_string(),
                kind: other.kind().to_string(),
            }),
        }
    }
}

impl From<Catalog> for Document {
    fn from(catalog: Catalog) -> Self {
        Self::Catalog(catalog)
    }
}

impl From<Profile> for Document {
    fn from(profile: Profile) -> Self {
        Self::Profile(profile)
    }
}

/// Loads the document an import `href` points at.
///
/// Implemented for closures, [`MemoryLoader`] and
/// [`DocumentStore`](crate::store::DocumentStore).
pub trait DocumentLoader {
    fn load(&self, href: &str) -> Result<Document, LoadError>;
}

impl<F> DocumentLoader for F
where
    F: Fn(&str) -> Result<Document, LoadError>,
{
    fn load(&self, href: &str) -> Result<Document, LoadError> {
        self(href)
    }
}

/// Documents held in memory, keyed by href
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    documents: HashMap<String, Document>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a document under `href`, replacing any previous one
    pub fn insert(&mut self, href: impl Into<String>, doc: impl Into<Document>) {
        self.documents.insert(href.into(), doc.into());
    }

    /// Builder form of [`MemoryLoader::insert`]
    pub fn with(mut self, href: impl Into<String>, doc: impl Into<Document>) -> Self {
        self.insert(href, doc);
        self
    }
}

impl DocumentLoader for MemoryLoader {
    fn load(&self, href: &str) -> Result<Document, LoadError> {
        self.documents
            .get(href)
            .cloned()
            .ok_or_else(|| LoadError::NotFound {
                href: href.to_string(),
            })
    }
}
