//! File-system document store
//!
//! Reads and writes OSCAL documents as JSON (`.json`) or YAML (`.yaml`,
//! `.yml`) relative to a workspace root. Writes are skipped when the
//! serialized document is byte-identical to what is already on disk, so
//! regenerating an unchanged document never touches the file.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::LoadError;
use crate::model::{Catalog, OscalDocument};
use crate::resolve::{Document, DocumentLoader};

const FILE_SCHEME: &str = "file://";

/// Serialization format, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    /// Format for a path; unknown extensions are treated as JSON
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                Self::Yaml
            }
            _ => Self::Json,
        }
    }
}

/// Documents on disk under a root directory
#[derive(Debug, Clone)]
pub struct DocumentStore {
    root: PathBuf,
}

impl DocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path for an href: `file://` is stripped and relative paths join the root
    pub fn path_for(&self, href: &str) -> PathBuf {
        let trimmed = href.strip_prefix(FILE_SCHEME).unwrap_or(href);
        let path = Path::new(trimmed);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Read and parse the document at `href`
    pub fn read(&self, href: &str) -> Result<OscalDocument, LoadError> {
        let path = self.path_for(href);
        let text = std::fs::read_to_string(&path).map_err(|source| {
            if source.kind() == ErrorKind::NotFound {
                LoadError::NotFound {
                    href: href.to_string(),
                }
            } else {
                LoadError::Read {
                    path: path.clone(),
                    source,
                }
            }
        })?;

        let parsed = match DocumentFormat::from_path(&path) {
            DocumentFormat::Json => serde_json::from_str(&text).map_err(|e| e.to_string()),
            // via a JSON value so the envelope is read as a plain single-key mapping
            DocumentFormat::Yaml => serde_yaml::from_str::<serde_json::Value>(&text)
                .map_err(|e| e.to_string())
                .and_then(|value| serde_json::from_value(value).map_err(|e| e.to_string())),
        };
        let doc: OscalDocument = parsed.map_err(|message| LoadError::Parse {
            path: path.clone(),
            message,
        })?;
        tracing::debug!(path = %path.display(), kind = doc.kind(), "Loaded document");
        Ok(doc)
    }

    /// Read a document that must be a catalog
    pub fn read_catalog(&self, href: &str) -> Result<Catalog, LoadError> {
        match self.read(href)? {
            OscalDocument::Catalog(catalog) => Ok(catalog),
            other => Err(LoadError::UnsupportedKind {
                href: href.to_string(),
                kind: other.kind().to_string(),
            }),
        }
    }

    /// Canonical serialization of a document in the given format
    pub fn serialize(doc: &OscalDocument, format: DocumentFormat) -> Result<String, LoadError> {
        let result = match format {
            DocumentFormat::Json => serde_json::to_string_pretty(doc)
                .map(|mut s| {
                    s.push('\n');
                    s
                })
                .map_err(|e| e.to_string()),
            // serde_yaml writes enums as `!tag` values; OSCAL YAML wants a plain key
            DocumentFormat::Yaml => serde_json::to_value(doc)
                .map_err(|e| e.to_string())
                .and_then(|value| serde_yaml::to_string(&value).map_err(|e| e.to_string())),
        };
        result.map_err(|message| LoadError::Serialize {
            name: doc.kind().to_string(),
            message,
        })
    }

    /// Write `doc` under `name`, unless the file already holds identical content.
    ///
    /// Returns whether the file was written.
    pub fn save(&self, doc: &OscalDocument, name: &str) -> Result<bool, LoadError> {
        let path = self.path_for(name);
        let content = Self::serialize(doc, DocumentFormat::from_path(&path))?;

        match std::fs::read(&path) {
            Ok(existing) if existing == content.as_bytes() => {
                tracing::debug!(path = %path.display(), "Content unchanged, skipping write");
                return Ok(false);
            }
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(source) => return Err(LoadError::Read { path, source }),
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| LoadError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(&path, content).map_err(|source| LoadError::Write {
            path: path.clone(),
            source,
        })?;
        tracing::info!(path = %path.display(), kind = doc.kind(), "Wrote document");
        Ok(true)
    }
}

impl DocumentLoader for DocumentStore {
    fn load(&self, href: &str) -> Result<Document, LoadError> {
        Document::from_oscal(href, self.read(href)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Control, Import, Metadata, Profile};
    use crate::resolve::ProfileResolver;
    use tempfile::TempDir;

    fn catalog() -> Catalog {
        Catalog {
            uuid: "cat-1".into(),
            metadata: Metadata::titled("Catalog"),
            controls: Some(vec![Control::new("ac-1", "Policy")]),
            ..Default::default()
        }
    }

    #[test]
    fn test_save_skips_unchanged_content() {
        let dir = TempDir::new().unwrap();
        let store = DocumentStore::new(dir.path());
        let doc = OscalDocument::from(catalog());

        assert!(store.save(&doc, "catalogs/cat.json").unwrap());
        assert!(!store.save(&doc, "catalogs/cat.json").unwrap());

        let mut changed = catalog();
        changed.metadata.title = "Renamed".into();
        assert!(store.save(&changed.into(), "catalogs/cat.json").unwrap());
    }

    #[test]
    fn test_read_json_and_yaml() {
        let dir = TempDir::new().unwrap();
        let store = DocumentStore::new(dir.path());
        let doc = OscalDocument::from(catalog());
        store.save(&doc, "cat.json").unwrap();
        store.save(&doc, "cat.yaml").unwrap();

        assert_eq!(store.read("cat.json").unwrap(), doc);
        assert_eq!(store.read("cat.yaml").unwrap(), doc);

        let yaml = std::fs::read_to_string(dir.path().join("cat.yaml")).unwrap();
        assert!(yaml.starts_with("catalog:"));
    }

    #[test]
    fn test_file_scheme_and_missing_documents() {
        let dir = TempDir::new().unwrap();
        let store = DocumentStore::new(dir.path());
        store.save(&catalog().into(), "cat.json").unwrap();

        let absolute = format!("file://{}", dir.path().join("cat.json").display());
        assert!(store.read_catalog(&absolute).is_ok());

        assert!(matches!(store.read("nope.json"), Err(LoadError::NotFound { .. })));

        std::fs::write(dir.path().join("bad.json"), "{not json").unwrap();
        assert!(matches!(store.read("bad.json"), Err(LoadError::Parse { .. })));
    }

    #[test]
    fn test_store_as_resolver_loader() {
        let dir = TempDir::new().unwrap();
        let store = DocumentStore::new(dir.path());
        store.save(&catalog().into(), "cat.json").unwrap();
        let profile = Profile {
            uuid: "p-1".into(),
            metadata: Metadata::titled("Profile"),
            imports: vec![Import::all("cat.json")],
            ..Default::default()
        };
        store.save(&profile.into(), "profile.yaml").unwrap();

        let resolution = ProfileResolver::new(&store).resolve("profile.yaml").unwrap();
        assert!(resolution.catalog.find_control("ac-1").is_some());
    }
}
