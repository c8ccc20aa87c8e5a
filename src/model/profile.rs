//! Profile records: imports, merge directives and modifications

use serde::{Deserialize, Serialize};

use super::common::{Link, Metadata, Parameter, Part, Property, SetParameter};

/// A profile selecting and tailoring controls from catalogs or other profiles
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Profile {
    pub uuid: String,

    pub metadata: Metadata,

    #[serde(default)]
    pub imports: Vec<Import>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge: Option<Merge>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modify: Option<Modify>,
}

impl Profile {
    /// Alters in document order
    pub fn alters(&self) -> &[Alter] {
        self.modify
            .as_ref()
            .and_then(|m| m.alters.as_deref())
            .unwrap_or_default()
    }

    /// Set-parameters in document order
    pub fn set_parameters(&self) -> &[SetParameter] {
        self.modify
            .as_ref()
            .and_then(|m| m.set_parameters.as_deref())
            .unwrap_or_default()
    }
}

/// Empty marker object (`include-all: {}`, `flat: {}`)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Marker {}

/// One import of a catalog or profile, referenced by `href`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Import {
    pub href: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_all: Option<Marker>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_controls: Option<Vec<SelectControlById>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_controls: Option<Vec<SelectControlById>>,
}

impl Import {
    /// Import everything from `href`
    pub fn all(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            include_all: Some(Marker {}),
            ..Default::default()
        }
    }
}

/// Whether selecting a control also selects its enhancements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WithChildControls {
    Yes,
    No,
}

/// A glob pattern (`*`, `?`) over control ids
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Matching {
    pub pattern: String,
}

/// Control selector used by include/exclude
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SelectControlById {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub with_child_controls: Option<WithChildControls>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub with_ids: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matching: Option<Vec<Matching>>,
}

/// Conflict handling for controls that appear in more than one import
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CombineMethod {
    UseFirst,
    Merge,
    Keep,
    /// Any other method name; rejected during resolution
    #[serde(untagged)]
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Combine {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<CombineMethod>,
}

/// Merge directive of a profile
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Merge {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub combine: Option<Combine>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub as_is: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flat: Option<Marker>,

    /// Custom regrouping; accepted on the wire, rejected during resolution
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<serde_json::Value>,

    /// Directives this crate does not know; rejected during resolution
    #[serde(flatten, skip_serializing_if = "serde_json::Map::is_empty")]
    pub unknown: serde_json::Map<String, serde_json::Value>,
}

/// The `modify` block of a profile
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Modify {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_parameters: Option<Vec<SetParameter>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alters: Option<Vec<Alter>>,
}

/// Add/remove directives for one control
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Alter {
    pub control_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub removes: Option<Vec<Remove>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adds: Option<Vec<Add>>,
}

/// Removal criteria; every criterion given must match
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Remove {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub by_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub by_class: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub by_id: Option<String>,

    /// `parts` or `props`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub by_item_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub by_ns: Option<String>,
}

/// Where added content goes relative to its target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Before,
    After,
    Starting,
    #[default]
    Ending,
}

impl Position {
    /// `before` and `after` are meaningless without an existing `by_id` target
    pub fn requires_target(self) -> bool {
        matches!(self, Self::Before | Self::After)
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Before => write!(f, "before"),
            Self::After => write!(f, "after"),
            Self::Starting => write!(f, "starting"),
            Self::Ending => write!(f, "ending"),
        }
    }
}

/// Content to add to a control
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Add {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub by_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Vec<Parameter>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub props: Option<Vec<Property>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<Link>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parts: Option<Vec<Part>>,
}

impl Add {
    /// Effective position (`ending` when unspecified)
    pub fn position(&self) -> Position {
        self.position.unwrap_or_default()
    }
}
