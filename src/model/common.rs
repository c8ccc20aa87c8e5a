//! Shared OSCAL building blocks
//!
//! Properties, parts, parameters and the other small records that every
//! document kind (catalog, profile, component definition, SSP) is built from.

use serde::{Deserialize, Serialize};

/// A name/value annotation attached to a document node.
///
/// Names are not unique: a node may carry several properties with the same
/// name (repeated rule bindings, for example).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Property {
    pub name: String,

    pub value: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

impl Property {
    /// Create a property without class or remarks
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            class: None,
            remarks: None,
        }
    }

    /// Attach remarks to the property
    pub fn with_remarks(mut self, remarks: impl Into<String>) -> Self {
        self.remarks = Some(remarks.into());
        self
    }
}

/// A reference to another resource
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Link {
    pub href: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rel: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// A recursive unit of prose within a control, group or added content.
///
/// Statements (`statement`, `item`) and named sections (`guidance`, ...) are
/// all parts; nesting depth is unbounded.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Part {
    #[serde(default)]
    pub id: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ns: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub props: Option<Vec<Property>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prose: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parts: Option<Vec<Part>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<Link>>,
}

impl Part {
    /// Create a part with prose and no children
    pub fn new(id: impl Into<String>, name: impl Into<String>, prose: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            prose: Some(prose.into()),
            ..Default::default()
        }
    }

    /// Child parts, empty when absent
    pub fn children(&self) -> &[Part] {
        self.parts.as_deref().unwrap_or_default()
    }
}

/// How many choices of a selection-typed parameter may be picked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HowMany {
    One,
    OneOrMore,
}

impl std::fmt::Display for HowMany {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::One => write!(f, "one"),
            Self::OneOrMore => write!(f, "one or more"),
        }
    }
}

/// Enumerated choices of a selection-typed parameter
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ParameterSelection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub how_many: Option<HowMany>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choice: Option<Vec<String>>,
}

/// Prose guidance attached to a parameter
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Guideline {
    pub prose: String,
}

/// A catalog-resident parameter.
///
/// Either value-typed (`values`) or selection-typed (`select`); both may be
/// present, in which case rendering prefers the values.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Parameter {
    #[serde(default)]
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub props: Option<Vec<Property>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guidelines: Option<Vec<Guideline>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select: Option<ParameterSelection>,
}

/// Profile or implementation level override of a parameter, keyed by `param_id`.
///
/// This is overlay data, not a parameter; see
/// [`setparam_to_param`](crate::control::setparam_to_param) for the conversion.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SetParameter {
    pub param_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub props: Option<Vec<Property>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select: Option<ParameterSelection>,
}

/// Implementation state of a requirement or statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImplementationStatus {
    pub state: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

impl ImplementationStatus {
    /// Status with the given state and no remarks
    pub fn new(state: impl Into<String>) -> Self {
        Self {
            state: state.into(),
            remarks: None,
        }
    }
}

impl Default for ImplementationStatus {
    fn default() -> Self {
        Self::new(crate::control::STATUS_OTHER)
    }
}

/// Document metadata
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Metadata {
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,

    #[serde(default)]
    pub version: String,

    #[serde(default)]
    pub oscal_version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub props: Option<Vec<Property>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

impl Metadata {
    /// Metadata with only a title set
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }
}
