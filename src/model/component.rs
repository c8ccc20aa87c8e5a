//! Component definitions and implementation records

use serde::{Deserialize, Serialize};

use super::common::{ImplementationStatus, Metadata, Property, SetParameter};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ComponentDefinition {
    pub uuid: String,

    pub metadata: Metadata,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<Vec<DefinedComponent>>,
}

/// A component and the controls it implements
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DefinedComponent {
    pub uuid: String,

    #[serde(rename = "type")]
    pub component_type: String,

    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub props: Option<Vec<Property>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control_implementations: Option<Vec<ControlImplementation>>,
}

/// A bucket of implemented requirements sourced from one profile or catalog
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ControlImplementation {
    pub uuid: String,

    pub source: String,

    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub props: Option<Vec<Property>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_parameters: Option<Vec<SetParameter>>,

    #[serde(default)]
    pub implemented_requirements: Vec<ImplementedRequirement>,
}

/// How one control is implemented
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ImplementedRequirement {
    pub uuid: String,

    pub control_id: String,

    #[serde(default)]
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub props: Option<Vec<Property>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_parameters: Option<Vec<SetParameter>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statements: Option<Vec<Statement>>,

    /// Only used in system security plans
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub by_components: Option<Vec<ByComponent>>,
}

impl ImplementedRequirement {
    /// Statements, empty when absent
    pub fn statements(&self) -> &[Statement] {
        self.statements.as_deref().unwrap_or_default()
    }
}

/// Implementation of one statement of a control
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Statement {
    pub statement_id: String,

    pub uuid: String,

    #[serde(default)]
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub props: Option<Vec<Property>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub by_components: Option<Vec<ByComponent>>,
}

/// Per-component implementation detail inside a system security plan
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ByComponent {
    pub component_uuid: String,

    pub uuid: String,

    #[serde(default)]
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub props: Option<Vec<Property>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_parameters: Option<Vec<SetParameter>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implementation_status: Option<ImplementationStatus>,
}
