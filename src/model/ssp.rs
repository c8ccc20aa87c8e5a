//! System security plan (the subset the control layer reads and writes)

use serde::{Deserialize, Serialize};

use super::common::{Metadata, SetParameter};
use super::component::ImplementedRequirement;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SystemSecurityPlan {
    pub uuid: String,

    pub metadata: Metadata,

    pub import_profile: ImportProfile,

    pub control_implementation: SspControlImplementation,
}

/// The profile an SSP is written against
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ImportProfile {
    pub href: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SspControlImplementation {
    #[serde(default)]
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_parameters: Option<Vec<SetParameter>>,

    #[serde(default)]
    pub implemented_requirements: Vec<ImplementedRequirement>,
}

impl SystemSecurityPlan {
    /// Implemented requirement for a control, if the plan has one
    pub fn implemented_requirement(&self, control_id: &str) -> Option<&ImplementedRequirement> {
        self.control_implementation
            .implemented_requirements
            .iter()
            .find(|r| r.control_id == control_id)
    }
}
