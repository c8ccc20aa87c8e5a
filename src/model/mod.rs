//! OSCAL Document Model
//!
//! Plain serde records for the four document kinds handled by this crate:
//! catalogs, profiles, component definitions and system security plans.
//! Field names follow the OSCAL JSON/YAML wire format (kebab-case), so a
//! document read from disk round-trips without loss of the fields modelled
//! here.
//!
//! Nodes that carry properties implement [`HasProperties`], which is the only
//! capability the control layer needs to read or rewrite them.

mod catalog;
mod common;
mod component;
mod profile;
mod ssp;

use serde::{Deserialize, Serialize};

pub use catalog::{Catalog, Control, Group};
pub use common::{
    Guideline, HowMany, ImplementationStatus, Link, Metadata, Parameter, ParameterSelection,
    Part, Property, SetParameter,
};
pub use component::{
    ByComponent, ComponentDefinition, ControlImplementation, DefinedComponent,
    ImplementedRequirement, Statement,
};
pub use profile::{
    Add, Alter, Combine, CombineMethod, Import, Marker, Matching, Merge, Modify, Position,
    Profile, Remove, SelectControlById, WithChildControls,
};
pub use ssp::{ImportProfile, SspControlImplementation, SystemSecurityPlan};

/// Read/write access to the property list of a node.
///
/// `set_properties` with an empty vector stores "absent", so there is a single
/// representation of "no properties".
pub trait HasProperties {
    /// Properties in document order
    fn properties(&self) -> &[Property];

    /// Replace the property list
    fn set_properties(&mut self, props: Vec<Property>);

    /// Take the property list out, leaving the node without properties
    fn take_properties(&mut self) -> Vec<Property> {
        let props = self.properties().to_vec();
        self.set_properties(Vec::new());
        props
    }
}

macro_rules! impl_has_properties {
    ($($ty:ty),* $(,)?) => {
        $(
            impl HasProperties for $ty {
                fn properties(&self) -> &[Property] {
                    self.props.as_deref().unwrap_or_default()
                }

                fn set_properties(&mut self, props: Vec<Property>) {
                    self.props = if props.is_empty() { None } else { Some(props) };
                }

                fn take_properties(&mut self) -> Vec<Property> {
                    self.props.take().unwrap_or_default()
                }
            }
        )*
    };
}

impl_has_properties!(
    Control,
    Group,
    Part,
    Parameter,
    SetParameter,
    DefinedComponent,
    ControlImplementation,
    ImplementedRequirement,
    Statement,
    ByComponent,
);

/// On-disk envelope: a single top-level key naming the document kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OscalDocument {
    Catalog(Catalog),
    Profile(Profile),
    ComponentDefinition(ComponentDefinition),
    SystemSecurityPlan(SystemSecurityPlan),
}

impl OscalDocument {
    /// Short name of the document kind, as used in the envelope
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Catalog(_) => "catalog",
            Self::Profile(_) => "profile",
            Self::ComponentDefinition(_) => "component-definition",
            Self::SystemSecurityPlan(_) => "system-security-plan",
        }
    }
}

impl From<Catalog> for OscalDocument {
    fn from(catalog: Catalog) -> Self {
        Self::Catalog(catalog)
    }
}

impl From<Profile> for OscalDocument {
    fn from(profile: Profile) -> Self {
        Self::Profile(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_profile_wire_names() {
        let value = json!({
            "profile": {
                "uuid": "p-1",
                "metadata": {"title": "Tailored", "version": "1.0", "oscal-version": "1.0.4"},
                "imports": [{
                    "href": "catalogs/nist.json",
                    "include-controls": [{"with-child-controls": "yes", "with-ids": ["ac-1"]}]
                }],
                "merge": {"combine": {"method": "use-first"}},
                "modify": {
                    "set-parameters": [{"param-id": "ac-1_prm_1", "values": ["daily"]}],
                    "alters": [{
                        "control-id": "ac-1",
                        "removes": [{"by-name": "guidance"}],
                        "adds": [{"position": "after", "by-id": "ac-1_smt", "props": [{"name": "x", "value": "y"}]}]
                    }]
                }
            }
        });

        let doc: OscalDocument = serde_json::from_value(value).unwrap();
        let OscalDocument::Profile(profile) = doc else {
            panic!("expected a profile");
        };
        assert_eq!(profile.imports[0].href, "catalogs/nist.json");
        let selector = &profile.imports[0].include_controls.as_ref().unwrap()[0];
        assert_eq!(selector.with_child_controls, Some(WithChildControls::Yes));
        let merge = profile.merge.as_ref().unwrap();
        assert_eq!(
            merge.combine.as_ref().unwrap().method,
            Some(CombineMethod::UseFirst)
        );
        assert_eq!(profile.set_parameters()[0].values, Some(vec!["daily".to_string()]));
        assert_eq!(profile.alters()[0].removes.as_ref().unwrap()[0].by_name.as_deref(), Some("guidance"));
    }

    #[test]
    fn test_modify_accessors() {
        let profile: Profile = serde_json::from_value(json!({
            "uuid": "p-2",
            "metadata": {"title": "t"},
            "imports": [],
            "modify": {
                "set-parameters": [{"param-id": "p1", "label": "L"}],
                "alters": [{"control-id": "ac-2", "adds": [{"position": "before", "by-id": "x"}]}]
            }
        }))
        .unwrap();

        assert_eq!(profile.set_parameters()[0].param_id, "p1");
        assert_eq!(profile.alters()[0].control_id, "ac-2");
        let add = &profile.alters()[0].adds.as_ref().unwrap()[0];
        assert_eq!(add.position(), Position::Before);
        assert!(add.position().requires_target());
    }

    #[test]
    fn test_empty_properties_collapse_to_absent() {
        let mut control = Control::new("ac-1", "Policy");
        control.set_properties(vec![Property::new("label", "AC-1")]);
        assert_eq!(control.properties().len(), 1);

        control.set_properties(Vec::new());
        assert!(control.props.is_none());

        let json = serde_json::to_value(&control).unwrap();
        assert!(json.get("props").is_none());
    }

    #[test]
    fn test_catalog_find_control_in_enhancements() {
        let mut parent = Control::new("ac-2", "Account Management");
        parent.controls = Some(vec![Control::new("ac-2.1", "Automated")]);
        let catalog = Catalog {
            uuid: "c".into(),
            metadata: Metadata::titled("cat"),
            groups: Some(vec![Group {
                id: "ac".into(),
                title: "Access Control".into(),
                controls: Some(vec![parent]),
                ..Default::default()
            }]),
            ..Default::default()
        };

        assert!(catalog.find_control("ac-2.1").is_some());
        let ids: Vec<&str> = catalog.all_controls().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["ac-2", "ac-2.1"]);
    }

    #[test]
    fn test_component_type_field() {
        let comp: DefinedComponent = serde_json::from_value(json!({
            "uuid": "u", "type": "software", "title": "Web", "description": "d"
        }))
        .unwrap();
        assert_eq!(comp.component_type, "software");
        assert!(comp.control_implementations.is_none());
    }

    #[test]
    fn test_ssp_by_components() {
        let doc: OscalDocument = serde_json::from_value(json!({
            "system-security-plan": {
                "uuid": "ssp-1",
                "metadata": {"title": "Plan"},
                "import-profile": {"href": "profiles/moderate.json"},
                "control-implementation": {
                    "description": "All controls",
                    "implemented-requirements": [{
                        "uuid": "ir-1",
                        "control-id": "ac-1",
                        "by-components": [{
                            "component-uuid": "comp-1",
                            "uuid": "bc-1",
                            "description": "Handled by the web tier",
                            "implementation-status": {"state": "implemented"}
                        }]
                    }]
                }
            }
        }))
        .unwrap();
        assert_eq!(doc.kind(), "system-security-plan");

        let OscalDocument::SystemSecurityPlan(ssp) = doc else {
            panic!("expected an ssp");
        };
        assert_eq!(ssp.import_profile.href, "profiles/moderate.json");
        let req = ssp.implemented_requirement("ac-1").unwrap();
        let by_comp = &req.by_components.as_ref().unwrap()[0];
        assert_eq!(
            by_comp.implementation_status.as_ref().map(|s| s.state.as_str()),
            Some("implemented")
        );
        assert!(ssp.implemented_requirement("ac-2").is_none());
    }
}
