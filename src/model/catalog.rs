//! Catalog, group and control records

use serde::{Deserialize, Serialize};

use super::common::{Link, Metadata, Parameter, Part, Property};

/// A collection of controls, optionally organised in nested groups.
///
/// After resolution every control id is unique across the whole catalog.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Catalog {
    pub uuid: String,

    pub metadata: Metadata,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Vec<Parameter>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controls: Option<Vec<Control>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<Group>>,
}

impl Catalog {
    /// Top-level controls, empty when absent
    pub fn controls(&self) -> &[Control] {
        self.controls.as_deref().unwrap_or_default()
    }

    /// Top-level groups, empty when absent
    pub fn groups(&self) -> &[Group] {
        self.groups.as_deref().unwrap_or_default()
    }

    /// Find a control anywhere in the catalog (groups and enhancements included)
    pub fn find_control(&self, control_id: &str) -> Option<&Control> {
        find_in_controls(self.controls(), control_id)
            .or_else(|| self.groups().iter().find_map(|g| g.find_control(control_id)))
    }

    /// Mutable counterpart of [`Catalog::find_control`]
    pub fn find_control_mut(&mut self, control_id: &str) -> Option<&mut Control> {
        let controls = self.controls.as_deref_mut().unwrap_or_default();
        if let Some(found) = find_in_controls_mut(controls, control_id) {
            return Some(found);
        }
        self.groups
            .as_deref_mut()
            .unwrap_or_default()
            .iter_mut()
            .find_map(|g| g.find_control_mut(control_id))
    }

    /// Every control in document order, depth first
    pub fn all_controls(&self) -> Vec<&Control> {
        let mut out = Vec::new();
        collect_controls(self.controls(), &mut out);
        for group in self.groups() {
            group.collect_all_controls(&mut out);
        }
        out
    }
}

/// A named grouping of controls; groups nest to any depth.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Group {
    #[serde(default)]
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,

    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Vec<Parameter>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub props: Option<Vec<Property>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parts: Option<Vec<Part>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<Group>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controls: Option<Vec<Control>>,
}

impl Group {
    /// Controls directly in this group
    pub fn controls(&self) -> &[Control] {
        self.controls.as_deref().unwrap_or_default()
    }

    /// Sub-groups of this group
    pub fn groups(&self) -> &[Group] {
        self.groups.as_deref().unwrap_or_default()
    }

    /// Find a control in this group or below
    pub fn find_control(&self, control_id: &str) -> Option<&Control> {
        find_in_controls(self.controls(), control_id)
            .or_else(|| self.groups().iter().find_map(|g| g.find_control(control_id)))
    }

    /// Mutable counterpart of [`Group::find_control`]
    pub fn find_control_mut(&mut self, control_id: &str) -> Option<&mut Control> {
        let controls = self.controls.as_deref_mut().unwrap_or_default();
        if let Some(found) = find_in_controls_mut(controls, control_id) {
            return Some(found);
        }
        self.groups
            .as_deref_mut()
            .unwrap_or_default()
            .iter_mut()
            .find_map(|g| g.find_control_mut(control_id))
    }

    fn collect_all_controls<'a>(&'a self, out: &mut Vec<&'a Control>) {
        collect_controls(self.controls(), out);
        for group in self.groups() {
            group.collect_all_controls(out);
        }
    }
}

/// A single control, possibly carrying enhancements in `controls`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Control {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,

    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Vec<Parameter>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub props: Option<Vec<Property>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<Link>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parts: Option<Vec<Part>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controls: Option<Vec<Control>>,
}

impl Control {
    /// Create a bare control
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    /// Top-level parts, empty when absent
    pub fn parts(&self) -> &[Part] {
        self.parts.as_deref().unwrap_or_default()
    }

    /// Parameters, empty when absent
    pub fn params(&self) -> &[Parameter] {
        self.params.as_deref().unwrap_or_default()
    }

    /// Enhancements, empty when absent
    pub fn enhancements(&self) -> &[Control] {
        self.controls.as_deref().unwrap_or_default()
    }
}

fn find_in_controls<'a>(controls: &'a [Control], control_id: &str) -> Option<&'a Control> {
    controls.iter().find_map(|c| {
        if c.id == control_id {
            Some(c)
        } else {
            find_in_controls(c.enhancements(), control_id)
        }
    })
}

fn find_in_controls_mut<'a>(
    controls: &'a mut [Control],
    control_id: &str,
) -> Option<&'a mut Control> {
    for control in controls.iter_mut() {
        if control.id == control_id {
            return Some(control);
        }
        let enhancements = control.controls.as_deref_mut().unwrap_or_default();
        if let Some(found) = find_in_controls_mut(enhancements, control_id) {
            return Some(found);
        }
    }
    None
}

fn collect_controls<'a>(controls: &'a [Control], out: &mut Vec<&'a Control>) {
    for control in controls {
        out.push(control);
        collect_controls(control.enhancements(), out);
    }
}
