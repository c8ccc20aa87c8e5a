//! Property access on any node with properties
//!
//! Lookups are forgiving (case and surrounding whitespace are ignored), while
//! replace and delete match the exact name and assume at most one property of
//! that name, which only holds for the well-known names in [`super`].

use std::collections::BTreeMap;

use crate::error::ControlError;
use crate::model::{Control, HasProperties, ImplementationStatus, Property};

use super::{
    IMPLEMENTATION_STATUS, LABEL, PARAM_DESCRIPTION, PARAM_ID, PARAM_OPTIONS, RULE_DESCRIPTION,
    RULE_NAME_ID, SORT_ID, STATUS, WITHDRAWN,
};

/// Value of the first property whose name matches, ignoring case and padding.
///
/// Returns `default` (or the empty string) when nothing matches.
pub fn get_prop(item: &impl HasProperties, name: &str, default: Option<&str>) -> String {
    let wanted = name.trim().to_lowercase();
    item.properties()
        .iter()
        .find(|p| p.name.trim().to_lowercase() == wanted)
        .map(|p| p.value.trim().to_string())
        .unwrap_or_else(|| default.unwrap_or_default().to_string())
}

/// Remove the first property named exactly `name`, if any.
///
/// An emptied list collapses to "no properties".
pub fn delete_prop(item: &mut impl HasProperties, name: &str) {
    let mut props = item.take_properties();
    if let Some(index) = props.iter().position(|p| p.name == name) {
        props.remove(index);
    }
    item.set_properties(props);
}

/// Remove the first property with the new property's name, then append it.
///
/// Relative order of the remaining properties is preserved.
pub fn replace_prop(item: &mut impl HasProperties, new_prop: Property) {
    let mut props = item.take_properties();
    if let Some(index) = props.iter().position(|p| p.name == new_prop.name) {
        props.remove(index);
    }
    props.push(new_prop);
    item.set_properties(props);
}

/// Sort key of a control: its `sort-id` property, else its id.
///
/// With `allow_none` a missing `sort-id` yields `None` instead of the id.
pub fn get_sort_id(control: &Control, allow_none: bool) -> Option<String> {
    control
        .properties()
        .iter()
        .find(|p| p.name == SORT_ID)
        .map(|p| p.value.trim().to_string())
        .or_else(|| (!allow_none).then(|| control.id.clone()))
}

/// The `label` property of a part or control, empty when absent
pub fn get_label(item: &impl HasProperties) -> String {
    get_prop(item, LABEL, None)
}

/// True when the control carries `status = withdrawn` (case and padding ignored)
pub fn is_withdrawn(control: &Control) -> bool {
    control.properties().iter().any(|p| {
        p.name.trim().eq_ignore_ascii_case(STATUS) && p.value.trim().eq_ignore_ascii_case(WITHDRAWN)
    })
}

/// Implementation status stored in the `implementation-status` property.
///
/// Defaults to state `other` when the property is absent.
pub fn get_status_from_props(item: &impl HasProperties) -> ImplementationStatus {
    item.properties()
        .iter()
        .find(|p| p.name == IMPLEMENTATION_STATUS)
        .map(|p| ImplementationStatus {
            state: p.value.clone(),
            remarks: p.remarks.clone(),
        })
        .unwrap_or_default()
}

/// Write the status into the item's properties, replacing any previous status
pub fn insert_status_in_props(item: &mut impl HasProperties, status: ImplementationStatus) {
    let prop = Property {
        name: IMPLEMENTATION_STATUS.to_string(),
        value: status.state,
        class: None,
        remarks: status.remarks,
    };
    replace_prop(item, prop);
}

/// Copy the status of `src` onto `dest`
pub fn copy_status_in_props(dest: &mut impl HasProperties, src: &impl HasProperties) {
    insert_status_in_props(dest, get_status_from_props(src));
}

/// Name and description of a rule bound to an item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleInfo {
    pub name: String,
    pub description: String,
}

/// Parameter metadata attached to a rule
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RuleParam {
    pub name: String,
    pub description: Option<String>,
    /// Comma separated choices, as written
    pub options: Option<String>,
}

/// Rules bound to an item, keyed by rule id (taken from the remarks).
///
/// `rule_name_id` and `rule_description` properties are read as adjacent
/// pairs; each completed pair yields one rule.
pub fn get_rules_from_item(
    item: &impl HasProperties,
) -> Result<BTreeMap<String, RuleInfo>, ControlError> {
    let mut rules = BTreeMap::new();
    let mut name = String::new();
    let mut description = String::new();
    let mut rule_id = String::new();

    for prop in item.properties() {
        if prop.name == RULE_NAME_ID {
            name = prop.value.clone();
            rule_id = prop.remarks.clone().unwrap_or_default();
        } else if prop.name == RULE_DESCRIPTION {
            description = prop.value.clone();
        }
        if !name.is_empty() && !description.is_empty() {
            if rules.contains_key(&rule_id) {
                return Err(ControlError::DuplicateRuleMetadata { rule_id });
            }
            rules.insert(
                std::mem::take(&mut rule_id),
                RuleInfo {
                    name: std::mem::take(&mut name),
                    description: std::mem::take(&mut description),
                },
            );
        }
    }
    Ok(rules)
}

/// Every `rule_name_id` value on the item, in order
pub fn get_rule_list_for_item(item: &impl HasProperties) -> Vec<String> {
    item.properties()
        .iter()
        .filter(|p| p.name == RULE_NAME_ID)
        .map(|p| p.value.clone())
        .collect()
}

/// Rule parameters keyed by rule id.
///
/// A `param_id` property opens an entry; `param_description` and
/// `param_options` must follow it for the same rule id (remarks).
pub fn get_params_from_item(
    item: &impl HasProperties,
) -> Result<BTreeMap<String, RuleParam>, ControlError> {
    let mut params: BTreeMap<String, RuleParam> = BTreeMap::new();

    for prop in item.properties() {
        let rule_id = prop.remarks.clone().unwrap_or_default();
        match prop.name.as_str() {
            PARAM_ID => {
                if params.contains_key(&rule_id) {
                    return Err(ControlError::DuplicateParamMetadata {
                        rule_id,
                        param_name: prop.value.clone(),
                    });
                }
                params.insert(
                    rule_id,
                    RuleParam {
                        name: prop.value.clone(),
                        ..Default::default()
                    },
                );
            }
            PARAM_DESCRIPTION | PARAM_OPTIONS => {
                let field = if prop.name == PARAM_DESCRIPTION {
                    "description"
                } else {
                    "options"
                };
                let Some(entry) = params.get_mut(&rule_id) else {
                    return Err(ControlError::OrphanParamMetadata {
                        rule_id,
                        field: field.to_string(),
                    });
                };
                if prop.name == PARAM_DESCRIPTION {
                    entry.description = Some(prop.value.clone());
                } else {
                    entry.options = Some(prop.value.clone());
                }
            }
            _ => {}
        }
    }
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Part, Statement};

    fn control_with(props: Vec<Property>) -> Control {
        let mut control = Control::new("ac-1", "Policy and Procedures");
        control.set_properties(props);
        control
    }

    #[test]
    fn test_get_prop_ignores_case_and_padding() {
        let control = control_with(vec![Property::new(" Label ", " AC-1 ")]);
        assert_eq!(get_prop(&control, "label", None), "AC-1");
        assert_eq!(get_prop(&control, "missing", Some("dflt")), "dflt");
        assert_eq!(get_prop(&control, "missing", None), "");
    }

    #[test]
    fn test_get_prop_first_hit_wins() {
        let control = control_with(vec![Property::new("x", "1"), Property::new("X", "2")]);
        assert_eq!(get_prop(&control, "x", None), "1");
    }

    #[test]
    fn test_replace_prop_preserves_order() {
        let mut control = control_with(vec![
            Property::new("a", "1"),
            Property::new("b", "2"),
            Property::new("c", "3"),
        ]);
        replace_prop(&mut control, Property::new("b", "new"));
        let names: Vec<_> = control.properties().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a", "c", "b"]);
        assert_eq!(get_prop(&control, "b", None), "new");
    }

    #[test]
    fn test_replace_prop_on_empty_node() {
        let mut part = Part::default();
        replace_prop(&mut part, Property::new("label", "a."));
        assert_eq!(get_label(&part), "a.");
    }

    #[test]
    fn test_delete_prop_removes_single_instance_and_collapses() {
        let mut control = control_with(vec![Property::new("rule", "r1"), Property::new("rule", "r2")]);
        delete_prop(&mut control, "rule");
        assert_eq!(control.properties().len(), 1);
        assert_eq!(control.properties()[0].value, "r2");

        delete_prop(&mut control, "rule");
        assert!(control.props.is_none());

        // deleting from an empty node is a no-op
        delete_prop(&mut control, "rule");
        assert!(control.props.is_none());
    }

    #[test]
    fn test_sort_id() {
        let control = control_with(vec![Property::new("sort-id", "ac-01")]);
        assert_eq!(get_sort_id(&control, false).as_deref(), Some("ac-01"));

        let bare = Control::new("ac-2", "Accounts");
        assert_eq!(get_sort_id(&bare, false).as_deref(), Some("ac-2"));
        assert_eq!(get_sort_id(&bare, true), None);
    }

    #[test]
    fn test_is_withdrawn() {
        assert!(is_withdrawn(&control_with(vec![Property::new(" Status", "Withdrawn ")])));
        assert!(!is_withdrawn(&control_with(vec![Property::new("status", "active")])));
        assert!(!is_withdrawn(&Control::new("ac-3", "Enforcement")));
    }

    #[test]
    fn test_status_round_trip_through_props() {
        let mut stmt = Statement::default();
        assert_eq!(get_status_from_props(&stmt).state, "other");

        let status = ImplementationStatus {
            state: "implemented".into(),
            remarks: Some("done".into()),
        };
        insert_status_in_props(&mut stmt, status.clone());
        insert_status_in_props(&mut stmt, status.clone());
        assert_eq!(stmt.properties().len(), 1);
        assert_eq!(get_status_from_props(&stmt), status);

        let mut other = Statement::default();
        copy_status_in_props(&mut other, &stmt);
        assert_eq!(get_status_from_props(&other), status);
    }

    #[test]
    fn test_rules_from_item_pairs() {
        let control = control_with(vec![
            Property::new(RULE_NAME_ID, "enable_audit").with_remarks("rule_1"),
            Property::new(RULE_DESCRIPTION, "Enable auditing"),
            Property::new("label", "AC-1"),
            Property::new(RULE_NAME_ID, "lock_screen").with_remarks("rule_2"),
            Property::new(RULE_DESCRIPTION, "Lock idle sessions"),
        ]);
        let rules = get_rules_from_item(&control).unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules["rule_1"].name, "enable_audit");
        assert_eq!(rules["rule_2"].description, "Lock idle sessions");

        assert_eq!(get_rule_list_for_item(&control), vec!["enable_audit", "lock_screen"]);
    }

    #[test]
    fn test_rules_from_item_duplicate_is_error() {
        let control = control_with(vec![
            Property::new(RULE_NAME_ID, "a").with_remarks("rule_1"),
            Property::new(RULE_DESCRIPTION, "first"),
            Property::new(RULE_NAME_ID, "b").with_remarks("rule_1"),
            Property::new(RULE_DESCRIPTION, "second"),
        ]);
        let err = get_rules_from_item(&control).unwrap_err();
        assert_eq!(
            err,
            ControlError::DuplicateRuleMetadata {
                rule_id: "rule_1".into()
            }
        );
    }

    #[test]
    fn test_params_from_item() {
        let control = control_with(vec![
            Property::new(PARAM_ID, "min_len").with_remarks("rule_1"),
            Property::new(PARAM_DESCRIPTION, "Minimum length").with_remarks("rule_1"),
            Property::new(PARAM_OPTIONS, "8, 12, 15").with_remarks("rule_1"),
        ]);
        let params = get_params_from_item(&control).unwrap();
        let param = &params["rule_1"];
        assert_eq!(param.name, "min_len");
        assert_eq!(param.description.as_deref(), Some("Minimum length"));
        assert_eq!(param.options.as_deref(), Some("8, 12, 15"));
    }

    #[test]
    fn test_params_from_item_ordering_is_load_bearing() {
        let control = control_with(vec![
            Property::new(PARAM_DESCRIPTION, "Minimum length").with_remarks("rule_1"),
            Property::new(PARAM_ID, "min_len").with_remarks("rule_1"),
        ]);
        let err = get_params_from_item(&control).unwrap_err();
        assert!(matches!(err, ControlError::OrphanParamMetadata { ref field, .. } if field == "description"));

        let dup = control_with(vec![
            Property::new(PARAM_ID, "a").with_remarks("rule_1"),
            Property::new(PARAM_ID, "b").with_remarks("rule_1"),
        ]);
        assert!(matches!(
            get_params_from_item(&dup),
            Err(ControlError::DuplicateParamMetadata { .. })
        ));
    }
}
