//! Profile modifications: alters, set-parameters and withdrawal

use crate::control::{is_withdrawn, setparam_to_param};
use crate::error::{ResolveError, Result};
use crate::model::{
    Add, Catalog, Control, Group, Parameter, Part, Position, Profile, Property, Remove,
};

use super::{AlterWarning, ReferenceIssue};

fn retain_opt<T>(slot: &mut Option<Vec<T>>, mut keep: impl FnMut(&T) -> bool) -> usize {
    let Some(items) = slot.as_mut() else {
        return 0;
    };
    let before = items.len();
    items.retain(|item| keep(item));
    let removed = before - items.len();
    if items.is_empty() {
        *slot = None;
    }
    removed
}

fn insert_opt<T: Clone>(slot: &mut Option<Vec<T>>, items: Option<&[T]>, at: Option<usize>) {
    let Some(items) = items.filter(|i| !i.is_empty()) else {
        return;
    };
    let list = slot.get_or_insert_with(Vec::new);
    let at = at.unwrap_or(list.len()).min(list.len());
    list.splice(at..at, items.iter().cloned());
}

/// `Some(0)` to prepend, `None` to append
fn edge(position: Position) -> Option<usize> {
    match position {
        Position::Before | Position::Starting => Some(0),
        Position::After | Position::Ending => None,
    }
}

// ============================================================================
// Removes
// ============================================================================

fn item_name_is(remove: &Remove, names: &[&str]) -> bool {
    remove
        .by_item_name
        .as_deref()
        .map_or(true, |n| names.contains(&n))
}

fn criterion(wanted: Option<&str>, actual: Option<&str>) -> bool {
    wanted.map_or(true, |w| actual == Some(w))
}

fn part_matches(part: &Part, remove: &Remove) -> bool {
    item_name_is(remove, &["part", "parts"])
        && criterion(remove.by_id.as_deref(), Some(part.id.as_str()))
        && criterion(remove.by_name.as_deref(), Some(part.name.as_str()))
        && criterion(remove.by_class.as_deref(), part.class.as_deref())
        && criterion(remove.by_ns.as_deref(), part.ns.as_deref())
}

fn prop_matches(prop: &Property, remove: &Remove) -> bool {
    item_name_is(remove, &["prop", "props"])
        && remove.by_id.is_none()
        && remove.by_ns.is_none()
        && criterion(remove.by_name.as_deref(), Some(prop.name.as_str()))
        && criterion(remove.by_class.as_deref(), prop.class.as_deref())
}

fn param_matches(param: &Parameter, remove: &Remove) -> bool {
    item_name_is(remove, &["param", "params"])
        && remove.by_name.is_none()
        && remove.by_ns.is_none()
        && criterion(remove.by_id.as_deref(), Some(param.id.as_str()))
        && criterion(remove.by_class.as_deref(), param.class.as_deref())
}

fn remove_from_parts(slot: &mut Option<Vec<Part>>, remove: &Remove) -> usize {
    let mut removed = retain_opt(slot, |p| !part_matches(p, remove));
    for part in slot.iter_mut().flatten() {
        removed += retain_opt(&mut part.props, |p| !prop_matches(p, remove));
        removed += remove_from_parts(&mut part.parts, remove);
    }
    removed
}

/// Remove everything in the control matching all given criteria; returns the count
fn apply_remove(control: &mut Control, remove: &Remove) -> usize {
    let has_criteria = remove.by_id.is_some()
        || remove.by_name.is_some()
        || remove.by_class.is_some()
        || remove.by_ns.is_some()
        || remove.by_item_name.is_some();
    if !has_criteria {
        return 0;
    }
    retain_opt(&mut control.props, |p| !prop_matches(p, remove))
        + retain_opt(&mut control.params, |p| !param_matches(p, remove))
        + remove_from_parts(&mut control.parts, remove)
}

// ============================================================================
// Adds
// ============================================================================

/// Insert relative to the part `by_id`, searching the tree depth first.
///
/// `props` is the property list of the node owning `parts`.
fn add_near_part(
    parts: &mut Vec<Part>,
    props: &mut Option<Vec<Property>>,
    by_id: &str,
    add: &Add,
    position: Position,
) -> bool {
    if let Some(index) = parts.iter().position(|p| p.id == by_id) {
        if let Some(title) = &add.title {
            parts[index].title = Some(title.clone());
        }
        let at = match position {
            Position::Before => index,
            Position::After => index + 1,
            Position::Starting => 0,
            Position::Ending => parts.len(),
        };
        if let Some(new_parts) = add.parts.as_deref() {
            parts.splice(at..at, new_parts.iter().cloned());
        }
        insert_opt(props, add.props.as_deref(), edge(position));
        return true;
    }
    for part in parts.iter_mut() {
        let Part {
            parts: children,
            props: child_props,
            ..
        } = part;
        if let Some(children) = children {
            if add_near_part(children, child_props, by_id, add, position) {
                return true;
            }
        }
    }
    false
}

fn add_to_control(control: &mut Control, add: &Add, position: Position) {
    let at = edge(position);
    if let Some(title) = &add.title {
        control.title = title.clone();
    }
    insert_opt(&mut control.params, add.params.as_deref(), at);
    insert_opt(&mut control.props, add.props.as_deref(), at);
    insert_opt(&mut control.links, add.links.as_deref(), at);
    insert_opt(&mut control.parts, add.parts.as_deref(), at);
}

fn apply_add(control: &mut Control, add: &Add) -> std::result::Result<(), ReferenceIssue> {
    let position = add.position();
    let target = add.by_id.as_deref().filter(|id| *id != control.id);

    let Some(by_id) = target else {
        if position.requires_target() {
            return Err(ReferenceIssue::TargetRequired { position });
        }
        add_to_control(control, add, position);
        return Ok(());
    };

    if let Some(index) = control.params().iter().position(|p| p.id == by_id) {
        let at = match position {
            Position::Before => Some(index),
            Position::After => Some(index + 1),
            other => edge(other),
        };
        insert_opt(&mut control.params, add.params.as_deref(), at);
        insert_opt(&mut control.props, add.props.as_deref(), edge(position));
        insert_opt(&mut control.links, add.links.as_deref(), edge(position));
        insert_opt(&mut control.parts, add.parts.as_deref(), edge(position));
        return Ok(());
    }

    let found = match control.parts.as_mut() {
        Some(parts) => add_near_part(parts, &mut control.props, by_id, add, position),
        None => false,
    };
    if found {
        insert_opt(&mut control.params, add.params.as_deref(), edge(position));
        insert_opt(&mut control.links, add.links.as_deref(), edge(position));
        return Ok(());
    }

    if position.requires_target() {
        return Err(ReferenceIssue::MissingTarget {
            by_id: by_id.to_string(),
        });
    }
    tracing::debug!(
        control_id = %control.id,
        by_id,
        %position,
        "Add target not found, adding to the control itself"
    );
    add_to_control(control, add, position);
    Ok(())
}

/// Apply every alter of the profile in order, removes before adds.
///
/// Unresolvable references are pushed to `warnings` and skipped, except an
/// alter with a `before`/`after` add whose control is missing, which fails.
pub(crate) fn apply_alters(
    catalog: &mut Catalog,
    profile: &Profile,
    name: &str,
    warnings: &mut Vec<AlterWarning>,
) -> Result<()> {
    for (alter_index, alter) in profile.alters().iter().enumerate() {
        let Some(control) = catalog.find_control_mut(&alter.control_id) else {
            if alter.adds.iter().flatten().any(|a| a.position().requires_target()) {
                return Err(ResolveError::MissingControl {
                    profile: name.to_string(),
                    control_id: alter.control_id.clone(),
                    alter_index,
                });
            }
            AlterWarning::for_alter(
                name,
                &alter.control_id,
                alter_index,
                None,
                ReferenceIssue::MissingControl,
            )
            .emit(warnings);
            continue;
        };

        for remove in alter.removes.iter().flatten() {
            let removed = apply_remove(control, remove);
            tracing::debug!(control_id = %alter.control_id, alter_index, removed, "Applied remove");
        }
        for (add_index, add) in alter.adds.iter().flatten().enumerate() {
            if let Err(issue) = apply_add(control, add) {
                AlterWarning::for_alter(
                    name,
                    &alter.control_id,
                    alter_index,
                    Some(add_index),
                    issue,
                )
                .emit(warnings);
            }
        }
    }
    Ok(())
}

// ============================================================================
// Set-parameters
// ============================================================================

fn find_param<'a>(params: &'a mut Option<Vec<Parameter>>, id: &str) -> Option<&'a mut Parameter> {
    params.iter_mut().flatten().find(|p| p.id == id)
}

fn find_param_in_controls<'a>(controls: &'a mut [Control], id: &str) -> Option<&'a mut Parameter> {
    for control in controls.iter_mut() {
        let Control {
            params,
            controls: enhancements,
            ..
        } = control;
        if let Some(param) = find_param(params, id) {
            return Some(param);
        }
        let enhancements = enhancements.as_deref_mut().unwrap_or_default();
        if let Some(param) = find_param_in_controls(enhancements, id) {
            return Some(param);
        }
    }
    None
}

fn find_param_in_groups<'a>(groups: &'a mut [Group], id: &str) -> Option<&'a mut Parameter> {
    for group in groups.iter_mut() {
        let Group {
            params,
            controls,
            groups: subgroups,
            ..
        } = group;
        if let Some(param) = find_param(params, id) {
            return Some(param);
        }
        let controls = controls.as_deref_mut().unwrap_or_default();
        if let Some(param) = find_param_in_controls(controls, id) {
            return Some(param);
        }
        let subgroups = subgroups.as_deref_mut().unwrap_or_default();
        if let Some(param) = find_param_in_groups(subgroups, id) {
            return Some(param);
        }
    }
    None
}

fn find_param_mut<'a>(catalog: &'a mut Catalog, id: &str) -> Option<&'a mut Parameter> {
    let Catalog {
        params,
        controls,
        groups,
        ..
    } = catalog;
    if let Some(param) = find_param(params, id) {
        return Some(param);
    }
    let controls = controls.as_deref_mut().unwrap_or_default();
    if let Some(param) = find_param_in_controls(controls, id) {
        return Some(param);
    }
    find_param_in_groups(groups.as_deref_mut().unwrap_or_default(), id)
}

/// Overlay the non-empty fields of a set-parameter onto the catalog parameter
fn overlay(param: &mut Parameter, update: Parameter) {
    if let Some(label) = update.label.filter(|l| !l.is_empty()) {
        param.label = Some(label);
    }
    if let Some(values) = update.values.filter(|v| !v.is_empty()) {
        param.values = Some(values);
    }
    if let Some(update) = update.select {
        let select = param.select.get_or_insert_with(Default::default);
        if let Some(how_many) = update.how_many {
            select.how_many = Some(how_many);
        }
        if let Some(choice) = update.choice.filter(|c| !c.is_empty()) {
            select.choice = Some(choice);
        }
        if select.how_many.is_none() && select.choice.is_none() {
            param.select = None;
        }
    }
}

/// Apply the profile's set-parameters; unknown parameter ids are warnings
pub(crate) fn apply_set_parameters(
    catalog: &mut Catalog,
    profile: &Profile,
    name: &str,
    warnings: &mut Vec<AlterWarning>,
) {
    for (index, set_param) in profile.set_parameters().iter().enumerate() {
        match find_param_mut(catalog, &set_param.param_id) {
            Some(param) => overlay(param, setparam_to_param(&set_param.param_id, set_param)),
            None => AlterWarning::for_set_parameter(name, index, &set_param.param_id).emit(warnings),
        }
    }
}

// ============================================================================
// Withdrawal
// ============================================================================

fn drop_withdrawn_controls(slot: &mut Option<Vec<Control>>) -> usize {
    let mut dropped = retain_opt(slot, |c| {
        let withdrawn = is_withdrawn(c);
        if withdrawn {
            tracing::debug!(control_id = %c.id, "Dropping withdrawn control");
        }
        !withdrawn
    });
    for control in slot.iter_mut().flatten() {
        dropped += drop_withdrawn_controls(&mut control.controls);
    }
    dropped
}

fn drop_withdrawn_groups(groups: &mut [Group]) -> usize {
    groups
        .iter_mut()
        .map(|g| {
            drop_withdrawn_controls(&mut g.controls)
                + drop_withdrawn_groups(g.groups.as_deref_mut().unwrap_or_default())
        })
        .sum()
}

/// Remove controls marked withdrawn at any depth; returns how many went
pub(crate) fn drop_withdrawn(catalog: &mut Catalog) -> usize {
    drop_withdrawn_controls(&mut catalog.controls)
        + drop_withdrawn_groups(catalog.groups.as_deref_mut().unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::get_prop;
    use crate::model::{Alter, HowMany, Modify, ParameterSelection, SetParameter};

    fn control() -> Control {
        let mut control = Control::new("ac-1", "Policy");
        control.params = Some(vec![Parameter {
            id: "ac-1_prm_1".into(),
            label: Some("frequency".into()),
            usage: Some("how often".into()),
            ..Default::default()
        }]);
        control.props = Some(vec![Property::new("label", "AC-1")]);
        control.parts = Some(vec![
            Part {
                id: "ac-1_smt".into(),
                name: "statement".into(),
                parts: Some(vec![
                    Part::new("ac-1_smt.a", "item", "a"),
                    Part::new("ac-1_smt.b", "item", "b"),
                ]),
                ..Default::default()
            },
            Part {
                id: "ac-1_gdn".into(),
                name: "guidance".into(),
                class: Some("info".into()),
                prose: Some("g".into()),
                ..Default::default()
            },
        ]);
        control
    }

    fn catalog() -> Catalog {
        Catalog {
            controls: Some(vec![control()]),
            ..Default::default()
        }
    }

    fn part_ids(parts: &[Part]) -> Vec<&str> {
        parts.iter().map(|p| p.id.as_str()).collect()
    }

    fn add_part(position: Position, by_id: Option<&str>, id: &str) -> Add {
        Add {
            position: Some(position),
            by_id: by_id.map(str::to_string),
            parts: Some(vec![Part::new(id, "item", "new")]),
            ..Default::default()
        }
    }

    fn profile_with(alters: Vec<Alter>, set_parameters: Vec<SetParameter>) -> Profile {
        Profile {
            uuid: "p".into(),
            modify: Some(Modify {
                alters: Some(alters),
                set_parameters: Some(set_parameters),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_remove_subset_match() {
        let mut c = control();
        let by_name_and_class = Remove {
            by_name: Some("guidance".into()),
            by_class: Some("other".into()),
            ..Default::default()
        };
        assert_eq!(apply_remove(&mut c, &by_name_and_class), 0);

        let by_name = Remove {
            by_name: Some("guidance".into()),
            ..Default::default()
        };
        assert_eq!(apply_remove(&mut c, &by_name), 1);
        assert_eq!(part_ids(c.parts()), vec!["ac-1_smt"]);
    }

    #[test]
    fn test_remove_recurses_and_targets_item_kind() {
        let mut c = control();
        let nested = Remove {
            by_id: Some("ac-1_smt.a".into()),
            ..Default::default()
        };
        assert_eq!(apply_remove(&mut c, &nested), 1);
        assert_eq!(part_ids(c.parts()[0].children()), vec!["ac-1_smt.b"]);

        let props = Remove {
            by_item_name: Some("props".into()),
            ..Default::default()
        };
        assert_eq!(apply_remove(&mut c, &props), 1);
        assert!(c.props.is_none());
        assert_eq!(c.parts().len(), 2);

        assert_eq!(apply_remove(&mut c, &Remove::default()), 0);
    }

    #[test]
    fn test_add_relative_positions() {
        let mut c = control();
        apply_add(&mut c, &add_part(Position::Before, Some("ac-1_smt.b"), "x-before")).unwrap();
        apply_add(&mut c, &add_part(Position::After, Some("ac-1_smt.b"), "x-after")).unwrap();
        apply_add(&mut c, &add_part(Position::Starting, Some("ac-1_smt.b"), "x-start")).unwrap();
        apply_add(&mut c, &add_part(Position::Ending, Some("ac-1_smt.b"), "x-end")).unwrap();
        assert_eq!(
            part_ids(c.parts()[0].children()),
            vec!["x-start", "ac-1_smt.a", "x-before", "ac-1_smt.b", "x-after", "x-end"]
        );
    }

    #[test]
    fn test_add_without_target() {
        let mut c = control();
        apply_add(&mut c, &add_part(Position::Starting, None, "first")).unwrap();
        apply_add(&mut c, &add_part(Position::Ending, None, "last")).unwrap();
        assert_eq!(part_ids(c.parts()), vec!["first", "ac-1_smt", "ac-1_gdn", "last"]);

        let err = apply_add(&mut c, &add_part(Position::Before, None, "x")).unwrap_err();
        assert_eq!(
            err,
            ReferenceIssue::TargetRequired {
                position: Position::Before
            }
        );
    }

    #[test]
    fn test_add_before_missing_target_is_reported() {
        let mut c = control();
        let err = apply_add(&mut c, &add_part(Position::Before, Some("nope"), "x")).unwrap_err();
        assert_eq!(
            err,
            ReferenceIssue::MissingTarget {
                by_id: "nope".into()
            }
        );
        assert_eq!(c, control());

        apply_add(&mut c, &add_part(Position::Ending, Some("nope"), "x")).unwrap();
        assert_eq!(c.parts().last().map(|p| p.id.as_str()), Some("x"));
    }

    #[test]
    fn test_add_props_and_title() {
        let mut c = control();
        let add = Add {
            title: Some("Tailored Policy".into()),
            props: Some(vec![Property::new("sort-id", "ac-01")]),
            ..Default::default()
        };
        apply_add(&mut c, &add).unwrap();
        assert_eq!(c.title, "Tailored Policy");
        assert_eq!(get_prop(&c, "sort-id", None), "ac-01");
    }

    #[test]
    fn test_alters_warn_and_continue() {
        let mut cat = catalog();
        let profile = profile_with(
            vec![
                Alter {
                    control_id: "ac-1".into(),
                    adds: Some(vec![
                        add_part(Position::Before, Some("missing"), "skipped"),
                        add_part(Position::Ending, None, "kept"),
                    ]),
                    ..Default::default()
                },
                Alter {
                    control_id: "zz-9".into(),
                    adds: Some(vec![add_part(Position::Ending, None, "x")]),
                    ..Default::default()
                },
            ],
            Vec::new(),
        );
        let mut warnings = Vec::new();
        apply_alters(&mut cat, &profile, "p", &mut warnings).unwrap();

        assert_eq!(warnings.len(), 2);
        assert_eq!(warnings[0].add_index, Some(0));
        assert_eq!(warnings[1].issue, ReferenceIssue::MissingControl);
        let ids = part_ids(cat.find_control("ac-1").unwrap().parts());
        assert!(ids.contains(&"kept"));
        assert!(!ids.contains(&"skipped"));
    }

    #[test]
    fn test_alter_removes_run_before_adds() {
        let mut cat = catalog();
        let profile = profile_with(
            vec![Alter {
                control_id: "ac-1".into(),
                adds: Some(vec![
                    add_part(Position::Before, Some("ac-1_smt.a"), "x"),
                    add_part(Position::After, Some("ac-1_smt.b"), "y"),
                    add_part(Position::Starting, Some("ac-1_smt.a"), "z"),
                ]),
                removes: Some(vec![Remove {
                    by_id: Some("ac-1_smt.a".into()),
                    ..Default::default()
                }]),
            }],
            Vec::new(),
        );
        let mut warnings = Vec::new();
        apply_alters(&mut cat, &profile, "p", &mut warnings).unwrap();

        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].add_index, Some(0));
        assert_eq!(
            warnings[0].issue,
            ReferenceIssue::MissingTarget {
                by_id: "ac-1_smt.a".into()
            }
        );
        let control = cat.find_control("ac-1").unwrap();
        assert_eq!(part_ids(control.parts()), vec!["z", "ac-1_smt", "ac-1_gdn"]);
        assert_eq!(part_ids(control.parts()[1].children()), vec!["ac-1_smt.b", "y"]);
    }

    #[test]
    fn test_before_add_on_missing_control_fails() {
        let mut cat = catalog();
        let profile = profile_with(
            vec![Alter {
                control_id: "zz-9".into(),
                adds: Some(vec![add_part(Position::After, Some("x"), "y")]),
                ..Default::default()
            }],
            Vec::new(),
        );
        let err = apply_alters(&mut cat, &profile, "p", &mut Vec::new()).unwrap_err();
        assert!(matches!(err, ResolveError::MissingControl { alter_index: 0, .. }));
    }

    #[test]
    fn test_set_parameter_overlay() {
        let mut cat = catalog();
        let profile = profile_with(
            Vec::new(),
            vec![
                SetParameter {
                    param_id: "ac-1_prm_1".into(),
                    values: Some(vec!["daily".into()]),
                    label: Some(String::new()),
                    ..Default::default()
                },
                SetParameter {
                    param_id: "nope".into(),
                    ..Default::default()
                },
            ],
        );
        let mut warnings = Vec::new();
        apply_set_parameters(&mut cat, &profile, "p", &mut warnings);

        let param = &cat.find_control("ac-1").unwrap().params()[0];
        assert_eq!(param.values, Some(vec!["daily".to_string()]));
        assert_eq!(param.label.as_deref(), Some("frequency"));
        assert_eq!(param.usage.as_deref(), Some("how often"));
        assert_eq!(warnings.len(), 1);
        assert_eq!(
            warnings[0].issue,
            ReferenceIssue::UnknownParameter {
                param_id: "nope".into()
            }
        );
    }

    #[test]
    fn test_set_parameter_empty_select_keeps_original() {
        let mut cat = catalog();
        let select = ParameterSelection {
            how_many: Some(HowMany::One),
            choice: Some(vec!["a".into(), "b".into()]),
        };
        cat.controls.as_mut().unwrap()[0].params.as_mut().unwrap()[0].select = Some(select.clone());
        let profile = profile_with(
            Vec::new(),
            vec![SetParameter {
                param_id: "ac-1_prm_1".into(),
                select: Some(ParameterSelection::default()),
                ..Default::default()
            }],
        );
        let mut warnings = Vec::new();
        apply_set_parameters(&mut cat, &profile, "p", &mut warnings);

        let param = &cat.find_control("ac-1").unwrap().params()[0];
        assert_eq!(param.select, Some(select));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_set_parameter_select_overlays_choice_only() {
        let mut cat = catalog();
        cat.controls.as_mut().unwrap()[0].params.as_mut().unwrap()[0].select =
            Some(ParameterSelection {
                how_many: Some(HowMany::OneOrMore),
                choice: Some(vec!["a".into()]),
            });
        let profile = profile_with(
            Vec::new(),
            vec![SetParameter {
                param_id: "ac-1_prm_1".into(),
                select: Some(ParameterSelection {
                    how_many: None,
                    choice: Some(vec!["x".into(), "y".into()]),
                }),
                ..Default::default()
            }],
        );
        let mut warnings = Vec::new();
        apply_set_parameters(&mut cat, &profile, "p", &mut warnings);

        let select = cat.find_control("ac-1").unwrap().params()[0].select.clone().unwrap();
        assert_eq!(select.how_many, Some(HowMany::OneOrMore));
        assert_eq!(select.choice, Some(vec!["x".to_string(), "y".to_string()]));
    }

    #[test]
    fn test_drop_withdrawn_nested() {
        let mut withdrawn = Control::new("ac-2.1", "Old");
        withdrawn.props = Some(vec![Property::new("status", "Withdrawn")]);
        let mut parent = Control::new("ac-2", "Accounts");
        parent.controls = Some(vec![withdrawn]);
        let mut cat = Catalog {
            groups: Some(vec![Group {
                id: "ac".into(),
                controls: Some(vec![parent]),
                ..Default::default()
            }]),
            ..Default::default()
        };
        assert_eq!(drop_withdrawn(&mut cat), 1);
        assert!(cat.find_control("ac-2.1").is_none());
        assert!(cat.find_control("ac-2").unwrap().controls.is_none());
    }
}
