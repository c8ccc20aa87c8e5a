//! Import selection: include/exclude controls from one source

use std::collections::HashSet;

use regex::Regex;

use crate::error::{ResolveError, Result};
use crate::model::{Catalog, Control, Group, Import, SelectControlById, WithChildControls};

/// Translate an id glob (`*`, `?`) into an anchored regex
fn glob_to_regex(pattern: &str) -> Result<Regex> {
    let mut re = String::from("^");
    for c in pattern.chars() {
        match c {
            '*' => re.push_str(".*"),
            '?' => re.push('.'),
            other => re.push_str(&regex::escape(&other.to_string())),
        }
    }
    re.push('$');
    Regex::new(&re).map_err(|e| ResolveError::InvalidPattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}

fn collect_descendants(control: &Control, out: &mut HashSet<String>) {
    for child in control.enhancements() {
        out.insert(child.id.clone());
        collect_descendants(child, out);
    }
}

/// Ids matched by a list of selectors, evaluated over every control of the catalog
fn matched_ids(catalog: &Catalog, selectors: &[SelectControlById]) -> Result<HashSet<String>> {
    let controls = catalog.all_controls();
    let mut ids = HashSet::new();

    for selector in selectors {
        let with_ids: HashSet<&str> = selector
            .with_ids
            .iter()
            .flatten()
            .map(String::as_str)
            .collect();
        let patterns = selector
            .matching
            .iter()
            .flatten()
            .map(|m| glob_to_regex(&m.pattern))
            .collect::<Result<Vec<_>>>()?;
        let with_children = selector.with_child_controls == Some(WithChildControls::Yes);

        for control in &controls {
            let hit = with_ids.contains(control.id.as_str())
                || patterns.iter().any(|re| re.is_match(&control.id));
            if hit {
                ids.insert(control.id.clone());
                if with_children {
                    collect_descendants(control, &mut ids);
                }
            }
        }
    }
    Ok(ids)
}

/// Keep selected controls; a selected enhancement of an unselected control
/// takes its parent's place.
fn filter_controls(controls: &[Control], selected: &HashSet<String>) -> Vec<Control> {
    let mut out = Vec::new();
    for control in controls {
        let children = filter_controls(control.enhancements(), selected);
        if selected.contains(&control.id) {
            let mut kept = control.clone();
            kept.controls = if children.is_empty() {
                None
            } else {
                Some(children)
            };
            out.push(kept);
        } else {
            out.extend(children);
        }
    }
    out
}

fn filter_groups(groups: &[Group], selected: &HashSet<String>, prune: bool) -> Vec<Group> {
    groups
        .iter()
        .filter_map(|group| {
            let controls = filter_controls(group.controls(), selected);
            let subgroups = filter_groups(group.groups(), selected, prune);
            if prune && controls.is_empty() && subgroups.is_empty() {
                tracing::debug!(group_id = %group.id, "Pruning group with no selected controls");
                return None;
            }
            let mut kept = group.clone();
            kept.controls = (!controls.is_empty()).then_some(controls);
            kept.groups = (!subgroups.is_empty()).then_some(subgroups);
            Some(kept)
        })
        .collect()
}

/// Apply an import's include/exclude selectors to a resolved source.
///
/// With no `include-controls` everything is included. Groups left empty are
/// pruned only when `include-controls` narrowed the selection.
pub(crate) fn select_controls(source: &Catalog, import: &Import) -> Result<Catalog> {
    let include_all = import.include_all.is_some() || import.include_controls.is_none();

    let mut selected: HashSet<String> = if include_all {
        source
            .all_controls()
            .into_iter()
            .map(|c| c.id.clone())
            .collect()
    } else {
        matched_ids(source, import.include_controls.as_deref().unwrap_or_default())?
    };

    if let Some(excludes) = import.exclude_controls.as_deref() {
        for id in matched_ids(source, excludes)? {
            selected.remove(&id);
        }
    }

    tracing::debug!(
        href = %import.href,
        include_all,
        selected = selected.len(),
        "Selected controls from import"
    );

    let controls = filter_controls(source.controls(), &selected);
    let groups = filter_groups(source.groups(), &selected, !include_all);
    Ok(Catalog {
        uuid: source.uuid.clone(),
        metadata: source.metadata.clone(),
        params: source.params.clone(),
        controls: (!controls.is_empty()).then_some(controls),
        groups: (!groups.is_empty()).then_some(groups),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Matching, Metadata};

    fn catalog() -> Catalog {
        let mut ac2 = Control::new("ac-2", "Account Management");
        ac2.controls = Some(vec![
            Control::new("ac-2.1", "Automated"),
            Control::new("ac-2.2", "Temporary Accounts"),
        ]);
        Catalog {
            uuid: "cat".into(),
            metadata: Metadata::titled("Catalog"),
            groups: Some(vec![
                Group {
                    id: "ac".into(),
                    title: "Access Control".into(),
                    controls: Some(vec![Control::new("ac-1", "Policy"), ac2]),
                    ..Default::default()
                },
                Group {
                    id: "au".into(),
                    title: "Audit".into(),
                    controls: Some(vec![Control::new("au-1", "Policy")]),
                    ..Default::default()
                },
            ]),
            ..Default::default()
        }
    }

    fn ids(catalog: &Catalog) -> Vec<&str> {
        catalog.all_controls().iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn test_include_all_by_default() {
        let selected = select_controls(&catalog(), &Import {
            href: "cat".into(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(ids(&selected), vec!["ac-1", "ac-2", "ac-2.1", "ac-2.2", "au-1"]);
    }

    #[test]
    fn test_include_with_ids_prunes_groups() {
        let import = Import {
            href: "cat".into(),
            include_controls: Some(vec![SelectControlById {
                with_ids: Some(vec!["ac-1".into()]),
                ..Default::default()
            }]),
            ..Default::default()
        };
        let selected = select_controls(&catalog(), &import).unwrap();
        assert_eq!(ids(&selected), vec!["ac-1"]);
        assert_eq!(selected.groups().len(), 1);
    }

    #[test]
    fn test_with_child_controls() {
        let import = Import {
            href: "cat".into(),
            include_controls: Some(vec![SelectControlById {
                with_child_controls: Some(WithChildControls::Yes),
                with_ids: Some(vec!["ac-2".into()]),
                ..Default::default()
            }]),
            ..Default::default()
        };
        let selected = select_controls(&catalog(), &import).unwrap();
        assert_eq!(ids(&selected), vec!["ac-2", "ac-2.1", "ac-2.2"]);
    }

    #[test]
    fn test_enhancement_hoisted_when_parent_unselected() {
        let import = Import {
            href: "cat".into(),
            include_controls: Some(vec![SelectControlById {
                with_ids: Some(vec!["ac-1".into(), "ac-2.2".into()]),
                ..Default::default()
            }]),
            ..Default::default()
        };
        let selected = select_controls(&catalog(), &import).unwrap();
        let group = &selected.groups()[0];
        let top: Vec<&str> = group.controls().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(top, vec!["ac-1", "ac-2.2"]);
    }

    #[test]
    fn test_matching_glob_and_exclude() {
        let import = Import {
            href: "cat".into(),
            include_controls: Some(vec![SelectControlById {
                matching: Some(vec![Matching {
                    pattern: "ac-?*".into(),
                }]),
                ..Default::default()
            }]),
            exclude_controls: Some(vec![SelectControlById {
                with_ids: Some(vec!["ac-2.1".into()]),
                ..Default::default()
            }]),
            ..Default::default()
        };
        let selected = select_controls(&catalog(), &import).unwrap();
        assert_eq!(ids(&selected), vec!["ac-1", "ac-2", "ac-2.2"]);
    }

    #[test]
    fn test_glob_is_anchored_and_literal() {
        let re = glob_to_regex("ac-1.?").unwrap();
        assert!(re.is_match("ac-1.1"));
        assert!(!re.is_match("ac-101"));
        assert!(!re.is_match("xac-1.1"));
    }
}
