//! Combining selected sources according to a profile's merge directive

use std::collections::HashSet;

use crate::error::{ResolveError, Result};
use crate::model::{Catalog, CombineMethod, Control, Group, Merge, Parameter};

/// How sources are combined, after validating the directive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MergeStrategy {
    /// Later sources supersede earlier nodes with the same id, in place
    Supersede,
    /// The earliest node with a given id is kept
    UseFirst,
}

/// Validated merge directive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MergePlan {
    pub strategy: MergeStrategy,
    pub flat: bool,
}

impl MergePlan {
    /// Check a profile's merge directive against the number of imports
    pub fn from_directive(profile: &str, merge: Option<&Merge>, imports: usize) -> Result<Self> {
        let unsupported = |directive: &str| ResolveError::UnsupportedMerge {
            profile: profile.to_string(),
            directive: directive.to_string(),
        };

        let Some(merge) = merge else {
            return Ok(Self {
                strategy: MergeStrategy::Supersede,
                flat: false,
            });
        };
        if merge.custom.is_some() {
            return Err(unsupported("custom"));
        }
        if let Some(key) = merge.unknown.keys().next() {
            return Err(unsupported(key));
        }
        let strategy = match merge.combine.as_ref().and_then(|c| c.method.as_ref()) {
            None | Some(CombineMethod::Merge) => MergeStrategy::Supersede,
            Some(CombineMethod::UseFirst) => MergeStrategy::UseFirst,
            Some(CombineMethod::Keep) => return Err(unsupported("combine: keep")),
            Some(CombineMethod::Other(method)) => {
                return Err(unsupported(&format!("combine: {}", method)))
            }
        };
        if merge.as_is == Some(true) && imports != 1 {
            return Err(ResolveError::AsIsImportCount {
                profile: profile.to_string(),
                count: imports,
            });
        }
        Ok(Self {
            strategy,
            flat: merge.flat.is_some(),
        })
    }
}

/// Control and group ids present in a tree
#[derive(Debug, Default)]
struct IdSet {
    controls: HashSet<String>,
    groups: HashSet<String>,
}

impl IdSet {
    fn add_control(&mut self, control: &Control) {
        self.controls.insert(control.id.clone());
        for child in control.enhancements() {
            self.add_control(child);
        }
    }

    fn add_group(&mut self, group: &Group) {
        if !group.id.is_empty() {
            self.groups.insert(group.id.clone());
        }
        for control in group.controls() {
            self.add_control(control);
        }
        for sub in group.groups() {
            self.add_group(sub);
        }
    }

    fn of_catalog(catalog: &Catalog) -> Self {
        let mut ids = Self::default();
        for control in catalog.controls() {
            ids.add_control(control);
        }
        for group in catalog.groups() {
            ids.add_group(group);
        }
        ids
    }
}

fn take_vec<T>(slot: &mut Option<Vec<T>>) -> Vec<T> {
    slot.take().unwrap_or_default()
}

fn put_vec<T>(slot: &mut Option<Vec<T>>, items: Vec<T>) {
    *slot = (!items.is_empty()).then_some(items);
}

/// Remove every control and group whose id is in `ids`, at any depth
fn strip_controls(controls: &mut Vec<Control>, ids: &IdSet) {
    controls.retain(|c| !ids.controls.contains(&c.id));
    for control in controls.iter_mut() {
        let mut children = take_vec(&mut control.controls);
        strip_controls(&mut children, ids);
        put_vec(&mut control.controls, children);
    }
}

fn strip_groups(groups: &mut Vec<Group>, ids: &IdSet) {
    groups.retain(|g| g.id.is_empty() || !ids.groups.contains(&g.id));
    for group in groups.iter_mut() {
        let mut controls = take_vec(&mut group.controls);
        strip_controls(&mut controls, ids);
        put_vec(&mut group.controls, controls);

        let mut subgroups = take_vec(&mut group.groups);
        strip_groups(&mut subgroups, ids);
        put_vec(&mut group.groups, subgroups);
    }
}

fn strip_catalog(catalog: &mut Catalog, ids: &IdSet) {
    let mut controls = take_vec(&mut catalog.controls);
    strip_controls(&mut controls, ids);
    put_vec(&mut catalog.controls, controls);

    let mut groups = take_vec(&mut catalog.groups);
    strip_groups(&mut groups, ids);
    put_vec(&mut catalog.groups, groups);
}

fn replace_control(controls: &mut [Control], incoming: &Control) -> Option<Control> {
    for control in controls.iter_mut() {
        if control.id == incoming.id {
            return Some(std::mem::replace(control, incoming.clone()));
        }
        let children = control.controls.as_deref_mut().unwrap_or_default();
        if let Some(old) = replace_control(children, incoming) {
            return Some(old);
        }
    }
    None
}

fn replace_control_in_groups(groups: &mut [Group], incoming: &Control) -> Option<Control> {
    for group in groups.iter_mut() {
        let controls = group.controls.as_deref_mut().unwrap_or_default();
        if let Some(old) = replace_control(controls, incoming) {
            return Some(old);
        }
        let subgroups = group.groups.as_deref_mut().unwrap_or_default();
        if let Some(old) = replace_control_in_groups(subgroups, incoming) {
            return Some(old);
        }
    }
    None
}

fn replace_group(groups: &mut [Group], incoming: &Group) -> Option<Group> {
    for group in groups.iter_mut() {
        if group.id == incoming.id {
            return Some(std::mem::replace(group, incoming.clone()));
        }
        let subgroups = group.groups.as_deref_mut().unwrap_or_default();
        if let Some(old) = replace_group(subgroups, incoming) {
            return Some(old);
        }
    }
    None
}

fn upsert_param(params: &mut Vec<Parameter>, incoming: &Parameter, strategy: MergeStrategy) {
    match params.iter_mut().find(|p| p.id == incoming.id) {
        Some(existing) if strategy == MergeStrategy::Supersede => *existing = incoming.clone(),
        Some(_) => {}
        None => params.push(incoming.clone()),
    }
}

/// Merge a control: an existing control with the same id is replaced where
/// it stands, and ids the incoming control brings along are removed elsewhere.
fn supersede_control(merged: &mut Catalog, incoming: &Control) {
    let mut ids = IdSet::default();
    ids.add_control(incoming);
    ids.controls.remove(&incoming.id);
    strip_catalog(merged, &ids);

    let replaced = replace_control(merged.controls.as_deref_mut().unwrap_or_default(), incoming)
        .or_else(|| {
            replace_control_in_groups(merged.groups.as_deref_mut().unwrap_or_default(), incoming)
        });
    match replaced {
        Some(_) => tracing::debug!(control_id = %incoming.id, "Later import supersedes control"),
        None => merged.controls.get_or_insert_with(Vec::new).push(incoming.clone()),
    }
}

fn supersede_group(merged: &mut Catalog, incoming: &Group) {
    let mut ids = IdSet::default();
    ids.add_group(incoming);
    ids.groups.remove(&incoming.id);
    strip_catalog(merged, &ids);

    let replaced = if incoming.id.is_empty() {
        None
    } else {
        replace_group(merged.groups.as_deref_mut().unwrap_or_default(), incoming)
    };
    match replaced {
        Some(_) => tracing::debug!(group_id = %incoming.id, "Later import supersedes group"),
        None => merged.groups.get_or_insert_with(Vec::new).push(incoming.clone()),
    }
}

/// Drop every control already in `seen`, keeping unseen enhancements under their parent
fn novel_controls(controls: &[Control], seen: &IdSet) -> Vec<Control> {
    controls
        .iter()
        .filter(|c| {
            let novel = !seen.controls.contains(&c.id);
            if !novel {
                tracing::debug!(control_id = %c.id, "Keeping first occurrence of control");
            }
            novel
        })
        .map(|c| {
            let mut kept = c.clone();
            let children = novel_controls(c.enhancements(), seen);
            put_vec(&mut kept.controls, children);
            kept
        })
        .collect()
}

/// Add the novel content of `incoming` under `into`, merging subgroups with known ids
fn use_first_into_group(into: &mut Group, incoming: &Group, seen: &IdSet) {
    let controls = novel_controls(incoming.controls(), seen);
    into.controls.get_or_insert_with(Vec::new).extend(controls);
    for sub in incoming.groups() {
        use_first_group(into.groups.get_or_insert_with(Vec::new), sub, seen);
    }
    if into.controls.as_ref().is_some_and(Vec::is_empty) {
        into.controls = None;
    }
    if into.groups.as_ref().is_some_and(Vec::is_empty) {
        into.groups = None;
    }
}

fn use_first_group(groups: &mut Vec<Group>, incoming: &Group, seen: &IdSet) {
    if !incoming.id.is_empty() && seen.groups.contains(&incoming.id) {
        match find_group_mut(groups, &incoming.id) {
            Some(existing) => use_first_into_group(existing, incoming, seen),
            None => tracing::debug!(group_id = %incoming.id, "Keeping first occurrence of group"),
        }
        return;
    }
    let mut fresh = Group {
        controls: None,
        groups: None,
        ..incoming.clone()
    };
    use_first_into_group(&mut fresh, incoming, seen);
    groups.push(fresh);
}

fn find_group_mut<'a>(groups: &'a mut [Group], id: &str) -> Option<&'a mut Group> {
    for group in groups.iter_mut() {
        if group.id == id {
            return Some(group);
        }
        let subgroups = group.groups.as_deref_mut().unwrap_or_default();
        if let Some(found) = find_group_mut(subgroups, id) {
            return Some(found);
        }
    }
    None
}

fn use_first_source(merged: &mut Catalog, source: &Catalog) {
    let seen = IdSet::of_catalog(merged);
    let controls = novel_controls(source.controls(), &seen);
    merged.controls.get_or_insert_with(Vec::new).extend(controls);

    let groups = merged.groups.get_or_insert_with(Vec::new);
    for group in source.groups() {
        use_first_group(groups, group, &seen);
    }
}

fn flatten_group(group: Group, controls: &mut Vec<Control>, params: &mut Vec<Parameter>) {
    params.extend(group.params.unwrap_or_default());
    controls.extend(group.controls.unwrap_or_default());
    for sub in group.groups.unwrap_or_default() {
        flatten_group(sub, controls, params);
    }
}

/// Hoist every control out of its groups, in document order; group
/// parameters move to the catalog.
fn flatten(catalog: &mut Catalog) {
    let mut controls = take_vec(&mut catalog.controls);
    let mut params = take_vec(&mut catalog.params);
    for group in take_vec(&mut catalog.groups) {
        flatten_group(group, &mut controls, &mut params);
    }
    put_vec(&mut catalog.controls, controls);
    put_vec(&mut catalog.params, params);
}

fn check_unique_controls<'a>(
    controls: &'a [Control],
    seen: &mut HashSet<&'a str>,
) -> std::result::Result<(), &'a str> {
    for control in controls {
        if !seen.insert(control.id.as_str()) {
            return Err(control.id.as_str());
        }
        check_unique_controls(control.enhancements(), seen)?;
    }
    Ok(())
}

fn check_unique_groups<'a>(
    groups: &'a [Group],
    group_ids: &mut HashSet<&'a str>,
    control_ids: &mut HashSet<&'a str>,
) -> std::result::Result<(), (&'static str, &'a str)> {
    for group in groups {
        if !group.id.is_empty() && !group_ids.insert(group.id.as_str()) {
            return Err(("group", group.id.as_str()));
        }
        check_unique_controls(group.controls(), control_ids).map_err(|id| ("control", id))?;
        check_unique_groups(group.groups(), group_ids, control_ids)?;
    }
    Ok(())
}

/// Every control id and every non-empty group id must be unique
pub(crate) fn check_unique_ids(profile: &str, catalog: &Catalog) -> Result<()> {
    let mut control_ids = HashSet::new();
    let mut group_ids = HashSet::new();
    check_unique_controls(catalog.controls(), &mut control_ids)
        .map_err(|id| ("control", id))
        .and_then(|_| check_unique_groups(catalog.groups(), &mut group_ids, &mut control_ids))
        .map_err(|(kind, id)| ResolveError::DuplicateId {
            profile: profile.to_string(),
            kind,
            id: id.to_string(),
        })
}

/// Combine selected sources, in import order, into one catalog body
pub(crate) fn merge_sources(profile: &str, plan: MergePlan, sources: Vec<Catalog>) -> Result<Catalog> {
    let mut merged = Catalog::default();

    for (index, source) in sources.into_iter().enumerate() {
        tracing::debug!(profile, source = index, strategy = ?plan.strategy, "Merging source");
        // superseding would silently absorb a repeat inside one source
        check_unique_ids(profile, &source)?;
        let mut params = take_vec(&mut merged.params);
        for param in source.params.iter().flatten() {
            upsert_param(&mut params, param, plan.strategy);
        }
        put_vec(&mut merged.params, params);

        match plan.strategy {
            MergeStrategy::Supersede => {
                for group in source.groups() {
                    supersede_group(&mut merged, group);
                }
                for control in source.controls() {
                    supersede_control(&mut merged, control);
                }
            }
            MergeStrategy::UseFirst => use_first_source(&mut merged, &source),
        }
    }

    if plan.flat {
        flatten(&mut merged);
    }
    let controls = take_vec(&mut merged.controls);
    put_vec(&mut merged.controls, controls);
    let groups = take_vec(&mut merged.groups);
    put_vec(&mut merged.groups, groups);

    check_unique_ids(profile, &merged)?;
    Ok(merged)
}
