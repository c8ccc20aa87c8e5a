//! Component definition lookups and implemented-requirement upserts

use std::collections::HashMap;

use uuid::Uuid;

use crate::model::{
    ComponentDefinition, ControlImplementation, DefinedComponent, ImplementationStatus,
    ImplementedRequirement, Statement,
};

use super::props::{copy_status_in_props, get_status_from_props, insert_status_in_props};
use super::REPLACE_ME;

/// Prose, rules and status of one component's implementation of a control
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ComponentImpInfo {
    pub prose: String,
    pub rules: Vec<String>,
    pub status: ImplementationStatus,
}

/// The component whose title is `title`
pub fn get_component_by_name<'a>(
    comp_def: &'a ComponentDefinition,
    title: &str,
) -> Option<&'a DefinedComponent> {
    comp_def
        .components
        .iter()
        .flatten()
        .find(|c| c.title == title)
}

/// Every implemented requirement for `control_id`, across all control implementations
pub fn get_control_imp_reqs<'a>(
    component: &'a DefinedComponent,
    control_id: &str,
) -> Vec<&'a ImplementedRequirement> {
    component
        .control_implementations
        .iter()
        .flatten()
        .flat_map(|ci| ci.implemented_requirements.iter())
        .filter(|req| req.control_id == control_id)
        .collect()
}

fn merge_statements(existing: Vec<Statement>, incoming: &[Statement]) -> Vec<Statement> {
    let mut by_id: HashMap<String, Statement> = existing
        .into_iter()
        .map(|s| (s.statement_id.clone(), s))
        .collect();
    incoming
        .iter()
        .map(|new_stmt| {
            let mut stmt = by_id
                .remove(&new_stmt.statement_id)
                .unwrap_or_else(|| new_stmt.clone());
            stmt.description = new_stmt.description.clone();
            copy_status_in_props(&mut stmt, new_stmt);
            stmt
        })
        .collect()
}

/// Upsert an implemented requirement into a component, matched by control id.
///
/// On a match the existing requirement takes the new status, and its
/// statements become those of the new requirement: each keeps the existing
/// statement object (same `statement_id`) with the new description and
/// status. Statements not present in the new requirement are dropped.
///
/// Without a match the requirement is appended to the first control
/// implementation, which is created with placeholder source and description
/// when the component has none.
pub fn insert_imp_req_into_component(
    component: &mut DefinedComponent,
    new_req: ImplementedRequirement,
) {
    let existing = component
        .control_implementations
        .iter_mut()
        .flatten()
        .flat_map(|ci| ci.implemented_requirements.iter_mut())
        .find(|req| req.control_id == new_req.control_id);

    if let Some(req) = existing {
        insert_status_in_props(req, get_status_from_props(&new_req));
        let statements = merge_statements(req.statements.take().unwrap_or_default(), new_req.statements());
        req.statements = if statements.is_empty() {
            None
        } else {
            Some(statements)
        };
        return;
    }

    tracing::debug!(
        component = %component.title,
        control_id = %new_req.control_id,
        "Appending new implemented requirement"
    );
    let control_imps = component.control_implementations.get_or_insert_with(Vec::new);
    if control_imps.is_empty() {
        control_imps.push(ControlImplementation {
            uuid: Uuid::new_v4().to_string(),
            source: REPLACE_ME.to_string(),
            description: REPLACE_ME.to_string(),
            ..Default::default()
        });
    }
    control_imps[0].implemented_requirements.push(new_req);
}
