//! Control Interface
//!
//! Stateless operations over document-model nodes: property CRUD, part and
//! section search, parameter rendering, rule and status metadata stored in
//! properties, component upserts, and the deep merge used to reconcile
//! markdown headers.
//!
//! Every function works on a node (or an explicit pair of nodes) passed in by
//! the caller; nothing here keeps state between calls.
//!
//! # Example
//!
//! ```ignore
//! use tailor::control::{get_prop, is_withdrawn, param_to_str, ParameterRep};
//!
//! let label = get_prop(&control, "label", None);
//! if !is_withdrawn(&control) {
//!     for param in control.params() {
//!         let text = param_to_str(param, ParameterRep::ValueOrStringNone, false, false, None)?;
//!     }
//! }
//! ```

mod component;
mod header;
mod params;
mod parts;
mod props;

pub use component::{
    get_component_by_name, get_control_imp_reqs, insert_imp_req_into_component,
    ComponentImpInfo,
};
pub use header::{merge_dicts_deep, HeaderMap, HeaderValue};
pub use params::{
    get_control_param_dict, get_param_vals_from_control_imp, param_to_str, setparam_to_param,
    setparam_values_as_str, ParameterRep,
};
pub use parts::{
    find_section, get_all_add_prose, get_part, get_part_prose, get_section, get_section_prose,
    strip_to_make_ncname, PartLine, SectionRef,
};
pub use props::{
    copy_status_in_props, delete_prop, get_label, get_params_from_item, get_prop,
    get_rule_list_for_item, get_rules_from_item, get_sort_id, get_status_from_props,
    insert_status_in_props, is_withdrawn, replace_prop, RuleInfo, RuleParam,
};

// Well-known property names
pub const STATUS: &str = "status";
pub const LABEL: &str = "label";
pub const SORT_ID: &str = "sort-id";
pub const IMPLEMENTATION_STATUS: &str = "implementation-status";
pub const RULE_NAME_ID: &str = "rule_name_id";
pub const RULE_DESCRIPTION: &str = "rule_description";
pub const PARAM_ID: &str = "param_id";
pub const PARAM_DESCRIPTION: &str = "param_description";
pub const PARAM_OPTIONS: &str = "param_options";

/// Property value marking a control as withdrawn
pub const WITHDRAWN: &str = "withdrawn";

/// Implementation state used when none is recorded
pub const STATUS_OTHER: &str = "other";

/// Placeholder for text the author must fill in
pub const REPLACE_ME: &str = "REPLACE_ME";

/// Part name of a control's statement
pub const STATEMENT: &str = "statement";
