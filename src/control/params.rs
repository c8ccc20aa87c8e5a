//! Parameter rendering and set-parameter conversion

use std::collections::BTreeMap;

use crate::error::ControlError;
use crate::model::{Control, ControlImplementation, Parameter, SetParameter};

/// How a parameter is represented when a control is rendered as text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParameterRep {
    /// Leave the `{{ insert: param, id }}` placeholder in place; nothing is rendered
    LeaveMoustache,
    /// Comma separated values, or the literal `None`
    #[default]
    ValueOrStringNone,
    /// Selection choices if any, else the label, else the id
    LabelOrChoices,
    /// Values if any, else as [`ParameterRep::LabelOrChoices`]
    ValueOrLabelOrChoices,
    /// Values if any, else the empty string
    ValueOrEmptyString,
}

impl ParameterRep {
    /// Parse from a short name (`moustache`, `value`, `label`, `value-or-label`, `value-or-empty`)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().replace(['_', ' '], "-").as_str() {
            "moustache" | "leave-moustache" => Some(Self::LeaveMoustache),
            "value" | "value-or-none" | "value-or-string-none" => Some(Self::ValueOrStringNone),
            "label" | "label-or-choices" => Some(Self::LabelOrChoices),
            "value-or-label" | "value-or-label-or-choices" => Some(Self::ValueOrLabelOrChoices),
            "value-or-empty" | "value-or-empty-string" => Some(Self::ValueOrEmptyString),
            _ => None,
        }
    }
}

/// Build a parameter with id `param_id` from the fields of a set-parameter.
///
/// `values`, `select` and `label` are copied; the input is untouched.
pub fn setparam_to_param(param_id: &str, set_param: &SetParameter) -> Parameter {
    Parameter {
        id: param_id.to_string(),
        values: set_param.values.clone(),
        select: set_param.select.clone(),
        label: set_param.label.clone(),
        ..Default::default()
    }
}

fn param_values_as_str(param: &Parameter, brackets: bool) -> Option<String> {
    let values = param.values.as_deref().filter(|v| !v.is_empty())?;
    let joined = values.join(", ");
    Some(if brackets { format!("[{joined}]") } else { joined })
}

fn param_selection_as_str(param: &Parameter, verbose: bool, brackets: bool) -> String {
    let Some(select) = &param.select else {
        return String::new();
    };
    let Some(choices) = select.choice.as_deref().filter(|c| !c.is_empty()) else {
        return String::new();
    };
    let how_many = select.how_many.map(|h| h.to_string()).unwrap_or_default();
    let mut text = choices.join("; ");
    if brackets {
        text = format!("[{text}]");
    }
    if verbose {
        text = format!("Choose {how_many}: {text}");
    }
    text
}

fn param_label_choices_as_str(param: &Parameter, verbose: bool, brackets: bool) -> String {
    let choices = param_selection_as_str(param, verbose, brackets);
    if !choices.is_empty() {
        return choices;
    }
    match param.label.as_deref() {
        Some(label) if !label.is_empty() => label.to_string(),
        _ => param.id.clone(),
    }
}

/// Render a parameter as text.
///
/// `format`, when given, is a template whose single `.` is replaced by the
/// rendered text (`"*.*"` gives `*value*`). A template with more than one `.`
/// is a [`ControlError::Format`]. [`ParameterRep::LeaveMoustache`] renders
/// nothing and returns `None`.
pub fn param_to_str(
    param: &Parameter,
    rep: ParameterRep,
    verbose: bool,
    brackets: bool,
    format: Option<&str>,
) -> Result<Option<String>, ControlError> {
    let text = match rep {
        ParameterRep::LeaveMoustache => None,
        ParameterRep::ValueOrStringNone => {
            Some(param_values_as_str(param, false).unwrap_or_else(|| "None".to_string()))
        }
        ParameterRep::LabelOrChoices => Some(param_label_choices_as_str(param, verbose, brackets)),
        ParameterRep::ValueOrLabelOrChoices => Some(
            param_values_as_str(param, false)
                .unwrap_or_else(|| param_label_choices_as_str(param, verbose, brackets)),
        ),
        ParameterRep::ValueOrEmptyString => {
            Some(param_values_as_str(param, brackets).unwrap_or_default())
        }
    };

    match (text, format.filter(|f| !f.is_empty())) {
        (Some(text), Some(template)) => {
            if template.matches('.').count() > 1 {
                return Err(ControlError::Format {
                    template: template.to_string(),
                });
            }
            Ok(Some(template.replace('.', &text)))
        }
        (text, _) => Ok(text),
    }
}

/// Non-empty values of a set-parameter, comma separated
pub fn setparam_values_as_str(set_param: &SetParameter) -> String {
    set_param
        .values
        .iter()
        .flatten()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

/// `param_id -> "v1, v2"` for every set-parameter of the implementation with values
pub fn get_param_vals_from_control_imp(
    control_imp: &ControlImplementation,
) -> BTreeMap<String, String> {
    control_imp
        .set_parameters
        .iter()
        .flatten()
        .filter_map(|sp| {
            let values = setparam_values_as_str(sp);
            (!values.is_empty()).then(|| (sp.param_id.clone(), values))
        })
        .collect()
}

/// Map of parameter id to parameter for a control.
///
/// With `values_only`, parameters without values are left out. Parameters
/// with no id are logged and skipped.
pub fn get_control_param_dict(control: &Control, values_only: bool) -> BTreeMap<String, Parameter> {
    let mut params = BTreeMap::new();
    for param in control.params() {
        if param.id.is_empty() {
            tracing::warn!(control_id = %control.id, "Control has parameter with no id, ignoring");
            continue;
        }
        let has_values = param.values.as_deref().is_some_and(|v| !v.is_empty());
        if has_values || !values_only {
            params.insert(param.id.clone(), param.clone());
        }
    }
    params
}
