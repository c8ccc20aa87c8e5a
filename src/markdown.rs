//! Markdown Header Reconciliation
//!
//! Control markdown carries a YAML front-matter header:
//!
//! ```text
//! ---
//! control-id: ac-1
//! title: Policy and Procedures
//! set-params:
//!   ac-1_prm_1:
//!     values:
//!       - daily
//! ---
//! ## Control Statement
//! ```
//!
//! On regeneration the freshly generated header is merged into the header
//! the author may have edited, with [`merge_dicts_deep`]. Edits win unless
//! the caller asks for a forced regeneration.

use crate::control::{get_sort_id, merge_dicts_deep, HeaderMap, HeaderValue};
use crate::error::MarkdownError;
use crate::model::Control;

const FENCE: &str = "---";

/// Which side wins when both headers hold a scalar for the same key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderMerge {
    /// Keep the author's values; only add what is missing
    #[default]
    PreserveEdits,
    /// Generated values overwrite the author's
    Regenerate,
}

/// Merge a generated header into the edited one
pub fn reconcile_header(edits: &HeaderMap, generated: &HeaderMap, mode: HeaderMerge) -> HeaderMap {
    let mut merged = edits.clone();
    merge_dicts_deep(&mut merged, generated, mode == HeaderMerge::Regenerate);
    merged
}

/// Split markdown into its front-matter header and body.
///
/// Text without a leading `---` line has an empty header and is all body.
pub fn parse_header(text: &str) -> Result<(HeaderMap, String), MarkdownError> {
    let mut lines = text.split_inclusive('\n');
    match lines.next() {
        Some(first) if first.trim_end() == FENCE => {}
        _ => return Ok((HeaderMap::new(), text.to_string())),
    }

    let mut yaml = String::new();
    let mut closed = false;
    for line in lines.by_ref() {
        if line.trim_end() == FENCE {
            closed = true;
            break;
        }
        yaml.push_str(line);
    }
    if !closed {
        return Err(MarkdownError::Unterminated);
    }
    let body: String = lines.collect();

    if yaml.trim().is_empty() {
        return Ok((HeaderMap::new(), body));
    }
    let value: serde_yaml::Value =
        serde_yaml::from_str(&yaml).map_err(|e| MarkdownError::InvalidHeader {
            message: e.to_string(),
        })?;
    let header = HeaderMap::from_yaml(&value).ok_or(MarkdownError::HeaderNotMapping)?;
    Ok((header, body))
}

/// Join a header and body back into markdown; an empty header writes no fence
pub fn render_header(header: &HeaderMap, body: &str) -> Result<String, MarkdownError> {
    if header.is_empty() {
        return Ok(body.to_string());
    }
    let yaml = serde_yaml::to_string(&header.to_yaml()).map_err(|e| MarkdownError::Render {
        message: e.to_string(),
    })?;
    Ok(format!("{FENCE}\n{yaml}{FENCE}\n{body}"))
}

/// Reconcile the header of edited markdown with a generated one, keeping the edited body
pub fn reconcile_markdown(
    edited: &str,
    generated: &str,
    mode: HeaderMerge,
) -> Result<String, MarkdownError> {
    let (edits, body) = parse_header(edited)?;
    let (fresh, _) = parse_header(generated)?;
    let merged = reconcile_header(&edits, &fresh, mode);
    tracing::debug!(
        edited_keys = edits.len(),
        generated_keys = fresh.len(),
        merged_keys = merged.len(),
        ?mode,
        "Reconciled markdown header"
    );
    render_header(&merged, &body)
}

/// Header generated from the current state of a control
pub fn control_header(control: &Control) -> HeaderMap {
    let mut header = HeaderMap::new();
    header.insert("control-id", control.id.as_str());
    header.insert("title", control.title.as_str());
    if let Some(sort_id) = get_sort_id(control, false) {
        header.insert("sort-id", sort_id);
    }

    let mut set_params = HeaderMap::new();
    for param in control.params() {
        let mut entry = HeaderMap::new();
        match (param.values.as_deref(), param.label.as_deref()) {
            (Some(values), _) if !values.is_empty() => {
                entry.insert("values", HeaderValue::from(values.to_vec()));
            }
            (_, Some(label)) => entry.insert("label", label),
            _ => continue,
        }
        set_params.insert(param.id.as_str(), entry);
    }
    if !set_params.is_empty() {
        header.insert("set-params", set_params);
    }
    header
}

/// True unless the line is a markdown heading (`#`s then a space)
pub fn bad_header(line: &str) -> bool {
    let hashes = line.chars().take_while(|c| *c == '#').count();
    !(hashes > 0 && line[hashes..].starts_with(' '))
}
