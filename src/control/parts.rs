//! Part tree search and prose extraction

use crate::error::ControlError;
use crate::model::{Control, Part, Profile};

use super::props::get_label;
use super::STATEMENT;

/// Identity of a named section found in a control's part tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionRef {
    pub id: String,
    pub name: String,
    pub title: Option<String>,
}

/// A rendered statement line, or the rendered children of a part
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartLine {
    Text(String),
    Nested(Vec<PartLine>),
}

impl PartLine {
    /// Flatten nested lines, prefixing each level with one more `indent`
    pub fn flatten(lines: &[PartLine], indent: &str) -> Vec<String> {
        let mut out = Vec::new();
        flatten_into(lines, indent, 0, &mut out);
        out
    }
}

fn flatten_into(lines: &[PartLine], indent: &str, depth: usize, out: &mut Vec<String>) {
    for line in lines {
        match line {
            PartLine::Text(text) if text.is_empty() => out.push(String::new()),
            PartLine::Text(text) => out.push(format!("{}{}", indent.repeat(depth), text)),
            PartLine::Nested(children) => flatten_into(children, indent, depth + 1, out),
        }
    }
}

/// Join two prose pieces with a single newline, dropping empty pieces
fn gap_join(a: &str, b: &str) -> String {
    let a = a.trim();
    let b = b.trim();
    if b.is_empty() {
        return a.to_string();
    }
    if a.is_empty() {
        return b.to_string();
    }
    format!("{a}\n{b}")
}

fn section_part_prose(part: &Part, section_name: &str) -> String {
    let mut prose = String::new();
    if part.name == section_name {
        if let Some(text) = &part.prose {
            prose = gap_join(&prose, text);
        }
    }
    for sub_part in part.children() {
        prose = gap_join(&prose, &section_part_prose(sub_part, section_name));
    }
    prose
}

/// Prose of every part named `section_name`, at any depth, in document order
pub fn get_section_prose(control: &Control, section_name: &str) -> String {
    control
        .parts()
        .iter()
        .fold(String::new(), |prose, part| {
            gap_join(&prose, &section_part_prose(part, section_name))
        })
}

fn find_section_info(part: &Part, skip_names: &[&str]) -> Option<SectionRef> {
    let has_prose = part.prose.as_deref().is_some_and(|p| !p.is_empty());
    if has_prose && !skip_names.contains(&part.name.as_str()) {
        // an id-less match ends the search of this subtree
        return (!part.id.is_empty()).then(|| SectionRef {
            id: part.id.clone(),
            name: part.name.clone(),
            title: part.title.clone(),
        });
    }
    part.children()
        .iter()
        .find_map(|sub| find_section_info(sub, skip_names))
}

/// First part, depth first, with prose and a name outside `skip_names`.
///
/// Callers iterate sections by adding each found name to `skip_names`.
pub fn find_section(control: &Control, skip_names: &[&str]) -> Option<SectionRef> {
    control
        .parts()
        .iter()
        .find_map(|part| find_section_info(part, skip_names))
}

/// [`find_section`] plus the full prose of the section it found
pub fn get_section(control: &Control, skip_names: &[&str]) -> Option<(SectionRef, String)> {
    let section = find_section(control, skip_names)?;
    let prose = get_section_prose(control, &section.name);
    Some((section, prose))
}

/// Prose of parts named `part_name`, concatenated across top-level parts and trimmed
pub fn get_part_prose(control: &Control, part_name: &str) -> String {
    control
        .parts()
        .iter()
        .map(|part| section_part_prose(part, part_name))
        .collect::<String>()
        .trim()
        .to_string()
}

fn wrap_label(label: &str) -> String {
    if label.is_empty() {
        String::new()
    } else {
        format!("\\[{label}\\]")
    }
}

/// Render a statement tree into label-prefixed lines.
///
/// Only parts named `statement` or `item_type` are rendered. The label is the
/// part's `label` property, else the last dot segment of its id. The part
/// whose id equals `skip_id` contributes no line of its own (its prose has
/// already been written by the caller) but its children are still rendered.
/// Each level of children is returned as a nested list ending in an empty line.
pub fn get_part(part: &Part, item_type: &str, skip_id: Option<&str>) -> Vec<PartLine> {
    let mut items = Vec::new();
    if part.name != STATEMENT && part.name != item_type {
        return items;
    }

    let mut label = get_label(part);
    if label.is_empty() {
        label = part.id.rsplit('.').next().unwrap_or_default().to_string();
    }
    let wrapped = wrap_label(&label);
    let prose = part.prose.as_deref().unwrap_or_default();
    let pad = if wrapped.is_empty() || prose.is_empty() {
        ""
    } else {
        " "
    };
    if Some(part.id.as_str()) != skip_id {
        items.push(PartLine::Text(format!("{wrapped}{pad}{prose}")));
    }
    if let Some(children) = &part.parts {
        let mut sub_list: Vec<PartLine> = children
            .iter()
            .flat_map(|child| get_part(child, item_type, skip_id))
            .collect();
        sub_list.push(PartLine::Text(String::new()));
        items.push(PartLine::Nested(sub_list));
    }
    items
}

/// `(part name, prose)` of every added part with prose for `control_id`
pub fn get_all_add_prose(control_id: &str, profile: &Profile) -> Vec<(String, String)> {
    profile
        .alters()
        .iter()
        .filter(|alter| alter.control_id == control_id)
        .flat_map(|alter| alter.adds.iter().flatten())
        .flat_map(|add| add.parts.iter().flatten())
        .filter_map(|part| match part.prose.as_deref() {
            Some(prose) if !prose.is_empty() => Some((part.name.clone(), prose.to_string())),
            _ => None,
        })
        .collect()
}

fn ncname_first(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

fn ncname_other(c: char) -> bool {
    ncname_first(c) || c.is_numeric() || c == '.' || c == '-'
}

/// Reduce a label to a valid NCName by dropping disallowed characters
pub fn strip_to_make_ncname(label: &str) -> Result<String, ControlError> {
    let mut chars = label.chars().skip_while(|c| !ncname_first(*c));
    let Some(first) = chars.next() else {
        return Err(ControlError::NcName {
            label: label.to_string(),
        });
    };
    let mut out = String::from(first);
    out.extend(chars.filter(|c| ncname_other(*c)));
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Add, Alter, Modify, Property};

    fn statement_part() -> Part {
        Part {
            id: "ac-1_smt".into(),
            name: "statement".into(),
            prose: Some("The organization:".into()),
            parts: Some(vec![
                Part {
                    id: "ac-1_smt.a".into(),
                    name: "item".into(),
                    props: Some(vec![Property::new("label", "a.")]),
                    prose: Some("Develops a policy;".into()),
                    parts: Some(vec![Part::new("ac-1_smt.a.1", "item", "Addresses purpose;")]),
                    ..Default::default()
                },
                Part::new("ac-1_smt.b", "item", "Reviews the policy."),
            ]),
            ..Default::default()
        }
    }

    fn sample_control() -> Control {
        let mut control = Control::new("ac-1", "Policy and Procedures");
        control.parts = Some(vec![
            statement_part(),
            Part {
                id: "ac-1_gdn".into(),
                name: "guidance".into(),
                prose: Some("  Guidance one.  ".into()),
                parts: Some(vec![Part::new("ac-1_gdn.x", "guidance", "Guidance two.")]),
                ..Default::default()
            },
            Part::new("ac-1_imp", "implementation", ""),
        ]);
        control
    }

    #[test]
    fn test_section_prose_gap_join() {
        let control = sample_control();
        assert_eq!(
            get_section_prose(&control, "guidance"),
            "Guidance one.\nGuidance two."
        );
        assert_eq!(get_section_prose(&control, "nonexistent"), "");
    }

    #[test]
    fn test_find_section_skips_consumed_names() {
        let control = sample_control();
        let first = find_section(&control, &[]).unwrap();
        assert_eq!(first.name, "statement");

        let next = find_section(&control, &["statement"]).unwrap();
        assert_eq!(next.id, "ac-1_smt.a");
        assert_eq!(next.name, "item");

        let guidance = find_section(&control, &["statement", "item"]).unwrap();
        assert_eq!(guidance.id, "ac-1_gdn");

        // the implementation part has empty prose and is never a section
        assert!(find_section(&control, &["statement", "item", "guidance"]).is_none());
    }

    #[test]
    fn test_find_section_idless_match_ends_subtree() {
        let mut control = Control::new("ac-1", "Policy");
        let mut idless = Part::new("", "overview", "Unnamed overview.");
        idless.parts = Some(vec![Part::new("ac-1_ovw.a", "detail", "Nested detail.")]);
        control.parts = Some(vec![idless, Part::new("ac-1_gdn", "guidance", "Guidance.")]);

        let found = find_section(&control, &[]).unwrap();
        assert_eq!(found.id, "ac-1_gdn");
        assert!(find_section(&control, &["guidance"]).is_none());
        assert_eq!(find_section(&control, &["overview"]).unwrap().id, "ac-1_ovw.a");
    }

    #[test]
    fn test_get_section_includes_prose() {
        let control = sample_control();
        let (section, prose) = get_section(&control, &["statement", "item"]).unwrap();
        assert_eq!(section.name, "guidance");
        assert_eq!(prose, "Guidance one.\nGuidance two.");
    }

    #[test]
    fn test_get_part_prose() {
        let control = sample_control();
        assert_eq!(get_part_prose(&control, "item"), "Develops a policy;\nAddresses purpose;\nReviews the policy.");
    }

    #[test]
    fn test_get_part_renders_labels_and_skips_top() {
        let lines = get_part(&statement_part(), "item", Some("ac-1_smt"));
        assert_eq!(lines.len(), 1);
        let PartLine::Nested(children) = &lines[0] else {
            panic!("expected nested lines");
        };
        assert_eq!(children[0], PartLine::Text("\\[a.\\] Develops a policy;".into()));
        assert_eq!(
            children[1],
            PartLine::Nested(vec![
                PartLine::Text("\\[1\\] Addresses purpose;".into()),
                PartLine::Text(String::new()),
            ])
        );
        assert_eq!(children[2], PartLine::Text("\\[b\\] Reviews the policy.".into()));
        assert_eq!(children[3], PartLine::Text(String::new()));
    }

    #[test]
    fn test_get_part_ignores_other_names() {
        let guidance = Part::new("ac-1_gdn", "guidance", "text");
        assert!(get_part(&guidance, "item", None).is_empty());
    }

    #[test]
    fn test_flatten_part_lines() {
        let lines = get_part(&statement_part(), "item", None);
        let flat = PartLine::flatten(&lines, "  ");
        assert_eq!(flat[0], "\\[ac-1_smt\\] The organization:");
        assert_eq!(flat[1], "  \\[a.\\] Develops a policy;");
        assert_eq!(flat[2], "    \\[1\\] Addresses purpose;");
        assert_eq!(flat[3], "");
        assert_eq!(flat[4], "  \\[b\\] Reviews the policy.");
    }

    #[test]
    fn test_get_all_add_prose() {
        let profile = Profile {
            modify: Some(Modify {
                alters: Some(vec![
                    Alter {
                        control_id: "ac-1".into(),
                        adds: Some(vec![Add {
                            parts: Some(vec![
                                Part::new("ac-1_extra", "extra", "More prose"),
                                Part::new("ac-1_empty", "empty", ""),
                            ]),
                            ..Default::default()
                        }]),
                        ..Default::default()
                    },
                    Alter {
                        control_id: "ac-2".into(),
                        adds: Some(vec![Add {
                            parts: Some(vec![Part::new("ac-2_x", "x", "other")]),
                            ..Default::default()
                        }]),
                        ..Default::default()
                    },
                ]),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(
            get_all_add_prose("ac-1", &profile),
            vec![("extra".to_string(), "More prose".to_string())]
        );
    }

    #[test]
    fn test_strip_to_make_ncname() {
        assert_eq!(strip_to_make_ncname("1a b$c").unwrap(), "abc");
        assert_eq!(strip_to_make_ncname("_x.y-z").unwrap(), "_x.y-z");
        assert!(strip_to_make_ncname("123").is_err());
    }
}
