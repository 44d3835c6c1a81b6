//! Run merging (adjacent run coalescing)

use crate::docx::wml;
use crate::dom::{NodeId, XmlDom};

/// Merge adjacent unformatted runs in every paragraph under `root`.
///
/// Word splits text into runs at edit boundaries (spell check, revision ids,
/// cursor moves), so a tag typed as `@name@` is often stored as
/// ```xml
/// <w:r><w:t>@na</w:t></w:r><w:r><w:t>me@</w:t></w:r>
/// ```
/// and cannot be matched until the runs are joined. Returns the number of
/// runs merged away.
pub fn merge_runs_in(dom: &mut XmlDom, root: NodeId) -> usize {
    let mut paragraphs: Vec<NodeId> = dom
        .descendants(root)
        .into_iter()
        .filter(|&id| wml::is_paragraph(dom, id))
        .collect();
    if wml::is_paragraph(dom, root) {
        paragraphs.insert(0, root);
    }

    paragraphs
        .into_iter()
        .map(|paragraph| merge_runs(dom, paragraph))
        .sum()
}

/// Merge adjacent mergeable runs among the direct children of a paragraph.
///
/// Only runs that sit directly next to each other are considered; anything
/// in between (bookmarks, proofing marks) keeps them apart.
pub fn merge_runs(dom: &mut XmlDom, paragraph: NodeId) -> usize {
    let mut merged = 0;
    let mut cursor_opt = dom.first_child(paragraph);

    while let Some(current_id) = cursor_opt {
        let next_opt = dom.next_sibling(current_id);

        if let Some(next_id) = next_opt
            && try_merge(dom, current_id, next_id)
        {
            dom.detach(next_id);
            merged += 1;
            // Don't advance: the new neighbour might merge as well
            continue;
        }

        cursor_opt = next_opt;
    }
    merged
}

/// Merge run `b` into run `a` if both are plain text with empty formatting.
fn try_merge(dom: &mut XmlDom, a: NodeId, b: NodeId) -> bool {
    if !wml::is_run(dom, a) || !wml::is_run(dom, b) {
        return false;
    }
    let (Some(parts_a), Some(parts_b)) = (run_parts(dom, a), run_parts(dom, b)) else {
        return false;
    };
    if !is_empty_properties(dom, parts_a.properties)
        || !is_empty_properties(dom, parts_b.properties)
    {
        return false;
    }

    match (parts_a.text, parts_b.text) {
        (Some(text_a), Some(text_b)) => merge_text(dom, text_a, text_b),
        (None, Some(text_b)) => {
            dom.append(a, text_b);
            true
        }
        (_, None) => true,
    }
}

struct RunParts {
    text: Option<NodeId>,
    properties: Option<NodeId>,
}

/// Split a run into its text leaf and properties, or `None` if it holds
/// anything else (tabs, breaks, fields, drawings) or duplicates of either.
fn run_parts(dom: &XmlDom, run: NodeId) -> Option<RunParts> {
    let mut parts = RunParts {
        text: None,
        properties: None,
    };
    for child in dom.children(run) {
        let slot = if dom.is_element(child, wml::TEXT) {
            &mut parts.text
        } else if dom.is_element(child, wml::RUN_PROPERTIES) {
            &mut parts.properties
        } else {
            return None;
        };
        if slot.replace(child).is_some() {
            return None;
        }
    }
    Some(parts)
}

/// Absent properties count as empty.
fn is_empty_properties(dom: &XmlDom, properties: Option<NodeId>) -> bool {
    properties.is_none_or(|p| dom.attrs(p).is_empty() && dom.first_child(p).is_none())
}

/// Append `b`'s text to `a`. Only `xml:space="preserve"` may differ between
/// the two leaves; it is carried over to `a`.
fn merge_text(dom: &mut XmlDom, a: NodeId, b: NodeId) -> bool {
    let diff: Vec<_> = dom
        .attrs(b)
        .iter()
        .filter(|attr| dom.attr(a, &attr.name) != Some(attr.value.as_str()))
        .cloned()
        .collect();
    let a_only = dom
        .attrs(a)
        .iter()
        .any(|attr| dom.attr(b, &attr.name).is_none() && !is_space_preserve(&attr.name, &attr.value));

    if a_only
        || diff
            .iter()
            .any(|attr| !is_space_preserve(&attr.name, &attr.value))
    {
        return false;
    }

    for attr in diff {
        dom.set_attr(a, &attr.name, attr.value);
    }
    let text = dom.text_content(b);
    if !text.is_empty() {
        dom.append_text(a, &text);
    }
    true
}

fn is_space_preserve(name: &str, value: &str) -> bool {
    name == wml::ATTR_SPACE && value == "preserve"
}
