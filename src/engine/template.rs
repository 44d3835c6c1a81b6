//! Template regions: find marker pairs and repeat their content per context.

use log::{debug, warn};

use super::GenerationReport;
use super::removal::RemovalSet;
use super::substitute::substitute;
use crate::context::{Context, Template};
use crate::docx::wml;
use crate::dom::{NodeId, XmlDom};
use crate::error::{Error, Result};

/// Content between a start marker paragraph and its end marker, all in the
/// same sibling list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateRange {
    pub start: NodeId,
    pub end: NodeId,
    /// Nodes strictly between the markers, in document order.
    pub nodes: Vec<NodeId>,
}

/// Expand every template of `templates` found under `root`, in order.
pub fn expand_templates(
    dom: &mut XmlDom,
    root: NodeId,
    templates: &[Template],
    report: &mut GenerationReport,
) -> Result<()> {
    for template in templates {
        if template.start_tag.trim().is_empty() || template.end_tag.trim().is_empty() {
            warn!("template with an empty start or end tag skipped");
            continue;
        }

        let ranges = find_ranges(dom, root, &template.start_tag, &template.end_tag)?;
        debug!(
            "template {:?}..{:?}: {} region(s)",
            template.start_tag,
            template.end_tag,
            ranges.len()
        );
        for range in &ranges {
            expand_range(dom, range, &template.contexts, report)?;
            report.template_regions += 1;
        }
    }
    Ok(())
}

/// Locate all marker pairs under `root`.
///
/// Markers are paragraphs whose trimmed text equals the tag. Every sibling
/// list is scanned, but not the inside of an open region. A start marker
/// while a region is open, an end marker with none open, and a region left
/// open at the end of its sibling list are errors. When both tags are equal,
/// a marker closes the open region if there is one.
pub fn find_ranges(dom: &XmlDom, root: NodeId, start_tag: &str, end_tag: &str) -> Result<Vec<TemplateRange>> {
    let mut ranges = Vec::new();
    scan(dom, root, start_tag.trim(), end_tag.trim(), &mut ranges)?;
    Ok(ranges)
}

fn scan(
    dom: &XmlDom,
    parent: NodeId,
    start_tag: &str,
    end_tag: &str,
    ranges: &mut Vec<TemplateRange>,
) -> Result<()> {
    let mut open: Option<(NodeId, Vec<NodeId>)> = None;

    for child in dom.children(parent) {
        if dom.element_name(child).is_none() {
            if let Some((_, nodes)) = open.as_mut() {
                nodes.push(child);
            }
            continue;
        }

        let marker = wml::is_paragraph(dom, child).then(|| wml::full_text(dom, child));
        let marker = marker.as_deref().map(str::trim);

        match open.take() {
            Some((start, nodes)) => {
                if marker == Some(end_tag) {
                    ranges.push(TemplateRange {
                        start,
                        end: child,
                        nodes,
                    });
                } else if marker == Some(start_tag) {
                    return Err(Error::NestedTemplate(start_tag.to_string()));
                } else {
                    let mut nodes = nodes;
                    nodes.push(child);
                    open = Some((start, nodes));
                }
            }
            None => {
                if marker == Some(start_tag) {
                    open = Some((child, Vec::new()));
                } else if marker == Some(end_tag) {
                    return Err(Error::UnmatchedTemplateEnd(end_tag.to_string()));
                } else {
                    scan(dom, child, start_tag, end_tag, ranges)?;
                }
            }
        }
    }

    if open.is_some() {
        return Err(Error::UnclosedTemplate {
            start: start_tag.to_string(),
            end: end_tag.to_string(),
        });
    }
    Ok(())
}

/// Replace a region with one substituted copy of its content per context.
///
/// Copies are inserted where the end marker sits, in context order; the
/// original content and both markers are removed.
pub fn expand_range(
    dom: &mut XmlDom,
    range: &TemplateRange,
    contexts: &[Context],
    report: &mut GenerationReport,
) -> Result<()> {
    for &node in &range.nodes {
        dom.detach(node);
    }

    for context in contexts {
        if !context.templates.is_empty() {
            warn!(
                "{} template(s) inside a template context are not expanded",
                context.templates.len()
            );
        }

        // Give the copies a parent so standalone tables can be inserted
        // next to their tag paragraph.
        let fragment = dom.create_fragment();
        for &node in &range.nodes {
            let copy = dom.deep_clone(node);
            dom.append(fragment, copy);
        }

        let mut removal = RemovalSet::new();
        let copies: Vec<NodeId> = dom.children(fragment).collect();
        for copy in copies {
            substitute(dom, copy, context, &mut removal, report)?;
        }
        removal.apply(dom);

        while let Some(child) = dom.first_child(fragment) {
            dom.insert_before(range.end, child);
        }
        report.template_copies += 1;
    }

    dom.detach(range.start);
    dom.detach(range.end);
    Ok(())
}
