//! In-place tag substitution over a content tree.

use log::{debug, warn};

use super::GenerationReport;
use super::removal::RemovalSet;
use super::resolve::{ParagraphMatch, replace_in_text, resolve_paragraph};
use super::table::{self, CellStyle};
use crate::context::{Context, TableData};
use crate::docx::wml;
use crate::dom::{NodeId, Placement, XmlDom};
use crate::error::Result;

/// Replace every tag of `context` under `node`.
///
/// Text tags embedded in running text are replaced inside their `w:t` leaf.
/// A paragraph whose whole text is a tag is replaced by a single run or by a
/// table; nodes consumed that way are added to `removal` and must be removed
/// by the caller once the walk is over. Nothing under a node already pending
/// removal is touched.
pub fn substitute(
    dom: &mut XmlDom,
    node: NodeId,
    context: &Context,
    removal: &mut RemovalSet,
    report: &mut GenerationReport,
) -> Result<()> {
    if removal.covers(dom, node) {
        return Ok(());
    }
    replace_in_texts(dom, node, context, report);
    replace_in_paragraphs(dom, node, context, removal, report)
}

fn replace_in_texts(dom: &mut XmlDom, node: NodeId, context: &Context, report: &mut GenerationReport) {
    for leaf in wml::text_leaves(dom, node) {
        let text = dom.text_content(leaf);
        if let Some(replaced) = replace_in_text(&text, context) {
            wml::set_leaf_text(dom, leaf, &replaced);
            report.text_substitutions += 1;
        }
    }
}

fn replace_in_paragraphs(
    dom: &mut XmlDom,
    node: NodeId,
    context: &Context,
    removal: &mut RemovalSet,
    report: &mut GenerationReport,
) -> Result<()> {
    if removal.covers(dom, node) {
        return Ok(());
    }

    if wml::is_paragraph(dom, node) {
        let text = wml::full_text(dom, node);
        match resolve_paragraph(&text, context)? {
            Some(ParagraphMatch::Table { data, grid }) => {
                return replace_with_table(dom, node, data, grid, removal, report);
            }
            Some(ParagraphMatch::Text(line)) => {
                replace_with_text(dom, node, line);
                report.paragraph_substitutions += 1;
                return Ok(());
            }
            None => {}
        }
    }

    let mut child_opt = dom.first_child(node);
    while let Some(child) = child_opt {
        child_opt = dom.next_sibling(child);
        replace_in_paragraphs(dom, child, context, removal, report)?;
    }
    Ok(())
}

/// Swap the paragraph's text content for one run holding `line`.
///
/// Runs (and any other child carrying text, such as hyperlinks) are dropped;
/// paragraph properties and markers like bookmarks stay. The new run keeps
/// the formatting of the first original run.
pub fn replace_with_text(dom: &mut XmlDom, paragraph: NodeId, line: &str) {
    let properties = wml::first_run(dom, paragraph).and_then(|r| wml::run_properties(dom, r));

    let text_bearing: Vec<NodeId> = dom
        .children(paragraph)
        .filter(|&c| {
            wml::is_run(dom, c)
                || (!dom.is_element(c, wml::PARAGRAPH_PROPERTIES)
                    && !wml::text_leaves(dom, c).is_empty())
        })
        .collect();

    let run = wml::create_run(dom, line, properties);
    for child in text_bearing {
        dom.detach(child);
    }
    dom.append(paragraph, run);
}

fn replace_with_table(
    dom: &mut XmlDom,
    paragraph: NodeId,
    data: &TableData,
    grid: &[Vec<String>],
    removal: &mut RemovalSet,
    report: &mut GenerationReport,
) -> Result<()> {
    report.table_insertions += 1;

    if let Some(at) = wml::table_ancestors(dom, paragraph)? {
        report.rows_inserted += table::insert_before_row(dom, at, data, grid);
        removal.mark(at.row);
        return Ok(());
    }

    let style = CellStyle {
        run: wml::first_run(dom, paragraph).and_then(|r| wml::run_properties(dom, r)),
        paragraph: wml::paragraph_properties(dom, paragraph),
        cell: None,
        row: None,
    };
    let new_table = table::create_table(dom, data, grid, &style);
    report.rows_inserted += table::data_rows(data, grid, true).len();

    if dom.parent(paragraph).is_none() {
        dom.remove_children(paragraph);
    }
    match dom.insert_before_or_append(paragraph, new_table) {
        Placement::Sibling => removal.mark(paragraph),
        Placement::Child => warn!("table placed inside a detached paragraph"),
    }
    debug!("standalone table with {} columns", table::column_count(grid));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{node_to_string, parse_xml};
    use crate::error::Error;

    fn run(xml: &str, context: &Context) -> (XmlDom, NodeId, GenerationReport) {
        let mut dom = parse_xml(xml).unwrap();
        let root = dom.root_element().unwrap();
        let mut removal = RemovalSet::new();
        let mut report = GenerationReport::default();
        substitute(&mut dom, root, context, &mut removal, &mut report).unwrap();
        removal.apply(&mut dom);
        (dom, root, report)
    }

    fn paragraph_texts(dom: &XmlDom, root: NodeId) -> Vec<String> {
        dom.descendants(root)
            .into_iter()
            .filter(|&id| wml::is_paragraph(dom, id))
            .map(|p| wml::full_text(dom, p))
            .collect()
    }

    #[test]
    fn test_whole_paragraph_text_tag() {
        let ctx = Context::new().with_text("@name@", "Alice");
        let (dom, body, report) = run(
            r#"<w:body><w:p><w:pPr><w:jc w:val="center"/></w:pPr><w:r><w:rPr><w:b/></w:rPr><w:t>@name@</w:t></w:r></w:p></w:body>"#,
            &ctx,
        );
        let p = dom.first_child(body).unwrap();
        let runs: Vec<_> = dom.children(p).filter(|&c| wml::is_run(&dom, c)).collect();
        assert_eq!(runs.len(), 1);
        assert_eq!(wml::full_text(&dom, runs[0]), "Alice");
        assert!(wml::run_properties(&dom, runs[0]).is_some());
        assert!(wml::paragraph_properties(&dom, p).is_some());
        // Replaced inside the leaf, so the run and its formatting survive.
        assert_eq!(report.text_substitutions, 1);
    }

    #[test]
    fn test_paragraph_tag_discards_fragmented_runs() {
        let ctx = Context::new().with_lines("@addr@", ["Main St 1", "Springfield"]);
        let (dom, body, report) = run(
            r#"<w:body><w:p><w:r><w:t>@ad</w:t></w:r><w:r><w:rPr><w:i/></w:rPr><w:t>dr@</w:t></w:r><w:bookmarkEnd w:id="0"/></w:p></w:body>"#,
            &ctx,
        );
        let p = dom.first_child(body).unwrap();
        assert_eq!(wml::full_text(&dom, p), "Main St 1");
        assert_eq!(report.paragraph_substitutions, 1);
        assert!(dom.child_element(p, "w:bookmarkEnd").is_some());
        assert_eq!(dom.children(p).filter(|&c| wml::is_run(&dom, c)).count(), 1);
    }

    #[test]
    fn test_substring_replacement_keeps_runs() {
        let ctx = Context::new().with_text("@name@", "Alice");
        let (dom, body, _) = run(
            r#"<w:body><w:p><w:r><w:rPr><w:b/></w:rPr><w:t>Dear </w:t></w:r><w:r><w:t>@name@,</w:t></w:r></w:p></w:body>"#,
            &ctx,
        );
        assert_eq!(paragraph_texts(&dom, body), vec!["Dear Alice,"]);
        let p = dom.first_child(body).unwrap();
        assert_eq!(dom.children(p).count(), 2);
    }

    #[test]
    fn test_no_paragraph_equals_tag_afterwards() {
        let ctx = Context::new()
            .with_text("@a@", "x")
            .with_lines("@b@", Vec::<String>::new());
        let (dom, body, _) = run(
            r#"<w:body><w:p><w:r><w:t>@a@</w:t></w:r></w:p><w:p><w:r><w:t>@b@</w:t></w:r></w:p><w:tbl><w:tr><w:tc><w:p><w:r><w:t>@a@</w:t></w:r></w:p></w:tc></w:tr></w:tbl></w:body>"#,
            &ctx,
        );
        let texts = paragraph_texts(&dom, body);
        assert!(!texts.iter().any(|t| t == "@a@" || t == "@b@"));
        assert_eq!(texts, vec!["x", "", "x"]);
    }

    #[test]
    fn test_standalone_table_replaces_paragraph() {
        let ctx = Context::new().with_table(
            "@users@",
            TableData::new(vec![
                vec!["id".into(), "name".into()],
                vec!["1".into(), "Bob".into()],
            ])
            .with_header(true),
        );
        let (dom, body, report) = run(
            r#"<w:body><w:p><w:r><w:t>Before</w:t></w:r></w:p><w:p><w:r><w:t>@users@</w:t></w:r></w:p><w:sectPr/></w:body>"#,
            &ctx,
        );
        let children: Vec<_> = dom
            .children(body)
            .map(|c| dom.element_name(c).unwrap().to_string())
            .collect();
        assert_eq!(children, vec!["w:p", "w:tbl", "w:sectPr"]);
        assert_eq!(paragraph_texts(&dom, body), vec!["Before", "id", "name", "1", "Bob"]);
        assert_eq!(report.table_insertions, 1);
        assert_eq!(report.rows_inserted, 2);
    }

    #[test]
    fn test_table_tag_inside_table_replaces_row() {
        let ctx = Context::new().with_table(
            "@rows@",
            TableData::new(vec![
                vec!["@c1@".into(), "@c2@".into()],
                vec!["1".into(), "Bob".into()],
                vec!["2".into(), "Eve".into()],
            ])
            .with_header_tags(true),
        );
        let (dom, body, report) = run(
            r#"<w:body><w:tbl><w:tr><w:tc><w:p><w:r><w:t>Id</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>Name</w:t></w:r></w:p></w:tc></w:tr><w:tr><w:tc><w:p><w:r><w:t>@rows@</w:t></w:r></w:p></w:tc><w:tc><w:p/></w:tc></w:tr></w:tbl></w:body>"#,
            &ctx,
        );
        let table = dom.first_child(body).unwrap();
        assert_eq!(dom.children(table).count(), 3);
        assert_eq!(
            paragraph_texts(&dom, body),
            vec!["Id", "Name", "1", "Bob", "2", "Eve"]
        );
        assert_eq!(report.rows_inserted, 2);
    }

    #[test]
    fn test_detached_paragraph_gets_table_appended() {
        let ctx = Context::new().with_table(
            "@t@",
            TableData::new(vec![vec!["a".into()]]),
        );
        let mut dom = XmlDom::new();
        let p = dom.create_element(wml::PARAGRAPH, vec![]);
        let r = wml::create_run(&mut dom, "@t@", None);
        dom.append(p, r);

        let mut removal = RemovalSet::new();
        let mut report = GenerationReport::default();
        substitute(&mut dom, p, &ctx, &mut removal, &mut report).unwrap();

        assert!(removal.is_empty());
        let children: Vec<_> = dom.children(p).collect();
        assert_eq!(children.len(), 1);
        assert!(dom.is_element(children[0], wml::TABLE));
    }

    #[test]
    fn test_partial_table_chain_is_error() {
        let ctx = Context::new().with_table("@t@", TableData::new(vec![]));
        let mut dom = parse_xml(r#"<w:tr><w:tc><w:p><w:r><w:t>@t@</w:t></w:r></w:p></w:tc></w:tr>"#).unwrap();
        let root = dom.root_element().unwrap();
        let mut removal = RemovalSet::new();
        let mut report = GenerationReport::default();
        let result = substitute(&mut dom, root, &ctx, &mut removal, &mut report);
        assert!(matches!(result, Err(Error::Structure(_))));
    }

    #[test]
    fn test_pending_removal_is_skipped() {
        let ctx = Context::new().with_text("@x@", "done");
        let mut dom = parse_xml(r#"<w:body><w:p><w:r><w:t>@x@</w:t></w:r></w:p></w:body>"#).unwrap();
        let body = dom.root_element().unwrap();
        let p = dom.first_child(body).unwrap();

        let mut removal = RemovalSet::new();
        removal.mark(body);
        let mut report = GenerationReport::default();
        substitute(&mut dom, p, &ctx, &mut removal, &mut report).unwrap();
        assert_eq!(
            node_to_string(&dom, p),
            r#"<w:p><w:r><w:t>@x@</w:t></w:r></w:p>"#
        );
    }
}
