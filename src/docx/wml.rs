//! WordprocessingML element names and helpers over [`XmlDom`].
//!
//! Elements are matched by their conventional `w:` qualified names, which is
//! what Word and every mainstream producer write.

use crate::dom::{Attribute, NodeId, XmlDom};
use crate::error::{Error, Result};

pub const BODY: &str = "w:body";
pub const PARAGRAPH: &str = "w:p";
pub const PARAGRAPH_PROPERTIES: &str = "w:pPr";
pub const RUN: &str = "w:r";
pub const RUN_PROPERTIES: &str = "w:rPr";
pub const TEXT: &str = "w:t";
pub const TABLE: &str = "w:tbl";
pub const TABLE_PROPERTIES: &str = "w:tblPr";
pub const TABLE_BORDERS: &str = "w:tblBorders";
pub const TABLE_GRID: &str = "w:tblGrid";
pub const GRID_COLUMN: &str = "w:gridCol";
pub const TABLE_ROW: &str = "w:tr";
pub const TABLE_ROW_PROPERTIES: &str = "w:trPr";
pub const TABLE_CELL: &str = "w:tc";
pub const TABLE_CELL_PROPERTIES: &str = "w:tcPr";
pub const GRID_SPAN: &str = "w:gridSpan";

pub const ATTR_VAL: &str = "w:val";
pub const ATTR_WIDTH: &str = "w:w";
pub const ATTR_SPACE: &str = "xml:space";

/// Border edges written for a generated table, in schema order.
pub const BORDER_EDGES: [&str; 6] = [
    "w:top",
    "w:left",
    "w:bottom",
    "w:right",
    "w:insideH",
    "w:insideV",
];

pub fn is_paragraph(dom: &XmlDom, id: NodeId) -> bool {
    dom.is_element(id, PARAGRAPH)
}

pub fn is_run(dom: &XmlDom, id: NodeId) -> bool {
    dom.is_element(id, RUN)
}

/// All `w:t` leaves under `id` (including `id` itself), in document order.
pub fn text_leaves(dom: &XmlDom, id: NodeId) -> Vec<NodeId> {
    let mut leaves = Vec::new();
    if dom.is_element(id, TEXT) {
        leaves.push(id);
        return leaves;
    }
    leaves.extend(
        dom.descendants(id)
            .into_iter()
            .filter(|&d| dom.is_element(d, TEXT)),
    );
    leaves
}

/// Concatenated text of every `w:t` under a node.
pub fn full_text(dom: &XmlDom, id: NodeId) -> String {
    text_leaves(dom, id)
        .into_iter()
        .map(|leaf| dom.text_content(leaf))
        .collect()
}

/// Replace the string held by a `w:t` leaf.
///
/// Text with leading or trailing whitespace gets `xml:space="preserve"`,
/// otherwise Word would collapse it.
pub fn set_leaf_text(dom: &mut XmlDom, leaf: NodeId, text: &str) {
    dom.remove_children(leaf);
    if !text.is_empty() {
        let node = dom.create_text(text);
        dom.append(leaf, node);
    }
    if needs_space_preserve(text) {
        dom.set_attr(leaf, ATTR_SPACE, "preserve");
    }
}

fn needs_space_preserve(text: &str) -> bool {
    text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace)
}

/// New detached `w:t` holding `text`.
pub fn create_text_leaf(dom: &mut XmlDom, text: &str) -> NodeId {
    let leaf = dom.create_element(TEXT, vec![]);
    set_leaf_text(dom, leaf, text);
    leaf
}

/// New detached run with one text leaf, optionally cloning `properties`
/// (a `w:rPr`) as its formatting.
pub fn create_run(dom: &mut XmlDom, text: &str, properties: Option<NodeId>) -> NodeId {
    let run = dom.create_element(RUN, vec![]);
    if let Some(props) = properties {
        let copy = dom.deep_clone(props);
        dom.append(run, copy);
    }
    let leaf = create_text_leaf(dom, text);
    dom.append(run, leaf);
    run
}

/// New detached element with a `w:val` attribute.
pub fn create_valued(dom: &mut XmlDom, name: &str, value: &str) -> NodeId {
    dom.create_element(name, vec![Attribute::new(ATTR_VAL, value)])
}

pub fn paragraph_properties(dom: &XmlDom, paragraph: NodeId) -> Option<NodeId> {
    dom.child_element(paragraph, PARAGRAPH_PROPERTIES)
}

pub fn run_properties(dom: &XmlDom, run: NodeId) -> Option<NodeId> {
    dom.child_element(run, RUN_PROPERTIES)
}

/// First run anywhere below a node, in document order.
pub fn first_run(dom: &XmlDom, id: NodeId) -> Option<NodeId> {
    dom.find_element(id, RUN)
}

/// The cell, row and table enclosing a paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableAncestors {
    pub cell: NodeId,
    pub row: NodeId,
    pub table: NodeId,
}

/// Locate the nearest `w:tc` > `w:tr` > `w:tbl` chain around a node.
///
/// Returns `Ok(None)` when the node is not inside a table at all. A chain
/// that is only partly there (a row without a cell around the node, a cell
/// whose parent is not a row) is an error.
pub fn table_ancestors(dom: &XmlDom, id: NodeId) -> Result<Option<TableAncestors>> {
    let nearest = dom.ancestors(id).find(|&a| {
        dom.is_element(a, TABLE_CELL) || dom.is_element(a, TABLE_ROW) || dom.is_element(a, TABLE)
    });

    let Some(cell) = nearest else {
        return Ok(None);
    };

    if !dom.is_element(cell, TABLE_CELL) {
        return Err(Error::Structure(format!(
            "paragraph sits directly inside {} without an enclosing table cell",
            dom.element_name(cell).unwrap_or("?")
        )));
    }

    let row = dom
        .parent(cell)
        .filter(|&r| dom.is_element(r, TABLE_ROW))
        .ok_or_else(|| Error::Structure("table cell is not inside a table row".into()))?;
    let table = dom
        .parent(row)
        .filter(|&t| dom.is_element(t, TABLE))
        .ok_or_else(|| Error::Structure("table row is not inside a table".into()))?;

    Ok(Some(TableAncestors { cell, row, table }))
}
