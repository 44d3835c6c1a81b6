//! Table construction from a string grid.

use crate::context::TableData;
use crate::docx::wml::{self, TableAncestors};
use crate::dom::{NodeId, XmlDom};

/// Formatting copied onto every generated cell. Each field is an existing
/// node that gets deep-cloned per cell; `None` leaves the property out.
#[derive(Debug, Clone, Copy, Default)]
pub struct CellStyle {
    /// `w:rPr` for the run in each cell.
    pub run: Option<NodeId>,
    /// `w:pPr` for the paragraph in each cell.
    pub paragraph: Option<NodeId>,
    /// `w:tcPr` for each cell.
    pub cell: Option<NodeId>,
    /// `w:trPr` for each row.
    pub row: Option<NodeId>,
}

/// Rows of `grid` to emit: skips the header-tags row if present, and the
/// header row unless `with_header` is set.
pub fn data_rows<'g>(data: &TableData, grid: &'g [Vec<String>], with_header: bool) -> &'g [Vec<String>] {
    let mut offset = 0;
    if data.has_header_tags() {
        offset += 1;
    }
    if data.has_header() && !with_header {
        offset += 1;
    }
    grid.get(offset..).unwrap_or(&[])
}

/// Width of the widest row.
pub fn column_count(grid: &[Vec<String>]) -> usize {
    grid.iter().map(Vec::len).max().unwrap_or(0)
}

/// Build one detached `w:tr` with a cell per column, padding short rows
/// with empty cells.
pub fn create_row(dom: &mut XmlDom, cells: &[String], columns: usize, style: &CellStyle) -> NodeId {
    let row = dom.create_element(wml::TABLE_ROW, vec![]);
    if let Some(props) = style.row {
        let copy = dom.deep_clone(props);
        dom.append(row, copy);
    }

    for index in 0..columns.max(cells.len()) {
        let text = cells.get(index).map(String::as_str).unwrap_or("");

        let cell = dom.create_element(wml::TABLE_CELL, vec![]);
        if let Some(props) = style.cell {
            let copy = dom.deep_clone(props);
            dom.append(cell, copy);
        }

        let paragraph = dom.create_element(wml::PARAGRAPH, vec![]);
        if let Some(props) = style.paragraph {
            let copy = dom.deep_clone(props);
            dom.append(paragraph, copy);
        }
        let run = wml::create_run(dom, text, style.run);
        dom.append(paragraph, run);

        dom.append(cell, paragraph);
        dom.append(row, cell);
    }
    row
}

/// Build detached rows for the data part of a table.
pub fn create_rows(
    dom: &mut XmlDom,
    data: &TableData,
    grid: &[Vec<String>],
    with_header: bool,
    style: &CellStyle,
) -> Vec<NodeId> {
    let columns = column_count(grid);
    data_rows(data, grid, with_header)
        .iter()
        .map(|cells| create_row(dom, cells, columns, style))
        .collect()
}

/// Build a detached standalone table, header included, with no borders.
pub fn create_table(dom: &mut XmlDom, data: &TableData, grid: &[Vec<String>], style: &CellStyle) -> NodeId {
    let table = dom.create_element(wml::TABLE, vec![]);

    let properties = dom.create_element(wml::TABLE_PROPERTIES, vec![]);
    let borders = dom.create_element(wml::TABLE_BORDERS, vec![]);
    for edge in wml::BORDER_EDGES {
        let border = wml::create_valued(dom, edge, "none");
        dom.append(borders, border);
    }
    dom.append(properties, borders);
    dom.append(table, properties);

    let table_grid = dom.create_element(wml::TABLE_GRID, vec![]);
    for _ in 0..column_count(grid) {
        let column = dom.create_element(wml::GRID_COLUMN, vec![]);
        dom.append(table_grid, column);
    }
    dom.append(table, table_grid);

    for row in create_rows(dom, data, grid, true, style) {
        dom.append(table, row);
    }
    table
}

/// Insert the table's rows in front of the row holding the tag cell.
///
/// The header is emitted only when the tag row is the first row of the
/// table. New cells copy the tag cell's `w:tcPr` (minus `w:gridSpan`), the
/// first `w:pPr` and `w:rPr` found in it, and the row's `w:trPr`. Returns the
/// number of rows inserted.
pub fn insert_before_row(
    dom: &mut XmlDom,
    at: TableAncestors,
    data: &TableData,
    grid: &[Vec<String>],
) -> usize {
    let with_header = row_index(dom, at.table, at.row) == Some(0);

    let cell_props = match dom.child_element(at.cell, wml::TABLE_CELL_PROPERTIES) {
        Some(props) => {
            let copy = dom.deep_clone(props);
            if let Some(span) = dom.child_element(copy, wml::GRID_SPAN) {
                dom.detach(span);
            }
            Some(copy)
        }
        None => None,
    };

    let style = CellStyle {
        run: wml::first_run(dom, at.cell).and_then(|r| wml::run_properties(dom, r)),
        paragraph: dom
            .find_element(at.cell, wml::PARAGRAPH)
            .and_then(|p| wml::paragraph_properties(dom, p)),
        cell: cell_props,
        row: dom.child_element(at.row, wml::TABLE_ROW_PROPERTIES),
    };

    let rows = create_rows(dom, data, grid, with_header, &style);
    let inserted = rows.len();
    for row in rows {
        dom.insert_before(at.row, row);
    }

    fix_grid_columns(dom, at.table, column_count(grid));
    inserted
}

/// Widen the table grid to at least `min_columns` entries.
///
/// Only a grid that already lists some columns is touched: the summed width
/// of the existing `w:gridCol`s is split evenly over `min_columns`, and the
/// last entry is cloned until the count matches. Otherwise Word would draw
/// the extra columns with zero width. A grid without any usable width stays
/// auto-sized; it only gains clones of its last column.
pub fn fix_grid_columns(dom: &mut XmlDom, table: NodeId, min_columns: usize) {
    let Some(grid) = dom.child_element(table, wml::TABLE_GRID) else {
        return;
    };
    let columns: Vec<NodeId> = dom
        .children(grid)
        .filter(|&c| dom.is_element(c, wml::GRID_COLUMN))
        .collect();
    let Some(&last) = columns.last() else {
        return;
    };
    if columns.len() >= min_columns {
        return;
    }

    let total: u64 = columns
        .iter()
        .filter_map(|&c| dom.attr(c, wml::ATTR_WIDTH))
        .filter_map(|w| w.trim().parse::<u64>().ok())
        .sum();
    if total > 0 {
        let single = (total / min_columns as u64).to_string();
        for &column in &columns {
            dom.set_attr(column, wml::ATTR_WIDTH, single.as_str());
        }
    }
    for _ in columns.len()..min_columns {
        let copy = dom.deep_clone(last);
        dom.insert_after(last, copy);
    }
}

/// Position of `row` among the `w:tr` children of `table`.
pub fn row_index(dom: &XmlDom, table: NodeId, row: NodeId) -> Option<usize> {
    dom.children(table)
        .filter(|&c| dom.is_element(c, wml::TABLE_ROW))
        .position(|c| c == row)
}

/// `w:gridCol` widths of a table, for inspection.
pub fn grid_widths(dom: &XmlDom, table: NodeId) -> Vec<Option<u64>> {
    let Some(grid) = dom.child_element(table, wml::TABLE_GRID) else {
        return Vec::new();
    };
    dom.children(grid)
        .filter(|&c| dom.is_element(c, wml::GRID_COLUMN))
        .map(|c| dom.attr(c, wml::ATTR_WIDTH).and_then(|w| w.parse().ok()))
        .collect()
}
