//! Delimited text files as table content.

use std::path::Path;

use log::debug;

use crate::error::{Error, Result};

/// Rows of cells, addressed as `grid[row][column]`.
pub type Grid = Vec<Vec<String>>;

/// Field separator used for table content files.
pub const DEFAULT_DELIMITER: u8 = b',';

/// Load a `.csv` file into a rectangular grid.
///
/// Rows shorter than the widest row are padded with empty strings. Quoted
/// fields are honoured; the first row is data like any other.
pub fn load_grid(path: &Path, delimiter: u8) -> Result<Grid> {
    if !path.is_file() {
        return Err(Error::TableSource(path.to_path_buf()));
    }

    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if !is_csv {
        return Err(Error::UnsupportedSource(path.to_path_buf()));
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .has_headers(false)
        .from_path(path)?;

    let mut grid = reader
        .records()
        .map(|record| record.map(|r| r.iter().map(str::to_string).collect::<Vec<_>>()))
        .collect::<std::result::Result<Grid, _>>()?;

    pad_rows(&mut grid);
    debug!(
        "loaded {} rows from {}",
        grid.len(),
        path.display()
    );
    Ok(grid)
}

/// Pad every row with empty cells to the width of the widest row.
pub fn pad_rows(grid: &mut Grid) {
    let width = grid.iter().map(Vec::len).max().unwrap_or(0);
    for row in grid.iter_mut() {
        row.resize(width, String::new());
    }
}
