//! Tag lookup against a [`Context`].

use log::{debug, warn};

use crate::context::{Context, TableData};
use crate::error::Result;

/// What a whole paragraph resolves to.
#[derive(Debug)]
pub enum ParagraphMatch<'c> {
    /// Replace the paragraph's runs with one line of text.
    Text(&'c str),
    /// Replace the paragraph (or its table row) with table rows.
    Table {
        data: &'c TableData,
        grid: &'c [Vec<String>],
    },
}

/// Resolve a paragraph by its full text.
///
/// Table tags are tried first, against the trimmed text; text tags must
/// match the text exactly. Blank paragraphs never match. Table content from
/// a file is loaded here, so a missing source fails the lookup.
pub fn resolve_paragraph<'c>(text: &str, context: &'c Context) -> Result<Option<ParagraphMatch<'c>>> {
    if text.trim().is_empty() {
        return Ok(None);
    }

    if let Some(data) = context.table_tags.get(text.trim()) {
        debug!("table tag {:?}", text.trim());
        let grid = data.content()?;
        return Ok(Some(ParagraphMatch::Table { data, grid }));
    }

    if let Some(lines) = context.text_tags.get(text) {
        debug!("paragraph tag {text:?}");
        let line = lines.first().map(String::as_str).unwrap_or("");
        return Ok(Some(ParagraphMatch::Text(line)));
    }

    Ok(None)
}

/// Substring substitution inside one text leaf.
///
/// Text tags are applied in context order, each replacing every occurrence.
/// Tags with several lines cannot be expressed inside a single leaf and are
/// left in place with a warning. Returns `None` if nothing changed.
pub fn replace_in_text(text: &str, context: &Context) -> Option<String> {
    let mut current: Option<String> = None;

    for (tag, lines) in context.text_tags.iter() {
        if tag.is_empty() {
            continue;
        }
        let haystack = current.as_deref().unwrap_or(text);
        if !haystack.contains(tag) {
            continue;
        }
        match lines.as_slice() {
            [] => current = Some(haystack.replace(tag, "")),
            [line] => current = Some(haystack.replace(tag, line)),
            _ => warn!("multi-line tag {tag:?} inside running text left unreplaced"),
        }
    }

    current.filter(|replaced| replaced != text)
}
