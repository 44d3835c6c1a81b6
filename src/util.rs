//! Text decoding and path helpers for package parts.

use std::borrow::Cow;

use encoding_rs::{Encoding, UTF_8};

/// Decode an XML part into text.
///
/// A byte order mark wins, then the `encoding` pseudo-attribute of the XML
/// declaration. Anything else is read as UTF-8, with invalid sequences
/// replaced. Borrows when the input is already valid UTF-8.
pub fn decode_part(bytes: &[u8]) -> Cow<'_, str> {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        let (text, _) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        return text;
    }

    let encoding = declared_encoding(bytes)
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .unwrap_or(UTF_8);
    let (text, _) = encoding.decode_without_bom_handling(bytes);
    text
}

/// Value of `encoding="..."` in a leading `<?xml ...?>` declaration.
pub fn declared_encoding(bytes: &[u8]) -> Option<&str> {
    let rest = bytes.strip_prefix(b"<?xml")?;
    let decl_end = rest.windows(2).position(|w| w == b"?>")?;
    let decl = std::str::from_utf8(&rest[..decl_end]).ok()?;

    let (_, after) = decl.split_once("encoding")?;
    let after = after.trim_start().strip_prefix('=')?.trim_start();
    let quote = after.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let value = &after[1..];
    value.split_once(quote).map(|(label, _)| label)
}

// ============================================================================
// Package Paths
// ============================================================================

/// Directory part of a package path (`word/document.xml` -> `word`).
pub fn part_dir(path: &str) -> &str {
    path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

/// Resolve a relationship target against the directory of its source part.
///
/// Absolute targets (`/word/header1.xml`) are taken from the package root;
/// `.` and `..` segments are collapsed.
pub fn resolve_part_path(base_dir: &str, target: &str) -> String {
    let joined = if let Some(absolute) = target.strip_prefix('/') {
        absolute.to_string()
    } else if base_dir.is_empty() {
        target.to_string()
    } else {
        format!("{base_dir}/{target}")
    };

    let mut segments: Vec<&str> = Vec::new();
    for segment in joined.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}
