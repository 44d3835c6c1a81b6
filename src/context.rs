//! Data context driving a generation pass.
//!
//! A [`Context`] maps text tags to lines, table tags to [`TableData`], and
//! carries the [`Template`]s whose regions are repeated once per sub-context.
//! Contexts are usually loaded from a JSON file:
//!
//! ```json
//! {
//!   "TextTags":  { "@name@": ["Alice"] },
//!   "TableTags": { "@users@": { "ContentFromFile": "users.csv", "HasHeader": true } },
//!   "Templates": [ { "StartTag": "@start@", "EndTag": "@end@", "Contexts": [] } ]
//! }
//! ```

use std::cell::OnceCell;
use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::info;
use serde::Deserialize;

use crate::csv_grid::{DEFAULT_DELIMITER, Grid, load_grid};
use crate::error::Result;

/// All data for one generation pass.
///
/// Keys are PascalCase, with camelCase accepted as an alias. Unknown keys
/// are rejected so a misspelled section cannot silently load as empty.
/// Tag maps keep file order; substring substitution follows it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default, deny_unknown_fields)]
pub struct Context {
    /// Tag -> lines. No line substitutes an empty string, one line a plain
    /// string; several lines are reserved for multi-line output.
    #[serde(alias = "textTags")]
    pub text_tags: IndexMap<String, Vec<String>>,
    /// Tag -> table replacing the paragraph holding the tag.
    #[serde(alias = "tableTags")]
    pub table_tags: IndexMap<String, TableData>,
    #[serde(alias = "templates")]
    pub templates: Vec<Template>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a context from JSON. Relative table sources are left as-is.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a context from a JSON file, resolving relative table sources
    /// against the directory holding the file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        let mut context = Self::from_json_str(&json)?;

        let base = fs::canonicalize(path)?
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        context.resolve_sources(&base);
        Ok(context)
    }

    /// Rebase every relative table source onto `base`, recursing through
    /// template sub-contexts.
    pub fn resolve_sources(&mut self, base: &Path) {
        for table in self.table_tags.values_mut() {
            table.resolve_source(base);
        }
        for template in &mut self.templates {
            for context in &mut template.contexts {
                context.resolve_sources(base);
            }
        }
    }

    pub fn with_text(mut self, tag: impl Into<String>, text: impl Into<String>) -> Self {
        self.text_tags.insert(tag.into(), vec![text.into()]);
        self
    }

    pub fn with_lines<I, S>(mut self, tag: impl Into<String>, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.text_tags
            .insert(tag.into(), lines.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_table(mut self, tag: impl Into<String>, table: TableData) -> Self {
        self.table_tags.insert(tag.into(), table);
        self
    }

    pub fn with_template(mut self, template: Template) -> Self {
        self.templates.push(template);
        self
    }
}

/// A region delimited by a start and end marker paragraph, generated once per
/// sub-context.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default, deny_unknown_fields)]
pub struct Template {
    #[serde(alias = "startTag")]
    pub start_tag: String,
    #[serde(alias = "endTag")]
    pub end_tag: String,
    #[serde(alias = "contexts")]
    pub contexts: Vec<Context>,
}

impl Template {
    pub fn new(start_tag: impl Into<String>, end_tag: impl Into<String>) -> Self {
        Self {
            start_tag: start_tag.into(),
            end_tag: end_tag.into(),
            contexts: Vec::new(),
        }
    }

    pub fn with_context(mut self, context: Context) -> Self {
        self.contexts.push(context);
        self
    }
}

/// Tabular content for a table tag.
///
/// Layout with both flags set:
///
/// ```text
/// [ "@user_id@", "@user_name@" ]   header tags
/// [ "Id",        "Username"    ]   header
/// [ "1",         "Ignaz123"    ]   data...
/// ```
///
/// Content is given inline or read lazily from a CSV file on first access and
/// cached afterwards.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "RawTableData")]
pub struct TableData {
    content: Grid,
    source: Option<PathBuf>,
    has_header: bool,
    has_header_tags: bool,
    loaded: OnceCell<Grid>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "PascalCase", default, deny_unknown_fields)]
struct RawTableData {
    #[serde(alias = "content")]
    content: Grid,
    #[serde(alias = "contentFromFile")]
    content_from_file: Option<PathBuf>,
    #[serde(alias = "hasHeader")]
    has_header: bool,
    #[serde(alias = "hasHeaderTags")]
    has_header_tags: bool,
}

impl From<RawTableData> for TableData {
    fn from(raw: RawTableData) -> Self {
        Self {
            content: raw.content,
            source: raw.content_from_file,
            has_header: raw.has_header,
            has_header_tags: raw.has_header_tags,
            loaded: OnceCell::new(),
        }
    }
}

impl TableData {
    pub fn new(content: Grid) -> Self {
        Self {
            content,
            ..Self::default()
        }
    }

    /// Table content read from a CSV file on first access.
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self {
            source: Some(path.into()),
            ..Self::default()
        }
    }

    /// The row after any header-tag row holds column headers.
    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    /// The first row holds column tag markers.
    pub fn with_header_tags(mut self, has_header_tags: bool) -> Self {
        self.has_header_tags = has_header_tags;
        self
    }

    pub fn has_header(&self) -> bool {
        self.has_header
    }

    pub fn has_header_tags(&self) -> bool {
        self.has_header_tags
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Replace the content. Drops any file source and its cached rows.
    pub fn set_content(&mut self, content: Grid) {
        self.content = content;
        self.source = None;
        self.loaded = OnceCell::new();
    }

    /// Point the content at a file. Changing the path drops the cache.
    pub fn set_content_from_file(&mut self, path: Option<PathBuf>) {
        if self.source != path {
            self.source = path;
            self.loaded = OnceCell::new();
        }
    }

    /// The table rows, loading the file source on first call.
    ///
    /// A missing or unreadable source fails here, not when the context is
    /// built. An empty source path counts as no source.
    pub fn content(&self) -> Result<&[Vec<String>]> {
        let Some(path) = &self.source else {
            return Ok(&self.content);
        };

        if path.as_os_str().is_empty() {
            info!("table content file name is empty, using inline content");
            return Ok(&self.content);
        }

        if let Some(grid) = self.loaded.get() {
            return Ok(grid);
        }
        let grid = load_grid(path, DEFAULT_DELIMITER)?;
        Ok(self.loaded.get_or_init(|| grid))
    }

    fn resolve_source(&mut self, base: &Path) {
        let Some(path) = &self.source else {
            return;
        };
        if path.as_os_str().is_empty() || path.is_absolute() {
            return;
        }
        let resolved = base.join(path);
        self.set_content_from_file(Some(resolved));
    }
}
