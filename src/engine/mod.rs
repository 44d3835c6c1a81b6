//! The generation pipeline.
//!
//! Every content part goes through three stages, in order:
//!
//! 1. [`merge`]: coalesce adjacent unformatted runs so tags split across
//!    runs become contiguous text.
//! 2. [`substitute`]: replace the global context's tags in place; consumed
//!    paragraphs and rows are removed after the walk.
//! 3. [`template`]: expand template regions once per sub-context.

pub mod merge;
pub mod removal;
pub mod resolve;
pub mod substitute;
pub mod table;
pub mod template;

use std::fmt;
use std::fs;
use std::path::Path;

use log::{debug, info};

use crate::context::Context;
use crate::docx::DocxPackage;
use crate::dom::{NodeId, XmlDom};
use crate::error::{Error, Result};

pub use removal::RemovalSet;

/// Counts of what a generation pass changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerationReport {
    /// Runs merged into a neighbour before substitution.
    pub runs_merged: usize,
    /// Text leaves changed by substring substitution.
    pub text_substitutions: usize,
    /// Paragraphs replaced by a single line of text.
    pub paragraph_substitutions: usize,
    /// Table tags replaced, standalone or inside a table.
    pub table_insertions: usize,
    pub rows_inserted: usize,
    /// Template regions expanded.
    pub template_regions: usize,
    /// Copies generated across all regions.
    pub template_copies: usize,
}

impl fmt::Display for GenerationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} text and {} paragraph substitution(s), {} table(s) with {} row(s), \
             {} template region(s) with {} copies",
            self.text_substitutions,
            self.paragraph_substitutions,
            self.table_insertions,
            self.rows_inserted,
            self.template_regions,
            self.template_copies
        )
    }
}

/// Run the whole pipeline over one content tree rooted at `root`.
pub fn fill_tree(
    dom: &mut XmlDom,
    root: NodeId,
    context: &Context,
    report: &mut GenerationReport,
) -> Result<()> {
    report.runs_merged += merge::merge_runs_in(dom, root);

    let mut removal = RemovalSet::new();
    substitute::substitute(dom, root, context, &mut removal, report)?;
    let removed = removal.apply(dom);
    debug!("removed {removed} consumed node(s)");

    template::expand_templates(dom, root, &context.templates, report)
}

/// Fill the main document, headers and footers of an opened package.
pub fn fill_package(package: &mut DocxPackage, context: &Context) -> Result<GenerationReport> {
    let mut report = GenerationReport::default();
    for part in package.parts_mut() {
        let root = part.content_root()?;
        debug!("filling {}", part.name);
        fill_tree(&mut part.dom, root, context, &mut report)?;
    }
    Ok(report)
}

/// Generate `output` from the DOCX at `template`.
///
/// An existing output is replaced when `overwrite` is set and is an error
/// otherwise. The template is copied to `output` and the copy filled in
/// place; on error, `output` may hold that unfilled copy and must not be
/// used.
pub fn generate<T, O>(template: T, output: O, context: &Context, overwrite: bool) -> Result<GenerationReport>
where
    T: AsRef<Path>,
    O: AsRef<Path>,
{
    let template = template.as_ref();
    let output = output.as_ref();

    if !template.is_file() {
        return Err(Error::TemplateNotFound(template.to_path_buf()));
    }

    if output.exists() {
        if fs::canonicalize(template)? == fs::canonicalize(output)? {
            return Err(Error::SamePath(output.to_path_buf()));
        }
        if !overwrite {
            return Err(Error::OutputExists(output.to_path_buf()));
        }
        fs::remove_file(output)?;
    }

    if let Some(dir) = output.parent()
        && !dir.as_os_str().is_empty()
    {
        fs::create_dir_all(dir)?;
    }
    fs::copy(template, output)?;

    let mut package = DocxPackage::open(output)?;
    let report = fill_package(&mut package, context)?;
    package.save(output)?;

    info!("{report}");
    Ok(report)
}
