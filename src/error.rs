//! Error types for tagfill operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading data, filling a template or writing
/// the generated document.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Template file does not exist: {}", .0.display())]
    TemplateNotFound(PathBuf),

    #[error("Output file already exists: {}", .0.display())]
    OutputExists(PathBuf),

    #[error("Template and output are the same file: {}", .0.display())]
    SamePath(PathBuf),

    #[error("Table content file does not exist: {}", .0.display())]
    TableSource(PathBuf),

    #[error("Unsupported table content file type: {}", .0.display())]
    UnsupportedSource(PathBuf),

    #[error("Invalid DOCX: {0}")]
    InvalidDocx(String),

    #[error("Missing package part: {0}")]
    MissingPart(String),

    #[error("Template start tag {0:?} found again before its end tag")]
    NestedTemplate(String),

    #[error("Template start tag {start:?} has no matching end tag {end:?}")]
    UnclosedTemplate { start: String, end: String },

    #[error("Template end tag {0:?} found without a start tag")]
    UnmatchedTemplateEnd(String),

    #[error("Unexpected document structure: {0}")]
    Structure(String),
}

pub type Result<T> = std::result::Result<T, Error>;
