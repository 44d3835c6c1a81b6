//! # tagfill
//!
//! Tag-driven report generation for DOCX templates.
//!
//! A template is an ordinary Word document containing tags such as `@name@`.
//! A [`Context`] says what each tag becomes:
//!
//! - **text tags** are replaced inside running text, or replace a whole
//!   paragraph whose text is exactly the tag
//! - **table tags** replace a paragraph with a generated table, or, inside an
//!   existing table, the tag's row with data rows
//! - **templates** repeat the paragraphs between a start and an end marker
//!   once per sub-context
//!
//! ## Quick Start
//!
//! ```no_run
//! use tagfill::{Context, generate};
//!
//! let context = Context::from_json_file("report.json").unwrap();
//! generate("template.docx", "report.docx", &context, true).unwrap();
//! ```
//!
//! ## Building a Context in Code
//!
//! ```
//! use tagfill::{Context, TableData, Template};
//!
//! let users = TableData::new(vec![
//!     vec!["id".into(), "name".into()],
//!     vec!["1".into(), "Bob".into()],
//! ])
//! .with_header(true);
//!
//! let context = Context::new()
//!     .with_text("@name@", "Alice")
//!     .with_table("@users@", users)
//!     .with_template(
//!         Template::new("@start@", "@end@")
//!             .with_context(Context::new().with_text("@x@", "A"))
//!             .with_context(Context::new().with_text("@x@", "B")),
//!     );
//! assert_eq!(context.templates[0].contexts.len(), 2);
//! ```

pub mod context;
pub mod csv_grid;
pub mod docx;
pub mod dom;
pub mod engine;
mod error;
pub(crate) mod util;

pub use context::{Context, TableData, Template};
pub use docx::{DocxPackage, Part, PartKind};
pub use engine::{GenerationReport, fill_package, generate};
pub use error::{Error, Result};
