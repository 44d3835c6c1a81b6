//! DOCX container access.
//!
//! [`DocxPackage`] reads the zip container and parses the main document plus
//! its headers and footers; [`wml`] holds the WordprocessingML vocabulary the
//! engine works with.

mod package;
pub mod wml;

pub use package::{DocxPackage, Part, PartKind};
