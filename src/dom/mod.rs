//! Mutable XML tree used for every package part.
//!
//! - [`arena`]: the arena-allocated node store with parent/sibling links
//! - [`parse`]: quick-xml reader into the arena
//! - [`write`]: serializer back to XML text

mod arena;
mod parse;
mod write;

pub use arena::{
    AncestorsIter, Attribute, ChildrenIter, NodeData, NodeId, Placement, XmlDeclaration, XmlDom,
    XmlNode,
};
pub use parse::parse_xml;
pub use write::{node_to_string, to_xml_string};
