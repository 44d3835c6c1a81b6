//! quick-xml event reader that builds an [`XmlDom`].

use quick_xml::Reader;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesStart, Event};

use super::arena::{Attribute, NodeData, NodeId, XmlDeclaration, XmlDom};
use crate::error::{Error, Result};

/// Parse an XML part into an arena DOM.
///
/// Whitespace-only text is kept: inside `w:t` it is content, and between
/// elements it round-trips unchanged.
pub fn parse_xml(content: &str) -> Result<XmlDom> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(false);

    let mut dom = XmlDom::new();
    let mut stack: Vec<NodeId> = vec![dom.document()];

    loop {
        let parent = stack.last().copied().unwrap_or(dom.document());
        match reader.read_event()? {
            Event::Decl(e) => {
                let version = e
                    .version()
                    .map(|v| String::from_utf8_lossy(&v).into_owned())
                    .unwrap_or_else(|_| "1.0".to_string());
                let standalone = e
                    .standalone()
                    .and_then(|v| v.ok())
                    .map(|v| String::from_utf8_lossy(&v).into_owned());
                dom.declaration = Some(XmlDeclaration {
                    version,
                    standalone,
                });
            }
            Event::Start(e) => {
                let id = create_element(&mut dom, &e)?;
                dom.append(parent, id);
                stack.push(id);
            }
            Event::Empty(e) => {
                let id = create_element(&mut dom, &e)?;
                dom.append(parent, id);
            }
            Event::End(_) => {
                if stack.len() > 1 {
                    stack.pop();
                }
            }
            Event::Text(e) => {
                dom.append_text(parent, &String::from_utf8_lossy(&e));
            }
            Event::GeneralRef(e) => {
                let ch = e
                    .resolve_char_ref()
                    .map_err(|err| Error::InvalidDocx(format!("character reference: {err}")))?;
                if let Some(ch) = ch {
                    dom.append_text(parent, ch.encode_utf8(&mut [0; 4]));
                } else {
                    let entity = String::from_utf8_lossy(e.as_ref());
                    let resolved = resolve_predefined_entity(&entity).ok_or_else(|| {
                        Error::InvalidDocx(format!("unknown entity reference &{entity};"))
                    })?;
                    dom.append_text(parent, resolved);
                }
            }
            Event::CData(e) => {
                let id = dom.create_node(NodeData::CData(String::from_utf8_lossy(&e).into_owned()));
                dom.append(parent, id);
            }
            Event::Comment(e) => {
                let id =
                    dom.create_node(NodeData::Comment(String::from_utf8_lossy(&e).into_owned()));
                dom.append(parent, id);
            }
            Event::PI(e) => {
                let id = dom.create_node(NodeData::ProcessingInstruction(
                    String::from_utf8_lossy(&e).into_owned(),
                ));
                dom.append(parent, id);
            }
            Event::DocType(e) => {
                let id =
                    dom.create_node(NodeData::DocType(String::from_utf8_lossy(&e).into_owned()));
                dom.append(parent, id);
            }
            Event::Eof => break,
        }
    }

    Ok(dom)
}

fn create_element(dom: &mut XmlDom, e: &BytesStart<'_>) -> Result<NodeId> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut attrs = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| Error::InvalidDocx(format!("element {name}: {err}")))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let raw = String::from_utf8_lossy(&attr.value);
        let value = quick_xml::escape::unescape(&raw)
            .map_err(|err| Error::InvalidDocx(format!("attribute {key}: {err}")))?
            .into_owned();
        attrs.push(Attribute { name: key, value });
    }
    Ok(dom.create_element(name, attrs))
}
