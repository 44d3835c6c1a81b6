//! Serialize an [`XmlDom`] back to XML text.

use quick_xml::escape::escape;

use super::arena::{NodeData, NodeId, XmlDom};

/// Serialize the whole document, including the XML declaration if the
/// source had one. Output is always UTF-8.
pub fn to_xml_string(dom: &XmlDom) -> String {
    let mut out = String::with_capacity(dom.len() * 16);
    if let Some(decl) = &dom.declaration {
        out.push_str(&format!(
            "<?xml version=\"{}\" encoding=\"UTF-8\"",
            escape(decl.version.as_str())
        ));
        if let Some(standalone) = &decl.standalone {
            out.push_str(&format!(" standalone=\"{}\"", escape(standalone.as_str())));
        }
        out.push_str("?>");
    }
    write_node(dom, dom.document(), &mut out);
    out
}

/// Serialize one subtree (used by tests and debug logging).
pub fn node_to_string(dom: &XmlDom, id: NodeId) -> String {
    let mut out = String::new();
    write_node(dom, id, &mut out);
    out
}

fn write_node(dom: &XmlDom, id: NodeId, out: &mut String) {
    let Some(node) = dom.node(id) else {
        return;
    };

    match &node.data {
        NodeData::Document | NodeData::Fragment => write_children(dom, id, out),
        NodeData::Element { name, attrs } => {
            out.push('<');
            out.push_str(name);
            for attr in attrs {
                out.push(' ');
                out.push_str(&attr.name);
                out.push_str("=\"");
                out.push_str(&escape(attr.value.as_str()));
                out.push('"');
            }
            if node.first_child.is_none() {
                out.push_str("/>");
            } else {
                out.push('>');
                write_children(dom, id, out);
                out.push_str("</");
                out.push_str(name);
                out.push('>');
            }
        }
        NodeData::Text(text) => out.push_str(&escape(text.as_str())),
        NodeData::CData(text) => {
            out.push_str("<![CDATA[");
            out.push_str(text);
            out.push_str("]]>");
        }
        NodeData::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        NodeData::ProcessingInstruction(content) => {
            out.push_str("<?");
            out.push_str(content);
            out.push_str("?>");
        }
        NodeData::DocType(content) => {
            out.push_str("<!DOCTYPE ");
            out.push_str(content);
            out.push('>');
        }
    }
}

fn write_children(dom: &XmlDom, id: NodeId, out: &mut String) {
    for child in dom.children(id) {
        write_node(dom, child, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_xml;

    #[test]
    fn test_round_trip_preserves_structure() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="urn:w"><w:body><w:p><w:r><w:t xml:space="preserve"> a &amp; b </w:t></w:r></w:p><w:sectPr/></w:body></w:document>"#;
        let dom = parse_xml(xml).unwrap();
        assert_eq!(to_xml_string(&dom), xml);
    }

    #[test]
    fn test_comments_and_cdata_survive() {
        let xml = r#"<a><!-- note --><![CDATA[x < y]]></a>"#;
        let dom = parse_xml(xml).unwrap();
        assert_eq!(to_xml_string(&dom), xml);
    }

    #[test]
    fn test_attribute_escaping() {
        let mut dom = XmlDom::new();
        let a = dom.create_element("a", vec![]);
        dom.set_attr(a, "title", "\"q\" & <t>");
        dom.append(dom.document(), a);
        assert_eq!(
            to_xml_string(&dom),
            r#"<a title="&quot;q&quot; &amp; &lt;t&gt;"/>"#
        );
    }

    #[test]
    fn test_fragment_serializes_children_only() {
        let mut dom = XmlDom::new();
        let frag = dom.create_fragment();
        let a = dom.create_element("a", vec![]);
        let b = dom.create_element("b", vec![]);
        dom.append(frag, a);
        dom.append(frag, b);
        assert_eq!(node_to_string(&dom, frag), "<a/><b/>");
    }
}
