//! Owned XML element tree.
//!
//! Most of this crate reads XML as a quick-xml event stream, but the merge
//! pass has to fuse sibling elements and re-parent their children, which needs
//! a tree it owns and can mutate. [`XmlElement`] is that tree: qualified tag
//! name as written, ordered attributes, ordered children, and optional text
//! content. One tree is built per content part and consumed by extraction.

use crate::common::error::{Error, Result};
use crate::common::xml::escape::{escape_xml, unescape_xml};
use quick_xml::Reader;
use quick_xml::events::Event;

/// An element in an owned XML tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    /// Qualified tag name as written in the source, e.g. `w:p`
    pub name: String,
    /// Attributes in document order, keys as written (e.g. `w:val`, `r:id`)
    pub attrs: Vec<(String, String)>,
    /// Child elements in document order
    pub children: Vec<XmlElement>,
    /// Text content, if any
    pub text: Option<String>,
}

impl XmlElement {
    /// Create an element with no attributes, children, or text.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
            text: None,
        }
    }

    /// The tag name without its namespace prefix.
    #[inline]
    pub fn local_name(&self) -> &str {
        match self.name.split_once(':') {
            Some((_, local)) => local,
            None => &self.name,
        }
    }

    /// The namespace prefix, if the tag has one.
    #[inline]
    pub fn prefix(&self) -> Option<&str> {
        self.name.split_once(':').map(|(prefix, _)| prefix)
    }

    /// Look up an attribute by its qualified name as written (e.g. `w:val`).
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// First child with the given qualified name.
    pub fn find_child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All children with the given qualified name.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// All text content in this element and its descendants, document order.
    pub fn itertext(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        if let Some(text) = &self.text {
            out.push_str(text);
        }
        for child in &self.children {
            child.collect_text(out);
        }
    }

    /// Serialize this element (and its subtree) back to XML.
    ///
    /// Attribute values and text are re-escaped. Used by the light save pass;
    /// the output is not guaranteed byte-identical to the source, only
    /// equivalent.
    pub fn to_xml(&self) -> String {
        let mut out = String::with_capacity(256);
        self.write_xml(&mut out);
        out
    }

    fn write_xml(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (key, value) in &self.attrs {
            out.push(' ');
            out.push_str(key);
            out.push_str("=\"");
            out.push_str(&escape_xml(value));
            out.push('"');
        }
        if self.children.is_empty() && self.text.is_none() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        if let Some(text) = &self.text {
            out.push_str(&escape_xml(text));
        }
        for child in &self.children {
            child.write_xml(out);
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}

/// Parse XML bytes into an owned element tree.
///
/// Returns the root element. Whitespace-only text between elements is
/// dropped except inside `t` elements (`w:t`, `m:t`), where a lone space is
/// real content.
pub fn parse_xml(bytes: &[u8]) -> Result<XmlElement> {
    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().check_end_names = false;

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;
    let mut buf = Vec::with_capacity(1024);

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                stack.push(element_from_start(e.name().as_ref(), e.attributes())?);
            },
            Ok(Event::Empty(e)) => {
                let elem = element_from_start(e.name().as_ref(), e.attributes())?;
                attach(&mut stack, &mut root, elem)?;
            },
            Ok(Event::End(_)) => {
                let elem = stack
                    .pop()
                    .ok_or_else(|| Error::Xml("unbalanced end tag".to_string()))?;
                attach(&mut stack, &mut root, elem)?;
            },
            Ok(Event::Text(e)) => {
                if let Some(open) = stack.last_mut() {
                    let raw = std::str::from_utf8(e.as_ref())
                        .map_err(|e| Error::Xml(e.to_string()))?;
                    // Indentation between elements is noise; a space inside
                    // w:t is a space run.
                    if !raw.trim().is_empty() || open.local_name() == "t" {
                        let text = unescape_xml(raw);
                        match &mut open.text {
                            Some(existing) => existing.push_str(&text),
                            None => open.text = Some(text),
                        }
                    }
                }
            },
            Ok(Event::CData(e)) => {
                if let Some(open) = stack.last_mut() {
                    let raw = std::str::from_utf8(e.as_ref())
                        .map_err(|e| Error::Xml(e.to_string()))?;
                    match &mut open.text {
                        Some(existing) => existing.push_str(raw),
                        None => open.text = Some(raw.to_string()),
                    }
                }
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Xml(e.to_string())),
            _ => {},
        }
        buf.clear();
    }

    root.ok_or_else(|| Error::Xml("document has no root element".to_string()))
}

fn element_from_start(
    name: &[u8],
    attributes: quick_xml::events::attributes::Attributes<'_>,
) -> Result<XmlElement> {
    let name = String::from_utf8_lossy(name).into_owned();
    let mut elem = XmlElement::new(name);
    for attr in attributes.flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = unescape_xml(&String::from_utf8_lossy(&attr.value));
        elem.attrs.push((key, value));
    }
    Ok(elem)
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    elem: XmlElement,
) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(elem),
        None => {
            if root.is_some() {
                return Err(Error::Xml("multiple root elements".to_string()));
            }
            *root = Some(elem);
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_tree() {
        let xml = br#"<?xml version="1.0"?>
            <w:document>
                <w:body>
                    <w:p><w:r><w:t>hello</w:t></w:r></w:p>
                </w:body>
            </w:document>"#;
        let root = parse_xml(xml).unwrap();
        assert_eq!(root.name, "w:document");
        assert_eq!(root.local_name(), "document");
        assert_eq!(root.prefix(), Some("w"));

        let body = &root.children[0];
        assert_eq!(body.name, "w:body");
        let text = &body.children[0].children[0].children[0];
        assert_eq!(text.name, "w:t");
        assert_eq!(text.text.as_deref(), Some("hello"));
    }

    #[test]
    fn test_parse_attributes_unescaped() {
        let xml = br#"<w:p><w:hyperlink r:id="rId4" w:anchor="a &amp; b"/></w:p>"#;
        let root = parse_xml(xml).unwrap();
        let link = &root.children[0];
        assert_eq!(link.attr("r:id"), Some("rId4"));
        assert_eq!(link.attr("w:anchor"), Some("a & b"));
    }

    #[test]
    fn test_whitespace_kept_only_in_text_elements() {
        let xml = b"<w:p>\n  <w:r>\n    <w:t> </w:t>\n  </w:r>\n</w:p>";
        let root = parse_xml(xml).unwrap();
        assert_eq!(root.text, None);
        let t = &root.children[0].children[0];
        assert_eq!(t.text.as_deref(), Some(" "));
    }

    #[test]
    fn test_text_entities_unescaped() {
        let xml = b"<w:t>a &amp; b &lt; c</w:t>";
        let root = parse_xml(xml).unwrap();
        assert_eq!(root.text.as_deref(), Some("a & b < c"));
    }

    #[test]
    fn test_itertext_walks_document_order() {
        let xml = b"<w:p><w:r><w:t>one </w:t></w:r><w:r><w:t>two</w:t></w:r></w:p>";
        let root = parse_xml(xml).unwrap();
        assert_eq!(root.itertext(), "one two");
    }

    #[test]
    fn test_serialize_round_trip() {
        let xml = br#"<w:p w:rsidR="00A"><w:r><w:t>a &amp; b</w:t></w:r><w:br/></w:p>"#;
        let root = parse_xml(xml).unwrap();
        let serialized = root.to_xml();
        let reparsed = parse_xml(serialized.as_bytes()).unwrap();
        assert_eq!(root, reparsed);
    }

    #[test]
    fn test_empty_input_is_an_error() {
        assert!(parse_xml(b"").is_err());
    }
}
