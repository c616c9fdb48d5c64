//! FILENAME: core/rdl/src/xml.rs
//! PURPOSE: Minimal element tree over quick-xml events.
//! CONTEXT: The report reader navigates the document by element paths
//! (e.g. `Query/CommandText`), so the event stream is folded into a small
//! owned tree first. Namespace prefixes are split off element names; the
//! reader works with local names throughout.

use crate::error::ParseError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// One element of the document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlElement {
    /// Local name (prefix stripped).
    pub name: String,
    pub prefix: Option<String>,
    /// Attributes in document order, keyed by their qualified name.
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlElement>,
    /// Concatenated character data directly inside this element.
    pub text: String,
}

impl XmlElement {
    fn from_start(start: &BytesStart<'_>) -> Result<Self, ParseError> {
        let qname = start.name();
        let qualified = utf8(qname.as_ref())?;
        let (prefix, name) = split_qualified(qualified);

        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| ParseError::MalformedXml(e.to_string()))?;
            let key = utf8(attr.key.as_ref())?.to_string();
            let value = attr
                .unescape_value()
                .map_err(|e| ParseError::MalformedXml(e.to_string()))?
                .into_owned();
            attributes.push((key, value));
        }

        Ok(XmlElement {
            name: name.to_string(),
            prefix: prefix.map(str::to_string),
            attributes,
            children: Vec::new(),
            text: String::new(),
        })
    }

    /// First direct child with the given local name.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All direct children with the given local name.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Follows a chain of direct children, first match at each step.
    pub fn path(&self, steps: &[&str]) -> Option<&XmlElement> {
        steps.iter().try_fold(self, |element, step| element.child(step))
    }

    /// Every element path `steps` reaches, in document order.
    pub fn path_all(&self, steps: &[&str]) -> Vec<&XmlElement> {
        let mut current = vec![self];
        for step in steps {
            current = current
                .into_iter()
                .flat_map(|element| element.children.iter().filter(|c| c.name == *step))
                .collect();
        }
        current
    }

    /// All descendants (not including self) with the given local name,
    /// in document order.
    pub fn descendants<'a>(&'a self, name: &str) -> Vec<&'a XmlElement> {
        let mut found = Vec::new();
        self.collect_descendants(name, &mut found);
        found
    }

    fn collect_descendants<'a>(&'a self, name: &str, found: &mut Vec<&'a XmlElement>) {
        for child in &self.children {
            if child.name == name {
                found.push(child);
            }
            child.collect_descendants(name, found);
        }
    }

    /// First descendant with the given local name.
    pub fn find(&self, name: &str) -> Option<&XmlElement> {
        for child in &self.children {
            if child.name == name {
                return Some(child);
            }
            if let Some(found) = child.find(name) {
                return Some(found);
            }
        }
        None
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Text of the first direct child named `name`.
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).map(XmlElement::text)
    }

    /// Attribute by exact qualified name (e.g. "Name" or "xmlns").
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Attribute by local name, ignoring any prefix (e.g. "nil" matches "xsi:nil").
    pub fn attr_local(&self, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| split_qualified(k).1 == local)
            .map(|(_, v)| v.as_str())
    }
}

fn split_qualified(qualified: &str) -> (Option<&str>, &str) {
    match qualified.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, qualified),
    }
}

fn utf8(bytes: &[u8]) -> Result<&str, ParseError> {
    std::str::from_utf8(bytes).map_err(|e| ParseError::MalformedXml(e.to_string()))
}

/// Parses a whole document into its root element.
/// A leading UTF-8 byte order mark is skipped.
pub fn parse_document(bytes: &[u8]) -> Result<XmlElement, ParseError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let content = utf8(bytes)?;

    let mut reader = Reader::from_str(content);
    reader.trim_text(false);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        let event = reader.read_event().map_err(|e| {
            ParseError::MalformedXml(format!("{} at byte {}", e, reader.buffer_position()))
        })?;

        match event {
            Event::Start(start) => {
                stack.push(XmlElement::from_start(&start)?);
            }
            Event::Empty(start) => {
                let element = XmlElement::from_start(&start)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| ParseError::MalformedXml("Unexpected closing tag".to_string()))?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(text) => {
                let unescaped = text
                    .unescape()
                    .map_err(|e| ParseError::MalformedXml(e.to_string()))?;
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&unescaped);
                }
            }
            Event::CData(cdata) => {
                let raw = cdata.into_inner();
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(utf8(&raw)?);
                }
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions, doctype
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(ParseError::MalformedXml(format!(
            "Unclosed element <{}>",
            open.name
        )));
    }

    root.ok_or_else(|| ParseError::MalformedXml("Document has no root element".to_string()))
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> Result<(), ParseError> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(element);
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(element);
            Ok(())
        }
        None => Err(ParseError::MalformedXml(
            "Document has more than one root element".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_tree_with_local_names() {
        let root = parse_document(
            br#"<Report xmlns:rd="urn:rd"><DataSets><DataSet Name="A"><rd:TypeName>System.Int32</rd:TypeName></DataSet></DataSets></Report>"#,
        )
        .unwrap();
        assert_eq!(root.name, "Report");
        let dataset = root.path(&["DataSets", "DataSet"]).unwrap();
        assert_eq!(dataset.attr("Name"), Some("A"));
        let type_name = dataset.child("TypeName").unwrap();
        assert_eq!(type_name.prefix.as_deref(), Some("rd"));
        assert_eq!(type_name.text(), "System.Int32");
    }

    #[test]
    fn unescapes_entities_and_keeps_cdata() {
        let root = parse_document(
            b"<R><A>a &gt; b &amp; c</A><B><![CDATA[x < y]]></B></R>",
        )
        .unwrap();
        assert_eq!(root.child_text("A"), Some("a > b & c"));
        assert_eq!(root.child_text("B"), Some("x < y"));
    }

    #[test]
    fn skips_byte_order_mark() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice(b"<Report/>");
        assert_eq!(parse_document(&bytes).unwrap().name, "Report");
    }

    #[test]
    fn path_all_collects_every_match_across_branches() {
        let root = parse_document(
            br#"<R><Rows><Row n="1"/><Row n="2"/></Rows><Rows><Row n="3"/></Rows></R>"#,
        )
        .unwrap();
        let rows = {
            let steps = vec!["Rows".to_string(), "Row".to_string()];
            let steps: Vec<&str> = steps.iter().map(String::as_str).collect();
            root.path_all(&steps)
        };
        let ns: Vec<_> = rows.iter().filter_map(|r| r.attr("n")).collect();
        assert_eq!(ns, vec!["1", "2", "3"]);
    }

    #[test]
    fn prefixed_element_names_are_split() {
        let root = parse_document(br#"<rd:Report xmlns:rd="urn:rd"/>"#).unwrap();
        assert_eq!(root.name, "Report");
        assert_eq!(root.prefix.as_deref(), Some("rd"));
    }

    #[test]
    fn descendants_are_in_document_order() {
        let root = parse_document(b"<R><X n=\"1\"><X n=\"2\"/></X><Y><X n=\"3\"/></Y></R>").unwrap();
        let names: Vec<_> = root
            .descendants("X")
            .into_iter()
            .filter_map(|x| x.attr("n"))
            .collect();
        assert_eq!(names, vec!["1", "2", "3"]);
    }

    #[test]
    fn rejects_mismatched_tags() {
        assert!(matches!(
            parse_document(b"<R><A></B></R>"),
            Err(ParseError::MalformedXml(_))
        ));
    }

    #[test]
    fn rejects_unclosed_and_empty_documents() {
        assert!(parse_document(b"<R><A>").is_err());
        assert!(parse_document(b"").is_err());
    }

    #[test]
    fn rejects_invalid_utf8() {
        assert!(matches!(
            parse_document(b"<R>\xFF\xFE</R>"),
            Err(ParseError::MalformedXml(_))
        ));
    }

    #[test]
    fn nil_attribute_matches_by_local_name() {
        let root = parse_document(
            br#"<Value xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:nil="true"/>"#,
        )
        .unwrap();
        assert_eq!(root.attr_local("nil"), Some("true"));
    }
}
