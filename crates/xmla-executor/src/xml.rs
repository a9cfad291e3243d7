//! Small element tree over quick-xml events.
//!
//! Responses are walked by local name, ignoring namespace prefixes, because
//! servers disagree on which prefixes they bind.

use std::borrow::Cow;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{XmlaError, XmlaResult};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Element {
    /// Local name, prefix stripped.
    pub name: String,
    /// Attributes keyed by local name.
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Element>,
    /// Character data directly inside this element.
    pub text: String,
}

impl Element {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).map(|c| c.text.as_str())
    }

    /// First element named `name` in document order, including `self`.
    pub fn descendant(&self, name: &str) -> Option<&Element> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.descendant(name))
    }

    /// All character data below this element, whitespace-collapsed.
    pub fn text_content(&self) -> String {
        let mut parts = Vec::new();
        self.collect_text(&mut parts);
        parts.join(" ")
    }

    fn collect_text<'a>(&'a self, parts: &mut Vec<&'a str>) {
        let own = self.text.trim();
        if !own.is_empty() {
            parts.push(own);
        }
        for child in &self.children {
            child.collect_text(parts);
        }
    }
}

fn invalid(e: impl std::fmt::Display) -> XmlaError {
    XmlaError::InvalidResponse(e.to_string())
}

fn local(name: &[u8]) -> String {
    let name = String::from_utf8_lossy(name);
    match name.rsplit_once(':') {
        Some((_, local)) => local.to_string(),
        None => name.into_owned(),
    }
}

fn open(start: &BytesStart<'_>) -> XmlaResult<Element> {
    let mut element = Element {
        name: local(start.name().as_ref()),
        ..Element::default()
    };
    for attr in start.attributes() {
        let attr = attr.map_err(invalid)?;
        let key = attr.key.as_ref();
        if key == b"xmlns" || key.starts_with(b"xmlns:") {
            continue;
        }
        let value = attr.unescape_value().map_err(invalid)?;
        element.attributes.push((local(key), value.into_owned()));
    }
    Ok(element)
}

/// Parses a whole document into its root element.
pub(crate) fn parse_document(bytes: &[u8]) -> XmlaResult<Element> {
    let mut reader = Reader::from_reader(bytes);
    let mut buf = Vec::new();
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => stack.push(open(&e)?),
            Ok(Event::Empty(e)) => {
                let element = open(&e)?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => root = Some(element),
                }
            }
            Ok(Event::End(_)) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| invalid("unbalanced end tag"))?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => root = Some(element),
                }
            }
            Ok(Event::Text(t)) => {
                if let Some(top) = stack.last_mut() {
                    let text: Cow<'_, str> = t.unescape().map_err(invalid)?;
                    top.text.push_str(&text);
                }
            }
            Ok(Event::CData(c)) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(XmlaError::InvalidResponse(format!(
                    "malformed XML at byte {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return Err(invalid("document ended inside an element"));
    }
    root.ok_or_else(|| invalid("empty document"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_strips_prefixes() {
        let doc = parse_document(
            br#"<a:Envelope xmlns:a="urn:x"><a:Body><b:item xsi:type="xsd:int">7</b:item></a:Body></a:Envelope>"#,
        )
        .unwrap();
        assert_eq!(doc.name, "Envelope");
        let item = doc.descendant("item").unwrap();
        assert_eq!(item.text, "7");
        assert_eq!(item.attr("type"), Some("xsd:int"));
        assert!(doc.attr("a").is_none());
    }

    #[test]
    fn test_parse_unescapes_text_and_attributes() {
        let doc = parse_document(br#"<r k="a&amp;b">x &lt; y<![CDATA[<raw>]]></r>"#).unwrap();
        assert_eq!(doc.attr("k"), Some("a&b"));
        assert_eq!(doc.text, "x < y<raw>");
    }

    #[test]
    fn test_children_named_and_text_content() {
        let doc = parse_document(b"<r><row>1</row><other/><row>2</row></r>").unwrap();
        let rows: Vec<_> = doc.children_named("row").map(|r| r.text.as_str()).collect();
        assert_eq!(rows, vec!["1", "2"]);
        assert_eq!(doc.text_content(), "1 2");
    }

    #[test]
    fn test_malformed_document_is_invalid_response() {
        assert!(matches!(
            parse_document(b"<a><b></a>"),
            Err(XmlaError::InvalidResponse(_))
        ));
        assert!(matches!(parse_document(b""), Err(XmlaError::InvalidResponse(_))));
        assert!(matches!(parse_document(b"<a>"), Err(XmlaError::InvalidResponse(_))));
    }
}
