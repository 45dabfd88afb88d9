//! Minimal XML element tree used by the feed parser.
//!
//! Feed extraction needs nothing more than "first child named X" and
//! "concatenated text content" queries over a fully materialized tree, so
//! this wraps `quick-xml`'s pull parser into a small owned structure
//! instead of pulling in a DOM crate. Names are matched by XML local name
//! (the part after any namespace prefix), case-insensitively, which is
//! what makes `dc:creator` answer a `creator` query.

use thiserror::Error;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Errors produced while materializing the element tree.
#[derive(Debug, Error)]
pub enum XmlError {
    /// The document is not well-formed XML.
    #[error("XML syntax error: {0}")]
    Syntax(String),
    /// The document contains no root element.
    #[error("document contains no root element")]
    NoRoot,
}

/// A node in the materialized tree: character data or a nested element.
#[derive(Debug, Clone)]
pub enum XmlNode {
    Text(String),
    Element(XmlElement),
}

/// An element with its attributes and children, in document order.
#[derive(Debug, Clone)]
pub struct XmlElement {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<XmlNode>,
}

impl XmlElement {
    /// The element name exactly as written, including any prefix.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The name with any namespace prefix stripped (`dc:creator` -> `creator`).
    pub fn local_name(&self) -> &str {
        local_part(&self.name)
    }

    /// The value of the first attribute whose local name matches, if any.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| local_part(k).eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Direct element children, in document order.
    pub fn child_elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|n| match n {
            XmlNode::Element(el) => Some(el),
            XmlNode::Text(_) => None,
        })
    }

    /// First direct child element whose local name matches.
    pub fn find_child(&self, local: &str) -> Option<&XmlElement> {
        self.child_elements()
            .find(|el| el.local_name().eq_ignore_ascii_case(local))
    }

    /// First element in the subtree (depth-first, document order) whose
    /// local name matches. The receiver itself is not considered.
    pub fn find_descendant(&self, local: &str) -> Option<&XmlElement> {
        for el in self.child_elements() {
            if el.local_name().eq_ignore_ascii_case(local) {
                return Some(el);
            }
            if let Some(found) = el.find_descendant(local) {
                return Some(found);
            }
        }
        None
    }

    /// Concatenated character data of the whole subtree.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                XmlNode::Text(t) => out.push_str(t),
                XmlNode::Element(el) => el.collect_text(out),
            }
        }
    }
}

fn local_part(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}

fn element_from_start(start: &BytesStart<'_>) -> Result<XmlElement, XmlError> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| XmlError::Syntax(e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| XmlError::Syntax(e.to_string()))?
            .into_owned();
        attributes.push((key, value));
    }
    Ok(XmlElement {
        name,
        attributes,
        children: Vec::new(),
    })
}

/// Parses a complete XML document and returns its root element.
///
/// # Errors
///
/// Returns [`XmlError::Syntax`] for malformed XML (mismatched tags,
/// broken attributes, invalid entities) and [`XmlError::NoRoot`] when the
/// input contains no element at all.
pub fn parse_document(xml: &str) -> Result<XmlElement, XmlError> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => {
                stack.push(element_from_start(&start)?);
            }
            Ok(Event::Empty(start)) => {
                let el = element_from_start(&start)?;
                attach(el, &mut stack, &mut root);
            }
            Ok(Event::End(_)) => {
                // Mismatched end tags are rejected by the reader itself
                let el = stack
                    .pop()
                    .ok_or_else(|| XmlError::Syntax("unexpected closing tag".to_string()))?;
                attach(el, &mut stack, &mut root);
            }
            Ok(Event::Text(text)) => {
                if let Some(parent) = stack.last_mut() {
                    let value = text
                        .unescape()
                        .map_err(|e| XmlError::Syntax(e.to_string()))?
                        .into_owned();
                    parent.children.push(XmlNode::Text(value));
                }
            }
            Ok(Event::CData(cdata)) => {
                if let Some(parent) = stack.last_mut() {
                    let value = String::from_utf8_lossy(&cdata.into_inner()).into_owned();
                    parent.children.push(XmlNode::Text(value));
                }
            }
            Ok(Event::Eof) => break,
            // Declarations, comments, PIs, doctypes carry no feed data
            Ok(_) => {}
            Err(e) => return Err(XmlError::Syntax(e.to_string())),
        }
    }

    if !stack.is_empty() {
        return Err(XmlError::Syntax("unclosed element at end of input".to_string()));
    }

    root.ok_or(XmlError::NoRoot)
}

fn attach(el: XmlElement, stack: &mut Vec<XmlElement>, root: &mut Option<XmlElement>) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(XmlNode::Element(el));
    } else if root.is_none() {
        *root = Some(el);
    }
}
