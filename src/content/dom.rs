//! Tagged node tree for HTML content.
//!
//! `scraper` handles the actual HTML parsing; this module converts its
//! tree into an owned `Text | Element` structure so the converter can
//! dispatch on tag names with an explicit match instead of dynamic node
//! type tests. Non-content elements are dropped during the conversion,
//! which guarantees they are gone before content-root selection ever runs.

use std::collections::HashMap;

use scraper::Html;

/// Elements removed wholesale before conversion.
const STRIPPED_TAGS: &[&str] = &["script", "style", "nav", "header", "footer"];

/// Class markers that flag an element as non-content.
const STRIPPED_CLASSES: &[&str] = &["advertisement", "sidebar"];

/// A node in the content tree: character data or an element.
#[derive(Debug, Clone)]
pub enum Node {
    Text(String),
    Element(Element),
}

/// An element with lowercased tag name, attributes, and children in
/// document order.
#[derive(Debug, Clone)]
pub struct Element {
    pub tag: String,
    attrs: HashMap<String, String>,
    pub children: Vec<Node>,
}

impl Element {
    /// Attribute value by name, if present.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    /// True when the `class` attribute contains the given token.
    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .map(|c| c.split_whitespace().any(|t| t.eq_ignore_ascii_case(class)))
            .unwrap_or(false)
    }

    /// Flattened text content of the whole subtree.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(t) => out.push_str(t),
                Node::Element(el) => el.collect_text(out),
            }
        }
    }

    /// Direct element children.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        })
    }

    /// First element in pre-order (the receiver included) matching the
    /// predicate, which is the first match in document order.
    pub fn find_first<'a>(&'a self, pred: &dyn Fn(&Element) -> bool) -> Option<&'a Element> {
        if pred(self) {
            return Some(self);
        }
        for child in self.child_elements() {
            if let Some(found) = child.find_first(pred) {
                return Some(found);
            }
        }
        None
    }

    /// First descendant with the given tag name.
    pub fn find_tag<'a>(&'a self, tag: &str) -> Option<&'a Element> {
        self.find_first(&|el| el.tag == tag)
    }
}

/// Parses an HTML document into a stripped content tree rooted at the
/// `<html>` element. Parsing never fails: the underlying parser recovers
/// from arbitrary input the way browsers do.
pub fn build(html: &str) -> Element {
    let doc = Html::parse_document(html);
    let root = doc.tree.root();

    for child in root.children() {
        if let Some(Node::Element(el)) = convert_node(child) {
            return el;
        }
    }

    // The html5ever tree always has an <html> element; this is a guard
    // for the degenerate empty-tree case only.
    Element {
        tag: "html".to_string(),
        attrs: HashMap::new(),
        children: Vec::new(),
    }
}

fn convert_node(node: ego_tree::NodeRef<'_, scraper::Node>) -> Option<Node> {
    match node.value() {
        scraper::Node::Text(text) => Some(Node::Text(text.to_string())),
        scraper::Node::Element(el) => {
            let tag = el.name().to_ascii_lowercase();
            let attrs: HashMap<String, String> = el
                .attrs()
                .map(|(k, v)| (k.to_ascii_lowercase(), v.to_string()))
                .collect();

            let element = Element {
                tag,
                attrs,
                children: Vec::new(),
            };
            if is_stripped(&element) {
                return None;
            }

            let children = node.children().filter_map(convert_node).collect();
            Some(Node::Element(Element { children, ..element }))
        }
        _ => None,
    }
}

fn is_stripped(el: &Element) -> bool {
    if STRIPPED_TAGS.contains(&el.tag.as_str()) {
        return true;
    }
    STRIPPED_CLASSES.iter().any(|c| el.has_class(c))
}
