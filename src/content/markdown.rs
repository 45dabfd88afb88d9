//! Markdown conversion: content-root selection and the rule-table walk.

use super::dom::{self, Element, Node};
use super::metadata::{self, Metadata};

/// Class names tried (in order) when selecting the content root.
const CONTENT_CLASSES: &[&str] = &["content", "post", "entry"];

/// Result of converting a captured page.
#[derive(Debug, Clone)]
pub struct Converted {
    /// The article body as markdown.
    pub markdown: String,
    /// Document title (same value as `metadata.title`).
    pub title: String,
    pub metadata: Metadata,
}

/// Converts a raw HTML document into markdown plus metadata.
///
/// Non-content elements are stripped first, then a single content root is
/// chosen by fixed priority (`article` > `main` > `.content` > `.post` >
/// `.entry` > `body`) and its children are walked in document order
/// against the rule table. No network access; the only side effect is
/// reading the clock for `metadata.extracted_at`.
pub fn convert(html: &str, url: &str) -> Converted {
    let root = dom::build(html);
    let metadata = metadata::extract(&root, url);
    let content_root = select_content_root(&root);
    let markdown = render_children(content_root);

    Converted {
        markdown,
        title: metadata.title.clone(),
        metadata,
    }
}

/// First matching selector wins; no scoring. Falls back to `<body>`, and
/// to the document root only for pathological head-only input.
fn select_content_root(root: &Element) -> &Element {
    if let Some(el) = root.find_tag("article") {
        return el;
    }
    if let Some(el) = root.find_tag("main") {
        return el;
    }
    for class in CONTENT_CLASSES {
        if let Some(el) = root.find_first(&|e| e.has_class(class)) {
            return el;
        }
    }
    root.find_tag("body").unwrap_or(root)
}

fn render_children(el: &Element) -> String {
    let mut out = String::new();
    for child in &el.children {
        render_node(child, &mut out);
    }
    out
}

fn render_node(node: &Node, out: &mut String) {
    match node {
        Node::Text(text) => out.push_str(text),
        Node::Element(el) => render_element(el, out),
    }
}

/// The fixed rule table. Inline constructs flatten nested markup via
/// `Element::text`; headings, paragraphs, blockquotes, and unrecognized
/// elements recurse, which is the only path that preserves nesting.
fn render_element(el: &Element, out: &mut String) {
    match el.tag.as_str() {
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            let level = el.tag[1..].parse::<usize>().unwrap_or(1);
            out.push_str(&"#".repeat(level));
            out.push(' ');
            out.push_str(render_children(el).trim());
            out.push_str("\n\n");
        }
        "p" => {
            out.push_str(render_children(el).trim());
            out.push_str("\n\n");
        }
        "strong" | "b" => {
            out.push_str(&format!("**{}**", el.text().trim()));
        }
        "em" | "i" => {
            out.push_str(&format!("*{}*", el.text().trim()));
        }
        "a" => {
            out.push_str(&format!(
                "[{}]({})",
                el.text().trim(),
                el.attr("href").unwrap_or_default()
            ));
        }
        "img" => {
            out.push_str(&format!(
                "![{}]({})\n\n",
                el.attr("alt").unwrap_or_default(),
                el.attr("src").unwrap_or_default()
            ));
        }
        "ul" => {
            for li in el.child_elements().filter(|c| c.tag == "li") {
                out.push_str(&format!("- {}\n", li.text().trim()));
            }
        }
        "ol" => {
            for (index, li) in el
                .child_elements()
                .filter(|c| c.tag == "li")
                .enumerate()
            {
                out.push_str(&format!("{}. {}\n", index + 1, li.text().trim()));
            }
        }
        "blockquote" => {
            out.push_str(&format!("> {}\n\n", render_children(el).trim()));
        }
        "code" => {
            out.push_str(&format!("`{}`", el.text().trim()));
        }
        "pre" => {
            out.push_str(&format!("```\n{}\n```\n\n", el.text().trim_matches('\n')));
        }
        _ => {
            for child in &el.children {
                render_node(child, out);
            }
        }
    }
}
