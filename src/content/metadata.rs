//! Document metadata extraction.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::dom::Element;

/// Title used when the document has no usable `<title>` element.
const DEFAULT_TITLE: &str = "Untitled Article";

/// Metadata attached to a captured page.
#[derive(Debug, Clone, Serialize)]
pub struct Metadata {
    pub title: String,
    pub author: Option<String>,
    pub description: Option<String>,
    /// Source URL the page was captured from.
    pub url: String,
    /// Conversion time.
    pub extracted_at: DateTime<Utc>,
}

/// Extracts title, author, and description from the document tree.
///
/// Title comes from the `<title>` element (default `"Untitled Article"`),
/// author and description from the correspondingly named meta tags.
pub fn extract(root: &Element, url: &str) -> Metadata {
    let title = root
        .find_tag("title")
        .map(|t| t.text().trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());

    Metadata {
        title,
        author: named_meta(root, "author"),
        description: named_meta(root, "description"),
        url: url.to_string(),
        extracted_at: Utc::now(),
    }
}

fn named_meta(root: &Element, name: &str) -> Option<String> {
    root.find_first(&|el| {
        el.tag == "meta" && el.attr("name").is_some_and(|n| n.eq_ignore_ascii_case(name))
    })
    .and_then(|el| el.attr("content"))
    .map(|c| c.trim().to_string())
    .filter(|c| !c.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::dom::build;

    #[test]
    fn test_full_metadata() {
        let html = r#"<html><head>
            <title>A Fine Article</title>
            <meta name="author" content="Ada Lovelace">
            <meta name="description" content="Notes on engines">
        </head><body></body></html>"#;
        let meta = extract(&build(html), "https://example.com/a");

        assert_eq!(meta.title, "A Fine Article");
        assert_eq!(meta.author.as_deref(), Some("Ada Lovelace"));
        assert_eq!(meta.description.as_deref(), Some("Notes on engines"));
        assert_eq!(meta.url, "https://example.com/a");
    }

    #[test]
    fn test_missing_everything_defaults() {
        let meta = extract(&build("<p>no head to speak of</p>"), "https://example.com");
        assert_eq!(meta.title, "Untitled Article");
        assert_eq!(meta.author, None);
        assert_eq!(meta.description, None);
    }

    #[test]
    fn test_other_meta_tags_ignored() {
        let html = r#"<head><meta name="viewport" content="width=device-width"><title>T</title></head>"#;
        let meta = extract(&build(html), "https://example.com");
        assert_eq!(meta.author, None);
        assert_eq!(meta.title, "T");
    }
}
