//! Per-article export renderings.
//!
//! Three formats for the "download this article" action: markdown (the
//! body plus a metadata header, notes, and highlights), a minimal
//! standalone HTML document, and JSON. These are ad-hoc user-facing
//! renderings, not an interchange format.

use pulldown_cmark::{html, Parser};
use serde::Serialize;

use crate::storage::{Article, Highlight};

/// Markdown rendering of one article with its highlights.
pub fn to_markdown(article: &Article, highlights: &[Highlight]) -> String {
    let mut out = String::new();

    out.push_str(&format!("# {}\n\n", article.title));
    if let Some(author) = &article.author {
        out.push_str(&format!("*by {}*\n\n", author));
    }
    if let Some(url) = &article.url {
        out.push_str(&format!("Source: <{}>\n\n", url));
    }
    if !article.tags.is_empty() {
        out.push_str(&format!("Tags: {}\n\n", article.tags.join(", ")));
    }

    out.push_str(article.content.trim_end());
    out.push('\n');

    if let Some(summary) = &article.summary {
        out.push_str(&format!("\n## Summary\n\n{}\n", summary.trim_end()));
    }
    if let Some(notes) = &article.notes {
        out.push_str(&format!("\n## Notes\n\n{}\n", notes.trim_end()));
    }
    if !highlights.is_empty() {
        out.push_str("\n## Highlights\n\n");
        for highlight in highlights {
            out.push_str(&format!("- **{}**: {}\n", highlight.color, highlight.text));
            if let Some(note) = &highlight.note {
                out.push_str(&format!("  {}\n", note));
            }
        }
    }

    out
}

/// Minimal standalone HTML document. The article body (markdown) is
/// rendered to HTML; every other field is escaped text.
pub fn to_html(article: &Article, highlights: &[Highlight]) -> String {
    let mut body_html = String::new();
    html::push_html(&mut body_html, Parser::new(&article.content));

    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    out.push_str(&format!("<title>{}</title>\n", escape_html(&article.title)));
    out.push_str("</head>\n<body>\n");
    out.push_str(&format!("<h1>{}</h1>\n", escape_html(&article.title)));

    if let Some(author) = &article.author {
        out.push_str(&format!("<p><em>by {}</em></p>\n", escape_html(author)));
    }
    if let Some(url) = &article.url {
        let escaped = escape_html(url);
        out.push_str(&format!("<p><a href=\"{escaped}\">{escaped}</a></p>\n"));
    }

    out.push_str("<article>\n");
    out.push_str(&body_html);
    out.push_str("</article>\n");

    if let Some(notes) = &article.notes {
        out.push_str(&format!("<h2>Notes</h2>\n<p>{}</p>\n", escape_html(notes)));
    }
    if !highlights.is_empty() {
        out.push_str("<h2>Highlights</h2>\n<ul>\n");
        for highlight in highlights {
            out.push_str(&format!(
                "<li><mark data-color=\"{}\">{}</mark>",
                escape_html(&highlight.color),
                escape_html(&highlight.text)
            ));
            if let Some(note) = &highlight.note {
                out.push_str(&format!(" <em>{}</em>", escape_html(note)));
            }
            out.push_str("</li>\n");
        }
        out.push_str("</ul>\n");
    }

    out.push_str("</body>\n</html>\n");
    out
}

#[derive(Serialize)]
struct ArticleExport<'a> {
    article: &'a Article,
    highlights: &'a [Highlight],
}

/// JSON rendering of one article with its highlights.
pub fn to_json(article: &Article, highlights: &[Highlight]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&ArticleExport {
        article,
        highlights,
    })
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_article() -> Article {
        Article {
            id: 1,
            feed_id: None,
            guid: None,
            title: "Exported & Saved".to_string(),
            author: Some("Ada".to_string()),
            published: None,
            content: "# Heading\n\nBody paragraph.".to_string(),
            summary: None,
            url: Some("https://example.com/a?x=1&y=2".to_string()),
            read: true,
            tags: vec!["export".to_string(), "test".to_string()],
            notes: Some("worth keeping".to_string()),
            saved_at: 1704067200,
        }
    }

    fn sample_highlights() -> Vec<Highlight> {
        vec![Highlight {
            id: 1,
            article_id: 1,
            text: "Body paragraph".to_string(),
            color: "yellow".to_string(),
            note: Some("key point".to_string()),
            position: 0,
        }]
    }

    #[test]
    fn test_markdown_contains_all_sections() {
        let md = to_markdown(&sample_article(), &sample_highlights());
        assert!(md.starts_with("# Exported & Saved\n"));
        assert!(md.contains("*by Ada*"));
        assert!(md.contains("Source: <https://example.com/a?x=1&y=2>"));
        assert!(md.contains("Tags: export, test"));
        assert!(md.contains("Body paragraph."));
        assert!(md.contains("## Notes\n\nworth keeping"));
        assert!(md.contains("- **yellow**: Body paragraph"));
        assert!(md.contains("  key point"));
    }

    #[test]
    fn test_markdown_omits_empty_sections() {
        let mut article = sample_article();
        article.author = None;
        article.notes = None;
        article.tags.clear();
        let md = to_markdown(&article, &[]);
        assert!(!md.contains("*by"));
        assert!(!md.contains("## Notes"));
        assert!(!md.contains("## Highlights"));
        assert!(!md.contains("Tags:"));
    }

    #[test]
    fn test_html_escapes_and_renders() {
        let html = to_html(&sample_article(), &sample_highlights());
        assert!(html.contains("<title>Exported &amp; Saved</title>"));
        // Markdown body is rendered, not escaped
        assert!(html.contains("<h1>Heading</h1>"));
        assert!(html.contains("<p>Body paragraph.</p>"));
        assert!(html.contains("https://example.com/a?x=1&amp;y=2"));
        assert!(html.contains("<mark data-color=\"yellow\">Body paragraph</mark>"));
    }

    #[test]
    fn test_json_round_trips_fields() {
        let json = to_json(&sample_article(), &sample_highlights()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["article"]["title"], "Exported & Saved");
        assert_eq!(value["article"]["tags"][1], "test");
        assert_eq!(value["highlights"][0]["color"], "yellow");
    }
}
