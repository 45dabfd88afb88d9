//! RSS 2.0 / Atom normalization.
//!
//! Both formats are reduced to one shape via first-match-wins tag alias
//! queries: for each field the listed aliases are tried in priority
//! order over an element's direct children, the first hit wins, and a
//! miss yields an empty string (or the documented default). Publication
//! dates are deliberately left as opaque strings at this layer; callers
//! that need a timestamp use [`ParsedItem::published_timestamp`].

use sha2::{Digest, Sha256};
use thiserror::Error;

use super::xml::{parse_document, XmlElement, XmlError};

/// Feed title used when the document does not provide one.
const DEFAULT_FEED_TITLE: &str = "Unknown Feed";

/// Item title used when an entry does not provide one.
const DEFAULT_ITEM_TITLE: &str = "Untitled";

/// Errors produced by feed normalization.
///
/// Distinct from the fetch layer's transport errors: a reachable server
/// returning a non-feed document surfaces here, never as a network error.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Neither a `<channel>` (RSS) nor a `<feed>` (Atom) container exists.
    #[error("not an RSS or Atom document (no <channel> or <feed> container)")]
    MalformedFeed,
    /// The input is not well-formed XML.
    #[error(transparent)]
    Xml(#[from] XmlError),
}

/// A normalized feed: header fields plus its entries in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFeed {
    pub title: String,
    pub description: String,
    pub link: String,
    pub items: Vec<ParsedItem>,
}

/// A normalized feed entry. All fields are trimmed; missing source tags
/// yield empty strings (except `title`, which defaults to `"Untitled"`).
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedItem {
    pub title: String,
    pub link: String,
    pub description: String,
    /// Opaque publication date string; no date parsing happens here.
    pub pub_date: String,
    pub author: String,
    pub guid: String,
}

impl ParsedItem {
    /// Parses the opaque `pub_date` string into unix seconds, trying
    /// RFC 2822 (RSS convention) then RFC 3339 (Atom convention).
    pub fn published_timestamp(&self) -> Option<i64> {
        let raw = self.pub_date.trim();
        if raw.is_empty() {
            return None;
        }
        chrono::DateTime::parse_from_rfc2822(raw)
            .or_else(|_| chrono::DateTime::parse_from_rfc3339(raw))
            .map(|dt| dt.timestamp())
            .ok()
    }

    /// Stable identity for deduplication: the guid when present, else a
    /// SHA-256 over link, title, and date.
    pub fn dedupe_key(&self) -> String {
        let guid = self.guid.trim();
        if !guid.is_empty() {
            return guid.to_string();
        }
        let input = format!("{}|{}|{}", self.link, self.title, self.pub_date);
        let hash = Sha256::digest(input.as_bytes());
        format!("{:x}", hash)
    }
}

/// Normalizes a raw RSS 2.0 or Atom XML document.
///
/// Pure function of the input text: no I/O, no clock.
///
/// # Errors
///
/// [`ParseError::MalformedFeed`] when the document has no
/// `<channel>`/`<feed>` container; [`ParseError::Xml`] when it is not
/// well-formed XML at all.
pub fn parse_feed(xml: &str) -> Result<ParsedFeed, ParseError> {
    let root = parse_document(xml)?;
    let container = find_container(&root).ok_or(ParseError::MalformedFeed)?;

    let title = text_or(container, &["title"], DEFAULT_FEED_TITLE);
    let description = alias_text(container, &["description", "subtitle"]);
    let link = link_text(container);

    let mut entry_children: Vec<&XmlElement> = children_named(container, "item");
    if entry_children.is_empty() {
        entry_children = children_named(container, "entry");
    }
    let items = entry_children.into_iter().map(parse_item).collect();

    Ok(ParsedFeed {
        title,
        description,
        link,
        items,
    })
}

/// RSS nests `<channel>` under `<rss>`; Atom's `<feed>` is the root.
fn find_container(root: &XmlElement) -> Option<&XmlElement> {
    if let Some(channel) = root.find_descendant("channel") {
        return Some(channel);
    }
    if root.local_name().eq_ignore_ascii_case("feed") {
        return Some(root);
    }
    root.find_descendant("feed")
}

fn parse_item(item: &XmlElement) -> ParsedItem {
    ParsedItem {
        title: text_or(item, &["title"], DEFAULT_ITEM_TITLE),
        link: link_text(item),
        description: alias_text(item, &["description", "summary", "content"]),
        pub_date: alias_text(item, &["pubDate", "published", "updated"]),
        author: alias_text(item, &["author", "creator"]),
        guid: alias_text(item, &["guid", "id"]),
    }
}

/// First-match-wins over the alias list: each alias is tried in order
/// against the element's direct children; a missing alias contributes
/// nothing and the final fallback is the empty string.
fn alias_text(el: &XmlElement, aliases: &[&str]) -> String {
    for alias in aliases {
        if let Some(child) = el.find_child(alias) {
            return child.text().trim().to_string();
        }
    }
    String::new()
}

fn text_or(el: &XmlElement, aliases: &[&str], default: &str) -> String {
    let value = alias_text(el, aliases);
    if value.is_empty() {
        default.to_string()
    } else {
        value
    }
}

/// `<link>` carries its URL as text in RSS but as an `href` attribute in
/// Atom; text wins when both are present, missing both yields "".
fn link_text(el: &XmlElement) -> String {
    let Some(link) = el.find_child("link") else {
        return String::new();
    };
    let text = link.text().trim().to_string();
    if !text.is_empty() {
        return text;
    }
    link.attr("href").unwrap_or_default().trim().to_string()
}

fn children_named<'a>(el: &'a XmlElement, local: &str) -> Vec<&'a XmlElement> {
    el.child_elements()
        .filter(|c| c.local_name().eq_ignore_ascii_case(local))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const RSS_SAMPLE: &str = r#"<?xml version="1.0"?>
<rss version="2.0" xmlns:dc="http://purl.org/dc/elements/1.1/">
  <channel>
    <title>  Example Blog  </title>
    <description>Commentary on examples</description>
    <link>https://example.com</link>
    <item>
      <title>First Post</title>
      <link>https://example.com/first</link>
      <description>Hello world</description>
      <pubDate>Mon, 01 Jan 2024 00:00:00 +0000</pubDate>
      <dc:creator>Ada Lovelace</dc:creator>
      <guid>post-1</guid>
    </item>
    <item>
      <title>Second Post</title>
      <link>https://example.com/second</link>
      <description><![CDATA[Contains <b>markup</b>]]></description>
    </item>
  </channel>
</rss>"#;

    const ATOM_SAMPLE: &str = r#"<?xml version="1.0"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Example Feed</title>
  <subtitle>An Atom example</subtitle>
  <link href="https://example.org/"/>
  <entry>
    <title>Atom Entry</title>
    <link href="https://example.org/entry"/>
    <summary>Entry summary</summary>
    <published>2024-01-01T00:00:00Z</published>
    <author><name>Grace Hopper</name></author>
    <id>urn:uuid:1</id>
  </entry>
</feed>"#;

    #[test]
    fn test_rss_item_count_and_fields() {
        let feed = parse_feed(RSS_SAMPLE).unwrap();
        assert_eq!(feed.title, "Example Blog");
        assert_eq!(feed.description, "Commentary on examples");
        assert_eq!(feed.link, "https://example.com");
        assert_eq!(feed.items.len(), 2);

        let first = &feed.items[0];
        assert_eq!(first.title, "First Post");
        assert_eq!(first.link, "https://example.com/first");
        assert_eq!(first.description, "Hello world");
        assert_eq!(first.pub_date, "Mon, 01 Jan 2024 00:00:00 +0000");
        assert_eq!(first.author, "Ada Lovelace");
        assert_eq!(first.guid, "post-1");
    }

    #[test]
    fn test_rss_missing_aliases_yield_defaults() {
        let second = &parse_feed(RSS_SAMPLE).unwrap().items[1];
        assert_eq!(second.pub_date, "");
        assert_eq!(second.author, "");
        assert_eq!(second.guid, "");
        assert_eq!(second.description, "Contains <b>markup</b>");
    }

    #[test]
    fn test_atom_fallbacks() {
        let feed = parse_feed(ATOM_SAMPLE).unwrap();
        assert_eq!(feed.title, "Example Feed");
        assert_eq!(feed.description, "An Atom example");
        assert_eq!(feed.link, "https://example.org/");
        assert_eq!(feed.items.len(), 1);

        let entry = &feed.items[0];
        assert_eq!(entry.title, "Atom Entry");
        assert_eq!(entry.link, "https://example.org/entry");
        assert_eq!(entry.description, "Entry summary");
        assert_eq!(entry.pub_date, "2024-01-01T00:00:00Z");
        assert_eq!(entry.author, "Grace Hopper");
        assert_eq!(entry.guid, "urn:uuid:1");
    }

    #[test]
    fn test_atom_updated_when_published_absent() {
        let xml = r#"<feed><entry><title>T</title><updated>2024-02-02T00:00:00Z</updated></entry></feed>"#;
        let feed = parse_feed(xml).unwrap();
        assert_eq!(feed.items[0].pub_date, "2024-02-02T00:00:00Z");
    }

    #[test]
    fn test_description_priority_over_summary_and_content() {
        let xml = r#"<rss><channel><item>
            <content>last</content>
            <summary>middle</summary>
            <description>first</description>
        </item></channel></rss>"#;
        let feed = parse_feed(xml).unwrap();
        assert_eq!(feed.items[0].description, "first");
    }

    #[test]
    fn test_missing_titles_get_defaults() {
        let xml = r#"<rss><channel><item><link>https://x.example</link></item></channel></rss>"#;
        let feed = parse_feed(xml).unwrap();
        assert_eq!(feed.title, "Unknown Feed");
        assert_eq!(feed.items[0].title, "Untitled");
    }

    #[test]
    fn test_malformed_feed_without_container() {
        let err = parse_feed("<html><body>not a feed</body></html>").unwrap_err();
        assert!(matches!(err, ParseError::MalformedFeed));
    }

    #[test]
    fn test_broken_xml_is_not_malformed_feed() {
        let err = parse_feed("<rss><channel>").unwrap_err();
        assert!(matches!(err, ParseError::Xml(_)));
    }

    #[test]
    fn test_published_timestamp_both_conventions() {
        let rfc2822 = ParsedItem {
            pub_date: "Mon, 01 Jan 2024 00:00:00 +0000".into(),
            ..empty_item()
        };
        let rfc3339 = ParsedItem {
            pub_date: "2024-01-01T00:00:00Z".into(),
            ..empty_item()
        };
        assert_eq!(rfc2822.published_timestamp(), Some(1704067200));
        assert_eq!(rfc3339.published_timestamp(), Some(1704067200));
        assert_eq!(empty_item().published_timestamp(), None);
    }

    #[test]
    fn test_dedupe_key_prefers_guid() {
        let with_guid = ParsedItem {
            guid: "g-1".into(),
            ..empty_item()
        };
        assert_eq!(with_guid.dedupe_key(), "g-1");

        let a = ParsedItem {
            link: "https://example.com/a".into(),
            ..empty_item()
        };
        let b = ParsedItem {
            link: "https://example.com/b".into(),
            ..empty_item()
        };
        assert_ne!(a.dedupe_key(), b.dedupe_key());
        assert_eq!(a.dedupe_key(), a.dedupe_key());
    }

    fn empty_item() -> ParsedItem {
        ParsedItem {
            title: String::new(),
            link: String::new(),
            description: String::new(),
            pub_date: String::new(),
            author: String::new(),
            guid: String::new(),
        }
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            // Item count always matches the number of <item> elements,
            // whatever the titles contain.
            #[test]
            fn item_count_matches(titles in proptest::collection::vec("[A-Za-z0-9 .,!-]{0,40}", 0..8)) {
                let items: String = titles
                    .iter()
                    .map(|t| format!("<item><title>{}</title></item>", t))
                    .collect();
                let xml = format!("<rss><channel>{}</channel></rss>", items);
                let feed = parse_feed(&xml).unwrap();
                prop_assert_eq!(feed.items.len(), titles.len());
                for (item, title) in feed.items.iter().zip(&titles) {
                    let expected = title.trim();
                    if expected.is_empty() {
                        prop_assert_eq!(item.title.as_str(), "Untitled");
                    } else {
                        prop_assert_eq!(item.title.as_str(), expected);
                    }
                }
            }
        }
    }
}
