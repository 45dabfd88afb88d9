use std::collections::HashSet;
use std::time::Duration;

use futures::StreamExt;
use thiserror::Error;

use super::parser::{parse_feed, ParseError, ParsedItem};
use crate::storage::{Database, Feed, NewArticle, NewFeed};
use crate::util::validate_url;

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_FEED_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Built-in demonstration feed substituted when a feed fetch fails.
///
/// The reading list is never left empty by a transport failure; the
/// substitution is logged and reported via [`RefreshOutcome`].
pub const PLACEHOLDER_FEED_XML: &str = r#"<?xml version="1.0"?>
<rss version="2.0">
  <channel>
    <title>Sample Feed</title>
    <description>Demonstration content shown while the feed is unreachable</description>
    <link>https://example.com</link>
    <item>
      <title>Getting started with your reading list</title>
      <link>https://example.com/getting-started</link>
      <description>Save articles from the web, tag them, highlight passages, and read them any time.</description>
      <guid>satchel-demo-1</guid>
    </item>
    <item>
      <title>This feed could not be reached</title>
      <link>https://example.com/offline</link>
      <description>The feed you subscribed to did not respond. These sample entries stand in until the next successful refresh.</description>
      <guid>satchel-demo-2</guid>
    </item>
  </channel>
</rss>"#;

/// Errors covering the full feed refresh lifecycle: URL validation,
/// network issues, HTTP errors, parsing failures, and storage problems.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The user-supplied URL failed validation before any request was made.
    #[error("Invalid feed URL: {0}")]
    InvalidUrl(String),
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the 30-second timeout
    #[error("Request timed out")]
    Timeout,
    /// Response body exceeded the 10MB size limit
    #[error("Response too large")]
    ResponseTooLarge,
    /// Response body was not valid UTF-8
    #[error("Invalid UTF-8 in response")]
    InvalidUtf8,
    /// Feed XML could not be parsed as RSS or Atom
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
    /// Database operation failed while storing feed data
    #[error("Database error: {0}")]
    Database(String),
}

/// Same error enum, kept for API symmetry in the subscribe path.
pub type SubscribeError = FetchError;

/// Result of a single feed refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshOutcome {
    /// Number of new articles imported from the feed.
    pub new_articles: usize,
    /// True when the placeholder document stood in for an unreachable feed.
    pub used_placeholder: bool,
}

/// Fetches a feed document and returns its body as text.
///
/// Transport policy: 30-second timeout, non-2xx rejected, body capped at
/// 10MB, UTF-8 required. No placeholder substitution happens at this
/// layer; that policy belongs to [`refresh_feed`] and [`subscribe`].
///
/// # Errors
///
/// Returns the transport-flavored [`FetchError`] variants only.
pub async fn fetch_feed_xml(client: &reqwest::Client, url: &str) -> Result<String, FetchError> {
    let response = tokio::time::timeout(FETCH_TIMEOUT, client.get(url).send())
        .await
        .map_err(|_| FetchError::Timeout)?
        .map_err(FetchError::Network)?;

    if !response.status().is_success() {
        return Err(FetchError::HttpStatus(response.status().as_u16()));
    }

    read_limited_text(response, MAX_FEED_SIZE).await
}

/// Subscribes to a feed: validates the URL, fetches and parses the
/// document, stores the feed record, and imports its current items.
///
/// A transport failure degrades to the placeholder document so the new
/// subscription still shows content; validation, parse, and storage
/// failures are surfaced.
///
/// # Errors
///
/// [`FetchError::InvalidUrl`], [`FetchError::Parse`], or
/// [`FetchError::Database`].
pub async fn subscribe(
    db: &Database,
    client: &reqwest::Client,
    url: &str,
) -> Result<i64, SubscribeError> {
    validate_url(url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;

    let (xml, used_placeholder) = fetch_or_placeholder(client, url).await;
    let parsed = parse_feed(&xml)?;

    let feed_id = db
        .save_feed(NewFeed {
            url: url.to_string(),
            title: parsed.title.clone(),
            description: parsed.description.clone(),
            ..Default::default()
        })
        .await
        .map_err(|e| FetchError::Database(e.to_string()))?;

    let imported = import_items(db, feed_id, &parsed.items, &HashSet::new()).await?;
    db.touch_feed(feed_id)
        .await
        .map_err(|e| FetchError::Database(e.to_string()))?;

    tracing::info!(
        feed_id = feed_id,
        url = %url,
        imported = imported,
        used_placeholder = used_placeholder,
        "Subscribed to feed"
    );
    Ok(feed_id)
}

/// Refreshes one feed: fetch, parse, import items not already stored,
/// and stamp the feed's `last_updated`.
///
/// Already-imported items are recognized by [`ParsedItem::dedupe_key`]
/// against the feed's existing articles. The fetch → parse → N inserts →
/// touch sequence is a series of independent writes; a crash mid-way can
/// leave a partially imported batch, which the dedupe pass repairs on the
/// next refresh.
///
/// # Errors
///
/// [`FetchError::Parse`] or [`FetchError::Database`]; transport failures
/// are absorbed by the placeholder policy.
pub async fn refresh_feed(
    db: &Database,
    client: &reqwest::Client,
    feed: &Feed,
) -> Result<RefreshOutcome, FetchError> {
    let (xml, used_placeholder) = fetch_or_placeholder(client, &feed.url).await;
    let parsed = parse_feed(&xml)?;

    let existing: HashSet<String> = db
        .get_articles_for_feed(feed.id)
        .await
        .map_err(|e| FetchError::Database(e.to_string()))?
        .into_iter()
        .filter_map(|a| a.guid)
        .collect();

    let new_articles = import_items(db, feed.id, &parsed.items, &existing).await?;
    db.touch_feed(feed.id)
        .await
        .map_err(|e| FetchError::Database(e.to_string()))?;

    tracing::debug!(
        feed_id = feed.id,
        new_articles = new_articles,
        used_placeholder = used_placeholder,
        "Feed refreshed"
    );
    Ok(RefreshOutcome {
        new_articles,
        used_placeholder,
    })
}

async fn fetch_or_placeholder(client: &reqwest::Client, url: &str) -> (String, bool) {
    match fetch_feed_xml(client, url).await {
        Ok(xml) => (xml, false),
        Err(e) => {
            tracing::warn!(url = %url, error = %e, "Feed fetch failed, substituting placeholder content");
            (PLACEHOLDER_FEED_XML.to_string(), true)
        }
    }
}

/// Inserts each item whose dedupe key is not already present. One insert
/// per item, no batch transaction (matches the store's contract of
/// independent writes).
async fn import_items(
    db: &Database,
    feed_id: i64,
    items: &[ParsedItem],
    existing: &HashSet<String>,
) -> Result<usize, FetchError> {
    let mut inserted = 0;
    for item in items {
        let key = item.dedupe_key();
        if existing.contains(&key) {
            continue;
        }
        db.save_article(NewArticle {
            feed_id: Some(feed_id),
            guid: Some(key),
            title: item.title.clone(),
            author: none_if_empty(&item.author),
            published: item.published_timestamp(),
            content: item.description.clone(),
            url: none_if_empty(&item.link),
            ..Default::default()
        })
        .await
        .map_err(|e| FetchError::Database(e.to_string()))?;
        inserted += 1;
    }
    Ok(inserted)
}

fn none_if_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

async fn read_limited_text(
    response: reqwest::Response,
    limit: usize,
) -> Result<String, FetchError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    String::from_utf8(bytes).map_err(|_| FetchError::InvalidUtf8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const VALID_RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
    <title>Wire Feed</title>
    <item><guid>1</guid><title>One</title><link>https://example.com/1</link></item>
    <item><guid>2</guid><title>Two</title><link>https://example.com/2</link></item>
</channel></rss>"#;

    async fn test_db() -> Database {
        Database::open(":memory:").await.unwrap()
    }

    async fn seeded_feed(db: &Database, url: &str) -> Feed {
        let id = db
            .save_feed(NewFeed {
                url: url.to_string(),
                title: "Wire Feed".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        db.get_feed(id).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_fetch_feed_xml_success() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(VALID_RSS))
            .mount(&mock_server)
            .await;

        let client = reqwest::Client::new();
        let xml = fetch_feed_xml(&client, &format!("{}/feed", mock_server.uri()))
            .await
            .unwrap();
        assert!(xml.contains("Wire Feed"));
    }

    #[tokio::test]
    async fn test_fetch_feed_xml_http_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let client = reqwest::Client::new();
        let err = fetch_feed_xml(&client, &format!("{}/feed", mock_server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::HttpStatus(404)));
    }

    #[tokio::test]
    async fn test_refresh_imports_items() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(VALID_RSS))
            .mount(&mock_server)
            .await;

        let db = test_db().await;
        let feed = seeded_feed(&db, &format!("{}/feed", mock_server.uri())).await;
        let client = reqwest::Client::new();

        let outcome = refresh_feed(&db, &client, &feed).await.unwrap();
        assert_eq!(outcome.new_articles, 2);
        assert!(!outcome.used_placeholder);

        let articles = db.get_articles_for_feed(feed.id).await.unwrap();
        assert_eq!(articles.len(), 2);
        assert!(articles.iter().all(|a| a.feed_id == Some(feed.id)));

        let refreshed = db.get_feed(feed.id).await.unwrap().unwrap();
        assert!(refreshed.last_updated.is_some());
    }

    #[tokio::test]
    async fn test_refresh_deduplicates_on_second_pass() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(VALID_RSS))
            .mount(&mock_server)
            .await;

        let db = test_db().await;
        let feed = seeded_feed(&db, &format!("{}/feed", mock_server.uri())).await;
        let client = reqwest::Client::new();

        let first = refresh_feed(&db, &client, &feed).await.unwrap();
        let second = refresh_feed(&db, &client, &feed).await.unwrap();
        assert_eq!(first.new_articles, 2);
        assert_eq!(second.new_articles, 0);
        assert_eq!(db.get_articles_for_feed(feed.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_refresh_falls_back_to_placeholder() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let db = test_db().await;
        let feed = seeded_feed(&db, &format!("{}/feed", mock_server.uri())).await;
        let client = reqwest::Client::new();

        let outcome = refresh_feed(&db, &client, &feed).await.unwrap();
        assert!(outcome.used_placeholder);
        assert_eq!(outcome.new_articles, 2);

        let articles = db.get_articles_for_feed(feed.id).await.unwrap();
        assert!(articles
            .iter()
            .any(|a| a.title.contains("Getting started")));
    }

    #[tokio::test]
    async fn test_subscribe_rejects_invalid_urls() {
        let db = test_db().await;
        let client = reqwest::Client::new();

        let err = subscribe(&db, &client, "not a url").await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl(_)));

        // SSRF policy applies before any fetch
        let err = subscribe(&db, &client, "http://127.0.0.1/feed")
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl(_)));
        assert!(db.get_feeds().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_feed_surfaces_parse_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>nope</body></html>"))
            .mount(&mock_server)
            .await;

        let db = test_db().await;
        let feed = seeded_feed(&db, &format!("{}/feed", mock_server.uri())).await;
        let client = reqwest::Client::new();

        let err = refresh_feed(&db, &client, &feed).await.unwrap_err();
        assert!(matches!(err, FetchError::Parse(ParseError::MalformedFeed)));
    }

    #[tokio::test]
    async fn test_placeholder_document_parses() {
        let parsed = parse_feed(PLACEHOLDER_FEED_XML).unwrap();
        assert_eq!(parsed.title, "Sample Feed");
        assert_eq!(parsed.items.len(), 2);
    }
}
