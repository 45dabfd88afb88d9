//! Feed management: RSS/Atom parsing and HTTP fetching.
//!
//! This module turns a raw XML document into normalized feed data and
//! keeps subscriptions fresh:
//!
//! - [`xml`] - Generic XML element tree built on `quick-xml`, queried by
//!   local tag name
//! - [`parser`] - RSS 2.0 / Atom normalization with first-match-wins tag
//!   aliases and fixed defaults
//! - [`fetcher`] - HTTP retrieval with explicit timeouts and the
//!   placeholder fallback that keeps the reading list populated when a
//!   fetch fails
//!
//! Parsing is pure: transport concerns (timeouts, status codes, size
//! caps) live entirely in the fetcher, and a document without a
//! recognizable `<channel>`/`<feed>` container fails with
//! [`ParseError::MalformedFeed`] rather than a network-style error.

pub mod parser;
pub mod xml;

mod fetcher;

pub use fetcher::{
    fetch_feed_xml, refresh_feed, subscribe, FetchError, RefreshOutcome, SubscribeError,
    PLACEHOLDER_FEED_XML,
};
pub use parser::{parse_feed, ParseError, ParsedFeed, ParsedItem};
