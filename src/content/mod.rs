//! Page capture: HTML to markdown conversion with metadata extraction.
//!
//! The pipeline mirrors how a page flows into the reading list:
//!
//! - [`dom`] - Parses HTML (via `scraper`) into a tagged node tree
//!   (`Text | Element`), dropping non-content elements (scripts, styles,
//!   navigation chrome, ad/sidebar blocks) as the tree is built
//! - [`metadata`] - Document title and named meta tags
//! - [`markdown`] - Content-root selection by fixed selector priority and
//!   the tag-to-markdown rule table walk
//! - [`fetcher`] - HTTP retrieval with timeouts plus the fixed
//!   demonstration markdown substituted on transport failure
//!
//! Conversion is one-pass and best-effort: inline constructs (bold,
//! italic, links, images, list items) flatten any markup nested inside
//! them to plain text, while block-level recursion preserves structure.
//! That asymmetry is preserved behavior from the original converter, kept
//! for output compatibility.

pub mod dom;
pub mod markdown;
pub mod metadata;

mod fetcher;

pub use fetcher::{capture_page, fetch_page_html, FetchError, PLACEHOLDER_MARKDOWN};
pub use markdown::{convert, Converted};
pub use metadata::Metadata;
