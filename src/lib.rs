//! Read-later core library: subscribe to RSS/Atom feeds, capture web pages
//! as markdown, annotate and highlight saved articles, and request
//! AI-generated summaries, all persisted in an embedded SQLite database.
//!
//! # Architecture
//!
//! - [`storage`] - Durable keyed storage for feeds, articles, highlights,
//!   and settings, with simple secondary lookups
//! - [`feed`] - RSS/Atom parsing plus HTTP fetching with placeholder
//!   fallback on transport failure
//! - [`content`] - HTML-to-markdown capture: metadata extraction,
//!   non-content stripping, content-root selection, rule-table conversion
//! - [`summarize`] - Pass-through client for an external chat-completion
//!   endpoint
//! - [`export`] - Markdown/HTML/JSON renderings of a single article
//! - [`util`] - URL validation shared by the fetch layers
//!
//! The store is an explicit handle ([`storage::Database`]) passed into
//! every component that needs it. There is no global state: a handle only
//! exists after the schema has been established, so "store accessed before
//! init" is unrepresentable.
//!
//! # Example
//!
//! ```no_run
//! use satchel::storage::{Database, NewArticle};
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let db = Database::open(":memory:").await?;
//! let id = db
//!     .save_article(NewArticle {
//!         title: "Hello".into(),
//!         content: "# Hello\n\nWorld".into(),
//!         ..Default::default()
//!     })
//!     .await?;
//! let articles = db.search_articles("hello").await?;
//! assert_eq!(articles[0].id, id);
//! # Ok(())
//! # }
//! ```

pub mod content;
pub mod export;
pub mod feed;
pub mod storage;
pub mod summarize;
pub mod util;
