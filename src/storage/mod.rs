//! Durable keyed storage over embedded SQLite.
//!
//! Four tables (`feeds`, `articles`, `highlights`, `settings`) with
//! simple secondary lookups: by feed, by read-state, by tag. The store
//! is an explicit handle: [`Database::open`] establishes the schema
//! (idempotently; safe to call any number of times) and returns the only
//! means of issuing operations, so an "uninitialized store" cannot be
//! observed.
//!
//! Write semantics worth knowing:
//!
//! - `update_*` operations are **upserts**: a full-record overwrite by id
//!   that inserts when the id is absent, matching the put-style primitive
//!   of the original design.
//! - Deleting a feed or article honors the handle's [`DeletePolicy`].
//!   The default, [`DeletePolicy::Orphan`], deletes only the named record
//!   and leaves dependents in place (the observed behavior this store
//!   reimplements); [`DeletePolicy::Cascade`] removes a feed's articles
//!   and an article's highlights along with it.
//! - Article→feed references are soft; highlight→article references are
//!   checked at insert time only.

mod articles;
mod feeds;
mod highlights;
mod schema;
mod search;
mod settings;
mod types;

pub use schema::Database;
pub use settings::PromptTemplate;
pub use types::{
    Article, DatabaseError, DeletePolicy, Feed, Highlight, NewArticle, NewFeed, NewHighlight,
};
