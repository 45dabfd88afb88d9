use serde::Serialize;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Database-specific errors with user-friendly messages
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Another instance of the application has locked the database
    #[error("Another application instance appears to be using this library. Please close it and try again.")]
    InstanceLocked,

    /// Migration failed
    #[error("Database migration failed: {0}")]
    Migration(String),

    /// Generic database error
    #[error("Database error: {0}")]
    Other(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Check if a sqlx error indicates database locking
    pub(crate) fn from_sqlx(err: sqlx::Error) -> Self {
        let error_string = err.to_string().to_lowercase();

        // SQLITE_BUSY (5), SQLITE_LOCKED (6), SQLITE_CANTOPEN (14)
        if error_string.contains("database is locked")
            || error_string.contains("database table is locked")
            || error_string.contains("sqlite_busy")
            || error_string.contains("sqlite_locked")
            || error_string.contains("unable to open database file")
        {
            return DatabaseError::InstanceLocked;
        }

        DatabaseError::Other(err)
    }
}

// ============================================================================
// Deletion Policy
// ============================================================================

/// What happens to dependent records when a feed or article is deleted.
///
/// The references involved (article→feed, highlight→article) are soft, so
/// cascade behavior is a policy choice rather than a schema constraint.
/// `Orphan` reproduces the observed behavior of the original design.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeletePolicy {
    /// Delete only the named record; dependents keep their (now dangling)
    /// reference.
    #[default]
    Orphan,
    /// Delete a feed's articles with the feed, and an article's
    /// highlights with the article.
    Cascade,
}

// ============================================================================
// Data Structures
// ============================================================================

/// A subscribed feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Feed {
    pub id: i64,
    /// Source URL the feed is fetched from (unique).
    pub url: String,
    pub title: String,
    pub description: String,
    /// User-assigned category label.
    pub category: Option<String>,
    /// Unix seconds of the last successful refresh.
    pub last_updated: Option<i64>,
    /// Desired refresh interval in minutes.
    pub refresh_minutes: i64,
    /// Optional icon reference (URL or data URI).
    pub icon: Option<String>,
}

/// Input for [`super::Database::save_feed`]; the store generates the id.
#[derive(Debug, Clone, Default)]
pub struct NewFeed {
    pub url: String,
    pub title: String,
    pub description: String,
    pub category: Option<String>,
    /// Zero means "use the default interval" (60 minutes).
    pub refresh_minutes: i64,
    pub icon: Option<String>,
}

/// A saved article, feed-derived or manually imported.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Article {
    pub id: i64,
    /// Owning feed; `None` for manually imported content. Soft reference.
    pub feed_id: Option<i64>,
    /// Feed-item identity used to deduplicate imports; `None` for manual
    /// content.
    pub guid: Option<String>,
    pub title: String,
    pub author: Option<String>,
    /// Publication time in unix seconds, when the source provided one.
    pub published: Option<i64>,
    /// Body, markdown or raw text.
    pub content: String,
    pub summary: Option<String>,
    pub url: Option<String>,
    pub read: bool,
    /// Free-form labels; no duplicates, order not meaningful.
    pub tags: Vec<String>,
    pub notes: Option<String>,
    /// Unix seconds the article entered the store.
    pub saved_at: i64,
}

/// Input for [`super::Database::save_article`]; the store generates the
/// id and `saved_at` stamp, and drops duplicate tags.
#[derive(Debug, Clone, Default)]
pub struct NewArticle {
    pub feed_id: Option<i64>,
    pub guid: Option<String>,
    pub title: String,
    pub author: Option<String>,
    pub published: Option<i64>,
    pub content: String,
    pub summary: Option<String>,
    pub url: Option<String>,
    pub read: bool,
    pub tags: Vec<String>,
    pub notes: Option<String>,
}

/// A user-marked excerpt of an article.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Highlight {
    pub id: i64,
    /// Owning article; must exist when the highlight is created.
    pub article_id: i64,
    /// The selected text span.
    pub text: String,
    /// Color tag (a name or hex value; the store does not interpret it).
    pub color: String,
    pub note: Option<String>,
    /// Stable ordering among an article's highlights.
    pub position: i64,
}

/// Input for [`super::Database::save_highlight`].
#[derive(Debug, Clone, Default)]
pub struct NewHighlight {
    pub article_id: i64,
    pub text: String,
    pub color: String,
    pub note: Option<String>,
    pub position: i64,
}

// ============================================================================
// Row Types
// ============================================================================

/// Internal row type for article queries; `tags` is stored as JSON text.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ArticleRow {
    pub id: i64,
    pub feed_id: Option<i64>,
    pub guid: Option<String>,
    pub title: String,
    pub author: Option<String>,
    pub published: Option<i64>,
    pub content: String,
    pub summary: Option<String>,
    pub url: Option<String>,
    pub read: bool,
    pub tags: String,
    pub notes: Option<String>,
    pub saved_at: i64,
}

impl ArticleRow {
    pub(crate) fn into_article(self) -> Article {
        let tags = serde_json::from_str(&self.tags).unwrap_or_else(|e| {
            tracing::warn!(article_id = self.id, error = %e, "Unreadable tags column, treating as empty");
            Vec::new()
        });
        Article {
            id: self.id,
            feed_id: self.feed_id,
            guid: self.guid,
            title: self.title,
            author: self.author,
            published: self.published,
            content: self.content,
            summary: self.summary,
            url: self.url,
            read: self.read,
            tags,
            notes: self.notes,
            saved_at: self.saved_at,
        }
    }
}

/// Deduplicate tags, preserving first occurrence order.
pub(crate) fn dedupe_tags(tags: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    tags.iter()
        .filter(|t| seen.insert(t.as_str()))
        .cloned()
        .collect()
}
