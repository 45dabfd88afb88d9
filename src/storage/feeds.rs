use anyhow::Result;

use super::schema::Database;
use super::types::{DeletePolicy, Feed, NewFeed};

/// Refresh interval applied when a new feed does not specify one.
const DEFAULT_REFRESH_MINUTES: i64 = 60;

#[derive(Debug, sqlx::FromRow)]
struct FeedRow {
    id: i64,
    url: String,
    title: String,
    description: String,
    category: Option<String>,
    last_updated: Option<i64>,
    refresh_minutes: i64,
    icon: Option<String>,
}

impl FeedRow {
    fn into_feed(self) -> Feed {
        Feed {
            id: self.id,
            url: self.url,
            title: self.title,
            description: self.description,
            category: self.category,
            last_updated: self.last_updated,
            refresh_minutes: self.refresh_minutes,
            icon: self.icon,
        }
    }
}

impl Database {
    // ========================================================================
    // Feed Operations
    // ========================================================================

    /// Persist a new feed and return its generated identifier.
    pub async fn save_feed(&self, feed: NewFeed) -> Result<i64> {
        let refresh_minutes = if feed.refresh_minutes > 0 {
            feed.refresh_minutes
        } else {
            DEFAULT_REFRESH_MINUTES
        };
        let result = sqlx::query(
            r#"
            INSERT INTO feeds (url, title, description, category, refresh_minutes, icon)
            VALUES (?, ?, ?, ?, ?, ?)
        "#,
        )
        .bind(&feed.url)
        .bind(&feed.title)
        .bind(&feed.description)
        .bind(&feed.category)
        .bind(refresh_minutes)
        .bind(&feed.icon)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// All subscribed feeds, ordered by title for stable listings.
    pub async fn get_feeds(&self) -> Result<Vec<Feed>> {
        let rows: Vec<FeedRow> = sqlx::query_as(
            r#"
            SELECT id, url, title, description, category, last_updated, refresh_minutes, icon
            FROM feeds
            ORDER BY title
        "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(FeedRow::into_feed).collect())
    }

    /// A single feed by identifier.
    pub async fn get_feed(&self, id: i64) -> Result<Option<Feed>> {
        let row: Option<FeedRow> = sqlx::query_as(
            r#"
            SELECT id, url, title, description, category, last_updated, refresh_minutes, icon
            FROM feeds
            WHERE id = ?
        "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(FeedRow::into_feed))
    }

    /// Full-record overwrite by identifier (upsert: inserts when the id
    /// does not exist yet).
    pub async fn update_feed(&self, feed: &Feed) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO feeds (id, url, title, description, category, last_updated, refresh_minutes, icon)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                url = excluded.url,
                title = excluded.title,
                description = excluded.description,
                category = excluded.category,
                last_updated = excluded.last_updated,
                refresh_minutes = excluded.refresh_minutes,
                icon = excluded.icon
        "#,
        )
        .bind(feed.id)
        .bind(&feed.url)
        .bind(&feed.title)
        .bind(&feed.description)
        .bind(&feed.category)
        .bind(feed.last_updated)
        .bind(feed.refresh_minutes)
        .bind(&feed.icon)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Stamp a feed's `last_updated` with the current time.
    pub async fn touch_feed(&self, id: i64) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        sqlx::query("UPDATE feeds SET last_updated = ? WHERE id = ?")
            .bind(now)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Delete a feed, applying the handle's [`DeletePolicy`] to its
    /// articles. Under `Cascade`, the articles' highlights go too.
    pub async fn delete_feed(&self, id: i64) -> Result<()> {
        if self.delete_policy == DeletePolicy::Cascade {
            sqlx::query(
                "DELETE FROM highlights WHERE article_id IN (SELECT id FROM articles WHERE feed_id = ?)",
            )
            .bind(id)
            .execute(&self.pool)
            .await?;
            sqlx::query("DELETE FROM articles WHERE feed_id = ?")
                .bind(id)
                .execute(&self.pool)
                .await?;
        }
        sqlx::query("DELETE FROM feeds WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
