use anyhow::Result;

use super::schema::Database;
use super::types::{dedupe_tags, Article, ArticleRow, DeletePolicy, NewArticle};

const SELECT_ARTICLE: &str = r#"
    SELECT id, feed_id, guid, title, author, published, content,
           summary, url, read, tags, notes, saved_at
    FROM articles
"#;

impl Database {
    // ========================================================================
    // Article Operations
    // ========================================================================

    /// Persist a new article and return its generated identifier.
    /// Duplicate tags are dropped (first occurrence wins).
    pub async fn save_article(&self, article: NewArticle) -> Result<i64> {
        let tags = serde_json::to_string(&dedupe_tags(&article.tags))?;
        let saved_at = chrono::Utc::now().timestamp();

        let result = sqlx::query(
            r#"
            INSERT INTO articles (feed_id, guid, title, author, published, content,
                                  summary, url, read, tags, notes, saved_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
        )
        .bind(article.feed_id)
        .bind(&article.guid)
        .bind(&article.title)
        .bind(&article.author)
        .bind(article.published)
        .bind(&article.content)
        .bind(&article.summary)
        .bind(&article.url)
        .bind(article.read)
        .bind(&tags)
        .bind(&article.notes)
        .bind(saved_at)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// All articles, in no particular order; callers sort.
    pub async fn get_articles(&self) -> Result<Vec<Article>> {
        let rows: Vec<ArticleRow> = sqlx::query_as(SELECT_ARTICLE)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(ArticleRow::into_article).collect())
    }

    /// A single article by identifier.
    pub async fn get_article(&self, id: i64) -> Result<Option<Article>> {
        let row: Option<ArticleRow> =
            sqlx::query_as(&format!("{} WHERE id = ?", SELECT_ARTICLE))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(ArticleRow::into_article))
    }

    /// All articles belonging to one feed.
    pub async fn get_articles_for_feed(&self, feed_id: i64) -> Result<Vec<Article>> {
        let rows: Vec<ArticleRow> =
            sqlx::query_as(&format!("{} WHERE feed_id = ?", SELECT_ARTICLE))
                .bind(feed_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(ArticleRow::into_article).collect())
    }

    /// Articles filtered by read-state.
    pub async fn get_articles_by_read(&self, read: bool) -> Result<Vec<Article>> {
        let rows: Vec<ArticleRow> =
            sqlx::query_as(&format!("{} WHERE read = ?", SELECT_ARTICLE))
                .bind(read)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(ArticleRow::into_article).collect())
    }

    /// Articles carrying the given tag (exact match). Tags live in a JSON
    /// column, so this filters after a table scan; fine at a personal
    /// corpus scale.
    pub async fn get_articles_by_tag(&self, tag: &str) -> Result<Vec<Article>> {
        let articles = self.get_articles().await?;
        Ok(articles
            .into_iter()
            .filter(|a| a.tags.iter().any(|t| t == tag))
            .collect())
    }

    /// Full-record overwrite by identifier (upsert: inserts when the id
    /// does not exist yet). Tags are deduplicated here too.
    pub async fn update_article(&self, article: &Article) -> Result<()> {
        let tags = serde_json::to_string(&dedupe_tags(&article.tags))?;
        sqlx::query(
            r#"
            INSERT INTO articles (id, feed_id, guid, title, author, published, content,
                                  summary, url, read, tags, notes, saved_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                feed_id = excluded.feed_id,
                guid = excluded.guid,
                title = excluded.title,
                author = excluded.author,
                published = excluded.published,
                content = excluded.content,
                summary = excluded.summary,
                url = excluded.url,
                read = excluded.read,
                tags = excluded.tags,
                notes = excluded.notes,
                saved_at = excluded.saved_at
        "#,
        )
        .bind(article.id)
        .bind(article.feed_id)
        .bind(&article.guid)
        .bind(&article.title)
        .bind(&article.author)
        .bind(article.published)
        .bind(&article.content)
        .bind(&article.summary)
        .bind(&article.url)
        .bind(article.read)
        .bind(&tags)
        .bind(&article.notes)
        .bind(article.saved_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Set an article's read flag.
    pub async fn set_read(&self, id: i64, read: bool) -> Result<()> {
        sqlx::query("UPDATE articles SET read = ? WHERE id = ?")
            .bind(read)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Delete an article, applying the handle's [`DeletePolicy`] to its
    /// highlights.
    pub async fn delete_article(&self, id: i64) -> Result<()> {
        if self.delete_policy == DeletePolicy::Cascade {
            sqlx::query("DELETE FROM highlights WHERE article_id = ?")
                .bind(id)
                .execute(&self.pool)
                .await?;
        }
        sqlx::query("DELETE FROM articles WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
