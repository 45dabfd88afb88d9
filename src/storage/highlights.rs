use anyhow::{bail, Result};

use super::schema::Database;
use super::types::{Highlight, NewHighlight};

#[derive(Debug, sqlx::FromRow)]
struct HighlightRow {
    id: i64,
    article_id: i64,
    text: String,
    color: String,
    note: Option<String>,
    position: i64,
}

impl HighlightRow {
    fn into_highlight(self) -> Highlight {
        Highlight {
            id: self.id,
            article_id: self.article_id,
            text: self.text,
            color: self.color,
            note: self.note,
            position: self.position,
        }
    }
}

impl Database {
    // ========================================================================
    // Highlight Operations
    // ========================================================================

    /// Persist a new highlight and return its generated identifier.
    ///
    /// # Errors
    ///
    /// Fails when `article_id` does not reference an existing article;
    /// a highlight cannot be created against nothing.
    pub async fn save_highlight(&self, highlight: NewHighlight) -> Result<i64> {
        let exists: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM articles WHERE id = ?")
            .bind(highlight.article_id)
            .fetch_optional(&self.pool)
            .await?;
        if exists.is_none() {
            bail!("article {} does not exist", highlight.article_id);
        }

        let result = sqlx::query(
            r#"
            INSERT INTO highlights (article_id, text, color, note, position)
            VALUES (?, ?, ?, ?, ?)
        "#,
        )
        .bind(highlight.article_id)
        .bind(&highlight.text)
        .bind(&highlight.color)
        .bind(&highlight.note)
        .bind(highlight.position)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// An article's highlights in stable order: by position, then id.
    pub async fn get_highlights(&self, article_id: i64) -> Result<Vec<Highlight>> {
        let rows: Vec<HighlightRow> = sqlx::query_as(
            r#"
            SELECT id, article_id, text, color, note, position
            FROM highlights
            WHERE article_id = ?
            ORDER BY position, id
        "#,
        )
        .bind(article_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(HighlightRow::into_highlight).collect())
    }

    /// Full-record overwrite of an existing highlight by identifier.
    pub async fn update_highlight(&self, highlight: &Highlight) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE highlights
            SET article_id = ?, text = ?, color = ?, note = ?, position = ?
            WHERE id = ?
        "#,
        )
        .bind(highlight.article_id)
        .bind(&highlight.text)
        .bind(&highlight.color)
        .bind(&highlight.note)
        .bind(highlight.position)
        .bind(highlight.id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Delete a single highlight.
    pub async fn delete_highlight(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM highlights WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
