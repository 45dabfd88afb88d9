use anyhow::Result;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use super::schema::Database;

// Settings keys, dotted convention
const KEY_API_KEY: &str = "summarize.api_key";
const KEY_MODEL: &str = "summarize.model";
const KEY_ACTIVE_PROMPT: &str = "summarize.prompt";
const KEY_PROMPT_TEMPLATES: &str = "summarize.templates";

/// A user-defined summarization prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptTemplate {
    /// Identifier referenced by the active-prompt setting.
    pub id: String,
    /// Display name.
    pub name: String,
    /// The prompt text sent ahead of the article body.
    pub prompt: String,
}

impl Database {
    // ========================================================================
    // Settings Operations
    // ========================================================================

    /// Get a single setting value by key, or `None` if not set.
    pub async fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|(value,)| value))
    }

    /// Set a setting value (UPSERT, last write wins).
    pub async fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO settings (key, value, updated_at)
            VALUES (?, ?, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
        "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // ------------------------------------------------------------------------
    // Typed accessors for the summarization settings
    // ------------------------------------------------------------------------

    /// The stored API key, wrapped so it never lands in logs or debug
    /// output by accident.
    pub async fn get_api_key(&self) -> Result<Option<SecretString>> {
        Ok(self.get_setting(KEY_API_KEY).await?.map(SecretString::from))
    }

    pub async fn set_api_key(&self, key: &str) -> Result<()> {
        self.set_setting(KEY_API_KEY, key).await
    }

    /// Preferred model identifier for summarization.
    pub async fn get_model(&self) -> Result<Option<String>> {
        self.get_setting(KEY_MODEL).await
    }

    pub async fn set_model(&self, model: &str) -> Result<()> {
        self.set_setting(KEY_MODEL, model).await
    }

    /// Identifier of the currently selected prompt template.
    pub async fn get_active_prompt(&self) -> Result<Option<String>> {
        self.get_setting(KEY_ACTIVE_PROMPT).await
    }

    pub async fn set_active_prompt(&self, prompt_id: &str) -> Result<()> {
        self.set_setting(KEY_ACTIVE_PROMPT, prompt_id).await
    }

    /// The user-defined prompt template list (empty when never set).
    pub async fn get_prompt_templates(&self) -> Result<Vec<PromptTemplate>> {
        match self.get_setting(KEY_PROMPT_TEMPLATES).await? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    pub async fn set_prompt_templates(&self, templates: &[PromptTemplate]) -> Result<()> {
        let json = serde_json::to_string(templates)?;
        self.set_setting(KEY_PROMPT_TEMPLATES, &json).await
    }
}
