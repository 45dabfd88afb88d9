//! Client for the external summarization endpoint.
//!
//! A deliberately thin pass-through: the endpoint is an opaque
//! chat-completion API. We send the user's prompt followed by the article
//! body and return `choices[0].message.content` verbatim. The only local
//! intelligence is credential validation (a missing API key fails before
//! any network I/O) and the explicit timeout. [`summarize_article`] wires
//! the client to the store: settings in, summary persisted back out.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::storage::Database;

const DEFAULT_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Client identifier sent with every request, as the endpoint requests.
const CLIENT_TITLE: &str = "satchel";

/// Model used when the caller has not configured one.
pub const DEFAULT_MODEL: &str = "mistralai/mistral-small-3.1-24b-instruct";

/// Prompt used when the caller has not selected a template.
pub const DEFAULT_PROMPT: &str =
    "Summarize the following article in a few short paragraphs, keeping the key facts and conclusions:";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const TEMPERATURE: f32 = 0.7;
const MAX_TOKENS: u32 = 1000;

/// Errors produced while requesting a summary.
#[derive(Debug, Error)]
pub enum SummarizeError {
    /// No API key configured; rejected before any network attempt.
    #[error("No API key configured for summarization")]
    MissingApiKey,
    /// The endpoint base URL must be HTTPS (localhost excepted, for tests).
    #[error("Insecure endpoint URL: HTTPS required")]
    InsecureEndpoint,
    /// Request exceeded the 30-second timeout
    #[error("Summarization request timed out")]
    Timeout,
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// Non-2xx response, carrying the HTTP status text
    #[error("Summarization failed: HTTP {status} {reason}")]
    HttpStatus { status: u16, reason: String },
    /// The response body did not contain a summary
    #[error("Malformed response from summarization endpoint")]
    MalformedResponse,
    /// The article to summarize is not in the store
    #[error("Article {0} not found")]
    UnknownArticle(i64),
    /// Reading settings or writing the summary back failed
    #[error("Database error: {0}")]
    Storage(String),
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

/// Summarization client bound to one endpoint.
pub struct Summarizer {
    client: reqwest::Client,
    base_url: String,
}

impl Summarizer {
    /// Client against the fixed production endpoint.
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: DEFAULT_API_URL.to_string(),
        }
    }

    /// Client against a custom endpoint. Exists for tests against a local
    /// mock server; non-HTTPS URLs are rejected at request time unless
    /// they point at localhost.
    pub fn with_base_url(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Request a summary of `article` using the given prompt and model.
    ///
    /// # Errors
    ///
    /// [`SummarizeError::MissingApiKey`] when the key is empty or blank,
    /// checked before any network attempt. Transport and endpoint
    /// failures map to the remaining variants; none of them are fatal to
    /// anything beyond this one request.
    pub async fn summarize(
        &self,
        api_key: &SecretString,
        model: &str,
        prompt: &str,
        article: &str,
    ) -> Result<String, SummarizeError> {
        if api_key.expose_secret().trim().is_empty() {
            return Err(SummarizeError::MissingApiKey);
        }

        // An API key travels in the header, so refuse plaintext endpoints
        if !self.base_url.starts_with("https://") {
            let is_localhost = self.base_url.starts_with("http://127.0.0.1")
                || self.base_url.starts_with("http://localhost");
            if !is_localhost {
                return Err(SummarizeError::InsecureEndpoint);
            }
        }

        let request = ChatRequest {
            model,
            messages: vec![ChatMessage {
                role: "user",
                content: format!("{}\n\n{}", prompt, article),
            }],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let send = self
            .client
            .post(&self.base_url)
            .header(
                "Authorization",
                format!("Bearer {}", api_key.expose_secret()),
            )
            .header("X-Title", CLIENT_TITLE)
            .json(&request)
            .send();

        let response = tokio::time::timeout(REQUEST_TIMEOUT, send)
            .await
            .map_err(|_| SummarizeError::Timeout)?
            .map_err(SummarizeError::Network)?;

        let status = response.status();
        if !status.is_success() {
            return Err(SummarizeError::HttpStatus {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|_| SummarizeError::MalformedResponse)?;

        let summary = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or(SummarizeError::MalformedResponse)?;

        tracing::debug!(model = %model, summary_len = summary.len(), "Summary received");
        Ok(summary)
    }
}

/// Summarize a stored article and persist the result on its `summary`
/// field.
///
/// Settings resolution: the API key comes from the store and is required;
/// the model falls back to [`DEFAULT_MODEL`]; the prompt is the active
/// template if one is selected and present, else [`DEFAULT_PROMPT`].
///
/// # Errors
///
/// [`SummarizeError::MissingApiKey`] when no key is configured (checked
/// before any network attempt), [`SummarizeError::UnknownArticle`] when
/// the id does not resolve, plus the client's transport errors.
pub async fn summarize_article(
    db: &Database,
    summarizer: &Summarizer,
    article_id: i64,
) -> Result<String, SummarizeError> {
    let api_key = db
        .get_api_key()
        .await
        .map_err(|e| SummarizeError::Storage(e.to_string()))?
        .ok_or(SummarizeError::MissingApiKey)?;

    let model = db
        .get_model()
        .await
        .map_err(|e| SummarizeError::Storage(e.to_string()))?
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());

    let prompt = resolve_prompt(db).await?;

    let mut article = db
        .get_article(article_id)
        .await
        .map_err(|e| SummarizeError::Storage(e.to_string()))?
        .ok_or(SummarizeError::UnknownArticle(article_id))?;

    let summary = summarizer
        .summarize(&api_key, &model, &prompt, &article.content)
        .await?;

    article.summary = Some(summary.clone());
    db.update_article(&article)
        .await
        .map_err(|e| SummarizeError::Storage(e.to_string()))?;

    Ok(summary)
}

async fn resolve_prompt(db: &Database) -> Result<String, SummarizeError> {
    let active = db
        .get_active_prompt()
        .await
        .map_err(|e| SummarizeError::Storage(e.to_string()))?;
    if let Some(active) = active {
        let templates = db
            .get_prompt_templates()
            .await
            .map_err(|e| SummarizeError::Storage(e.to_string()))?;
        if let Some(template) = templates.into_iter().find(|t| t.id == active) {
            return Ok(template.prompt);
        }
        tracing::warn!(prompt_id = %active, "Selected prompt template not found, using default");
    }
    Ok(DEFAULT_PROMPT.to_string())
}
