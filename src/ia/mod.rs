// src/ia/mod.rs
//! Language-model collaborator used to narrate and chart the datasets.

pub mod dashboard;

pub use dashboard::{extract_json, Analyst, InvalidReply};

use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use crate::config::GroqSettings;
use crate::error::LlmError;

const ANALYST_ROLE: &str =
    "You are an environmental analyst specialized in sustainability and ecological management.";
/// Longest user prompt sent by [`analyze`], in characters.
pub const ANALYZE_PROMPT_CHARS: usize = 4000;
const TEMPERATURE: f64 = 0.3;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[async_trait]
pub trait ChatClient: Send + Sync {
    /// One system + user exchange, returning the assistant's text.
    async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError>;
}

/// Ask for an environmental analysis. Long prompts are cut.
pub async fn analyze(client: &dyn ChatClient, prompt: &str) -> Result<String, LlmError> {
    client
        .complete(ANALYST_ROLE, truncate_chars(prompt, ANALYZE_PROMPT_CHARS))
        .await
}

/// First `max` characters of `s`, never splitting a code point.
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Groq's OpenAI-compatible chat completions endpoint.
pub struct GroqClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl GroqClient {
    pub fn new(settings: &GroqSettings) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self::with_client(client, settings))
    }

    pub fn with_client(client: reqwest::Client, settings: &GroqSettings) -> Self {
        Self {
            client,
            endpoint: format!("{}/chat/completions", settings.api_url.trim_end_matches('/')),
            api_key: settings.api_key.trim().to_string(),
            model: settings.model.clone(),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

#[async_trait]
impl ChatClient for GroqClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError> {
        if !self.is_configured() {
            return Err(LlmError::NotConfigured("GROQ_API_KEY is empty".into()));
        }

        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user }
            ],
            "temperature": TEMPERATURE,
            "stream": false,
        });
        debug!(model = %self.model, prompt_chars = user.chars().count(), "sending chat completion");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status { status, body });
        }

        let json: serde_json::Value = response.json().await?;
        json["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| LlmError::InvalidResponse("missing choices[0].message.content".into()))
    }
}
