//! Perplexity search client for recent financial news
//!
//! Perplexity exposes an OpenAI-style chat-completions endpoint whose
//! answers are grounded in live web search, which makes it usable as a
//! one-shot "recent news about TICKER" capability.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::news::SearchBackend;

const PERPLEXITY_API_URL: &str = "https://api.perplexity.ai/chat/completions";

/// Perplexity client for the news-search capability
pub struct PerplexityClient {
    client: Client,
    api_key: String,
    model: String,
    max_tokens: usize,
    temperature: f32,
    timeout: Duration,
}

impl PerplexityClient {
    /// Create a new Perplexity client
    ///
    /// # Arguments
    /// * `api_key` - Perplexity API key
    /// * `model` - Search model name (e.g., "sonar")
    /// * `max_tokens` - Output-length budget for the answer
    /// * `temperature` - Sampling temperature
    /// * `timeout` - Per-request timeout
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        max_tokens: usize,
        temperature: f32,
        timeout: Duration,
    ) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            max_tokens,
            temperature,
            timeout,
        }
    }
}

#[async_trait]
impl SearchBackend for PerplexityClient {
    async fn financial_news(&self, ticker: &str) -> Result<String> {
        debug!("Searching for financial news about: {ticker}");

        let payload = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: "You are a financial news assistant. Provide recent news and \
                              updates about the requested stock."
                        .to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: format!(
                        "Recent financial news and market updates about {ticker} stock"
                    ),
                },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(PERPLEXITY_API_URL)
            .timeout(self.timeout)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::ApiError(format!(
                "Perplexity API error {status}: {body}"
            )));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| EngineError::ApiError(format!("Failed to parse Perplexity response: {e}")))?;

        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| EngineError::ApiError("No choices in Perplexity response".to_string()))?;

        Ok(content)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: usize,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}
