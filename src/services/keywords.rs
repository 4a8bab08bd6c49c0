//! Keyword extraction over the OpenAI Chat Completions API
//!
//! Turns a free-form creator request ("calm cooking vlogs for students")
//! into a short list of YouTube search keywords.

use crate::schemas::openai::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, OpenAIErrorResponse,
};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// Constants
// ============================================================================

const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
const MAX_TOKENS: u32 = 50;
const TEMPERATURE: f32 = 0.2;

/// Default number of keywords returned
pub const DEFAULT_MAX_KEYWORDS: usize = 5;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Error, Debug)]
pub enum KeywordError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("OpenAI API key is not configured")]
    MissingApiKey,
}

// ============================================================================
// Extractor
// ============================================================================

/// Something that can pull search keywords out of a prompt
#[async_trait]
pub trait KeywordExtractor: Send + Sync {
    /// At most `max_keywords` keywords, most relevant first
    async fn extract_keywords(
        &self,
        prompt: &str,
        max_keywords: usize,
    ) -> Result<Vec<String>, KeywordError>;
}

/// Configuration for the OpenAI extractor
#[derive(Clone)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: String,
    pub timeout_seconds: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            model: DEFAULT_MODEL.to_string(),
            timeout_seconds: 30,
        }
    }
}

impl OpenAiConfig {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            ..Self::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }
}

/// Keyword extractor backed by an OpenAI-compatible chat endpoint
#[derive(Clone)]
pub struct OpenAiKeywordExtractor {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl OpenAiKeywordExtractor {
    pub fn new(config: OpenAiConfig) -> Result<Self, KeywordError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        if config.api_key.is_none() {
            tracing::warn!("OpenAI API key not configured, keyword extraction disabled");
        }

        Ok(Self {
            client,
            api_key: config.api_key,
            base_url: config
                .base_url
                .unwrap_or_else(|| OPENAI_API_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
            model: config.model,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn build_request(&self, prompt: &str, max_keywords: usize) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(system_message(max_keywords)),
                ChatMessage::user(prompt),
            ],
            temperature: Some(TEMPERATURE),
            max_tokens: Some(MAX_TOKENS),
        }
    }
}

#[async_trait]
impl KeywordExtractor for OpenAiKeywordExtractor {
    async fn extract_keywords(
        &self,
        prompt: &str,
        max_keywords: usize,
    ) -> Result<Vec<String>, KeywordError> {
        let api_key = self.api_key.as_deref().ok_or(KeywordError::MissingApiKey)?;
        let request = self.build_request(prompt, max_keywords);
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<OpenAIErrorResponse>(&body)
                .map(|err| err.error.message)
                .unwrap_or(body);
            tracing::error!(status = %status, message = %message, "OpenAI API error");
            return Err(KeywordError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| KeywordError::Parse(e.to_string()))?;

        let content = completion
            .first_content()
            .ok_or_else(|| KeywordError::Parse("Response contained no message".to_string()))?;

        let keywords = parse_keywords(content, max_keywords);
        tracing::info!(
            model = %self.model,
            keywords = ?keywords,
            "Extracted search keywords"
        );
        Ok(keywords)
    }
}

fn system_message(max_keywords: usize) -> String {
    format!(
        "You extract YouTube search keywords from a request for content creators. \
         Reply with at most {} short keywords, most relevant first, separated by commas \
         and nothing else.",
        max_keywords
    )
}

/// Split a comma-separated model reply into keywords
pub fn parse_keywords(text: &str, max_keywords: usize) -> Vec<String> {
    text.split(',')
        .map(|keyword| keyword.trim().trim_matches(|c: char| c == '"' || c == '\'').trim())
        .filter(|keyword| !keyword.is_empty())
        .take(max_keywords)
        .map(str::to_string)
        .collect()
}
