//! LLM provider abstractions for visa-runtime.
//!
//! The assessment only needs one capability from a model: take a prompt and
//! return JSON text that follows a response schema. Providers implement
//! [`LlmProvider`] and are created by name through a [`ProviderRegistry`].
//!
//! ## Security
//!
//! All providers hold their API key in an [`ApiCredential`], which never
//! prints its value.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::time::Duration;
use thiserror::Error;

mod factory;
mod gemini;
pub mod secrets;

pub use factory::{ProviderFactory, ProviderRegistry};
pub use gemini::{GeminiProvider, GeminiProviderFactory, DEFAULT_GEMINI_MODEL, GEMINI_API_KEY_ENVS};
pub use secrets::{ApiCredential, CredentialSource};

/// Errors from LLM providers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    #[error("Rate limit exceeded, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    ParseError(String),

    #[error("Authentication failed")]
    AuthError,

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Provider returned no content")]
    EmptyResponse,

    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

impl ProviderError {
    /// Whether a retry has a chance of succeeding.
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::HttpError(_)
            | ProviderError::RateLimited { .. }
            | ProviderError::Timeout(_) => true,
            ProviderError::ApiError { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Configuration for a completion request.
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    /// Model to use
    pub model: String,

    /// Maximum tokens to generate
    pub max_tokens: u32,

    pub temperature: f32,

    /// Request timeout
    pub timeout: Duration,

    /// Ask for `application/json` output following this schema
    pub response_schema: Option<JsonValue>,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_GEMINI_MODEL.to_string(),
            max_tokens: 4096,
            temperature: 0.2,
            timeout: Duration::from_secs(60),
            response_schema: None,
        }
    }
}

impl CompletionConfig {
    /// Read `model`, `max_tokens`, `temperature` and `timeout` (humantime,
    /// e.g. "60s") from provider JSON config. Missing keys keep defaults.
    pub fn from_json(config: &JsonValue) -> Result<Self, ProviderError> {
        let mut out = Self::default();

        if let Some(model) = config["model"].as_str() {
            out.model = model.to_string();
        }
        if let Some(max_tokens) = config["max_tokens"].as_u64() {
            out.max_tokens = u32::try_from(max_tokens).map_err(|_| {
                ProviderError::NotConfigured(format!("max_tokens out of range: {}", max_tokens))
            })?;
        }
        if let Some(temperature) = config["temperature"].as_f64() {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(ProviderError::NotConfigured(format!(
                    "temperature must be between 0 and 2, got {}",
                    temperature
                )));
            }
            out.temperature = temperature as f32;
        }
        match &config["timeout"] {
            JsonValue::String(text) => {
                out.timeout = humantime::parse_duration(text).map_err(|e| {
                    ProviderError::NotConfigured(format!("invalid timeout '{}': {}", text, e))
                })?;
            }
            JsonValue::Number(secs) => {
                if let Some(secs) = secs.as_u64() {
                    out.timeout = Duration::from_secs(secs);
                }
            }
            _ => {}
        }

        Ok(out)
    }
}

/// A chat message for LLM completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role: "system", "user", or "assistant"
    pub role: String,

    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Response from an LLM completion.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Generated content
    pub content: String,

    pub usage: TokenUsage,

    /// Model that served the request
    pub model: String,

    pub stop_reason: Option<String>,
}

/// Token usage from a completion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl TokenUsage {
    pub fn total(&self) -> u32 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// Provider abstraction allows swapping LLM backends.
///
/// This is the only place where network calls to a model are made.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Execute a chat completion.
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        config: &CompletionConfig,
    ) -> Result<CompletionResponse, ProviderError>;

    /// Check if provider is usable.
    async fn health_check(&self) -> bool;

    /// Provider name for logs.
    fn name(&self) -> &str;

    /// Rough token estimate for a prompt.
    fn estimate_tokens(&self, text: &str) -> u32 {
        // ~4 chars per token
        (text.len() / 4) as u32
    }
}
