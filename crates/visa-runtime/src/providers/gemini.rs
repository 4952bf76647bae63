//! Google Gemini provider (`generateContent` REST API).
//!
//! The HTTP call is compiled only with the `gemini` feature. Without it the
//! provider can still be created and configured, but every completion fails
//! with [`ProviderError::NotConfigured`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use std::time::Duration;

use super::{
    factory::ProviderFactory,
    secrets::{ApiCredential, CredentialSource},
    ChatMessage, CompletionConfig, CompletionResponse, LlmProvider, ProviderError, TokenUsage,
};

/// Environment variables checked for the API key, in order.
pub const GEMINI_API_KEY_ENVS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-3-pro-preview";

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini provider.
pub struct GeminiProvider {
    credential: ApiCredential,
    base_url: String,
    #[cfg(feature = "gemini")]
    client: reqwest::Client,
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("credential", &self.credential)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl GeminiProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_credential(
            ApiCredential::new(api_key, CredentialSource::Programmatic, "Gemini API key"),
            DEFAULT_BASE_URL.to_string(),
        )
    }

    /// Create from JSON config (`api_key`, `base_url`), falling back to
    /// `GEMINI_API_KEY` then `API_KEY` for the key.
    pub fn from_config(config: &JsonValue) -> Result<Self, ProviderError> {
        let credential = ApiCredential::from_config_or_env(
            config,
            "api_key",
            &GEMINI_API_KEY_ENVS,
            "Gemini API key",
        )?;

        let base_url = config["base_url"]
            .as_str()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
            .to_string();

        Ok(Self::with_credential(credential, base_url))
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn with_credential(credential: ApiCredential, base_url: String) -> Self {
        Self {
            credential,
            base_url,
            #[cfg(feature = "gemini")]
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }
}

/// `generateContent` request body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<JsonValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
    #[serde(default)]
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    #[serde(default)]
    message: String,
}

fn text_part(text: String) -> Part {
    Part { text: Some(text) }
}

/// Map chat messages onto Gemini's contents. System messages become the
/// system instruction; assistant turns use the `model` role.
#[cfg_attr(not(feature = "gemini"), allow(dead_code))]
fn build_request(messages: Vec<ChatMessage>, config: &CompletionConfig) -> GenerateRequest {
    let mut system = Vec::new();
    let mut contents = Vec::new();

    for msg in messages {
        match msg.role.as_str() {
            "system" => system.push(text_part(msg.content)),
            "assistant" => contents.push(Content {
                role: Some("model".to_string()),
                parts: vec![text_part(msg.content)],
            }),
            _ => contents.push(Content {
                role: Some("user".to_string()),
                parts: vec![text_part(msg.content)],
            }),
        }
    }

    GenerateRequest {
        contents,
        system_instruction: (!system.is_empty()).then(|| Content {
            role: None,
            parts: system,
        }),
        generation_config: GenerationConfig {
            temperature: config.temperature,
            max_output_tokens: config.max_tokens,
            response_mime_type: config.response_schema.as_ref().map(|_| "application/json"),
            response_schema: config.response_schema.clone(),
        },
    }
}

/// Join the text parts of the first candidate.
#[cfg_attr(not(feature = "gemini"), allow(dead_code))]
fn into_completion(body: GenerateResponse, requested_model: &str) -> Result<CompletionResponse, ProviderError> {
    let usage = body
        .usage_metadata
        .map(|u| TokenUsage {
            prompt_tokens: u.prompt_token_count,
            completion_tokens: u.candidates_token_count,
        })
        .unwrap_or_default();

    let candidate = body
        .candidates
        .into_iter()
        .next()
        .ok_or(ProviderError::EmptyResponse)?;

    let content: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if content.trim().is_empty() {
        return Err(ProviderError::EmptyResponse);
    }

    Ok(CompletionResponse {
        content,
        usage,
        model: body
            .model_version
            .unwrap_or_else(|| requested_model.to_string()),
        stop_reason: candidate.finish_reason,
    })
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    #[cfg(feature = "gemini")]
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        config: &CompletionConfig,
    ) -> Result<CompletionResponse, ProviderError> {
        let request = build_request(messages, config);

        let response = self
            .client
            .post(self.endpoint(&config.model))
            .header("x-goog-api-key", self.credential.expose())
            .header("content-type", "application/json")
            .timeout(config.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(config.timeout)
                } else {
                    ProviderError::HttpError(e.to_string())
                }
            })?;

        let status = response.status();

        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(ProviderError::RateLimited { retry_after });
        }

        if status == 401 || status == 403 {
            return Err(ProviderError::AuthError);
        }

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GeminiError>(&text)
                .map(|e| e.error.message)
                .unwrap_or(text);
            return Err(ProviderError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        into_completion(body, &config.model)
    }

    #[cfg(not(feature = "gemini"))]
    async fn complete(
        &self,
        _messages: Vec<ChatMessage>,
        _config: &CompletionConfig,
    ) -> Result<CompletionResponse, ProviderError> {
        Err(ProviderError::NotConfigured(
            "Gemini provider requires the 'gemini' feature".to_string(),
        ))
    }

    async fn health_check(&self) -> bool {
        !self.credential.is_empty()
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

/// Factory for Gemini providers.
///
/// ## Configuration Format
/// ```json
/// {
///   "api_key": "...",          // Optional, falls back to GEMINI_API_KEY / API_KEY
///   "base_url": "https://...", // Optional
///   "model": "gemini-3-pro-preview",
///   "timeout": "60s"
/// }
/// ```
pub struct GeminiProviderFactory;

impl ProviderFactory for GeminiProviderFactory {
    fn provider_type(&self) -> &'static str {
        "gemini"
    }

    fn create(&self, config: &JsonValue) -> Result<Arc<dyn LlmProvider>, ProviderError> {
        Ok(Arc::new(GeminiProvider::from_config(config)?))
    }

    fn validate_config(&self, config: &JsonValue) -> Result<(), ProviderError> {
        if !ApiCredential::is_available(config, "api_key", &GEMINI_API_KEY_ENVS) {
            return Err(ProviderError::NotConfigured(format!(
                "Gemini API key required: set 'api_key' in config or {} env",
                GEMINI_API_KEY_ENVS.join(" / ")
            )));
        }

        if let Some(url) = config["base_url"].as_str() {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ProviderError::NotConfigured(
                    "base_url must start with http:// or https://".to_string(),
                ));
            }
        }

        // Surfaces a bad timeout or temperature at startup.
        CompletionConfig::from_json(config)?;
        Ok(())
    }

    fn default_config(&self) -> JsonValue {
        serde_json::json!({
            "model": DEFAULT_GEMINI_MODEL,
            "timeout": "60s",
            "temperature": 0.2
        })
    }

    fn description(&self) -> &'static str {
        "Google Gemini provider with structured JSON output"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint() {
        let provider = GeminiProvider::new("k").with_base_url("http://localhost:8080/v1beta");
        assert_eq!(
            provider.endpoint("gemini-3-pro-preview"),
            "http://localhost:8080/v1beta/models/gemini-3-pro-preview:generateContent"
        );
    }

    #[test]
    fn test_request_shape() {
        let config = CompletionConfig {
            response_schema: Some(serde_json::json!({"type": "object"})),
            ..CompletionConfig::default()
        };
        let request = build_request(
            vec![
                ChatMessage::system("be brief"),
                ChatMessage::user("hello"),
                ChatMessage::assistant("hi"),
            ],
            &config,
        );
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "be brief");
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][1]["role"], "model");
        assert_eq!(json["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(json["generationConfig"]["responseSchema"]["type"], "object");
    }

    #[test]
    fn test_plain_text_request_has_no_mime_type() {
        let request = build_request(vec![ChatMessage::user("x")], &CompletionConfig::default());
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("systemInstruction").is_none());
        assert!(json["generationConfig"].get("responseMimeType").is_none());
    }

    #[test]
    fn test_response_text_joined() {
        let body: GenerateResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "{\"a\":"}, {"text": "1}"}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 900, "candidatesTokenCount": 250},
            "modelVersion": "gemini-3-pro-preview-001"
        }))
        .unwrap();

        let completion = into_completion(body, "gemini-3-pro-preview").unwrap();
        assert_eq!(completion.content, "{\"a\":1}");
        assert_eq!(completion.usage.total(), 1150);
        assert_eq!(completion.model, "gemini-3-pro-preview-001");
        assert_eq!(completion.stop_reason.as_deref(), Some("STOP"));
    }

    #[test]
    fn test_empty_candidates() {
        let body: GenerateResponse = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(
            into_completion(body, "m").unwrap_err(),
            ProviderError::EmptyResponse
        );
    }

    #[test]
    fn test_factory_validation() {
        let factory = GeminiProviderFactory;
        let bad_url = serde_json::json!({"api_key": "k", "base_url": "ftp://x"});
        assert!(factory.validate_config(&bad_url).is_err());

        let bad_timeout = serde_json::json!({"api_key": "k", "timeout": "soon"});
        assert!(factory.validate_config(&bad_timeout).is_err());

        let ok = serde_json::json!({"api_key": "k", "timeout": "30s"});
        assert!(factory.validate_config(&ok).is_ok());
    }

    #[test]
    fn test_key_not_in_debug_output() {
        let secret = "AIza-super-secret-key-12345";
        let provider = GeminiProvider::new(secret);
        let debug = format!("{:?}", provider);
        assert!(!debug.contains(secret));
        assert!(debug.contains("[REDACTED]"));
    }

    #[tokio::test]
    async fn test_health_check_needs_key() {
        assert!(GeminiProvider::new("k").health_check().await);
        assert!(!GeminiProvider::new("").health_check().await);
    }

    #[test]
    fn test_from_config_trims_base_url() {
        let config = serde_json::json!({"api_key": "k", "base_url": "https://proxy.local/v1beta/"});
        let provider = GeminiProvider::from_config(&config).unwrap();
        assert_eq!(provider.base_url, "https://proxy.local/v1beta");
        assert_eq!(provider.credential.source(), CredentialSource::Config);
    }
}
