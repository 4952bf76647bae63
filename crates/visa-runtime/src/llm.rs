//! Model-backed assessor.

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use std::sync::Arc;
use std::time::{Duration, Instant};
use visa_core::EligibilityResult;

use crate::assessor::{AssessmentError, AssessmentRequest, Assessor};
use crate::parser::{parse_result, response_schema};
use crate::prompts::{build_prompt, SYSTEM_PROMPT};
use crate::providers::{ChatMessage, CompletionConfig, CompletionResponse, LlmProvider, ProviderError};

/// Backoff for transient provider failures.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: usize,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            min_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_retries)
            .with_jitter()
    }
}

/// Sends the prompt to an [`LlmProvider`] and parses the structured reply.
pub struct LlmAssessor {
    provider: Arc<dyn LlmProvider>,
    config: CompletionConfig,
    retry: RetryPolicy,
}

impl std::fmt::Debug for LlmAssessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmAssessor")
            .field("provider", &self.provider.name())
            .field("model", &self.config.model)
            .field("retry", &self.retry)
            .finish()
    }
}

impl LlmAssessor {
    /// The response schema is always attached to `config`.
    pub fn new(provider: Arc<dyn LlmProvider>, config: CompletionConfig) -> Result<Self, AssessmentError> {
        let config = CompletionConfig {
            response_schema: Some(response_schema()?),
            ..config
        };
        Ok(Self {
            provider,
            config,
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn config(&self) -> &CompletionConfig {
        &self.config
    }

    async fn complete_once(&self, messages: &[ChatMessage]) -> Result<CompletionResponse, ProviderError> {
        tokio::time::timeout(
            self.config.timeout,
            self.provider.complete(messages.to_vec(), &self.config),
        )
        .await
        .map_err(|_| ProviderError::Timeout(self.config.timeout))?
    }
}

#[async_trait]
impl Assessor for LlmAssessor {
    async fn assess(&self, request: &AssessmentRequest) -> Result<EligibilityResult, AssessmentError> {
        let prompt = build_prompt(request)?;
        let messages = vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(prompt)];

        tracing::info!(
            provider = self.provider.name(),
            model = %self.config.model,
            what_if = request.is_what_if(),
            prompt_tokens_estimate = self.provider.estimate_tokens(&messages[1].content),
            "Requesting assessment"
        );

        let started = Instant::now();
        let this = self;
        let messages = &messages;
        let response = (move || async move { this.complete_once(messages).await })
            .retry(self.retry.backoff())
            .when(ProviderError::is_transient)
            .notify(|err: &ProviderError, delay: Duration| {
                tracing::warn!(error = %err, retry_in = ?delay, "Assessment call failed, retrying");
            })
            .await?;

        tracing::info!(
            model = %response.model,
            prompt_tokens = response.usage.prompt_tokens,
            completion_tokens = response.usage.completion_tokens,
            latency_ms = started.elapsed().as_millis() as u64,
            "Assessment received"
        );

        let result = parse_result(&response.content).inspect_err(|e| {
            tracing::warn!(error = %e, "Assessment response rejected");
        })?;
        Ok(result)
    }

    fn name(&self) -> &str {
        self.provider.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ParseError;
    use crate::providers::TokenUsage;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use visa_core::{ApplicationData, RiskLevel};

    const REPLY: &str = r#"```json
{"score": 74, "riskLevel": "Medium", "summary": "Fair.", "strengths": ["Job"],
 "weaknesses": [], "recommendations": [], "guidanceReferences": ["V 4.2"]}
```"#;

    /// Returns scripted replies in order, recording what it was sent.
    struct ScriptedProvider {
        replies: Mutex<Vec<Result<String, ProviderError>>>,
        calls: AtomicUsize,
        last_config: Mutex<Option<CompletionConfig>>,
        last_prompt: Mutex<String>,
    }

    impl ScriptedProvider {
        fn new(replies: Vec<Result<String, ProviderError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies),
                calls: AtomicUsize::new(0),
                last_config: Mutex::new(None),
                last_prompt: Mutex::new(String::new()),
            })
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        async fn complete(
            &self,
            messages: Vec<ChatMessage>,
            config: &CompletionConfig,
        ) -> Result<CompletionResponse, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_config.lock().unwrap() = Some(config.clone());
            *self.last_prompt.lock().unwrap() = messages.last().unwrap().content.clone();

            let reply = self.replies.lock().unwrap().remove(0)?;
            Ok(CompletionResponse {
                content: reply,
                usage: TokenUsage {
                    prompt_tokens: 800,
                    completion_tokens: 120,
                },
                model: config.model.clone(),
                stop_reason: Some("STOP".to_string()),
            })
        }

        async fn health_check(&self) -> bool {
            true
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            max_retries: 2,
            min_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
        }
    }

    fn request() -> AssessmentRequest {
        AssessmentRequest::new(
            ApplicationData::default(),
            None,
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        )
    }

    fn assessor(provider: Arc<ScriptedProvider>) -> LlmAssessor {
        LlmAssessor::new(provider, CompletionConfig::default())
            .unwrap()
            .with_retry(fast_retry())
    }

    #[tokio::test]
    async fn test_assess_parses_reply_and_sends_schema() {
        let provider = ScriptedProvider::new(vec![Ok(REPLY.to_string())]);
        let result = assessor(provider.clone()).assess(&request()).await.unwrap();

        assert_eq!(result.score, 74.0);
        assert_eq!(result.risk_level, RiskLevel::Medium);

        let config = provider.last_config.lock().unwrap().clone().unwrap();
        assert!(config.response_schema.is_some());
        assert!(provider.last_prompt.lock().unwrap().contains("calculatedMetrics"));
    }

    #[tokio::test]
    async fn test_transient_errors_are_retried() {
        let provider = ScriptedProvider::new(vec![
            Err(ProviderError::RateLimited { retry_after: None }),
            Err(ProviderError::HttpError("connection reset".into())),
            Ok(REPLY.to_string()),
        ]);
        let result = assessor(provider.clone()).assess(&request()).await;

        assert!(result.is_ok());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let provider = ScriptedProvider::new(vec![
            Err(ProviderError::Timeout(Duration::from_secs(1))),
            Err(ProviderError::Timeout(Duration::from_secs(1))),
            Err(ProviderError::Timeout(Duration::from_secs(1))),
            Ok(REPLY.to_string()),
        ]);
        let result = assessor(provider.clone()).assess(&request()).await;

        assert!(matches!(result, Err(AssessmentError::Provider(ProviderError::Timeout(_)))));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_errors_fail_fast() {
        let provider = ScriptedProvider::new(vec![Err(ProviderError::AuthError), Ok(REPLY.to_string())]);
        let result = assessor(provider.clone()).assess(&request()).await;

        assert!(matches!(result, Err(AssessmentError::Provider(ProviderError::AuthError))));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_malformed_reply_is_parse_error() {
        let provider = ScriptedProvider::new(vec![Ok("{\"score\": 10}".to_string())]);
        let result = assessor(provider).assess(&request()).await;

        assert!(matches!(
            result,
            Err(AssessmentError::Parse(ParseError::SchemaViolation(_)))
        ));
    }

    #[tokio::test]
    async fn test_error_message_is_generic_prefix() {
        let provider = ScriptedProvider::new(vec![Err(ProviderError::AuthError)]);
        let err = assessor(provider).assess(&request()).await.unwrap_err();
        assert!(err.to_string().starts_with("Could not complete visa assessment"));
    }
}
