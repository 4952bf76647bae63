//! # visa-runtime
//!
//! AI-backed assessment for the visa eligibility simulator.
//!
//! `visa-core` decides when an assessment is needed; this crate performs it.
//! The model is reached through an [`LlmProvider`] (Gemini by default, behind
//! the `gemini` feature) and wrapped in an [`Assessor`] so sessions can run
//! against a replayed or scripted result instead.
//!
//! ## Example
//!
//! ```rust,ignore
//! use visa_runtime::{LlmAssessor, ProviderRegistry, Session, CompletionConfig};
//!
//! let config = serde_json::json!({"model": "gemini-3-pro-preview"});
//! let provider = ProviderRegistry::with_defaults().create("gemini", &config)?;
//! let assessor = LlmAssessor::new(provider, CompletionConfig::from_json(&config)?)?;
//!
//! let mut session = Session::new(wizard, Arc::new(assessor));
//! session.submit().await?;
//! ```

pub mod assessor;
pub mod llm;
pub mod parser;
pub mod prompts;
pub mod providers;
pub mod session;

pub use assessor::{AssessmentError, AssessmentRequest, Assessor, EnrichedApplication, FixedAssessor};
pub use llm::{LlmAssessor, RetryPolicy};
pub use parser::{parse_result, ParseError};
pub use providers::{
    ChatMessage, CompletionConfig, CompletionResponse, LlmProvider, ProviderError, ProviderRegistry,
    TokenUsage,
};
pub use session::{Session, SessionError};
