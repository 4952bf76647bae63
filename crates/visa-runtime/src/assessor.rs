//! The assessment seam.
//!
//! The wizard never talks to a model directly: a submission hands an
//! [`AssessmentRequest`] to whatever [`Assessor`] the session was built
//! with. Production uses [`crate::LlmAssessor`]; replays and tests use
//! [`FixedAssessor`] or their own implementations.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;
use visa_core::{ApplicationData, BaselineSummary, CalculatedMetrics, EligibilityResult, SubmissionTicket};

use crate::parser::ParseError;
use crate::providers::ProviderError;

/// Errors from an assessment. All of them leave the wizard on the review
/// step with nothing stored.
#[derive(Error, Debug)]
pub enum AssessmentError {
    #[error("Could not complete visa assessment: {0}")]
    Provider(#[from] ProviderError),

    #[error("Could not complete visa assessment: {0}")]
    Parse(#[from] ParseError),

    #[error("Could not complete visa assessment: failed to build prompt: {0}")]
    Prompt(#[from] serde_json::Error),
}

/// Application data plus the derived metrics, as sent to the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedApplication {
    #[serde(flatten)]
    pub data: ApplicationData,
    pub calculated_metrics: CalculatedMetrics,
}

impl EnrichedApplication {
    pub fn new(data: ApplicationData, today: NaiveDate) -> Self {
        let calculated_metrics = CalculatedMetrics::compute(&data, today);
        Self {
            data,
            calculated_metrics,
        }
    }
}

/// One assessment call.
#[derive(Debug, Clone, PartialEq)]
pub struct AssessmentRequest {
    pub application: EnrichedApplication,
    /// Present only for what-if runs
    pub baseline: Option<BaselineSummary>,
}

impl AssessmentRequest {
    pub fn new(data: ApplicationData, baseline: Option<BaselineSummary>, today: NaiveDate) -> Self {
        Self {
            application: EnrichedApplication::new(data, today),
            baseline,
        }
    }

    pub fn from_ticket(ticket: &SubmissionTicket, today: NaiveDate) -> Self {
        Self::new(ticket.data.clone(), ticket.baseline, today)
    }

    pub fn is_what_if(&self) -> bool {
        self.baseline.is_some()
    }
}

/// Scores an application.
#[async_trait]
pub trait Assessor: Send + Sync {
    async fn assess(&self, request: &AssessmentRequest) -> Result<EligibilityResult, AssessmentError>;

    /// Name for logs.
    fn name(&self) -> &str;
}

/// Returns the same stored result for every request.
#[derive(Debug, Clone)]
pub struct FixedAssessor {
    result: EligibilityResult,
}

impl FixedAssessor {
    pub fn new(result: EligibilityResult) -> Self {
        Self { result }
    }

    /// Load a saved result file (the JSON the scoring service returns).
    pub fn from_json(json: &str) -> Result<Self, ParseError> {
        crate::parser::parse_result(json).map(Self::new)
    }
}

#[async_trait]
impl Assessor for FixedAssessor {
    async fn assess(&self, request: &AssessmentRequest) -> Result<EligibilityResult, AssessmentError> {
        tracing::debug!(what_if = request.is_what_if(), "Replaying stored assessment");
        Ok(self.result.clone())
    }

    fn name(&self) -> &str {
        "replay"
    }
}
