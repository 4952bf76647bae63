//! Async session driver.
//!
//! Wraps a [`Wizard`] and an [`Assessor`] and runs the one suspension point
//! of the flow: submitting the review step for assessment.

use chrono::{Local, NaiveDate};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use visa_core::view::ASSESSMENT_FAILED_NOTICE;
use visa_core::{export_report, Navigation, PdfReport, ReportError, ReportRenderer, Wizard, WizardError};

use crate::assessor::{AssessmentError, AssessmentRequest, Assessor};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Wizard(#[from] WizardError),

    #[error(transparent)]
    Assessment(#[from] AssessmentError),

    #[error(transparent)]
    Report(#[from] ReportError),
}

impl SessionError {
    /// Message for the applicant. Assessment failures get one generic
    /// notice whatever the cause.
    pub fn notice(&self) -> String {
        match self {
            SessionError::Assessment(_) => ASSESSMENT_FAILED_NOTICE.to_string(),
            SessionError::Report(e) => format!("Export failed: {}", e),
            SessionError::Wizard(e) => e.to_string(),
        }
    }
}

/// One applicant session.
pub struct Session {
    wizard: Wizard,
    assessor: Arc<dyn Assessor>,
    renderer: Box<dyn ReportRenderer + Send + Sync>,
    today: Option<NaiveDate>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("wizard", &self.wizard)
            .field("assessor", &self.assessor.name())
            .finish()
    }
}

impl Session {
    pub fn new(wizard: Wizard, assessor: Arc<dyn Assessor>) -> Self {
        Self {
            wizard,
            assessor,
            renderer: Box::new(PdfReport),
            today: None,
        }
    }

    /// Pin the date used for age and report dates.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn with_renderer(mut self, renderer: Box<dyn ReportRenderer + Send + Sync>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn wizard(&self) -> &Wizard {
        &self.wizard
    }

    pub fn wizard_mut(&mut self) -> &mut Wizard {
        &mut self.wizard
    }

    pub fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    /// Submit the review step. On success the result is stored and the
    /// wizard shows it; on failure the wizard stays on the review step.
    pub async fn submit(&mut self) -> Result<Navigation, SessionError> {
        let ticket = self.wizard.begin_submission()?;
        let request = AssessmentRequest::from_ticket(&ticket, self.today());

        match self.assessor.assess(&request).await {
            Ok(result) => {
                tracing::info!(
                    assessor = self.assessor.name(),
                    score = result.score,
                    risk = %result.risk_level,
                    "Assessment complete"
                );
                Ok(self.wizard.complete_submission(result)?)
            }
            Err(e) => {
                tracing::error!(assessor = self.assessor.name(), error = %e, "Assessment failed");
                self.wizard.fail_submission()?;
                Err(e.into())
            }
        }
    }

    /// Write the PDF report for the current result into `dir`.
    pub fn export(&self, dir: &Path) -> Result<PathBuf, SessionError> {
        let path = export_report(
            self.renderer.as_ref(),
            dir,
            self.wizard.data(),
            self.wizard.current_result(),
            self.today(),
        )?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessor::FixedAssessor;
    use crate::providers::ProviderError;
    use async_trait::async_trait;
    use visa_core::{CodeSource, EligibilityResult, RiskLevel, Step};

    struct Code;

    impl CodeSource for Code {
        fn next_code(&mut self) -> String {
            "135790".to_string()
        }
    }

    struct Failing;

    #[async_trait]
    impl Assessor for Failing {
        async fn assess(&self, _: &AssessmentRequest) -> Result<EligibilityResult, AssessmentError> {
            Err(ProviderError::AuthError.into())
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    fn result() -> EligibilityResult {
        EligibilityResult {
            score: 81.0,
            risk_level: RiskLevel::Low,
            summary: "Strong ties.".to_string(),
            strengths: vec![],
            weaknesses: vec![],
            recommendations: vec![],
            guidance_references: vec![],
            scenario_delta_explanation: None,
        }
    }

    fn ready_wizard() -> Wizard {
        let mut w = Wizard::with_code_source(Box::new(Code));
        w.set_field("personalInfo.givenName", "Ada").unwrap();
        w.set_field("personalInfo.familyName", "Lovelace").unwrap();
        w.set_field("personalInfo.nationality", "India").unwrap();
        w.set_field("personalInfo.email", "ada@example.com").unwrap();
        for _ in 0..4 {
            w.next().unwrap();
        }
        w.send_code().unwrap();
        w.verify_code("135790").unwrap();
        w
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    #[tokio::test]
    async fn test_submit_success_moves_to_results() {
        let mut session =
            Session::new(ready_wizard(), Arc::new(FixedAssessor::new(result()))).with_today(today());
        let nav = session.submit().await.unwrap();

        assert_eq!(nav.step(), Step::Results);
        assert!(!session.wizard().is_busy());
        assert_eq!(session.wizard().current_result().unwrap().score, 81.0);
    }

    #[tokio::test]
    async fn test_submit_failure_stays_on_review() {
        let mut session = Session::new(ready_wizard(), Arc::new(Failing)).with_today(today());
        let err = session.submit().await.unwrap_err();

        assert_eq!(err.notice(), ASSESSMENT_FAILED_NOTICE);
        assert_eq!(session.wizard().step(), Step::FinalReview);
        assert!(!session.wizard().is_busy());
        assert!(session.wizard().current_result().is_none());
    }

    #[tokio::test]
    async fn test_submit_unverified_is_wizard_error() {
        let mut w = ready_wizard();
        w.reset().unwrap();
        let mut session = Session::new(w, Arc::new(FixedAssessor::new(result())));

        let err = session.submit().await.unwrap_err();
        assert!(matches!(err, SessionError::Wizard(WizardError::NotAvailable { .. })));
    }

    #[test]
    fn test_export_without_result_is_notice() {
        let session = Session::new(Wizard::new(), Arc::new(FixedAssessor::new(result())));
        let err = session.export(Path::new(".")).unwrap_err();
        assert!(err.notice().starts_with("Export failed"));
    }
}
