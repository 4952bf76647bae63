//! The wizard controller.
//!
//! Holds the current step, the form data, the verification gate, the
//! simulation flag and the result slots. Every state change is synchronous
//! except submission, which is split in two so the caller can await the
//! assessment between [`Wizard::begin_submission`] and
//! [`Wizard::complete_submission`] / [`Wizard::fail_submission`]. While a
//! submission is open the wizard is busy and rejects every other command.

use thiserror::Error;

use crate::application::{apply, ApplicationData, FieldUpdate, UpdateError, FieldValue};
use crate::derived::{self, DURATION_FIELD};
use crate::result::{BaselineSummary, EligibilityResult};
use crate::simulation::{ResultSlots, ScoreDelta};
use crate::step::Step;
use crate::validation::{validate_step, StepErrors};
use crate::verification::{CodeSource, RandomCodes, Verification, VerificationError};

const EMAIL_FIELD: &str = "personalInfo.email";

/// Errors from wizard commands. None of them change wizard state.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WizardError {
    #[error("An assessment is in progress")]
    Busy,

    #[error("Please fix {} field(s) on {step} before continuing", errors.len())]
    StepInvalid { step: Step, errors: StepErrors },

    #[error("'{action}' is not available on {step}")]
    NotAvailable { action: &'static str, step: Step },

    #[error("Please verify your email first")]
    NotVerified,

    #[error("No assessment is in progress")]
    NoSubmission,

    #[error(transparent)]
    Update(#[from] UpdateError),

    #[error(transparent)]
    Verification(#[from] VerificationError),
}

/// Result of a navigation command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Moved { from: Step, to: Step },
    Stayed(Step),
}

impl Navigation {
    pub fn step(&self) -> Step {
        match self {
            Navigation::Moved { to, .. } => *to,
            Navigation::Stayed(step) => *step,
        }
    }

    /// Entering a step scrolls the view back to the top.
    pub fn scroll_to_top(&self) -> bool {
        matches!(self, Navigation::Moved { .. })
    }
}

/// Snapshot handed to the assessment client when a submission starts.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionTicket {
    pub data: ApplicationData,
    pub baseline: Option<BaselineSummary>,
}

/// One applicant session.
pub struct Wizard {
    step: Step,
    data: ApplicationData,
    verification: Verification,
    simulation_mode: bool,
    results: ResultSlots,
    busy: bool,
    codes: Box<dyn CodeSource>,
}

impl std::fmt::Debug for Wizard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wizard")
            .field("step", &self.step)
            .field("simulation_mode", &self.simulation_mode)
            .field("verified", &self.verification.is_verified())
            .field("busy", &self.busy)
            .finish()
    }
}

impl Default for Wizard {
    fn default() -> Self {
        Self::new()
    }
}

impl Wizard {
    /// Start a session at step 1 with default data and random codes.
    pub fn new() -> Self {
        Self::with_code_source(Box::new(RandomCodes))
    }

    pub fn with_code_source(codes: Box<dyn CodeSource>) -> Self {
        Self {
            step: Step::FIRST,
            data: ApplicationData::default(),
            verification: Verification::new(),
            simulation_mode: false,
            results: ResultSlots::new(),
            busy: false,
            codes,
        }
    }

    /// Start a session with prefilled data.
    pub fn with_data(mut self, data: ApplicationData) -> Self {
        self.data = data;
        derived::refresh_duration(&mut self.data);
        self
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn data(&self) -> &ApplicationData {
        &self.data
    }

    pub fn is_simulation_mode(&self) -> bool {
        self.simulation_mode
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn is_verified(&self) -> bool {
        self.verification.is_verified()
    }

    pub fn is_code_sent(&self) -> bool {
        self.verification.is_code_sent()
    }

    /// Whether the review step must show the verification gate instead of
    /// the submit action.
    pub fn needs_verification(&self) -> bool {
        !self.verification.is_verified() && !self.simulation_mode
    }

    pub fn current_result(&self) -> Option<&EligibilityResult> {
        self.results.current()
    }

    pub fn baseline_result(&self) -> Option<&EligibilityResult> {
        self.results.baseline()
    }

    pub fn score_delta(&self) -> Option<ScoreDelta> {
        self.results.delta(self.simulation_mode)
    }

    /// Validation errors for the current step.
    pub fn errors(&self) -> StepErrors {
        validate_step(&self.data, self.step)
    }

    /// Whether a field is read-only right now.
    pub fn is_locked(&self, path: &str) -> bool {
        self.lock_reason(path).is_some()
    }

    fn lock_reason(&self, path: &str) -> Option<&'static str> {
        if path == EMAIL_FIELD && self.simulation_mode {
            Some("email is fixed during a what-if simulation")
        } else if path == DURATION_FIELD && derived::duration_locked(&self.data) {
            Some("duration follows the travel dates")
        } else {
            None
        }
    }

    /// Set one field by dotted path.
    pub fn set_field(&mut self, path: &str, value: impl Into<FieldValue>) -> Result<(), WizardError> {
        let update = FieldUpdate::new(path, value)?;
        self.apply_update(update)
    }

    /// Set one field from raw text, coerced to the field's kind.
    pub fn set_field_from_input(&mut self, path: &str, raw: &str) -> Result<(), WizardError> {
        let update = FieldUpdate::from_input(&self.data, path, raw)?;
        self.apply_update(update)
    }

    /// Apply an update, then re-run the duration rule if a date field moved.
    pub fn apply_update(&mut self, update: FieldUpdate) -> Result<(), WizardError> {
        self.ensure_idle()?;
        if self.step == Step::Results {
            return Err(WizardError::NotAvailable {
                action: "edit",
                step: self.step,
            });
        }
        if let Some(reason) = self.lock_reason(update.path.as_str()) {
            return Err(UpdateError::Locked {
                path: update.path.to_string(),
                reason,
            }
            .into());
        }

        let mut next = apply(&self.data, &update)?;
        if derived::is_date_trigger(&update.path) {
            derived::refresh_duration(&mut next);
        }
        self.data = next;

        tracing::debug!(field = %update.path, "Field updated");
        Ok(())
    }

    /// Advance one step if the current step validates.
    ///
    /// Only steps 1 to 4 advance this way; the review step submits instead.
    pub fn next(&mut self) -> Result<Navigation, WizardError> {
        self.ensure_idle()?;

        let to = match self.step {
            Step::FinalReview | Step::Results => {
                return Err(WizardError::NotAvailable {
                    action: "next",
                    step: self.step,
                })
            }
            step => step.next().unwrap_or(step),
        };

        let errors = self.errors();
        if !errors.is_empty() {
            tracing::debug!(step = self.step.number(), errors = errors.len(), "Step blocked by validation");
            return Err(WizardError::StepInvalid {
                step: self.step,
                errors,
            });
        }

        Ok(self.move_to(to))
    }

    /// Go back one step. Never validated; stays put on step 1.
    pub fn previous(&mut self) -> Result<Navigation, WizardError> {
        self.ensure_idle()?;

        match self.step {
            Step::Results => Err(WizardError::NotAvailable {
                action: "previous",
                step: self.step,
            }),
            step => match step.previous() {
                Some(to) => Ok(self.move_to(to)),
                None => Ok(Navigation::Stayed(step)),
            },
        }
    }

    /// Issue a verification code for the current email and return it for
    /// display.
    pub fn send_code(&mut self) -> Result<String, WizardError> {
        self.ensure_idle()?;
        self.ensure_step(Step::FinalReview, "send code")?;
        let code = self
            .verification
            .send_code(&self.data.personal_info.email, self.codes.as_mut())?;
        Ok(code)
    }

    pub fn verify_code(&mut self, input: &str) -> Result<(), WizardError> {
        self.ensure_idle()?;
        self.ensure_step(Step::FinalReview, "verify code")?;
        self.verification.verify(input)?;
        Ok(())
    }

    /// Open a submission: checks the gate, marks the wizard busy and returns
    /// what the assessment client needs.
    pub fn begin_submission(&mut self) -> Result<SubmissionTicket, WizardError> {
        self.ensure_idle()?;
        self.ensure_step(Step::FinalReview, "submit")?;
        if !self.verification.is_verified() {
            return Err(WizardError::NotVerified);
        }

        self.busy = true;
        let ticket = SubmissionTicket {
            data: self.data.clone(),
            baseline: self.results.request_baseline(self.simulation_mode),
        };

        tracing::info!(
            simulation = self.simulation_mode,
            with_baseline = ticket.baseline.is_some(),
            "Submission started"
        );
        Ok(ticket)
    }

    /// Close a submission with a result: stores it and shows the results.
    pub fn complete_submission(&mut self, result: EligibilityResult) -> Result<Navigation, WizardError> {
        if !self.busy {
            return Err(WizardError::NoSubmission);
        }

        let became_baseline = self.results.record(result);
        self.busy = false;

        tracing::info!(baseline = became_baseline, "Submission completed");
        Ok(self.move_to(Step::Results))
    }

    /// Close a submission that failed. Nothing is stored; the wizard stays
    /// on the review step.
    pub fn fail_submission(&mut self) -> Result<Navigation, WizardError> {
        if !self.busy {
            return Err(WizardError::NoSubmission);
        }

        self.busy = false;
        tracing::warn!("Submission failed");
        Ok(Navigation::Stayed(self.step))
    }

    /// Start over: default data, step 1, no verification, no simulation, no
    /// results.
    pub fn reset(&mut self) -> Result<Navigation, WizardError> {
        self.ensure_idle()?;

        self.data = ApplicationData::default();
        self.verification.reset();
        self.simulation_mode = false;
        self.results.clear();

        tracing::info!("New application started");
        Ok(self.move_to(Step::FIRST))
    }

    /// Re-enter the wizard to edit the data and compare against the baseline.
    pub fn enter_simulation(&mut self) -> Result<Navigation, WizardError> {
        self.ensure_idle()?;
        self.ensure_step(Step::Results, "what-if")?;

        self.simulation_mode = true;
        tracing::info!("What-if simulation started");
        Ok(self.move_to(Step::FIRST))
    }

    fn move_to(&mut self, to: Step) -> Navigation {
        let from = self.step;
        if from == to {
            return Navigation::Stayed(to);
        }
        self.step = to;
        tracing::info!(from = from.number(), to = to.number(), "Step changed");
        Navigation::Moved { from, to }
    }

    fn ensure_idle(&self) -> Result<(), WizardError> {
        if self.busy {
            Err(WizardError::Busy)
        } else {
            Ok(())
        }
    }

    fn ensure_step(&self, step: Step, action: &'static str) -> Result<(), WizardError> {
        if self.step == step {
            Ok(())
        } else {
            Err(WizardError::NotAvailable {
                action,
                step: self.step,
            })
        }
    }
}
