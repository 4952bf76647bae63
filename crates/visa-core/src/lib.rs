//! # visa-core
//!
//! Deterministic core of the UK visitor visa eligibility simulator.
//!
//! This crate owns everything that does not need the scoring service:
//! - the application data model and its field-path reducer
//! - per-step validation and the derived trip duration
//! - the wizard controller, verification gate and what-if baseline
//! - result presentation and the PDF report
//!
//! ## Key Guarantees
//!
//! 1. **No network calls**: assessment is requested through a ticket the
//!    caller fulfils (see `visa-runtime`)
//! 2. **Immutable updates**: applying a field update returns a new value
//! 3. **Stable baseline**: the first result of a session is never replaced
//!
//! ## Example
//!
//! ```rust,ignore
//! use visa_core::{Wizard, Step};
//!
//! let mut wizard = Wizard::new();
//! wizard.set_field("personalInfo.givenName", "Ada")?;
//! wizard.set_field("personalInfo.familyName", "Lovelace")?;
//! wizard.set_field("personalInfo.nationality", "India")?;
//! wizard.set_field("personalInfo.email", "ada@example.com")?;
//! wizard.next()?;
//! assert_eq!(wizard.step(), Step::TravelAccommodation);
//! ```

pub mod application;
pub mod derived;
pub mod metrics;
pub mod report;
pub mod result;
pub mod simulation;
pub mod step;
pub mod validation;
pub mod verification;
pub mod view;
pub mod wizard;

// Re-export main types at crate root
pub use application::{ApplicationData, FieldUpdate, FieldValue, LoadError, UpdateError};
pub use metrics::CalculatedMetrics;
pub use report::{export_report, report_filename, PdfReport, ReportError, ReportRenderer};
pub use result::{BaselineSummary, EligibilityResult, RiskLevel};
pub use simulation::{DeltaDirection, ScoreDelta};
pub use step::Step;
pub use validation::{validate_step, StepErrors};
pub use verification::{CodeSource, RandomCodes, VerificationError};
pub use view::{ResultView, ReviewCopy, ScoreTier};
pub use wizard::{Navigation, SubmissionTicket, Wizard, WizardError};
