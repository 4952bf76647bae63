//! Presentation data for the review and results steps.
//!
//! Front ends render these; nothing here touches a terminal or a file.

use serde::Serialize;

use crate::result::{format_score, EligibilityResult, RiskLevel};
use crate::simulation::ScoreDelta;
use crate::wizard::Wizard;

pub const VERIFY_ACTION: &str = "Verify Email to Continue";
pub const VERIFIED_NOTICE: &str = "Verification Cleared";
pub const ASSESSMENT_FAILED_NOTICE: &str = "Assessment failed. Please check your API key and try again.";
pub const DISCLAIMER: &str =
    "This is a simulation tool and does not guarantee visa approval. Please consult official UK Home Office guidance.";

const HIGHLIGHT_COUNT: usize = 3;

/// Copy shown on the review step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewCopy {
    pub prompt: &'static str,
    pub action: &'static str,
}

pub fn review_copy(simulation_mode: bool) -> ReviewCopy {
    if simulation_mode {
        ReviewCopy {
            prompt: "Simulation mode: We will compare your new data against your baseline score.",
            action: "SIMULATE IMPACT",
        }
    } else {
        ReviewCopy {
            prompt: "Ready to analyze your eligibility profile against UK Caseworker Guidance.",
            action: "GET FINAL SCORE",
        }
    }
}

/// Notice shown after a code is issued. The stub has no delivery channel,
/// so the code itself is part of the notice.
pub fn code_sent_notice(email: &str, code: &str) -> String {
    format!("Verification code sent to {}. (Simulation: your code is {})", email, code)
}

/// Colour band of the score ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreTier {
    Good,
    Fair,
    Poor,
}

impl ScoreTier {
    pub fn of(score: f64) -> Self {
        if score > 75.0 {
            ScoreTier::Good
        } else if score > 50.0 {
            ScoreTier::Fair
        } else {
            ScoreTier::Poor
        }
    }
}

pub fn risk_badge(level: RiskLevel) -> String {
    format!("{} RISK PROFILE", level.as_str().to_uppercase())
}

/// Everything the results step shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultView {
    pub score: f64,
    pub tier: ScoreTier,
    pub risk_badge: String,
    pub summary: String,
    /// Top three strengths
    pub strongest_points: Vec<String>,
    /// Top three weaknesses
    pub refusal_triggers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta: Option<ScoreDelta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub simulation_analysis: Option<String>,
}

impl ResultView {
    /// Build the view of `current`. Pass a delta only in simulation mode.
    pub fn build(current: &EligibilityResult, delta: Option<ScoreDelta>) -> Self {
        let simulation_analysis = current
            .scenario_delta_explanation
            .as_ref()
            .filter(|text| !text.trim().is_empty())
            .cloned();

        Self {
            score: current.score,
            tier: ScoreTier::of(current.score),
            risk_badge: risk_badge(current.risk_level),
            summary: current.summary.clone(),
            strongest_points: current.strengths.iter().take(HIGHLIGHT_COUNT).cloned().collect(),
            refusal_triggers: current.weaknesses.iter().take(HIGHLIGHT_COUNT).cloned().collect(),
            delta,
            simulation_analysis,
        }
    }

    /// View of the wizard's current result, if there is one.
    pub fn from_wizard(wizard: &Wizard) -> Option<Self> {
        wizard
            .current_result()
            .map(|current| Self::build(current, wizard.score_delta()))
    }

    /// "BASELINE 78 ▼ 37" style line for simulation mode.
    pub fn baseline_line(&self) -> Option<String> {
        self.delta.map(|delta| {
            format!(
                "BASELINE {} {} {}",
                format_score(delta.baseline_score),
                delta.direction().arrow(),
                format_score(delta.magnitude())
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result() -> EligibilityResult {
        EligibilityResult {
            score: 41.0,
            risk_level: RiskLevel::High,
            summary: "Expenses exceed income.".to_string(),
            strengths: vec!["a", "b", "c", "d"].into_iter().map(String::from).collect(),
            weaknesses: vec!["x".to_string()],
            recommendations: vec![],
            guidance_references: vec![],
            scenario_delta_explanation: Some("Disposable income went negative.".to_string()),
        }
    }

    #[test]
    fn test_tiers() {
        assert_eq!(ScoreTier::of(76.0), ScoreTier::Good);
        assert_eq!(ScoreTier::of(75.0), ScoreTier::Fair);
        assert_eq!(ScoreTier::of(51.0), ScoreTier::Fair);
        assert_eq!(ScoreTier::of(50.0), ScoreTier::Poor);
    }

    #[test]
    fn test_badge() {
        assert_eq!(risk_badge(RiskLevel::Medium), "MEDIUM RISK PROFILE");
    }

    #[test]
    fn test_highlights_capped_at_three() {
        let view = ResultView::build(&result(), None);
        assert_eq!(view.strongest_points, vec!["a", "b", "c"]);
        assert_eq!(view.refusal_triggers, vec!["x"]);
    }

    #[test]
    fn test_simulation_analysis_shown_without_delta() {
        let view = ResultView::build(&result(), None);
        assert_eq!(
            view.simulation_analysis.as_deref(),
            Some("Disposable income went negative.")
        );
        assert!(view.baseline_line().is_none());

        let mut blank = result();
        blank.scenario_delta_explanation = Some("  ".to_string());
        assert!(ResultView::build(&blank, None).simulation_analysis.is_none());

        let delta = ScoreDelta {
            baseline_score: 78.0,
            current_score: 41.0,
        };
        let view = ResultView::build(&result(), Some(delta));
        assert_eq!(
            view.simulation_analysis.as_deref(),
            Some("Disposable income went negative.")
        );
        assert_eq!(view.baseline_line().unwrap(), "BASELINE 78 ▼ 37");
    }

    #[test]
    fn test_review_copy() {
        assert_eq!(review_copy(true).action, "SIMULATE IMPACT");
        assert_eq!(review_copy(false).action, "GET FINAL SCORE");
    }
}
