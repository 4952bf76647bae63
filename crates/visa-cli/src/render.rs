//! Plain-text rendering of wizard screens.

use serde_json::Value as JsonValue;
use std::fmt::Write as _;
use visa_core::result::format_score;
use visa_core::view::{review_copy, ResultView, ScoreTier, DISCLAIMER, VERIFIED_NOTICE, VERIFY_ACTION};
use visa_core::{Step, StepErrors, Wizard};

const RULE: &str = "------------------------------------------------------------";

/// Sections whose fields are shown on `step`.
pub fn step_sections(step: Step) -> &'static [&'static str] {
    match step {
        Step::PersonalIdentity => &["personalInfo"],
        Step::TravelAccommodation => &["travelDetails"],
        Step::Finances => &["finances"],
        Step::TiesToHome => &["tiesToHome", "history"],
        Step::FinalReview | Step::Results => &[],
    }
}

/// Fields stored in one section but asked on another step.
const MOVED_FIELDS: &[(&str, Step)] = &[("personalInfo.residentialStatus", Step::TiesToHome)];

/// Field paths listed on `step`.
pub fn step_fields(wizard: &Wizard, step: Step) -> Vec<String> {
    let mut lines: Vec<String> = step_sections(step)
        .iter()
        .flat_map(|section| field_lines(wizard, section))
        .filter(|line| !MOVED_FIELDS.iter().any(|(path, _)| is_line_for(line, path)))
        .collect();

    for (path, _) in MOVED_FIELDS.iter().filter(|(_, on)| *on == step) {
        let section = path.split('.').next().unwrap_or_default();
        lines.extend(field_lines(wizard, section).into_iter().filter(|line| is_line_for(line, path)));
    }
    lines
}

fn is_line_for(line: &str, path: &str) -> bool {
    line.trim_start()
        .strip_prefix(path)
        .is_some_and(|rest| rest.starts_with(" = "))
}

/// `section.field = value` lines for every leaf in `section`.
pub fn field_lines(wizard: &Wizard, section: &str) -> Vec<String> {
    let Ok(root) = serde_json::to_value(wizard.data()) else {
        return Vec::new();
    };
    let mut lines = Vec::new();
    if let Some(value) = root.get(section) {
        collect_leaves(wizard, section, value, &mut lines);
    }
    lines
}

fn collect_leaves(wizard: &Wizard, path: &str, value: &JsonValue, out: &mut Vec<String>) {
    match value {
        JsonValue::Object(map) => {
            for (key, child) in map {
                collect_leaves(wizard, &format!("{}.{}", path, key), child, out);
            }
        }
        leaf => {
            let shown = match leaf {
                JsonValue::String(s) if s.is_empty() => "(empty)".to_string(),
                JsonValue::String(s) => s.clone(),
                JsonValue::Null => "(none)".to_string(),
                other => other.to_string(),
            };
            let lock = if wizard.is_locked(path) { "  [locked]" } else { "" };
            out.push(format!("  {} = {}{}", path, shown, lock));
        }
    }
}

/// Header plus the body of the current step.
pub fn render_step(wizard: &Wizard) -> String {
    let step = wizard.step();
    let mut out = String::new();
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "Step {} of 6: {}", step.number(), step.title());
    if wizard.is_simulation_mode() {
        let _ = writeln!(out, "[SIMULATION MODE]");
    }
    let _ = writeln!(out, "{}", RULE);

    match step {
        Step::FinalReview => out.push_str(&render_review(wizard)),
        Step::Results => match ResultView::from_wizard(wizard) {
            Some(view) => out.push_str(&render_result(&view)),
            None => out.push_str("No result yet.\n"),
        },
        _ => {
            for line in step_fields(wizard, step) {
                let _ = writeln!(out, "{}", line);
            }
        }
    }
    out
}

/// Review step body: what happens on submit and whether verification is
/// still needed.
pub fn render_review(wizard: &Wizard) -> String {
    let copy = review_copy(wizard.is_simulation_mode());
    let mut out = String::new();
    let _ = writeln!(out, "{}", copy.prompt);

    if wizard.needs_verification() {
        let _ = writeln!(out, "{}", VERIFY_ACTION);
        if wizard.is_code_sent() {
            let _ = writeln!(out, "  Enter the code with: verify <code>");
        } else {
            let _ = writeln!(
                out,
                "  Send a code to {} with: send-code",
                wizard.data().personal_info.email
            );
        }
    } else {
        if wizard.is_verified() {
            let _ = writeln!(out, "{}", VERIFIED_NOTICE);
        }
        let _ = writeln!(out, "  [{}] run: submit", copy.action);
    }
    out
}

pub fn render_errors(errors: &StepErrors) -> String {
    let mut out = String::new();
    for (field, message) in errors.iter() {
        let _ = writeln!(out, "  ! {}: {}", field, message);
    }
    out
}

fn tier_label(tier: ScoreTier) -> &'static str {
    match tier {
        ScoreTier::Good => "good",
        ScoreTier::Fair => "fair",
        ScoreTier::Poor => "poor",
    }
}

fn bullet_block(out: &mut String, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    let _ = writeln!(out, "{}:", title);
    for item in items {
        let _ = writeln!(out, "  - {}", item);
    }
}

pub fn render_result(view: &ResultView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Score: {}/100 ({})", format_score(view.score), tier_label(view.tier));
    let _ = writeln!(out, "{}", view.risk_badge);
    if let Some(line) = view.baseline_line() {
        let _ = writeln!(out, "{}", line);
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", view.summary);
    let _ = writeln!(out);
    bullet_block(&mut out, "Strongest Points", &view.strongest_points);
    bullet_block(&mut out, "Refusal Triggers", &view.refusal_triggers);
    if let Some(analysis) = &view.simulation_analysis {
        let _ = writeln!(out, "Simulation Analysis:");
        let _ = writeln!(out, "  {}", analysis);
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", DISCLAIMER);
    out
}

pub const RECOVERY_SCREEN: &str = "Something went wrong\n\
We encountered an unexpected error. Please try refreshing the page.\n";

#[cfg(test)]
mod tests {
    use super::*;
    use visa_core::{validate_step, ApplicationData, EligibilityResult, RiskLevel, ScoreDelta};

    fn result(score: f64, explanation: Option<&str>) -> EligibilityResult {
        EligibilityResult {
            score,
            risk_level: RiskLevel::High,
            summary: "Expenses exceed income.".to_string(),
            strengths: vec!["Owns property".to_string()],
            weaknesses: vec!["Negative disposable income".to_string()],
            recommendations: vec![],
            guidance_references: vec![],
            scenario_delta_explanation: explanation.map(String::from),
        }
    }

    #[test]
    fn test_step_one_lists_personal_fields() {
        let text = render_step(&Wizard::new());
        assert!(text.contains("Step 1 of 6: Personal Identity"));
        assert!(text.contains("personalInfo.dob = 1990-01-01"));
        assert!(text.contains("personalInfo.givenName = (empty)"));
        assert!(!text.contains("finances."));
    }

    #[test]
    fn test_duration_marked_locked_with_dates() {
        let mut wizard = Wizard::new();
        wizard.set_field("travelDetails.hasSpecificDates", true).unwrap();
        let lines = field_lines(&wizard, "travelDetails");
        assert!(lines
            .iter()
            .any(|l| l.contains("travelDetails.durationDays = 14  [locked]")));
    }

    #[test]
    fn test_errors_listed_per_field() {
        let errors = validate_step(&ApplicationData::default(), Step::PersonalIdentity);
        let text = render_errors(&errors);
        assert!(text.contains("givenName: Given name is required"));
        assert_eq!(text.lines().count(), errors.len());
    }

    #[test]
    fn test_result_with_delta() {
        let baseline = result(78.0, None);
        let current = result(41.0, Some("Expenses rose."));
        let view = ResultView::build(&current, Some(ScoreDelta::between(&baseline, &current)));
        let text = render_result(&view);

        assert!(text.contains("Score: 41/100 (poor)"));
        assert!(text.contains("HIGH RISK PROFILE"));
        assert!(text.contains("BASELINE 78 ▼ 37"));
        assert!(text.contains("Refusal Triggers:\n  - Negative disposable income"));
        assert!(text.contains("Simulation Analysis:"));
        assert!(text.ends_with(&format!("{}\n", DISCLAIMER)));
    }

    #[test]
    fn test_result_without_delta_keeps_explanation() {
        let view = ResultView::build(&result(41.0, Some("Expenses rose.")), None);
        let text = render_result(&view);
        assert!(!text.contains("BASELINE"));
        assert!(text.contains("Simulation Analysis:\n  Expenses rose."));

        let text = render_result(&ResultView::build(&result(41.0, None), None));
        assert!(!text.contains("Simulation Analysis"));
    }

    #[test]
    fn test_residential_status_listed_with_ties() {
        let mut wizard = Wizard::new();
        let first = step_fields(&wizard, Step::PersonalIdentity);
        assert!(first.iter().any(|l| l.contains("personalInfo.nationality = ")));
        assert!(!first.iter().any(|l| l.contains("residentialStatus")));

        wizard.set_field("personalInfo.residentialStatus", "Own").unwrap();
        let ties = step_fields(&wizard, Step::TiesToHome);
        assert!(ties.iter().any(|l| l == "  personalInfo.residentialStatus = Own"));
        assert!(ties.iter().any(|l| l.contains("tiesToHome.ownsProperty = ")));
        assert!(ties.iter().any(|l| l.contains("history.")));
    }

    #[test]
    fn test_review_asks_for_verification() {
        let text = render_review(&Wizard::new());
        assert!(text.contains(VERIFY_ACTION));
        assert!(text.contains("send-code"));
    }
}
