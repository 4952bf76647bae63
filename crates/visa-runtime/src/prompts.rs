//! Prompts for the eligibility assessment.
//!
//! Two variants: the initial analysis against the visitor caseworker
//! guidance, and the what-if re-assessment that compares against a baseline.
//! Both embed the enriched application as pretty-printed JSON.

use visa_core::result::format_score;
use visa_core::BaselineSummary;

use crate::assessor::{AssessmentRequest, EnrichedApplication};

/// Persona shared by both prompts.
pub const SYSTEM_PROMPT: &str = "You are an expert UK Immigration Consultant. \
Assess Standard Visitor applications strictly against the Home Office Visit caseworker guidance. \
Respond only with JSON that follows the requested schema.";

const INITIAL_CRITERIA: &str = r#"Critical Assessment Criteria:
1. **Affordability (V 4.2 e)**: Look at 'monthlyExpenses' vs 'monthlyIncome'. Is there strictly *disposable* income to save for this trip? If they spend all they earn, the 'savingsAmount' might be considered "parked funds" (suspicious).
2. **Genuine Visitor (V 4.2 a)**: Check 'yearsAtAddress' and 'employmentDetails'. Long tenure = ties to home.
3. **Business Rules**: If purpose is Business, check 'willBePaidInUK'. Generally, visitors cannot be paid in UK sources.
4. **Immigration History**: 'immigrationBreaches' is a severe negative factor (suitability grounds).

Provide: Score (0-100), Risk Level (Low, Medium or High), Summary, Strengths, Weaknesses, Recommendations, and Guidance References."#;

const WHAT_IF_TASKS: &str = r#"Tasks:
1. Re-calculate the score (0-100) and risk level (Low, Medium or High).
2. Provide a "scenarioDeltaExplanation" explaining WHY the score changed (or stayed the same).
3. Focus on Disposable Income (Income - Expenses). If Expenses are high, risk increases.
4. If Business Visitor: Check if they are being paid in UK (V 4.7). Being paid in UK is generally prohibited unless Permitted Paid Engagement."#;

/// Build the user prompt for a request.
pub fn build_prompt(request: &AssessmentRequest) -> Result<String, serde_json::Error> {
    match &request.baseline {
        Some(baseline) => what_if_prompt(&request.application, baseline),
        None => initial_prompt(&request.application),
    }
}

pub fn initial_prompt(application: &EnrichedApplication) -> Result<String, serde_json::Error> {
    let data = serde_json::to_string_pretty(application)?;
    Ok(format!(
        "Analyze this UK Standard Visitor Visa application simulation data against the Home Office \"Visit Caseworker Guidance\".\n\n\
         Application Data (Enriched):\n{}\n\n{}",
        data, INITIAL_CRITERIA
    ))
}

pub fn what_if_prompt(
    application: &EnrichedApplication,
    baseline: &BaselineSummary,
) -> Result<String, serde_json::Error> {
    let data = serde_json::to_string_pretty(application)?;
    Ok(format!(
        "Perform a \"What If\" analysis.\n\n\
         BASELINE RESULT:\n- Previous Score: {}\n- Previous Risk: {}\n\n\
         NEW MODIFIED DATA:\n{}\n\n{}",
        format_score(baseline.score),
        baseline.risk_level,
        data,
        WHAT_IF_TASKS
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use visa_core::{ApplicationData, RiskLevel};

    fn request(baseline: Option<BaselineSummary>) -> AssessmentRequest {
        let mut data = ApplicationData::default();
        data.finances.monthly_expenses = 3000.0;
        AssessmentRequest::new(data, baseline, NaiveDate::from_ymd_opt(2025, 6, 1).unwrap())
    }

    #[test]
    fn test_initial_prompt() {
        let prompt = build_prompt(&request(None)).unwrap();
        assert!(prompt.contains("Visit Caseworker Guidance"));
        assert!(prompt.contains("V 4.2 e"));
        assert!(prompt.contains("\"calculatedMetrics\""));
        assert!(prompt.contains("\"disposableIncome\": -1000.0"));
        assert!(!prompt.contains("BASELINE RESULT"));
    }

    #[test]
    fn test_what_if_prompt() {
        let baseline = BaselineSummary {
            score: 78.0,
            risk_level: RiskLevel::Low,
        };
        let prompt = build_prompt(&request(Some(baseline))).unwrap();
        assert!(prompt.contains("- Previous Score: 78"));
        assert!(prompt.contains("- Previous Risk: Low"));
        assert!(prompt.contains("scenarioDeltaExplanation"));
        assert!(prompt.contains("V 4.7"));
        assert!(prompt.contains("NEW MODIFIED DATA"));
    }
}
