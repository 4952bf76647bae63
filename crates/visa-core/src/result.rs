//! Assessment results as returned by the scoring service.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Risk tier assigned by the scoring service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Low" => Ok(RiskLevel::Low),
            "Medium" => Ok(RiskLevel::Medium),
            "High" => Ok(RiskLevel::High),
            other => Err(format!("unknown risk level '{}'", other)),
        }
    }
}

/// Outcome of one assessment. Immutable once received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityResult {
    /// Nominally 0 to 100; not clamped
    pub score: f64,
    pub risk_level: RiskLevel,
    pub summary: String,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub recommendations: Vec<String>,
    pub guidance_references: Vec<String>,
    /// Only present when the request carried a baseline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario_delta_explanation: Option<String>,
}

impl EligibilityResult {
    /// The part of this result sent along with what-if requests.
    pub fn baseline_summary(&self) -> BaselineSummary {
        BaselineSummary {
            score: self.score,
            risk_level: self.risk_level,
        }
    }
}

/// Baseline data passed to the scoring service in simulation mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaselineSummary {
    pub score: f64,
    pub risk_level: RiskLevel,
}

/// Format a score without a trailing `.0` for whole numbers.
pub fn format_score(score: f64) -> String {
    if score.fract() == 0.0 {
        format!("{}", score as i64)
    } else {
        format!("{:.1}", score)
    }
}
