//! Wizard steps.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A wizard step. Steps 1 to 5 collect data; step 6 shows the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Step {
    PersonalIdentity = 1,
    TravelAccommodation = 2,
    Finances = 3,
    TiesToHome = 4,
    FinalReview = 5,
    Results = 6,
}

impl Step {
    pub const FIRST: Step = Step::PersonalIdentity;

    /// Steps that collect data, in order.
    pub const FORM_STEPS: [Step; 5] = [
        Step::PersonalIdentity,
        Step::TravelAccommodation,
        Step::Finances,
        Step::TiesToHome,
        Step::FinalReview,
    ];

    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Step::PersonalIdentity),
            2 => Some(Step::TravelAccommodation),
            3 => Some(Step::Finances),
            4 => Some(Step::TiesToHome),
            5 => Some(Step::FinalReview),
            6 => Some(Step::Results),
            _ => None,
        }
    }

    pub fn next(self) -> Option<Self> {
        Self::from_number(self.number() + 1)
    }

    pub fn previous(self) -> Option<Self> {
        Self::from_number(self.number().saturating_sub(1))
    }

    pub fn title(self) -> &'static str {
        match self {
            Step::PersonalIdentity => "Personal Identity",
            Step::TravelAccommodation => "Travel & Accommodation",
            Step::Finances => "Finances (in GBP)",
            Step::TiesToHome => "Strong Ties to Home",
            Step::FinalReview => "Final Review",
            Step::Results => "Application Rating",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Step {} ({})", self.number(), self.title())
    }
}

impl From<Step> for u8 {
    fn from(step: Step) -> Self {
        step.number()
    }
}

impl TryFrom<u8> for Step {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Step::from_number(value).ok_or_else(|| format!("step must be 1-6, got {}", value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_ordering() {
        assert_eq!(Step::FIRST.next(), Some(Step::TravelAccommodation));
        assert_eq!(Step::Results.next(), None);
        assert_eq!(Step::PersonalIdentity.previous(), None);
        assert_eq!(Step::FinalReview.previous(), Some(Step::TiesToHome));
        assert!(Step::Finances < Step::Results);
    }

    #[test]
    fn test_step_serializes_as_number() {
        assert_eq!(serde_json::to_value(Step::Finances).unwrap(), 3);
        let parsed: Step = serde_json::from_value(serde_json::json!(6)).unwrap();
        assert_eq!(parsed, Step::Results);
        assert!(serde_json::from_value::<Step>(serde_json::json!(7)).is_err());
    }
}
