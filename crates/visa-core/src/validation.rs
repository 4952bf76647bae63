//! Per-step validation.
//!
//! Only steps 1 to 3 carry required fields. Errors are plain data keyed by a
//! short field key; they gate forward navigation and are shown next to the
//! offending input.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::application::ApplicationData;
use crate::step::Step;

/// Field-level errors for one step, ordered by field key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StepErrors {
    errors: BTreeMap<&'static str, &'static str>,
}

impl StepErrors {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Message for a field key, if that field failed.
    pub fn get(&self, field: &str) -> Option<&'static str> {
        self.errors.get(field).copied()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.errors.iter().map(|(k, v)| (*k, *v))
    }

    fn insert(&mut self, field: &'static str, message: &'static str) {
        self.errors.insert(field, message);
    }
}

/// Validate the fields shown on `step`.
pub fn validate_step(data: &ApplicationData, step: Step) -> StepErrors {
    let mut errors = StepErrors::default();

    match step {
        Step::PersonalIdentity => {
            let info = &data.personal_info;
            if info.nationality.is_empty() {
                errors.insert("nationality", "Nationality is required");
            }
            if info.given_name.is_empty() {
                errors.insert("givenName", "Given name is required");
            }
            if info.family_name.is_empty() {
                errors.insert("familyName", "Family name is required");
            }
            if !info.email.contains('@') {
                errors.insert("email", "Valid email is required");
            }
        }
        Step::TravelAccommodation => {
            let travel = &data.travel_details;
            if travel.duration_days <= 0 {
                errors.insert("duration", "Duration must be positive");
            }
            if travel.has_specific_dates {
                if travel.start_date.is_empty() {
                    errors.insert("startDate", "Start date required");
                }
                if travel.end_date.is_empty() {
                    errors.insert("endDate", "End date required");
                }
            }
        }
        Step::Finances => {
            let finances = &data.finances;
            if finances.estimated_trip_cost <= 0.0 {
                errors.insert("cost", "Estimated cost required");
            }
            if finances.monthly_expenses < 0.0 {
                errors.insert("expenses", "Expenses cannot be negative");
            }
        }
        Step::TiesToHome | Step::FinalReview | Step::Results => {}
    }

    errors
}
