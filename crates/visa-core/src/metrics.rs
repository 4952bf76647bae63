//! Affordability metrics attached to every assessment request.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::application::ApplicationData;

pub const AFFORDABILITY_HIGH: &str = "High (Disposable income > Trip Cost / 3)";
pub const AFFORDABILITY_LOW: &str = "Low - Risk of using savings without replenishment";

/// Values computed from the application before it is sent for assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculatedMetrics {
    /// Monthly income minus monthly expenses
    pub disposable_income: f64,

    pub affordability_status: String,

    /// Whole years since the date of birth; `None` if `dob` does not parse
    pub age: Option<i64>,
}

impl CalculatedMetrics {
    pub fn compute(data: &ApplicationData, today: NaiveDate) -> Self {
        let disposable_income = disposable_income(data);
        Self {
            disposable_income,
            affordability_status: affordability_status(
                disposable_income,
                data.finances.estimated_trip_cost,
            )
            .to_string(),
            age: age_on(&data.personal_info.dob, today),
        }
    }
}

pub fn disposable_income(data: &ApplicationData) -> f64 {
    data.finances.monthly_income - data.finances.monthly_expenses
}

/// Three months of disposable income must exceed the trip cost.
pub fn affordability_status(disposable_income: f64, trip_cost: f64) -> &'static str {
    if disposable_income * 3.0 > trip_cost {
        AFFORDABILITY_HIGH
    } else {
        AFFORDABILITY_LOW
    }
}

/// Age in whole years on `today`.
pub fn age_on(dob: &str, today: NaiveDate) -> Option<i64> {
    let birth = NaiveDate::parse_from_str(dob.trim(), "%Y-%m-%d").ok()?;
    let mut years = i64::from(today.year() - birth.year());
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        years -= 1;
    }
    Some(years)
}
