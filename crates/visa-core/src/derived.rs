//! Derived trip duration.
//!
//! When the applicant gives explicit travel dates, `durationDays` follows the
//! date span. Reversed, equal or unparseable dates leave the stored duration
//! exactly as it was; nothing is reported.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::application::{ApplicationData, FieldPath};

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Fields whose change re-runs the duration rule.
pub const DATE_TRIGGER_FIELDS: [&str; 3] = [
    "travelDetails.hasSpecificDates",
    "travelDetails.startDate",
    "travelDetails.endDate",
];

/// The duration field, read-only while explicit dates are enabled.
pub const DURATION_FIELD: &str = "travelDetails.durationDays";

pub fn is_date_trigger(path: &FieldPath) -> bool {
    DATE_TRIGGER_FIELDS.contains(&path.as_str())
}

/// Whether `durationDays` is currently driven by the date range.
pub fn duration_locked(data: &ApplicationData) -> bool {
    data.travel_details.has_specific_dates
}

/// Parse a travel date.
///
/// Accepts `YYYY-MM-DD` (midnight UTC), `YYYY-MM-DDTHH:MM[:SS]` (read as UTC)
/// and RFC 3339 timestamps.
pub fn parse_travel_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|dt| dt.and_utc())
}

/// Whole days covered by `start..end`, rounded up. `None` unless `end > start`.
pub fn span_days(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<i64> {
    let millis = (end - start).num_milliseconds();
    if millis <= 0 {
        return None;
    }
    Some((millis + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY)
}

/// Re-run the duration rule. Returns the new duration when it was set.
pub fn refresh_duration(data: &mut ApplicationData) -> Option<i64> {
    let travel = &mut data.travel_details;
    if !travel.has_specific_dates || travel.start_date.is_empty() || travel.end_date.is_empty() {
        return None;
    }

    let start = parse_travel_date(&travel.start_date)?;
    let end = parse_travel_date(&travel.end_date)?;
    let days = span_days(start, end)?;

    if travel.duration_days != days {
        tracing::debug!(from = travel.duration_days, to = days, "Duration derived from travel dates");
    }
    travel.duration_days = days;
    Some(days)
}
