//! The application form data model.
//!
//! `ApplicationData` is the single aggregate the wizard collects. Field names
//! serialize in camelCase because the same JSON is what the assessment service
//! receives.

mod choices;
mod update;

pub use choices::{ACCOMMODATION_TYPES, COUNTRIES, MARITAL_STATUSES, RESIDENTIAL_STATUSES};
pub use update::{apply, FieldKind, FieldPath, FieldUpdate, FieldValue, Section, UpdateError};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors from loading an application file.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read application file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// One applicant's visa application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationData {
    pub personal_info: PersonalInfo,
    pub travel_details: TravelDetails,
    pub finances: Finances,
    pub history: History,
    pub ties_to_home: TiesToHome,
}

impl ApplicationData {
    /// Parse an application from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, LoadError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Parse an application from JSON.
    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load an application file, choosing the format by extension.
    ///
    /// `.json` files are read as JSON, everything else as YAML (which also
    /// accepts plain JSON documents).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&content),
            _ => Self::from_yaml(&content),
        }
    }

    /// Given and family name joined for display.
    pub fn full_name(&self) -> String {
        let info = &self.personal_info;
        format!("{} {}", info.given_name, info.family_name)
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalInfo {
    pub given_name: String,
    pub family_name: String,
    /// Date of birth, `YYYY-MM-DD`
    pub dob: String,
    pub nationality: String,
    #[serde(default)]
    pub other_nationality: String,
    #[serde(default)]
    pub residence_country: String,
    #[serde(default)]
    pub years_at_address: i64,
    pub residential_status: ResidentialStatus,
    pub marital_status: String,
    #[serde(default)]
    pub gender: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

impl Default for PersonalInfo {
    fn default() -> Self {
        Self {
            given_name: String::new(),
            family_name: String::new(),
            dob: "1990-01-01".to_string(),
            nationality: String::new(),
            other_nationality: String::new(),
            residence_country: String::new(),
            years_at_address: 0,
            residential_status: ResidentialStatus::Rent,
            marital_status: "Single".to_string(),
            gender: "Male".to_string(),
            email: String::new(),
            phone: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TravelDetails {
    pub purpose: Purpose,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_details: Option<BusinessDetails>,
    pub duration_days: i64,
    #[serde(default)]
    pub has_specific_dates: bool,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default)]
    pub travel_companions: bool,
    pub accommodation_type: AccommodationType,
    #[serde(default)]
    pub accommodation_details: String,
    #[serde(default, rename = "hasRelativesInUK")]
    pub has_relatives_in_uk: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_details: Option<RelativeDetails>,
}

impl Default for TravelDetails {
    fn default() -> Self {
        Self {
            purpose: Purpose::Tourism,
            business_details: Some(BusinessDetails::default()),
            duration_days: 14,
            has_specific_dates: false,
            start_date: String::new(),
            end_date: String::new(),
            travel_companions: false,
            accommodation_type: AccommodationType::Hotel,
            accommodation_details: String::new(),
            has_relatives_in_uk: false,
            relative_details: Some(RelativeDetails::default()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct BusinessDetails {
    pub company_name: String,
    pub activity_reason: String,
    #[serde(rename = "willBePaidInUK")]
    pub will_be_paid_in_uk: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RelativeDetails {
    pub relationship: String,
    pub residency_status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finances {
    pub paying_party: PayingParty,
    pub employment_status: String,
    pub monthly_income: f64,
    pub monthly_expenses: f64,
    pub savings_amount: f64,
    pub estimated_trip_cost: f64,
    #[serde(default)]
    pub has_financial_dependents: bool,
    #[serde(default)]
    pub financial_dependents_count: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sponsor_details: Option<SponsorDetails>,
}

impl Default for Finances {
    fn default() -> Self {
        Self {
            paying_party: PayingParty::SelfFunded,
            employment_status: "Employed".to_string(),
            monthly_income: 2000.0,
            monthly_expenses: 800.0,
            savings_amount: 5000.0,
            estimated_trip_cost: 1500.0,
            has_financial_dependents: false,
            financial_dependents_count: 0,
            sponsor_details: Some(SponsorDetails::default()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SponsorDetails {
    pub name: String,
    pub relationship: String,
    pub reason: String,
    pub contribution_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct History {
    #[serde(default)]
    pub previous_visits: i64,
    #[serde(default, rename = "hasUKApprovals")]
    pub has_uk_approvals: bool,
    #[serde(default)]
    pub has_schengen_travel: bool,
    #[serde(default, rename = "hasUSACanadaTravel")]
    pub has_usa_canada_travel: bool,
    #[serde(default)]
    pub visa_refusals: bool,
    /// Overstaying, working illegally and similar breaches
    #[serde(default)]
    pub immigration_breaches: bool,
    #[serde(default)]
    pub refusal_details: String,
    #[serde(default)]
    pub criminal_record: bool,
}

/// Missing keys take the wizard-start values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TiesToHome {
    pub owns_property: bool,
    pub property_details: PropertyDetails,
    pub has_dependents: bool,
    pub dependent_details: String,
    pub employment_details: EmploymentDetails,
    pub has_job_offer_or_current_job: bool,
}

impl Default for TiesToHome {
    fn default() -> Self {
        Self {
            owns_property: false,
            property_details: PropertyDetails::default(),
            has_dependents: false,
            dependent_details: String::new(),
            employment_details: EmploymentDetails::default(),
            has_job_offer_or_current_job: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDetails {
    pub is_rented: bool,
    pub residence_duration_years: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmploymentDetails {
    pub is_permanent: bool,
    pub tenure_months: i64,
    pub job_title: String,
}

impl Default for EmploymentDetails {
    fn default() -> Self {
        Self {
            is_permanent: true,
            tenure_months: 0,
            job_title: String::new(),
        }
    }
}

/// Purpose of the visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Purpose {
    Tourism,
    Business,
    Family,
    Other,
}

impl fmt::Display for Purpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Purpose::Tourism => write!(f, "Tourism"),
            Purpose::Business => write!(f, "Business"),
            Purpose::Family => write!(f, "Family"),
            Purpose::Other => write!(f, "Other"),
        }
    }
}

/// Who pays for the trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayingParty {
    #[serde(rename = "Self")]
    SelfFunded,
    Employer,
    Sponsor,
    Other,
}

impl fmt::Display for PayingParty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayingParty::SelfFunded => write!(f, "Self"),
            PayingParty::Employer => write!(f, "Employer"),
            PayingParty::Sponsor => write!(f, "Sponsor"),
            PayingParty::Other => write!(f, "Other"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResidentialStatus {
    Own,
    Rent,
    Family,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccommodationType {
    Hotel,
    Airbnb,
    #[serde(rename = "Staying with family/friends")]
    FamilyOrFriends,
    #[serde(rename = "Student Accommodation")]
    StudentAccommodation,
    Hostel,
    #[serde(rename = "Not Decided")]
    NotDecided,
    Other,
}
