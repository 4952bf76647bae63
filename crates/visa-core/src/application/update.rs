//! Field-path reducer for `ApplicationData`.
//!
//! Updates are addressed as `section.field` or `section.subRecord.field`
//! using the wire (camelCase) names. Applying an update never mutates the
//! input: it returns a new `ApplicationData` in which only the addressed leaf
//! changed. Siblings inside the touched sub-record are preserved.

use serde_json::Value as JsonValue;
use std::fmt;
use thiserror::Error;

use super::{ApplicationData, BusinessDetails, RelativeDetails, SponsorDetails};

/// Errors from building or applying a field update.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UpdateError {
    #[error("Invalid field path '{0}': expected section.field or section.record.field")]
    InvalidPath(String),

    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Field {path} holds {expected}, got {found}")]
    TypeMismatch {
        path: String,
        expected: FieldKind,
        found: FieldKind,
    },

    #[error("Invalid value for {path}: {message}")]
    InvalidValue { path: String, message: String },

    #[error("Field {path} is read-only: {reason}")]
    Locked { path: String, reason: &'static str },
}

/// Top-level sections of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    PersonalInfo,
    TravelDetails,
    Finances,
    History,
    TiesToHome,
}

impl Section {
    pub const ALL: [Section; 5] = [
        Section::PersonalInfo,
        Section::TravelDetails,
        Section::Finances,
        Section::History,
        Section::TiesToHome,
    ];

    /// Wire name of the section.
    pub fn key(&self) -> &'static str {
        match self {
            Section::PersonalInfo => "personalInfo",
            Section::TravelDetails => "travelDetails",
            Section::Finances => "finances",
            Section::History => "history",
            Section::TiesToHome => "tiesToHome",
        }
    }

    fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.key() == key)
    }
}

/// A validated path to one leaf field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    section: Section,
    segments: Vec<String>,
    dotted: String,
}

impl FieldPath {
    /// Parse a dotted path such as `finances.monthlyExpenses`.
    pub fn parse(path: &str) -> Result<Self, UpdateError> {
        let parts: Vec<&str> = path.trim().split('.').collect();
        if !(2..=3).contains(&parts.len()) || parts.iter().any(|p| p.is_empty()) {
            return Err(UpdateError::InvalidPath(path.to_string()));
        }

        let section = Section::from_key(parts[0])
            .ok_or_else(|| UpdateError::UnknownField(path.to_string()))?;

        Ok(Self {
            section,
            segments: parts[1..].iter().map(|s| s.to_string()).collect(),
            dotted: parts.join("."),
        })
    }

    pub fn section(&self) -> Section {
        self.section
    }

    pub fn as_str(&self) -> &str {
        &self.dotted
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dotted)
    }
}

/// Kind of value a leaf holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    Flag,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Text => write!(f, "text"),
            FieldKind::Number => write!(f, "a number"),
            FieldKind::Flag => write!(f, "a yes/no flag"),
        }
    }
}

/// New value for a leaf field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Flag(bool),
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Text(_) => FieldKind::Text,
            FieldValue::Number(_) => FieldKind::Number,
            FieldValue::Flag(_) => FieldKind::Flag,
        }
    }

    /// Parse free-form input as a value of the given kind.
    pub fn parse(raw: &str, kind: FieldKind) -> Option<Self> {
        match kind {
            FieldKind::Text => Some(FieldValue::Text(raw.to_string())),
            FieldKind::Number => raw.trim().parse::<f64>().ok().map(FieldValue::Number),
            FieldKind::Flag => match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "y" | "1" => Some(FieldValue::Flag(true)),
                "false" | "no" | "n" | "0" => Some(FieldValue::Flag(false)),
                _ => None,
            },
        }
    }

    fn to_json(&self, path: &FieldPath) -> Result<JsonValue, UpdateError> {
        match self {
            FieldValue::Text(s) => Ok(JsonValue::String(s.clone())),
            FieldValue::Flag(b) => Ok(JsonValue::Bool(*b)),
            // Integral numbers go out as integers so they land in i64 fields.
            FieldValue::Number(n) if n.fract() == 0.0 && n.abs() < 9.0e15 => {
                Ok(JsonValue::from(*n as i64))
            }
            FieldValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(JsonValue::Number)
                .ok_or_else(|| UpdateError::InvalidValue {
                    path: path.to_string(),
                    message: "number must be finite".to_string(),
                }),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(value as f64)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Flag(value)
    }
}

/// A single field assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldUpdate {
    pub path: FieldPath,
    pub value: FieldValue,
}

impl FieldUpdate {
    /// Build an update from a dotted path and a typed value.
    pub fn new(path: &str, value: impl Into<FieldValue>) -> Result<Self, UpdateError> {
        Ok(Self {
            path: FieldPath::parse(path)?,
            value: value.into(),
        })
    }

    /// Build an update from raw text, coercing it to the kind of value
    /// currently stored at `path`.
    pub fn from_input(data: &ApplicationData, path: &str, raw: &str) -> Result<Self, UpdateError> {
        let path = FieldPath::parse(path)?;
        let kind = field_kind(data, &path)?;
        let value = FieldValue::parse(raw, kind).ok_or_else(|| UpdateError::InvalidValue {
            path: path.to_string(),
            message: format!("expected {}", kind),
        })?;
        Ok(Self { path, value })
    }
}

/// Kind of value stored at `path` in `data`.
pub fn field_kind(data: &ApplicationData, path: &FieldPath) -> Result<FieldKind, UpdateError> {
    let mut root = to_json(data)?;
    let slot = leaf_mut(&mut root, path)?;
    kind_of(slot, path)
}

/// Apply an update and return the new application.
pub fn apply(data: &ApplicationData, update: &FieldUpdate) -> Result<ApplicationData, UpdateError> {
    let mut root = to_json(data)?;
    let slot = leaf_mut(&mut root, &update.path)?;

    let expected = kind_of(slot, &update.path)?;
    let found = update.value.kind();
    if expected != found {
        return Err(UpdateError::TypeMismatch {
            path: update.path.to_string(),
            expected,
            found,
        });
    }

    *slot = update.value.to_json(&update.path)?;

    serde_json::from_value(root).map_err(|e| UpdateError::InvalidValue {
        path: update.path.to_string(),
        message: e.to_string(),
    })
}

fn to_json(data: &ApplicationData) -> Result<JsonValue, UpdateError> {
    serde_json::to_value(data).map_err(|e| UpdateError::InvalidValue {
        path: String::new(),
        message: e.to_string(),
    })
}

fn leaf_mut<'a>(root: &'a mut JsonValue, path: &FieldPath) -> Result<&'a mut JsonValue, UpdateError> {
    let unknown = || UpdateError::UnknownField(path.to_string());

    let mut current = root.get_mut(path.section.key()).ok_or_else(unknown)?;
    let last = path.segments.len() - 1;
    for (i, segment) in path.segments.iter().enumerate() {
        let record = current.as_object_mut().ok_or_else(unknown)?;
        // An absent optional sub-record is created empty, then merged into.
        if i < last && record.get(segment).map_or(true, JsonValue::is_null) {
            let empty = empty_record(path.section, segment).ok_or_else(unknown)?;
            record.insert(segment.clone(), empty);
        }
        current = record.get_mut(segment).ok_or_else(unknown)?;
    }
    Ok(current)
}

fn empty_record(section: Section, key: &str) -> Option<JsonValue> {
    let value = match (section, key) {
        (Section::TravelDetails, "businessDetails") => serde_json::to_value(BusinessDetails::default()),
        (Section::TravelDetails, "relativeDetails") => serde_json::to_value(RelativeDetails::default()),
        (Section::Finances, "sponsorDetails") => serde_json::to_value(SponsorDetails::default()),
        _ => return None,
    };
    value.ok()
}

fn kind_of(value: &JsonValue, path: &FieldPath) -> Result<FieldKind, UpdateError> {
    match value {
        JsonValue::String(_) => Ok(FieldKind::Text),
        JsonValue::Number(_) => Ok(FieldKind::Number),
        JsonValue::Bool(_) => Ok(FieldKind::Flag),
        // Records are not leaves.
        _ => Err(UpdateError::UnknownField(path.to_string())),
    }
}
