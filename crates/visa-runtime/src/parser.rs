//! Parsing model output into an [`EligibilityResult`].
//!
//! The text is unwrapped from a Markdown code fence if present, checked
//! against `schema/eligibility_result.schema.json`, then deserialized.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value as JsonValue;
use std::sync::OnceLock;
use thiserror::Error;
use visa_core::EligibilityResult;

/// Response schema, shared by the provider request and local validation.
const RESULT_SCHEMA_JSON: &str = include_str!("../schema/eligibility_result.schema.json");

static COMPILED_SCHEMA: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();

lazy_static! {
    /// ```json ... ``` or ``` ... ``` around the whole payload
    static ref CODE_FENCE: Regex =
        Regex::new(r"(?s)^\s*```[A-Za-z]*\s*\n?(.*?)\n?\s*```\s*$").unwrap();
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("response is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("response does not match the result schema: {}", .0.join("; "))]
    SchemaViolation(Vec<String>),

    #[error("failed to load result schema: {0}")]
    SchemaUnavailable(String),
}

/// The response schema as JSON, for the provider request.
pub fn response_schema() -> Result<JsonValue, ParseError> {
    serde_json::from_str(RESULT_SCHEMA_JSON).map_err(|e| ParseError::SchemaUnavailable(e.to_string()))
}

fn validator() -> Result<&'static jsonschema::Validator, ParseError> {
    let compiled = COMPILED_SCHEMA.get_or_init(|| {
        let schema = response_schema().map_err(|e| e.to_string())?;
        jsonschema::options()
            .build(&schema)
            .map_err(|e| format!("Failed to compile schema: {}", e))
    });

    compiled
        .as_ref()
        .map_err(|e| ParseError::SchemaUnavailable(e.clone()))
}

/// Strip a surrounding Markdown code fence, if any.
pub fn unwrap_code_fence(text: &str) -> &str {
    match CODE_FENCE.captures(text).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str().trim(),
        None => text.trim(),
    }
}

/// Check a JSON value against the result schema.
pub fn validate_result_json(value: &JsonValue) -> Result<(), ParseError> {
    let errors: Vec<String> = validator()?
        .iter_errors(value)
        .map(|e| format!("{} at '{}'", e, e.instance_path))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ParseError::SchemaViolation(errors))
    }
}

/// Parse model output into a result.
pub fn parse_result(text: &str) -> Result<EligibilityResult, ParseError> {
    let body = unwrap_code_fence(text);
    let value: JsonValue =
        serde_json::from_str(body).map_err(|e| ParseError::InvalidJson(e.to_string()))?;

    validate_result_json(&value)?;

    serde_json::from_value(value).map_err(|e| ParseError::InvalidJson(e.to_string()))
}
