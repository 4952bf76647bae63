//! Process configuration from the environment (and `.env`, if present).

use serde_json::{json, Value as JsonValue};
use std::env;
use std::time::Duration;
use thiserror::Error;
use visa_runtime::providers::DEFAULT_GEMINI_MODEL;
use visa_runtime::RetryPolicy;

const DEFAULT_PROVIDER: &str = "gemini";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_MAX_RETRIES: usize = 2;
const DEFAULT_TEMPERATURE: f32 = 0.2;
const DEFAULT_LOG_LEVEL: &str = "warn";

/// Top-level configuration for the simulator.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub provider: ProviderSettings,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup. `load` uses the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let timeout = match get("VISA_TIMEOUT") {
            Some(raw) => humantime::parse_duration(raw.trim()).map_err(|_| ConfigError::Invalid {
                var: "VISA_TIMEOUT",
                expected: "a duration such as 60s or 2m",
                value: raw,
            })?,
            None => DEFAULT_TIMEOUT,
        };

        let max_retries = match get("VISA_MAX_RETRIES") {
            Some(raw) => raw.trim().parse::<usize>().map_err(|_| ConfigError::Invalid {
                var: "VISA_MAX_RETRIES",
                expected: "a non-negative integer",
                value: raw,
            })?,
            None => DEFAULT_MAX_RETRIES,
        };

        let temperature = match get("VISA_TEMPERATURE") {
            Some(raw) => raw
                .trim()
                .parse::<f32>()
                .ok()
                .filter(|t| (0.0..=2.0).contains(t))
                .ok_or(ConfigError::Invalid {
                    var: "VISA_TEMPERATURE",
                    expected: "a number between 0 and 2",
                    value: raw,
                })?,
            None => DEFAULT_TEMPERATURE,
        };

        Ok(Self {
            provider: ProviderSettings {
                kind: get("VISA_PROVIDER").unwrap_or_else(|| DEFAULT_PROVIDER.to_string()),
                model: get("VISA_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
                base_url: get("VISA_API_BASE_URL"),
                timeout,
                max_retries,
                temperature,
            },
            telemetry: TelemetryConfig {
                log_level: get("VISA_LOG_LEVEL").unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            },
        })
    }
}

/// Which assessment provider to use and how to call it.
///
/// The API key is not held here: the provider reads `GEMINI_API_KEY` (or
/// `API_KEY`) itself and keeps it redacted.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub kind: String,
    pub model: String,
    pub base_url: Option<String>,
    pub timeout: Duration,
    pub max_retries: usize,
    pub temperature: f32,
}

impl ProviderSettings {
    /// JSON config as consumed by the provider registry.
    pub fn to_json(&self) -> JsonValue {
        let mut config = json!({
            "model": self.model,
            "temperature": self.temperature,
            "timeout": humantime::format_duration(self.timeout).to_string(),
        });
        if let Some(url) = &self.base_url {
            config["base_url"] = json!(url);
        }
        config
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            ..RetryPolicy::default()
        }
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got '{value}'")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use visa_runtime::CompletionConfig;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.provider.kind, "gemini");
        assert_eq!(config.provider.model, DEFAULT_GEMINI_MODEL);
        assert_eq!(config.provider.timeout, Duration::from_secs(60));
        assert_eq!(config.provider.max_retries, 2);
        assert!(config.provider.base_url.is_none());
        assert_eq!(config.telemetry.log_level, "warn");
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("VISA_MODEL", "gemini-2.5-flash"),
            ("VISA_TIMEOUT", "2m"),
            ("VISA_MAX_RETRIES", "0"),
            ("VISA_TEMPERATURE", "0.7"),
            ("VISA_API_BASE_URL", "http://localhost:8080/v1beta"),
            ("VISA_LOG_LEVEL", "debug"),
        ])
        .unwrap();

        assert_eq!(config.provider.model, "gemini-2.5-flash");
        assert_eq!(config.provider.timeout, Duration::from_secs(120));
        assert_eq!(config.provider.retry_policy().max_retries, 0);
        assert_eq!(config.provider.temperature, 0.7);
        assert_eq!(config.telemetry.log_level, "debug");
    }

    #[test]
    fn test_blank_values_fall_back() {
        let config = config_from(&[("VISA_MODEL", "  "), ("VISA_TIMEOUT", "")]).unwrap();
        assert_eq!(config.provider.model, DEFAULT_GEMINI_MODEL);
        assert_eq!(config.provider.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = config_from(&[("VISA_TIMEOUT", "soon")]).unwrap_err();
        assert!(err.to_string().starts_with("VISA_TIMEOUT"));

        assert!(config_from(&[("VISA_MAX_RETRIES", "-1")]).is_err());
        assert!(config_from(&[("VISA_TEMPERATURE", "3.5")]).is_err());
    }

    #[test]
    fn test_provider_json_round_trips_through_completion_config() {
        let config = config_from(&[("VISA_TIMEOUT", "90s"), ("VISA_API_BASE_URL", "http://mock")]).unwrap();
        let json = config.provider.to_json();
        assert_eq!(json["base_url"], "http://mock");

        let completion = CompletionConfig::from_json(&json).unwrap();
        assert_eq!(completion.timeout, Duration::from_secs(90));
        assert_eq!(completion.model, DEFAULT_GEMINI_MODEL);
    }
}
