//! API key handling for providers.
//!
//! Keys are wrapped in [`secrecy::SecretString`] as soon as they are read and
//! only exposed when the request header is built.

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value as JsonValue;
use std::fmt;

use super::ProviderError;

/// Where a credential was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// Loaded from provider JSON config
    Config,
    /// Loaded from the named environment variable
    Environment(&'static str),
    /// Provided programmatically
    Programmatic,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::Config => write!(f, "config"),
            CredentialSource::Environment(var) => write!(f, "${}", var),
            CredentialSource::Programmatic => write!(f, "programmatic"),
        }
    }
}

/// An API key that never shows up in `Debug` or `Display` output.
pub struct ApiCredential {
    value: SecretString,
    source: CredentialSource,
    name: &'static str,
}

impl ApiCredential {
    pub fn new(value: impl Into<String>, source: CredentialSource, name: &'static str) -> Self {
        Self {
            value: SecretString::from(value.into()),
            source,
            name,
        }
    }

    /// Load from `config[config_key]`, then from the first set, non-empty
    /// variable in `env_vars`.
    pub fn from_config_or_env(
        config: &JsonValue,
        config_key: &str,
        env_vars: &[&'static str],
        name: &'static str,
    ) -> Result<Self, ProviderError> {
        if let Some(value) = config[config_key].as_str().filter(|v| !v.is_empty()) {
            return Ok(Self::new(value, CredentialSource::Config, name));
        }

        for var in env_vars {
            if let Some(value) = std::env::var(var).ok().filter(|v| !v.is_empty()) {
                return Ok(Self::new(value, CredentialSource::Environment(*var), name));
            }
        }

        Err(ProviderError::NotConfigured(format!(
            "{} required: set '{}' in config or one of {} in the environment",
            name,
            config_key,
            env_vars.join(", ")
        )))
    }

    /// Check availability without loading the value.
    pub fn is_available(config: &JsonValue, config_key: &str, env_vars: &[&str]) -> bool {
        config[config_key].as_str().is_some_and(|v| !v.is_empty())
            || env_vars
                .iter()
                .any(|var| std::env::var(var).is_ok_and(|v| !v.is_empty()))
    }

    /// Expose the value. Call only where the header is set.
    pub fn expose(&self) -> &str {
        self.value.expose_secret()
    }

    pub fn is_empty(&self) -> bool {
        self.value.expose_secret().is_empty()
    }

    pub fn source(&self) -> CredentialSource {
        self.source
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredential")
            .field("value", &"[REDACTED]")
            .field("source", &self.source)
            .field("name", &self.name)
            .finish()
    }
}

impl fmt::Display for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} from {} [REDACTED]", self.name, self.source)
    }
}
