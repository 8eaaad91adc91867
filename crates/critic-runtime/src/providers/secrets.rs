//! Secure credential handling for LLM providers.
//!
//! API keys are wrapped so they cannot leak through `Debug` output or
//! error messages, are zeroed on drop, and must be exposed explicitly
//! at the point of use:
//!
//! ```ignore
//! let cred = ApiCredential::from_config_or_env(
//!     &config, "api_key", "OPENAI_API_KEY", "OpenAI API key",
//! )?;
//! request.header("authorization", format!("Bearer {}", cred.expose()));
//! ```

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value as JsonValue;
use std::fmt;

use super::ProviderError;

/// Where a credential was loaded from.
///
/// Useful for diagnosing configuration issues without exposing the
/// credential value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// Loaded from configuration JSON.
    Config,
    /// Loaded from an environment variable.
    Environment,
    /// Provided programmatically.
    Programmatic,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::Config => write!(f, "config"),
            CredentialSource::Environment => write!(f, "environment"),
            CredentialSource::Programmatic => write!(f, "programmatic"),
        }
    }
}

/// A securely-stored API credential.
///
/// Debug shows `[REDACTED]`; the underlying value is only reachable
/// through [`ApiCredential::expose`].
pub struct ApiCredential {
    value: SecretString,
    source: CredentialSource,
    name: &'static str,
}

impl ApiCredential {
    /// Wrap a credential value.
    pub fn new(value: impl Into<String>, source: CredentialSource, name: &'static str) -> Self {
        Self {
            value: SecretString::from(value.into()),
            source,
            name,
        }
    }

    /// Load a credential from an environment variable.
    ///
    /// `name` is the human-readable label used in error messages,
    /// e.g. "OpenAI API key".
    pub fn from_env(env_var: &str, name: &'static str) -> Result<Self, ProviderError> {
        std::env::var(env_var)
            .map(|v| Self::new(v, CredentialSource::Environment, name))
            .map_err(|_| {
                ProviderError::NotConfigured(format!(
                    "{} not set: configure '{}' environment variable",
                    name, env_var
                ))
            })
    }

    /// Load from JSON config, falling back to an environment variable.
    pub fn from_config_or_env(
        config: &JsonValue,
        config_key: &str,
        env_var: &str,
        name: &'static str,
    ) -> Result<Self, ProviderError> {
        if let Some(value) = config[config_key].as_str() {
            return Ok(Self::new(value, CredentialSource::Config, name));
        }

        if let Ok(value) = std::env::var(env_var) {
            return Ok(Self::new(value, CredentialSource::Environment, name));
        }

        Err(ProviderError::NotConfigured(format!(
            "{} required: set '{}' in config or {} environment variable",
            name, config_key, env_var
        )))
    }

    /// Check availability without loading the value.
    pub fn is_available(config: &JsonValue, config_key: &str, env_var: &str) -> bool {
        config[config_key].as_str().is_some() || std::env::var(env_var).is_ok()
    }

    /// Expose the credential value. Call only at the point of use.
    pub fn expose(&self) -> &str {
        self.value.expose_secret()
    }

    /// Whether the stored value is empty.
    pub fn is_empty(&self) -> bool {
        self.value.expose_secret().is_empty()
    }

    /// Where this credential came from.
    pub fn source(&self) -> CredentialSource {
        self.source
    }
}

impl fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredential")
            .field("name", &self.name)
            .field("value", &"[REDACTED]")
            .field("source", &self.source)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_value() {
        let cred = ApiCredential::new("sk-very-secret", CredentialSource::Programmatic, "Test key");
        let debug = format!("{:?}", cred);
        assert!(!debug.contains("sk-very-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_expose_returns_value() {
        let cred = ApiCredential::new("sk-very-secret", CredentialSource::Programmatic, "Test key");
        assert_eq!(cred.expose(), "sk-very-secret");
        assert!(!cred.is_empty());
    }

    #[test]
    fn test_config_takes_precedence() {
        let config = serde_json::json!({"api_key": "from-config"});
        let cred = ApiCredential::from_config_or_env(
            &config,
            "api_key",
            "CRITIC_TEST_UNSET_VAR",
            "Test key",
        )
        .unwrap();
        assert_eq!(cred.expose(), "from-config");
        assert_eq!(cred.source(), CredentialSource::Config);
    }

    #[test]
    fn test_missing_everywhere_is_not_configured() {
        let config = serde_json::json!({});
        let result = ApiCredential::from_config_or_env(
            &config,
            "api_key",
            "CRITIC_TEST_UNSET_VAR",
            "Test key",
        );
        assert!(matches!(result, Err(ProviderError::NotConfigured(_))));
    }

    #[test]
    fn test_is_available_checks_config() {
        let config = serde_json::json!({"api_key": "x"});
        assert!(ApiCredential::is_available(&config, "api_key", "CRITIC_TEST_UNSET_VAR"));
        let empty = serde_json::json!({});
        assert!(!ApiCredential::is_available(&empty, "api_key", "CRITIC_TEST_UNSET_VAR"));
    }
}
