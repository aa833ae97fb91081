//! Connection settings for the Pulse API.

use crate::error::{PulseError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "PULSE_API_KEY";
/// Environment variable holding the application id.
pub const APPLICATION_ID_ENV: &str = "PULSE_APPLICATION_ID";
/// Environment variable overriding the base URL.
pub const BASE_URL_ENV: &str = "PULSE_BASE_URL";

/// Credentials and endpoint for one Pulse application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PulseConfig {
    /// API key for authentication.
    #[serde(skip_serializing)]
    pub api_key: String,

    /// Application whose semantics and data are queried.
    pub application_id: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout. Requests are never retried.
    #[serde(default = "default_timeout", with = "timeout_secs")]
    pub timeout: Duration,
}

impl PulseConfig {
    pub fn new(api_key: impl Into<String>, application_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            application_id: application_id.into(),
            base_url: default_base_url(),
            timeout: default_timeout(),
        }
    }

    /// Read `PULSE_API_KEY`, `PULSE_APPLICATION_ID` and optionally `PULSE_BASE_URL`.
    pub fn from_env() -> Result<Self> {
        let api_key = require_env(API_KEY_ENV)?;
        let application_id = require_env(APPLICATION_ID_ENV)?;

        let mut config = Self::new(api_key, application_id);
        if let Ok(base_url) = std::env::var(BASE_URL_ENV) {
            config.base_url = base_url;
        }
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Check that credentials are present and the base URL is usable.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(PulseError::Config("api_key must not be empty".to_string()));
        }
        if self.application_id.trim().is_empty() {
            return Err(PulseError::Config(
                "application_id must not be empty".to_string(),
            ));
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(PulseError::Config(format!(
                "base_url must be an http(s) URL, got '{}'",
                self.base_url
            )));
        }
        Ok(())
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| PulseError::Config(format!("Environment variable '{}' not set", key)))
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

/// Whole seconds on the wire, matching the LLM config.
mod timeout_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(timeout: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(timeout.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let config = PulseConfig::new("key", "app-1")
            .with_base_url("https://pulse.internal")
            .with_timeout(Duration::from_secs(5));

        assert_eq!(config.application_id, "app-1");
        assert_eq!(config.base_url, "https://pulse.internal");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_blank_credentials() {
        assert!(matches!(
            PulseConfig::new("", "app").validate(),
            Err(PulseError::Config(_))
        ));
        assert!(matches!(
            PulseConfig::new("key", " ").validate(),
            Err(PulseError::Config(_))
        ));
        assert!(matches!(
            PulseConfig::new("key", "app").with_base_url("ftp://x").validate(),
            Err(PulseError::Config(_))
        ));
    }

    #[test]
    fn test_api_key_not_serialized() {
        let json = serde_json::to_string(&PulseConfig::new("secret-key", "app")).unwrap();
        assert!(!json.contains("secret-key"));
        assert!(json.contains("app"));
    }

    #[test]
    fn test_timeout_is_whole_seconds() {
        let config = PulseConfig::new("key", "app").with_timeout(Duration::from_secs(12));
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["timeout"], 12);

        let parsed: PulseConfig =
            serde_json::from_str(r#"{"api_key": "k", "application_id": "app", "timeout": 7}"#).unwrap();
        assert_eq!(parsed.timeout, Duration::from_secs(7));

        let defaulted: PulseConfig =
            serde_json::from_str(r#"{"api_key": "k", "application_id": "app"}"#).unwrap();
        assert_eq!(defaulted.timeout, Duration::from_secs(30));
        assert_eq!(defaulted.base_url, "http://localhost:8080");
    }
}
