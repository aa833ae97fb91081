//! Connection settings for OpenAI-compatible chat endpoints.

use crate::error::{LlmError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Model the agent was tuned against.
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo-0125";

/// Settings for one remote chat model.
///
/// The API key is never serialized, so a config can be logged or written
/// back to disk safely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteLlmConfig {
    #[serde(skip_serializing, default)]
    pub api_key: String,

    /// e.g. `https://api.openai.com/v1` or a local gateway such as
    /// `http://localhost:4000/v1`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_timeout", with = "timeout_secs")]
    pub timeout: Duration,

    /// Sent as `OpenAI-Organization` when set.
    #[serde(default)]
    pub organization: Option<String>,
}

impl RemoteLlmConfig {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
            model: model.into(),
            timeout: default_timeout(),
            organization: None,
        }
    }

    /// Read the key from `env_var`; base URL and model are given.
    pub fn from_env(
        env_var: &str,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self> {
        let api_key = std::env::var(env_var)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| LlmError::ApiKeyNotFound(format!("Environment variable: {}", env_var)))?;

        Ok(Self::new(api_key, base_url, model))
    }

    /// `OPENAI_API_KEY`, plus `OPENAI_BASE_URL` and `OPENAI_MODEL` when set.
    pub fn openai_from_env() -> Result<Self> {
        let base_url = std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| default_base_url());
        let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| default_model());
        Self::from_env("OPENAI_API_KEY", base_url, model)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    /// Full URL of the chat completions route.
    pub fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(60)
}

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
        let config = RemoteLlmConfig::new("test-key", DEFAULT_BASE_URL, "gpt-4o-mini")
            .with_timeout(Duration::from_secs(120))
            .with_organization("org-123");

        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.timeout, Duration::from_secs(120));
        assert_eq!(config.organization.as_deref(), Some("org-123"));
    }

    #[test]
    fn test_chat_completions_url() {
        let config = RemoteLlmConfig::new("k", "http://localhost:4000/v1/", DEFAULT_MODEL);
        assert_eq!(config.chat_completions_url(), "http://localhost:4000/v1/chat/completions");
    }

    #[test]
    fn test_from_env_missing_key() {
        let result = RemoteLlmConfig::from_env(
            "PULSE_AGENT_TEST_SURELY_UNSET_KEY",
            DEFAULT_BASE_URL,
            DEFAULT_MODEL,
        );
        assert!(matches!(result, Err(LlmError::ApiKeyNotFound(_))));
    }

    #[test]
    fn test_serde_skips_key_and_fills_defaults() {
        let config = RemoteLlmConfig::new("sk-secret", DEFAULT_BASE_URL, DEFAULT_MODEL);
        let json = serde_json::to_value(&config).unwrap();
        assert!(!json.to_string().contains("sk-secret"));
        assert_eq!(json["timeout"], 60);

        let parsed: RemoteLlmConfig = serde_json::from_str(r#"{"timeout": 5}"#).unwrap();
        assert_eq!(parsed.base_url, DEFAULT_BASE_URL);
        assert_eq!(parsed.model, DEFAULT_MODEL);
        assert_eq!(parsed.timeout, Duration::from_secs(5));
        assert!(parsed.api_key.is_empty());
    }
}
