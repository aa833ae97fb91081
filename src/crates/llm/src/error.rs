//! Error types for LLM provider implementations.

use thiserror::Error;

/// Result type for LLM operations.
pub type Result<T> = std::result::Result<T, LlmError>;

/// Errors that can occur when working with LLM providers.
#[derive(Debug, Error)]
pub enum LlmError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Failed to serialize/deserialize data.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// API authentication failed.
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    /// API key not found in environment.
    #[error("API key not found: {0}")]
    ApiKeyNotFound(String),

    /// Rate limit exceeded.
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Invalid request parameters.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Invalid response from provider.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// General provider error.
    #[error("Provider error: {0}")]
    ProviderError(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl LlmError {
    /// Check if this error is due to authentication.
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            LlmError::AuthenticationError(_) | LlmError::ApiKeyNotFound(_)
        )
    }
}

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        LlmError::SerializationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_classification() {
        assert!(LlmError::AuthenticationError("bad key".into()).is_auth_error());
        assert!(LlmError::ApiKeyNotFound("OPENAI_API_KEY".into()).is_auth_error());
        assert!(!LlmError::RateLimitExceeded("slow down".into()).is_auth_error());
    }

    #[test]
    fn test_serde_error_conversion() {
        let err: LlmError = serde_json::from_str::<serde_json::Value>("{nope")
            .unwrap_err()
            .into();
        assert!(matches!(err, LlmError::SerializationError(_)));
    }
}
