//! Error types for the Pulse client and semantics model.

use thiserror::Error;

/// Result type for Pulse operations.
pub type Result<T> = std::result::Result<T, PulseError>;

/// Errors raised while talking to the Pulse API or decoding its payloads.
#[derive(Debug, Error)]
pub enum PulseError {
    /// Could not reach the server (refused, DNS, timeout).
    #[error("Connection error: {0}")]
    Connection(String),

    /// Credentials rejected.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The server rejected or failed a raw SQL query.
    #[error("Query failed: {0}")]
    Query(String),

    /// No endpoint cube with that name.
    #[error("Endpoint not found: {0}")]
    EndpointNotFound(String),

    /// Endpoint parameters missing or invalid.
    #[error("Invalid endpoint parameters: {0}")]
    Parameter(String),

    /// Semantics payload could not be fetched or was malformed.
    #[error("Failed to fetch semantics: {0}")]
    RemoteFetch(String),

    /// Failed to serialize/deserialize data.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Client configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Any other HTTP failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl PulseError {
    /// Fatal errors abort an agent run instead of being shown to the model.
    pub fn is_fatal(&self) -> bool {
        matches!(self, PulseError::Connection(_) | PulseError::Auth(_))
    }
}

impl From<serde_json::Error> for PulseError {
    fn from(err: serde_json::Error) -> Self {
        PulseError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for PulseError {
    fn from(err: serde_yaml::Error) -> Self {
        PulseError::Serialization(err.to_string())
    }
}
