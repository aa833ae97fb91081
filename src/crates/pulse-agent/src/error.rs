//! Error types for the agent, its tools and its prompts.

use thiserror::Error;

/// Result type for agent operations.
pub type Result<T> = std::result::Result<T, AgentError>;

/// Errors that can occur while building or running an agent.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Invalid construction-time configuration. Never recovered.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Tool input or model output could not be parsed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Pulse API failure.
    #[error(transparent)]
    Pulse(#[from] pulse::PulseError),

    /// Language model failure.
    #[error("LLM error: {0}")]
    Llm(#[from] llm::LlmError),

    /// The model asked for a tool that is not registered.
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// A tool failed for a reason of its own.
    #[error("Tool execution failed: {0}")]
    ToolExecution(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AgentError {
    /// Fatal errors abort a run; the rest are shown to the model.
    pub fn is_fatal(&self) -> bool {
        match self {
            AgentError::Pulse(e) => e.is_fatal(),
            AgentError::Config(_) => true,
            _ => false,
        }
    }
}

impl From<serde_json::Error> for AgentError {
    fn from(err: serde_json::Error) -> Self {
        AgentError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AgentError {
    fn from(err: serde_yaml::Error) -> Self {
        AgentError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse::PulseError;

    #[test]
    fn test_fatal_delegates_to_pulse() {
        assert!(AgentError::from(PulseError::Connection("refused".into())).is_fatal());
        assert!(AgentError::from(PulseError::Auth("denied".into())).is_fatal());
        assert!(!AgentError::from(PulseError::Query("bad sql".into())).is_fatal());
        assert!(!AgentError::Parse("not json".into()).is_fatal());
        assert!(AgentError::Config("both sources".into()).is_fatal());
    }

    #[test]
    fn test_pulse_errors_display_transparently() {
        let err = AgentError::from(PulseError::EndpointNotFound("sales".into()));
        assert_eq!(err.to_string(), "Endpoint not found: sales");
    }
}
