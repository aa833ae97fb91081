//! Request configuration for chat models.

use crate::message::Message;
use crate::tools::ToolDefinition;

/// A request to a chat model containing messages and configuration.
///
/// # Example
///
/// ```rust,ignore
/// use llm::{ChatRequest, Message};
///
/// let request = ChatRequest::new(vec![
///     Message::system("You answer questions about sales data"),
///     Message::human("What were last week's top regions?"),
/// ])
/// .with_temperature(0.0)
/// .with_stop_sequences(vec!["\nObservation:".to_string()]);
/// ```
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// The conversation messages to send to the model.
    pub messages: Vec<Message>,

    /// Generation configuration.
    pub config: ChatConfig,
}

impl ChatRequest {
    /// Create a new chat request with the given messages.
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            config: ChatConfig::default(),
        }
    }

    /// Set the temperature for generation.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.config.temperature = Some(temperature);
        self
    }

    /// Set the maximum number of tokens to generate.
    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.config.max_tokens = Some(max_tokens);
        self
    }

    /// Add stop sequences that halt generation.
    ///
    /// The ReAct loop stops the model before it hallucinates its own
    /// `Observation:` line.
    pub fn with_stop_sequences(mut self, sequences: Vec<String>) -> Self {
        self.config.stop_sequences = sequences;
        self
    }

    /// Bind tools/functions that the model can call.
    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.config.tools = tools;
        self
    }
}

/// Configuration parameters for chat generation.
///
/// Not all parameters are honored by every provider.
#[derive(Debug, Clone, Default)]
pub struct ChatConfig {
    /// Sampling temperature. Lower = more deterministic.
    pub temperature: Option<f32>,

    /// Maximum tokens to generate.
    pub max_tokens: Option<usize>,

    /// Sequences that stop generation when encountered.
    pub stop_sequences: Vec<String>,

    /// Tool/function definitions for function-calling models.
    pub tools: Vec<ToolDefinition>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_builder() {
        let request = ChatRequest::new(vec![Message::human("test")])
            .with_temperature(0.0)
            .with_max_tokens(256)
            .with_stop_sequences(vec!["\nObservation:".to_string()])
            .with_tools(vec![ToolDefinition::new("t", "d")]);

        assert_eq!(request.config.temperature, Some(0.0));
        assert_eq!(request.config.max_tokens, Some(256));
        assert_eq!(request.config.stop_sequences.len(), 1);
        assert_eq!(request.config.tools.len(), 1);
    }

    #[test]
    fn test_default_config() {
        let config = ChatConfig::default();
        assert!(config.temperature.is_none());
        assert!(config.stop_sequences.is_empty());
        assert!(config.tools.is_empty());
    }
}
