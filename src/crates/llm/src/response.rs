//! Chat model responses.

use crate::message::Message;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Token usage reported by the provider.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct UsageMetadata {
    /// Prompt tokens
    pub input_tokens: usize,
    /// Completion tokens
    pub output_tokens: usize,
    /// Sum of both
    pub total_tokens: usize,
}

impl UsageMetadata {
    /// Build usage from input and output token counts.
    pub fn new(input_tokens: usize, output_tokens: usize) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens: input_tokens + output_tokens,
        }
    }
}

/// A complete chat response.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    /// The assistant message, possibly carrying tool calls.
    pub message: Message,

    /// Token usage, when the provider reports it.
    pub usage: Option<UsageMetadata>,

    /// Provider-specific metadata (model, finish reason, ...).
    pub metadata: HashMap<String, serde_json::Value>,
}

impl ChatResponse {
    /// Wrap an assistant message with no usage or metadata.
    pub fn from_message(message: Message) -> Self {
        Self {
            message,
            usage: None,
            metadata: HashMap::new(),
        }
    }

    /// Shortcut for a plain-text assistant reply.
    pub fn text(content: impl Into<String>) -> Self {
        Self::from_message(Message::assistant(content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_totals() {
        let usage = UsageMetadata::new(10, 5);
        assert_eq!(usage.total_tokens, 15);
    }

    #[test]
    fn test_text_response() {
        let response = ChatResponse::text("SELECT 1");
        assert!(response.message.is_assistant());
        assert_eq!(response.message.content, "SELECT 1");
        assert!(response.usage.is_none());
    }
}
