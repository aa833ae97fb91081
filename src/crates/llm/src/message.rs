//! Conversation messages exchanged with a chat model.

use crate::tools::ToolCall;
use serde::{Deserialize, Serialize};

/// Who authored a message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System instructions
    System,
    /// Human/user message
    Human,
    /// AI/assistant message
    Assistant,
    /// Tool result message
    Tool,
}

/// A message in a conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Message role
    pub role: MessageRole,

    /// Message content
    pub content: String,

    /// Optional message name (tool name for tool results)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Tool call ID (for tool result messages)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,

    /// Tool calls requested by the assistant
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
}

impl Message {
    /// Create a new message
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            name: None,
            tool_call_id: None,
            tool_calls: Vec::new(),
        }
    }

    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    /// Create a human message
    pub fn human(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Human, content)
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    /// Create a tool result message answering `tool_call_id`
    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(tool_call_id.into()),
            ..Self::new(MessageRole::Tool, content)
        }
    }

    /// Set the message name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Attach tool calls to an assistant message
    pub fn with_tool_calls(mut self, tool_calls: Vec<ToolCall>) -> Self {
        self.tool_calls = tool_calls;
        self
    }

    /// Check if message has tool calls
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// Check if this is an assistant message
    pub fn is_assistant(&self) -> bool {
        self.role == MessageRole::Assistant
    }

    /// Check if this is a tool message
    pub fn is_tool(&self) -> bool {
        self.role == MessageRole::Tool
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_constructors() {
        assert_eq!(Message::system("s").role, MessageRole::System);
        assert_eq!(Message::human("h").role, MessageRole::Human);
        assert!(Message::assistant("a").is_assistant());

        let tool = Message::tool("call_1", "{\"rows\":[]}").with_name("pulse_raw_query");
        assert!(tool.is_tool());
        assert_eq!(tool.tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(tool.name.as_deref(), Some("pulse_raw_query"));
    }

    #[test]
    fn test_tool_calls() {
        let msg = Message::assistant("").with_tool_calls(vec![ToolCall::new(
            "call_1",
            "pulse_raw_query",
            json!({"query": "SELECT 1"}),
        )]);
        assert!(msg.has_tool_calls());
        assert!(!Message::assistant("done").has_tool_calls());
    }

    #[test]
    fn test_serialization_skips_empty_fields() {
        let json = serde_json::to_value(Message::human("Hi")).unwrap();
        assert_eq!(json, json!({"role": "human", "content": "Hi"}));
    }
}
