//! Tool calling abstractions for function-calling models.
//!
//! # Function Calling Flow
//!
//! 1. **Define tools**: Create `ToolDefinition`s with name, description, parameters
//! 2. **Bind to request**: Add tools via `ChatRequest::with_tools()`
//! 3. **Model requests tool**: Response message carries `tool_calls`
//! 4. **Execute tool**: The agent runs the named tool
//! 5. **Return results**: Send `Message::tool(call_id, output)` in the next request
//! 6. **Model responds**: Final answer based on tool outputs
//!
//! # Example
//!
//! ```rust,ignore
//! use llm::{ChatRequest, Message, ToolDefinition};
//! use serde_json::json;
//!
//! let raw_query = ToolDefinition::new(
//!     "pulse_raw_query",
//!     "Execute a raw SQL query",
//! ).with_parameters(json!({
//!     "type": "object",
//!     "properties": {"query": {"type": "string"}},
//!     "required": ["query"]
//! }));
//!
//! let request = ChatRequest::new(vec![Message::human("How many orders?")])
//!     .with_tools(vec![raw_query]);
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Definition of a tool/function that an LLM can call.
///
/// `parameters` is a JSON Schema object, typically
/// `{"type": "object", "properties": {...}, "required": [...]}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolDefinition {
    /// The unique name/identifier for this tool.
    pub name: String,

    /// Human-readable description of what this tool does.
    ///
    /// The model uses this to decide when to call the tool.
    pub description: String,

    /// JSON Schema describing the function's parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<JsonValue>,
}

impl ToolDefinition {
    /// Create a new tool definition with name and description.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: None,
        }
    }

    /// Add a JSON Schema for the tool's parameters.
    pub fn with_parameters(mut self, parameters: JsonValue) -> Self {
        self.parameters = Some(parameters);
        self
    }
}

/// A request from the model to call a specific tool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    /// Unique identifier for this specific tool call.
    ///
    /// Tool results must echo it back so the model can pair them up.
    pub id: String,

    /// The name of the tool to call.
    pub name: String,

    /// Arguments as decoded JSON.
    ///
    /// Providers that send arguments as a JSON string which fails to decode
    /// keep the raw string here as a `JsonValue::String`.
    pub arguments: JsonValue,
}

impl ToolCall {
    /// Create a new tool call.
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: JsonValue) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_definition_builder() {
        let tool = ToolDefinition::new("pulse_raw_query", "Run SQL")
            .with_parameters(json!({"type": "object"}));

        assert_eq!(tool.name, "pulse_raw_query");
        assert_eq!(tool.description, "Run SQL");
        assert!(tool.parameters.is_some());
    }

    #[test]
    fn test_tool_call() {
        let call = ToolCall::new("call_1", "pulse_query_endpoint", json!({"endpoint_name": "sales"}));

        assert_eq!(call.id, "call_1");
        assert_eq!(call.name, "pulse_query_endpoint");
        assert_eq!(call.arguments["endpoint_name"], "sales");
    }
}
