use super::{Tool, ToolInput, ToolKind};
use crate::error::{AgentError, Result};
use async_trait::async_trait;
use pulse::PulseApi;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

/// Runs ad hoc SQL against raw table cubes.
pub struct RawQueryTool {
    api: Arc<dyn PulseApi>,
}

impl RawQueryTool {
    pub fn new(api: Arc<dyn PulseApi>) -> Self {
        Self { api }
    }
}

/// Extract SQL from text that may be a `{"query": ...}` envelope.
///
/// The text is trimmed and decoded as JSON with newlines treated as spaces.
/// An object with a string `query` yields that string; anything else yields
/// the trimmed text unchanged.
pub fn unwrap_query_envelope(text: &str) -> String {
    let trimmed = text.trim();
    match serde_json::from_str::<Value>(&trimmed.replace('\n', " ")) {
        Ok(Value::Object(map)) => match map.get("query") {
            Some(Value::String(query)) => query.trim().to_string(),
            _ => trimmed.to_string(),
        },
        _ => trimmed.to_string(),
    }
}

#[async_trait]
impl Tool for RawQueryTool {
    fn name(&self) -> &str {
        ToolKind::RawQuery.name()
    }

    fn description(&self) -> &str {
        ToolKind::RawQuery.description()
    }

    fn kind(&self) -> Option<ToolKind> {
        Some(ToolKind::RawQuery)
    }

    fn input_schema(&self) -> Option<Value> {
        Some(json!({
            "type": "object",
            "properties": {
                "query": {"type": "string", "description": "A valid SQL query"}
            },
            "required": ["query"]
        }))
    }

    async fn execute(&self, input: ToolInput) -> Result<String> {
        let sql = match &input {
            Value::String(text) => unwrap_query_envelope(text),
            Value::Object(map) => match map.get("query") {
                Some(Value::String(query)) => unwrap_query_envelope(query),
                _ => {
                    return Err(AgentError::Parse(
                        "expected an object with a string \"query\"".to_string(),
                    ))
                }
            },
            other => {
                return Err(AgentError::Parse(format!(
                    "expected SQL text, got {}",
                    other
                )))
            }
        };

        if sql.is_empty() {
            return Err(AgentError::Parse("empty SQL query".to_string()));
        }

        debug!(sql = %sql, "Running raw query tool");
        let result = self.api.raw_query(&sql).await?;
        Ok(serde_json::to_string(&result)?)
    }
}
