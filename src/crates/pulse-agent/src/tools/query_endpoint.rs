use super::{Tool, ToolInput, ToolKind};
use crate::error::{AgentError, Result};
use async_trait::async_trait;
use pulse::{EndpointQueryParams, PulseApi, PulseError, Semantics};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

/// Invokes endpoint cubes with structured parameters.
pub struct QueryEndpointTool {
    api: Arc<dyn PulseApi>,
    semantics: Arc<Semantics>,
}

impl QueryEndpointTool {
    pub fn new(api: Arc<dyn PulseApi>, semantics: Arc<Semantics>) -> Self {
        Self { api, semantics }
    }

    /// Reject unknown endpoints and missing required parameters before any call.
    fn check_against_semantics(&self, params: &EndpointQueryParams) -> Result<()> {
        let cube = self
            .semantics
            .find_endpoint(&params.endpoint_name)
            .ok_or_else(|| PulseError::EndpointNotFound(params.endpoint_name.clone()))?;

        let missing: Vec<&str> = cube
            .required_parameters()
            .filter(|p| !params.params.contains_key(&p.name))
            .map(|p| p.name.as_str())
            .collect();

        if !missing.is_empty() {
            return Err(PulseError::Parameter(format!(
                "endpoint '{}' requires parameters: {}",
                params.endpoint_name,
                missing.join(", ")
            ))
            .into());
        }
        Ok(())
    }
}

/// Decode endpoint parameters from tool input.
///
/// Accepts the parameter object, its text form (single quotes are read as
/// double quotes), or either of those wrapped as `{"params": ...}`.
pub fn parse_endpoint_params(input: &Value) -> Result<EndpointQueryParams> {
    match input {
        Value::String(text) => parse_text(text),
        Value::Object(map) if map.contains_key("endpoint_name") => {
            serde_json::from_value(input.clone()).map_err(|e| {
                AgentError::Parse(format!("invalid endpoint parameters: {}", e))
            })
        }
        Value::Object(map) => match map.get("params") {
            Some(inner @ (Value::String(_) | Value::Object(_))) if map.len() == 1 => {
                parse_endpoint_params(inner)
            }
            _ => Err(AgentError::Parse(
                "endpoint parameters need an \"endpoint_name\"".to_string(),
            )),
        },
        other => Err(AgentError::Parse(format!(
            "expected a JSON object with \"endpoint_name\", got {}",
            other
        ))),
    }
}

fn parse_text(text: &str) -> Result<EndpointQueryParams> {
    let normalized = text.trim().replace('\'', "\"");
    let value: Value = serde_json::from_str(&normalized)
        .map_err(|e| AgentError::Parse(format!("endpoint parameters are not valid JSON: {}", e)))?;

    match value {
        Value::Object(_) => parse_endpoint_params(&value),
        other => Err(AgentError::Parse(format!(
            "expected a JSON object with \"endpoint_name\", got {}",
            other
        ))),
    }
}

#[async_trait]
impl Tool for QueryEndpointTool {
    fn name(&self) -> &str {
        ToolKind::QueryEndpoint.name()
    }

    fn description(&self) -> &str {
        ToolKind::QueryEndpoint.description()
    }

    fn kind(&self) -> Option<ToolKind> {
        Some(ToolKind::QueryEndpoint)
    }

    fn input_schema(&self) -> Option<Value> {
        Some(json!({
            "type": "object",
            "properties": {
                "endpoint_name": {"type": "string", "description": "Name of the endpoint cube"},
                "params": {"type": "object", "description": "Parameters defined on the endpoint"},
                "page_size": {"type": "integer", "description": "Maximum number of rows"}
            },
            "required": ["endpoint_name"]
        }))
    }

    async fn execute(&self, input: ToolInput) -> Result<String> {
        let params = parse_endpoint_params(&input)?;
        self.check_against_semantics(&params)?;

        debug!(
            endpoint = %params.endpoint_name,
            params = params.params.len(),
            "Running endpoint tool"
        );
        let result = self.api.query_endpoint(&params).await?;
        Ok(serde_json::to_string(&result.rows)?)
    }
}
