//! Tools the agent can call.
//!
//! The built-in set is closed ([`ToolKind`]): raw SQL, endpoint invocation,
//! semantics fetch and SQL generation. Callers may add their own tools by
//! implementing [`Tool`]; those report no kind.
//!
//! Tool input is JSON. The ReAct loop hands over the model's action input as
//! a JSON string; the tool-calling loop hands over the decoded argument
//! object. Each tool accepts both.
//!
//! ```rust,ignore
//! let mut registry = ToolRegistry::new();
//! registry.register(Arc::new(RawQueryTool::new(api.clone())))?;
//!
//! let rows = registry.execute("pulse_raw_query", json!("SELECT 1")).await?;
//! ```

mod generate_sql;
mod query_endpoint;
mod raw_query;
mod semantics;

pub use generate_sql::{examples_block, raw_tables_block, GenerateSqlTool};
pub use query_endpoint::{parse_endpoint_params, QueryEndpointTool};
pub use raw_query::{unwrap_query_envelope, RawQueryTool};
pub use semantics::SemanticsTool;

use crate::error::{AgentError, Result};
use async_trait::async_trait;
use indexmap::IndexMap;
use llm::ToolDefinition;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Tool input type
pub type ToolInput = Value;

/// The built-in tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    RawQuery,
    QueryEndpoint,
    FetchSemantics,
    GenerateSql,
}

impl ToolKind {
    pub const ALL: [ToolKind; 4] = [
        ToolKind::RawQuery,
        ToolKind::QueryEndpoint,
        ToolKind::FetchSemantics,
        ToolKind::GenerateSql,
    ];

    /// Name the model calls the tool by.
    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::RawQuery => "pulse_raw_query",
            ToolKind::QueryEndpoint => "pulse_query_endpoint",
            ToolKind::FetchSemantics => "pulse_semantics",
            ToolKind::GenerateSql => "pulse_generate_query",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ToolKind::RawQuery => {
                "Use this tool to execute a raw SQL query to get data. \
                 Input should be a valid SQL query."
            }
            ToolKind::QueryEndpoint => {
                "Use this tool to get data from an endpoint. \
                 Input is a JSON object {\"endpoint_name\": endpoint_name, \"params\": parameters, \"page_size\": n}. \
                 endpoint_name is one of the available endpoints. \
                 params are the parameters defined on that endpoint."
            }
            ToolKind::FetchSemantics => "Fetch the semantics of this application.",
            ToolKind::GenerateSql => {
                "Use this tool to generate a valid SQL query from the user's request and the semantics cubes. \
                 Input should be a request from the user in plain text."
            }
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A callable tool.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool name
    fn name(&self) -> &str;

    /// Get the tool description
    fn description(&self) -> &str;

    /// JSON Schema of the argument object, for function calling.
    fn input_schema(&self) -> Option<Value> {
        None
    }

    /// Which built-in tool this is, if any.
    fn kind(&self) -> Option<ToolKind> {
        None
    }

    /// Execute the tool and return its observation text.
    async fn execute(&self, input: ToolInput) -> Result<String>;

    /// Validate input (optional)
    fn validate_input(&self, _input: &ToolInput) -> Result<()> {
        Ok(())
    }

    /// Definition handed to function-calling models.
    fn definition(&self) -> ToolDefinition {
        let definition = ToolDefinition::new(self.name(), self.description());
        match self.input_schema() {
            Some(schema) => definition.with_parameters(schema),
            None => definition,
        }
    }
}

/// Insertion-ordered lookup table of tools.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: IndexMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a list; duplicate names are a configuration error.
    pub fn from_tools(tools: impl IntoIterator<Item = Arc<dyn Tool>>) -> Result<Self> {
        let mut registry = Self::new();
        for tool in tools {
            registry.register(tool)?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(AgentError::Config(format!("Duplicate tool name: {}", name)));
        }
        self.tools.insert(name, tool);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Drop every tool of `kind`. Returns how many were removed.
    pub fn remove_kind(&mut self, kind: ToolKind) -> usize {
        let before = self.tools.len();
        self.tools.retain(|_, tool| tool.kind() != Some(kind));
        before - self.tools.len()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Tool>> {
        self.tools.values()
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.definition()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Execute a tool by name
    pub async fn execute(&self, name: &str, input: ToolInput) -> Result<String> {
        let tool = self
            .get(name)
            .ok_or_else(|| AgentError::ToolNotFound(name.to_string()))?;

        debug!(tool = name, "Executing tool");
        tool.validate_input(&input)?;
        tool.execute(input).await
    }
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

/// Text carried by `input`: the string itself, or the string under `key`.
pub(crate) fn text_argument(input: &Value, key: &str) -> Option<String> {
    match input {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map.get(key).and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoTool {
        name: &'static str,
    }

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            self.name
        }

        fn description(&self) -> &str {
            "Echo the input"
        }

        async fn execute(&self, input: ToolInput) -> Result<String> {
            Ok(input.to_string())
        }
    }

    struct FakeSemanticsTool;

    #[async_trait]
    impl Tool for FakeSemanticsTool {
        fn name(&self) -> &str {
            ToolKind::FetchSemantics.name()
        }

        fn description(&self) -> &str {
            ToolKind::FetchSemantics.description()
        }

        fn kind(&self) -> Option<ToolKind> {
            Some(ToolKind::FetchSemantics)
        }

        async fn execute(&self, _input: ToolInput) -> Result<String> {
            Ok("cubes: []".to_string())
        }
    }

    #[test]
    fn test_kind_names_round_trip() {
        for kind in ToolKind::ALL {
            assert_eq!(ToolKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(ToolKind::from_name("search"), None);
    }

    #[tokio::test]
    async fn test_registry_execute() {
        let registry = ToolRegistry::from_tools([
            Arc::new(EchoTool { name: "echo" }) as Arc<dyn Tool>,
        ])
        .unwrap();

        let out = registry.execute("echo", json!({"a": 1})).await.unwrap();
        assert_eq!(out, r#"{"a":1}"#);

        let err = registry.execute("missing", json!(null)).await.unwrap_err();
        assert!(matches!(err, AgentError::ToolNotFound(name) if name == "missing"));
    }

    #[test]
    fn test_registry_rejects_duplicates_and_keeps_order() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool { name: "b" })).unwrap();
        registry.register(Arc::new(EchoTool { name: "a" })).unwrap();
        assert_eq!(registry.names(), vec!["b", "a"]);

        let err = registry.register(Arc::new(EchoTool { name: "a" })).unwrap_err();
        assert!(matches!(err, AgentError::Config(_)));
    }

    #[test]
    fn test_remove_kind() {
        let mut registry = ToolRegistry::from_tools([
            Arc::new(EchoTool { name: "echo" }) as Arc<dyn Tool>,
            Arc::new(FakeSemanticsTool) as Arc<dyn Tool>,
        ])
        .unwrap();

        assert_eq!(registry.remove_kind(ToolKind::FetchSemantics), 1);
        assert_eq!(registry.names(), vec!["echo"]);
        assert_eq!(registry.remove_kind(ToolKind::FetchSemantics), 0);
    }

    #[test]
    fn test_definition_includes_schema() {
        let def = EchoTool { name: "echo" }.definition();
        assert_eq!(def.name, "echo");
        assert!(def.parameters.is_none());
    }

    #[test]
    fn test_text_argument() {
        assert_eq!(text_argument(&json!("x"), "input"), Some("x".to_string()));
        assert_eq!(text_argument(&json!({"input": "y"}), "input"), Some("y".to_string()));
        assert_eq!(text_argument(&json!({"other": "y"}), "input"), None);
        assert_eq!(text_argument(&json!(3), "input"), None);
    }
}
