use super::{Tool, ToolInput, ToolKind};
use crate::error::Result;
use async_trait::async_trait;
use pulse::Semantics;
use serde_json::{json, Value};
use std::sync::Arc;

/// Returns the whole application semantics as text.
pub struct SemanticsTool {
    semantics: Arc<Semantics>,
}

impl SemanticsTool {
    pub fn new(semantics: Arc<Semantics>) -> Self {
        Self { semantics }
    }
}

#[async_trait]
impl Tool for SemanticsTool {
    fn name(&self) -> &str {
        ToolKind::FetchSemantics.name()
    }

    fn description(&self) -> &str {
        ToolKind::FetchSemantics.description()
    }

    fn kind(&self) -> Option<ToolKind> {
        Some(ToolKind::FetchSemantics)
    }

    fn input_schema(&self) -> Option<Value> {
        Some(json!({"type": "object", "properties": {}}))
    }

    async fn execute(&self, _input: ToolInput) -> Result<String> {
        Ok(self.semantics.view().to_text()?)
    }
}
