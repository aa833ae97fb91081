use super::{text_argument, Tool, ToolInput, ToolKind};
use crate::error::{AgentError, Result};
use crate::prompt::{constants, values, PromptTemplate, INPUT_VAR};
use async_trait::async_trait;
use llm::{ChatModel, ChatRequest, Message};
use pulse::Semantics;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

const TABLE_SEPARATOR: &str = "==============================";

/// Describe every raw table cube: name, description and columns.
pub fn raw_tables_block(semantics: &Semantics) -> String {
    let mut out = String::new();
    for cube in semantics.filter_tables().iter() {
        out.push_str(&format!(
            "Name: {}\nDescription: {}\nColumns: \n",
            cube.table_name(),
            cube.description.as_deref().unwrap_or_default()
        ));
        for (key, dim) in &cube.dimensions {
            out.push_str(&format!(
                "    {} {}    {} \n",
                key,
                dim.sql_type,
                dim.description.as_deref().unwrap_or_default()
            ));
        }
        out.push_str(TABLE_SEPARATOR);
        out.push('\n');
    }
    out
}

/// Question/SQL pairs taken from described endpoint cubes.
pub fn examples_block(semantics: &Semantics) -> String {
    semantics
        .filter_endpoints()
        .iter()
        .filter_map(|cube| {
            let description = cube.description.as_deref()?;
            let sql = cube.sql.as_deref()?;
            Some(format!("QUESTION: {}\nResponse: {}\n\n", description, sql))
        })
        .collect()
}

/// Turns a plain-text request into SQL over the raw tables.
///
/// The table and example blocks are rendered once, when the tool is built.
pub struct GenerateSqlTool {
    llm: Arc<dyn ChatModel>,
    prompt: PromptTemplate,
}

impl GenerateSqlTool {
    pub fn new(llm: Arc<dyn ChatModel>, semantics: &Semantics) -> Self {
        let prompt = PromptTemplate::from_template(constants::GENERATE_QUERY)
            .partial("raw_tables", raw_tables_block(semantics))
            .partial("examples", examples_block(semantics))
            .partial("format_response", constants::GENERATE_QUERY_RESPONSE_FORMAT);
        Self { llm, prompt }
    }

    /// The prompt sent for `request`.
    pub fn render(&self, request: &str) -> Result<String> {
        self.prompt
            .format(&values([(INPUT_VAR, request.to_string())]))
    }

    /// Ask the model for SQL. The completion is returned as is.
    pub async fn run(&self, request: &str) -> Result<String> {
        let prompt = self.render(request)?;
        debug!(model = self.llm.model_name(), "Generating SQL");

        let response = self
            .llm
            .chat(ChatRequest::new(vec![Message::human(prompt)]).with_temperature(0.0))
            .await?;
        Ok(response.message.content)
    }

    /// Blocking variant of [`GenerateSqlTool::run`] for callers outside a runtime.
    ///
    /// Returns [`AgentError::ToolExecution`] without calling the model when
    /// invoked from inside a tokio runtime; use [`GenerateSqlTool::run`] there.
    pub fn run_blocking(&self, request: &str) -> Result<String> {
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(AgentError::ToolExecution(
                "run_blocking called inside an async runtime; use run instead".to_string(),
            ));
        }

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        runtime.block_on(self.run(request))
    }
}

#[async_trait]
impl Tool for GenerateSqlTool {
    fn name(&self) -> &str {
        ToolKind::GenerateSql.name()
    }

    fn description(&self) -> &str {
        ToolKind::GenerateSql.description()
    }

    fn kind(&self) -> Option<ToolKind> {
        Some(ToolKind::GenerateSql)
    }

    fn input_schema(&self) -> Option<Value> {
        Some(json!({
            "type": "object",
            "properties": {
                "input": {"type": "string", "description": "The user's request in plain text"}
            },
            "required": ["input"]
        }))
    }

    async fn execute(&self, input: ToolInput) -> Result<String> {
        let request = text_argument(&input, INPUT_VAR)
            .ok_or_else(|| AgentError::Parse("expected the request as text".to_string()))?;
        self.run(request.trim()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse::Cube;

    fn semantics() -> Semantics {
        Semantics::from_cubes(vec![
            Cube::new("orders")
                .with_sql_table("orders_tbl")
                .with_description("All orders")
                .with_dimension("order_id", "INT", Some("Primary key"))
                .with_dimension("amount", "DECIMAL", None),
            Cube::new("sales")
                .with_description("Total sales per region")
                .with_sql("SELECT region, SUM(amount) FROM orders_tbl GROUP BY region"),
            Cube::new("hidden").with_sql("SELECT 1"),
        ])
    }

    #[test]
    fn test_raw_tables_block() {
        let block = raw_tables_block(&semantics());
        assert_eq!(
            block,
            "Name: orders_tbl\nDescription: All orders\nColumns: \n\
             \x20   order_id INT    Primary key \n\
             \x20   amount DECIMAL     \n\
             ==============================\n"
        );
    }

    #[test]
    fn test_examples_skip_undescribed_endpoints() {
        let block = examples_block(&semantics());
        assert_eq!(
            block,
            "QUESTION: Total sales per region\n\
             Response: SELECT region, SUM(amount) FROM orders_tbl GROUP BY region\n\n"
        );
    }

    #[test]
    fn test_render_leaves_only_the_request() {
        struct Unused;

        #[async_trait]
        impl ChatModel for Unused {
            async fn chat(&self, _request: ChatRequest) -> llm::Result<llm::ChatResponse> {
                unreachable!("render never calls the model")
            }
        }

        let tool = GenerateSqlTool::new(Arc::new(Unused), &semantics());
        let prompt = tool.render("orders over 100").unwrap();
        assert!(prompt.contains("Name: orders_tbl"));
        assert!(prompt.contains("QUESTION: Total sales per region"));
        assert!(prompt.ends_with("Request: orders over 100\nSQL Query:"));
    }
}
