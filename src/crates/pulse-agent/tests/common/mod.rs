//! Shared mocks for the agent integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use llm::{ChatModel, ChatRequest, ChatResponse, Message, ToolCall};
use pulse::{
    Cube, EndpointQueryParams, EndpointQueryResult, PulseApi, PulseError, RawQueryResult,
    Semantics,
};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Chat model that replays scripted responses and records every request.
///
/// The last response repeats once the script runs out.
pub struct MockChatModel {
    responses: Mutex<VecDeque<ChatResponse>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl MockChatModel {
    pub fn new(responses: Vec<ChatResponse>) -> Self {
        assert!(!responses.is_empty(), "script at least one response");
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Plain text completions.
    pub fn text(responses: &[&str]) -> Self {
        Self::new(responses.iter().map(|r| ChatResponse::text(*r)).collect())
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatModel for MockChatModel {
    async fn chat(&self, request: ChatRequest) -> llm::Result<ChatResponse> {
        self.requests.lock().unwrap().push(request);

        let mut responses = self.responses.lock().unwrap();
        let response = if responses.len() > 1 {
            responses.pop_front().unwrap()
        } else {
            responses.front().cloned().unwrap()
        };
        Ok(response)
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}

/// Assistant response requesting one tool call.
pub fn tool_call_response(id: &str, tool: &str, arguments: Value) -> ChatResponse {
    ChatResponse::from_message(
        Message::assistant("").with_tool_calls(vec![ToolCall::new(id, tool, arguments)]),
    )
}

/// A call received by [`MockPulseApi`].
#[derive(Debug, Clone, PartialEq)]
pub enum PulseCall {
    FetchSemantics,
    RawQuery(String),
    QueryEndpoint(EndpointQueryParams),
}

type ErrorFactory = Box<dyn Fn() -> PulseError + Send + Sync>;

/// In-memory Pulse API.
pub struct MockPulseApi {
    semantics: Semantics,
    rows: Vec<Value>,
    raw_query_error: Option<ErrorFactory>,
    fetch_error: Option<ErrorFactory>,
    calls: Mutex<Vec<PulseCall>>,
}

impl MockPulseApi {
    pub fn new(semantics: Semantics) -> Self {
        Self {
            semantics,
            rows: vec![json!({"region": "EU", "total": 1200})],
            raw_query_error: None,
            fetch_error: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_rows(mut self, rows: Vec<Value>) -> Self {
        self.rows = rows;
        self
    }

    pub fn failing_raw_query(
        mut self,
        error: impl Fn() -> PulseError + Send + Sync + 'static,
    ) -> Self {
        self.raw_query_error = Some(Box::new(error));
        self
    }

    pub fn failing_fetch(mut self, error: impl Fn() -> PulseError + Send + Sync + 'static) -> Self {
        self.fetch_error = Some(Box::new(error));
        self
    }

    pub fn calls(&self) -> Vec<PulseCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, PulseCall::FetchSemantics))
            .count()
    }
}

#[async_trait]
impl PulseApi for MockPulseApi {
    async fn fetch_semantics(&self) -> pulse::Result<Semantics> {
        self.calls.lock().unwrap().push(PulseCall::FetchSemantics);
        match &self.fetch_error {
            Some(error) => Err(error()),
            None => Ok(self.semantics.clone()),
        }
    }

    async fn raw_query(&self, sql: &str) -> pulse::Result<RawQueryResult> {
        self.calls
            .lock()
            .unwrap()
            .push(PulseCall::RawQuery(sql.to_string()));
        match &self.raw_query_error {
            Some(error) => Err(error()),
            None => Ok(RawQueryResult::from_rows(self.rows.clone())),
        }
    }

    async fn query_endpoint(&self, params: &EndpointQueryParams) -> pulse::Result<EndpointQueryResult> {
        self.calls
            .lock()
            .unwrap()
            .push(PulseCall::QueryEndpoint(params.clone()));
        Ok(EndpointQueryResult {
            offset: 0,
            page_size: params.page_size as u64,
            total: self.rows.len() as u64,
            rows: self.rows.clone(),
        })
    }
}

/// Two raw tables and one endpoint with a required `region` parameter.
pub fn sample_semantics() -> Semantics {
    Semantics::from_cubes(vec![
        Cube::new("orders")
            .with_id("orders")
            .with_description("All orders")
            .with_sql_table("orders_tbl")
            .with_dimension("order_id", "INT", Some("Primary key"))
            .with_dimension("region", "TEXT", None)
            .with_dimension("amount", "DECIMAL", None),
        Cube::new("customers")
            .with_description("Customer master data")
            .with_dimension("customer_id", "INT", None),
        Cube::new("sales")
            .with_id("sales")
            .with_description("Total sales per region")
            .with_sql("SELECT region, SUM(amount) AS total FROM orders_tbl WHERE region = {region} GROUP BY region")
            .with_parameter("region", "TEXT", None)
            .with_parameter("limit", "INT", Some(json!(10)))
            .with_dimension("region", "TEXT", None)
            .with_dimension("total", "DECIMAL", None),
    ])
}

pub fn mock_api() -> Arc<MockPulseApi> {
    Arc::new(MockPulseApi::new(sample_semantics()))
}
