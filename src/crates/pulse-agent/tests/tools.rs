//! Built-in tools against the in-memory Pulse API.

mod common;

use common::{mock_api, MockChatModel, MockPulseApi, PulseCall};
use pulse::PulseError;
use pulse_agent::tools::{GenerateSqlTool, QueryEndpointTool, RawQueryTool, SemanticsTool};
use pulse_agent::{AgentError, PulseToolkit, Tool, ToolKind};
use serde_json::{json, Value};
use std::sync::Arc;

#[tokio::test]
async fn test_raw_query_envelope_and_bare_sql_issue_same_call() {
    let api = mock_api();
    let tool = RawQueryTool::new(api.clone());

    tool.execute(json!(r#"{"query": "SELECT 1"}"#)).await.unwrap();
    tool.execute(json!("SELECT 1")).await.unwrap();
    tool.execute(json!({"query": "SELECT 1"})).await.unwrap();

    assert_eq!(
        api.calls(),
        vec![
            PulseCall::RawQuery("SELECT 1".to_string()),
            PulseCall::RawQuery("SELECT 1".to_string()),
            PulseCall::RawQuery("SELECT 1".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_raw_query_returns_result_json() {
    let api = Arc::new(MockPulseApi::new(common::sample_semantics()).with_rows(vec![json!({"n": 3})]));
    let out = RawQueryTool::new(api).execute(json!("SELECT COUNT(*) AS n FROM orders_tbl")).await.unwrap();

    let parsed: Value = serde_json::from_str(&out).unwrap();
    assert_eq!(parsed, json!({"rows": [{"n": 3}]}));
}

#[tokio::test]
async fn test_raw_query_failure_and_empty_input() {
    let api = Arc::new(
        MockPulseApi::new(common::sample_semantics())
            .failing_raw_query(|| PulseError::Query("no such column: foo".to_string())),
    );
    let tool = RawQueryTool::new(api.clone());

    let err = tool.execute(json!("SELECT foo FROM orders_tbl")).await.unwrap_err();
    assert!(matches!(err, AgentError::Pulse(PulseError::Query(ref m)) if m.contains("foo")));
    assert!(!err.is_fatal());

    let err = tool.execute(json!("   ")).await.unwrap_err();
    assert!(matches!(err, AgentError::Parse(_)));
    assert_eq!(api.calls().len(), 1);
}

#[tokio::test]
async fn test_query_endpoint_single_quoted_input() {
    let api = mock_api();
    let semantics = Arc::new(common::sample_semantics());
    let tool = QueryEndpointTool::new(api.clone(), semantics);

    let out = tool
        .execute(json!("{'endpoint_name': 'sales', 'params': {'region': 'EU'}, 'page_size': 5}"))
        .await
        .unwrap();

    let calls = api.calls();
    assert_eq!(calls.len(), 1);
    match &calls[0] {
        PulseCall::QueryEndpoint(params) => {
            assert_eq!(params.endpoint_name, "sales");
            assert_eq!(params.params["region"], json!("EU"));
            assert_eq!(params.page_size, 5);
        }
        other => panic!("unexpected call {other:?}"),
    }

    // only the rows come back
    let rows: Value = serde_json::from_str(&out).unwrap();
    assert_eq!(rows, json!([{"region": "EU", "total": 1200}]));
}

#[tokio::test]
async fn test_query_endpoint_checks_semantics_before_calling() {
    let api = mock_api();
    let tool = QueryEndpointTool::new(api.clone(), Arc::new(common::sample_semantics()));

    let err = tool.execute(json!({"endpoint_name": "refunds"})).await.unwrap_err();
    assert!(matches!(err, AgentError::Pulse(PulseError::EndpointNotFound(ref n)) if n == "refunds"));

    // raw tables are not endpoints
    let err = tool.execute(json!({"endpoint_name": "orders"})).await.unwrap_err();
    assert!(matches!(err, AgentError::Pulse(PulseError::EndpointNotFound(_))));

    let err = tool
        .execute(json!({"endpoint_name": "sales", "params": {"limit": 3}}))
        .await
        .unwrap_err();
    assert!(matches!(err, AgentError::Pulse(PulseError::Parameter(ref m)) if m.contains("region")));

    let err = tool.execute(json!("sales please")).await.unwrap_err();
    assert!(matches!(err, AgentError::Parse(_)));

    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn test_semantics_tool_returns_full_text() {
    let semantics = Arc::new(common::sample_semantics());
    let out = SemanticsTool::new(semantics.clone()).execute(json!({})).await.unwrap();

    assert_eq!(out, semantics.view().to_text().unwrap());
    assert!(out.contains("name: orders"));
    assert!(out.contains("name: sales"));
}

#[test]
fn test_generate_sql_blocking_matches_async() {
    let llm = Arc::new(MockChatModel::text(&["SELECT region, SUM(amount) FROM orders_tbl GROUP BY region"]));
    let tool = GenerateSqlTool::new(llm.clone(), &common::sample_semantics());

    let blocking = tool.run_blocking("total amount per region").unwrap();
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let async_out = runtime.block_on(tool.run("total amount per region")).unwrap();

    assert_eq!(blocking, async_out);

    let requests = llm.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].messages, requests[1].messages);
    assert_eq!(requests[0].messages[0].content, tool.render("total amount per region").unwrap());
}

#[tokio::test]
async fn test_generate_sql_blocking_inside_runtime_is_error() {
    let llm = Arc::new(MockChatModel::text(&["SELECT 1"]));
    let tool = GenerateSqlTool::new(llm.clone(), &common::sample_semantics());

    let err = tool.run_blocking("how many orders").unwrap_err();

    assert!(matches!(err, AgentError::ToolExecution(ref m) if m.contains("use run")));
    assert_eq!(llm.call_count(), 0);
    assert_eq!(tool.run("how many orders").await.unwrap(), "SELECT 1");
}

#[tokio::test]
async fn test_generate_sql_prompt_content() {
    let llm = Arc::new(MockChatModel::text(&["SELECT 1"]));
    let tool = GenerateSqlTool::new(llm.clone(), &common::sample_semantics());

    let out = tool.execute(json!({"input": "how many customers"})).await.unwrap();
    assert_eq!(out, "SELECT 1");

    let prompt = &llm.requests()[0].messages[0].content;
    assert!(prompt.contains("Name: orders_tbl\nDescription: All orders\nColumns: \n"));
    assert!(prompt.contains("Name: customers\nDescription: Customer master data"));
    assert!(prompt.contains("QUESTION: Total sales per region\nResponse: SELECT region"));
    assert!(prompt.contains("Request: how many customers"));
}

#[tokio::test]
async fn test_toolkit_fetches_once_and_orders_tools() {
    let api = mock_api();
    let llm = Arc::new(MockChatModel::text(&["unused"]));
    let toolkit = PulseToolkit::new(api.clone(), llm).await.unwrap();

    let kinds: Vec<_> = toolkit.get_tools().iter().map(|t| t.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            Some(ToolKind::GenerateSql),
            Some(ToolKind::QueryEndpoint),
            Some(ToolKind::RawQuery),
            Some(ToolKind::FetchSemantics),
        ]
    );
    toolkit.get_tools();
    assert_eq!(api.fetch_count(), 1);

    let endpoints = toolkit.fetch_endpoints().unwrap();
    assert!(endpoints.contains("name: sales"));
    assert!(!endpoints.contains("name: orders"));

    let tables = toolkit.fetch_tables().unwrap();
    assert!(tables.contains("name: orders"));
    assert!(!tables.contains("name: sales"));
}

#[tokio::test]
async fn test_toolkit_propagates_fetch_failure() {
    let api = Arc::new(
        MockPulseApi::new(common::sample_semantics())
            .failing_fetch(|| PulseError::Auth("invalid api key".to_string())),
    );
    let llm = Arc::new(MockChatModel::text(&["unused"]));

    let err = PulseToolkit::new(api, llm).await.unwrap_err();
    assert!(err.is_fatal());
}
