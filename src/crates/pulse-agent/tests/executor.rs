//! Agent loops end to end with scripted models.

mod common;

use common::{mock_api, tool_call_response, MockChatModel, MockPulseApi, PulseCall};
use llm::{ChatResponse, MessageRole};
use pulse::PulseError;
use pulse_agent::{
    AgentError, AgentExecutor, AgentInput, AgentMode, EarlyStopping, PulseAgentBuilder,
    PulseToolkit, StopReason, FORCE_STOP_MESSAGE,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

const RAW_QUERY_STEP: &str = "Thought: I need the order count.\nAction: pulse_raw_query\nAction Input: SELECT COUNT(*) AS n FROM orders_tbl";

async fn agent(
    api: Arc<MockPulseApi>,
    llm: Arc<MockChatModel>,
    mode: AgentMode,
    configure: impl FnOnce(PulseAgentBuilder) -> PulseAgentBuilder,
) -> AgentExecutor {
    let toolkit = PulseToolkit::new(api, llm.clone()).await.unwrap();
    let builder = PulseAgentBuilder::new()
        .with_llm(llm)
        .with_toolkit(toolkit)
        .with_agent_mode(mode);
    configure(builder).build().await.unwrap()
}

#[tokio::test]
async fn test_react_reaches_final_answer() {
    let api = mock_api();
    let llm = Arc::new(MockChatModel::text(&[
        RAW_QUERY_STEP,
        "Thought: I now know the answer.\nFinal Answer: There are 3 orders.",
    ]));
    let agent = agent(api.clone(), llm.clone(), AgentMode::React, |b| b).await;

    let out = agent.invoke(AgentInput::new("How many orders?")).await.unwrap();

    assert_eq!(out.output, "There are 3 orders.");
    assert_eq!(out.stop_reason, StopReason::Finished);
    assert_eq!(out.intermediate_steps.len(), 1);
    assert_eq!(out.intermediate_steps[0].action.tool, "pulse_raw_query");
    assert!(out.intermediate_steps[0].observation.contains("\"rows\""));
    assert_eq!(
        api.calls()[1..],
        [PulseCall::RawQuery("SELECT COUNT(*) AS n FROM orders_tbl".to_string())]
    );

    let requests = llm.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].config.stop_sequences, vec!["\nObservation:".to_string()]);

    let second = &requests[1].messages[0].content;
    assert!(second.contains("Question: How many orders?"));
    assert!(second.contains(&format!(
        "{}\nObservation: {}\nThought: ",
        RAW_QUERY_STEP, out.intermediate_steps[0].observation
    )));
}

#[tokio::test]
async fn test_react_prompt_lists_tools() {
    let llm = Arc::new(MockChatModel::text(&["Final Answer: ok"]));
    let agent = agent(mock_api(), llm.clone(), AgentMode::React, |b| b).await;
    agent.run("hi").await.unwrap();

    let prompt = &llm.requests()[0].messages[0].content;
    assert!(prompt.contains("pulse_raw_query: Use this tool to execute a raw SQL query"));
    assert!(prompt.contains(
        "should be one of [pulse_generate_query, pulse_query_endpoint, pulse_raw_query]"
    ));
    // endpoint semantics are embedded, raw tables are not
    assert!(prompt.contains("name: sales"));
    assert!(!prompt.contains("name: customers"));
}

#[tokio::test]
async fn test_iteration_cap_forces_stop() {
    let llm = Arc::new(MockChatModel::text(&[RAW_QUERY_STEP]));
    let agent = agent(mock_api(), llm.clone(), AgentMode::React, |b| {
        b.with_max_iterations(Some(2))
    })
    .await;

    let out = agent.invoke(AgentInput::new("loop forever")).await.unwrap();

    assert_eq!(out.output, FORCE_STOP_MESSAGE);
    assert_eq!(out.stop_reason, StopReason::IterationLimit);
    assert_eq!(out.intermediate_steps.len(), 2);
    assert_eq!(llm.call_count(), 2);
}

#[tokio::test]
async fn test_time_cap_forces_stop() {
    let llm = Arc::new(MockChatModel::text(&[RAW_QUERY_STEP]));
    let agent = agent(mock_api(), llm.clone(), AgentMode::React, |b| {
        b.with_max_execution_time(Some(Duration::ZERO))
    })
    .await;

    let out = agent.invoke(AgentInput::new("q")).await.unwrap();
    assert_eq!(out.stop_reason, StopReason::TimeLimit);
    assert_eq!(out.output, FORCE_STOP_MESSAGE);
    assert_eq!(llm.call_count(), 0);
}

#[tokio::test]
async fn test_generate_early_stopping_asks_for_answer() {
    let llm = Arc::new(MockChatModel::text(&[
        RAW_QUERY_STEP,
        "Final Answer: Probably 3 orders.",
    ]));
    let agent = agent(mock_api(), llm.clone(), AgentMode::React, |b| {
        b.with_max_iterations(Some(1))
            .with_early_stopping(EarlyStopping::Generate)
    })
    .await;

    let out = agent.invoke(AgentInput::new("How many orders?")).await.unwrap();

    assert_eq!(out.output, "Probably 3 orders.");
    assert_eq!(out.stop_reason, StopReason::IterationLimit);
    let last = &llm.requests()[1];
    assert!(last.config.stop_sequences.is_empty());
    assert!(last.messages[0]
        .content
        .contains("I now need to return a final answer based on the previous steps:"));
}

#[tokio::test]
async fn test_tool_error_becomes_observation() {
    let api = Arc::new(
        MockPulseApi::new(common::sample_semantics())
            .failing_raw_query(|| PulseError::Query("no such table: order".to_string())),
    );
    let llm = Arc::new(MockChatModel::text(&[
        RAW_QUERY_STEP,
        "Final Answer: I could not get the data.",
    ]));
    let agent = agent(api, llm, AgentMode::React, |b| b).await;

    let out = agent.invoke(AgentInput::new("q")).await.unwrap();

    assert_eq!(out.stop_reason, StopReason::Finished);
    assert_eq!(
        out.intermediate_steps[0].observation,
        "Error: Query failed: no such table: order"
    );
}

#[tokio::test]
async fn test_fatal_tool_error_aborts_run() {
    let api = Arc::new(
        MockPulseApi::new(common::sample_semantics())
            .failing_raw_query(|| PulseError::Connection("connection refused".to_string())),
    );
    let llm = Arc::new(MockChatModel::text(&[RAW_QUERY_STEP, "Final Answer: unreachable"]));
    let agent = agent(api, llm.clone(), AgentMode::React, |b| b).await;

    let err = agent.invoke(AgentInput::new("q")).await.unwrap_err();

    assert!(matches!(err, AgentError::Pulse(PulseError::Connection(_))));
    assert!(err.is_fatal());
    assert_eq!(llm.call_count(), 1);
}

#[tokio::test]
async fn test_invalid_format_and_unknown_tool_are_observations() {
    let llm = Arc::new(MockChatModel::text(&[
        "I am not sure what to do.",
        "Action: web_search\nAction Input: orders",
        "Final Answer: done",
    ]));
    let agent = agent(mock_api(), llm, AgentMode::React, |b| b).await;

    let out = agent.invoke(AgentInput::new("q")).await.unwrap();
    let observations: Vec<_> = out
        .intermediate_steps
        .iter()
        .map(|s| s.observation.as_str())
        .collect();

    assert_eq!(
        observations,
        vec![
            "Invalid Format: Missing 'Action:' after 'Thought:'",
            "web_search is not a valid tool, try one of [pulse_generate_query, pulse_query_endpoint, pulse_raw_query].",
        ]
    );
    assert_eq!(out.output, "done");
}

#[tokio::test]
async fn test_parsing_errors_fail_when_not_handled() {
    let llm = Arc::new(MockChatModel::text(&["gibberish"]));
    let agent = agent(mock_api(), llm, AgentMode::React, |b| {
        b.with_handle_parsing_errors(false)
    })
    .await;

    let err = agent.invoke(AgentInput::new("q")).await.unwrap_err();
    assert!(matches!(err, AgentError::Parse(_)));
}

#[tokio::test]
async fn test_tool_calling_loop() {
    let api = mock_api();
    let llm = Arc::new(MockChatModel::new(vec![
        tool_call_response(
            "call_1",
            "pulse_query_endpoint",
            json!({"endpoint_name": "sales", "params": {"region": "EU"}, "page_size": 100}),
        ),
        ChatResponse::text("EU sold 1200."),
    ]));
    let agent = agent(api.clone(), llm.clone(), AgentMode::ToolCalling, |b| b).await;

    let out = agent.invoke(AgentInput::new("Sales in EU?")).await.unwrap();

    assert_eq!(out.output, "EU sold 1200.");
    assert_eq!(out.intermediate_steps.len(), 1);
    assert_eq!(out.intermediate_steps[0].action.tool_call_id.as_deref(), Some("call_1"));
    assert!(matches!(&api.calls()[1], PulseCall::QueryEndpoint(p) if p.endpoint_name == "sales"));

    let requests = llm.requests();
    let tool_names: Vec<_> = requests[0].config.tools.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(
        tool_names,
        vec!["pulse_generate_query", "pulse_query_endpoint", "pulse_raw_query"]
    );

    let roles: Vec<_> = requests[1].messages.iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![
            MessageRole::System,
            MessageRole::Human,
            MessageRole::Assistant,
            MessageRole::Assistant,
            MessageRole::Tool,
        ]
    );
    let tool_message = &requests[1].messages[4];
    assert_eq!(tool_message.tool_call_id.as_deref(), Some("call_1"));
    assert_eq!(tool_message.content, r#"[{"region":"EU","total":1200}]"#);
}

#[tokio::test]
async fn test_tool_calling_history_precedes_question() {
    let llm = Arc::new(MockChatModel::text(&["Still 1200."]));
    let agent = agent(mock_api(), llm.clone(), AgentMode::ToolCalling, |b| b).await;

    let input = AgentInput::new("And now?").with_history("Sales in EU?", "EU sold 1200.");
    agent.invoke(input).await.unwrap();

    let contents: Vec<_> = llm.requests()[0].messages[1..4]
        .iter()
        .map(|m| m.content.clone())
        .collect();
    assert_eq!(contents, vec!["Sales in EU?", "EU sold 1200.", "And now?"]);
}
