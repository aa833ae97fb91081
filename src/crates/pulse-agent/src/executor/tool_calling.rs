//! Structured tool-calling protocol.

use super::{transcript, AgentAction, AgentDecision, AgentExecutor, AgentInput, AgentStep, HISTORY_VAR};
use crate::error::Result;
use crate::prompt::{constants, values, ChatPromptTemplate, INPUT_VAR, SCRATCHPAD_VAR};
use llm::{ChatRequest, Message, MessageRole, ToolCall};
use std::collections::HashMap;

/// Prior steps as assistant tool-call messages followed by their results.
///
/// Steps from the same iteration share one assistant message.
pub(crate) fn scratchpad(steps: &[AgentStep]) -> Vec<Message> {
    let mut messages = Vec::new();
    for group in steps.chunk_by(|a, b| a.iteration == b.iteration) {
        let ids: Vec<String> = group
            .iter()
            .enumerate()
            .map(|(n, step)| {
                step.action
                    .tool_call_id
                    .clone()
                    .unwrap_or_else(|| format!("call_{}_{}", step.iteration, n))
            })
            .collect();

        let calls = group
            .iter()
            .zip(&ids)
            .map(|(step, id)| {
                ToolCall::new(id.clone(), step.action.tool.clone(), step.action.tool_input.clone())
            })
            .collect();
        messages.push(Message::assistant(group[0].action.log.clone()).with_tool_calls(calls));

        for (step, id) in group.iter().zip(ids) {
            messages.push(Message::tool(id, step.observation.clone()));
        }
    }
    messages
}

fn history_messages(history: &[(String, String)]) -> Vec<Message> {
    history
        .iter()
        .flat_map(|(human, ai)| [Message::human(human.clone()), Message::assistant(ai.clone())])
        .collect()
}

/// Render the prompt for one request.
///
/// History goes into a `chat_history` placeholder or variable when the
/// prompt has one, otherwise right after the leading system messages.
pub(crate) fn build_messages(
    template: &ChatPromptTemplate,
    input: &AgentInput,
    steps: &[AgentStep],
) -> Result<Vec<Message>> {
    let mut text_values = values([(INPUT_VAR, input.input.clone())]);
    let mut placeholders = HashMap::new();
    placeholders.insert(SCRATCHPAD_VAR.to_string(), scratchpad(steps));

    let history = history_messages(&input.chat_history);
    let history_in_prompt = template.declares(HISTORY_VAR);
    if template.has_placeholder(HISTORY_VAR) {
        placeholders.insert(HISTORY_VAR.to_string(), history.clone());
    } else if history_in_prompt {
        text_values.insert(HISTORY_VAR.to_string(), transcript(&input.chat_history));
    }

    let mut messages = template.format_messages(&text_values, &placeholders)?;
    if !history_in_prompt && !history.is_empty() {
        let at = messages
            .iter()
            .take_while(|m| m.role == MessageRole::System)
            .count();
        messages.splice(at..at, history);
    }
    Ok(messages)
}

fn decide(message: Message) -> AgentDecision {
    if !message.has_tool_calls() {
        return AgentDecision::Finish(message.content.trim().to_string());
    }
    let log = message.content;
    AgentDecision::Act(
        message
            .tool_calls
            .into_iter()
            .map(|call| AgentAction {
                tool: call.name,
                tool_input: call.arguments,
                log: log.clone(),
                tool_call_id: Some(call.id),
            })
            .collect(),
    )
}

pub(crate) async fn plan(
    executor: &AgentExecutor,
    template: &ChatPromptTemplate,
    input: &AgentInput,
    steps: &[AgentStep],
) -> Result<AgentDecision> {
    let messages = build_messages(template, input, steps)?;
    let request = ChatRequest::new(messages)
        .with_temperature(executor.temperature())
        .with_tools(executor.tools().definitions());

    let response = executor.llm().chat(request).await?;
    Ok(decide(response.message))
}

/// One more call without tools, asking for an answer from the steps so far.
pub(crate) async fn final_answer(
    executor: &AgentExecutor,
    template: &ChatPromptTemplate,
    input: &AgentInput,
    steps: &[AgentStep],
) -> Result<String> {
    let mut messages = build_messages(template, input, steps)?;
    messages.push(Message::human(constants::FINAL_ANSWER_NUDGE.trim()));

    let request = ChatRequest::new(messages).with_temperature(executor.temperature());
    let response = executor.llm().chat(request).await?;
    Ok(response.message.content.trim().to_string())
}
