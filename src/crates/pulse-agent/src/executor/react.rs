//! ReAct text protocol.

use super::{transcript, AgentAction, AgentDecision, AgentExecutor, AgentInput, AgentStep, HISTORY_VAR};
use crate::error::Result;
use crate::prompt::{
    constants, PromptTemplate, PromptValues, INPUT_VAR, SCRATCHPAD_VAR, TOOLS_VAR,
    TOOL_NAMES_VAR,
};
use crate::tools::{ToolInput, ToolRegistry};
use llm::{ChatRequest, Message};
use regex::Regex;
use std::sync::LazyLock;

const FINAL_ANSWER: &str = "Final Answer:";
const OBSERVATION_STOP: &str = "\nObservation:";

const MISSING_ACTION: &str = "Invalid Format: Missing 'Action:' after 'Thought:'";
const MISSING_ACTION_INPUT: &str = "Invalid Format: Missing 'Action Input:' after 'Action:'";
const ANSWER_AND_ACTION: &str =
    "Invalid Format: Respond with either an 'Action:' or a 'Final Answer:', not both";

static ACTION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)Action\s*\d*\s*:[\s]*(.*?)[\s]*Action\s*\d*\s*Input\s*\d*\s*:[\s]*(.*)")
        .expect("Invalid action pattern")
});

static ACTION_ONLY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)Action\s*\d*\s*:[\s]*(.*?)").expect("Invalid action pattern"));

/// Parse one completion into a decision.
pub(crate) fn parse_output(text: &str) -> AgentDecision {
    let includes_answer = text.contains(FINAL_ANSWER);

    if let Some(caps) = ACTION_REGEX.captures(text) {
        if includes_answer {
            return invalid(text, ANSWER_AND_ACTION);
        }
        let tool = caps[1].trim().to_string();
        let tool_input = caps[2].trim().trim_matches('"').to_string();
        return AgentDecision::Act(vec![AgentAction {
            tool,
            tool_input: ToolInput::String(tool_input),
            log: text.to_string(),
            tool_call_id: None,
        }]);
    }

    if includes_answer {
        let answer = text.rsplit(FINAL_ANSWER).next().unwrap_or_default();
        return AgentDecision::Finish(answer.trim().to_string());
    }

    if !ACTION_ONLY_REGEX.is_match(text) {
        invalid(text, MISSING_ACTION)
    } else {
        invalid(text, MISSING_ACTION_INPUT)
    }
}

fn invalid(text: &str, observation: &str) -> AgentDecision {
    AgentDecision::Invalid {
        log: text.to_string(),
        observation: observation.to_string(),
    }
}

/// Prior steps as the text the model continues from.
pub(crate) fn scratchpad(steps: &[AgentStep]) -> String {
    let mut out = String::new();
    for step in steps {
        out.push_str(&step.action.log);
        out.push_str("\nObservation: ");
        out.push_str(&step.observation);
        out.push_str("\nThought: ");
    }
    out
}

fn render_tools(tools: &ToolRegistry) -> String {
    tools
        .iter()
        .map(|t| format!("{}: {}", t.name(), t.description()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render(
    template: &PromptTemplate,
    tools: &ToolRegistry,
    input: &AgentInput,
    scratchpad: String,
) -> Result<String> {
    let mut values = PromptValues::new();
    values.insert(TOOLS_VAR.to_string(), render_tools(tools));
    values.insert(TOOL_NAMES_VAR.to_string(), tools.names().join(", "));
    values.insert(SCRATCHPAD_VAR.to_string(), scratchpad);

    let question = if template.declares(HISTORY_VAR) {
        values.insert(HISTORY_VAR.to_string(), transcript(&input.chat_history));
        input.input.clone()
    } else if input.chat_history.is_empty() {
        input.input.clone()
    } else {
        format!(
            "Previous conversation:\n{}\n\n{}",
            transcript(&input.chat_history),
            input.input
        )
    };
    values.insert(INPUT_VAR.to_string(), question);

    template.format(&values)
}

pub(crate) async fn plan(
    executor: &AgentExecutor,
    template: &PromptTemplate,
    input: &AgentInput,
    steps: &[AgentStep],
) -> Result<AgentDecision> {
    let prompt = render(template, executor.tools(), input, scratchpad(steps))?;
    let request = ChatRequest::new(vec![Message::human(prompt)])
        .with_temperature(executor.temperature())
        .with_stop_sequences(vec![OBSERVATION_STOP.to_string()]);

    let response = executor.llm().chat(request).await?;
    Ok(parse_output(&response.message.content))
}

/// One more call, asking for an answer from the steps so far.
pub(crate) async fn final_answer(
    executor: &AgentExecutor,
    template: &PromptTemplate,
    input: &AgentInput,
    steps: &[AgentStep],
) -> Result<String> {
    let pad = scratchpad(steps) + constants::FINAL_ANSWER_NUDGE;
    let prompt = render(template, executor.tools(), input, pad)?;
    let request =
        ChatRequest::new(vec![Message::human(prompt)]).with_temperature(executor.temperature());

    let text = executor.llm().chat(request).await?.message.content;
    match parse_output(&text) {
        AgentDecision::Finish(answer) => Ok(answer),
        _ => Ok(text.trim().to_string()),
    }
}
