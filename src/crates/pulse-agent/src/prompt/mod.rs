//! Prompt assembly for the agent.
//!
//! Both agent modes share the same instructions ([`constants::PREFIX`]) with
//! the endpoint semantics, `top_k` and the example blocks filled in. The text
//! mode appends the tool listing, step format and question; the tool-calling
//! mode wraps the rendered instructions into a system message.
//!
//! Templates are assembled once when the agent is built and never mutated.

pub mod constants;
mod template;

pub use template::{values, ChatPromptTemplate, MessageTemplate, PromptTemplate, PromptValues};

use crate::error::Result;

pub const SEMANTICS_VAR: &str = "semantics";
pub const TOP_K_VAR: &str = "top_k";
pub const INPUT_VAR: &str = "input";
pub const SCRATCHPAD_VAR: &str = "agent_scratchpad";
pub const TOOLS_VAR: &str = "tools";
pub const TOOL_NAMES_VAR: &str = "tool_names";

/// The prompt an agent runs with.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentPrompt {
    /// Single text template, driven by the ReAct loop.
    Text(PromptTemplate),
    /// Message templates, driven by the tool-calling loop.
    Chat(ChatPromptTemplate),
}

impl AgentPrompt {
    pub fn input_variables(&self) -> Vec<String> {
        match self {
            AgentPrompt::Text(t) => t.input_variables(),
            AgentPrompt::Chat(c) => c.input_variables(),
        }
    }

    pub fn declares(&self, name: &str) -> bool {
        match self {
            AgentPrompt::Text(t) => t.declares(name),
            AgentPrompt::Chat(c) => c.declares(name),
        }
    }

    pub fn partial(self, name: &str, value: impl Into<String>) -> Self {
        match self {
            AgentPrompt::Text(t) => AgentPrompt::Text(t.partial(name, value)),
            AgentPrompt::Chat(c) => AgentPrompt::Chat(c.partial(name, value)),
        }
    }
}

impl From<PromptTemplate> for AgentPrompt {
    fn from(template: PromptTemplate) -> Self {
        AgentPrompt::Text(template)
    }
}

impl From<ChatPromptTemplate> for AgentPrompt {
    fn from(template: ChatPromptTemplate) -> Self {
        AgentPrompt::Chat(template)
    }
}

fn fill_prefix_parts(template: PromptTemplate, semantics_text: &str, top_k: usize) -> PromptTemplate {
    template
        .partial(SEMANTICS_VAR, semantics_text)
        .partial(TOP_K_VAR, top_k.to_string())
        .partial(
            "example_query_endpoint_request",
            constants::QUERY_ENDPOINT_REQUEST_EXAMPLE,
        )
        .partial(
            "example_query_endpoint_response",
            constants::QUERY_ENDPOINT_RESPONSE_EXAMPLE,
        )
        .partial("example_raw_query_request", constants::RAW_QUERY_REQUEST_EXAMPLE)
}

/// Whether a prefix (default when `None`) embeds the semantics.
pub fn prefix_embeds_semantics(prefix: Option<&str>) -> bool {
    PromptTemplate::from_template(prefix.unwrap_or(constants::PREFIX)).declares(SEMANTICS_VAR)
}

/// Render the instructions with semantics, `top_k` and the example blocks.
///
/// A custom prefix may use any subset of those variables; any other
/// placeholder is a configuration error.
pub fn render_prefix(prefix: Option<&str>, semantics_text: &str, top_k: usize) -> Result<String> {
    let template = PromptTemplate::from_template(prefix.unwrap_or(constants::PREFIX));
    fill_prefix_parts(template, semantics_text, top_k).format(&PromptValues::new())
}

/// Combined text template for the ReAct loop.
///
/// Leaves `tools`, `tool_names`, `input` and `agent_scratchpad` open.
pub fn react_prompt(
    prefix: Option<&str>,
    format_instructions: Option<&str>,
    semantics_text: &str,
    top_k: usize,
) -> PromptTemplate {
    let template = [
        prefix.unwrap_or(constants::PREFIX),
        constants::REACT_TOOLS_BLOCK,
        format_instructions.unwrap_or(constants::FORMAT_INSTRUCTIONS),
        constants::REACT_SUFFIX,
    ]
    .join("\n\n");

    fill_prefix_parts(PromptTemplate::from_template(&template), semantics_text, top_k)
}

/// Message templates for the tool-calling loop: rendered instructions as
/// system message, the question, an assistant priming message and the
/// scratchpad placeholder.
pub fn tool_calling_prompt(
    prefix: Option<&str>,
    suffix: Option<&str>,
    semantics_text: &str,
    top_k: usize,
) -> Result<ChatPromptTemplate> {
    let system = render_prefix(prefix, semantics_text, top_k)?;

    Ok(ChatPromptTemplate::from_messages(vec![
        MessageTemplate::System(PromptTemplate::literal(system)),
        MessageTemplate::Human(PromptTemplate::from_template("{input}")),
        MessageTemplate::Ai(PromptTemplate::literal(
            suffix.unwrap_or(constants::TOOL_CALLING_SUFFIX),
        )),
        MessageTemplate::Placeholder(SCRATCHPAD_VAR.to_string()),
    ]))
}

/// Wrap a text prompt for the tool-calling loop: the text becomes the human
/// message and the scratchpad follows it.
pub fn text_to_chat(template: PromptTemplate) -> ChatPromptTemplate {
    ChatPromptTemplate::from_messages(vec![
        MessageTemplate::Human(template),
        MessageTemplate::Placeholder(SCRATCHPAD_VAR.to_string()),
    ])
}
