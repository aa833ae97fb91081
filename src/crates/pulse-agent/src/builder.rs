//! Assemble an [`AgentExecutor`] from a model and a Pulse source.
//!
//! Building walks through fixed stages, each logged:
//!
//! ```text
//! Uninitialized -> ToolsResolved -> PromptResolved -> AgentConstructed
//! ```
//!
//! Everything that can be checked without the network (model present,
//! exactly one Pulse source, a known mode, prompt/mode compatibility, extra
//! tool names) is checked before semantics are fetched.
//!
//! ```rust,ignore
//! let agent = PulseAgentBuilder::new()
//!     .with_llm(llm)
//!     .with_client(Arc::new(PulseClient::new(PulseConfig::from_env()?)?))
//!     .with_mode("react")
//!     .build()
//!     .await?;
//!
//! let answer = agent.run("How many orders were placed last week?").await?;
//! ```

use crate::config::{AgentConfig, AgentMode, DEFAULT_MAX_ITERATIONS, DEFAULT_TEMPERATURE, DEFAULT_TOP_K};
use crate::error::{AgentError, Result};
use crate::executor::{AgentExecutor, EarlyStopping, HISTORY_VAR};
use crate::prompt::{
    prefix_embeds_semantics, react_prompt, text_to_chat, tool_calling_prompt, AgentPrompt,
    INPUT_VAR, SCRATCHPAD_VAR, SEMANTICS_VAR, TOOLS_VAR, TOOL_NAMES_VAR, TOP_K_VAR,
};
use crate::toolkit::PulseToolkit;
use crate::tools::{Tool, ToolKind, ToolRegistry};
use llm::ChatModel;
use pulse::{PulseApi, PulseClient, PulseConfig};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Construction progress, logged on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStage {
    Uninitialized,
    ToolsResolved,
    PromptResolved,
    AgentConstructed,
}

impl fmt::Display for BuildStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BuildStage::Uninitialized => "uninitialized",
            BuildStage::ToolsResolved => "tools_resolved",
            BuildStage::PromptResolved => "prompt_resolved",
            BuildStage::AgentConstructed => "agent_constructed",
        };
        f.write_str(name)
    }
}

fn advance(stage: &mut BuildStage, next: BuildStage) {
    info!(from = %stage, to = %next, "Agent builder stage");
    *stage = next;
}

enum Source {
    Toolkit(PulseToolkit),
    Client(Arc<dyn PulseApi>),
}

/// Builder for a Pulse agent.
pub struct PulseAgentBuilder {
    llm: Option<Arc<dyn ChatModel>>,
    toolkit: Option<PulseToolkit>,
    client: Option<Arc<dyn PulseApi>>,
    mode: String,
    prefix: Option<String>,
    suffix: Option<String>,
    format_instructions: Option<String>,
    prompt: Option<AgentPrompt>,
    top_k: usize,
    max_iterations: Option<usize>,
    max_execution_time: Option<Duration>,
    early_stopping: EarlyStopping,
    handle_parsing_errors: bool,
    verbose: bool,
    extra_tools: Vec<Arc<dyn Tool>>,
    temperature: f32,
    name: Option<String>,
}

impl Default for PulseAgentBuilder {
    fn default() -> Self {
        Self {
            llm: None,
            toolkit: None,
            client: None,
            mode: AgentMode::default().as_str().to_string(),
            prefix: None,
            suffix: None,
            format_instructions: None,
            prompt: None,
            top_k: DEFAULT_TOP_K,
            max_iterations: Some(DEFAULT_MAX_ITERATIONS),
            max_execution_time: None,
            early_stopping: EarlyStopping::Force,
            handle_parsing_errors: true,
            verbose: false,
            extra_tools: Vec::new(),
            temperature: DEFAULT_TEMPERATURE,
            name: None,
        }
    }
}

impl PulseAgentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from loaded configuration.
    pub fn from_config(config: &AgentConfig) -> Self {
        Self::new()
            .with_agent_mode(config.mode)
            .with_top_k(config.top_k)
            .with_max_iterations(config.max_iterations)
            .with_max_execution_time(config.max_execution_time())
            .with_temperature(config.temperature)
            .with_verbose(config.verbose)
    }

    pub fn with_llm(mut self, llm: Arc<dyn ChatModel>) -> Self {
        self.llm = Some(llm);
        self
    }

    /// Use a toolkit whose semantics are already fetched.
    pub fn with_toolkit(mut self, toolkit: PulseToolkit) -> Self {
        self.toolkit = Some(toolkit);
        self
    }

    /// Use a client; semantics are fetched during [`build`](Self::build).
    pub fn with_client(mut self, client: Arc<dyn PulseApi>) -> Self {
        self.client = Some(client);
        self
    }

    /// Mode by name, parsed during [`build`](Self::build).
    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = mode.into();
        self
    }

    pub fn with_agent_mode(mut self, mode: AgentMode) -> Self {
        self.mode = mode.as_str().to_string();
        self
    }

    /// Replace the built-in instructions. Ignored when a full prompt is given.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Assistant priming message in tool-calling mode.
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }

    /// Step format block in ReAct mode.
    pub fn with_format_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.format_instructions = Some(instructions.into());
        self
    }

    /// Use a complete prompt of your own.
    pub fn with_prompt(mut self, prompt: impl Into<AgentPrompt>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: Option<usize>) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_max_execution_time(mut self, max_execution_time: Option<Duration>) -> Self {
        self.max_execution_time = max_execution_time;
        self
    }

    pub fn with_early_stopping(mut self, early_stopping: EarlyStopping) -> Self {
        self.early_stopping = early_stopping;
        self
    }

    pub fn with_handle_parsing_errors(mut self, handle: bool) -> Self {
        self.handle_parsing_errors = handle;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Extra tools are registered after the built-in ones.
    pub fn with_extra_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.extra_tools.push(tool);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    fn check_extra_tools(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for tool in &self.extra_tools {
            let name = tool.name();
            if ToolKind::from_name(name).is_some() || !seen.insert(name) {
                return Err(AgentError::Config(format!("Duplicate tool name: {}", name)));
            }
        }
        Ok(())
    }

    /// Checks that need no network access.
    fn validate(&mut self) -> Result<(Arc<dyn ChatModel>, Source, AgentMode)> {
        let mode: AgentMode = self.mode.parse()?;

        let llm = self
            .llm
            .clone()
            .ok_or_else(|| AgentError::Config("An LLM is required".to_string()))?;

        let source = match (self.toolkit.take(), self.client.take()) {
            (Some(toolkit), None) => Source::Toolkit(toolkit),
            (None, Some(client)) => Source::Client(client),
            (None, None) => {
                return Err(AgentError::Config(
                    "Must provide exactly one of 'toolkit' or 'client'. Received neither."
                        .to_string(),
                ))
            }
            (Some(_), Some(_)) => {
                return Err(AgentError::Config(
                    "Must provide exactly one of 'toolkit' or 'client'. Received both."
                        .to_string(),
                ))
            }
        };

        if self.top_k == 0 {
            return Err(AgentError::Config("top_k must be greater than 0".to_string()));
        }
        if mode == AgentMode::React && matches!(self.prompt, Some(AgentPrompt::Chat(_))) {
            return Err(AgentError::Config(
                "A chat prompt cannot drive the react mode; pass a text prompt".to_string(),
            ));
        }
        self.check_extra_tools()?;

        Ok((llm, source, mode))
    }

    /// Resolve tools and prompt, then construct the executor.
    ///
    /// Fetches semantics when built from a client.
    pub async fn build(mut self) -> Result<AgentExecutor> {
        let mut stage = BuildStage::Uninitialized;
        let (llm, source, mode) = self.validate()?;
        info!(%mode, top_k = self.top_k, "Building Pulse agent");

        let toolkit = match source {
            Source::Toolkit(toolkit) => toolkit,
            Source::Client(client) => PulseToolkit::new(client, llm.clone()).await?,
        };
        let mut tools = ToolRegistry::from_tools(toolkit.get_tools())?;
        for tool in self.extra_tools.drain(..) {
            tools.register(tool)?;
        }
        advance(&mut stage, BuildStage::ToolsResolved);

        let semantics_text = toolkit.fetch_endpoints()?;
        let prompt = match self.prompt.take() {
            None => {
                if prefix_embeds_semantics(self.prefix.as_deref()) {
                    tools.remove_kind(ToolKind::FetchSemantics);
                }
                match mode {
                    AgentMode::React => AgentPrompt::Text(react_prompt(
                        self.prefix.as_deref(),
                        self.format_instructions.as_deref(),
                        &semantics_text,
                        self.top_k,
                    )),
                    AgentMode::ToolCalling => AgentPrompt::Chat(tool_calling_prompt(
                        self.prefix.as_deref(),
                        self.suffix.as_deref(),
                        &semantics_text,
                        self.top_k,
                    )?),
                }
            }
            Some(mut prompt) => {
                if prompt.declares(TOP_K_VAR) {
                    prompt = prompt.partial(TOP_K_VAR, self.top_k.to_string());
                }
                if prompt.declares(SEMANTICS_VAR) {
                    prompt = prompt.partial(SEMANTICS_VAR, semantics_text.as_str());
                    tools.remove_kind(ToolKind::FetchSemantics);
                }
                match (mode, prompt) {
                    (AgentMode::ToolCalling, AgentPrompt::Text(text)) => {
                        AgentPrompt::Chat(text_to_chat(text))
                    }
                    (_, prompt) => prompt,
                }
            }
        };
        check_prompt_variables(&prompt)?;
        advance(&mut stage, BuildStage::PromptResolved);

        let executor = AgentExecutor::new(llm, tools, prompt)
            .with_max_iterations(self.max_iterations)
            .with_max_execution_time(self.max_execution_time)
            .with_early_stopping(self.early_stopping)
            .with_handle_parsing_errors(self.handle_parsing_errors)
            .with_verbose(self.verbose)
            .with_temperature(self.temperature);
        let executor = match self.name.take() {
            Some(name) => executor.with_name(name),
            None => executor,
        };
        advance(&mut stage, BuildStage::AgentConstructed);

        info!(tools = ?executor.tools().names(), "Pulse agent ready");
        Ok(executor)
    }
}

/// The prompt must leave open exactly what the loop supplies.
fn check_prompt_variables(prompt: &AgentPrompt) -> Result<()> {
    let (required, supplied): (&[&str], &[&str]) = match prompt {
        AgentPrompt::Text(_) => (
            &[TOOLS_VAR, TOOL_NAMES_VAR, SCRATCHPAD_VAR][..],
            &[TOOLS_VAR, TOOL_NAMES_VAR, SCRATCHPAD_VAR, INPUT_VAR, HISTORY_VAR][..],
        ),
        AgentPrompt::Chat(chat) => {
            if !chat.has_placeholder(SCRATCHPAD_VAR) {
                return Err(AgentError::Config(format!(
                    "Prompt needs a '{}' message placeholder",
                    SCRATCHPAD_VAR
                )));
            }
            (&[] as &[&str], &[SCRATCHPAD_VAR, INPUT_VAR, HISTORY_VAR][..])
        }
    };

    let open = prompt.input_variables();
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|name| !open.iter().any(|v| v == name))
        .collect();
    if !missing.is_empty() {
        return Err(AgentError::Config(format!(
            "Prompt missing required variables: {}",
            missing.join(", ")
        )));
    }

    let unknown: Vec<&str> = open
        .iter()
        .map(String::as_str)
        .filter(|name| !supplied.contains(name))
        .collect();
    if !unknown.is_empty() {
        return Err(AgentError::Config(format!(
            "Prompt has variables the agent cannot fill: {}",
            unknown.join(", ")
        )));
    }
    Ok(())
}

/// ReAct agent from credentials, using the default Pulse base URL.
///
/// Missing credentials are a configuration error.
pub async fn create_pulse_agent_simple(
    api_key: Option<&str>,
    application_id: Option<&str>,
    llm: Arc<dyn ChatModel>,
) -> Result<AgentExecutor> {
    let (Some(api_key), Some(application_id)) = (api_key, application_id) else {
        return Err(AgentError::Config(
            "Please provide api_key and application_id to create a Pulse agent".to_string(),
        ));
    };

    let client = PulseClient::new(PulseConfig::new(api_key, application_id))?;
    PulseAgentBuilder::new()
        .with_llm(llm)
        .with_client(Arc::new(client))
        .with_agent_mode(AgentMode::React)
        .build()
        .await
}
