//! The reasoning loop that drives the model and its tools.
//!
//! Each iteration asks the model for a decision, runs the chosen tools and
//! records the observations in the scratchpad. The loop ends on a final
//! answer or when an iteration or wall-clock cap is hit.
//!
//! Two loops share this driver:
//!
//! - [`AgentPrompt::Text`] runs the ReAct text protocol
//!   (`Thought`/`Action`/`Action Input`/`Observation`)
//! - [`AgentPrompt::Chat`] runs structured tool calling, with tool
//!   definitions bound to every request
//!
//! Tool failures are shown to the model as `Error: ...` observations, except
//! for connection and authentication failures, which abort the run.

mod react;
mod tool_calling;

use crate::config::{DEFAULT_MAX_ITERATIONS, DEFAULT_TEMPERATURE};
use crate::error::{AgentError, Result};
use crate::prompt::AgentPrompt;
use crate::tools::{ToolInput, ToolRegistry};
use llm::ChatModel;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Output of a forced stop.
pub const FORCE_STOP_MESSAGE: &str = "Agent stopped due to iteration limit or time limit.";

/// Default executor name, used in logs.
pub const DEFAULT_EXECUTOR_NAME: &str = "Pulse Agent Executor";

/// What to return when a cap is hit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EarlyStopping {
    /// Return [`FORCE_STOP_MESSAGE`].
    #[default]
    Force,
    /// Ask the model once more for a final answer from the steps so far.
    Generate,
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Finished,
    IterationLimit,
    TimeLimit,
}

/// A question plus earlier turns of the conversation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentInput {
    pub input: String,

    /// `(human, ai)` pairs, oldest first.
    #[serde(default)]
    pub chat_history: Vec<(String, String)>,
}

impl AgentInput {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            chat_history: Vec::new(),
        }
    }

    pub fn with_history(mut self, human: impl Into<String>, ai: impl Into<String>) -> Self {
        self.chat_history.push((human.into(), ai.into()));
        self
    }
}

/// A tool invocation chosen by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentAction {
    pub tool: String,
    pub tool_input: ToolInput,

    /// Model text that led to the action.
    pub log: String,

    /// Id assigned by the model in tool-calling mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

/// One action and what it returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentStep {
    pub action: AgentAction,
    pub observation: String,

    /// Loop iteration the action belongs to, starting at 1.
    pub iteration: usize,
}

/// Result of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentOutput {
    pub output: String,
    pub intermediate_steps: Vec<AgentStep>,
    pub stop_reason: StopReason,
}

/// What the model decided in one iteration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum AgentDecision {
    Finish(String),
    Act(Vec<AgentAction>),
    /// Output that could not be parsed; `observation` is shown back to the model.
    Invalid {
        log: String,
        observation: String,
    },
}

/// Tool name recorded for steps produced by unparseable model output.
pub(crate) const EXCEPTION_TOOL: &str = "_Exception";

/// Prompt variable that receives earlier conversation turns, when declared.
pub const HISTORY_VAR: &str = "chat_history";

/// Earlier turns as `Human:`/`AI:` lines.
pub(crate) fn transcript(history: &[(String, String)]) -> String {
    history
        .iter()
        .map(|(human, ai)| format!("Human: {}\nAI: {}", human, ai))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Runs an agent prompt against a model and a set of tools.
#[derive(Clone)]
pub struct AgentExecutor {
    llm: Arc<dyn ChatModel>,
    tools: ToolRegistry,
    prompt: AgentPrompt,
    max_iterations: Option<usize>,
    max_execution_time: Option<Duration>,
    early_stopping: EarlyStopping,
    handle_parsing_errors: bool,
    verbose: bool,
    temperature: f32,
    name: String,
}

impl AgentExecutor {
    pub fn new(llm: Arc<dyn ChatModel>, tools: ToolRegistry, prompt: AgentPrompt) -> Self {
        Self {
            llm,
            tools,
            prompt,
            max_iterations: Some(DEFAULT_MAX_ITERATIONS),
            max_execution_time: None,
            early_stopping: EarlyStopping::Force,
            handle_parsing_errors: true,
            verbose: false,
            temperature: DEFAULT_TEMPERATURE,
            name: DEFAULT_EXECUTOR_NAME.to_string(),
        }
    }

    /// `None` removes the iteration cap.
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

    /// When off, unparseable model output fails the run instead of being
    /// shown back to the model.
    pub fn with_handle_parsing_errors(mut self, handle: bool) -> Self {
        self.handle_parsing_errors = handle;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn prompt(&self) -> &AgentPrompt {
        &self.prompt
    }

    pub fn max_iterations(&self) -> Option<usize> {
        self.max_iterations
    }

    pub fn max_execution_time(&self) -> Option<Duration> {
        self.max_execution_time
    }

    pub fn early_stopping(&self) -> EarlyStopping {
        self.early_stopping
    }

    pub fn handles_parsing_errors(&self) -> bool {
        self.handle_parsing_errors
    }

    /// Answer a single question without history.
    pub async fn run(&self, question: &str) -> Result<String> {
        Ok(self.invoke(AgentInput::new(question)).await?.output)
    }

    /// Run the loop until a final answer or a cap.
    pub async fn invoke(&self, input: AgentInput) -> Result<AgentOutput> {
        let run_id = Uuid::new_v4();
        let started = Instant::now();
        let mut steps: Vec<AgentStep> = Vec::new();
        let mut iteration = 0;

        info!(
            executor = %self.name,
            run_id = %run_id,
            model = self.llm.model_name(),
            tools = self.tools.len(),
            "Starting agent run"
        );

        loop {
            if let Some(reason) = self.limit_reached(iteration, started.elapsed()) {
                warn!(run_id = %run_id, iterations = iteration, ?reason, "Agent stopped early");
                let output = self.stop_early(&input, &steps).await?;
                return Ok(AgentOutput {
                    output,
                    intermediate_steps: steps,
                    stop_reason: reason,
                });
            }
            iteration += 1;

            match self.plan(&input, &steps).await? {
                AgentDecision::Finish(output) => {
                    info!(run_id = %run_id, iterations = iteration, "Agent finished");
                    return Ok(AgentOutput {
                        output,
                        intermediate_steps: steps,
                        stop_reason: StopReason::Finished,
                    });
                }
                AgentDecision::Act(actions) => {
                    for action in actions {
                        self.trace_action(run_id, iteration, &action);
                        let observation = self.perform(&action).await?;
                        self.trace_observation(run_id, iteration, &observation);
                        steps.push(AgentStep {
                            action,
                            observation,
                            iteration,
                        });
                    }
                }
                AgentDecision::Invalid { log, observation } => {
                    if !self.handle_parsing_errors {
                        return Err(AgentError::Parse(format!(
                            "Could not parse LLM output: `{}`",
                            log
                        )));
                    }
                    warn!(run_id = %run_id, iteration, %observation, "Unparseable model output");
                    steps.push(AgentStep {
                        action: AgentAction {
                            tool: EXCEPTION_TOOL.to_string(),
                            tool_input: ToolInput::String(observation.clone()),
                            log,
                            tool_call_id: None,
                        },
                        observation,
                        iteration,
                    });
                }
            }
        }
    }

    fn limit_reached(&self, iterations: usize, elapsed: Duration) -> Option<StopReason> {
        if self.max_iterations.is_some_and(|max| iterations >= max) {
            return Some(StopReason::IterationLimit);
        }
        if self.max_execution_time.is_some_and(|max| elapsed >= max) {
            return Some(StopReason::TimeLimit);
        }
        None
    }

    async fn plan(&self, input: &AgentInput, steps: &[AgentStep]) -> Result<AgentDecision> {
        match &self.prompt {
            AgentPrompt::Text(template) => react::plan(self, template, input, steps).await,
            AgentPrompt::Chat(template) => tool_calling::plan(self, template, input, steps).await,
        }
    }

    async fn stop_early(&self, input: &AgentInput, steps: &[AgentStep]) -> Result<String> {
        match self.early_stopping {
            EarlyStopping::Force => Ok(FORCE_STOP_MESSAGE.to_string()),
            EarlyStopping::Generate => match &self.prompt {
                AgentPrompt::Text(template) => {
                    react::final_answer(self, template, input, steps).await
                }
                AgentPrompt::Chat(template) => {
                    tool_calling::final_answer(self, template, input, steps).await
                }
            },
        }
    }

    /// Run one action. Only fatal errors escape; the rest become observations.
    async fn perform(&self, action: &AgentAction) -> Result<String> {
        match self
            .tools
            .execute(&action.tool, action.tool_input.clone())
            .await
        {
            Ok(observation) => Ok(observation),
            Err(AgentError::ToolNotFound(name)) => Ok(format!(
                "{} is not a valid tool, try one of [{}].",
                name,
                self.tools.names().join(", ")
            )),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                warn!(tool = %action.tool, error = %e, "Tool failed");
                Ok(format!("Error: {}", e))
            }
        }
    }

    fn trace_action(&self, run_id: Uuid, iteration: usize, action: &AgentAction) {
        if self.verbose {
            info!(run_id = %run_id, iteration, tool = %action.tool, input = %action.tool_input, "Action");
        } else {
            debug!(run_id = %run_id, iteration, tool = %action.tool, "Action");
        }
    }

    fn trace_observation(&self, run_id: Uuid, iteration: usize, observation: &str) {
        if self.verbose {
            info!(run_id = %run_id, iteration, %observation, "Observation");
        } else {
            debug!(run_id = %run_id, iteration, bytes = observation.len(), "Observation");
        }
    }

    pub(crate) fn llm(&self) -> &Arc<dyn ChatModel> {
        &self.llm
    }

    pub(crate) fn temperature(&self) -> f32 {
        self.temperature
    }
}

impl fmt::Debug for AgentExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentExecutor")
            .field("name", &self.name)
            .field("model", &self.llm.model_name())
            .field("tools", &self.tools)
            .field("max_iterations", &self.max_iterations)
            .field("max_execution_time", &self.max_execution_time)
            .field("early_stopping", &self.early_stopping)
            .finish()
    }
}
