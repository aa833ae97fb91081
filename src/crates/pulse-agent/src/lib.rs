//! # pulse-agent - question answering over Pulse analytics data
//!
//! An LLM agent that reads an application's semantics (its cubes), decides
//! between invoking a predefined endpoint and writing SQL over raw tables,
//! and answers with the data it retrieved.
//!
//! - **[Tools](tools)** - raw SQL, endpoint invocation, SQL generation, semantics fetch
//! - **[Toolkit](toolkit)** - the built-in tools bound to one application
//! - **[Prompts](prompt)** - instructions, templates and example blocks
//! - **[Builder](builder)** - turns a model and a Pulse source into an executor
//! - **[Executor](executor)** - ReAct and tool-calling loops with iteration and time caps
//! - **[Suggestions](suggest)** - questions the semantics can answer
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use llm::{remote::OpenAiClient, RemoteLlmConfig};
//! use pulse::{PulseClient, PulseConfig};
//! use pulse_agent::PulseAgentBuilder;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let llm = Arc::new(OpenAiClient::new(RemoteLlmConfig::openai_from_env()?)?);
//!     let client = Arc::new(PulseClient::new(PulseConfig::from_env()?)?);
//!
//!     let agent = PulseAgentBuilder::new()
//!         .with_llm(llm)
//!         .with_client(client)
//!         .build()
//!         .await?;
//!
//!     println!("{}", agent.run("Which region had the most sales?").await?);
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod config;
pub mod error;
pub mod executor;
pub mod prompt;
pub mod suggest;
pub mod toolkit;
pub mod tools;

pub use builder::{create_pulse_agent_simple, BuildStage, PulseAgentBuilder};
pub use config::{AgentConfig, AgentMode, DEFAULT_MAX_ITERATIONS, DEFAULT_TOP_K};
pub use error::{AgentError, Result};
pub use executor::{
    AgentAction, AgentExecutor, AgentInput, AgentOutput, AgentStep, EarlyStopping, StopReason,
    FORCE_STOP_MESSAGE,
};
pub use prompt::{AgentPrompt, ChatPromptTemplate, MessageTemplate, PromptTemplate};
pub use suggest::{suggest_questions, DEFAULT_SUGGESTION_COUNT};
pub use toolkit::PulseToolkit;
pub use tools::{Tool, ToolInput, ToolKind, ToolRegistry};
