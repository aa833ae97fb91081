//! Chat model abstractions and LLM providers for pulse-agent.
//!
//! This crate defines the [`ChatModel`] trait the agent talks to, the message
//! and request types that flow through it, and a concrete remote provider.
//!
//! The agent treats a model as a pure function from prompt to completion: one
//! request in, one response out, no retries. Tool calling is first-class so the
//! structured agent mode can bind tool definitions and read back tool calls.
//!
//! # Remote Providers
//!
//! - **OpenAI** - OpenAI chat completions API (and compatible endpoints)
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use llm::remote::OpenAiClient;
//! use llm::config::RemoteLlmConfig;
//! use llm::{ChatModel, ChatRequest, Message};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RemoteLlmConfig::from_env(
//!         "OPENAI_API_KEY",
//!         "https://api.openai.com/v1",
//!         "gpt-3.5-turbo-0125",
//!     )?;
//!     let client = OpenAiClient::new(config)?;
//!
//!     let request = ChatRequest::new(vec![
//!         Message::human("Which cube holds daily sales?")
//!     ]).with_temperature(0.0);
//!
//!     let response = client.chat(request).await?;
//!     println!("Response: {}", response.message.content);
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod message;
pub mod request;
pub mod response;
pub mod tools;
pub mod traits;

pub mod remote;

// Re-export commonly used types
pub use config::RemoteLlmConfig;
pub use error::{LlmError, Result};
pub use message::{Message, MessageRole};
pub use request::{ChatConfig, ChatRequest};
pub use response::{ChatResponse, UsageMetadata};
pub use tools::{ToolCall, ToolDefinition};
pub use traits::ChatModel;
