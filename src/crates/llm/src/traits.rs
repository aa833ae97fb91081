//! The chat model trait the agent is written against.

use crate::error::Result;
use crate::request::ChatRequest;
use crate::response::ChatResponse;
use async_trait::async_trait;

/// A chat-completion language model.
///
/// Implementations convert [`ChatRequest`] messages to their provider's
/// format, make exactly one call, and convert the reply back. Retries and
/// rate limiting are the caller's business.
///
/// # Example
///
/// ```rust,ignore
/// use llm::{ChatModel, ChatRequest, Message};
/// use std::sync::Arc;
///
/// let model: Arc<dyn ChatModel> = Arc::new(client);
/// let response = model
///     .chat(ChatRequest::new(vec![Message::human("What is 2 + 2?")]))
///     .await?;
/// println!("Answer: {}", response.message.content);
/// ```
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Generate a complete chat response from messages.
    ///
    /// # Errors
    ///
    /// Network failures, authentication errors, rate limiting and malformed
    /// provider replies all surface as [`crate::LlmError`].
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse>;

    /// Provider/model identifier used in logs.
    fn model_name(&self) -> &str {
        "unknown"
    }
}
