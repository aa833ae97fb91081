//! OpenAI client implementation.
//!
//! Speaks the `/chat/completions` wire format, including function calling,
//! so it also works against OpenAI-compatible gateways.
//!
//! # Example
//!
//! ```rust,ignore
//! use llm::remote::OpenAiClient;
//! use llm::config::RemoteLlmConfig;
//! use llm::{ChatModel, ChatRequest, Message};
//!
//! let config = RemoteLlmConfig::from_env(
//!     "OPENAI_API_KEY",
//!     "https://api.openai.com/v1",
//!     "gpt-4"
//! )?;
//! let client = OpenAiClient::new(config)?;
//!
//! let request = ChatRequest::new(vec![Message::human("Hello!")]);
//! let response = client.chat(request).await?;
//! ```

use crate::config::RemoteLlmConfig;
use crate::error::{LlmError, Result};
use crate::message::{Message, MessageRole};
use crate::request::ChatRequest;
use crate::response::{ChatResponse, UsageMetadata};
use crate::tools::{ToolCall, ToolDefinition};
use crate::traits::ChatModel;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use tracing::debug;

/// OpenAI API client.
#[derive(Clone)]
pub struct OpenAiClient {
    config: RemoteLlmConfig,
    client: Client,
}

impl OpenAiClient {
    /// Create a new OpenAI client with the given configuration.
    pub fn new(config: RemoteLlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Convert a message to OpenAI message format.
    fn convert_message(&self, msg: &Message) -> OpenAiMessage {
        let tool_calls = if msg.tool_calls.is_empty() {
            None
        } else {
            Some(msg.tool_calls.iter().map(OpenAiToolCall::from).collect())
        };

        OpenAiMessage {
            role: match msg.role {
                MessageRole::System => "system".to_string(),
                MessageRole::Human => "user".to_string(),
                MessageRole::Assistant => "assistant".to_string(),
                MessageRole::Tool => "tool".to_string(),
            },
            content: Some(msg.content.clone()),
            name: msg.name.clone(),
            tool_call_id: msg.tool_call_id.clone(),
            tool_calls,
        }
    }

    fn convert_tool(tool: &ToolDefinition) -> OpenAiTool {
        OpenAiTool {
            kind: "function".to_string(),
            function: OpenAiFunction {
                name: tool.name.clone(),
                description: tool.description.clone(),
                parameters: tool
                    .parameters
                    .clone()
                    .unwrap_or_else(|| serde_json::json!({"type": "object", "properties": {}})),
            },
        }
    }

    fn build_request(&self, request: &ChatRequest) -> OpenAiRequest {
        let config = &request.config;
        OpenAiRequest {
            model: self.config.model.clone(),
            messages: request
                .messages
                .iter()
                .map(|m| self.convert_message(m))
                .collect(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            stop: if config.stop_sequences.is_empty() {
                None
            } else {
                Some(config.stop_sequences.clone())
            },
            tools: if config.tools.is_empty() {
                None
            } else {
                Some(config.tools.iter().map(Self::convert_tool).collect())
            },
            stream: false,
        }
    }

    /// Convert OpenAI response to ChatResponse.
    fn convert_response(&self, openai_resp: OpenAiResponse) -> Result<ChatResponse> {
        let choice = openai_resp
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("response contained no choices".to_string()))?;

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(ToolCall::from)
            .collect();

        let message = Message::assistant(choice.message.content.unwrap_or_default())
            .with_tool_calls(tool_calls);

        let usage = openai_resp
            .usage
            .as_ref()
            .map(|u| UsageMetadata::new(u.prompt_tokens, u.completion_tokens));

        let mut metadata = HashMap::new();
        metadata.insert("model".to_string(), JsonValue::String(openai_resp.model));
        metadata.insert(
            "finish_reason".to_string(),
            JsonValue::String(choice.finish_reason.unwrap_or_default()),
        );

        Ok(ChatResponse {
            message,
            usage,
            metadata,
        })
    }
}

#[async_trait]
impl ChatModel for OpenAiClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let url = self.config.chat_completions_url();
        let req_body = self.build_request(&request);

        debug!(
            model = %self.config.model,
            messages = req_body.messages.len(),
            tools = req_body.tools.as_ref().map_or(0, Vec::len),
            "Sending chat completion request"
        );

        let mut req = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&req_body);
        if let Some(org) = &self.config.organization {
            req = req.header("OpenAI-Organization", org);
        }

        let response = req.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            return Err(match status.as_u16() {
                401 => LlmError::AuthenticationError(error_text),
                429 => LlmError::RateLimitExceeded(error_text),
                400 => LlmError::InvalidRequest(error_text),
                _ => LlmError::ProviderError(format!("OpenAI API error {}: {}", status, error_text)),
            });
        }

        let openai_resp: OpenAiResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        self.convert_response(openai_resp)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

// OpenAI API types
#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<OpenAiTool>>,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiMessage {
    role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OpenAiToolCall>>,
}

#[derive(Debug, Serialize)]
struct OpenAiTool {
    #[serde(rename = "type")]
    kind: String,
    function: OpenAiFunction,
}

#[derive(Debug, Serialize)]
struct OpenAiFunction {
    name: String,
    description: String,
    parameters: JsonValue,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiToolCall {
    id: String,
    #[serde(rename = "type", default = "function_kind")]
    kind: String,
    function: OpenAiFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiFunctionCall {
    name: String,
    /// JSON-encoded argument object, as a string.
    arguments: String,
}

fn function_kind() -> String {
    "function".to_string()
}

impl From<&ToolCall> for OpenAiToolCall {
    fn from(call: &ToolCall) -> Self {
        let arguments = match &call.arguments {
            JsonValue::String(raw) => raw.clone(),
            other => other.to_string(),
        };
        Self {
            id: call.id.clone(),
            kind: function_kind(),
            function: OpenAiFunctionCall {
                name: call.name.clone(),
                arguments,
            },
        }
    }
}

impl From<OpenAiToolCall> for ToolCall {
    fn from(call: OpenAiToolCall) -> Self {
        let arguments = serde_json::from_str(&call.function.arguments)
            .unwrap_or(JsonValue::String(call.function.arguments));
        ToolCall::new(call.id, call.function.name, arguments)
    }
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    model: String,
    choices: Vec<OpenAiChoice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    prompt_tokens: usize,
    completion_tokens: usize,
}
