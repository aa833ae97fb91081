//! Remote LLM provider implementations.
//!
//! These providers require an API key and talk to a hosted chat completions
//! endpoint over HTTPS.
//!
//! # Providers
//!
//! - **OpenAI** - OpenAI models and any endpoint speaking the same wire format

pub mod openai;

pub use openai::OpenAiClient;
