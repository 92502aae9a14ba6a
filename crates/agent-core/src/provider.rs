//! LLM Provider Strategy Pattern
//!
//! Defines a common interface for all LLM backends (OpenAI, Gemini, Claude,
//! Ollama, ...) so the orchestrator works with any of them without code
//! changes. Provider adapters translate the canonical [`Message`] and
//! [`ToolSpec`] shapes into their own wire format and map every failure into
//! [`crate::error::BackendError`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_core::provider::{ConversationOptions, LlmProvider, Response};
//!
//! match provider.complete(&messages, &options).await? {
//!     Response::FinalAnswer { text } => println!("{text}"),
//!     Response::ToolCallsRequested { calls, .. } => { /* run tools */ }
//! }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::message::Message;
use crate::tool::{ToolCall, ToolSpec};

/// Default model when none is configured
pub const DEFAULT_MODEL: &str = "gpt-4.1-mini";

/// Per-request generation settings and the tools exposed for the turn
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConversationOptions {
    /// Model identifier (e.g., "gpt-4.1-mini", "gemini-2.0-flash", "claude-3-5-sonnet-latest")
    pub model: String,

    /// Temperature for sampling
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Tools advertised to the model, in registration order
    #[serde(default)]
    pub tools: Vec<ToolSpec>,
}

const fn default_temperature() -> f32 { 1.0 }
const fn default_max_output_tokens() -> u32 { 5000 }

impl Default for ConversationOptions {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.into(),
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
            tools: Vec::new(),
        }
    }
}

/// Canonical result of one backend round
#[derive(Clone, Debug, PartialEq)]
pub enum Response {
    /// No further tool interaction required
    FinalAnswer { text: String },

    /// The model wants these calls executed before it continues.
    /// `text` holds any prose the model emitted alongside the calls.
    ToolCallsRequested {
        calls: Vec<ToolCall>,
        text: Option<String>,
    },
}

impl Response {
    /// Normalize a provider reply: no calls means a final answer
    pub fn from_parts(text: Option<String>, calls: Vec<ToolCall>) -> Self {
        if calls.is_empty() {
            Response::FinalAnswer {
                text: text.unwrap_or_default(),
            }
        } else {
            Response::ToolCallsRequested { calls, text }
        }
    }
}

/// Strategy trait for LLM providers
///
/// Implement this trait to add support for new LLM backends.
/// The orchestrator works exclusively through this interface.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name used in logs and errors
    fn name(&self) -> &str;

    /// Check if the provider is reachable and configured correctly
    async fn health_check(&self) -> Result<bool>;

    /// Run one round: send the conversation, get an answer or tool calls
    async fn complete(
        &self,
        messages: &[Message],
        options: &ConversationOptions,
    ) -> Result<Response>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_defaults() {
        let opts = ConversationOptions::default();
        assert!((opts.temperature - 1.0).abs() < f32::EPSILON);
        assert_eq!(opts.max_output_tokens, 5000);
        assert_eq!(opts.model, "gpt-4.1-mini");
        assert!(opts.tools.is_empty());
    }

    #[test]
    fn test_empty_calls_is_final_answer() {
        let response = Response::from_parts(Some("done".into()), Vec::new());
        assert_eq!(response, Response::FinalAnswer { text: "done".into() });

        let response = Response::from_parts(None, Vec::new());
        assert_eq!(response, Response::FinalAnswer { text: String::new() });
    }
}
