//! OpenAI LLM Provider
//!
//! Implementation of `LlmProvider` for the Chat Completions API with native
//! function calling. Works against any OpenAI-compatible base URL.

use std::time::Duration;

use agent_core::{
    error::{BackendError, BackendErrorKind, Result},
    message::{Message, Role},
    provider::{ConversationOptions, LlmProvider, Response},
    tool::{ToolCall, ToolSpec},
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::http;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

const PROVIDER: &str = "openai";

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
struct WireMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type", default = "function_type")]
    call_type: String,
    function: WireFunctionCall,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
struct WireFunctionCall {
    name: String,
    /// JSON-encoded argument object
    #[serde(default)]
    arguments: String,
}

fn function_type() -> String {
    "function".into()
}

#[derive(Serialize)]
struct WireTool<'a> {
    #[serde(rename = "type")]
    tool_type: &'static str,
    function: WireFunction<'a>,
}

#[derive(Serialize)]
struct WireFunction<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a Value,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: WireMessage,
}

/// OpenAI-compatible LLM provider
pub struct OpenAiProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OpenAiProvider {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http::build_client(PROVIDER, timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    /// Convert canonical messages to the chat completions format
    fn convert_messages(messages: &[Message]) -> Vec<WireMessage> {
        messages
            .iter()
            .map(|m| {
                let tool_calls = (!m.tool_calls.is_empty()).then(|| {
                    m.tool_calls
                        .iter()
                        .map(|c| WireToolCall {
                            id: c.id.clone(),
                            call_type: function_type(),
                            function: WireFunctionCall {
                                name: c.name.clone(),
                                arguments: c.arguments.to_string(),
                            },
                        })
                        .collect()
                });
                let content = m.content.to_text();
                WireMessage {
                    role: m.role.to_string(),
                    // An assistant turn that only issues calls carries no content
                    content: if tool_calls.is_some() && content.is_empty() { None } else { Some(content) },
                    tool_calls,
                    tool_call_id: m.tool_call_id.clone(),
                }
            })
            .collect()
    }

    fn convert_tools(tools: &[ToolSpec]) -> Vec<WireTool<'_>> {
        tools
            .iter()
            .map(|t| WireTool {
                tool_type: "function",
                function: WireFunction {
                    name: &t.name,
                    description: &t.description,
                    parameters: &t.parameters,
                },
            })
            .collect()
    }

    /// Convert the first choice into a canonical response
    fn convert_response(response: ChatResponse) -> Result<Response> {
        let message = response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| BackendError::new(PROVIDER, BackendErrorKind::Malformed, "response has no choices"))?;

        if message.role != Role::Assistant.to_string() {
            tracing::debug!(role = %message.role, "Unexpected role on completion message");
        }

        let calls = message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|c| {
                let arguments = serde_json::from_str(&c.function.arguments)
                    .unwrap_or(Value::String(c.function.arguments));
                ToolCall::new(c.id, c.function.name, arguments)
            })
            .collect();

        Ok(Response::from_parts(message.content.filter(|t| !t.is_empty()), calls))
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn health_check(&self) -> Result<bool> {
        let request = self
            .client
            .get(format!("{}/models", self.base_url))
            .bearer_auth(&self.api_key);
        Ok(http::probe(PROVIDER, request).await)
    }

    async fn complete(&self, messages: &[Message], options: &ConversationOptions) -> Result<Response> {
        tracing::trace!(messages = messages.len(), tools = options.tools.len(), "OpenAI request");

        let body = ChatRequest {
            model: &options.model,
            messages: Self::convert_messages(messages),
            tools: Self::convert_tools(&options.tools),
            temperature: options.temperature,
            max_tokens: options.max_output_tokens,
        };

        let request = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body);

        let response: ChatResponse = http::send_json(PROVIDER, request).await?;
        Self::convert_response(response)
    }
}
