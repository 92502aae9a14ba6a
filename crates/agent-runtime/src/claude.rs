//! Claude LLM Provider
//!
//! Implementation of `LlmProvider` for the Anthropic Messages API.
//! System messages are lifted into the top-level `system` field, tool calls
//! travel as `tool_use` blocks and results as `tool_result` blocks inside a
//! user turn.

use std::time::Duration;

use agent_core::{
    error::Result,
    message::{Message, Role},
    provider::{ConversationOptions, LlmProvider, Response},
    tool::{ToolCall, ToolSpec},
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::http;

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

const PROVIDER: &str = "claude";
const API_VERSION: &str = "2023-06-01";

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool<'a>>,
}

#[derive(Serialize, Debug, PartialEq)]
struct WireMessage {
    role: &'static str,
    content: Vec<Block>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Block {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        is_error: bool,
    },
    #[serde(other)]
    Unsupported,
}

#[derive(Serialize)]
struct WireTool<'a> {
    name: &'a str,
    description: &'a str,
    input_schema: &'a Value,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<Block>,
}

/// Anthropic Claude provider
pub struct ClaudeProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl ClaudeProvider {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http::build_client(PROVIDER, timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    /// Split out the system prompt and convert the rest, merging consecutive
    /// turns of the same wire role so tool results share one user turn
    fn convert_messages(messages: &[Message]) -> (Option<String>, Vec<WireMessage>) {
        let mut system = Vec::new();
        let mut converted: Vec<WireMessage> = Vec::new();

        for m in messages {
            let (role, blocks) = match m.role {
                Role::System => {
                    system.push(m.content.to_text());
                    continue;
                }
                Role::User => ("user", vec![Block::Text { text: m.content.to_text() }]),
                Role::Assistant => {
                    let text = m.content.to_text();
                    let mut blocks = Vec::with_capacity(m.tool_calls.len() + 1);
                    if !text.is_empty() {
                        blocks.push(Block::Text { text });
                    }
                    blocks.extend(m.tool_calls.iter().map(|c| Block::ToolUse {
                        id: c.id.clone(),
                        name: c.name.clone(),
                        input: c.arguments.clone(),
                    }));
                    ("assistant", blocks)
                }
                Role::Tool => (
                    "user",
                    vec![Block::ToolResult {
                        tool_use_id: m.tool_call_id.clone().unwrap_or_default(),
                        content: m.content.to_text(),
                        is_error: is_error_payload(m),
                    }],
                ),
            };

            // The Messages API rejects turns with no content blocks
            if blocks.is_empty() {
                continue;
            }

            match converted.last_mut() {
                Some(last) if last.role == role => last.content.extend(blocks),
                _ => converted.push(WireMessage { role, content: blocks }),
            }
        }

        let system = (!system.is_empty()).then(|| system.join("\n\n"));
        (system, converted)
    }

    fn convert_tools(tools: &[ToolSpec]) -> Vec<WireTool<'_>> {
        tools
            .iter()
            .map(|t| WireTool {
                name: &t.name,
                description: &t.description,
                input_schema: &t.parameters,
            })
            .collect()
    }

    fn convert_response(response: MessagesResponse) -> Response {
        let mut text = String::new();
        let mut calls = Vec::new();

        for block in response.content {
            match block {
                Block::Text { text: t } => text.push_str(&t),
                Block::ToolUse { id, name, input } => calls.push(ToolCall::new(id, name, input)),
                Block::ToolResult { .. } | Block::Unsupported => {}
            }
        }

        Response::from_parts((!text.is_empty()).then_some(text), calls)
    }
}

fn is_error_payload(message: &Message) -> bool {
    match &message.content {
        agent_core::Content::Json(Value::Object(map)) => map.contains_key("error"),
        _ => false,
    }
}

#[async_trait]
impl LlmProvider for ClaudeProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn health_check(&self) -> Result<bool> {
        let request = self
            .client
            .get(format!("{}/v1/models", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION);
        Ok(http::probe(PROVIDER, request).await)
    }

    async fn complete(&self, messages: &[Message], options: &ConversationOptions) -> Result<Response> {
        let (system, messages) = Self::convert_messages(messages);
        let body = MessagesRequest {
            model: &options.model,
            max_tokens: options.max_output_tokens,
            temperature: options.temperature,
            system,
            messages,
            tools: Self::convert_tools(&options.tools),
        };

        let request = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body);

        let response: MessagesResponse = http::send_json(PROVIDER, request).await?;
        Ok(Self::convert_response(response))
    }
}
