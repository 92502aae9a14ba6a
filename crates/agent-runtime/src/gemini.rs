//! Gemini LLM Provider
//!
//! Implementation of `LlmProvider` for the Gemini `generateContent` API.
//! Gemini does not issue call ids, so one is generated per function call;
//! results are matched back by tool name inside `functionResponse` parts.

use std::time::Duration;

use agent_core::{
    error::{BackendError, BackendErrorKind, Result},
    message::{Content, Message, Role},
    provider::{ConversationOptions, LlmProvider, Response},
    tool::{ToolCall, ToolSpec},
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::http;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const PROVIDER: &str = "gemini";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<WireContent>,
    contents: Vec<WireContent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTools>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
struct WireContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_call: Option<FunctionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_response: Option<FunctionResponse>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
struct FunctionCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    name: String,
    #[serde(default)]
    args: Value,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
struct FunctionResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    name: String,
    response: Value,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireTools {
    function_declarations: Vec<FunctionDeclaration>,
}

#[derive(Serialize)]
struct FunctionDeclaration {
    name: String,
    description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    parameters: Option<Value>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: WireContent,
}

/// Google Gemini provider
pub struct GeminiProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GeminiProvider {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http::build_client(PROVIDER, timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    fn convert_messages(messages: &[Message]) -> (Option<WireContent>, Vec<WireContent>) {
        let mut system = Vec::new();
        let mut contents: Vec<WireContent> = Vec::new();

        for m in messages {
            let (role, parts) = match m.role {
                Role::System => {
                    system.push(Part { text: Some(m.content.to_text()), ..Part::default() });
                    continue;
                }
                Role::User => ("user", vec![Part { text: Some(m.content.to_text()), ..Part::default() }]),
                Role::Assistant => {
                    let text = m.content.to_text();
                    let mut parts = Vec::with_capacity(m.tool_calls.len() + 1);
                    if !text.is_empty() {
                        parts.push(Part { text: Some(text), ..Part::default() });
                    }
                    parts.extend(m.tool_calls.iter().map(|c| Part {
                        function_call: Some(FunctionCall {
                            id: None,
                            name: c.name.clone(),
                            args: c.arguments.clone(),
                        }),
                        ..Part::default()
                    }));
                    ("model", parts)
                }
                Role::Tool => (
                    "user",
                    vec![Part {
                        function_response: Some(FunctionResponse {
                            id: None,
                            name: m.name.clone().unwrap_or_default(),
                            response: response_object(&m.content),
                        }),
                        ..Part::default()
                    }],
                ),
            };

            match contents.last_mut() {
                Some(last) if last.role.as_deref() == Some(role) => last.parts.extend(parts),
                _ => contents.push(WireContent { role: Some(role.into()), parts }),
            }
        }

        let system = (!system.is_empty()).then(|| WireContent { role: None, parts: system });
        (system, contents)
    }

    fn convert_tools(tools: &[ToolSpec]) -> Vec<WireTools> {
        if tools.is_empty() {
            return Vec::new();
        }
        let function_declarations = tools
            .iter()
            .map(|t| FunctionDeclaration {
                name: t.name.clone(),
                description: t.description.clone(),
                // Gemini rejects object schemas with no properties
                parameters: has_properties(&t.parameters).then(|| t.parameters.clone()),
            })
            .collect();
        vec![WireTools { function_declarations }]
    }

    fn convert_response(response: GenerateResponse) -> Result<Response> {
        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::new(PROVIDER, BackendErrorKind::Malformed, "response has no candidates"))?;

        let mut text = String::new();
        let mut calls = Vec::new();
        for part in candidate.content.parts {
            if let Some(t) = part.text {
                text.push_str(&t);
            }
            if let Some(call) = part.function_call {
                let id = call.id.unwrap_or_else(http::generated_call_id);
                calls.push(ToolCall::new(id, call.name, call.args));
            }
        }

        Ok(Response::from_parts((!text.is_empty()).then_some(text), calls))
    }
}

fn has_properties(schema: &Value) -> bool {
    schema
        .get("properties")
        .and_then(Value::as_object)
        .is_some_and(|p| !p.is_empty())
}

/// `functionResponse.response` must be a JSON object
fn response_object(content: &Content) -> Value {
    match content {
        Content::Json(value @ Value::Object(_)) => value.clone(),
        Content::Json(value) => json!({ "content": value }),
        Content::Text(text) => json!({ "content": text }),
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn health_check(&self) -> Result<bool> {
        let request = self
            .client
            .get(format!("{}/models", self.base_url))
            .header("x-goog-api-key", &self.api_key);
        Ok(http::probe(PROVIDER, request).await)
    }

    async fn complete(&self, messages: &[Message], options: &ConversationOptions) -> Result<Response> {
        let (system_instruction, contents) = Self::convert_messages(messages);
        let body = GenerateRequest {
            system_instruction,
            contents,
            tools: Self::convert_tools(&options.tools),
            generation_config: GenerationConfig {
                temperature: options.temperature,
                max_output_tokens: options.max_output_tokens,
            },
        };

        let request = self
            .client
            .post(format!("{}/models/{}:generateContent", self.base_url, options.model))
            .header("x-goog-api-key", &self.api_key)
            .json(&body);

        let response: GenerateResponse = http::send_json(PROVIDER, request).await?;
        Self::convert_response(response)
    }
}
