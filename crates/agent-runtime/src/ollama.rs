//! Ollama LLM Provider
//!
//! Implementation of `LlmProvider` for local Ollama inference, built on
//! `ollama-rs` chat requests with native tool calling.

pub const DEFAULT_HOST: &str = "http://localhost";
pub const DEFAULT_PORT: u16 = 11434;

pub(crate) fn base_url(host: &str, port: u16) -> String {
    format!("{}:{port}", host.trim_end_matches('/'))
}

#[cfg(feature = "ollama")]
pub use provider::OllamaProvider;

#[cfg(feature = "ollama")]
mod provider {
    use std::time::Duration;

    use agent_core::{
        error::{AgentError, BackendError, BackendErrorKind, Result},
        message::Message,
        provider::{ConversationOptions, LlmProvider, Response},
        tool::{ToolCall, ToolSpec},
    };
    use async_trait::async_trait;
    use ollama_rs::{
        Ollama,
        generation::{
            chat::{ChatMessage, ChatMessageResponse, request::ChatMessageRequest},
            tools::ToolInfo,
        },
        models::ModelOptions,
    };
    use serde_json::{Value, json};

    use crate::http;

    const PROVIDER: &str = "ollama";

    /// Ollama LLM provider
    pub struct OllamaProvider {
        client: Ollama,
        base_url: String,
    }

    impl OllamaProvider {
        /// Create a new Ollama provider with custom host/port
        pub fn new(host: impl Into<String>, port: u16, timeout: Duration) -> Result<Self> {
            Self::with_base_url(super::base_url(&host.into(), port), timeout)
        }

        /// Create against a full `scheme://host:port` URL
        pub fn with_base_url(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
            let base_url = base_url.into().trim_end_matches('/').to_string();
            let url = reqwest::Url::parse(&base_url)
                .map_err(|e| AgentError::Config(format!("invalid Ollama URL {base_url}: {e}")))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(AgentError::Config(format!("Ollama URL must be http(s): {base_url}")));
            }
            let port = url.port_or_known_default().unwrap_or(super::DEFAULT_PORT);

            let http_client = http::build_client(PROVIDER, timeout)?;
            Ok(Self {
                client: Ollama::new_with_client(url, port, http_client),
                base_url,
            })
        }

        pub fn base_url(&self) -> &str {
            &self.base_url
        }

        /// Convert agent messages to Ollama format
        fn convert_messages(messages: &[Message]) -> Result<Vec<ChatMessage>> {
            let wire: Vec<Value> = messages
                .iter()
                .map(|m| {
                    let mut wire = json!({
                        "role": m.role.to_string(),
                        "content": m.content.to_text(),
                    });
                    if !m.tool_calls.is_empty() {
                        wire["tool_calls"] = m
                            .tool_calls
                            .iter()
                            .map(|c| json!({"function": {"name": c.name, "arguments": c.arguments}}))
                            .collect();
                    }
                    wire
                })
                .collect();

            serde_json::from_value(Value::Array(wire)).map_err(|e| malformed(format!("chat messages: {e}")))
        }

        fn convert_tools(tools: &[ToolSpec]) -> Result<Vec<ToolInfo>> {
            tools
                .iter()
                .map(|t| {
                    let info = json!({
                        "type": "function",
                        "function": {
                            "name": t.name,
                            "description": t.description,
                            "parameters": t.parameters,
                        },
                    });
                    serde_json::from_value(info).map_err(|e| malformed(format!("tool '{}': {e}", t.name)))
                })
                .collect()
        }

        fn build_options(options: &ConversationOptions) -> ModelOptions {
            ModelOptions::default()
                .temperature(options.temperature)
                .num_predict(i32::try_from(options.max_output_tokens).unwrap_or(i32::MAX))
        }

        fn convert_response(response: ChatMessageResponse) -> Response {
            let message = response.message;
            let calls = message
                .tool_calls
                .into_iter()
                .map(|c| ToolCall::new(http::generated_call_id(), c.function.name, c.function.arguments))
                .collect();

            Response::from_parts((!message.content.is_empty()).then_some(message.content), calls)
        }
    }

    fn malformed(message: String) -> AgentError {
        BackendError::new(PROVIDER, BackendErrorKind::Malformed, message).into()
    }

    #[async_trait]
    impl LlmProvider for OllamaProvider {
        fn name(&self) -> &str {
            PROVIDER
        }

        async fn health_check(&self) -> Result<bool> {
            match self.client.list_local_models().await {
                Ok(_) => Ok(true),
                Err(e) => {
                    tracing::warn!("Ollama health check failed: {}", e);
                    Ok(false)
                }
            }
        }

        async fn complete(&self, messages: &[Message], options: &ConversationOptions) -> Result<Response> {
            let request = ChatMessageRequest::new(options.model.clone(), Self::convert_messages(messages)?)
                .tools(Self::convert_tools(&options.tools)?)
                .options(Self::build_options(options));

            let response = self.client.send_chat_messages(request).await.map_err(|e| {
                tracing::warn!(provider = PROVIDER, error = %e, "Chat request failed");
                BackendError::new(PROVIDER, BackendErrorKind::Unavailable, e.to_string())
            })?;

            Ok(Self::convert_response(response))
        }
    }

}
