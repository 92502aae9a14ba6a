//! Tool System
//!
//! Typed tool framework for agent capabilities. Every tool declares its
//! parameter type; the JSON Schema advertised to the model is derived from
//! that type, and raw model arguments are deserialized into it before the
//! handler runs. Dispatch is an explicit name → handler mapping built at
//! startup.

use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;
use schemars::JsonSchema;
use schemars::r#gen::SchemaSettings;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AgentError, Result};
use crate::message::{Content, Message};

/// Tool call request from the LLM
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Correlation id issued by the backend
    pub id: String,

    /// Target tool
    pub name: String,

    /// Raw argument payload, untyped at this layer
    #[serde(default)]
    pub arguments: Value,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// Outcome carried back to the model
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolPayload {
    Success(Value),
    Error(String),
}

/// Result from tool execution
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Matches the originating `ToolCall::id`
    pub id: String,

    /// Tool that was called
    pub name: String,

    pub payload: ToolPayload,
}

impl ToolResult {
    pub fn success(call: &ToolCall, value: Value) -> Self {
        Self {
            id: call.id.clone(),
            name: call.name.clone(),
            payload: ToolPayload::Success(value),
        }
    }

    pub fn failure(call: &ToolCall, error: impl Into<String>) -> Self {
        Self {
            id: call.id.clone(),
            name: call.name.clone(),
            payload: ToolPayload::Error(error.into()),
        }
    }

    pub const fn is_success(&self) -> bool {
        matches!(self.payload, ToolPayload::Success(_))
    }

    /// Convert into a `tool` role message correlated with the call
    pub fn into_message(self) -> Message {
        let content = serde_json::to_value(&self.payload)
            .map_or_else(|e| Content::Text(format!("{{\"error\":\"{e}\"}}")), Content::Json);
        Message::tool(self.id, self.name, content)
    }
}

/// The part of a tool definition advertised to the backend
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Unique tool identifier
    pub name: String,

    /// Human-readable description (shown to LLM)
    pub description: String,

    /// JSON Schema of the accepted arguments
    pub parameters: Value,
}

/// Typed tool trait - implement to add new capabilities
#[async_trait]
pub trait Tool: Send + Sync + 'static {
    /// Parameter shape; raw arguments must deserialize into it
    type Args: DeserializeOwned + JsonSchema + Send + 'static;

    /// Success value returned to the model
    type Output: Serialize + Send + 'static;

    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Execute the tool with validated arguments
    async fn call(&self, args: Self::Args) -> Result<Self::Output>;
}

type Handler = dyn Fn(Value) -> BoxFuture<'static, Result<Value>> + Send + Sync;

/// A registered tool: advertised spec plus its type-erased handler
#[derive(Clone)]
pub struct ToolDefinition {
    spec: ToolSpec,
    handler: Arc<Handler>,
}

impl std::fmt::Debug for ToolDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolDefinition")
            .field("spec", &self.spec)
            .finish_non_exhaustive()
    }
}

impl ToolDefinition {
    /// Build a definition from a typed handler closure
    pub fn from_fn<A, O, F, Fut>(
        name: impl Into<String>,
        description: impl Into<String>,
        handler: F,
    ) -> Self
    where
        A: DeserializeOwned + JsonSchema + Send + 'static,
        O: Serialize + Send + 'static,
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O>> + Send + 'static,
    {
        let name = name.into();
        let tool = name.clone();

        let handler: Arc<Handler> = Arc::new(move |raw: Value| -> BoxFuture<'static, Result<Value>> {
            match decode_arguments::<A>(&tool, raw) {
                Ok(args) => {
                    let pending = handler(args);
                    let tool = tool.clone();
                    async move {
                        let output = pending.await?;
                        serde_json::to_value(output).map_err(|e| AgentError::tool_failure(tool, e))
                    }
                    .boxed()
                }
                Err(e) => futures::future::ready(Err(e)).boxed(),
            }
        });

        Self {
            spec: ToolSpec {
                name,
                description: description.into(),
                parameters: parameters_schema::<A>(),
            },
            handler,
        }
    }

    /// Build a definition from a struct implementing [`Tool`]
    pub fn from_tool<T: Tool>(tool: T) -> Self {
        let tool = Arc::new(tool);
        let (name, description) = (tool.name(), tool.description());
        Self::from_fn(name, description, move |args: T::Args| {
            let tool = Arc::clone(&tool);
            async move { tool.call(args).await }
        })
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub const fn spec(&self) -> &ToolSpec {
        &self.spec
    }
}

/// Derive the advertised JSON Schema for an argument type.
///
/// Nested types are inlined and optional fields are marked `nullable` rather
/// than using type arrays, which not every provider accepts.
pub fn parameters_schema<A: JsonSchema>() -> Value {
    let generator = SchemaSettings::draft07()
        .with(|s| {
            s.option_nullable = true;
            s.option_add_null_type = false;
            s.inline_subschemas = true;
        })
        .into_generator();

    let mut schema = serde_json::to_value(generator.into_root_schema_for::<A>())
        .unwrap_or_else(|_| serde_json::json!({"type": "object"}));

    if let Value::Object(map) = &mut schema {
        map.remove("$schema");
        map.remove("title");
        map.remove("definitions");
        map.entry("properties")
            .or_insert_with(|| Value::Object(serde_json::Map::new()));
    }
    schema
}

fn decode_arguments<A: DeserializeOwned>(tool: &str, raw: Value) -> Result<A> {
    let invalid = |reason: String| AgentError::InvalidArguments {
        tool: tool.to_string(),
        reason,
    };

    let value = match raw {
        Value::Null => Value::Object(serde_json::Map::new()),
        // Some providers hand back the argument object as a JSON string
        Value::String(text) if text.trim().is_empty() => Value::Object(serde_json::Map::new()),
        Value::String(text) => serde_json::from_str(&text).map_err(|e| invalid(e.to_string()))?,
        other => other,
    };

    serde_json::from_value(value).map_err(|e| invalid(e.to_string()))
}

fn panic_reason(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".into())
}

/// Registry for available tools.
///
/// Built once at startup and shared read-only afterwards.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: Vec<ToolDefinition>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition; names must be unique
    pub fn register(&mut self, definition: ToolDefinition) -> Result<()> {
        if self.index.contains_key(definition.name()) {
            return Err(AgentError::DuplicateTool(definition.name().to_string()));
        }
        self.index.insert(definition.name().to_string(), self.tools.len());
        self.tools.push(definition);
        Ok(())
    }

    /// Register a struct tool
    pub fn register_tool<T: Tool>(&mut self, tool: T) -> Result<()> {
        self.register(ToolDefinition::from_tool(tool))
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    pub fn resolve(&self, name: &str) -> Result<&ToolDefinition> {
        self.get(name)
            .ok_or_else(|| AgentError::UnknownTool(name.to_string()))
    }

    /// Resolve, validate and execute, propagating every failure
    pub async fn try_invoke(&self, name: &str, arguments: Value) -> Result<Value> {
        let definition = self.resolve(name)?;
        (definition.handler)(arguments).await
    }

    /// Execute a model-issued call. Never fails: unknown tools, invalid
    /// arguments, handler errors and handler panics all become an error
    /// payload correlated with the call.
    pub async fn invoke(&self, call: &ToolCall) -> ToolResult {
        tracing::debug!(tool = %call.name, id = %call.id, "Executing tool");

        let outcome = AssertUnwindSafe(self.try_invoke(&call.name, call.arguments.clone()))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                Err(AgentError::tool_failure(
                    &call.name,
                    format!("handler panicked: {}", panic_reason(panic.as_ref())),
                ))
            });

        match outcome {
            Ok(value) => ToolResult::success(call, value),
            Err(e) => {
                tracing::warn!(tool = %call.name, id = %call.id, error = %e, "Tool call failed");
                ToolResult::failure(call, e.to_string())
            }
        }
    }

    /// Advertised tool list, in registration order
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools.iter().map(|t| t.spec.clone()).collect()
    }

    /// Get tool names
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(ToolDefinition::name).collect()
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
