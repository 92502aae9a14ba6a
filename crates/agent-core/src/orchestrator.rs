//! Conversation Orchestrator
//!
//! Drives one turn as a small state machine:
//!
//! ```text
//! AwaitingModel ──FinalAnswer──────────────▶ Done
//!     │  ▲
//!     │  └──────── results appended ──────┐
//!     ▼                                    │
//! ToolCallsRequested ──▶ ExecutingTools ───┘
//!
//! backend error / loop bound / cancellation ──▶ Failed
//! ```
//!
//! Every call issued in a round gets exactly one `tool` message, in issue
//! order, before the next backend round starts.

use std::future::Future;
use std::sync::Arc;

use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::error::{AgentError, Result};
use crate::message::Message;
use crate::provider::{ConversationOptions, LlmProvider, Response};
use crate::tool::{Tool, ToolCall, ToolRegistry, ToolResult};

/// Orchestrator configuration
#[derive(Clone, Debug)]
pub struct OrchestratorConfig {
    /// Maximum tool-invocation rounds per turn
    pub max_tool_rounds: usize,

    /// How many calls from one round may run at once
    pub tool_concurrency: usize,

    /// Generation options; `tools` is filled from the registry
    pub options: ConversationOptions,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_tool_rounds: 8,
            tool_concurrency: 4,
            options: ConversationOptions::default(),
        }
    }
}

/// Orchestrator state within a turn
#[derive(Debug)]
pub enum TurnState {
    AwaitingModel,
    ExecutingTools {
        calls: Vec<ToolCall>,
        text: Option<String>,
    },
    Done(String),
    Failed(AgentError),
}

/// Result of a completed turn
#[derive(Clone, Debug)]
pub struct TurnOutcome {
    /// Final answer text
    pub text: String,

    /// Full conversation including tool traffic and the final answer
    pub messages: Vec<Message>,

    /// Backend rounds used
    pub rounds: usize,
}

/// Drives the model/tool loop for a turn
pub struct Orchestrator {
    provider: Arc<dyn LlmProvider>,
    tools: Arc<ToolRegistry>,
    config: OrchestratorConfig,
}

impl Orchestrator {
    /// Create a new orchestrator. The registry's tools are advertised on
    /// every round of every turn.
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        tools: Arc<ToolRegistry>,
        mut config: OrchestratorConfig,
    ) -> Self {
        config.options.tools = tools.specs();
        Self {
            provider,
            tools,
            config,
        }
    }

    /// Create with default configuration
    pub fn with_defaults(provider: Arc<dyn LlmProvider>, tools: Arc<ToolRegistry>) -> Self {
        Self::new(provider, tools, OrchestratorConfig::default())
    }

    /// Run a turn over `messages` (already carrying the system prompt).
    ///
    /// Cancelling `cancel` aborts any outstanding backend or tool call and
    /// fails the turn with [`AgentError::Cancelled`].
    pub async fn run(&self, messages: &[Message], cancel: &CancellationToken) -> Result<TurnOutcome> {
        let span = tracing::info_span!(
            "turn",
            provider = self.provider.name(),
            model = %self.config.options.model,
        );
        self.drive(messages.to_vec(), cancel).instrument(span).await
    }

    async fn drive(&self, mut conversation: Vec<Message>, cancel: &CancellationToken) -> Result<TurnOutcome> {
        let mut state = TurnState::AwaitingModel;
        let mut rounds = 0;
        let mut tool_rounds = 0;

        loop {
            state = match state {
                TurnState::AwaitingModel => {
                    rounds += 1;
                    tracing::debug!(round = rounds, messages = conversation.len(), "Calling backend");

                    let reply = guarded(cancel, self.provider.complete(&conversation, &self.config.options)).await;
                    match reply {
                        Ok(Response::FinalAnswer { text }) => TurnState::Done(text),
                        Ok(Response::ToolCallsRequested { calls, text }) if calls.is_empty() => {
                            TurnState::Done(text.unwrap_or_default())
                        }
                        Ok(Response::ToolCallsRequested { .. }) if tool_rounds >= self.config.max_tool_rounds => {
                            TurnState::Failed(AgentError::ToolLoopExceeded(self.config.max_tool_rounds))
                        }
                        Ok(Response::ToolCallsRequested { calls, text }) => {
                            TurnState::ExecutingTools { calls, text }
                        }
                        Err(e) => TurnState::Failed(e),
                    }
                }

                TurnState::ExecutingTools { calls, text } => {
                    tool_rounds += 1;
                    tracing::debug!(round = tool_rounds, calls = calls.len(), "Executing tool calls");

                    let executed = guarded(cancel, async { Ok(self.execute_tools(&calls).await) }).await;
                    match executed {
                        Ok(results) => {
                            conversation.push(Message::assistant_tool_calls(text, calls));
                            conversation.extend(results.into_iter().map(ToolResult::into_message));
                            TurnState::AwaitingModel
                        }
                        Err(e) => TurnState::Failed(e),
                    }
                }

                TurnState::Done(text) => {
                    tracing::info!(rounds, "Turn completed");
                    conversation.push(Message::assistant(text.as_str()));
                    return Ok(TurnOutcome {
                        text,
                        messages: conversation,
                        rounds,
                    });
                }

                TurnState::Failed(e) => {
                    tracing::warn!(rounds, error = %e, "Turn failed");
                    return Err(e);
                }
            };
        }
    }

    /// Run a round's calls concurrently; results come back in issue order
    async fn execute_tools(&self, calls: &[ToolCall]) -> Vec<ToolResult> {
        let pending: Vec<_> = calls.iter().map(|call| self.tools.invoke(call)).collect();
        futures::stream::iter(pending)
            .buffered(self.config.tool_concurrency.max(1))
            .collect()
            .await
    }

    /// Get the tool registry
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Get the provider
    pub fn provider(&self) -> &Arc<dyn LlmProvider> {
        &self.provider
    }

    /// Get configuration
    pub const fn config(&self) -> &OrchestratorConfig {
        &self.config
    }
}

async fn guarded<T>(cancel: &CancellationToken, work: impl Future<Output = Result<T>>) -> Result<T> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(AgentError::Cancelled),
        result = work => result,
    }
}

/// Builder for Orchestrator configuration
pub struct OrchestratorBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    tools: ToolRegistry,
    config: OrchestratorConfig,
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl OrchestratorBuilder {
    pub fn new() -> Self {
        Self {
            provider: None,
            tools: ToolRegistry::new(),
            config: OrchestratorConfig::default(),
        }
    }

    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Register a tool; duplicate names fail here, at startup
    pub fn tool<T: Tool>(mut self, tool: T) -> Result<Self> {
        self.tools.register_tool(tool)?;
        Ok(self)
    }

    pub fn tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.options.model = model.into();
        self
    }

    pub const fn temperature(mut self, temp: f32) -> Self {
        self.config.options.temperature = temp;
        self
    }

    pub const fn max_output_tokens(mut self, max: u32) -> Self {
        self.config.options.max_output_tokens = max;
        self
    }

    pub const fn max_tool_rounds(mut self, max: usize) -> Self {
        self.config.max_tool_rounds = max;
        self
    }

    pub const fn tool_concurrency(mut self, n: usize) -> Self {
        self.config.tool_concurrency = n;
        self
    }

    pub fn build(self) -> Result<Orchestrator> {
        let provider = self.provider
            .ok_or_else(|| AgentError::Config("Provider is required".into()))?;

        Ok(Orchestrator::new(provider, Arc::new(self.tools), self.config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{BackendError, BackendErrorKind};
    use crate::message::{Content, Role};
    use crate::tool::{ToolDefinition, ToolPayload};
    use async_trait::async_trait;
    use schemars::JsonSchema;
    use serde::Deserialize;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Replays canned responses and records what it was sent
    #[derive(Default)]
    struct ScriptedProvider {
        script: Mutex<VecDeque<Result<Response>>>,
        seen: Mutex<Vec<Vec<Message>>>,
    }

    impl ScriptedProvider {
        fn new(script: Vec<Result<Response>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                seen: Mutex::default(),
            })
        }

        fn rounds(&self) -> usize {
            self.seen.lock().unwrap().len()
        }

        fn sent(&self, round: usize) -> Vec<Message> {
            self.seen.lock().unwrap()[round].clone()
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        async fn complete(&self, messages: &[Message], _: &ConversationOptions) -> Result<Response> {
            self.seen.lock().unwrap().push(messages.to_vec());
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(AgentError::Other("script exhausted".into())))
        }
    }

    /// Requests a tool on every round, never converging
    struct LoopingProvider {
        calls: Mutex<usize>,
    }

    #[async_trait]
    impl LlmProvider for LoopingProvider {
        fn name(&self) -> &str {
            "looping"
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        async fn complete(&self, _: &[Message], _: &ConversationOptions) -> Result<Response> {
            let mut n = self.calls.lock().unwrap();
            *n += 1;
            Ok(Response::ToolCallsRequested {
                calls: vec![ToolCall::new(format!("c{n}"), "noop", json!({}))],
                text: None,
            })
        }
    }

    /// Never answers
    struct HangingProvider;

    #[async_trait]
    impl LlmProvider for HangingProvider {
        fn name(&self) -> &str {
            "hanging"
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        async fn complete(&self, _: &[Message], _: &ConversationOptions) -> Result<Response> {
            futures::future::pending().await
        }
    }

    #[derive(Deserialize, JsonSchema)]
    struct NoArgs {}

    #[derive(Deserialize, JsonSchema)]
    struct SleepArgs {
        millis: u64,
    }

    fn registry() -> Arc<ToolRegistry> {
        let mut tools = ToolRegistry::new();
        tools
            .register(ToolDefinition::from_fn(
                "list_invoices",
                "Retrieves a list of all invoices in the system",
                |_: NoArgs| async {
                    Ok(json!([{"id": 1, "description": "Acme", "amount": 100, "status": "Unpaid", "due": "2025-04-01T00:00:00Z"}]))
                },
            ))
            .unwrap();
        tools
            .register(ToolDefinition::from_fn("noop", "Does nothing", |_: NoArgs| async { Ok(()) }))
            .unwrap();
        tools
            .register(ToolDefinition::from_fn("sleep", "Sleeps, then reports", |args: SleepArgs| async move {
                tokio::time::sleep(Duration::from_millis(args.millis)).await;
                Ok(args.millis)
            }))
            .unwrap();
        Arc::new(tools)
    }

    fn tool_messages(messages: &[Message]) -> Vec<&Message> {
        messages.iter().filter(|m| m.role == Role::Tool).collect()
    }

    #[tokio::test]
    async fn test_no_tool_calls_single_round() {
        let provider = ScriptedProvider::new(vec![Ok(Response::FinalAnswer { text: "Hello!".into() })]);
        let orchestrator = Orchestrator::with_defaults(provider.clone(), registry());

        let outcome = orchestrator
            .run(&[Message::user("Hi")], &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.text, "Hello!");
        assert_eq!(outcome.rounds, 1);
        assert_eq!(provider.rounds(), 1);
        assert_eq!(outcome.messages.last().unwrap().role, Role::Assistant);
    }

    #[tokio::test]
    async fn test_empty_tool_request_is_final_answer() {
        let provider = ScriptedProvider::new(vec![Ok(Response::ToolCallsRequested {
            calls: Vec::new(),
            text: Some("hi".into()),
        })]);
        let orchestrator = Orchestrator::with_defaults(provider.clone(), registry());

        let outcome = orchestrator
            .run(&[Message::user("Hi")], &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.text, "hi");
        assert_eq!(outcome.rounds, 1);
        assert_eq!(provider.rounds(), 1);
        assert!(tool_messages(&outcome.messages).is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_turn_runs_on_spawned_task() {
        let provider = ScriptedProvider::new(vec![
            Ok(Response::ToolCallsRequested {
                calls: vec![
                    ToolCall::new("a", "sleep", json!({"millis": 5})),
                    ToolCall::new("b", "noop", json!({})),
                ],
                text: None,
            }),
            Ok(Response::FinalAnswer { text: "spawned".into() }),
        ]);
        let orchestrator = Arc::new(Orchestrator::with_defaults(provider, registry()));

        let handle = tokio::spawn({
            let orchestrator = orchestrator.clone();
            async move {
                orchestrator
                    .run(&[Message::user("go")], &CancellationToken::new())
                    .await
            }
        });

        let outcome = handle.await.unwrap().unwrap();
        assert_eq!(outcome.text, "spawned");
        assert_eq!(outcome.rounds, 2);
        assert_eq!(tool_messages(&outcome.messages).len(), 2);
    }

    #[tokio::test]
    async fn test_list_invoices_scenario() {
        let provider = ScriptedProvider::new(vec![
            Ok(Response::ToolCallsRequested {
                calls: vec![ToolCall::new("c1", "list_invoices", json!({}))],
                text: None,
            }),
            Ok(Response::FinalAnswer { text: "One unpaid invoice: Acme, $100".into() }),
        ]);
        let orchestrator = Orchestrator::with_defaults(provider.clone(), registry());

        let input = vec![Message::user("List invoices")];
        let outcome = orchestrator.run(&input, &CancellationToken::new()).await.unwrap();

        assert_eq!(outcome.text, "One unpaid invoice: Acme, $100");
        assert_eq!(outcome.rounds, 2);

        let second_round = provider.sent(1);
        let tools = tool_messages(&second_round);
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].tool_call_id.as_deref(), Some("c1"));
        match &tools[0].content {
            Content::Json(payload) => assert_eq!(payload["success"][0]["description"], "Acme"),
            Content::Text(_) => panic!("expected structured payload"),
        }

        // assistant message with the calls precedes the results
        assert_eq!(second_round[1].role, Role::Assistant);
        assert_eq!(second_round[1].tool_calls[0].id, "c1");
        assert_eq!(input.len(), 1);
    }

    #[tokio::test]
    async fn test_each_call_gets_one_result_in_issue_order() {
        let provider = ScriptedProvider::new(vec![
            Ok(Response::ToolCallsRequested {
                calls: vec![
                    ToolCall::new("slow", "sleep", json!({"millis": 40})),
                    ToolCall::new("fast", "sleep", json!({"millis": 0})),
                    ToolCall::new("ghost-1", "missing", json!({})),
                    ToolCall::new("ghost-2", "missing", json!({})),
                ],
                text: Some("Checking".into()),
            }),
            Ok(Response::FinalAnswer { text: "done".into() }),
        ]);
        let orchestrator = Orchestrator::with_defaults(provider.clone(), registry());

        let outcome = orchestrator
            .run(&[Message::user("go")], &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome.text, "done");

        let sent = provider.sent(1);
        let tools = tool_messages(&sent);
        let ids: Vec<_> = tools.iter().map(|m| m.tool_call_id.as_deref().unwrap()).collect();
        assert_eq!(ids, vec!["slow", "fast", "ghost-1", "ghost-2"]);

        assert_eq!(tools[0].content, Content::Json(json!({"success": 40})));
        for ghost in &tools[2..] {
            assert_eq!(
                ghost.content,
                Content::Json(serde_json::to_value(ToolPayload::Error("Unknown tool: missing".into())).unwrap())
            );
        }
    }

    #[tokio::test]
    async fn test_tool_loop_bound() {
        let provider = Arc::new(LoopingProvider { calls: Mutex::new(0) });
        let orchestrator = OrchestratorBuilder::new()
            .provider(provider.clone())
            .tools(ToolRegistry::clone(&registry()))
            .max_tool_rounds(3)
            .build()
            .unwrap();

        let err = orchestrator
            .run(&[Message::user("loop")], &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, AgentError::ToolLoopExceeded(3)));
        assert_eq!(*provider.calls.lock().unwrap(), 4);
    }

    #[tokio::test]
    async fn test_backend_error_fails_turn() {
        let provider = ScriptedProvider::new(vec![Err(BackendError::new(
            "scripted",
            BackendErrorKind::RateLimited,
            "429",
        )
        .into())]);
        let orchestrator = Orchestrator::with_defaults(provider.clone(), registry());

        let err = orchestrator
            .run(&[Message::user("Hi")], &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, AgentError::Backend(ref e) if e.kind == BackendErrorKind::RateLimited));
        assert_eq!(provider.rounds(), 1);
    }

    #[tokio::test]
    async fn test_cancellation_while_awaiting_model() {
        let orchestrator = Orchestrator::with_defaults(Arc::new(HangingProvider), registry());
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });

        let err = orchestrator.run(&[Message::user("Hi")], &cancel).await.unwrap_err();
        assert!(matches!(err, AgentError::Cancelled));
    }

    #[tokio::test]
    async fn test_cancellation_during_tools() {
        let provider = ScriptedProvider::new(vec![Ok(Response::ToolCallsRequested {
            calls: vec![ToolCall::new("c1", "sleep", json!({"millis": 10_000}))],
            text: None,
        })]);
        let orchestrator = Orchestrator::with_defaults(provider.clone(), registry());
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });

        let err = orchestrator.run(&[Message::user("Hi")], &cancel).await.unwrap_err();
        assert!(matches!(err, AgentError::Cancelled));
        assert_eq!(provider.rounds(), 1);
    }

    #[tokio::test]
    async fn test_options_advertise_registry_tools() {
        let provider = ScriptedProvider::new(Vec::new());
        let orchestrator = Orchestrator::with_defaults(provider, registry());

        let names: Vec<_> = orchestrator.config().options.tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["list_invoices", "noop", "sleep"]);
    }

    #[test]
    fn test_builder_requires_provider() {
        assert!(matches!(OrchestratorBuilder::new().build(), Err(AgentError::Config(_))));
    }
}
