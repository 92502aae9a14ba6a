//! # agent-core
//!
//! Tool-calling orchestration core with a provider-agnostic LLM abstraction
//! and a typed tool registry.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      Orchestrator                            │
//! │  ┌──────────────┐  ┌─────────────┐  ┌─────────────────────┐  │
//! │  │ Turn state   │  │    Tools    │  │   LlmProvider       │  │
//! │  │   machine    │──│   Registry  │──│   (Strategy)        │  │
//! │  └──────────────┘  └─────────────┘  └─────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//!          ▲
//!   SystemPrompt::apply (date-stamped system message)
//! ```
//!
//! The `LlmProvider` trait enables swapping between OpenAI, Gemini, Claude,
//! Ollama or any other provider without changing orchestration logic.

pub mod error;
pub mod message;
pub mod orchestrator;
pub mod prompt;
pub mod provider;
pub mod tool;

pub use error::{AgentError, BackendError, BackendErrorKind, Result};
pub use message::{Content, Message, Role};
pub use orchestrator::{Orchestrator, OrchestratorBuilder, OrchestratorConfig, TurnOutcome};
pub use prompt::{Clock, FixedClock, SystemClock, SystemPrompt};
pub use provider::{ConversationOptions, LlmProvider, Response};
pub use tool::{Tool, ToolCall, ToolDefinition, ToolPayload, ToolRegistry, ToolResult, ToolSpec};
