//! # agent-runtime
//!
//! Runtime providers for the invoice agent.
//!
//! ## Providers
//!
//! - **OpenAI** (default): Chat Completions with function calling
//! - **Gemini**: `generateContent` with function declarations
//! - **Claude**: Anthropic Messages API with `tool_use` blocks
//! - **Ollama** (`ollama` feature, on by default): local inference via `ollama-rs`
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_runtime::{Backend, BackendConfig, ProviderKind};
//!
//! let kind: ProviderKind = "openai".parse()?;
//! let config = BackendConfig::from_env(kind, None, Duration::from_secs(60))?;
//! let backend = Arc::new(Backend::from_config(&config)?);
//! let orchestrator = OrchestratorBuilder::new()
//!     .provider(backend)
//!     .model(config.model)
//!     .build()?;
//! ```

mod http;

pub mod claude;
pub mod config;
pub mod gemini;
pub mod ollama;
pub mod openai;

pub use claude::ClaudeProvider;
pub use config::{Backend, BackendConfig, ProviderKind};
pub use gemini::GeminiProvider;
#[cfg(feature = "ollama")]
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

// Re-export core types for convenience
pub use agent_core::{AgentError, ConversationOptions, LlmProvider, Message, Response, Result, Role};
