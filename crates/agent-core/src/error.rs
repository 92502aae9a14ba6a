//! Error Types

use thiserror::Error;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Agent error types
#[derive(Error, Debug)]
pub enum AgentError {
    /// Invalid startup configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Provider identifier not in the supported set
    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// LLM backend call failed
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Tool name registered twice
    #[error("Duplicate tool: {0}")]
    DuplicateTool(String),

    /// Tool not found in registry
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Arguments did not match the tool's declared parameters
    #[error("Invalid arguments for tool '{tool}': {reason}")]
    InvalidArguments { tool: String, reason: String },

    /// Failure inside a tool handler
    #[error("Tool '{tool}' failed: {reason}")]
    ToolHandler { tool: String, reason: String },

    /// Model kept requesting tools past the configured bound
    #[error("Tool loop exceeded {0} rounds")]
    ToolLoopExceeded(usize),

    /// Turn cancelled by the caller
    #[error("Turn cancelled")]
    Cancelled,

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other/unknown error
    #[error("{0}")]
    Other(String),
}

/// Classification of a backend failure
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendErrorKind {
    /// Credentials rejected (401/403)
    Auth,
    /// Provider throttled the request (429)
    RateLimited,
    /// Transport failure, timeout or 5xx
    Unavailable,
    /// Response body could not be understood
    Malformed,
    /// Request refused for any other reason (4xx)
    Rejected,
}

impl std::fmt::Display for BackendErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Auth => "authentication failed",
            Self::RateLimited => "rate limited",
            Self::Unavailable => "unavailable",
            Self::Malformed => "malformed response",
            Self::Rejected => "request rejected",
        };
        f.write_str(label)
    }
}

/// Error raised by an LLM provider, with the provider name that produced it
#[derive(Error, Debug, Clone)]
#[error("Backend error ({provider}, {kind}): {message}")]
pub struct BackendError {
    pub provider: String,
    pub kind: BackendErrorKind,
    pub message: String,
}

impl BackendError {
    pub fn new(provider: impl Into<String>, kind: BackendErrorKind, message: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            kind,
            message: message.into(),
        }
    }
}

impl AgentError {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Backend(e) => matches!(
                e.kind,
                BackendErrorKind::Unavailable | BackendErrorKind::RateLimited
            ),
            Self::Io(_) => true,
            _ => false,
        }
    }

    /// Build a handler failure for `tool`
    pub fn tool_failure(tool: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::ToolHandler {
            tool: tool.into(),
            reason: reason.to_string(),
        }
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            Self::Backend(e) => match e.kind {
                BackendErrorKind::Auth => "Authentication with the AI service failed.".into(),
                BackendErrorKind::RateLimited => "The AI service is rate limiting requests. Please wait a moment.".into(),
                BackendErrorKind::Unavailable => "The AI service is currently unavailable. Please try again.".into(),
                _ => format!("The AI service encountered an error: {}", e.message),
            },
            Self::UnknownTool(name) => format!("The tool '{name}' is not available."),
            Self::InvalidArguments { reason, .. } => format!("Invalid tool input: {reason}"),
            Self::ToolHandler { reason, .. } => format!("Tool error: {reason}"),
            Self::ToolLoopExceeded(_) => "The request took too many steps to process. Please try a simpler query.".into(),
            Self::Cancelled => "The request was cancelled before it completed.".into(),
            Self::Config(_) | Self::UnsupportedProvider(_) => "The agent is misconfigured.".into(),
            _ => "An unexpected error occurred.".into(),
        }
    }
}

impl From<anyhow::Error> for AgentError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
