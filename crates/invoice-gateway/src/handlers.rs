//! HTTP Handlers

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use agent_core::{AgentError, Message};

use crate::state::AppState;

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub provider: String,
    pub model: String,
    pub backend_connected: bool,
    pub tools: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Conversation so far, oldest first, without a system prompt
    pub messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub message: String,
    pub model: String,
    pub rounds: usize,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
    /// Whether sending the same request again may succeed
    pub retryable: bool,
}

/// Error response with its HTTP status
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl ApiError {
    fn new(status: StatusCode, code: &'static str, error: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorResponse {
                error: error.into(),
                code,
                retryable: false,
            },
        }
    }
}

impl From<AgentError> for ApiError {
    fn from(err: AgentError) -> Self {
        let (status, code) = match &err {
            AgentError::Backend(_) => (StatusCode::BAD_GATEWAY, "BACKEND_ERROR"),
            AgentError::Cancelled => (StatusCode::GATEWAY_TIMEOUT, "TIMEOUT"),
            AgentError::ToolLoopExceeded(_) => (StatusCode::INTERNAL_SERVER_ERROR, "TOOL_LOOP_EXCEEDED"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "AGENT_ERROR"),
        };
        let mut api_error = Self::new(status, code, err.user_message());
        api_error.body.retryable = err.is_retryable();
        api_error
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(rejection.status(), "INVALID_REQUEST", rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

// ============================================================================
// Handlers
// ============================================================================

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/chat", post(chat_handler))
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let provider = state.orchestrator.provider();
    let backend_connected = provider.health_check().await.unwrap_or(false);

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        provider: provider.name().to_string(),
        model: state.model().to_string(),
        backend_connected,
        tools: state
            .orchestrator
            .tools()
            .names()
            .into_iter()
            .map(String::from)
            .collect(),
    })
}

/// Main chat endpoint: one turn over the posted conversation
pub async fn chat_handler(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(payload) = payload?;
    if payload.messages.is_empty() {
        return Err(ApiError::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "INVALID_REQUEST",
            "messages must not be empty",
        ));
    }

    let messages = state.prompt.apply(&payload.messages);

    // Dropping the handler (client went away) cancels the turn too
    let cancel = CancellationToken::new();
    let _on_drop = cancel.clone().drop_guard();

    let turn = state.orchestrator.run(&messages, &cancel);
    tokio::pin!(turn);

    let result = tokio::select! {
        result = &mut turn => result,
        () = tokio::time::sleep(state.request_timeout) => {
            tracing::warn!(timeout = ?state.request_timeout, "Turn deadline passed, cancelling");
            cancel.cancel();
            turn.await
        }
    };

    let outcome = result.map_err(|e| {
        tracing::error!(error = %e, "Turn failed");
        ApiError::from(e)
    })?;

    Ok(Json(ChatResponse {
        message: outcome.text,
        model: state.model().to_string(),
        rounds: outcome.rounds,
    }))
}
