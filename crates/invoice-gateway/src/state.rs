//! Application State

use std::sync::Arc;
use std::time::Duration;

use agent_core::{Orchestrator, SystemPrompt};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Model/tool loop, shared read-only across requests
    pub orchestrator: Arc<Orchestrator>,

    /// Date-stamped system prompt prepended to every conversation
    pub prompt: Arc<SystemPrompt>,

    /// Deadline for a whole turn
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(orchestrator: Orchestrator, prompt: SystemPrompt, request_timeout: Duration) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            prompt: Arc::new(prompt),
            request_timeout,
        }
    }

    pub fn model(&self) -> &str {
        &self.orchestrator.config().options.model
    }
}
