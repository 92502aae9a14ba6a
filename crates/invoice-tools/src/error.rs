//! Error Types for Invoice Tools

use agent_core::AgentError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, InvoiceError>;

#[derive(Error, Debug)]
pub enum InvoiceError {
    #[error("Invoice API timed out: {0}")]
    Timeout(String),

    #[error("Invoice API unreachable: {0}")]
    Network(String),

    #[error("Invoice API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invoice API sent an unreadable response: {0}")]
    Malformed(String),

    #[error("Invoice not found: {0}")]
    NotFound(String),

    #[error("Invalid invoice request: {0}")]
    InvalidRequest(String),

    #[error("Documentation unavailable: {0}")]
    Documentation(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<reqwest::Error> for InvoiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_decode() {
            Self::Malformed(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl InvoiceError {
    /// Attribute this failure to the tool that hit it
    pub fn into_tool_error(self, tool: &str) -> AgentError {
        AgentError::tool_failure(tool, self)
    }
}
