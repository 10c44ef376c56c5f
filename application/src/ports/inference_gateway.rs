//! Inference gateway port
//!
//! Defines the interface for calling an external LLM inference capability.
//! Every spend-incurring call of a mission goes through this trait.

use async_trait::async_trait;
use std::time::Duration;
use swarm_domain::{ConversationTurn, TokenUsage};
use thiserror::Error;

/// Errors that can occur during inference
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InferenceError {
    #[error("Inference timed out")]
    Timeout,

    #[error("Rate limited")]
    RateLimited { retry_after: Option<Duration> },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl InferenceError {
    /// Whether a retry may succeed (timeouts, rate limits, transport, 5xx).
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            InferenceError::Timeout
                | InferenceError::RateLimited { .. }
                | InferenceError::Transport(_)
                | InferenceError::Server { .. }
        )
    }

    /// Map an HTTP status to an error.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 | 403 => InferenceError::Authentication(message),
            408 => InferenceError::Timeout,
            429 => InferenceError::RateLimited { retry_after: None },
            500..=599 => InferenceError::Server { status, message },
            _ => InferenceError::InvalidRequest(format!("HTTP {}: {}", status, message)),
        }
    }
}

/// Reply of one inference call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferenceReply {
    pub content: String,
    pub token_usage: TokenUsage,
}

impl InferenceReply {
    pub fn new(content: impl Into<String>, token_usage: TokenUsage) -> Self {
        Self {
            content: content.into(),
            token_usage,
        }
    }
}

/// Gateway for LLM inference
///
/// This port defines how the application layer reaches an inference
/// provider. Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait InferenceGateway: Send + Sync {
    /// Run one inference: `role_instructions` is the system prompt,
    /// `conversation` the remaining turns.
    async fn invoke(
        &self,
        role_instructions: &str,
        conversation: &[ConversationTurn],
    ) -> Result<InferenceReply, InferenceError>;

    /// Adapter name for logs.
    fn name(&self) -> &str {
        "gateway"
    }
}
