//! Error types surfaced by the engine

use crate::llm::chain::AttemptRecord;
use thiserror::Error;

/// Failures that reach callers of non-suggestion operations.
///
/// Individual provider failures never show up here; the chain records them
/// as attempts and moves on.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("no models configured for the provider chain")]
    NoModelsConfigured,

    #[error(
        "all {} providers failed ({}); last error: {}",
        .attempted.len(),
        .attempted.join(", "),
        .last_error.as_deref().unwrap_or("none")
    )]
    AllProvidersExhausted {
        attempted: Vec<String>,
        last_error: Option<String>,
        attempts: Vec<AttemptRecord>,
    },

    #[error("could not parse provider response: {reason}")]
    UnparsableResponse { reason: String, preview: String },

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl LlmError {
    /// Message safe to show to the user; diagnostics stay in the logs.
    pub fn user_message(&self) -> &'static str {
        match self {
            LlmError::NoModelsConfigured => {
                "The assistant isn't configured yet. Add at least one model in settings."
            }
            LlmError::AllProvidersExhausted { .. } => {
                "The assistant is busy right now. Please try again in a few minutes."
            }
            LlmError::UnparsableResponse { .. } => {
                "The assistant's reply couldn't be read. Please try again."
            }
            LlmError::InvalidRequest(_) => "There isn't enough information to do that yet.",
        }
    }
}
