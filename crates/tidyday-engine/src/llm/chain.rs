//! Sequential provider failover.
//!
//! Models are tried strictly in configured order, each exactly once per
//! call. Any failure (quota, rate limit, network, bad body, timeout) moves
//! on to the next model; only exhausting the whole roster is an error.

use super::client::{
    parse_completion, sanitize_api_response, ChatMessage, ChatRequest, CompletionTransport,
    HttpReply, ReqwestTransport,
};
use super::models::{
    default_models, DEFAULT_ATTEMPT_TIMEOUT_SECS, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE,
};
use crate::error::LlmError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct ChainSettings {
    /// Ordered model identifiers, tried first to last
    pub models: Vec<String>,
    /// Upper bound for a single provider call
    pub attempt_timeout: Duration,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for ChainSettings {
    fn default() -> Self {
        Self {
            models: default_models(),
            attempt_timeout: Duration::from_secs(DEFAULT_ATTEMPT_TIMEOUT_SECS),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttemptOutcome {
    Success,
    RateLimited,
    PaymentRequired,
    Error,
}

impl AttemptOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptOutcome::Success => "success",
            AttemptOutcome::RateLimited => "rate_limited",
            AttemptOutcome::PaymentRequired => "payment_required",
            AttemptOutcome::Error => "error",
        }
    }
}

/// Diagnostics for one provider call. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptRecord {
    pub model_id: String,
    pub attempted_at: DateTime<Utc>,
    pub outcome: AttemptOutcome,
    #[serde(default)]
    pub error_detail: Option<String>,
    pub elapsed_ms: u64,
}

/// Text from the first model that answered, plus every attempt made
#[derive(Debug, Clone)]
pub struct ChainSuccess {
    pub text: String,
    pub model_id: String,
    pub attempts: Vec<AttemptRecord>,
}

/// Stateless failover client; build once and share.
#[derive(Clone)]
pub struct ProviderChain {
    settings: ChainSettings,
    transport: Arc<dyn CompletionTransport>,
}

impl ProviderChain {
    pub fn new(settings: ChainSettings, transport: Arc<dyn CompletionTransport>) -> Self {
        Self {
            settings,
            transport,
        }
    }

    /// Chain over HTTP against `endpoint`.
    pub fn over_http(
        settings: ChainSettings,
        endpoint: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self::new(settings, Arc::new(ReqwestTransport::new(endpoint, api_key)))
    }

    pub fn settings(&self) -> &ChainSettings {
        &self.settings
    }

    /// Try each configured model in order until one returns non-empty text.
    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<ChainSuccess, LlmError> {
        if self.settings.models.is_empty() {
            return Err(LlmError::NoModelsConfigured);
        }

        let timeout_ms = self.settings.attempt_timeout.as_millis() as u64;
        let mut attempts: Vec<AttemptRecord> = Vec::with_capacity(self.settings.models.len());

        for model in &self.settings.models {
            let request = ChatRequest {
                model: model.clone(),
                messages: messages.to_vec(),
                temperature: self.settings.temperature,
                max_tokens: self.settings.max_tokens,
                stream: false,
            };

            let attempted_at = Utc::now();
            let start = Instant::now();
            debug!(model = %model, "sending completion request");
            let result = timeout(self.settings.attempt_timeout, self.transport.send(&request)).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            let outcome = match result {
                Err(_) => Err((
                    AttemptOutcome::Error,
                    format!("timed out after {}ms", timeout_ms),
                )),
                Ok(Err(err)) => Err((AttemptOutcome::Error, err.to_string())),
                Ok(Ok(reply)) => classify_reply(reply),
            };

            match outcome {
                Ok(text) => {
                    info!(model = %model, elapsed_ms, "provider answered");
                    attempts.push(AttemptRecord {
                        model_id: model.clone(),
                        attempted_at,
                        outcome: AttemptOutcome::Success,
                        error_detail: None,
                        elapsed_ms,
                    });
                    return Ok(ChainSuccess {
                        text,
                        model_id: model.clone(),
                        attempts,
                    });
                }
                Err((kind, detail)) => {
                    warn!(
                        model = %model,
                        outcome = kind.as_str(),
                        elapsed_ms,
                        detail = %detail,
                        "provider attempt failed; trying next model"
                    );
                    attempts.push(AttemptRecord {
                        model_id: model.clone(),
                        attempted_at,
                        outcome: kind,
                        error_detail: Some(detail),
                        elapsed_ms,
                    });
                }
            }
        }

        let last_error = attempts.last().and_then(|a| a.error_detail.clone());
        warn!(
            attempts = attempts.len(),
            last_error = last_error.as_deref().unwrap_or("none"),
            "all providers exhausted"
        );
        Err(LlmError::AllProvidersExhausted {
            attempted: attempts.iter().map(|a| a.model_id.clone()).collect(),
            last_error,
            attempts,
        })
    }
}

fn classify_reply(reply: HttpReply) -> Result<String, (AttemptOutcome, String)> {
    match reply.status {
        200..=299 => parse_completion(&reply.body).map_err(|detail| (AttemptOutcome::Error, detail)),
        429 => Err((
            AttemptOutcome::RateLimited,
            format!("rate limited (429): {}", sanitize_api_response(&reply.body)),
        )),
        402 => Err((
            AttemptOutcome::PaymentRequired,
            format!("payment required (402): {}", sanitize_api_response(&reply.body)),
        )),
        status => Err((
            AttemptOutcome::Error,
            format!("HTTP {}: {}", status, sanitize_api_response(&reply.body)),
        )),
    }
}
