//! Suggestion, insight and mood operations over the provider chain.
//!
//! Suggestion-producing operations are total: any failure after the request
//! is accepted degrades to a single fallback suggestion. Insight and mood
//! operations surface [`LlmError`] instead.

use super::chain::{ChainSuccess, ProviderChain};
use super::client::truncate_str;
use super::prompts;
use crate::error::LlmError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tidyday_core::extract::{extract_json, extract_structured_block};
use tidyday_core::sanitize::{sanitize_response, split_fenced_block, strip_reasoning};
use tidyday_core::{
    fallback_suggestion, normalize_suggestions, FallbackCause, JournalSnapshot, Suggestion,
    SuggestionRequest, UserContext,
};
use tracing::{debug, info, warn};

const PREVIEW_CHARS: usize = 200;

/// Shown when the multi-item flow has nothing better to say
const DEFAULT_PLAN_MESSAGE: &str = "Here's what I put together for you.";
const FALLBACK_PLAN_MESSAGE: &str =
    "I couldn't put together a detailed plan right now, so I added your request as a task.";

/// Where a suggestion-producing request is. Stages only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Requesting,
    Sanitizing,
    Extracting,
    Normalizing,
    SynthesizingFallback,
    Done,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Requesting => "requesting",
            PipelineStage::Sanitizing => "sanitizing",
            PipelineStage::Extracting => "extracting",
            PipelineStage::Normalizing => "normalizing",
            PipelineStage::SynthesizingFallback => "synthesizing_fallback",
            PipelineStage::Done => "done",
        }
    }
}

fn enter(stage: PipelineStage) {
    debug!(stage = stage.as_str(), "pipeline stage");
}

/// Result of the multi-item creation flow
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemPlan {
    /// User-facing commentary
    pub message: String,
    pub suggestions: Vec<Suggestion>,
    pub model_id: Option<String>,
    pub used_fallback: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    pub text: String,
    pub model_id: String,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodAnalysis {
    pub mood: String,
    /// 1..=10 when the model supplied a usable score
    pub score: Option<u8>,
    pub summary: String,
    pub themes: Vec<String>,
    pub model_id: String,
}

/// Entry point for every LLM-backed feature.
#[derive(Clone)]
pub struct AssistantService {
    chain: ProviderChain,
}

impl AssistantService {
    pub fn new(chain: ProviderChain) -> Self {
        Self { chain }
    }

    pub fn chain(&self) -> &ProviderChain {
        &self.chain
    }

    /// Suggestions for the user's request. Always returns at least one item.
    pub async fn smart_suggestions(&self, request: &SuggestionRequest) -> Vec<Suggestion> {
        let request_text = request.user_request_text.trim();
        if let Err(err) = request.validate() {
            warn!(error = %err, "rejecting suggestion request");
            return synthesize_fallback(request_text, FallbackCause::EmptyResult);
        }

        enter(PipelineStage::Requesting);
        let completion = match self
            .chain
            .complete(&prompts::smart_suggestion_messages(request))
            .await
        {
            Ok(completion) => completion,
            Err(err) => {
                warn!(error = %err, "suggestion request failed");
                return synthesize_fallback(request_text, FallbackCause::ProvidersExhausted);
            }
        };

        match suggestions_from_text(&completion.text) {
            Ok(suggestions) => {
                info!(
                    model = %completion.model_id,
                    count = suggestions.len(),
                    "suggestions ready"
                );
                enter(PipelineStage::Done);
                suggestions
            }
            Err(cause) => synthesize_fallback(request_text, cause),
        }
    }

    /// Multi-item creation using the fenced-block reply convention.
    pub async fn create_items(&self, request: &SuggestionRequest) -> ItemPlan {
        let request_text = request.user_request_text.trim();
        if let Err(err) = request.validate() {
            warn!(error = %err, "rejecting item creation request");
            return fallback_plan(request_text, None, None, FallbackCause::EmptyResult);
        }

        enter(PipelineStage::Requesting);
        let completion = match self
            .chain
            .complete(&prompts::create_items_messages(request))
            .await
        {
            Ok(completion) => completion,
            Err(err) => {
                warn!(error = %err, "item creation request failed");
                return fallback_plan(request_text, None, None, FallbackCause::ProvidersExhausted);
            }
        };

        plan_from_completion(request_text, completion)
    }

    /// Narrative review of the user's week. Failures propagate.
    pub async fn weekly_insight(&self, context: &UserContext) -> Result<Insight, LlmError> {
        if context.is_empty() {
            return Err(LlmError::InvalidRequest(
                "no activity to review this week".to_string(),
            ));
        }

        let completion = self
            .chain
            .complete(&prompts::weekly_insight_messages(context))
            .await
            .inspect_err(|err| warn!(error = %err, "weekly insight failed"))?;

        let text = sanitize_response(&completion.text);
        if text.is_empty() {
            warn!(model = %completion.model_id, "weekly insight was empty after sanitizing");
            return Err(LlmError::UnparsableResponse {
                reason: "response contained only meta-commentary".to_string(),
                preview: preview(&completion.text),
            });
        }

        Ok(Insight {
            text,
            model_id: completion.model_id,
            generated_at: Utc::now(),
        })
    }

    /// Overall mood across journal entries. Failures propagate.
    pub async fn analyze_mood(
        &self,
        entries: &[JournalSnapshot],
    ) -> Result<MoodAnalysis, LlmError> {
        if entries.iter().all(|e| e.content.trim().is_empty()) {
            return Err(LlmError::InvalidRequest(
                "no journal entries to analyze".to_string(),
            ));
        }

        let completion = self
            .chain
            .complete(&prompts::mood_analysis_messages(entries))
            .await
            .inspect_err(|err| warn!(error = %err, "mood analysis failed"))?;

        parse_mood(&completion.text, completion.model_id)
            .inspect_err(|err| warn!(error = %err, "mood analysis response unusable"))
    }
}

fn preview(text: &str) -> String {
    truncate_str(text.trim(), PREVIEW_CHARS).to_string()
}

fn synthesize_fallback(request_text: &str, cause: FallbackCause) -> Vec<Suggestion> {
    enter(PipelineStage::SynthesizingFallback);
    warn!(cause = ?cause, "returning fallback suggestion");
    let suggestion = fallback_suggestion(request_text, cause);
    enter(PipelineStage::Done);
    vec![suggestion]
}

/// Sanitize, extract and normalize a raw completion.
pub(crate) fn suggestions_from_text(text: &str) -> Result<Vec<Suggestion>, FallbackCause> {
    enter(PipelineStage::Sanitizing);
    let cleaned = strip_reasoning(text);

    enter(PipelineStage::Extracting);
    let value = parse_value(&extract_json(&cleaned).json, text)?;

    enter(PipelineStage::Normalizing);
    non_empty(normalize_suggestions(&value))
}

fn parse_value(candidate: &str, original: &str) -> Result<Value, FallbackCause> {
    serde_json::from_str::<Value>(candidate).map_err(|err| {
        warn!(
            error = %err,
            preview = %preview(original),
            "provider response did not contain parsable JSON"
        );
        FallbackCause::UnparsableResponse
    })
}

fn non_empty(suggestions: Vec<Suggestion>) -> Result<Vec<Suggestion>, FallbackCause> {
    if suggestions.is_empty() {
        warn!("provider returned no suggestions");
        Err(FallbackCause::EmptyResult)
    } else {
        Ok(suggestions)
    }
}

fn plan_from_completion(request_text: &str, completion: ChainSuccess) -> ItemPlan {
    enter(PipelineStage::Sanitizing);
    let cleaned = strip_reasoning(&completion.text);
    let split = split_fenced_block(&cleaned);

    enter(PipelineStage::Extracting);
    let (extraction, conversation) = match split.block.as_deref() {
        Some(block) => (extract_structured_block(block), split.conversation),
        None => {
            let extraction = extract_json(&cleaned);
            let conversation = if extraction.is_validated() {
                String::new()
            } else {
                cleaned.clone()
            };
            (extraction, conversation)
        }
    };

    let outcome = parse_value(&extraction.json, &completion.text).and_then(|value| {
        enter(PipelineStage::Normalizing);
        non_empty(normalize_suggestions(&value))
    });

    match outcome {
        Ok(suggestions) => {
            info!(
                model = %completion.model_id,
                count = suggestions.len(),
                "item plan ready"
            );
            enter(PipelineStage::Done);
            ItemPlan {
                message: if conversation.is_empty() {
                    DEFAULT_PLAN_MESSAGE.to_string()
                } else {
                    conversation
                },
                suggestions,
                model_id: Some(completion.model_id),
                used_fallback: false,
            }
        }
        Err(cause) => fallback_plan(
            request_text,
            Some(conversation),
            Some(completion.model_id),
            cause,
        ),
    }
}

fn fallback_plan(
    request_text: &str,
    conversation: Option<String>,
    model_id: Option<String>,
    cause: FallbackCause,
) -> ItemPlan {
    let message = conversation
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_PLAN_MESSAGE.to_string());
    ItemPlan {
        message,
        suggestions: synthesize_fallback(request_text, cause),
        model_id,
        used_fallback: true,
    }
}

fn parse_mood(text: &str, model_id: String) -> Result<MoodAnalysis, LlmError> {
    let cleaned = strip_reasoning(text);
    let extraction = extract_json(&cleaned);
    let unparsable = |reason: &str| LlmError::UnparsableResponse {
        reason: reason.to_string(),
        preview: preview(text),
    };

    let value: Value = extraction
        .parse()
        .map_err(|err| unparsable(&format!("invalid JSON: {}", err)))?;
    let Value::Object(map) = value else {
        return Err(unparsable("expected a JSON object"));
    };

    let mood = map
        .get("mood")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .ok_or_else(|| unparsable("missing mood"))?
        .to_string();

    let score = map.get("score").and_then(|v| match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    });
    let score = score
        .filter(|s| s.is_finite())
        .map(|s| s.round().clamp(1.0, 10.0) as u8);

    let summary = map
        .get("summary")
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .unwrap_or_default();

    let themes = match map.get("themes") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect(),
        Some(Value::String(joined)) => joined
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    };

    Ok(MoodAnalysis {
        mood,
        score,
        summary,
        themes,
        model_id,
    })
}
