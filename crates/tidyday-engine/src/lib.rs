//! LLM orchestration for Tidyday: provider failover and the suggestion pipeline.

pub mod error;
pub mod llm;

#[cfg(test)]
pub(crate) mod testing;

pub use error::LlmError;
pub use llm::{
    AssistantService, AttemptOutcome, AttemptRecord, ChainSettings, ChainSuccess, ChatMessage,
    CompletionTransport, Insight, ItemPlan, MoodAnalysis, PipelineStage, ProviderChain,
    ReqwestTransport,
};
