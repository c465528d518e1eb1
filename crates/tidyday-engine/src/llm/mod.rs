pub mod assistant;
pub mod chain;
pub mod client;
pub mod models;
pub mod prompts;

pub use assistant::{AssistantService, Insight, ItemPlan, MoodAnalysis, PipelineStage};
pub use chain::{AttemptOutcome, AttemptRecord, ChainSettings, ChainSuccess, ProviderChain};
pub use client::{ChatMessage, ChatRequest, CompletionTransport, HttpReply, ReqwestTransport};
