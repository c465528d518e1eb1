//! Core domain model and response-handling pipeline for Tidyday.
//!
//! Everything in this crate is pure: no network, no disk. The engine crate
//! feeds provider text through [`sanitize`], [`extract`] and [`normalize`],
//! and falls back to [`fallback`] when any of them comes up empty.

pub mod context;
pub mod extract;
pub mod fallback;
pub mod normalize;
pub mod protocol;
pub mod sanitize;
pub mod suggest;

pub use context::{
    GoalSnapshot, HabitSnapshot, JournalSnapshot, RequestError, SuggestionRequest, TaskSnapshot,
    UserContext,
};
pub use fallback::{fallback_suggestion, FallbackCause};
pub use normalize::normalize_suggestions;
pub use protocol::{persist_accepted, DecisionError, EntityStore, NewEntity};
pub use suggest::{
    Decision, GoalDetails, HabitDetails, HabitFrequency, JournalDetails, KindDetails, Priority,
    Suggestion, SuggestionKind, TaskDetails,
};
