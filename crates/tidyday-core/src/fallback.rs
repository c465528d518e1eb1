//! Deterministic placeholder suggestion used when the pipeline comes up empty.

use crate::suggest::{Priority, Suggestion, SuggestionKind};

/// Title used when the request itself is blank
pub const FALLBACK_TITLE: &str = "Review your plans";

const MAX_TITLE_CHARS: usize = 80;

/// Why the pipeline had to fall back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackCause {
    /// Every configured provider failed
    ProvidersExhausted,
    /// A provider answered but nothing usable could be parsed
    UnparsableResponse,
    /// Parsing worked but produced no suggestions
    EmptyResult,
}

impl FallbackCause {
    pub fn reason(&self) -> &'static str {
        match self {
            FallbackCause::ProvidersExhausted => {
                "Fallback suggestion: the assistant is unavailable right now, so this was created directly from your request."
            }
            FallbackCause::UnparsableResponse => {
                "Fallback suggestion: the assistant's reply could not be understood, so this was created directly from your request."
            }
            FallbackCause::EmptyResult => {
                "Fallback suggestion: the assistant had no specific ideas, so this was created directly from your request."
            }
        }
    }
}

/// Build the single fallback task for `request`.
///
/// Title and reason depend only on the inputs; the id is always fresh.
pub fn fallback_suggestion(request: &str, cause: FallbackCause) -> Suggestion {
    Suggestion::new(SuggestionKind::Task, title_from_request(request))
        .with_description(request.trim())
        .with_priority(Priority::Medium)
        .with_reason(cause.reason())
}

fn title_from_request(request: &str) -> String {
    let collapsed = request.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut chars = collapsed.chars();
    let Some(first) = chars.next() else {
        return FALLBACK_TITLE.to_string();
    };
    let capitalized: String = first.to_uppercase().chain(chars).collect();

    if capitalized.chars().count() <= MAX_TITLE_CHARS {
        return capitalized;
    }
    let head: String = capitalized.chars().take(MAX_TITLE_CHARS - 1).collect();
    format!("{}…", head.trim_end())
}
