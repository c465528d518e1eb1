//! Request and user-context types handed to the pipeline by the app.
//!
//! The pipeline never fetches or mutates this data; it only renders it into
//! prompts.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSnapshot {
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalSnapshot {
    pub title: String,
    #[serde(default)]
    pub progress: Option<u8>,
    #[serde(default)]
    pub target_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitSnapshot {
    pub title: String,
    #[serde(default)]
    pub frequency: Option<String>,
    #[serde(default)]
    pub streak: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalSnapshot {
    #[serde(default)]
    pub title: Option<String>,
    pub content: String,
    #[serde(default)]
    pub entry_date: Option<String>,
    #[serde(default)]
    pub mood: Option<String>,
}

/// Recent items of each kind, most recent first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserContext {
    #[serde(default)]
    pub tasks: Vec<TaskSnapshot>,
    #[serde(default)]
    pub goals: Vec<GoalSnapshot>,
    #[serde(default)]
    pub habits: Vec<HabitSnapshot>,
    #[serde(default)]
    pub journal_entries: Vec<JournalSnapshot>,
}

const JOURNAL_EXCERPT_CHARS: usize = 160;

impl UserContext {
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
            && self.goals.is_empty()
            && self.habits.is_empty()
            && self.journal_entries.is_empty()
    }

    /// Compact bullet rendering for prompts, at most `limit` items per category.
    pub fn render_for_prompt(&self, limit: usize) -> String {
        if self.is_empty() {
            return "The user has no existing items yet.".to_string();
        }

        let mut out = String::new();

        if !self.tasks.is_empty() {
            out.push_str("TASKS:\n");
            for task in self.tasks.iter().take(limit) {
                let status = if task.completed { "done" } else { "open" };
                out.push_str(&format!("- {} [{}]", task.title, status));
                if let Some(due) = task.due_date.as_deref() {
                    out.push_str(&format!(" due {}", due));
                }
                if let Some(priority) = task.priority.as_deref() {
                    out.push_str(&format!(" ({})", priority));
                }
                out.push('\n');
            }
        }

        if !self.goals.is_empty() {
            out.push_str("GOALS:\n");
            for goal in self.goals.iter().take(limit) {
                out.push_str(&format!("- {}", goal.title));
                if let Some(progress) = goal.progress {
                    out.push_str(&format!(" {}%", progress.min(100)));
                }
                if let Some(target) = goal.target_date.as_deref() {
                    out.push_str(&format!(" by {}", target));
                }
                out.push('\n');
            }
        }

        if !self.habits.is_empty() {
            out.push_str("HABITS:\n");
            for habit in self.habits.iter().take(limit) {
                out.push_str(&format!(
                    "- {} ({}, streak {})\n",
                    habit.title,
                    habit.frequency.as_deref().unwrap_or("daily"),
                    habit.streak
                ));
            }
        }

        if !self.journal_entries.is_empty() {
            out.push_str("JOURNAL:\n");
            for entry in self.journal_entries.iter().take(limit) {
                let date = entry.entry_date.as_deref().unwrap_or("undated");
                let mood = entry
                    .mood
                    .as_deref()
                    .map(|m| format!(" mood: {}", m))
                    .unwrap_or_default();
                out.push_str(&format!(
                    "- {}{}: {}\n",
                    date,
                    mood,
                    excerpt(&entry.content, JOURNAL_EXCERPT_CHARS)
                ));
            }
        }

        out.trim_end().to_string()
    }
}

fn excerpt(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        flat
    } else {
        let head: String = flat.chars().take(max_chars).collect();
        format!("{}…", head.trim_end())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("request text is empty")]
    EmptyRequest,
}

/// Inbound request for suggestion-producing operations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionRequest {
    pub user_request_text: String,
    #[serde(default)]
    pub user_context: UserContext,
}

impl SuggestionRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            user_request_text: text.into(),
            user_context: UserContext::default(),
        }
    }

    pub fn with_context(mut self, context: UserContext) -> Self {
        self.user_context = context;
        self
    }

    pub fn validate(&self) -> Result<(), RequestError> {
        if self.user_request_text.trim().is_empty() {
            return Err(RequestError::EmptyRequest);
        }
        Ok(())
    }
}
