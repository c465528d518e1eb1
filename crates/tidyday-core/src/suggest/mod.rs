//! Suggestion data model
//!
//! A `Suggestion` is ephemeral: it lives in memory until the user accepts it
//! and the caller persists it through an [`EntityStore`](crate::protocol::EntityStore).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Title used when a provider omits one
pub const DEFAULT_TITLE: &str = "Untitled suggestion";

/// Reason used when a provider omits one
pub const DEFAULT_REASON: &str = "Suggested based on your recent activity.";

/// Kind of suggestion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    Task,
    Goal,
    Habit,
    Journal,
}

impl SuggestionKind {
    /// Parse a provider-supplied kind, case-insensitively.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "task" | "todo" => Some(SuggestionKind::Task),
            "goal" => Some(SuggestionKind::Goal),
            "habit" => Some(SuggestionKind::Habit),
            "journal" | "journal_entry" | "journalentry" | "entry" => {
                Some(SuggestionKind::Journal)
            }
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestionKind::Task => "task",
            SuggestionKind::Goal => "goal",
            SuggestionKind::Habit => "habit",
            SuggestionKind::Journal => "journal",
        }
    }
}

/// Priority level
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Priority::Low),
            "medium" | "normal" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            "urgent" | "critical" => Some(Priority::Urgent),
            _ => None,
        }
    }
}

/// Whether the user has acted on a suggestion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    #[default]
    Unset,
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HabitFrequency {
    Daily,
    Weekly,
    Monthly,
}

impl HabitFrequency {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "daily" | "day" | "every day" => Some(HabitFrequency::Daily),
            "weekly" | "week" | "every week" => Some(HabitFrequency::Weekly),
            "monthly" | "month" | "every month" => Some(HabitFrequency::Monthly),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_goal_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_date: Option<String>,
    /// Always within 0..=100
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<HabitFrequency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_habit_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// Per-kind fields. The variant is the suggestion's kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum KindDetails {
    Task(TaskDetails),
    Goal(GoalDetails),
    Habit(HabitDetails),
    Journal(JournalDetails),
}

impl KindDetails {
    pub fn empty(kind: SuggestionKind) -> Self {
        match kind {
            SuggestionKind::Task => KindDetails::Task(TaskDetails::default()),
            SuggestionKind::Goal => KindDetails::Goal(GoalDetails::default()),
            SuggestionKind::Habit => KindDetails::Habit(HabitDetails::default()),
            SuggestionKind::Journal => KindDetails::Journal(JournalDetails::default()),
        }
    }

    pub fn kind(&self) -> SuggestionKind {
        match self {
            KindDetails::Task(_) => SuggestionKind::Task,
            KindDetails::Goal(_) => SuggestionKind::Goal,
            KindDetails::Habit(_) => SuggestionKind::Habit,
            KindDetails::Journal(_) => SuggestionKind::Journal,
        }
    }
}

/// A proposed task, goal, habit or journal entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    pub id: String,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub reason: String,
    pub decision: Decision,
    #[serde(flatten)]
    pub details: KindDetails,
}

impl Suggestion {
    pub fn new(kind: SuggestionKind, title: impl Into<String>) -> Self {
        let title = title.into();
        let title = if title.trim().is_empty() {
            DEFAULT_TITLE.to_string()
        } else {
            title.trim().to_string()
        };
        Self {
            id: new_suggestion_id(),
            title,
            description: String::new(),
            priority: Priority::Medium,
            reason: DEFAULT_REASON.to_string(),
            decision: Decision::Unset,
            details: KindDetails::empty(kind),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    pub fn with_details(mut self, details: KindDetails) -> Self {
        self.details = details;
        self
    }

    pub fn kind(&self) -> SuggestionKind {
        self.details.kind()
    }

    pub fn is_decided(&self) -> bool {
        self.decision != Decision::Unset
    }
}

/// Fresh opaque identifier for a suggestion
pub fn new_suggestion_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parse_is_case_insensitive() {
        assert_eq!(SuggestionKind::parse("TASK"), Some(SuggestionKind::Task));
        assert_eq!(SuggestionKind::parse(" Habit "), Some(SuggestionKind::Habit));
        assert_eq!(
            SuggestionKind::parse("Journal_Entry"),
            Some(SuggestionKind::Journal)
        );
        assert_eq!(SuggestionKind::parse("project"), None);
    }

    #[test]
    fn priority_defaults_to_medium() {
        assert_eq!(Priority::default(), Priority::Medium);
        assert_eq!(Priority::parse("URGENT"), Some(Priority::Urgent));
        assert_eq!(Priority::parse("whenever"), None);
        assert!(Priority::Urgent > Priority::High);
    }

    #[test]
    fn new_suggestion_never_has_blank_title() {
        let s = Suggestion::new(SuggestionKind::Goal, "   ");
        assert_eq!(s.title, DEFAULT_TITLE);
        assert_eq!(s.kind(), SuggestionKind::Goal);
        assert_eq!(s.decision, Decision::Unset);
        assert!(!s.id.is_empty());
    }

    #[test]
    fn serializes_kind_alongside_per_kind_fields() {
        let s = Suggestion::new(SuggestionKind::Journal, "Reflect")
            .with_id("j-1")
            .with_details(KindDetails::Journal(JournalDetails {
                mood: Some("calm".to_string()),
                tags: vec!["work".to_string()],
                ..Default::default()
            }));
        let value = serde_json::to_value(&s).unwrap();
        assert_eq!(value["kind"], "journal");
        assert_eq!(value["id"], "j-1");
        assert_eq!(value["priority"], "medium");
        assert_eq!(value["decision"], "unset");
        assert_eq!(value["mood"], "calm");
        assert_eq!(value["tags"][0], "work");
        assert!(value.get("entryDate").is_none());
    }
}
