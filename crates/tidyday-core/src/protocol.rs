//! Accept/reject handling and the storage contract for accepted suggestions.
//!
//! Storage is an external collaborator; this module only defines what it
//! must be able to create and routes an accepted suggestion to it by kind.

use crate::suggest::{Decision, HabitFrequency, KindDetails, Priority, Suggestion};
use anyhow::Result;
use futures::future::BoxFuture;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecisionError {
    #[error("suggestion {id} was already {decision:?}")]
    AlreadyDecided { id: String, decision: Decision },
    #[error("suggestion {id} has not been accepted")]
    NotAccepted { id: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub due_date: Option<String>,
    pub related_goal_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGoal {
    pub title: String,
    pub description: String,
    pub target_date: Option<String>,
    pub progress: u8,
    pub goal_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewHabit {
    pub title: String,
    pub description: String,
    pub frequency: HabitFrequency,
    pub reminder_time: Option<String>,
    pub target_count: u32,
    pub related_habit_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewJournalEntry {
    pub title: String,
    pub content: String,
    pub entry_date: Option<String>,
    pub mood: Option<String>,
    pub tags: Vec<String>,
}

/// Create payload for the storage layer, keyed by kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum NewEntity {
    Task(NewTask),
    Goal(NewGoal),
    Habit(NewHabit),
    JournalEntry(NewJournalEntry),
}

/// The "create entity" capability the pipeline's consumers persist through.
pub trait EntityStore: Send + Sync {
    /// Create the entity and return its storage id.
    fn create(&self, entity: NewEntity) -> BoxFuture<'_, Result<String>>;
}

impl Suggestion {
    pub fn accept(&mut self) -> Result<(), DecisionError> {
        self.decide(Decision::Accepted)
    }

    pub fn reject(&mut self) -> Result<(), DecisionError> {
        self.decide(Decision::Rejected)
    }

    fn decide(&mut self, decision: Decision) -> Result<(), DecisionError> {
        if self.is_decided() {
            return Err(DecisionError::AlreadyDecided {
                id: self.id.clone(),
                decision: self.decision,
            });
        }
        self.decision = decision;
        Ok(())
    }

    /// Storage payload for this suggestion, with per-kind defaults filled in.
    pub fn to_new_entity(&self) -> NewEntity {
        let title = self.title.clone();
        let description = self.description.clone();
        match &self.details {
            KindDetails::Task(task) => NewEntity::Task(NewTask {
                title,
                description,
                priority: self.priority,
                due_date: task.due_date.clone(),
                related_goal_id: task.related_goal_id.clone(),
            }),
            KindDetails::Goal(goal) => NewEntity::Goal(NewGoal {
                title,
                description,
                target_date: goal.target_date.clone(),
                progress: goal.progress.unwrap_or(0).min(100),
                goal_type: goal.goal_type.clone(),
            }),
            KindDetails::Habit(habit) => NewEntity::Habit(NewHabit {
                title,
                description,
                frequency: habit.frequency.unwrap_or(HabitFrequency::Daily),
                reminder_time: habit.reminder_time.clone(),
                target_count: habit.target_count.unwrap_or(1),
                related_habit_id: habit.related_habit_id.clone(),
            }),
            KindDetails::Journal(journal) => NewEntity::JournalEntry(NewJournalEntry {
                title,
                content: journal.content.clone().unwrap_or(description),
                entry_date: journal.entry_date.clone(),
                mood: journal.mood.clone(),
                tags: journal.tags.clone(),
            }),
        }
    }
}

/// Persist an accepted suggestion. Suggestions that were not accepted are refused.
pub async fn persist_accepted(store: &dyn EntityStore, suggestion: &Suggestion) -> Result<String> {
    if suggestion.decision != Decision::Accepted {
        return Err(DecisionError::NotAccepted {
            id: suggestion.id.clone(),
        }
        .into());
    }
    let entity = suggestion.to_new_entity();
    tracing::info!(
        suggestion = %suggestion.id,
        kind = suggestion.kind().as_str(),
        "persisting accepted suggestion"
    );
    store.create(entity).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suggest::{GoalDetails, JournalDetails, SuggestionKind};
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryStore {
        created: Mutex<Vec<NewEntity>>,
    }

    impl EntityStore for MemoryStore {
        fn create(&self, entity: NewEntity) -> BoxFuture<'_, Result<String>> {
            Box::pin(async move {
                let mut created = self.created.lock().unwrap();
                created.push(entity);
                Ok(format!("row-{}", created.len()))
            })
        }
    }

    #[test]
    fn decisions_are_final() {
        let mut s = Suggestion::new(SuggestionKind::Task, "A");
        s.accept().unwrap();
        assert_eq!(s.decision, Decision::Accepted);
        assert!(matches!(
            s.reject(),
            Err(DecisionError::AlreadyDecided {
                decision: Decision::Accepted,
                ..
            })
        ));
    }

    #[test]
    fn entity_defaults_are_filled_per_kind() {
        let goal = Suggestion::new(SuggestionKind::Goal, "Save")
            .with_details(KindDetails::Goal(GoalDetails::default()));
        assert!(matches!(
            goal.to_new_entity(),
            NewEntity::Goal(NewGoal { progress: 0, .. })
        ));

        let habit = Suggestion::new(SuggestionKind::Habit, "Walk");
        assert!(matches!(
            habit.to_new_entity(),
            NewEntity::Habit(NewHabit {
                frequency: HabitFrequency::Daily,
                target_count: 1,
                ..
            })
        ));

        let journal = Suggestion::new(SuggestionKind::Journal, "Evening")
            .with_description("Felt good today")
            .with_details(KindDetails::Journal(JournalDetails::default()));
        let NewEntity::JournalEntry(entry) = journal.to_new_entity() else {
            panic!("expected journal entry");
        };
        assert_eq!(entry.content, "Felt good today");
    }

    #[tokio::test]
    async fn only_accepted_suggestions_are_persisted() {
        let store = MemoryStore::default();
        let mut s = Suggestion::new(SuggestionKind::Task, "Call the bank");

        let refused = persist_accepted(&store, &s).await;
        assert!(refused.is_err());
        assert!(store.created.lock().unwrap().is_empty());

        s.accept().unwrap();
        let id = persist_accepted(&store, &s).await.unwrap();
        assert_eq!(id, "row-1");
        let created = store.created.lock().unwrap();
        assert!(matches!(&created[0], NewEntity::Task(task) if task.title == "Call the bank"));
    }
}
