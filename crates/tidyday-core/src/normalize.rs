//! Convert parsed provider JSON into canonical [`Suggestion`]s.
//!
//! Provider payloads are untrusted and loosely shaped, so nothing here
//! rejects an item: unknown kinds become tasks, bad fields fall back to
//! defaults, and each anomaly is logged.

use crate::suggest::{
    new_suggestion_id, GoalDetails, HabitDetails, HabitFrequency, JournalDetails, KindDetails,
    Priority, Suggestion, SuggestionKind, TaskDetails, DEFAULT_REASON, DEFAULT_TITLE,
};
use serde_json::{Map, Value};
use tracing::{debug, warn};

const KIND_KEYS: &[&str] = &["type", "kind"];
const TITLE_KEYS: &[&str] = &["title", "name", "summary"];
const DESCRIPTION_KEYS: &[&str] = &["description", "details", "detail"];
const REASON_KEYS: &[&str] = &["reason", "rationale", "why"];

/// Keys holding child items of a composite plan
const NESTED_KEYS: &[&str] = &[
    "subSuggestions",
    "subTasks",
    "subItems",
    "tasks",
    "children",
    "steps",
    "items",
];

/// Keys under which a bare wrapper object carries the real list
const CONTAINER_KEYS: &[&str] = &["suggestions", "items", "results", "data"];

/// Normalize any parsed JSON value into a flat list of suggestions.
///
/// Arrays yield one suggestion per element; an object yields itself plus one
/// level of nested children. An object carrying nothing but a list under a
/// wrapper key is treated as a container and only its list is emitted.
pub fn normalize_suggestions(value: &Value) -> Vec<Suggestion> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items.iter().flat_map(normalize_entry).collect(),
        Value::Object(map) => match container_list(map) {
            Some(items) => items.iter().flat_map(normalize_entry).collect(),
            None => normalize_entry(value),
        },
        other => vec![placeholder(other)],
    }
}

/// One raw entry plus its flattened children.
fn normalize_entry(value: &Value) -> Vec<Suggestion> {
    let Value::Object(map) = value else {
        return vec![placeholder(value)];
    };

    let parent = normalize_item(map);
    let children = nested_list(map).unwrap_or(&[]);
    let mut out = Vec::with_capacity(1 + children.len());

    for child in children {
        let mut suggestion = match child {
            Value::Object(child_map) => {
                if nested_list(child_map).is_some() {
                    debug!(
                        parent = %parent.title,
                        "ignoring second level of nested suggestions"
                    );
                }
                normalize_item(child_map)
            }
            other => placeholder(other),
        };
        link_to_parent(&mut suggestion, &parent);
        out.push(suggestion);
    }

    out.insert(0, parent);
    out
}

fn link_to_parent(child: &mut Suggestion, parent: &Suggestion) {
    if let (KindDetails::Task(task), KindDetails::Goal(_)) = (&mut child.details, &parent.details) {
        if task.related_goal_id.is_none() {
            task.related_goal_id = Some(parent.id.clone());
        }
    }
}

/// Normalize a single raw object. Never fails.
pub fn normalize_item(map: &Map<String, Value>) -> Suggestion {
    let kind = resolve_kind(map);

    let title = text_field(map, TITLE_KEYS).unwrap_or_else(|| {
        warn!(kind = kind.as_str(), "suggestion missing title; using placeholder");
        DEFAULT_TITLE.to_string()
    });

    let priority = match field(map, &["priority"]) {
        None => Priority::Medium,
        Some(raw) => match as_text(raw).as_deref().and_then(Priority::parse) {
            Some(priority) => priority,
            None => {
                warn!(value = %raw, "invalid priority; defaulting to medium");
                Priority::Medium
            }
        },
    };

    let id = text_field(map, &["id"]).unwrap_or_else(new_suggestion_id);

    Suggestion::new(kind, title)
        .with_id(id)
        .with_description(text_field(map, DESCRIPTION_KEYS).unwrap_or_default())
        .with_priority(priority)
        .with_reason(text_field(map, REASON_KEYS).unwrap_or_else(|| DEFAULT_REASON.to_string()))
        .with_details(details_for(kind, map))
}

fn resolve_kind(map: &Map<String, Value>) -> SuggestionKind {
    match field(map, KIND_KEYS) {
        None => {
            warn!("suggestion missing type; defaulting to task");
            SuggestionKind::Task
        }
        Some(raw) => match as_text(raw).as_deref().and_then(SuggestionKind::parse) {
            Some(kind) => kind,
            None => {
                warn!(value = %raw, "unrecognized suggestion type; defaulting to task");
                SuggestionKind::Task
            }
        },
    }
}

fn details_for(kind: SuggestionKind, map: &Map<String, Value>) -> KindDetails {
    match kind {
        SuggestionKind::Task => KindDetails::Task(TaskDetails {
            due_date: text_field(map, &["dueDate", "deadline"]),
            related_goal_id: text_field(map, &["relatedGoalId", "goalId"]),
            completed: field(map, &["completed", "done"]).and_then(coerce_bool),
            status: text_field(map, &["status"]),
        }),
        SuggestionKind::Goal => KindDetails::Goal(GoalDetails {
            target_date: text_field(map, &["targetDate", "deadline", "dueDate"]),
            progress: field(map, &["progress"]).and_then(coerce_progress),
            goal_type: text_field(map, &["goalType"]),
        }),
        SuggestionKind::Habit => KindDetails::Habit(HabitDetails {
            frequency: text_field(map, &["frequency"]).and_then(|raw| {
                let parsed = HabitFrequency::parse(&raw);
                if parsed.is_none() {
                    warn!(value = %raw, "invalid habit frequency; dropping");
                }
                parsed
            }),
            reminder_time: text_field(map, &["reminderTime", "reminder"]),
            target_count: field(map, &["targetCount"]).and_then(coerce_count),
            related_habit_id: text_field(map, &["relatedHabitId", "habitId"]),
        }),
        SuggestionKind::Journal => KindDetails::Journal(JournalDetails {
            content: text_field(map, &["content", "body", "text"]),
            entry_date: text_field(map, &["entryDate", "date"]),
            mood: text_field(map, &["mood"]),
            tags: field(map, &["tags"]).map(coerce_tags).unwrap_or_default(),
        }),
    }
}

/// Placeholder task for entries that are not objects.
fn placeholder(value: &Value) -> Suggestion {
    warn!(value = %value, "non-object suggestion entry; emitting placeholder task");
    Suggestion::new(
        SuggestionKind::Task,
        as_text(value).unwrap_or_else(|| DEFAULT_TITLE.to_string()),
    )
}

fn container_list(map: &Map<String, Value>) -> Option<&[Value]> {
    let looks_like_item = field(map, TITLE_KEYS).is_some() || field(map, KIND_KEYS).is_some();
    if looks_like_item {
        return None;
    }
    array_field(map, CONTAINER_KEYS).or_else(|| array_field(map, NESTED_KEYS))
}

fn nested_list(map: &Map<String, Value>) -> Option<&[Value]> {
    array_field(map, NESTED_KEYS)
}

fn array_field<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a [Value]> {
    keys.iter().find_map(|key| match field(map, &[*key]) {
        Some(Value::Array(items)) => Some(items.as_slice()),
        _ => None,
    })
}

/// `dueDate`, `due_date` and `DueDate` all compare equal.
fn canonical_key(key: &str) -> String {
    key.chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Case- and separator-insensitive lookup; nulls count as missing.
fn field<'a>(map: &'a Map<String, Value>, aliases: &[&str]) -> Option<&'a Value> {
    aliases.iter().find_map(|alias| {
        let wanted = canonical_key(alias);
        map.iter()
            .find(|(key, value)| !value.is_null() && canonical_key(key) == wanted)
            .map(|(_, value)| value)
    })
}

fn as_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn text_field(map: &Map<String, Value>, aliases: &[&str]) -> Option<String> {
    field(map, aliases).and_then(as_text)
}

fn coerce_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|n| n != 0.0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "done" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Progress rounded and clamped into 0..=100.
fn coerce_progress(value: &Value) -> Option<u8> {
    let Some(raw) = as_number(value).filter(|n| n.is_finite()) else {
        warn!(value = %value, "invalid goal progress; dropping");
        return None;
    };
    let clamped = raw.round().clamp(0.0, 100.0);
    if clamped != raw.round() {
        warn!(value = raw, "goal progress out of range; clamped");
    }
    Some(clamped as u8)
}

fn coerce_count(value: &Value) -> Option<u32> {
    let raw = as_number(value).filter(|n| n.is_finite() && *n >= 0.0)?;
    Some(raw.round().min(u32::MAX as f64) as u32)
}

/// Tags as a list of trimmed, non-empty strings. Comma-joined strings are split.
fn coerce_tags(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(as_text).collect(),
        Value::String(joined) => joined
            .split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect(),
        other => as_text(other).into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract_json;
    use crate::suggest::Decision;
    use serde_json::json;

    #[test]
    fn fenced_provider_output_normalizes_to_task() {
        let text = "Here you go:\n```json\n[{\"Title\":\"Plan trip\",\"Type\":\"task\"}]\n```";
        let value = extract_json(text).parse().unwrap();
        let suggestions = normalize_suggestions(&value);
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].kind(), SuggestionKind::Task);
        assert_eq!(suggestions[0].title, "Plan trip");
        assert_eq!(suggestions[0].priority, Priority::Medium);
        assert_eq!(suggestions[0].decision, Decision::Unset);
        assert_eq!(suggestions[0].reason, DEFAULT_REASON);
    }

    #[test]
    fn comma_joined_tags_are_split() {
        let value = json!({"type": "journal", "title": "Day", "tags": "work, urgent"});
        let suggestions = normalize_suggestions(&value);
        let KindDetails::Journal(journal) = &suggestions[0].details else {
            panic!("expected journal");
        };
        assert_eq!(journal.tags, vec!["work", "urgent"]);
    }

    #[test]
    fn tag_arrays_are_trimmed_and_blanks_dropped() {
        let value = json!({"type": "journal", "tags": [" a ", "", "b", 3]});
        let suggestions = normalize_suggestions(&value);
        let KindDetails::Journal(journal) = &suggestions[0].details else {
            panic!("expected journal");
        };
        assert_eq!(journal.tags, vec!["a", "b", "3"]);
    }

    #[test]
    fn unknown_or_missing_kind_defaults_to_task() {
        let value = json!([
            {"type": "project", "title": "Launch"},
            {"title": "No type"},
            {"type": 7}
        ]);
        let suggestions = normalize_suggestions(&value);
        assert_eq!(suggestions.len(), 3);
        assert!(suggestions.iter().all(|s| s.kind() == SuggestionKind::Task));
        assert_eq!(suggestions[2].title, DEFAULT_TITLE);
    }

    #[test]
    fn category_is_not_a_kind() {
        let value = json!([
            {"type": "habit", "title": "Stretch", "category": "health"},
            {"title": "Book dentist", "category": "goal"}
        ]);
        let kinds: Vec<SuggestionKind> =
            normalize_suggestions(&value).iter().map(|s| s.kind()).collect();
        assert_eq!(kinds, vec![SuggestionKind::Habit, SuggestionKind::Task]);
    }

    #[test]
    fn invalid_priority_defaults_to_medium() {
        let value = json!([
            {"title": "A", "priority": "ASAP"},
            {"title": "B", "priority": "Urgent"},
            {"title": "C", "priority": ["high"]}
        ]);
        let priorities: Vec<Priority> =
            normalize_suggestions(&value).iter().map(|s| s.priority).collect();
        assert_eq!(
            priorities,
            vec![Priority::Medium, Priority::Urgent, Priority::Medium]
        );
    }

    #[test]
    fn keys_match_regardless_of_case_and_separator() {
        let value = json!({
            "Type": "task",
            "TITLE": "File taxes",
            "due_date": "2024-04-15",
            "Related-Goal-Id": "g-1",
            "Completed": "yes"
        });
        let suggestion = &normalize_suggestions(&value)[0];
        assert_eq!(
            suggestion.details,
            KindDetails::Task(TaskDetails {
                due_date: Some("2024-04-15".to_string()),
                related_goal_id: Some("g-1".to_string()),
                completed: Some(true),
                status: None,
            })
        );
    }

    #[test]
    fn progress_is_clamped() {
        let value = json!([
            {"type": "goal", "title": "A", "progress": 140},
            {"type": "goal", "title": "B", "progress": -5},
            {"type": "goal", "title": "C", "progress": "42.6%"},
            {"type": "goal", "title": "D", "progress": "lots"}
        ]);
        let progress: Vec<Option<u8>> = normalize_suggestions(&value)
            .iter()
            .map(|s| match &s.details {
                KindDetails::Goal(goal) => goal.progress,
                _ => panic!("expected goal"),
            })
            .collect();
        assert_eq!(progress, vec![Some(100), Some(0), Some(43), None]);
    }

    #[test]
    fn habit_fields_are_coerced() {
        let value = json!({
            "type": "HABIT",
            "title": "Drink water",
            "frequency": "Weekly",
            "targetCount": "8",
            "reminderTime": "09:00"
        });
        let suggestion = &normalize_suggestions(&value)[0];
        assert_eq!(
            suggestion.details,
            KindDetails::Habit(HabitDetails {
                frequency: Some(HabitFrequency::Weekly),
                reminder_time: Some("09:00".to_string()),
                target_count: Some(8),
                related_habit_id: None,
            })
        );
    }

    #[test]
    fn fields_for_other_kinds_are_ignored() {
        let value = json!({"type": "habit", "title": "Run", "progress": 50, "tags": "x"});
        let suggestion = &normalize_suggestions(&value)[0];
        assert_eq!(suggestion.details, KindDetails::Habit(HabitDetails::default()));
    }

    #[test]
    fn nested_plan_flattens_parent_and_children() {
        let value = json!({
            "id": "goal-1",
            "type": "goal",
            "title": "Run a 10k",
            "subTasks": [
                {"type": "task", "title": "Buy shoes"},
                {"type": "task", "title": "Sign up", "relatedGoalId": "other"},
                {"type": "habit", "title": "Run 3x a week", "steps": [{"title": "deeper"}]}
            ]
        });
        let suggestions = normalize_suggestions(&value);
        let titles: Vec<&str> = suggestions.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Run a 10k", "Buy shoes", "Sign up", "Run 3x a week"]
        );
        let related: Vec<Option<&str>> = suggestions[1..3]
            .iter()
            .map(|s| match &s.details {
                KindDetails::Task(task) => task.related_goal_id.as_deref(),
                _ => None,
            })
            .collect();
        assert_eq!(related, vec![Some("goal-1"), Some("other")]);
    }

    #[test]
    fn wrapper_object_is_a_pure_container() {
        let value = json!({"suggestions": [{"title": "A"}, {"title": "B"}]});
        let titles: Vec<String> = normalize_suggestions(&value)
            .into_iter()
            .map(|s| s.title)
            .collect();
        assert_eq!(titles, vec!["A", "B"]);
    }

    #[test]
    fn non_object_entries_become_placeholders() {
        let value = json!(["Call mom", 42, null, {"title": "Real"}]);
        let suggestions = normalize_suggestions(&value);
        let titles: Vec<&str> = suggestions.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Call mom", "42", DEFAULT_TITLE, "Real"]);
        assert!(suggestions.iter().all(|s| s.kind() == SuggestionKind::Task));
    }

    #[test]
    fn ids_are_kept_or_generated() {
        let value = json!([{"id": 12, "title": "A"}, {"title": "B"}, {"title": "C"}]);
        let suggestions = normalize_suggestions(&value);
        assert_eq!(suggestions[0].id, "12");
        assert!(!suggestions[1].id.is_empty());
        assert_ne!(suggestions[1].id, suggestions[2].id);
    }

    #[test]
    fn empty_array_and_null_yield_nothing() {
        assert!(normalize_suggestions(&json!([])).is_empty());
        assert!(normalize_suggestions(&Value::Null).is_empty());
    }

    #[test]
    fn renormalizing_output_is_stable() {
        let value = json!([
            {"type": "goal", "id": "g", "title": "Save money", "progress": 120,
             "children": [{"title": "Open account"}]},
            {"type": "journal", "title": "Evening", "tags": "calm, grateful", "mood": "good"},
            {"type": "habit", "title": "Meditate", "frequency": "daily", "targetCount": 1},
            {"Title": "Loose", "priority": "HIGH", "Completed": false}
        ]);
        let first = normalize_suggestions(&value);
        let reserialized = serde_json::to_value(&first).unwrap();
        let second = normalize_suggestions(&reserialized);
        assert_eq!(first, second);
    }
}
