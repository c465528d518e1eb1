use super::client::ChatMessage;
use chrono::Local;
use tidyday_core::{JournalSnapshot, SuggestionRequest, UserContext};

/// Items per category rendered into prompts
const CONTEXT_ITEM_LIMIT: usize = 8;

/// Journal entries included in a mood analysis
const MOOD_ENTRY_LIMIT: usize = 14;

// ═══════════════════════════════════════════════════════════════════════════════
// SHARED BUILDING BLOCKS
// ═══════════════════════════════════════════════════════════════════════════════

/// Field reference shared by every prompt that asks for suggestions
const SUGGESTION_FIELDS: &str = r#"FIELDS (every item):
- "type": one of "task", "goal", "habit", "journal"
- "title": short, specific, action-oriented
- "description": one or two sentences
- "priority": one of "low", "medium", "high", "urgent"
- "reason": why this helps, referencing the user's own items when possible

PER TYPE (optional):
- task: "dueDate" (YYYY-MM-DD), "relatedGoalId"
- goal: "targetDate" (YYYY-MM-DD), "progress" (0-100), "goalType", "subTasks" (array of task items)
- habit: "frequency" ("daily" | "weekly" | "monthly"), "reminderTime" (HH:MM), "targetCount"
- journal: "content", "mood", "tags" (array of strings)"#;

// ═══════════════════════════════════════════════════════════════════════════════
// PROMPTS
// ═══════════════════════════════════════════════════════════════════════════════

pub const SMART_SUGGESTIONS_SYSTEM: &str = r#"You are Tidyday, a calm and practical personal planning assistant.

Suggest between 3 and 6 concrete items that move the user forward on what they asked for.
Build on their existing tasks, goals, habits and journal entries instead of duplicating them.

OUTPUT: a JSON array only, inside a ```json fenced block. No other text."#;

pub const CREATE_ITEMS_SYSTEM: &str = r#"You are Tidyday, a friendly planning assistant that turns requests into items.

Reply with a short, warm message for the user, then the structured items between two fence lines
made of exactly ten equals signs:

==========
[ ...JSON array of items... ]
==========

Everything outside the fences is shown to the user. Everything inside is parsed."#;

pub const WEEKLY_INSIGHT_SYSTEM: &str = r#"You are Tidyday, a supportive coach reviewing someone's week.

Write 2-3 short paragraphs in plain language:
- what went well, citing specific items
- what slipped and a likely reason
- one small, concrete adjustment for next week

Be encouraging and honest. Respond in Markdown without headings."#;

pub const MOOD_ANALYSIS_SYSTEM: &str = r#"You analyze journal entries for emotional tone.

OUTPUT (JSON object only):
{
  "mood": "one or two words for the overall mood",
  "score": 1-10 where 1 is very low and 10 is excellent,
  "summary": "two sentences, compassionate and specific",
  "themes": ["recurring topics"]
}"#;

fn today() -> String {
    Local::now().format("%Y-%m-%d (%A)").to_string()
}

fn request_body(request: &SuggestionRequest) -> String {
    format!(
        "TODAY: {}\n\nCURRENT ITEMS:\n{}\n\nREQUEST:\n{}",
        today(),
        request.user_context.render_for_prompt(CONTEXT_ITEM_LIMIT),
        request.user_request_text.trim()
    )
}

pub fn smart_suggestion_messages(request: &SuggestionRequest) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(format!("{}\n\n{}", SMART_SUGGESTIONS_SYSTEM, SUGGESTION_FIELDS)),
        ChatMessage::user(request_body(request)),
    ]
}

pub fn create_items_messages(request: &SuggestionRequest) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(format!("{}\n\n{}", CREATE_ITEMS_SYSTEM, SUGGESTION_FIELDS)),
        ChatMessage::user(request_body(request)),
    ]
}

pub fn weekly_insight_messages(context: &UserContext) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(WEEKLY_INSIGHT_SYSTEM),
        ChatMessage::user(format!(
            "TODAY: {}\n\nTHIS WEEK:\n{}",
            today(),
            context.render_for_prompt(CONTEXT_ITEM_LIMIT * 2)
        )),
    ]
}

pub fn mood_analysis_messages(entries: &[JournalSnapshot]) -> Vec<ChatMessage> {
    let rendered = UserContext {
        journal_entries: entries.iter().take(MOOD_ENTRY_LIMIT).cloned().collect(),
        ..Default::default()
    }
    .render_for_prompt(MOOD_ENTRY_LIMIT);
    vec![
        ChatMessage::system(MOOD_ANALYSIS_SYSTEM),
        ChatMessage::user(format!("ENTRIES:\n{}", rendered)),
    ]
}
