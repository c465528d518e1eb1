//! Locate and repair a JSON value embedded in free-form model output.
//!
//! Strategies escalate from most to least explicit; each is tried only when
//! the previous one produced nothing that parses. When nothing parses, the
//! original text is handed back untouched so the caller's parse fails loudly
//! instead of inventing data.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// How the JSON candidate was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionStrategy {
    /// ```` ```json ```` fenced block
    TaggedFence,
    /// Untagged fenced block whose body starts with `{` or `[`
    GenericFence,
    /// First opener through last matching closer
    BracketSlice,
    /// Bracket-balanced span, string-aware
    BalancedScan,
    /// Line accumulation from an opening line to a closing line
    LineScan,
    /// Nothing validated; text returned as-is
    Unmodified,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub json: String,
    pub strategy: ExtractionStrategy,
    /// True when `repair_common_issues` was needed to make the candidate parse
    pub repaired: bool,
}

impl Extraction {
    /// Whether a candidate was validated by one of the strategies
    pub fn is_validated(&self) -> bool {
        self.strategy != ExtractionStrategy::Unmodified
    }

    pub fn parse(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_str(&self.json)
    }
}

fn tagged_fence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)```[ \t]*json[ \t]*\r?\n?(.*?)```").expect("valid tagged fence regex")
    })
}

fn generic_fence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)```[A-Za-z0-9_+-]*[ \t]*\r?\n?(.*?)```")
            .expect("valid generic fence regex")
    })
}

fn trailing_comma_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r",\s*([\]}])").expect("valid trailing comma regex"))
}

fn bare_key_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)(^|[{,])(\s*)([A-Z][A-Za-z0-9_]*)(\s*):").expect("valid bare key regex")
    })
}

/// Apply `rewrite` to every stretch of `text` outside double-quoted strings.
///
/// String interiors, escapes included, are copied through untouched. An
/// unterminated string runs to the end of the text.
fn map_outside_strings(text: &str, mut rewrite: impl FnMut(&str) -> String) -> String {
    let mut out = String::with_capacity(text.len());
    let mut segment_start = 0;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
                out.push_str(&text[segment_start..=idx]);
                segment_start = idx + 1;
            }
        } else if ch == '"' {
            out.push_str(&rewrite(&text[segment_start..idx]));
            in_string = true;
            segment_start = idx;
        }
    }

    if in_string {
        out.push_str(&text[segment_start..]);
    } else {
        out.push_str(&rewrite(&text[segment_start..]));
    }
    out
}

/// Fix common JSON issues from LLM responses: smart-quote delimiters,
/// trailing commas, stray control characters.
///
/// Quote and comma fixes only touch text outside string values.
pub fn repair_common_issues(json: &str) -> String {
    let fixed = map_outside_strings(json, |segment| {
        segment.replace(['\u{201C}', '\u{201D}'], "\"")
    });
    let fixed = map_outside_strings(&fixed, |segment| {
        trailing_comma_re().replace_all(segment, "$1").into_owned()
    });
    fixed
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect()
}

/// Quote unquoted object keys so JS-literal style output parses as JSON.
///
/// Only keys starting with an uppercase letter are rewritten; `title: 1`
/// stays as it is and will still fail to parse. Text inside string values
/// is never rewritten.
pub fn quote_bare_keys(text: &str) -> String {
    map_outside_strings(text, |segment| {
        bare_key_re()
            .replace_all(segment, "${1}${2}\"${3}\"${4}:")
            .into_owned()
    })
}

/// Returns the candidate (possibly repaired) if it parses to an object or array.
fn validate(candidate: &str) -> Option<(String, bool)> {
    let candidate = candidate.trim();
    if candidate.is_empty() {
        return None;
    }
    if is_structured(candidate) {
        return Some((candidate.to_string(), false));
    }
    let repaired = repair_common_issues(candidate);
    if repaired != candidate && is_structured(&repaired) {
        return Some((repaired, true));
    }
    None
}

fn is_structured(candidate: &str) -> bool {
    matches!(
        serde_json::from_str::<Value>(candidate),
        Ok(Value::Object(_)) | Ok(Value::Array(_))
    )
}

fn from_tagged_fence(text: &str) -> Option<(String, bool)> {
    tagged_fence_re()
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .find_map(|body| validate(body.as_str()))
}

fn from_generic_fence(text: &str) -> Option<(String, bool)> {
    generic_fence_re()
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|body| body.as_str().trim())
        .filter(|body| body.starts_with('{') || body.starts_with('['))
        .find_map(validate)
}

fn closer_for(open: char) -> char {
    if open == '{' {
        '}'
    } else {
        ']'
    }
}

/// Slice from the first opener to the last matching closer. Later openers
/// are left to the balanced scan so an array is never narrowed to one of
/// its elements.
fn from_bracket_slice(text: &str) -> Option<(String, bool)> {
    let start = text.find(['{', '['])?;
    let open = text[start..].chars().next()?;
    let end = text.rfind(closer_for(open))?;
    if end <= start {
        return None;
    }
    validate(&text[start..=end])
}

fn extract_balanced_from(text: &str, start: usize) -> Option<&str> {
    let mut stack: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;
    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => stack.push('}'),
            '[' => stack.push(']'),
            '}' | ']' => {
                if stack.pop() != Some(ch) {
                    return None;
                }
                if stack.is_empty() {
                    let end = start + offset + ch.len_utf8();
                    return Some(&text[start..end]);
                }
            }
            _ => {}
        }
    }
    None
}

const MAX_BALANCED_CANDIDATES: usize = 4;

fn from_balanced_scan(text: &str) -> Option<(String, bool)> {
    text.char_indices()
        .filter(|(_, ch)| *ch == '{' || *ch == '[')
        .filter_map(|(idx, _)| extract_balanced_from(text, idx))
        .take(MAX_BALANCED_CANDIDATES)
        .find_map(validate)
}

fn from_line_scan(text: &str) -> Option<(String, bool)> {
    let mut buf: Vec<&str> = Vec::new();
    let mut closer: Option<char> = None;

    for line in text.lines() {
        let trimmed = line.trim();
        let expected = match closer {
            Some(expected) => expected,
            None => match trimmed.chars().next() {
                Some(open @ ('{' | '[')) => {
                    let expected = closer_for(open);
                    closer = Some(expected);
                    expected
                }
                _ => continue,
            },
        };
        buf.push(line);
        if trimmed.ends_with(expected) {
            if let Some(found) = validate(&buf.join("\n")) {
                return Some(found);
            }
        }
    }
    None
}

/// Locate a JSON object or array anywhere in `text`.
pub fn extract_json(text: &str) -> Extraction {
    let strategies: [(ExtractionStrategy, fn(&str) -> Option<(String, bool)>); 5] = [
        (ExtractionStrategy::TaggedFence, from_tagged_fence),
        (ExtractionStrategy::GenericFence, from_generic_fence),
        (ExtractionStrategy::BracketSlice, from_bracket_slice),
        (ExtractionStrategy::BalancedScan, from_balanced_scan),
        (ExtractionStrategy::LineScan, from_line_scan),
    ];

    for (strategy, run) in strategies {
        if let Some((json, repaired)) = run(text) {
            tracing::debug!(?strategy, repaired, "extracted JSON candidate");
            return Extraction {
                json,
                strategy,
                repaired,
            };
        }
    }

    Extraction {
        json: text.to_string(),
        strategy: ExtractionStrategy::Unmodified,
        repaired: false,
    }
}

/// Extraction for the fenced-block convention, where keys may be unquoted.
///
/// Blocks with nothing to quote are extracted as they are. When quoting
/// changes the block but still yields nothing, the original is tried too.
pub fn extract_structured_block(block: &str) -> Extraction {
    let quoted = quote_bare_keys(block);
    if quoted == block {
        return extract_json(block);
    }
    let extraction = extract_json(&quoted);
    if extraction.is_validated() {
        extraction
    } else {
        extract_json(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tagged_fence_wins() {
        let text = "Here you go:\n```json\n[{\"Title\":\"Plan trip\",\"Type\":\"task\"}]\n```";
        let extraction = extract_json(text);
        assert_eq!(extraction.strategy, ExtractionStrategy::TaggedFence);
        assert_eq!(
            extraction.parse().unwrap(),
            json!([{"Title": "Plan trip", "Type": "task"}])
        );
    }

    #[test]
    fn generic_fence_requires_structured_body() {
        let text = "```\nnot json\n```\nthen\n```\n{\"a\": 1}\n```";
        let extraction = extract_json(text);
        assert_eq!(extraction.strategy, ExtractionStrategy::GenericFence);
        assert_eq!(extraction.parse().unwrap(), json!({"a": 1}));
    }

    #[test]
    fn array_in_prose_is_recovered() {
        let text = "Sure! [{\"title\": \"Walk\"}, {\"title\": \"Read\"}] Hope that helps.";
        let extraction = extract_json(text);
        assert_eq!(extraction.strategy, ExtractionStrategy::BracketSlice);
        assert_eq!(
            extraction.parse().unwrap(),
            json!([{"title": "Walk"}, {"title": "Read"}])
        );
    }

    #[test]
    fn prose_brackets_before_json_fall_through_to_object() {
        let text = "[Note] result: {\"title\": \"Stretch\"}";
        let extraction = extract_json(text);
        assert_eq!(extraction.parse().unwrap(), json!({"title": "Stretch"}));
    }

    #[test]
    fn array_followed_by_bracketed_prose_stays_an_array() {
        let text = "[{\"title\": \"A\"}] (see note [1])";
        let extraction = extract_json(text);
        assert_eq!(extraction.strategy, ExtractionStrategy::BalancedScan);
        assert_eq!(extraction.parse().unwrap(), json!([{"title": "A"}]));
    }

    #[test]
    fn balanced_scan_handles_trailing_braces_in_prose() {
        let text = "{\"title\": \"A\"} and later {oops}";
        let extraction = extract_json(text);
        assert_eq!(extraction.strategy, ExtractionStrategy::BalancedScan);
        assert_eq!(extraction.parse().unwrap(), json!({"title": "A"}));
    }

    #[test]
    fn trailing_commas_are_repaired() {
        let text = "```json\n[{\"title\": \"A\",}, ]\n```";
        let extraction = extract_json(text);
        assert!(extraction.repaired);
        assert_eq!(extraction.parse().unwrap(), json!([{"title": "A"}]));
    }

    #[test]
    fn repair_leaves_string_values_alone() {
        assert_eq!(
            repair_common_issues("{\"note\": \"a, ]\", }"),
            "{\"note\": \"a, ]\"}"
        );
        assert_eq!(
            repair_common_issues("{\"quote\": \"he said \u{201C}hi\u{201D}\",}"),
            "{\"quote\": \"he said \u{201C}hi\u{201D}\"}"
        );
    }

    #[test]
    fn smart_quotes_are_repaired() {
        let text = "{\u{201C}title\u{201D}: \u{201C}Journal\u{201D}}";
        let extraction = extract_json(text);
        assert_eq!(extraction.parse().unwrap(), json!({"title": "Journal"}));
    }

    #[test]
    fn unparsable_text_is_returned_unchanged() {
        let text = "I could not come up with anything {really";
        let extraction = extract_json(text);
        assert_eq!(extraction.strategy, ExtractionStrategy::Unmodified);
        assert!(!extraction.is_validated());
        assert_eq!(extraction.json, text);
        assert!(extraction.parse().is_err());
    }

    #[test]
    fn line_scan_validate_helper_accepts_multiline_block() {
        let text = "notes: a } b\n{\n  \"title\": \"Deep work\"\n}\ntrailing {";
        let found = from_line_scan(text).unwrap();
        assert_eq!(
            serde_json::from_str::<Value>(&found.0).unwrap(),
            json!({"title": "Deep work"})
        );
    }

    #[test]
    fn quotes_uppercase_bare_keys() {
        let block = "[{Title: \"Plan trip\", Type: \"task\", DueDate: \"2024-05-01T10:30\"}]";
        let extraction = extract_structured_block(block);
        assert_eq!(
            extraction.parse().unwrap(),
            json!([{"Title": "Plan trip", "Type": "task", "DueDate": "2024-05-01T10:30"}])
        );
    }

    #[test]
    fn lowercase_bare_keys_are_not_repaired() {
        let block = "[{title: \"Plan trip\"}]";
        assert_eq!(quote_bare_keys(block), block);
        assert!(extract_structured_block(block).parse().is_err());
    }

    #[test]
    fn strict_json_block_is_not_rewritten() {
        let block =
            "[{\"Title\": \"Meeting\", \"Description\": \"Agenda: review, Budget: discuss\"}]";
        let extraction = extract_structured_block(block);
        assert!(extraction.is_validated());
        assert_eq!(
            extraction.parse().unwrap(),
            json!([{"Title": "Meeting", "Description": "Agenda: review, Budget: discuss"}])
        );
    }

    #[test]
    fn quoted_block_keeps_nested_arrays_whole() {
        let block = "[{Title: \"Read\", Tags: [\"books\"]}]";
        assert_eq!(
            extract_structured_block(block).parse().unwrap(),
            json!([{"Title": "Read", "Tags": ["books"]}])
        );
    }

    #[test]
    fn bare_key_quoting_skips_string_values() {
        let block = "[{Title: \"Meeting\", Description: \"Agenda: review, Budget: discuss\"}]";
        assert_eq!(
            quote_bare_keys(block),
            "[{\"Title\": \"Meeting\", \"Description\": \"Agenda: review, Budget: discuss\"}]"
        );
        assert_eq!(
            extract_structured_block(block).parse().unwrap(),
            json!([{"Title": "Meeting", "Description": "Agenda: review, Budget: discuss"}])
        );
    }

    #[test]
    fn already_quoted_keys_are_untouched() {
        let block = "{\"Title\": \"A\",\n  \"Tags\": \"x, Y\"}";
        assert_eq!(quote_bare_keys(block), block);
    }
}
