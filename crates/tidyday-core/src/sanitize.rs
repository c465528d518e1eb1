//! Strip meta-commentary from raw provider text.
//!
//! Pure string functions: nothing here can fail, and text without any
//! recognizable structure comes back unchanged (modulo surrounding whitespace).

/// Reasoning wrapper pairs emitted by "thinking" models. Matched case-insensitively.
const REASONING_TAGS: &[(&str, &str)] = &[
    ("<think>", "</think>"),
    ("<thinking>", "</thinking>"),
    ("<reasoning>", "</reasoning>"),
];

/// Characters that may form a fence run around a structured block
const FENCE_MARKERS: &[char] = &['=', '-', '*', '#', '~', '_'];

/// Minimum run length for a fence line
pub const MIN_FENCE_RUN: usize = 8;

/// Remove reasoning blocks and their contents.
///
/// An unclosed opener swallows everything after it; an orphan closer
/// swallows everything before it. If that leaves nothing, whatever follows
/// the last closing tag in the original text is returned instead.
pub fn strip_reasoning(text: &str) -> String {
    let mut out = text.to_string();
    for (open, close) in REASONING_TAGS {
        out = strip_tag_pair(&out, open, close);
    }

    let stripped = out.trim();
    if stripped.is_empty() {
        if let Some(after) = content_after_last_close(text) {
            return after;
        }
    }
    stripped.to_string()
}

fn strip_tag_pair(text: &str, open: &str, close: &str) -> String {
    let mut out = text.to_string();
    loop {
        // ASCII lowercasing keeps byte offsets aligned with `out`.
        let lower = out.to_ascii_lowercase();
        if let Some(start) = lower.find(open) {
            let body_start = start + open.len();
            match lower[body_start..].find(close) {
                Some(rel) => {
                    let end = body_start + rel + close.len();
                    out.replace_range(start..end, "");
                }
                None => out.truncate(start),
            }
            continue;
        }
        if let Some(pos) = lower.find(close) {
            out.replace_range(..pos + close.len(), "");
            continue;
        }
        return out;
    }
}

fn content_after_last_close(text: &str) -> Option<String> {
    let lower = text.to_ascii_lowercase();
    REASONING_TAGS
        .iter()
        .filter_map(|(_, close)| lower.rfind(close).map(|pos| pos + close.len()))
        .max()
        .map(|end| text[end..].trim().to_string())
}

/// Remove a markdown code fence wrapping the whole text, if present.
pub fn strip_markdown_fences(text: &str) -> String {
    let trimmed = text.trim();
    let Some(without_open) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };
    let after_header = match without_open.find('\n') {
        Some(idx) => &without_open[idx + 1..],
        None => without_open,
    };
    match after_header.rfind("```") {
        Some(end) => after_header[..end].trim().to_string(),
        None => after_header.trim().to_string(),
    }
}

/// Full cleanup for free-text responses (insights, summaries).
pub fn sanitize_response(text: &str) -> String {
    strip_markdown_fences(&strip_reasoning(text))
}

/// Text split around a fenced structured block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FencedSplit {
    /// User-facing commentary outside the fences
    pub conversation: String,
    /// Content between the fences, if a complete block was found
    pub block: Option<String>,
}

#[derive(Debug, Clone, Copy)]
struct FenceRun {
    start: usize,
    end: usize,
    marker: char,
}

fn fence_runs(text: &str) -> Vec<FenceRun> {
    let mut runs = Vec::new();
    let mut current: Option<(usize, char, usize)> = None;

    for (idx, ch) in text.char_indices() {
        match current {
            Some((start, marker, count)) if ch == marker => {
                current = Some((start, marker, count + 1));
            }
            _ => {
                if let Some((start, marker, count)) = current.take() {
                    if count >= MIN_FENCE_RUN {
                        runs.push(FenceRun {
                            start,
                            end: idx,
                            marker,
                        });
                    }
                }
                if FENCE_MARKERS.contains(&ch) {
                    current = Some((idx, ch, 1));
                }
            }
        }
    }
    if let Some((start, marker, count)) = current {
        if count >= MIN_FENCE_RUN {
            runs.push(FenceRun {
                start,
                end: text.len(),
                marker,
            });
        }
    }
    runs
}

/// Split `text` into commentary and the first block fenced by two runs of
/// at least [`MIN_FENCE_RUN`] identical marker characters.
///
/// A run with no partner of the same marker later on (a markdown rule, a
/// table separator) is skipped and stays in the commentary.
pub fn split_fenced_block(text: &str) -> FencedSplit {
    let runs = fence_runs(text);
    let pair = runs.iter().enumerate().find_map(|(idx, open)| {
        runs[idx + 1..]
            .iter()
            .find(|run| run.marker == open.marker)
            .map(|close| (*open, *close))
    });

    let Some((open, close)) = pair else {
        return FencedSplit {
            conversation: text.to_string(),
            block: None,
        };
    };

    let block = text[open.end..close.start].trim();
    let before = text[..open.start].trim();
    let after = text[close.end..].trim();
    let conversation = match (before.is_empty(), after.is_empty()) {
        (false, false) => format!("{}\n\n{}", before, after),
        (false, true) => before.to_string(),
        (true, false) => after.to_string(),
        (true, true) => String::new(),
    };

    FencedSplit {
        conversation,
        block: if block.is_empty() {
            None
        } else {
            Some(block.to_string())
        },
    }
}
