//! Markup segmenter.
//!
//! Input text may carry pause instructions of the form `[500]`, meaning
//! 500 milliseconds of silence. Everything else is speech.

use crate::error::{Result, SpkError};
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

#[allow(clippy::expect_used)]
static PAUSE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([0-9]+)\]").expect("pause token pattern is valid"));

/// One atomic unit of the input program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Segment {
    Speech { text: String },
    Silence { duration_ms: u64 },
}

impl Segment {
    /// Build a speech segment from an untrimmed run, dropping it when empty.
    fn speech(run: &str) -> Option<Self> {
        let text = run.trim();
        if text.is_empty() {
            None
        } else {
            Some(Segment::Speech {
                text: text.to_string(),
            })
        }
    }
}

/// Split marked-up text into speech and silence segments.
///
/// Returns `NoContent` when nothing is left to synthesize.
pub fn segment(text: &str) -> Result<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut last_end = 0;

    for caps in PAUSE_TOKEN.captures_iter(text) {
        let Some(token) = caps.get(0) else { continue };
        segments.extend(Segment::speech(&text[last_end..token.start()]));
        segments.push(Segment::Silence {
            duration_ms: parse_duration_ms(&caps[1]),
        });
        last_end = token.end();
    }
    segments.extend(Segment::speech(&text[last_end..]));

    if segments.is_empty() {
        return Err(SpkError::NoContent);
    }
    Ok(segments)
}

/// Digits only; values beyond `u64` saturate instead of failing.
fn parse_duration_ms(digits: &str) -> u64 {
    digits.parse().unwrap_or(u64::MAX)
}

/// Remove every `[` and `]` while keeping what was inside.
pub fn strip_brackets(text: &str) -> String {
    text.chars().filter(|c| !matches!(c, '[' | ']')).collect()
}

/// Legacy single-pass conversion: pause tokens become SSML breaks and any
/// leftover brackets are stripped so the engine doesn't read them out.
pub fn legacy_ssml(text: &str) -> Result<String> {
    let with_breaks = PAUSE_TOKEN.replace_all(text, r#"<break time="${1}ms"/>"#);
    let cleaned = strip_brackets(&with_breaks);
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return Err(SpkError::NoContent);
    }
    Ok(cleaned.to_string())
}
