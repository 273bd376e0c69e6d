//! Content gate: does a fragment read like authored prose?
//!
//! Independent of the noise gate. Callers evaluate both; a string may be
//! neither noise nor content (short borderline strings), or even both.

use once_cell::sync::Lazy;
use regex::Regex;

/// Minimum length (chars, after trim) for content.
pub const MIN_CONTENT_CHARS: usize = 15;

/// (id, pattern). Any match accepts.
pub const CONTENT_TABLE: &[(&str, &str)] = &[
    // Two runs of 3+ letters, not necessarily separate words: a single word
    // of 6+ letters also matches. Kept as the scraper wrote it.
    ("two_words", r"[a-zA-Z]{3,}.*[a-zA-Z]{3,}"),
    ("sentence_end", r"[.!?]"),
    ("clause_punct", r"[,:;]"),
];

static COMPILED: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    CONTENT_TABLE
        .iter()
        .map(|(id, pat)| (*id, Regex::new(pat).expect("content table regex")))
        .collect()
});

/// Id of the first content pattern matching `text`, ignoring the length rule.
pub fn content_match(text: &str) -> Option<&'static str> {
    COMPILED
        .iter()
        .find(|(_, re)| re.is_match(text))
        .map(|(id, _)| *id)
}

pub fn is_content<'a>(text: impl Into<Option<&'a str>>) -> bool {
    let Some(text) = text.into() else {
        return false;
    };
    let t = text.trim();
    if t.chars().count() < MIN_CONTENT_CHARS {
        return false;
    }
    content_match(t).is_some()
}
