//! Noise gate: UI chrome, count badges, metadata and filler that are not authored prose.
//!
//! The table is ordered and evaluated with short-circuit OR. Order does not change
//! the boolean verdict, but `noise_match` reports the first hit, so keep entries
//! stable: tests and logs refer to them by id.

use once_cell::sync::Lazy;
use regex::Regex;

/// Anything shorter than this (in chars, after trim) is noise.
pub const MIN_NOISE_FREE_CHARS: usize = 10;

/// Id reported for strings rejected by the length rule.
pub const TOO_SHORT: &str = "too_short";
/// Id reported for absent input.
pub const MISSING: &str = "missing";

/// (id, pattern). Patterns are matched against the trimmed text.
pub const NOISE_TABLE: &[(&str, &str)] = &[
    // UI elements
    ("ui_action", r"(?i)^(Like|Comment|Share|Follow|More)$"),
    ("count_badge", r"(?i)^[0-9]+[KM]?\s*(Comments?|Like|Share|Follow)$"),
    ("suggestions", r"(?i)^(People You May Know|Suggested for you|See all)$"),
    ("mutual_friends", r"(?i)^[0-9]+\s*mutual friends?$"),
    ("friend_action", r"(?i)^(Add Friend|Remove|Block|Report)$"),
    ("composer", r"(?i)^(What's on your mind\?|Photo|Video|Live)$"),
    ("nav_main", r"(?i)^(Home|Search|Notifications|Menu|Profile)$"),
    ("nav_sections", r"(?i)^(News Feed|Stories|Groups|Pages|Events)$"),
    // Icons, emoji and bare counters
    ("reaction_icon", r"^(\x{F0378}|\x{F0379}|\x{F037A}|\x{F078B})"),
    ("emoji_only", r"^[\x{1F300}-\x{1F6FF}]+$"),
    ("digits_only", r"^[0-9]+$"),
    ("like_count", r"^[0-9]+[KM]$"),
    ("media_icon", r"^(\x{F160B}|\x{1F3A5}|\x{1F4F7}|\x{1F4F8}|\x{1F3B5})"),
    // Timestamps and labels
    ("time_shorthand", r"^[0-9]+[hmdHMD]$"),
    ("time_words", r"(?i)^(Just now|Yesterday|Today)$"),
    ("sponsored", r"(?i)^(Sponsored|Promoted|Advertisement)$"),
    ("privacy", r"(?i)^(Privacy|Public|Friends|Custom)$"),
    // Translation metadata
    ("translated_from", r"(?i)^Translated from [A-Za-z0-9_]+$"),
    ("see_translation", r"(?i)^See translation$"),
    ("original_text", r"(?i)^Original text$"),
    // Filler
    ("dots", r"^\.{3,}$"),
    ("ellipsis", r"^…+$"),
    ("whitespace", r"^\s*$"),
];

static COMPILED: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    NOISE_TABLE
        .iter()
        .map(|(id, pat)| (*id, Regex::new(pat).expect("noise table regex")))
        .collect()
});

/// First reason the text counts as noise, or `None` when it passes the gate.
pub fn noise_match<'a>(text: impl Into<Option<&'a str>>) -> Option<&'static str> {
    let Some(text) = text.into() else {
        return Some(MISSING);
    };
    let t = text.trim();
    if t.chars().count() < MIN_NOISE_FREE_CHARS {
        return Some(TOO_SHORT);
    }
    COMPILED
        .iter()
        .find(|(_, re)| re.is_match(t))
        .map(|(id, _)| *id)
}

pub fn is_noise<'a>(text: impl Into<Option<&'a str>>) -> bool {
    noise_match(text).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_compiles_in_order() {
        assert_eq!(COMPILED.len(), NOISE_TABLE.len());
        assert_eq!(COMPILED[0].0, "ui_action");
        assert_eq!(COMPILED[COMPILED.len() - 1].0, "whitespace");
    }

    #[test]
    fn missing_and_short_are_noise() {
        assert_eq!(noise_match(None), Some(MISSING));
        assert_eq!(noise_match("Like"), Some(TOO_SHORT));
        assert_eq!(noise_match("   2h    "), Some(TOO_SHORT));
        assert_eq!(noise_match("5 Comments"), Some("count_badge"));
    }

    #[test]
    fn long_labels_hit_their_table_entry() {
        assert_eq!(noise_match("People You May Know"), Some("suggestions"));
        assert_eq!(noise_match("12 mutual friends"), Some("mutual_friends"));
        assert_eq!(noise_match("Translated from Indonesian"), Some("translated_from"));
        assert_eq!(noise_match("See Translation"), Some("see_translation"));
        assert_eq!(noise_match("Advertisement"), Some("sponsored"));
        assert_eq!(noise_match("Notifications"), Some("nav_main"));
        assert_eq!(noise_match("1234567890123"), Some("digits_only"));
        assert_eq!(noise_match("..............."), Some("dots"));
        assert_eq!(noise_match("🎥 watch this clip right now"), Some("media_icon"));
    }

    #[test]
    fn emoji_only_run_is_noise() {
        let s = "\u{1F600}".repeat(12);
        assert_eq!(noise_match(s.as_str()), Some("emoji_only"));
    }

    #[test]
    fn prose_is_not_noise() {
        assert!(!is_noise("Had an amazing day at the beach with friends!"));
        assert!(!is_noise("Photo dump from the weekend trip"));
    }
}
