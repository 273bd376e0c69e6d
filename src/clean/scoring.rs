//! Confidence heuristic for accepted post text.
//!
//! Additive bonuses, capped at 1.0:
//! - length > 50: +0.3, length > 100: another +0.2
//! - contains `.`, `!` or `?`: +0.2
//! - two or more sentences longer than 5 chars: +0.2
//! - any content pattern matches: +0.1 (once)
//!
//! Bonuses are summed in tenths so bucket boundaries (0.5, 0.8) are exact.

use super::content::content_match;

fn sentence_count(text: &str) -> usize {
    text.split(['.', '!', '?'])
        .filter(|s| s.trim().chars().count() > 5)
        .count()
}

/// Deterministic score in [0, 1] computed from the text alone.
pub fn confidence(text: &str) -> f64 {
    let len = text.chars().count();
    let mut tenths: u32 = 0;

    if len > 50 {
        tenths += 3;
    }
    if len > 100 {
        tenths += 2;
    }
    if text.contains(['.', '!', '?']) {
        tenths += 2;
    }
    if sentence_count(text) > 1 {
        tenths += 2;
    }
    if content_match(text).is_some() {
        tenths += 1;
    }

    f64::from(tenths.min(10)) / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_single_clause_scores_low() {
        let s = "Hello there world";
        assert!(confidence(s) <= 0.3);
        assert_eq!(confidence(s), 0.1);
    }

    #[test]
    fn long_multi_sentence_scores_high() {
        let s = "We spent the whole weekend hiking up the ridge trail. \
                 The view from the top was incredible and worth every step!";
        assert!(s.chars().count() > 100);
        assert_eq!(confidence(s), 1.0);
    }

    #[test]
    fn bonuses_accumulate_in_tenths() {
        // 79 chars, one sentence ending in '!'
        let s = "Just finished reading a great book about machine learning, highly recommend it!";
        assert_eq!(confidence(s), 0.6);

        // 51+ chars, two sentences, no length>100
        let s2 = "Coffee first thing today. Then a long walk by the river";
        assert!(s2.chars().count() > 50);
        assert_eq!(confidence(s2), 0.8);
    }

    #[test]
    fn splits_on_runs_of_terminal_punctuation() {
        assert_eq!(sentence_count("Wait... what?! Really now"), 1);
        assert_eq!(sentence_count("First part here. Second part here!"), 2);
    }
}
