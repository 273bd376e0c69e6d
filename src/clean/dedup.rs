//! Per-run exact-duplicate suppression on lowercased, normalized text.

use std::collections::HashSet;

/// Remembers every accepted text of one run. Not shared across runs.
#[derive(Debug, Default)]
pub struct DedupTracker {
    seen: HashSet<String>,
}

impl DedupTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `text` and returns `true` when it was not seen before.
    /// Duplicates return `false` and leave the set unchanged.
    pub fn observe(&mut self, text: &str) -> bool {
        self.seen.insert(text.to_lowercase())
    }

    pub fn contains(&self, text: &str) -> bool {
        self.seen.contains(&text.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
