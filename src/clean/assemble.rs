//! Per-fragment assembly: normalize → noise/content gates → dedup → author →
//! selector sanitation → confidence → `ClassifiedPost`.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::author::AuthorResolver;
use super::content::is_content;
use super::dedup::DedupTracker;
use super::noise::noise_match;
use super::scoring::confidence;
use crate::ingest::normalize_text;
use crate::ingest::types::RawFragment;

/// Inner text-node selector; too unstable to be worth recording.
pub const DEFAULT_UNWANTED_SELECTOR: &str =
    r#"div[data-mcomponent="MContainer"] [data-mcomponent="TextArea"] div[dir="auto"]"#;

/// A cleaned post. Immutable once emitted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedPost {
    pub id: String,
    pub original_index: usize,
    pub text: String,
    pub author: String,
    pub timestamp: String,
    pub url: String,
    pub selector: String,
    pub confidence: f64,
}

/// Why a fragment did not become a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Empty,
    Noise,
    NotContent,
    Duplicate,
    MissingAuthor,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::Empty => "empty",
            SkipReason::Noise => "noise",
            SkipReason::NotContent => "not_content",
            SkipReason::Duplicate => "duplicate",
            SkipReason::MissingAuthor => "missing_author",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Blank the selector when it contains any unwanted selector.
pub fn sanitize_selector(selector: &str, unwanted: &[String]) -> String {
    if unwanted
        .iter()
        .any(|u| !u.is_empty() && selector.contains(u.as_str()))
    {
        String::new()
    } else {
        selector.to_string()
    }
}

/// Outcome of the text gates, before any stateful step.
pub fn gate_text(raw: Option<&str>) -> Result<String, SkipReason> {
    let Some(raw) = raw.filter(|s| !s.is_empty()) else {
        return Err(SkipReason::Empty);
    };
    let text = normalize_text(raw);
    // both predicates are always evaluated
    let noise = noise_match(text.as_str()).is_some();
    let content = is_content(text.as_str());
    if noise {
        return Err(SkipReason::Noise);
    }
    if !content {
        return Err(SkipReason::NotContent);
    }
    Ok(text)
}

/// Stateful assembler for one run. Owns the run's dedup set and id sequence.
pub struct PostAssembler<'a> {
    dedup: DedupTracker,
    resolver: AuthorResolver<'a>,
    unwanted_selectors: &'a [String],
    emitted: usize,
}

impl<'a> PostAssembler<'a> {
    pub fn new(resolver: AuthorResolver<'a>, unwanted_selectors: &'a [String]) -> Self {
        Self {
            dedup: DedupTracker::new(),
            resolver,
            unwanted_selectors,
            emitted: 0,
        }
    }

    /// Process one fragment. `position` is its index in the raw input sequence.
    pub async fn assemble(
        &mut self,
        position: usize,
        fragment: &RawFragment,
    ) -> Result<ClassifiedPost, SkipReason> {
        let text = gate_text(fragment.text.as_deref())?;

        if !self.dedup.observe(&text) {
            return Err(SkipReason::Duplicate);
        }

        let author = self
            .resolver
            .resolve(fragment.author.as_deref(), &text)
            .await;
        if author.is_empty() {
            return Err(SkipReason::MissingAuthor);
        }

        self.emitted += 1;
        Ok(ClassifiedPost {
            id: format!("clean_post_{}", self.emitted),
            original_index: position,
            confidence: confidence(&text),
            text,
            author,
            timestamp: fragment.timestamp.clone().unwrap_or_default(),
            url: fragment.page_url.clone(),
            selector: sanitize_selector(&fragment.origin_selector, self.unwanted_selectors),
        })
    }

    pub fn emitted(&self) -> usize {
        self.emitted
    }

    pub fn dedup(&self) -> &DedupTracker {
        &self.dedup
    }
}
