// src/ingest/providers/snapshot.rs
//! DOM snapshot collaborator.
//!
//! A browser driver captures the rendered feed as a flat node list (document
//! order, parent links, classes, attributes, trimmed textContent). This module
//! serves both collaborator contracts from that capture: the fragment sequence
//! and the DOM queries used for author recovery.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use metrics::{counter, histogram};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use crate::ingest::types::{DomQuery, FragmentSource, NodeRef, RawFragment};

pub const FRAGMENT_SELECTOR: &str = "MContainer[role-button-child]";
/// Text areas shorter than this are never post candidates.
const MIN_CANDIDATE_CHARS: usize = 15;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DomNode {
    pub id: usize,
    #[serde(default)]
    pub parent: Option<usize>,
    pub tag: String,
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default)]
    pub attrs: BTreeMap<String, String>,
    #[serde(default)]
    pub text: String,
}

impl DomNode {
    fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }

    fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    fn is_tag(&self, tag: &str) -> bool {
        self.tag.eq_ignore_ascii_case(tag)
    }

    fn is_container(&self) -> bool {
        self.attr("data-mcomponent") == Some("MContainer")
    }

    fn is_text_area(&self) -> bool {
        self.attr("data-mcomponent") == Some("TextArea")
    }

    /// `span.f1`: the post body text.
    fn is_post_text(&self) -> bool {
        self.is_tag("span") && self.has_class("f1")
    }

    /// `span.f2.a`: the profile name next to a post.
    fn is_name_span(&self) -> bool {
        self.is_tag("span") && self.has_class("f2") && self.has_class("a")
    }

    /// `span.f2.a[role="link"][data-focusable="true"]`
    fn is_author_link(&self) -> bool {
        self.is_name_span()
            && self.attr("role") == Some("link")
            && self.attr("data-focusable") == Some("true")
    }
}

#[derive(Debug, Deserialize)]
struct SnapshotFile {
    #[serde(default)]
    url: String,
    nodes: Vec<DomNode>,
}

/// Indexed, read-only view over one captured page.
#[derive(Debug)]
pub struct DomSnapshot {
    url: String,
    nodes: Vec<DomNode>,
    pos: HashMap<usize, usize>,
    children: HashMap<usize, Vec<usize>>,
}

impl DomSnapshot {
    pub fn new(url: impl Into<String>, nodes: Vec<DomNode>) -> Self {
        let mut pos = HashMap::with_capacity(nodes.len());
        let mut children: HashMap<usize, Vec<usize>> = HashMap::new();
        for (i, n) in nodes.iter().enumerate() {
            pos.insert(n.id, i);
            if let Some(p) = n.parent {
                children.entry(p).or_default().push(n.id);
            }
        }
        Self {
            url: url.into(),
            nodes,
            pos,
            children,
        }
    }

    /// Parse a capture. Parent links must form a forest.
    pub fn from_json(s: &str) -> Result<Self> {
        let f: SnapshotFile = serde_json::from_str(s).context("parsing dom snapshot json")?;
        let snap = Self::new(f.url, f.nodes);
        if let Some(id) = snap.first_cyclic_node() {
            bail!("dom snapshot has a parent cycle through node {id}");
        }
        Ok(snap)
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let s = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading dom snapshot from {}", path.display()))?;
        Self::from_json(&s)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn node(&self, id: usize) -> Option<&DomNode> {
        self.pos.get(&id).map(|&i| &self.nodes[i])
    }

    fn parent_of(&self, id: usize) -> Option<usize> {
        self.node(id)
            .and_then(|n| n.parent)
            .filter(|p| self.pos.contains_key(p))
    }

    /// Proper ancestors of `id`, nearest first. Never yields more than
    /// `len()` ids, so a malformed parent chain still terminates.
    fn ancestors(&self, id: usize) -> impl Iterator<Item = usize> + '_ {
        std::iter::successors(self.parent_of(id), move |&p| self.parent_of(p))
            .take(self.nodes.len())
    }

    /// Some node whose parent chain loops back on itself.
    fn first_cyclic_node(&self) -> Option<usize> {
        self.nodes.iter().map(|n| n.id).find(|&id| {
            let mut cur = Some(id);
            for _ in 0..=self.nodes.len() {
                match cur {
                    Some(c) => cur = self.parent_of(c),
                    None => return false,
                }
            }
            true
        })
    }

    /// Strict descendants of `id` in document order, each node at most once.
    fn descendants(&self, id: usize) -> Vec<&DomNode> {
        let mut out = Vec::new();
        let mut seen: HashSet<usize> = HashSet::from([id]);
        let mut stack: Vec<usize> = self
            .children
            .get(&id)
            .map(|c| c.iter().rev().copied().collect())
            .unwrap_or_default();
        while let Some(cur) = stack.pop() {
            if !seen.insert(cur) {
                continue;
            }
            if let Some(n) = self.node(cur) {
                out.push(n);
            }
            if let Some(c) = self.children.get(&cur) {
                stack.extend(c.iter().rev().copied());
            }
        }
        out
    }

    /// Like a CSS descendant combinator: the ancestor may sit outside the
    /// container being scanned.
    fn has_ancestor_tag(&self, id: usize, tags: &[&str]) -> bool {
        self.ancestors(id)
            .filter_map(|p| self.node(p))
            .any(|n| tags.iter().any(|t| n.is_tag(t)))
    }

    /// One fragment per container holding a plausible post text, in document order.
    pub fn fragments(&self, max_fragments: usize) -> Vec<RawFragment> {
        let mut out = Vec::new();
        let mut processed: HashSet<String> = HashSet::new();

        let containers = self.nodes.iter().filter(|n| n.is_container());
        for (i, container) in containers.enumerate() {
            if out.len() >= max_fragments {
                break;
            }
            let container_id = container
                .attr("id")
                .map(str::to_string)
                .unwrap_or_else(|| format!("container_{i}"));
            if !processed.insert(container_id) {
                continue;
            }
            if let Some(frag) = self.fragment_for(i, container) {
                out.push(frag);
            }
        }
        out
    }

    fn fragment_for(&self, index: usize, container: &DomNode) -> Option<RawFragment> {
        let inside = self.descendants(container.id);

        let text = inside
            .iter()
            .filter(|n| n.is_text_area())
            .filter_map(|area| {
                self.descendants(area.id)
                    .into_iter()
                    .find(|n| n.is_post_text())
                    .map(|span| span.text.trim().to_string())
            })
            .find(|t| is_post_candidate(t))?;

        let author = inside
            .iter()
            .filter(|n| {
                n.is_name_span()
                    || (n.is_tag("a") && self.has_ancestor_tag(n.id, &["h3", "h4"]))
            })
            .map(|n| n.text.trim().to_string())
            .find(|t| !t.is_empty());

        let timestamp = inside
            .iter()
            .find(|n| n.is_tag("time") || n.is_tag("abbr"))
            .map(|n| {
                n.attr("datetime")
                    .filter(|s| !s.is_empty())
                    .or_else(|| n.attr("title").filter(|s| !s.is_empty()))
                    .unwrap_or(n.text.as_str())
                    .to_string()
            });

        Some(RawFragment {
            source_index: index,
            text: Some(text),
            author,
            timestamp,
            page_url: self.url.clone(),
            origin_selector: FRAGMENT_SELECTOR.to_string(),
        })
    }
}

static RE_TIME_AGO: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[0-9]+[hmd](\s+(ago|lalu))?$").expect("time regex"));
static RE_ACTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(Like|Comment|Share|Follow|More|See All)$").expect("action regex")
});
static RE_NAME_OTHERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[A-Za-z0-9_]+\s+[A-Za-z0-9_]+\s+and\s+[0-9]+\s+others?$")
        .expect("others regex")
});
static RE_COUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[0-9]+\s*(like|comment|share)s?$").expect("count regex"));

/// Coarse pre-filter applied while reading text areas. The real cleaning
/// happens downstream; this only keeps obvious chrome out of the fragment list.
pub fn is_post_candidate(text: &str) -> bool {
    const REJECT_SUBSTRINGS: &[&str] = &[
        "Translated from",
        "See translation",
        "Original text",
        " and ",
        " others",
        " mutual friends",
        " reacted to this",
    ];
    text.chars().count() > MIN_CANDIDATE_CHARS
        && !REJECT_SUBSTRINGS.iter().any(|s| text.contains(s))
        && !RE_TIME_AGO.is_match(text)
        && !RE_ACTION.is_match(text)
        && !RE_NAME_OTHERS.is_match(text)
        && !RE_COUNT.is_match(text)
}

#[async_trait]
impl DomQuery for DomSnapshot {
    async fn find_text_nodes(&self, text: &str) -> Result<Vec<NodeRef>> {
        Ok(self
            .nodes
            .iter()
            .filter(|n| n.is_post_text() && n.text.trim() == text)
            .map(|n| NodeRef(n.id))
            .collect())
    }

    async fn closest_container(&self, node: NodeRef) -> Result<Option<NodeRef>> {
        if self.node(node.0).is_none() {
            return Ok(None);
        }
        Ok(std::iter::once(node.0)
            .chain(self.ancestors(node.0))
            .find(|&id| {
                self.node(id)
                    .is_some_and(|n| n.is_container() || n.has_class("m"))
            })
            .map(NodeRef))
    }

    async fn parent(&self, node: NodeRef) -> Result<Option<NodeRef>> {
        Ok(self.parent_of(node.0).map(NodeRef))
    }

    async fn author_link_text(&self, scope: NodeRef) -> Result<Option<String>> {
        Ok(self
            .descendants(scope.0)
            .into_iter()
            .find(|n| n.is_author_link())
            .map(|n| n.text.trim().to_string()))
    }
}

/// Fragment source over a captured page.
pub struct SnapshotSource {
    snapshot: Arc<DomSnapshot>,
    max_fragments: usize,
}

impl SnapshotSource {
    pub fn new(snapshot: Arc<DomSnapshot>, max_fragments: usize) -> Self {
        Self {
            snapshot,
            max_fragments,
        }
    }
}

#[async_trait]
impl FragmentSource for SnapshotSource {
    async fn fetch_fragments(&self) -> Result<Vec<RawFragment>> {
        let t0 = std::time::Instant::now();
        let out = self.snapshot.fragments(self.max_fragments);
        histogram!("snapshot_extract_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        counter!("snapshot_fragments_total").increment(out.len() as u64);
        tracing::debug!(
            target: "pipeline",
            nodes = self.snapshot.len(),
            fragments = out.len(),
            "extracted fragments from snapshot"
        );
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "DomSnapshot"
    }
}
