//! Author recovery for fragments that arrive without attribution.
//!
//! Two layers:
//! - [`DomAuthorLookup`] turns a [`DomQuery`] collaborator into an [`AuthorLookup`]
//!   by walking a bounded number of ancestors up from each matching text node.
//! - [`AuthorResolver`] is what the pipeline calls: it bounds the search text,
//!   awaits the lookup and turns every collaborator error into "no author".

use metrics::counter;
use tracing::{debug, warn};

use crate::ingest::normalize_text;
use crate::ingest::types::{AuthorLookup, DomQuery};
use crate::logging::anon_hash;

/// Fragment authors shorter than this (chars) are treated as missing.
pub const MIN_AUTHOR_CHARS: usize = 2;

/// Ancestor walk over a DOM collaborator.
pub struct DomAuthorLookup<D: DomQuery> {
    dom: D,
    max_depth: usize,
}

impl<D: DomQuery> DomAuthorLookup<D> {
    pub fn new(dom: D, max_depth: usize) -> Self {
        Self {
            dom,
            max_depth: max_depth.max(1),
        }
    }
}

#[async_trait::async_trait]
impl<D: DomQuery> AuthorLookup for DomAuthorLookup<D> {
    async fn lookup(&self, search_text: &str) -> anyhow::Result<String> {
        let hits = self.dom.find_text_nodes(search_text).await?;
        for node in hits {
            let mut scope = self.dom.closest_container(node).await?;
            for _ in 0..self.max_depth {
                let Some(current) = scope else {
                    break;
                };
                if let Some(name) = self.dom.author_link_text(current).await? {
                    let name = name.trim();
                    if !name.is_empty() {
                        return Ok(name.to_string());
                    }
                }
                scope = self.dom.parent(current).await?;
            }
        }
        Ok(String::new())
    }
}

/// Best-effort author resolution used by the assembler.
pub struct AuthorResolver<'a> {
    lookup: &'a dyn AuthorLookup,
    search_chars: usize,
}

impl<'a> AuthorResolver<'a> {
    pub fn new(lookup: &'a dyn AuthorLookup, search_chars: usize) -> Self {
        Self {
            lookup,
            search_chars: search_chars.max(1),
        }
    }

    /// Fragment author when usable, else a lookup on the first `search_chars`
    /// chars of `text`. Empty string means "no author".
    pub async fn resolve(&self, fragment_author: Option<&str>, text: &str) -> String {
        let own = normalize_text(fragment_author);
        if own.chars().count() >= MIN_AUTHOR_CHARS {
            return own;
        }
        self.lookup_author(text).await
    }

    /// Collaborator query only. Errors are logged and swallowed.
    pub async fn lookup_author(&self, text: &str) -> String {
        let search: String = text.chars().take(self.search_chars).collect();
        counter!("author_lookup_total").increment(1);
        match self.lookup.lookup(&search).await {
            Ok(found) => {
                let found = normalize_text(found.as_str());
                if found.is_empty() {
                    debug!(target: "author", id = %anon_hash(text), "no author near text");
                } else {
                    counter!("author_lookup_resolved_total").increment(1);
                }
                found
            }
            Err(e) => {
                warn!(target: "author", id = %anon_hash(text), error = ?e, "author lookup failed");
                counter!("author_lookup_errors_total").increment(1);
                String::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::NodeRef;
    use anyhow::anyhow;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Tiny in-memory tree: parent links plus author labels per node.
    #[derive(Default)]
    struct FakeDom {
        parents: HashMap<usize, usize>,
        texts: HashMap<usize, String>,
        authors: HashMap<usize, String>,
        containers: HashMap<usize, usize>,
    }

    #[async_trait::async_trait]
    impl DomQuery for FakeDom {
        async fn find_text_nodes(&self, text: &str) -> anyhow::Result<Vec<NodeRef>> {
            let mut ids: Vec<usize> = self
                .texts
                .iter()
                .filter(|(_, t)| t.as_str() == text)
                .map(|(id, _)| *id)
                .collect();
            ids.sort();
            Ok(ids.into_iter().map(NodeRef).collect())
        }
        async fn closest_container(&self, node: NodeRef) -> anyhow::Result<Option<NodeRef>> {
            Ok(Some(NodeRef(*self.containers.get(&node.0).unwrap_or(&node.0))))
        }
        async fn parent(&self, node: NodeRef) -> anyhow::Result<Option<NodeRef>> {
            Ok(self.parents.get(&node.0).copied().map(NodeRef))
        }
        async fn author_link_text(&self, scope: NodeRef) -> anyhow::Result<Option<String>> {
            Ok(self.authors.get(&scope.0).cloned())
        }
    }

    /// Chain 10 -> 9 -> ... -> 0 with the text on node 10.
    fn chain_with_author_at(level: usize) -> FakeDom {
        let mut dom = FakeDom::default();
        for id in 1..=10 {
            dom.parents.insert(id, id - 1);
        }
        dom.texts.insert(10, "Some long post text".into());
        dom.authors.insert(10 - level, "Fansleslar".into());
        dom
    }

    #[tokio::test]
    async fn finds_author_within_depth() {
        let lookup = DomAuthorLookup::new(chain_with_author_at(4), 5);
        assert_eq!(lookup.lookup("Some long post text").await.unwrap(), "Fansleslar");
    }

    #[tokio::test]
    async fn stops_after_max_depth() {
        let lookup = DomAuthorLookup::new(chain_with_author_at(5), 5);
        assert_eq!(lookup.lookup("Some long post text").await.unwrap(), "");
    }

    #[tokio::test]
    async fn no_matching_text_means_no_author() {
        let lookup = DomAuthorLookup::new(chain_with_author_at(0), 5);
        assert_eq!(lookup.lookup("other text").await.unwrap(), "");
    }

    struct Failing;

    #[async_trait::async_trait]
    impl AuthorLookup for Failing {
        async fn lookup(&self, _search_text: &str) -> anyhow::Result<String> {
            Err(anyhow!("page detached"))
        }
    }

    struct Recording {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl AuthorLookup for Recording {
        async fn lookup(&self, search_text: &str) -> anyhow::Result<String> {
            self.seen.lock().unwrap().push(search_text.to_string());
            Ok("  Budi  ".into())
        }
    }

    #[tokio::test]
    async fn errors_are_swallowed() {
        let failing = Failing;
        let resolver = AuthorResolver::new(&failing, 100);
        assert_eq!(resolver.resolve(None, "whatever text").await, "");
    }

    #[tokio::test]
    async fn own_author_skips_lookup_and_search_is_bounded() {
        let rec = Recording {
            seen: Mutex::new(Vec::new()),
        };
        let resolver = AuthorResolver::new(&rec, 100);

        assert_eq!(resolver.resolve(Some(" Alice "), "text").await, "Alice");
        assert!(rec.seen.lock().unwrap().is_empty());

        let long = "x".repeat(250);
        assert_eq!(resolver.resolve(Some("A"), &long).await, "Budi");
        let seen = rec.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].chars().count(), 100);
    }
}
