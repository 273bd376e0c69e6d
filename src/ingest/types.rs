// src/ingest/types.rs
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// One raw DOM container as observed by the browser collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RawFragment {
    pub source_index: usize, // container position on the page
    pub text: Option<String>,
    pub author: Option<String>,
    pub timestamp: Option<String>,
    #[serde(default)]
    pub page_url: String,
    #[serde(default)]
    pub origin_selector: String,
}

/// Delivers the finite fragment sequence for one scrape pass.
/// Pagination and scroll loading happen behind this trait.
#[async_trait::async_trait]
pub trait FragmentSource: Send + Sync {
    async fn fetch_fragments(&self) -> Result<Vec<RawFragment>>;
    fn name(&self) -> &'static str;
}

/// Best-effort author lookup against live page state: `search_text -> author`.
#[async_trait::async_trait]
pub trait AuthorLookup: Send + Sync {
    async fn lookup(&self, search_text: &str) -> Result<String>;
}

/// Opaque handle of a node owned by a [`DomQuery`] implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeRef(pub usize);

/// Minimal DOM capabilities needed for author recovery.
#[async_trait::async_trait]
pub trait DomQuery: Send + Sync {
    /// Text nodes whose trimmed text equals `text` exactly.
    async fn find_text_nodes(&self, text: &str) -> Result<Vec<NodeRef>>;
    /// Closest post container enclosing `node` (may be `node` itself).
    async fn closest_container(&self, node: NodeRef) -> Result<Option<NodeRef>>;
    async fn parent(&self, node: NodeRef) -> Result<Option<NodeRef>>;
    /// Text of the first author-link element inside `scope`, if any.
    async fn author_link_text(&self, scope: NodeRef) -> Result<Option<String>>;
}

#[async_trait::async_trait]
impl<T: DomQuery + ?Sized> DomQuery for std::sync::Arc<T> {
    async fn find_text_nodes(&self, text: &str) -> Result<Vec<NodeRef>> {
        (**self).find_text_nodes(text).await
    }
    async fn closest_container(&self, node: NodeRef) -> Result<Option<NodeRef>> {
        (**self).closest_container(node).await
    }
    async fn parent(&self, node: NodeRef) -> Result<Option<NodeRef>> {
        (**self).parent(node).await
    }
    async fn author_link_text(&self, scope: NodeRef) -> Result<Option<String>> {
        (**self).author_link_text(scope).await
    }
}
