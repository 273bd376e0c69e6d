// src/ingest/providers/mod.rs
pub mod snapshot;

pub use snapshot::{DomNode, DomSnapshot, SnapshotSource};
