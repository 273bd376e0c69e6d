// src/clean/mod.rs
//! Post cleaning stages: noise gate, content gate, confidence, dedup, author
//! recovery and final assembly.

pub mod assemble;
pub mod author;
pub mod content;
pub mod dedup;
pub mod noise;
pub mod scoring;

// Re-export convenient types.
pub use crate::clean::assemble::{ClassifiedPost, PostAssembler, SkipReason};
pub use crate::clean::author::{AuthorResolver, DomAuthorLookup};
pub use crate::clean::content::is_content;
pub use crate::clean::dedup::DedupTracker;
pub use crate::clean::noise::is_noise;
pub use crate::clean::scoring::confidence;
