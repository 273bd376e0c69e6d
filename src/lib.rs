// src/lib.rs
//! Public library surface for the binary and integration tests.
//!
//! Fragments scraped from a social-feed page go in; clean, deduplicated,
//! confidence-scored posts and run statistics come out.

pub mod clean;
pub mod config;
pub mod export;
pub mod ingest;
pub mod logging;
pub mod metrics;
pub mod stats;

// ---- Re-exports for stable public API ----
pub use crate::clean::{ClassifiedPost, SkipReason};
pub use crate::config::PipelineConfig;
pub use crate::ingest::types::{AuthorLookup, DomQuery, FragmentSource, NodeRef, RawFragment};
pub use crate::ingest::{normalize_text, process_fragments, run_once, RunOutcome, SkipCounts};
pub use crate::stats::RunStatistics;

use std::path::Path;
use std::sync::Arc;

use crate::clean::DomAuthorLookup;
use crate::export::{ArtifactPaths, ScrapeRecord};
use crate::ingest::providers::{DomSnapshot, SnapshotSource};

/// Clean a captured page end to end and write the artifacts to `cfg.output_path`.
///
/// Returns the run outcome and the written paths. An empty outcome is not an error.
pub async fn clean_snapshot_file(
    snapshot_path: &Path,
    cfg: &PipelineConfig,
) -> anyhow::Result<(RunOutcome, ArtifactPaths)> {
    let snapshot = Arc::new(DomSnapshot::load(snapshot_path).await?);
    let source = SnapshotSource::new(Arc::clone(&snapshot), cfg.max_fragments);
    let lookup = DomAuthorLookup::new(snapshot, cfg.author_max_depth);

    let outcome = run_once(&source, &lookup, cfg).await;

    let record = ScrapeRecord::new(
        &outcome.posts,
        &outcome.stats,
        &cfg.source_url,
        &cfg.method,
        chrono::Utc::now(),
    );
    let paths = export::write_artifacts(&cfg.output_path, &record).await?;
    Ok((outcome, paths))
}
