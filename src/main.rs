//! Feed post cleaner: binary entrypoint.
//! Cleans a captured feed page (DOM snapshot JSON) and writes JSON/CSV/report artifacts.
//!
//! Usage: `feed-post-cleaner [snapshot.json]` (or `FEED_SNAPSHOT_PATH`).

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{info, warn};

use feed_post_cleaner::{clean_snapshot_file, logging, metrics::Metrics, PipelineConfig};

const ENV_SNAPSHOT_PATH: &str = "FEED_SNAPSHOT_PATH";
const PREVIEW_POSTS: usize = 5;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    logging::init_tracing();

    let snapshot_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var(ENV_SNAPSHOT_PATH).ok())
        .map(PathBuf::from)
        .context("usage: feed-post-cleaner <snapshot.json> (or set FEED_SNAPSHOT_PATH)")?;

    let cfg = PipelineConfig::load_default().context("loading cleaner config")?;
    let metrics = Metrics::init_from_env()?;

    let (outcome, paths) = clean_snapshot_file(&snapshot_path, &cfg).await?;

    if outcome.is_empty() {
        warn!(
            fragments = outcome.fragments_seen,
            "no qualifying content this run"
        );
    } else {
        info!(
            posts = outcome.posts.len(),
            fragments = outcome.fragments_seen,
            coverage = %outcome.stats.author_stats.author_coverage,
            json = %paths.json.display(),
            "cleaning finished"
        );
        for (i, post) in outcome.posts.iter().take(PREVIEW_POSTS).enumerate() {
            info!(
                rank = i + 1,
                id = %post.id,
                author = %post.author,
                timestamp = if post.timestamp.is_empty() {
                    "unknown"
                } else {
                    post.timestamp.as_str()
                },
                chars = post.text.chars().count(),
                text_id = %logging::anon_hash(&post.text),
                confidence = post.confidence,
                "preview"
            );
        }
        if outcome.posts.len() > PREVIEW_POSTS {
            info!(more = outcome.posts.len() - PREVIEW_POSTS, "preview truncated");
        }
    }

    if let Some(m) = metrics {
        let p = m.dump_next_to(&cfg.output_path).await?;
        info!(path = %p.display(), "metrics dumped");
    }

    Ok(())
}
