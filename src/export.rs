// src/export.rs
//! Output artifacts for a finished run: primary JSON record, CSV mirror and
//! the statistics report. Given `X.json` the files are `X.json`, `X.csv` and
//! `X_report.json`.

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::clean::ClassifiedPost;
use crate::stats::RunStatistics;

pub const CSV_HEADER: &str = "ID,Text,Timestamp,Author,Selector,URL,Confidence";

/// The primary record handed to persistence.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeRecord<'a> {
    pub scraped_at: String,
    pub total_posts: usize,
    pub source: &'a str,
    pub method: &'a str,
    pub cleaning_stats: &'a RunStatistics,
    pub posts: &'a [ClassifiedPost],
}

impl<'a> ScrapeRecord<'a> {
    pub fn new(
        posts: &'a [ClassifiedPost],
        stats: &'a RunStatistics,
        source: &'a str,
        method: &'a str,
        scraped_at: DateTime<Utc>,
    ) -> Self {
        Self {
            scraped_at: scraped_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            total_posts: posts.len(),
            source,
            method,
            cleaning_stats: stats,
            posts,
        }
    }
}

/// Where the three artifacts of a run go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub json: PathBuf,
    pub csv: PathBuf,
    pub report: PathBuf,
}

impl ArtifactPaths {
    pub fn from_base(base: &Path) -> Self {
        let stem = base
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("posts")
            .to_string();
        let json = base.with_extension("json");
        let csv = base.with_extension("csv");
        let report = base.with_file_name(format!("{stem}_report.json"));
        Self { json, csv, report }
    }
}

fn csv_field(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Tabular mirror: every field quoted, embedded quotes doubled.
pub fn to_csv(posts: &[ClassifiedPost]) -> String {
    let mut out = String::with_capacity(64 * (posts.len() + 1));
    out.push_str(CSV_HEADER);
    out.push('\n');
    for p in posts {
        let row = [
            csv_field(&p.id),
            csv_field(&p.text),
            csv_field(&p.timestamp),
            csv_field(&p.author),
            csv_field(&p.selector),
            csv_field(&p.url),
            csv_field(&format!("{:.2}", p.confidence)),
        ];
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

/// Write all three artifacts. Returns the paths written.
pub async fn write_artifacts(base: &Path, record: &ScrapeRecord<'_>) -> Result<ArtifactPaths> {
    let paths = ArtifactPaths::from_base(base);

    if let Some(dir) = paths.json.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .await
            .with_context(|| format!("creating output dir {}", dir.display()))?;
    }

    let json = serde_json::to_string_pretty(record).context("serializing scrape record")?;
    write_atomic(&paths.json, json.as_bytes()).await?;

    write_atomic(&paths.csv, to_csv(record.posts).as_bytes()).await?;

    let report =
        serde_json::to_string_pretty(record.cleaning_stats).context("serializing report")?;
    write_atomic(&paths.report, report.as_bytes()).await?;

    tracing::info!(
        target: "export",
        json = %paths.json.display(),
        csv = %paths.csv.display(),
        report = %paths.report.display(),
        posts = record.total_posts,
        "artifacts written"
    );
    Ok(paths)
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("out");
    let tmp = path.with_extension(format!("{ext}.tmp"));
    fs::write(&tmp, bytes)
        .await
        .with_context(|| format!("writing {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .await
        .with_context(|| format!("renaming into {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(text: &str) -> ClassifiedPost {
        ClassifiedPost {
            id: "clean_post_1".into(),
            original_index: 0,
            text: text.into(),
            author: "Ann \"A\"".into(),
            timestamp: "2h".into(),
            url: "https://m.example.test/".into(),
            selector: String::new(),
            confidence: 0.6,
        }
    }

    #[test]
    fn csv_quotes_and_two_decimals() {
        let csv = to_csv(&[post("She said \"hi\", then left.")]);
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some(CSV_HEADER));
        assert_eq!(
            lines.next(),
            Some(
                r#""clean_post_1","She said ""hi"", then left.","2h","Ann ""A""","","https://m.example.test/","0.60""#
            )
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn artifact_paths_follow_base_name() {
        let p = ArtifactPaths::from_base(Path::new("out/feed_posts.json"));
        assert_eq!(p.json, PathBuf::from("out/feed_posts.json"));
        assert_eq!(p.csv, PathBuf::from("out/feed_posts.csv"));
        assert_eq!(p.report, PathBuf::from("out/feed_posts_report.json"));
    }
}
