// src/ingest/mod.rs
pub mod providers;
pub mod types;

use crate::clean::{AuthorResolver, ClassifiedPost, PostAssembler, SkipReason};
use crate::config::PipelineConfig;
use crate::ingest::types::{AuthorLookup, FragmentSource, RawFragment};
use crate::logging::anon_hash;
use crate::stats::RunStatistics;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::OnceCell;
use serde::Serialize;

/// One-time metrics registration (descriptions appear in the Prometheus dump).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "pipeline_fragments_total",
            "Raw fragments received from the fragment source."
        );
        describe_counter!("pipeline_kept_total", "Fragments emitted as clean posts.");
        describe_counter!(
            "pipeline_skipped_total",
            "Fragments rejected, labelled by skip reason."
        );
        describe_counter!(
            "pipeline_source_errors_total",
            "Fragment source fetch errors."
        );
        describe_counter!("author_lookup_total", "Author lookups issued against the page.");
        describe_counter!(
            "author_lookup_resolved_total",
            "Author lookups that returned a name."
        );
        describe_counter!("author_lookup_errors_total", "Author lookups that failed.");
        describe_histogram!("pipeline_run_ms", "Pipeline processing time in milliseconds.");
        describe_gauge!(
            "pipeline_last_run_ts",
            "Unix ts when the pipeline last ran."
        );
    });
}

/// Normalize text: trim, drop invisible chars, collapse whitespace (newlines kept).
/// Absent input normalizes to the empty string. Idempotent.
pub fn normalize_text<'a>(s: impl Into<Option<&'a str>>) -> String {
    let Some(s) = s.into() else {
        return String::new();
    };

    // 1) Zero-width and control chars. Stripped before collapsing so that
    //    removing them can never leave a fresh whitespace run behind.
    static RE_INVISIBLE: OnceCell<regex::Regex> = OnceCell::new();
    let re_invisible = RE_INVISIBLE.get_or_init(|| {
        regex::Regex::new(r"[[\x{200B}-\x{200F}\x{2060}-\x{2064}\x{FEFF}\p{Cc}]&&[^\n\r\t]]")
            .unwrap()
    });
    let out = re_invisible.replace_all(s.trim(), "");

    // 2) Collapse whitespace runs except line breaks
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"[^\S\r\n]+").unwrap());
    let out = re_ws.replace_all(&out, " ");

    out.trim().to_string()
}

/// Per-reason rejection counts for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkipCounts {
    pub empty: usize,
    pub noise: usize,
    pub not_content: usize,
    pub duplicate: usize,
    pub missing_author: usize,
}

impl SkipCounts {
    pub fn record(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::Empty => self.empty += 1,
            SkipReason::Noise => self.noise += 1,
            SkipReason::NotContent => self.not_content += 1,
            SkipReason::Duplicate => self.duplicate += 1,
            SkipReason::MissingAuthor => self.missing_author += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.empty + self.noise + self.not_content + self.duplicate + self.missing_author
    }
}

/// Everything one pipeline pass produces.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub fragments_seen: usize,
    pub posts: Vec<ClassifiedPost>,
    pub skipped: SkipCounts,
    pub stats: RunStatistics,
}

impl RunOutcome {
    /// Zero posts is a valid outcome: nothing on the page qualified.
    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}

/// Feed fragments through the assembler strictly in order, one at a time.
/// Rejections are logged and counted; nothing here aborts the run.
pub async fn process_fragments(
    fragments: Vec<RawFragment>,
    lookup: &dyn AuthorLookup,
    cfg: &PipelineConfig,
) -> RunOutcome {
    ensure_metrics_described();
    let t0 = std::time::Instant::now();

    let resolver = AuthorResolver::new(lookup, cfg.author_search_chars);
    let mut assembler = PostAssembler::new(resolver, &cfg.unwanted_selectors);
    let mut posts = Vec::new();
    let mut skipped = SkipCounts::default();

    counter!("pipeline_fragments_total").increment(fragments.len() as u64);

    for (position, fragment) in fragments.iter().enumerate() {
        match assembler.assemble(position, fragment).await {
            Ok(post) => {
                tracing::debug!(
                    target: "pipeline",
                    position,
                    id = %post.id,
                    text_id = %anon_hash(&post.text),
                    confidence = post.confidence,
                    "kept post"
                );
                posts.push(post);
            }
            Err(reason) => {
                tracing::debug!(
                    target: "pipeline",
                    position,
                    source_index = fragment.source_index,
                    text_id = %anon_hash(fragment.text.as_deref().unwrap_or_default()),
                    %reason,
                    "skipped fragment"
                );
                counter!("pipeline_skipped_total", "reason" => reason.as_str()).increment(1);
                skipped.record(reason);
            }
        }
    }

    counter!("pipeline_kept_total").increment(posts.len() as u64);
    let now = chrono::Utc::now();
    gauge!("pipeline_last_run_ts").set(now.timestamp().max(0) as f64);
    histogram!("pipeline_run_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

    let stats = RunStatistics::compute(&posts, &cfg.method, cfg.top_n, now);

    tracing::info!(
        target: "pipeline",
        fragments = fragments.len(),
        kept = posts.len(),
        skipped = skipped.total(),
        noise = skipped.noise,
        not_content = skipped.not_content,
        duplicate = skipped.duplicate,
        missing_author = skipped.missing_author,
        "cleaning complete"
    );

    RunOutcome {
        fragments_seen: fragments.len(),
        posts,
        skipped,
        stats,
    }
}

/// Run the pipeline once: fetch the finite fragment sequence, then process it.
/// A failing source is logged and treated as an empty page.
pub async fn run_once(
    source: &dyn FragmentSource,
    lookup: &dyn AuthorLookup,
    cfg: &PipelineConfig,
) -> RunOutcome {
    ensure_metrics_described();

    let fragments = match source.fetch_fragments().await {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(target: "pipeline", error = ?e, source = source.name(), "fragment source error");
            counter!("pipeline_source_errors_total").increment(1);
            Vec::new()
        }
    };

    process_fragments(fragments, lookup, cfg).await
}
