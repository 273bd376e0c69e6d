//! Run statistics: read-only aggregate over the final post list.
//!
//! Computed once after the pipeline finishes. Serialized with camelCase keys
//! because it is written verbatim into the report artifacts.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::clean::ClassifiedPost;

pub const HIGH_CONFIDENCE: f64 = 0.8;
pub const MEDIUM_CONFIDENCE: f64 = 0.5;
const TOP_TEXT_CHARS: usize = 100;
const TOP_AUTHORS: usize = 10;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunStatistics {
    pub summary: Summary,
    pub top_posts: Vec<TopPost>,
    pub quality_distribution: QualityDistribution,
    pub author_stats: AuthorStats,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub cleaned_posts: usize,
    pub processing_date: String,
    pub method: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TopPost {
    pub rank: usize,
    pub confidence: String, // two decimals, e.g. "0.90"
    pub text: String,
    pub author: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QualityDistribution {
    pub high_confidence: usize,
    pub medium_confidence: usize,
    pub low_confidence: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuthorCount {
    pub author: String,
    pub post_count: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuthorStats {
    pub total_authors: usize,
    pub posts_with_author: usize,
    pub posts_without_author: usize,
    pub author_coverage: String, // "70.0%"
    pub top_authors: Vec<AuthorCount>,
}

impl RunStatistics {
    pub fn compute(
        posts: &[ClassifiedPost],
        method: &str,
        top_n: usize,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            summary: Summary {
                cleaned_posts: posts.len(),
                processing_date: now.to_rfc3339_opts(SecondsFormat::Millis, true),
                method: method.to_string(),
            },
            top_posts: top_posts(posts, top_n),
            quality_distribution: quality_distribution(posts),
            author_stats: author_stats(posts),
        }
    }
}

pub fn quality_distribution(posts: &[ClassifiedPost]) -> QualityDistribution {
    let mut q = QualityDistribution::default();
    for p in posts {
        if p.confidence >= HIGH_CONFIDENCE {
            q.high_confidence += 1;
        } else if p.confidence >= MEDIUM_CONFIDENCE {
            q.medium_confidence += 1;
        } else {
            q.low_confidence += 1;
        }
    }
    q
}

/// Best `n` posts by confidence, ties kept in discovery order.
/// Does not reorder the caller's list.
pub fn top_posts(posts: &[ClassifiedPost], n: usize) -> Vec<TopPost> {
    let mut ranked: Vec<&ClassifiedPost> = posts.iter().collect();
    // stable sort keeps discovery order among equal scores
    ranked.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    ranked
        .into_iter()
        .take(n)
        .enumerate()
        .map(|(i, p)| TopPost {
            rank: i + 1,
            confidence: format!("{:.2}", p.confidence),
            text: preview(&p.text, TOP_TEXT_CHARS),
            author: p.author.clone(),
            timestamp: p.timestamp.clone(),
        })
        .collect()
}

pub fn author_stats(posts: &[ClassifiedPost]) -> AuthorStats {
    // insertion-ordered counts so equal counts rank by first appearance
    let mut counts: Vec<AuthorCount> = Vec::new();
    let mut with_author = 0usize;

    for p in posts {
        let name = p.author.trim();
        if name.is_empty() {
            continue;
        }
        with_author += 1;
        match counts.iter_mut().find(|c| c.author == p.author) {
            Some(c) => c.post_count += 1,
            None => counts.push(AuthorCount {
                author: p.author.clone(),
                post_count: 1,
            }),
        }
    }

    let total_authors = counts.len();
    counts.sort_by(|a, b| b.post_count.cmp(&a.post_count));
    counts.truncate(TOP_AUTHORS);

    AuthorStats {
        total_authors,
        posts_with_author: with_author,
        posts_without_author: posts.len() - with_author,
        author_coverage: coverage(with_author, posts.len()),
        top_authors: counts,
    }
}

/// Percentage with one decimal and a `%` suffix; an empty set is "0.0%".
pub fn coverage(part: usize, total: usize) -> String {
    if total == 0 {
        return "0.0%".to_string();
    }
    format!("{:.1}%", part as f64 / total as f64 * 100.0)
}

fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let head: String = text.chars().take(max_chars).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn post(i: usize, author: &str, confidence: f64) -> ClassifiedPost {
        ClassifiedPost {
            id: format!("clean_post_{}", i + 1),
            original_index: i,
            text: format!("post number {i} with some words."),
            author: author.to_string(),
            timestamp: String::new(),
            url: String::new(),
            selector: String::new(),
            confidence,
        }
    }

    #[test]
    fn coverage_of_ten_with_seven_authors() {
        let posts: Vec<_> = (0..10)
            .map(|i| post(i, if i < 7 { "Ann" } else { "" }, 0.5))
            .collect();
        let a = author_stats(&posts);
        assert_eq!(a.author_coverage, "70.0%");
        assert_eq!(a.posts_with_author, 7);
        assert_eq!(a.posts_without_author, 3);
        assert_eq!(a.total_authors, 1);
        assert_eq!(coverage(0, 0), "0.0%");
        assert_eq!(coverage(1, 3), "33.3%");
    }

    #[test]
    fn buckets_use_inclusive_lower_bounds() {
        let posts = vec![
            post(0, "a", 0.8),
            post(1, "a", 0.79),
            post(2, "a", 0.5),
            post(3, "a", 0.49),
            post(4, "a", 1.0),
        ];
        let q = quality_distribution(&posts);
        assert_eq!(q.high_confidence, 2);
        assert_eq!(q.medium_confidence, 2);
        assert_eq!(q.low_confidence, 1);
    }

    #[test]
    fn top_posts_stable_and_bounded() {
        let mut posts: Vec<_> = (0..12).map(|i| post(i, "a", 0.6)).collect();
        posts[5].confidence = 0.9;
        posts[9].confidence = 0.9;
        let top = top_posts(&posts, 10);
        assert_eq!(top.len(), 10);
        assert_eq!(top[0].confidence, "0.90");
        assert!(top[0].text.contains("number 5"));
        assert!(top[1].text.contains("number 9"));
        assert!(top[2].text.contains("number 0"));
        assert_eq!(top[9].rank, 10);
        // caller order untouched
        assert_eq!(posts[0].original_index, 0);
    }

    #[test]
    fn top_authors_by_count_then_first_seen() {
        let posts = vec![
            post(0, "Budi", 0.5),
            post(1, "Ann", 0.5),
            post(2, "Ann", 0.5),
            post(3, "Cy", 0.5),
            post(4, "Budi", 0.5),
        ];
        let a = author_stats(&posts);
        let names: Vec<_> = a.top_authors.iter().map(|c| c.author.as_str()).collect();
        assert_eq!(names, vec!["Budi", "Ann", "Cy"]);
        assert_eq!(a.top_authors[0].post_count, 2);
    }

    #[test]
    fn long_text_is_previewed_and_serialized_camel_case() {
        let mut p = post(0, "Ann", 0.7);
        p.text = "y".repeat(150);
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 8, 0, 0).unwrap();
        let stats = RunStatistics::compute(&[p], "test", 10, now);
        assert_eq!(stats.top_posts[0].text.chars().count(), 103);
        assert!(stats.top_posts[0].text.ends_with("..."));

        let v = serde_json::to_value(&stats).unwrap();
        assert_eq!(v["summary"]["cleanedPosts"], 1);
        assert_eq!(v["summary"]["processingDate"], "2026-10-19T08:00:00.000Z");
        assert_eq!(v["qualityDistribution"]["mediumConfidence"], 1);
        assert_eq!(v["authorStats"]["authorCoverage"], "100.0%");
    }
}
