// src/config/pipeline.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::clean::assemble::DEFAULT_UNWANTED_SELECTOR;

pub const DEFAULT_CONFIG_PATH: &str = "config/cleaner.toml";

pub const ENV_CONFIG_PATH: &str = "CLEANER_CONFIG_PATH";
pub const ENV_SOURCE_URL: &str = "TARGET_PROFILE_URL";
pub const ENV_MAX_FRAGMENTS: &str = "MAX_POSTS_TO_SCRAPE";
pub const ENV_OUTPUT_PATH: &str = "OUTPUT_PATH";

fn default_source_url() -> String {
    "https://m.facebook.com/me".to_string()
}
fn default_method() -> String {
    "CDP Session (Mobile) + Advanced Cleaning".to_string()
}
fn default_max_fragments() -> usize {
    50
}
fn default_author_search_chars() -> usize {
    100
}
fn default_author_max_depth() -> usize {
    5
}
fn default_top_n() -> usize {
    10
}
fn default_unwanted_selectors() -> Vec<String> {
    vec![DEFAULT_UNWANTED_SELECTOR.to_string()]
}
fn default_output_path() -> PathBuf {
    PathBuf::from("facebook_feed_posts.json")
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineConfig {
    /// Page the fragments were scraped from; reported as `source`.
    #[serde(default = "default_source_url")]
    pub source_url: String,
    #[serde(default = "default_method")]
    pub method: String,
    /// Upper bound on fragments taken from one scrape pass.
    #[serde(default = "default_max_fragments")]
    pub max_fragments: usize,
    /// Leading chars of a post used to search the page for its author.
    #[serde(default = "default_author_search_chars")]
    pub author_search_chars: usize,
    /// Ancestor hops tried from a matching text node.
    #[serde(default = "default_author_max_depth")]
    pub author_max_depth: usize,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default = "default_unwanted_selectors")]
    pub unwanted_selectors: Vec<String>,
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source_url: default_source_url(),
            method: default_method(),
            max_fragments: default_max_fragments(),
            author_search_chars: default_author_search_chars(),
            author_max_depth: default_author_max_depth(),
            top_n: default_top_n(),
            unwanted_selectors: default_unwanted_selectors(),
            output_path: default_output_path(),
        }
    }
}

impl PipelineConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: PipelineConfig = toml::from_str(s).context("parsing cleaner config")?;
        Ok(cfg.sanitized())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading cleaner config from {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Resolve config using env var + fallbacks, then apply env overrides:
    /// 1) $CLEANER_CONFIG_PATH (must exist)
    /// 2) config/cleaner.toml
    /// 3) built-in defaults
    pub fn load_default() -> Result<Self> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from(&pb)?
        } else {
            let default_p = PathBuf::from(DEFAULT_CONFIG_PATH);
            if default_p.exists() {
                Self::load_from(&default_p)?
            } else {
                tracing::debug!(target: "config", "no config file, using defaults");
                Self::default()
            }
        };
        cfg.apply_env_overrides();
        Ok(cfg.sanitized())
    }

    fn apply_env_overrides(&mut self) {
        if let Some(url) = non_empty_env(ENV_SOURCE_URL) {
            self.source_url = url;
        }
        if let Some(n) = parse_usize_env(std::env::var(ENV_MAX_FRAGMENTS).ok()) {
            self.max_fragments = n;
        }
        if let Some(p) = non_empty_env(ENV_OUTPUT_PATH) {
            self.output_path = PathBuf::from(p);
        }
    }

    /// Zero bounds make no sense for the lookup; fall back to defaults.
    fn sanitized(mut self) -> Self {
        if self.author_search_chars == 0 {
            self.author_search_chars = default_author_search_chars();
        }
        if self.author_max_depth == 0 {
            self.author_max_depth = default_author_max_depth();
        }
        if self.max_fragments == 0 {
            self.max_fragments = default_max_fragments();
        }
        self.unwanted_selectors.retain(|s| !s.trim().is_empty());
        self
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// parse optional positive integer env
fn parse_usize_env(raw: Option<String>) -> Option<usize> {
    raw.and_then(|s| s.trim().parse::<usize>().ok())
        .filter(|n| *n > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{env, fs};

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = PipelineConfig::from_toml_str(
            r#"
            max_fragments = 20
            author_max_depth = 0
            unwanted_selectors = ["", "div.bad"]
            "#,
        )
        .unwrap();
        assert_eq!(cfg.max_fragments, 20);
        assert_eq!(cfg.author_max_depth, 5);
        assert_eq!(cfg.author_search_chars, 100);
        assert_eq!(cfg.top_n, 10);
        assert_eq!(cfg.unwanted_selectors, vec!["div.bad".to_string()]);
        assert_eq!(cfg.source_url, "https://m.facebook.com/me");
    }

    #[test]
    fn env_int_parsing_ignores_garbage() {
        assert_eq!(parse_usize_env(Some(" 30 ".into())), Some(30));
        assert_eq!(parse_usize_env(Some("0".into())), None);
        assert_eq!(parse_usize_env(Some("lots".into())), None);
        assert_eq!(parse_usize_env(None), None);
    }

    #[serial_test::serial]
    #[test]
    fn default_uses_env_then_fallbacks() {
        // isolate CWD so a real config/ in the repo does not interfere
        let old = env::current_dir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        env::set_current_dir(tmp.path()).unwrap();
        env::remove_var(ENV_CONFIG_PATH);
        env::remove_var(ENV_MAX_FRAGMENTS);
        env::remove_var(ENV_SOURCE_URL);
        env::remove_var(ENV_OUTPUT_PATH);

        // no files → defaults
        let cfg = PipelineConfig::load_default().unwrap();
        assert_eq!(cfg, PipelineConfig::default());

        // explicit path wins, env overrides on top
        let p = tmp.path().join("custom.toml");
        fs::write(&p, "top_n = 3\nmax_fragments = 7\n").unwrap();
        env::set_var(ENV_CONFIG_PATH, p.display().to_string());
        env::set_var(ENV_MAX_FRAGMENTS, "12");
        env::set_var(ENV_SOURCE_URL, "https://m.example.test/someone");
        let cfg = PipelineConfig::load_default().unwrap();
        assert_eq!(cfg.top_n, 3);
        assert_eq!(cfg.max_fragments, 12);
        assert_eq!(cfg.source_url, "https://m.example.test/someone");

        // explicit path that does not exist is an error
        env::set_var(ENV_CONFIG_PATH, tmp.path().join("missing.toml"));
        assert!(PipelineConfig::load_default().is_err());

        env::remove_var(ENV_CONFIG_PATH);
        env::remove_var(ENV_MAX_FRAGMENTS);
        env::remove_var(ENV_SOURCE_URL);
        env::set_current_dir(&old).unwrap();
    }
}
