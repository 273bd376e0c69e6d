use anyhow::{Context, Result};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::path::{Path, PathBuf};

pub const ENV_METRICS_DUMP: &str = "METRICS_DUMP";

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder for this process.
    pub fn init() -> Result<Self> {
        // Use default buckets to avoid API differences across crate versions.
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;
        Ok(Self { handle })
    }

    /// Recorder only when `METRICS_DUMP=1`.
    pub fn init_from_env() -> Result<Option<Self>> {
        let on = std::env::var(ENV_METRICS_DUMP).ok().as_deref() == Some("1");
        if on {
            Self::init().map(Some)
        } else {
            Ok(None)
        }
    }

    /// Prometheus exposition text.
    pub fn render(&self) -> String {
        self.handle.render()
    }

    /// `X.json` → `X_metrics.prom`
    pub fn dump_path(base: &Path) -> PathBuf {
        let stem = base
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("posts");
        base.with_file_name(format!("{stem}_metrics.prom"))
    }

    pub async fn dump_next_to(&self, base: &Path) -> Result<PathBuf> {
        let path = Self::dump_path(base);
        tokio::fs::write(&path, self.render())
            .await
            .with_context(|| format!("writing metrics to {}", path.display()))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dump_path_sits_next_to_output() {
        assert_eq!(
            Metrics::dump_path(Path::new("out/feed.json")),
            PathBuf::from("out/feed_metrics.prom")
        );
    }
}
