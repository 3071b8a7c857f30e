use crate::generator::catalog::{generate_catalog, GeneratorConfig};
use anyhow::Context;
use chrono::{DateTime, Utc};
use orbitcore::catalog::source::DEFAULT_CATALOG_URL;
use orbitcore::catalog::{ElementSource, FileElementSource, HttpElementSource, StaticElementSource};
use orbitcore::PipelineConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 9000))
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub catalog_url: String,
    pub relay_url: Option<String>,
    pub tle_file: Option<PathBuf>,
    pub synthetic_count: Option<usize>,
    pub bind: SocketAddr,
    pub pipeline: PipelineConfig,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            relay_url: None,
            tle_file: None,
            synthetic_count: None,
            bind: default_bind_address(),
            pipeline: PipelineConfig::default(),
        }
    }
}

/// Command-line values that take precedence over the config file.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub catalog_url: Option<String>,
    pub relay_url: Option<String>,
    pub tle_file: Option<PathBuf>,
    pub synthetic_count: Option<usize>,
    pub filter_height_km: Option<f64>,
    pub bind: Option<SocketAddr>,
}

impl TrackerConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading tracker config {}", path_ref.display()))?;
        let config: TrackerConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing tracker config {}", path_ref.display()))?;
        config
            .pipeline
            .validate()
            .with_context(|| format!("validating tracker config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(overrides: ConfigOverrides) -> Self {
        Self::default().with_overrides(overrides)
    }

    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(url) = overrides.catalog_url {
            self.catalog_url = url;
        }
        if overrides.relay_url.is_some() {
            self.relay_url = overrides.relay_url;
        }
        if overrides.tle_file.is_some() {
            self.tle_file = overrides.tle_file;
        }
        if overrides.synthetic_count.is_some() {
            self.synthetic_count = overrides.synthetic_count;
        }
        if let Some(height) = overrides.filter_height_km {
            self.pipeline.filter_height_km = height;
        }
        if let Some(bind) = overrides.bind {
            self.bind = bind;
        }
        self
    }

    /// Element source selected by the config: a synthetic catalog first, then
    /// a local file, then the HTTP catalog service.
    pub fn source(&self, epoch: DateTime<Utc>) -> anyhow::Result<Arc<dyn ElementSource>> {
        if let Some(count) = self.synthetic_count {
            let text = generate_catalog(&GeneratorConfig::with_count(count), epoch)
                .context("generating synthetic catalog")?;
            return Ok(Arc::new(StaticElementSource::new(text)));
        }
        if let Some(path) = &self.tle_file {
            return Ok(Arc::new(FileElementSource::new(path.clone())));
        }
        let source = HttpElementSource::new(&self.catalog_url, self.relay_url.as_deref())
            .context("building catalog HTTP client")?;
        Ok(Arc::new(source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn overrides_win_over_defaults() {
        let cfg = TrackerConfig::from_args(ConfigOverrides {
            filter_height_km: Some(550.0),
            relay_url: Some("https://relay.example/?".into()),
            ..Default::default()
        });
        assert_eq!(cfg.pipeline.filter_height_km, 550.0);
        assert_eq!(cfg.relay_url.as_deref(), Some("https://relay.example/?"));
        assert_eq!(cfg.catalog_url, DEFAULT_CATALOG_URL);
        assert_eq!(cfg.bind, default_bind_address());
    }

    #[test]
    fn config_load_reads_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"synthetic_count: 40\nbind: 127.0.0.1:9100\npipeline:\n  refresh_period_secs: 30\n  filter_height_km: 500\n",
        )
        .unwrap();
        let path = temp.into_temp_path();
        let cfg = TrackerConfig::load(&path).unwrap();
        assert_eq!(cfg.synthetic_count, Some(40));
        assert_eq!(cfg.bind.port(), 9100);
        assert_eq!(cfg.pipeline.refresh_period_secs, 30);
        assert_eq!(cfg.pipeline.filter_height_km, 500.0);
        assert_eq!(cfg.pipeline.frame_rate_hz, 60);
    }

    #[test]
    fn config_load_rejects_invalid_pipeline() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"pipeline:\n  refresh_period_secs: 0\n").unwrap();
        let path = temp.into_temp_path();
        assert!(TrackerConfig::load(&path).is_err());
    }

    #[tokio::test]
    async fn synthetic_source_takes_precedence() {
        let cfg = TrackerConfig::from_args(ConfigOverrides {
            synthetic_count: Some(6),
            tle_file: Some(PathBuf::from("/nonexistent.tle")),
            ..Default::default()
        });
        let source = cfg.source(Utc::now()).unwrap();
        let text = source.fetch().await.unwrap();
        assert_eq!(orbitcore::catalog::group_count(&text), 6);
    }
}
