use crate::workflow::config::TrackerConfig;
use anyhow::Context;
use chrono::{DateTime, Utc};
use orbitcore::catalog::ElementSource;
use orbitcore::{compute_fixes, parse_catalog, SatelliteFix, TrackError, VisibleSet};
use std::sync::Arc;

pub struct WorkflowResult {
    pub evaluated_at: DateTime<Utc>,
    pub object_count: usize,
    pub dropped_count: usize,
    pub fix_count: usize,
    pub visible: VisibleSet,
}

impl WorkflowResult {
    pub fn visible_count(&self) -> usize {
        self.visible.len()
    }

    pub fn leading_fixes(&self, limit: usize) -> &[SatelliteFix] {
        &self.visible.fixes[..limit.min(self.visible.len())]
    }
}

/// One-shot evaluation of a refresh cycle without the scheduler.
#[derive(Clone)]
pub struct Runner {
    config: TrackerConfig,
    source: Arc<dyn ElementSource>,
}

impl Runner {
    pub fn new(config: TrackerConfig, source: Arc<dyn ElementSource>) -> Self {
        Self { config, source }
    }

    pub async fn execute(&self, instant: DateTime<Utc>) -> anyhow::Result<WorkflowResult> {
        let text = self
            .source
            .fetch()
            .await
            .with_context(|| format!("fetching elements from {}", self.source.describe()))?;

        let snapshot = parse_catalog(&text);
        if snapshot.is_empty() {
            return Err(TrackError::EmptyCatalog).context("parsing element catalog");
        }

        let pipeline = &self.config.pipeline;
        let fixes = compute_fixes(&snapshot, instant, pipeline.surface_radius);
        let threshold = orbitcore::prelude::normalize_filter_height(pipeline.filter_height_km);
        let visible = VisibleSet::filter(&fixes, threshold, instant);

        Ok(WorkflowResult {
            evaluated_at: instant,
            object_count: snapshot.len(),
            dropped_count: snapshot.dropped(),
            fix_count: fixes.len(),
            visible,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::config::ConfigOverrides;
    use chrono::TimeZone;
    use orbitcore::catalog::StaticElementSource;

    fn instant() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 6, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn runner_evaluates_synthetic_catalog() {
        let cfg = TrackerConfig::from_args(ConfigOverrides {
            synthetic_count: Some(30),
            filter_height_km: Some(800.0),
            ..Default::default()
        });
        let runner = Runner::new(cfg.clone(), cfg.source(instant()).unwrap());
        let result = runner.execute(instant()).await.unwrap();

        assert_eq!(result.object_count, 30);
        assert_eq!(result.fix_count, 30);
        // Only the 1150 km shell clears 800 km.
        assert_eq!(result.visible_count(), 10);
        assert!(result.visible.fixes.iter().all(|fix| fix.height_km >= 800.0));
        assert_eq!(result.leading_fixes(3).len(), 3);
    }

    #[tokio::test]
    async fn unusable_text_is_an_error() {
        let cfg = TrackerConfig::default();
        let runner = Runner::new(cfg, Arc::new(StaticElementSource::new("not\nan\nelement set\n")));
        assert!(runner.execute(instant()).await.is_err());
    }
}
