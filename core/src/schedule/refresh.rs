use crate::catalog::parser::parse_catalog;
use crate::catalog::snapshot::FleetSnapshot;
use crate::catalog::source::ElementSource;
use crate::prelude::{TrackError, TrackResult};
use crate::propagation::filter::VisibleSet;
use crate::propagation::fix::compute_fixes;
use crate::schedule::clock::Clock;
use crate::schedule::state::{SchedulerPhase, SharedView};
use crate::telemetry::{LogManager, MetricsRecorder};
use std::sync::Arc;

/// Slow periodic tick: fetch, parse, propagate the whole fleet for "now",
/// filter, publish.
pub struct RefreshCycle {
    source: Arc<dyn ElementSource>,
    clock: Arc<dyn Clock>,
    metrics: Arc<MetricsRecorder>,
    surface_radius: f64,
    logger: LogManager,
}

impl RefreshCycle {
    pub fn new(
        source: Arc<dyn ElementSource>,
        clock: Arc<dyn Clock>,
        metrics: Arc<MetricsRecorder>,
        surface_radius: f64,
    ) -> Self {
        Self {
            source,
            clock,
            metrics,
            surface_radius,
            logger: LogManager::new("refresh"),
        }
    }

    /// One `Fetching → Ready` transition. Retrieval failures keep the
    /// previous snapshot and are only reported; nothing is installed once the
    /// view has been torn down.
    pub async fn run_once(&self, view: &SharedView) {
        {
            let mut state = view.lock();
            if state.is_torn_down() {
                return;
            }
            state.phase = SchedulerPhase::Fetching;
        }

        let fetched = self.source.fetch().await.and_then(|text| {
            let snapshot = parse_catalog(&text);
            if snapshot.is_empty() {
                Err(TrackError::EmptyCatalog)
            } else {
                Ok(snapshot)
            }
        });

        match fetched {
            Ok(snapshot) => {
                if let Err(err) = self.install(view, snapshot) {
                    self.logger.record(&format!("discarded snapshot: {}", err));
                }
            }
            Err(err) => {
                self.metrics.record_error();
                self.logger.warn(&format!(
                    "retrieval from {} failed, keeping previous snapshot: {}",
                    self.source.describe(),
                    err
                ));
                let mut state = view.lock();
                if !state.is_torn_down() {
                    state.phase = if state.snapshot.is_some() {
                        SchedulerPhase::Ready
                    } else {
                        SchedulerPhase::Idle
                    };
                }
            }
        }
    }

    /// Installs `snapshot`, computes every fix for the clock's current
    /// instant and publishes the filtered visible set.
    pub fn install(&self, view: &SharedView, snapshot: FleetSnapshot) -> TrackResult<()> {
        let now = self.clock.now();
        let fixes = compute_fixes(&snapshot, now, self.surface_radius);

        let mut state = view.lock();
        if state.is_torn_down() {
            return Err(TrackError::TornDown);
        }

        let visible = VisibleSet::filter(&fixes, state.filter_height_km, now);
        let object_count = snapshot.len();
        let dropped = snapshot.dropped();
        let fix_count = fixes.len();

        state.snapshot = Some(Arc::new(snapshot));
        state.fixes = Arc::new(fixes);
        state.generation += 1;
        state.publish_visible(visible);
        state.phase = SchedulerPhase::Ready;
        let visible_count = state.visible_count;
        drop(state);

        self.metrics.record_refresh();
        self.logger.record(&format!(
            "snapshot installed: {} objects ({} dropped), {} fixes, {} visible",
            object_count, dropped, fix_count, visible_count
        ));
        Ok(())
    }
}
