use crate::catalog::source::ElementSource;
use crate::picking::camera::PointerPosition;
use crate::prelude::{normalize_filter_height, PipelineConfig, TrackResult};
use crate::schedule::clock::Clock;
use crate::schedule::frame::FrameCycle;
use crate::schedule::refresh::RefreshCycle;
use crate::schedule::state::{SchedulerPhase, SharedView, ViewOutput, ViewState};
use crate::telemetry::{LogManager, MetricsRecorder, MetricsSnapshot};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

/// Owns the two repeating activities: the slow refresh tick and the fast
/// frame tick.
pub struct Scheduler {
    config: PipelineConfig,
    source: Arc<dyn ElementSource>,
    clock: Arc<dyn Clock>,
}

impl Scheduler {
    pub fn new(
        config: PipelineConfig,
        source: Arc<dyn ElementSource>,
        clock: Arc<dyn Clock>,
    ) -> TrackResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            source,
            clock,
        })
    }

    /// Spawns the refresh and frame tasks on the current runtime. The first
    /// refresh runs immediately.
    pub fn start(self) -> SchedulerHandle {
        let view = SharedView::new(ViewState::new(&self.config));
        let metrics = Arc::new(MetricsRecorder::new());
        let logger = LogManager::new("scheduler");

        let refresh = RefreshCycle::new(
            self.source.clone(),
            self.clock.clone(),
            metrics.clone(),
            self.config.surface_radius,
        );
        let refresh_period = Duration::from_secs(self.config.refresh_period_secs);
        let refresh_view = view.clone();
        let refresh_task = tokio::spawn(async move {
            let mut ticker = interval(refresh_period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if refresh_view.lock().is_torn_down() {
                    break;
                }
                refresh.run_once(&refresh_view).await;
            }
        });

        let (pointer_tx, pointer_rx) = watch::channel(None);
        let frame = FrameCycle::new(metrics.clone(), self.config.pick_radius);
        let frame_period = Duration::from_secs_f64(1.0 / f64::from(self.config.frame_rate_hz));
        let frame_view = view.clone();
        let frame_task = tokio::spawn(async move {
            let mut ticker = interval(frame_period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if frame_view.lock().is_torn_down() {
                    break;
                }
                let pointer = *pointer_rx.borrow();
                frame.run_frame(&frame_view, pointer);
            }
        });

        logger.record(&format!(
            "started from {}: refresh every {}s, {} frames/s",
            self.source.describe(),
            self.config.refresh_period_secs,
            self.config.frame_rate_hz
        ));

        SchedulerHandle {
            view,
            metrics,
            pointer_tx,
            refresh_task: Some(refresh_task),
            frame_task: Some(frame_task),
            logger,
        }
    }
}

/// Input and teardown surface of a running scheduler.
pub struct SchedulerHandle {
    view: SharedView,
    metrics: Arc<MetricsRecorder>,
    pointer_tx: watch::Sender<Option<PointerPosition>>,
    refresh_task: Option<JoinHandle<()>>,
    frame_task: Option<JoinHandle<()>>,
    logger: LogManager,
}

impl SchedulerHandle {
    /// Records the latest pointer position; the next frame picks with it.
    /// Out-of-range coordinates are clamped onto the viewport. Returns `false`
    /// and leaves the pointer untouched for non-finite input.
    pub fn pointer_moved(&self, pointer: PointerPosition) -> bool {
        match pointer.sanitized() {
            Some(pointer) => {
                self.pointer_tx.send_replace(Some(pointer));
                true
            }
            None => false,
        }
    }

    pub fn pointer_left(&self) {
        self.pointer_tx.send_replace(None);
    }

    /// Applies a new visibility threshold and re-filters the current fixes
    /// right away. Returns the threshold actually in effect.
    pub fn set_filter_height(&self, height_km: f64) -> f64 {
        let mut state = self.view.lock();
        if state.is_torn_down() {
            return state.filter_height_km;
        }
        state.filter_height_km = normalize_filter_height(height_km);
        state.refilter();
        state.filter_height_km
    }

    pub fn output(&self) -> ViewOutput {
        self.view.output()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn view(&self) -> &SharedView {
        &self.view
    }

    pub fn is_torn_down(&self) -> bool {
        self.view.lock().is_torn_down()
    }

    /// Stops both ticks and marks the view torn down. An in-flight fetch is
    /// abandoned and its result never installed. Safe to call repeatedly.
    pub fn teardown(&mut self) {
        if let Some(task) = self.refresh_task.take() {
            task.abort();
        }
        if let Some(task) = self.frame_task.take() {
            // Aborting drops the frame task's pointer receiver.
            task.abort();
        }

        let mut state = self.view.lock();
        if state.is_torn_down() {
            return;
        }
        state.phase = SchedulerPhase::TornDown;
        state.pointer = None;
        state.pointer_ray = None;
        state.pick = None;
        drop(state);
        self.logger.record("torn down");
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::source::StaticElementSource;
    use crate::prelude::{TrackError, TrackResult};
    use crate::propagation::record::fixtures::*;
    use crate::schedule::clock::FixedClock;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        text: String,
        fetches: AtomicUsize,
        delay: Duration,
        fail: bool,
    }

    impl CountingSource {
        fn new(text: String) -> Self {
            Self {
                text,
                fetches: AtomicUsize::new(0),
                delay: Duration::ZERO,
                fail: false,
            }
        }
    }

    #[async_trait]
    impl ElementSource for CountingSource {
        async fn fetch(&self) -> TrackResult<String> {
            let call = self.fetches.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail && call > 0 {
                return Err(TrackError::Retrieval("503 Service Unavailable".into()));
            }
            Ok(self.text.clone())
        }

        fn describe(&self) -> String {
            "counting".into()
        }
    }

    fn vanguard_epoch() -> DateTime<Utc> {
        crate::catalog::parser::parse_catalog(&catalog_text(&[VANGUARD])).objects()[0]
            .record
            .epoch()
    }

    fn start_with(source: Arc<dyn ElementSource>, threshold: f64) -> SchedulerHandle {
        let config = PipelineConfig {
            filter_height_km: threshold,
            ..Default::default()
        };
        Scheduler::new(config, source, Arc::new(FixedClock::new(vanguard_epoch())))
            .unwrap()
            .start()
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = PipelineConfig {
            frame_rate_hz: 0,
            ..Default::default()
        };
        let result = Scheduler::new(
            config,
            Arc::new(StaticElementSource::new("")),
            Arc::new(FixedClock::new(vanguard_epoch())),
        );
        assert!(result.is_err());

        let config = PipelineConfig {
            frame_rate_hz: u32::MAX,
            ..Default::default()
        };
        let result = Scheduler::new(
            config,
            Arc::new(StaticElementSource::new("")),
            Arc::new(FixedClock::new(vanguard_epoch())),
        );
        assert!(matches!(result, Err(TrackError::Config(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn frame_loop_keeps_running_at_fastest_rate() {
        let source = Arc::new(CountingSource::new(catalog_text(&[VANGUARD])));
        let config = PipelineConfig {
            frame_rate_hz: crate::prelude::MAX_FRAME_RATE_HZ,
            ..Default::default()
        };
        let handle = Scheduler::new(config, source, Arc::new(FixedClock::new(vanguard_epoch())))
            .unwrap()
            .start();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.metrics().frames >= 90);
    }

    #[tokio::test(start_paused = true)]
    async fn non_finite_pointer_is_refused() {
        let source = Arc::new(CountingSource::new(catalog_text(&[LOW_SHELL, VANGUARD])));
        let handle = start_with(source, 0.0);
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(!handle.pointer_moved(PointerPosition::new(f64::NAN, 0.0)));
        assert!(handle.pointer_moved(PointerPosition::new(40.0, 0.0)));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(handle.view().lock().pointer, Some(PointerPosition::new(1.0, 0.0)));
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_runs_on_period_and_stops_at_teardown() {
        let source = Arc::new(CountingSource::new(catalog_text(&[LOW_SHELL, VANGUARD])));
        let mut handle = start_with(source.clone(), 0.0);

        // Ticks at 0s, 20s and 40s.
        tokio::time::sleep(Duration::from_secs(45)).await;
        assert_eq!(source.fetches.load(Ordering::SeqCst), 3);
        assert_eq!(handle.metrics().refresh_cycles, 3);
        assert_eq!(handle.output().visible_count, 2);

        handle.teardown();
        let metrics = handle.metrics();
        let generation = handle.output().generation;

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(source.fetches.load(Ordering::SeqCst), 3);
        assert_eq!(handle.metrics(), metrics);
        assert_eq!(handle.output().generation, generation);
        assert_eq!(handle.output().phase, SchedulerPhase::TornDown);
        assert!(handle.is_torn_down());
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_during_fetch_discards_result() {
        let mut source = CountingSource::new(catalog_text(&[VANGUARD]));
        source.delay = Duration::from_secs(5);
        let source = Arc::new(source);
        let mut handle = start_with(source.clone(), 0.0);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(handle.output().phase, SchedulerPhase::Fetching);
        handle.teardown();

        tokio::time::sleep(Duration::from_secs(30)).await;
        let output = handle.output();
        assert_eq!(output.generation, 0);
        assert_eq!(output.visible_count, 0);
        assert_eq!(output.phase, SchedulerPhase::TornDown);
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_refresh_keeps_last_snapshot() {
        let mut source = CountingSource::new(catalog_text(&[LOW_SHELL, VANGUARD]));
        source.fail = true;
        let source = Arc::new(source);
        let handle = start_with(source.clone(), 0.0);

        tokio::time::sleep(Duration::from_secs(25)).await;
        let output = handle.output();
        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
        assert_eq!(output.generation, 1);
        assert_eq!(output.visible_count, 2);
        assert_eq!(output.phase, SchedulerPhase::Ready);
        assert_eq!(handle.metrics().retrieval_errors, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn threshold_change_refilters_immediately() {
        let source = Arc::new(CountingSource::new(catalog_text(&[LOW_SHELL, VANGUARD])));
        let handle = start_with(source, 0.0);
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(handle.output().visible_count, 2);

        assert_eq!(handle.set_filter_height(503.0), 500.0);
        let output = handle.output();
        assert_eq!(output.visible_count, 1);
        assert_eq!(output.generation, 1);

        assert_eq!(handle.set_filter_height(5000.0), 2000.0);
        assert_eq!(handle.output().visible_count, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn pointer_over_marker_is_picked_on_next_frame() {
        let source = Arc::new(CountingSource::new(catalog_text(&[LOW_SHELL, VANGUARD])));
        // Far enough back that the whole outer shell stays on screen.
        let config = PipelineConfig {
            filter_height_km: 500.0,
            camera: crate::picking::camera::Camera::looking_at_origin(6.0, 16.0 / 9.0),
            ..Default::default()
        };
        let handle = Scheduler::new(config, source, Arc::new(FixedClock::new(vanguard_epoch())))
            .unwrap()
            .start();
        tokio::time::sleep(Duration::from_millis(10)).await;

        let (position, camera) = {
            let state = handle.view().lock();
            (state.visible.fixes[0].display_position, state.camera.clone())
        };
        handle.pointer_moved(camera.project(&position).unwrap());
        tokio::time::sleep(Duration::from_millis(50)).await;

        let pick = handle.output().pick.unwrap();
        assert_eq!(pick.name, "VANGUARD 1");
        assert!(handle.metrics().picks > 0);

        handle.pointer_left();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(handle.output().pick.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn input_after_teardown_is_ignored() {
        let source = Arc::new(CountingSource::new(catalog_text(&[LOW_SHELL, VANGUARD])));
        let mut handle = start_with(source, 0.0);
        tokio::time::sleep(Duration::from_millis(10)).await;
        handle.teardown();
        handle.teardown();

        assert_eq!(handle.set_filter_height(1000.0), 0.0);
        handle.pointer_moved(PointerPosition::new(0.0, 0.0));
        tokio::time::sleep(Duration::from_millis(50)).await;
        let output = handle.output();
        assert_eq!(output.visible_count, 2);
        assert!(output.pick.is_none());
    }
}
