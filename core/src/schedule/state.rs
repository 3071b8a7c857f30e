use crate::catalog::snapshot::FleetSnapshot;
use crate::picking::camera::{Camera, PointerPosition, Ray};
use crate::picking::picker::PickReport;
use crate::prelude::{PipelineConfig, Viewport};
use crate::propagation::filter::VisibleSet;
use crate::propagation::fix::SatelliteFix;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchedulerPhase {
    Idle,
    Fetching,
    Ready,
    TornDown,
}

/// Process-lifetime state shared by the refresh task, the frame task and the
/// input handlers. Each field group has a single writer:
/// refresh task → phase (until teardown), snapshot, fixes, visible set, counts;
/// frame task → pointer (latest value from the input channel), pointer ray, pick;
/// input → threshold;
/// teardown → the `TornDown` phase and clearing of pointer, ray and pick.
#[derive(Debug)]
pub struct ViewState {
    pub phase: SchedulerPhase,
    pub filter_height_km: f64,
    pub visible_count: usize,
    pub pointer: Option<PointerPosition>,
    pub pointer_ray: Option<Ray>,
    pub camera: Camera,
    pub viewport: Viewport,
    pub generation: u64,
    pub snapshot: Option<Arc<FleetSnapshot>>,
    pub fixes: Arc<Vec<SatelliteFix>>,
    pub visible: Arc<VisibleSet>,
    pub pick: Option<PickReport>,
}

impl ViewState {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            phase: SchedulerPhase::Idle,
            filter_height_km: crate::prelude::normalize_filter_height(config.filter_height_km),
            visible_count: 0,
            pointer: None,
            pointer_ray: None,
            camera: config.camera.clone(),
            viewport: config.viewport,
            generation: 0,
            snapshot: None,
            fixes: Arc::new(Vec::new()),
            visible: Arc::new(VisibleSet::default()),
            pick: None,
        }
    }

    pub fn is_torn_down(&self) -> bool {
        self.phase == SchedulerPhase::TornDown
    }

    /// Replaces the visible set with the current fixes filtered by the
    /// current threshold, keeping the tick time the fixes were computed for.
    pub fn refilter(&mut self) {
        let computed_at = self.visible.computed_at.unwrap_or_else(Utc::now);
        let visible = VisibleSet::filter(&self.fixes, self.filter_height_km, computed_at);
        self.publish_visible(visible);
    }

    pub fn publish_visible(&mut self, visible: VisibleSet) {
        self.visible_count = visible.len();
        self.visible = Arc::new(visible);
    }

    pub fn output(&self) -> ViewOutput {
        ViewOutput {
            phase: self.phase,
            generation: self.generation,
            filter_height_km: self.filter_height_km,
            visible_count: self.visible_count,
            object_count: self.snapshot.as_ref().map_or(0, |s| s.len()),
            computed_at: self.visible.computed_at,
            visible: Arc::clone(&self.visible),
            pick: self.pick.clone(),
        }
    }
}

/// Read-only view handed to the render surface.
#[derive(Debug, Clone)]
pub struct ViewOutput {
    pub phase: SchedulerPhase,
    pub generation: u64,
    pub filter_height_km: f64,
    pub visible_count: usize,
    pub object_count: usize,
    pub computed_at: Option<DateTime<Utc>>,
    pub visible: Arc<VisibleSet>,
    pub pick: Option<PickReport>,
}

/// Handle to the shared view state. Locks are only ever held for synchronous
/// sections, never across an await.
#[derive(Debug, Clone)]
pub struct SharedView {
    inner: Arc<Mutex<ViewState>>,
}

impl SharedView {
    pub fn new(state: ViewState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(state)),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, ViewState> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn output(&self) -> ViewOutput {
        self.lock().output()
    }
}
