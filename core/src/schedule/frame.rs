use crate::picking::camera::PointerPosition;
use crate::picking::picker::{pick, PickReport};
use crate::schedule::state::SharedView;
use crate::telemetry::MetricsRecorder;
use std::sync::Arc;

/// Fast per-frame tick: pointer → ray → pick against the last published
/// visible set → publish the pick.
pub struct FrameCycle {
    metrics: Arc<MetricsRecorder>,
    pick_radius: f64,
}

impl FrameCycle {
    pub fn new(metrics: Arc<MetricsRecorder>, pick_radius: f64) -> Self {
        Self {
            metrics,
            pick_radius,
        }
    }

    /// Runs one frame with the latest pointer position. Returns the published
    /// pick, or `None` when nothing is under the pointer or the view has been
    /// torn down.
    pub fn run_frame(
        &self,
        view: &SharedView,
        pointer: Option<PointerPosition>,
    ) -> Option<PickReport> {
        // One read of the published set per frame; a refresh swapping it
        // afterwards only affects the next frame.
        let (visible, camera, viewport) = {
            let mut state = view.lock();
            if state.is_torn_down() {
                return None;
            }
            state.pointer = pointer;
            (
                Arc::clone(&state.visible),
                state.camera.clone(),
                state.viewport,
            )
        };

        let ray = pointer.map(|pointer| camera.ray_through(pointer));
        let report = pointer.zip(ray.as_ref()).and_then(|(pointer, ray)| {
            pick(ray, &visible.fixes, self.pick_radius)
                .map(|hit| PickReport::new(&visible.fixes[hit.index], pointer, &viewport))
        });

        let mut state = view.lock();
        if state.is_torn_down() {
            return None;
        }
        state.pointer_ray = ray;
        state.pick = report.clone();
        drop(state);

        self.metrics.record_frame(report.is_some());
        report
    }
}
