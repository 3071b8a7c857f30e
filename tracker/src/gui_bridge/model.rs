use chrono::{DateTime, Utc};
use orbitcore::picking::{Camera, PickReport};
use orbitcore::schedule::{SchedulerPhase, ViewOutput};
use orbitcore::telemetry::MetricsSnapshot;
use orbitcore::{SatelliteFix, Viewport};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerModel {
    pub name: String,
    pub catalog_number: u64,
    pub latitude: f64,
    pub longitude: f64,
    pub height_km: f64,
    /// Display-space position, globe radius 1.
    pub position: [f64; 3],
}

impl From<&SatelliteFix> for MarkerModel {
    fn from(fix: &SatelliteFix) -> Self {
        Self {
            name: fix.name.clone(),
            catalog_number: fix.object.catalog_number,
            latitude: fix.latitude,
            longitude: fix.longitude,
            height_km: fix.height_km,
            position: [
                fix.display_position.x,
                fix.display_position.y,
                fix.display_position.z,
            ],
        }
    }
}

/// JSON body of `GET /view`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisualizationModel {
    pub phase: SchedulerPhase,
    pub generation: u64,
    pub filter_height_km: f64,
    pub visible_count: usize,
    pub object_count: usize,
    pub computed_at: Option<DateTime<Utc>>,
    pub markers: Vec<MarkerModel>,
    pub pick: Option<PickReport>,
    pub tooltip: Vec<String>,
    pub camera: Camera,
    pub viewport: Viewport,
    pub metrics: MetricsSnapshot,
}

impl VisualizationModel {
    pub fn from_view(
        output: &ViewOutput,
        camera: Camera,
        viewport: Viewport,
        metrics: MetricsSnapshot,
    ) -> Self {
        Self {
            phase: output.phase,
            generation: output.generation,
            filter_height_km: output.filter_height_km,
            visible_count: output.visible_count,
            object_count: output.object_count,
            computed_at: output.computed_at,
            markers: output.visible.fixes.iter().map(MarkerModel::from).collect(),
            tooltip: output
                .pick
                .as_ref()
                .map(|pick| pick.tooltip_lines().to_vec())
                .unwrap_or_default(),
            pick: output.pick.clone(),
            camera,
            viewport,
            metrics,
        }
    }
}
