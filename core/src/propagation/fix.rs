use crate::catalog::snapshot::{FleetSnapshot, ObjectRef, TrackedObject};
use crate::propagation::transform::{display_position, eci_to_geodetic, greenwich_sidereal_time};
use chrono::{DateTime, Utc};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Position of one object for one refresh tick. Recomputed from scratch on
/// the next tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SatelliteFix {
    pub object: ObjectRef,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub height_km: f64,
    pub display_position: Vector3<f64>,
}

fn fix_for(
    object: ObjectRef,
    tracked: &TrackedObject,
    instant: DateTime<Utc>,
    gmst: f64,
    surface_radius: f64,
) -> Option<SatelliteFix> {
    let state = tracked.record.propagate(instant)?;
    let geodetic = eci_to_geodetic(&state.position, gmst);
    if !geodetic.height_km.is_finite() {
        return None;
    }

    Some(SatelliteFix {
        object,
        name: tracked.element_set.name.clone(),
        latitude: geodetic.latitude_deg,
        longitude: geodetic.longitude_deg,
        height_km: geodetic.height_km,
        display_position: display_position(&geodetic, surface_radius),
    })
}

/// Propagates every object in the snapshot to `instant`. Objects without a
/// fix at that instant are simply absent from the result.
pub fn compute_fixes(
    snapshot: &FleetSnapshot,
    instant: DateTime<Utc>,
    surface_radius: f64,
) -> Vec<SatelliteFix> {
    let gmst = greenwich_sidereal_time(instant);
    snapshot
        .iter()
        .filter_map(|(object, tracked)| fix_for(object, tracked, instant, gmst, surface_radius))
        .collect()
}
