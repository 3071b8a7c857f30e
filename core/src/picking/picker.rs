use crate::catalog::snapshot::ObjectRef;
use crate::picking::camera::{PointerPosition, Ray};
use crate::prelude::Viewport;
use crate::propagation::fix::SatelliteFix;
use serde::{Deserialize, Serialize};

/// Pick volume radius in globe units; larger than the marker to keep hovering
/// forgiving at normal zoom.
pub const PICK_RADIUS: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickHit {
    pub object: ObjectRef,
    /// Index into the fix slice that was searched.
    pub index: usize,
    pub distance: f64,
}

/// Nearest marker hit by `ray`. Markers are tested in slice order and a later
/// marker only wins when strictly closer, so exact ties go to the first one.
pub fn pick(ray: &Ray, fixes: &[SatelliteFix], pick_radius: f64) -> Option<PickHit> {
    let mut best: Option<PickHit> = None;
    for (index, fix) in fixes.iter().enumerate() {
        let Some(distance) = ray.intersect_sphere(&fix.display_position, pick_radius) else {
            continue;
        };
        if best.map_or(true, |hit| distance < hit.distance) {
            best = Some(PickHit {
                object: fix.object,
                index,
                distance,
            });
        }
    }
    best
}

/// Tooltip payload for the currently picked object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickReport {
    pub object: ObjectRef,
    pub name: String,
    /// degrees, two decimals
    pub latitude: f64,
    /// degrees, two decimals
    pub longitude: f64,
    /// Pointer position in pixels, origin top-left.
    pub anchor: (f64, f64),
}

impl PickReport {
    pub fn new(fix: &SatelliteFix, pointer: PointerPosition, viewport: &Viewport) -> Self {
        Self {
            object: fix.object,
            name: fix.name.clone(),
            latitude: round_to_hundredths(fix.latitude),
            longitude: round_to_hundredths(fix.longitude),
            anchor: pointer.to_screen(viewport),
        }
    }

    pub fn tooltip_lines(&self) -> [String; 3] {
        [
            self.name.clone(),
            format!("Lat: {:.2}", self.latitude),
            format!("Lon: {:.2}", self.longitude),
        ]
    }
}

fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
