use crate::propagation::fix::SatelliteFix;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Height predicate deciding whether an object takes part in the view.
pub fn is_visible(height_km: f64, threshold_km: f64) -> bool {
    height_km >= threshold_km
}

/// Fixes that passed the height filter at one refresh tick. Published as a
/// whole and never mutated afterwards.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VisibleSet {
    pub computed_at: Option<DateTime<Utc>>,
    pub threshold_km: f64,
    pub fixes: Vec<SatelliteFix>,
}

impl VisibleSet {
    pub fn filter(fixes: &[SatelliteFix], threshold_km: f64, computed_at: DateTime<Utc>) -> Self {
        Self {
            computed_at: Some(computed_at),
            threshold_km,
            fixes: fixes
                .iter()
                .filter(|fix| is_visible(fix.height_km, threshold_km))
                .cloned()
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.fixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixes.is_empty()
    }
}
