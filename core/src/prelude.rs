use crate::picking::camera::Camera;
use serde::{Deserialize, Serialize};

/// Lowest selectable visibility threshold, in km.
pub const MIN_FILTER_HEIGHT_KM: f64 = 0.0;
/// Highest selectable visibility threshold, in km.
pub const MAX_FILTER_HEIGHT_KM: f64 = 2000.0;
/// Threshold control granularity, in km.
pub const FILTER_HEIGHT_STEP_KM: f64 = 10.0;
/// Fastest supported per-frame tick.
pub const MAX_FRAME_RATE_HZ: u32 = 1000;
/// Slowest supported refresh tick (one day).
pub const MAX_REFRESH_PERIOD_SECS: u64 = 86_400;

/// Pixel size of the surface the pointer moves over.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn aspect(&self) -> f64 {
        if self.height > 0.0 {
            self.width / self.height
        } else {
            1.0
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
        }
    }
}

/// Shared configuration for the refresh/pick pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub refresh_period_secs: u64,
    pub frame_rate_hz: u32,
    pub filter_height_km: f64,
    pub surface_radius: f64,
    pub pick_radius: f64,
    pub viewport: Viewport,
    pub camera: Camera,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let viewport = Viewport::default();
        Self {
            refresh_period_secs: 20,
            frame_rate_hz: 60,
            filter_height_km: 0.0,
            surface_radius: crate::propagation::transform::SURFACE_RADIUS,
            pick_radius: crate::picking::picker::PICK_RADIUS,
            camera: Camera::looking_at_origin(3.0, viewport.aspect()),
            viewport,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> TrackResult<()> {
        if self.refresh_period_secs == 0 || self.refresh_period_secs > MAX_REFRESH_PERIOD_SECS {
            return Err(TrackError::Config(format!(
                "refresh period must be between 1 and {} s, got {}",
                MAX_REFRESH_PERIOD_SECS, self.refresh_period_secs
            )));
        }
        if self.frame_rate_hz == 0 || self.frame_rate_hz > MAX_FRAME_RATE_HZ {
            return Err(TrackError::Config(format!(
                "frame rate must be between 1 and {} Hz, got {}",
                MAX_FRAME_RATE_HZ, self.frame_rate_hz
            )));
        }
        if self.surface_radius <= 0.0 || self.pick_radius <= 0.0 {
            return Err(TrackError::Config(
                "surface and pick radius must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Clamps a requested threshold into the selectable range and snaps it to the step.
pub fn normalize_filter_height(height_km: f64) -> f64 {
    if !height_km.is_finite() {
        return MIN_FILTER_HEIGHT_KM;
    }
    let clamped = height_km.clamp(MIN_FILTER_HEIGHT_KM, MAX_FILTER_HEIGHT_KM);
    (clamped / FILTER_HEIGHT_STEP_KM).round() * FILTER_HEIGHT_STEP_KM
}

/// Common error type for the tracking pipeline.
#[derive(thiserror::Error, Debug)]
pub enum TrackError {
    #[error("malformed element set: {0}")]
    MalformedElements(String),
    #[error("element retrieval failed: {0}")]
    Retrieval(String),
    #[error("catalog contained no usable element sets")]
    EmptyCatalog,
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("scheduler has been torn down")]
    TornDown,
}

pub type TrackResult<T> = Result<T, TrackError>;
