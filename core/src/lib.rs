//! Satellite tracking core: element-set parsing, SGP4 propagation, the
//! geodetic/display transform, height filtering, pointer picking and the
//! refresh/frame scheduler that ties them together.
//!
//! Each stage is a plain function over owned snapshots; only the scheduler
//! holds shared state.

pub mod catalog;
pub mod picking;
pub mod prelude;
pub mod propagation;
pub mod schedule;
pub mod telemetry;

pub use nalgebra::Vector3;

pub use catalog::{parse_catalog, FleetSnapshot, OrbitalElementSet};
pub use prelude::{PipelineConfig, TrackError, TrackResult, Viewport};
pub use propagation::{compute_fixes, SatelliteFix, VisibleSet};
pub use schedule::{Scheduler, SchedulerHandle, ViewOutput};
