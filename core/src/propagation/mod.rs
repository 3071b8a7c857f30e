pub mod filter;
pub mod fix;
pub mod record;
pub mod transform;

pub use filter::{is_visible, VisibleSet};
pub use fix::{compute_fixes, SatelliteFix};
pub use record::{propagate, EciState, PropagationRecord};
pub use transform::{display_position, eci_to_geodetic, greenwich_sidereal_time, Geodetic};
