pub mod element_set;
pub mod parser;
pub mod snapshot;
pub mod source;

pub use element_set::OrbitalElementSet;
pub use parser::{group_count, parse_catalog};
pub use snapshot::{FleetSnapshot, ObjectRef, TrackedObject};
pub use source::{ElementSource, FileElementSource, HttpElementSource, StaticElementSource};
