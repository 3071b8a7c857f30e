use crate::catalog::element_set::OrbitalElementSet;
use crate::catalog::snapshot::{FleetSnapshot, TrackedObject};
use crate::propagation::record::PropagationRecord;
use log::debug;

/// Lines per catalog entry: name, element line 1, element line 2.
pub const LINES_PER_GROUP: usize = 3;

fn catalog_lines(text: &str) -> Vec<&str> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    trimmed.lines().collect()
}

/// Number of complete three-line groups in `text`.
pub fn group_count(text: &str) -> usize {
    catalog_lines(text).len() / LINES_PER_GROUP
}

/// Splits catalog text into element sets. A trailing partial group is
/// discarded.
pub fn split_groups(text: &str) -> Vec<OrbitalElementSet> {
    catalog_lines(text)
        .chunks_exact(LINES_PER_GROUP)
        .map(|group| OrbitalElementSet::new(group[0], group[1], group[2]))
        .collect()
}

/// Parses catalog text into a fleet snapshot. Groups whose propagation model
/// cannot be built are left out; parsing never fails as a whole.
pub fn parse_catalog(text: &str) -> FleetSnapshot {
    let mut objects = Vec::new();
    let mut dropped = 0;

    for element_set in split_groups(text) {
        match PropagationRecord::from_element_set(&element_set) {
            Ok(record) => objects.push(TrackedObject {
                element_set,
                record,
            }),
            Err(err) => {
                debug!("dropping element group: {}", err);
                dropped += 1;
            }
        }
    }

    FleetSnapshot::new(objects, dropped)
}
