use crate::catalog::element_set::OrbitalElementSet;
use crate::propagation::record::PropagationRecord;
use serde::{Deserialize, Serialize};

/// Stable handle to an object within one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    pub index: usize,
    pub catalog_number: u64,
}

/// Parsed element set paired with its propagation model.
#[derive(Debug, Clone)]
pub struct TrackedObject {
    pub element_set: OrbitalElementSet,
    pub record: PropagationRecord,
}

/// Immutable result of one fetch+parse cycle. Updating the fleet means
/// replacing the whole snapshot.
#[derive(Debug, Clone, Default)]
pub struct FleetSnapshot {
    objects: Vec<TrackedObject>,
    dropped: usize,
}

impl FleetSnapshot {
    pub fn new(objects: Vec<TrackedObject>, dropped: usize) -> Self {
        Self { objects, dropped }
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Element groups discarded while parsing.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn objects(&self) -> &[TrackedObject] {
        &self.objects
    }

    pub fn get(&self, object: ObjectRef) -> Option<&TrackedObject> {
        self.objects
            .get(object.index)
            .filter(|tracked| tracked.record.catalog_number() == object.catalog_number)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ObjectRef, &TrackedObject)> {
        self.objects.iter().enumerate().map(|(index, tracked)| {
            (
                ObjectRef {
                    index,
                    catalog_number: tracked.record.catalog_number(),
                },
                tracked,
            )
        })
    }
}
