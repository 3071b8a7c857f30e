use crate::catalog::element_set::OrbitalElementSet;
use crate::prelude::{TrackError, TrackResult};
use chrono::{DateTime, Utc};
use nalgebra::Vector3;
use sgp4::{Constants, Elements};
use std::fmt;

/// Inertial-frame (TEME) state produced by one propagation call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EciState {
    /// km
    pub position: Vector3<f64>,
    /// km/s
    pub velocity: Vector3<f64>,
}

/// SGP4 model built once from an element set and reused for every
/// propagation within one fleet snapshot.
#[derive(Clone)]
pub struct PropagationRecord {
    elements: Elements,
    constants: Constants,
}

impl PropagationRecord {
    /// Builds the model from both element lines. Pure: the same lines always
    /// produce the same record.
    pub fn from_element_set(set: &OrbitalElementSet) -> TrackResult<Self> {
        set.validate()?;

        let elements = Elements::from_tle(
            Some(set.name.clone()),
            set.line1.as_bytes(),
            set.line2.as_bytes(),
        )
        .map_err(|e| TrackError::MalformedElements(format!("{}: {}", set.name, e)))?;
        let constants = Constants::from_elements(&elements)
            .map_err(|e| TrackError::MalformedElements(format!("{}: {}", set.name, e)))?;

        Ok(Self {
            elements,
            constants,
        })
    }

    pub fn catalog_number(&self) -> u64 {
        self.elements.norad_id
    }

    pub fn epoch(&self) -> DateTime<Utc> {
        self.elements.datetime.and_utc()
    }

    /// revolutions per day
    pub fn mean_motion(&self) -> f64 {
        self.elements.mean_motion
    }

    /// degrees
    pub fn inclination(&self) -> f64 {
        self.elements.inclination
    }

    pub fn eccentricity(&self) -> f64 {
        self.elements.eccentricity
    }

    /// Propagates to `instant`. `None` means the model produced no usable
    /// position for that instant (decayed orbit, numerical breakdown); callers
    /// treat it as "no display position this tick".
    pub fn propagate(&self, instant: DateTime<Utc>) -> Option<EciState> {
        let minutes = self
            .elements
            .datetime_to_minutes_since_epoch(&instant.naive_utc())
            .ok()?;
        let prediction = self.constants.propagate(minutes).ok()?;

        let position = Vector3::from(prediction.position);
        let velocity = Vector3::from(prediction.velocity);
        if position.iter().chain(velocity.iter()).all(|v| v.is_finite()) {
            Some(EciState { position, velocity })
        } else {
            None
        }
    }
}

impl fmt::Debug for PropagationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropagationRecord")
            .field("catalog_number", &self.elements.norad_id)
            .field("epoch", &self.elements.datetime)
            .field("mean_motion", &self.elements.mean_motion)
            .finish()
    }
}

/// Free-function form of [`PropagationRecord::propagate`].
pub fn propagate(record: &PropagationRecord, instant: DateTime<Utc>) -> Option<EciState> {
    record.propagate(instant)
}
