use crate::prelude::{Category, FeedError, FeedResult};
use chrono::{DateTime, NaiveDateTime, Utc};
use std::fmt;
use std::sync::Arc;

/// Opaque orbit propagation capability.
pub trait Propagator: Send + Sync {
    /// Inertial position in km, or `None` for decayed or invalid element sets.
    fn position_at(&self, at: &DateTime<Utc>) -> Option<[f64; 3]>;
}

/// SGP4 propagation of a single two-line element set.
pub struct Sgp4Propagator {
    epoch: NaiveDateTime,
    constants: sgp4::Constants,
}

impl Sgp4Propagator {
    pub fn from_tle(name: &str, line1: &str, line2: &str) -> FeedResult<Self> {
        let elements =
            sgp4::Elements::from_tle(Some(name.to_string()), line1.as_bytes(), line2.as_bytes())
                .map_err(|err| FeedError::Parse(format!("{name}: {err}")))?;
        let constants = sgp4::Constants::from_elements(&elements)
            .map_err(|err| FeedError::Parse(format!("{name}: {err}")))?;
        Ok(Self {
            epoch: elements.datetime,
            constants,
        })
    }

    pub fn epoch(&self) -> NaiveDateTime {
        self.epoch
    }
}

impl Propagator for Sgp4Propagator {
    fn position_at(&self, at: &DateTime<Utc>) -> Option<[f64; 3]> {
        let elapsed = at.naive_utc().signed_duration_since(self.epoch);
        let minutes = elapsed.num_milliseconds() as f64 / 60_000.0;
        let prediction = self
            .constants
            .propagate(sgp4::MinutesSinceEpoch(minutes))
            .ok()?;
        prediction
            .position
            .iter()
            .all(|v| v.is_finite())
            .then_some(prediction.position)
    }
}

/// Catalog entry: identity, category and propagation handle.
#[derive(Clone)]
pub struct OrbitalObject {
    pub name: String,
    pub category: Category,
    propagator: Arc<dyn Propagator>,
}

impl OrbitalObject {
    pub fn new(name: impl Into<String>, category: Category, propagator: Arc<dyn Propagator>) -> Self {
        Self {
            name: name.into(),
            category,
            propagator,
        }
    }

    pub fn position_at(&self, at: &DateTime<Utc>) -> Option<[f64; 3]> {
        self.propagator.position_at(at)
    }
}

impl fmt::Debug for OrbitalObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrbitalObject")
            .field("name", &self.name)
            .field("category", &self.category)
            .finish_non_exhaustive()
    }
}

/// Immutable set of orbital objects, only ever replaced as a whole.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    objects: Vec<OrbitalObject>,
}

impl Catalog {
    pub fn new(objects: Vec<OrbitalObject>) -> Self {
        Self { objects }
    }

    pub fn objects(&self) -> &[OrbitalObject] {
        &self.objects
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
