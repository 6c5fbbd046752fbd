use crate::math::ephemeris::{moon_equatorial, moon_parallax_deg, sun_equatorial, Equatorial};
use crate::prelude::Category;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CelestialBody {
    Sun,
    Moon,
    /// Fixed equatorial coordinates (radio source, star).
    Fixed(Equatorial),
}

/// A named body whose sky position follows from the clock alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CelestialSource {
    pub name: String,
    pub body: CelestialBody,
}

impl CelestialSource {
    pub fn fixed(name: impl Into<String>, ra_hours: f64, dec_deg: f64) -> Self {
        Self {
            name: name.into(),
            body: CelestialBody::Fixed(Equatorial::new(ra_hours, dec_deg)),
        }
    }

    pub fn sun() -> Self {
        Self {
            name: "Sun".into(),
            body: CelestialBody::Sun,
        }
    }

    pub fn moon() -> Self {
        Self {
            name: "Moon".into(),
            body: CelestialBody::Moon,
        }
    }

    pub fn category(&self) -> Category {
        match self.body {
            CelestialBody::Sun => Category::Sun,
            CelestialBody::Moon => Category::Moon,
            CelestialBody::Fixed(_) => Category::Source,
        }
    }

    pub fn equatorial_at(&self, at: &DateTime<Utc>) -> Equatorial {
        match self.body {
            CelestialBody::Sun => sun_equatorial(at),
            CelestialBody::Moon => moon_equatorial(at),
            CelestialBody::Fixed(position) => position,
        }
    }

    /// Horizontal parallax in degrees; only the Moon is close enough to need it.
    pub fn parallax_deg(&self, at: &DateTime<Utc>) -> f64 {
        match self.body {
            CelestialBody::Moon => moon_parallax_deg(at),
            _ => 0.0,
        }
    }
}

/// How far ahead, and how finely, a source's path is traced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackWindow {
    pub hours: f64,
    pub step_minutes: f64,
}

impl Default for TrackWindow {
    fn default() -> Self {
        Self {
            hours: 24.0,
            step_minutes: 10.0,
        }
    }
}

impl TrackWindow {
    /// Number of forward samples after the current position; zero disables tracks.
    pub fn steps(&self) -> usize {
        if self.hours <= 0.0 || self.step_minutes <= 0.0 {
            return 0;
        }
        (self.hours * 60.0 / self.step_minutes).floor() as usize
    }

    pub fn step(&self) -> chrono::Duration {
        chrono::Duration::milliseconds((self.step_minutes * 60_000.0).round() as i64)
    }
}

/// Folds `[whole, minutes, seconds]` into one value. A minus sign on any
/// component makes the whole value negative, so `[-0, 30, 0]` is `-0.5`.
pub fn from_sexagesimal(parts: &[f64]) -> Option<f64> {
    if parts.is_empty() || parts.len() > 3 || parts.iter().any(|p| !p.is_finite()) {
        return None;
    }
    let magnitude: f64 = parts
        .iter()
        .zip([1.0, 60.0, 3600.0])
        .map(|(part, scale)| part.abs() / scale)
        .sum();
    if parts.iter().any(|p| p.is_sign_negative()) {
        Some(-magnitude)
    } else {
        Some(magnitude)
    }
}
