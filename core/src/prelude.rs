use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::pin::Pin;

/// Classification tag used for grouping and colouring tracked objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Starlink,
    OneWeb,
    Station,
    Iridium,
    Gps,
    Glonass,
    Galileo,
    Beidou,
    Other,
    Aircraft,
    Sun,
    Moon,
    /// Configured fixed RA/Dec target.
    Source,
}

impl Category {
    pub fn label(&self) -> &'static str {
        match self {
            Category::Starlink => "Starlink",
            Category::OneWeb => "OneWeb",
            Category::Station => "Stations",
            Category::Iridium => "Iridium",
            Category::Gps => "GPS",
            Category::Glonass => "GLONASS",
            Category::Galileo => "Galileo",
            Category::Beidou => "BeiDou",
            Category::Other => "Other",
            Category::Aircraft => "Aircraft",
            Category::Sun => "Sun",
            Category::Moon => "Moon",
            Category::Source => "Sources",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Fixed ground location the sky is evaluated from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObserverSite {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub altitude_m: f64,
}

impl ObserverSite {
    pub fn new(latitude_deg: f64, longitude_deg: f64, altitude_m: f64) -> Self {
        Self {
            latitude_deg,
            longitude_deg,
            altitude_m,
        }
    }

    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude_deg)
            && (-180.0..=180.0).contains(&self.longitude_deg)
            && self.altitude_m.is_finite()
    }
}

/// Empirical visibility thresholds, kept configurable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Aircraft count as visible down to this many degrees below the horizon curve.
    pub aircraft_margin_deg: f64,
    /// Satellites below this elevation are dropped instead of counted as blocked.
    pub deep_occlusion_deg: f64,
    pub aircraft_grace_ms: i64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            aircraft_margin_deg: 0.5,
            deep_occlusion_deg: -10.0,
            aircraft_grace_ms: 15_000,
        }
    }
}

/// Directional sensor field of view as an azimuth/elevation wedge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorFov {
    pub azimuth_deg: f64,
    pub azimuth_span_deg: f64,
    pub min_elevation_deg: f64,
    pub max_elevation_deg: f64,
}

impl Default for SensorFov {
    fn default() -> Self {
        Self {
            azimuth_deg: 180.0,
            azimuth_span_deg: 60.0,
            min_elevation_deg: 10.0,
            max_elevation_deg: 90.0,
        }
    }
}

impl SensorFov {
    pub fn contains(&self, azimuth_deg: f64, elevation_deg: f64) -> bool {
        if elevation_deg < self.min_elevation_deg || elevation_deg > self.max_elevation_deg {
            return false;
        }
        if self.azimuth_span_deg >= 360.0 {
            return true;
        }
        let offset = (azimuth_deg - self.azimuth_deg + 180.0).rem_euclid(360.0) - 180.0;
        offset.abs() <= self.azimuth_span_deg / 2.0
    }
}

/// Error taxonomy for feed retrieval.
#[derive(thiserror::Error, Debug)]
pub enum FeedError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },
    #[error("parse failure: {0}")]
    Parse(String),
    #[error("io failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("feed returned nothing usable: {0}")]
    Empty(String),
}

pub type FeedResult<T> = Result<T, FeedError>;

/// Boxed future type for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
