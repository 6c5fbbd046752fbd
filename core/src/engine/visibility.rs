use crate::horizon::HorizonModel;
use crate::math::{horizontal, local_sidereal_hours, AngleHelper, Equatorial, LookAngle, TopocentricFrame};
use crate::objects::{Catalog, CelestialSource, SharedState, TrackWindow, TrackedAircraft};
use crate::prelude::{Category, ObserverSite, SensorFov, Thresholds};
use crate::telemetry::LogManager;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An object above its local skyline at one tick. Angles in degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisibleObject {
    pub name: String,
    pub category: Category,
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
    pub range_km: f64,
    pub in_fov: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkyPoint {
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
}

/// A celestial source at one tick, reported whether or not it is up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CelestialFix {
    pub name: String,
    pub category: Category,
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
    pub ra_hours: f64,
    pub dec_deg: f64,
    pub above_skyline: bool,
    pub in_fov: bool,
    /// Forward path from now until the source drops behind the skyline.
    /// Empty while the source is down.
    #[serde(default)]
    pub track: Vec<SkyPoint>,
}

/// Output of one visibility tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickFrame {
    pub timestamp: DateTime<Utc>,
    pub local_sidereal_hours: f64,
    pub satellites: Vec<VisibleObject>,
    pub aircraft: Vec<VisibleObject>,
    pub blocked_satellites: usize,
    pub blocked_aircraft: usize,
    #[serde(default)]
    pub celestial: Vec<CelestialFix>,
}

impl TickFrame {
    pub fn celestial_up(&self) -> usize {
        self.celestial.iter().filter(|c| c.above_skyline).count()
    }

    pub fn satellites_in_fov(&self) -> usize {
        self.satellites.iter().filter(|o| o.in_fov).count()
    }

    pub fn aircraft_in_fov(&self) -> usize {
        self.aircraft.iter().filter(|o| o.in_fov).count()
    }
}

/// Per-tick recomputation of observer-relative look angles.
///
/// Holds no state between ticks; everything it reads comes from the
/// [`SharedState`] snapshot taken at the start of [`tick`](Self::tick).
pub struct VisibilityEngine {
    site: ObserverSite,
    thresholds: Thresholds,
    fov: SensorFov,
    sources: Vec<CelestialSource>,
    track: TrackWindow,
    logger: LogManager,
}

impl VisibilityEngine {
    pub fn new(site: ObserverSite, thresholds: Thresholds, fov: SensorFov) -> Self {
        Self {
            site,
            thresholds,
            fov,
            sources: Vec::new(),
            track: TrackWindow::default(),
            logger: LogManager::new("visibility"),
        }
    }

    /// Adds clock-driven sources evaluated on every tick.
    pub fn with_sources(mut self, sources: Vec<CelestialSource>, track: TrackWindow) -> Self {
        self.sources = sources;
        self.track = track;
        self
    }

    pub fn sources(&self) -> &[CelestialSource] {
        &self.sources
    }

    pub fn site(&self) -> &ObserverSite {
        &self.site
    }

    pub fn fov(&self) -> &SensorFov {
        &self.fov
    }

    pub fn tick(&self, state: &SharedState, now: DateTime<Utc>) -> TickFrame {
        let horizon = state.horizon();
        let catalog = state.catalog();
        let aircraft = state.aircraft();
        self.evaluate(&horizon, &catalog, &aircraft, now)
    }

    pub fn evaluate(
        &self,
        horizon: &HorizonModel,
        catalog: &Catalog,
        aircraft: &[TrackedAircraft],
        now: DateTime<Utc>,
    ) -> TickFrame {
        let frame = TopocentricFrame::new(&self.site, &now);

        let mut satellites = Vec::new();
        let mut blocked_satellites = 0;
        for object in catalog.objects() {
            let Some(position) = object.position_at(&now) else {
                continue;
            };
            let look = frame.look_angle(&position);
            let (azimuth_deg, elevation_deg) = look.degrees();
            if elevation_deg > horizon.occlusion_elevation(azimuth_deg) {
                satellites.push(self.visible(&object.name, object.category, &look));
            } else if elevation_deg > self.thresholds.deep_occlusion_deg {
                blocked_satellites += 1;
            }
        }

        let mut visible_aircraft = Vec::new();
        let mut blocked_aircraft = 0;
        for plane in aircraft {
            let position =
                frame.geodetic_position(plane.latitude_deg, plane.longitude_deg, plane.altitude_km);
            let look = frame.look_angle(&position);
            let (azimuth_deg, elevation_deg) = look.degrees();
            let threshold =
                horizon.occlusion_elevation(azimuth_deg) - self.thresholds.aircraft_margin_deg;
            if elevation_deg > threshold {
                visible_aircraft.push(self.visible(&plane.callsign, Category::Aircraft, &look));
            } else {
                blocked_aircraft += 1;
            }
        }

        let local_sidereal = frame.local_sidereal_hours();
        let celestial: Vec<CelestialFix> = self
            .sources
            .iter()
            .map(|source| self.celestial_fix(source, horizon, now, local_sidereal))
            .collect();

        self.logger.detail(&format!(
            "tick: {} satellites ({} blocked), {} aircraft ({} blocked), {} of {} sources up",
            satellites.len(),
            blocked_satellites,
            visible_aircraft.len(),
            blocked_aircraft,
            celestial.iter().filter(|c| c.above_skyline).count(),
            celestial.len()
        ));

        TickFrame {
            timestamp: now,
            local_sidereal_hours: local_sidereal,
            satellites,
            aircraft: visible_aircraft,
            blocked_satellites,
            blocked_aircraft,
            celestial,
        }
    }

    fn sky_position(
        &self,
        source: &CelestialSource,
        at: &DateTime<Utc>,
        local_sidereal: f64,
    ) -> (SkyPoint, Equatorial) {
        let position = source.equatorial_at(at);
        let (azimuth_deg, geocentric_deg) = horizontal(&position, local_sidereal, self.site.latitude_deg);
        let parallax = AngleHelper::to_radians(source.parallax_deg(at));
        let shift = (parallax.sin() * AngleHelper::to_radians(geocentric_deg).cos()).asin();
        let point = SkyPoint {
            azimuth_deg,
            elevation_deg: geocentric_deg - AngleHelper::to_degrees(shift),
        };
        (point, position)
    }

    fn celestial_fix(
        &self,
        source: &CelestialSource,
        horizon: &HorizonModel,
        now: DateTime<Utc>,
        local_sidereal: f64,
    ) -> CelestialFix {
        let (point, position) = self.sky_position(source, &now, local_sidereal);
        let above_skyline = point.elevation_deg > horizon.occlusion_elevation(point.azimuth_deg);
        let track = if above_skyline {
            self.forward_track(source, horizon, now, point)
        } else {
            Vec::new()
        };

        CelestialFix {
            name: source.name.clone(),
            category: source.category(),
            azimuth_deg: point.azimuth_deg,
            elevation_deg: point.elevation_deg,
            ra_hours: position.ra_hours,
            dec_deg: position.dec_deg,
            above_skyline,
            in_fov: self.fov.contains(point.azimuth_deg, point.elevation_deg),
            track,
        }
    }

    fn forward_track(
        &self,
        source: &CelestialSource,
        horizon: &HorizonModel,
        now: DateTime<Utc>,
        start: SkyPoint,
    ) -> Vec<SkyPoint> {
        let step = self.track.step();
        let mut points = vec![start];
        for index in 1..=self.track.steps() {
            let at = now + step * index as i32;
            let local_sidereal = local_sidereal_hours(self.site.longitude_deg, &at);
            let (point, _) = self.sky_position(source, &at, local_sidereal);
            if point.elevation_deg <= horizon.occlusion_elevation(point.azimuth_deg) {
                break;
            }
            points.push(point);
        }
        points
    }

    fn visible(&self, name: &str, category: Category, look: &LookAngle) -> VisibleObject {
        let (azimuth_deg, elevation_deg) = look.degrees();
        VisibleObject {
            name: name.to_string(),
            category,
            azimuth_deg,
            elevation_deg,
            range_km: look.range_km,
            in_fov: self.fov.contains(azimuth_deg, elevation_deg),
        }
    }
}
