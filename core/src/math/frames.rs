use crate::math::angles::AngleHelper;
use crate::prelude::ObserverSite;
use chrono::{DateTime, Utc};
use sgp4::WGS84;
use std::f64::consts::PI;

/// WGS84 flattening, paired with the WGS84 equatorial radius below.
const FLAT_FACTOR: f64 = 1.0 / 298.257_223_563;

/// Greenwich sidereal angle in radians for the given instant.
pub fn sidereal_angle(at: &DateTime<Utc>) -> f64 {
    sgp4::iau_epoch_to_sidereal_time(sgp4::julian_years_since_j2000(&at.naive_utc()))
}

/// Local sidereal time in hours, `[0, 24)`, at the given east longitude.
pub fn local_sidereal_hours(longitude_deg: f64, at: &DateTime<Utc>) -> f64 {
    let theta = AngleHelper::wrap_two_pi(sidereal_angle(at) + AngleHelper::to_radians(longitude_deg));
    theta * 12.0 / PI
}

/// Position of a point on (or above) the ellipsoid in the propagator's
/// inertial frame, km. `theta` is the local sidereal angle of the point.
fn inertial_position(lat_rad: f64, altitude_km: f64, theta: f64) -> [f64; 3] {
    let c = 1.0 / (1.0 + FLAT_FACTOR * (FLAT_FACTOR - 2.0) * lat_rad.sin().powi(2)).sqrt();
    let s = (1.0 - FLAT_FACTOR).powi(2) * c;
    let achcp = (WGS84.ae * c + altitude_km) * lat_rad.cos();

    [
        achcp * theta.cos(),
        achcp * theta.sin(),
        (WGS84.ae * s + altitude_km) * lat_rad.sin(),
    ]
}

/// Observer-relative look angle. Angles in radians, range in km.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LookAngle {
    pub azimuth: f64,
    pub elevation: f64,
    pub range_km: f64,
}

impl LookAngle {
    /// Azimuth and elevation in degrees.
    pub fn degrees(&self) -> (f64, f64) {
        (
            AngleHelper::to_degrees(self.azimuth),
            AngleHelper::to_degrees(self.elevation),
        )
    }
}

/// South-east-zenith frame of the observer, fixed for one instant.
#[derive(Debug, Clone, Copy)]
pub struct TopocentricFrame {
    origin: [f64; 3],
    sidereal: f64,
    theta: f64,
    sin_lat: f64,
    cos_lat: f64,
    sin_theta: f64,
    cos_theta: f64,
}

impl TopocentricFrame {
    pub fn new(site: &ObserverSite, at: &DateTime<Utc>) -> Self {
        let sidereal = sidereal_angle(at);
        let lat = AngleHelper::to_radians(site.latitude_deg);
        let theta = AngleHelper::wrap_two_pi(sidereal + AngleHelper::to_radians(site.longitude_deg));

        Self {
            origin: inertial_position(lat, site.altitude_m / 1000.0, theta),
            sidereal,
            theta,
            sin_lat: lat.sin(),
            cos_lat: lat.cos(),
            sin_theta: theta.sin(),
            cos_theta: theta.cos(),
        }
    }

    /// Inertial position of a geodetic point (degrees, km) at this frame's instant.
    pub fn geodetic_position(&self, latitude_deg: f64, longitude_deg: f64, altitude_km: f64) -> [f64; 3] {
        let theta = AngleHelper::wrap_two_pi(self.sidereal + AngleHelper::to_radians(longitude_deg));
        inertial_position(AngleHelper::to_radians(latitude_deg), altitude_km, theta)
    }

    pub fn look_angle(&self, target: &[f64; 3]) -> LookAngle {
        let d = [
            target[0] - self.origin[0],
            target[1] - self.origin[1],
            target[2] - self.origin[2],
        ];
        let range_km = (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt();

        let top_s = self.sin_lat * self.cos_theta * d[0] + self.sin_lat * self.sin_theta * d[1]
            - self.cos_lat * d[2];
        let top_e = -self.sin_theta * d[0] + self.cos_theta * d[1];
        let top_z = self.cos_lat * self.cos_theta * d[0]
            + self.cos_lat * self.sin_theta * d[1]
            + self.sin_lat * d[2];

        let azimuth = AngleHelper::wrap_two_pi(top_e.atan2(-top_s));
        let elevation = if range_km > 0.0 {
            (top_z / range_km).clamp(-1.0, 1.0).asin()
        } else {
            PI / 2.0
        };

        LookAngle {
            azimuth,
            elevation,
            range_km,
        }
    }

    /// Inverse of [`look_angle`](Self::look_angle).
    pub fn position_at(&self, look: &LookAngle) -> [f64; 3] {
        let horizontal = look.range_km * look.elevation.cos();
        let top_s = -horizontal * look.azimuth.cos();
        let top_e = horizontal * look.azimuth.sin();
        let top_z = look.range_km * look.elevation.sin();

        [
            self.origin[0]
                + self.sin_lat * self.cos_theta * top_s
                + -self.sin_theta * top_e
                + self.cos_lat * self.cos_theta * top_z,
            self.origin[1]
                + self.sin_lat * self.sin_theta * top_s
                + self.cos_theta * top_e
                + self.cos_lat * self.sin_theta * top_z,
            self.origin[2] - self.cos_lat * top_s + self.sin_lat * top_z,
        ]
    }

    /// Local sidereal time in hours, `[0, 24)`.
    pub fn local_sidereal_hours(&self) -> f64 {
        self.theta * 12.0 / PI
    }
}
