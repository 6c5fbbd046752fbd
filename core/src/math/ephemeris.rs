//! Low-precision solar and lunar positions and the equatorial to horizontal
//! conversion used for celestial sources.
//!
//! Series follow the Astronomical Almanac's low-precision formulae: about
//! 0.01° for the Sun and a few tenths of a degree for the Moon, which is
//! plenty for plotting on a sky chart.

use crate::math::angles::AngleHelper;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const J2000_JD: f64 = 2_451_545.0;
const UNIX_EPOCH_JD: f64 = 2_440_587.5;
const MS_PER_DAY: f64 = 86_400_000.0;

/// Right ascension and declination of date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Equatorial {
    pub ra_hours: f64,
    pub dec_deg: f64,
}

impl Equatorial {
    pub fn new(ra_hours: f64, dec_deg: f64) -> Self {
        Self {
            ra_hours: ra_hours.rem_euclid(24.0),
            dec_deg,
        }
    }

    fn from_ecliptic(longitude_deg: f64, latitude_deg: f64, obliquity_deg: f64) -> Self {
        let lambda = AngleHelper::to_radians(longitude_deg);
        let beta = AngleHelper::to_radians(latitude_deg);
        let eps = AngleHelper::to_radians(obliquity_deg);

        let ra = (lambda.sin() * eps.cos() - beta.tan() * eps.sin()).atan2(lambda.cos());
        let dec = (beta.sin() * eps.cos() + beta.cos() * eps.sin() * lambda.sin())
            .clamp(-1.0, 1.0)
            .asin();
        Self::new(
            AngleHelper::to_degrees(AngleHelper::wrap_two_pi(ra)) / 15.0,
            AngleHelper::to_degrees(dec),
        )
    }
}

/// Days since J2000.0 (2000-01-01 12:00 TT, UTC is close enough here).
pub fn days_since_j2000(at: &DateTime<Utc>) -> f64 {
    at.timestamp_millis() as f64 / MS_PER_DAY + UNIX_EPOCH_JD - J2000_JD
}

fn obliquity_deg(days: f64) -> f64 {
    23.439 - 0.000_000_4 * days
}

fn sin_deg(degrees: f64) -> f64 {
    AngleHelper::to_radians(degrees).sin()
}

fn cos_deg(degrees: f64) -> f64 {
    AngleHelper::to_radians(degrees).cos()
}

pub fn sun_equatorial(at: &DateTime<Utc>) -> Equatorial {
    let n = days_since_j2000(at);
    let mean_longitude = 280.460 + 0.985_647_4 * n;
    let mean_anomaly = 357.528 + 0.985_600_3 * n;
    let longitude =
        mean_longitude + 1.915 * sin_deg(mean_anomaly) + 0.020 * sin_deg(2.0 * mean_anomaly);
    Equatorial::from_ecliptic(longitude, 0.0, obliquity_deg(n))
}

/// Geocentric lunar position.
pub fn moon_equatorial(at: &DateTime<Utc>) -> Equatorial {
    let n = days_since_j2000(at);
    let t = n / 36_525.0;
    let longitude = 218.32 + 481_267.881 * t
        + 6.29 * sin_deg(135.0 + 477_198.87 * t)
        - 1.27 * sin_deg(259.3 - 413_335.36 * t)
        + 0.66 * sin_deg(235.7 + 890_534.22 * t)
        + 0.21 * sin_deg(269.9 + 954_397.74 * t)
        - 0.19 * sin_deg(357.5 + 35_999.05 * t)
        - 0.11 * sin_deg(186.5 + 966_404.03 * t);
    let latitude = 5.13 * sin_deg(93.3 + 483_202.02 * t)
        + 0.28 * sin_deg(228.2 + 960_400.89 * t)
        - 0.28 * sin_deg(318.3 + 6_003.15 * t)
        - 0.17 * sin_deg(217.6 - 407_332.21 * t);
    Equatorial::from_ecliptic(longitude, latitude, obliquity_deg(n))
}

/// Lunar horizontal parallax in degrees.
pub fn moon_parallax_deg(at: &DateTime<Utc>) -> f64 {
    let t = days_since_j2000(at) / 36_525.0;
    0.9508
        + 0.0518 * cos_deg(135.0 + 477_198.87 * t)
        + 0.0095 * cos_deg(259.3 - 413_335.36 * t)
        + 0.0078 * cos_deg(235.7 + 890_534.22 * t)
        + 0.0028 * cos_deg(269.9 + 954_397.74 * t)
}

/// Azimuth (north through east) and elevation in degrees.
pub fn horizontal(position: &Equatorial, local_sidereal_hours: f64, latitude_deg: f64) -> (f64, f64) {
    let hour_angle = AngleHelper::to_radians((local_sidereal_hours - position.ra_hours) * 15.0);
    let dec = AngleHelper::to_radians(position.dec_deg);
    let lat = AngleHelper::to_radians(latitude_deg);

    let sin_elevation = (dec.sin() * lat.sin() + dec.cos() * lat.cos() * hour_angle.cos())
        .clamp(-1.0, 1.0);
    let azimuth = (-dec.cos() * hour_angle.sin())
        .atan2(dec.sin() * lat.cos() - dec.cos() * lat.sin() * hour_angle.cos());

    (
        AngleHelper::wrap_degrees(AngleHelper::to_degrees(azimuth)),
        AngleHelper::to_degrees(sin_elevation.asin()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn hours_apart(a: f64, b: f64) -> f64 {
        let diff = (a - b).rem_euclid(24.0);
        diff.min(24.0 - diff)
    }

    fn separation_deg(a: &Equatorial, b: &Equatorial) -> f64 {
        let (ra1, dec1) = (AngleHelper::to_radians(a.ra_hours * 15.0), AngleHelper::to_radians(a.dec_deg));
        let (ra2, dec2) = (AngleHelper::to_radians(b.ra_hours * 15.0), AngleHelper::to_radians(b.dec_deg));
        let cos = dec1.sin() * dec2.sin() + dec1.cos() * dec2.cos() * (ra1 - ra2).cos();
        AngleHelper::to_degrees(cos.clamp(-1.0, 1.0).acos())
    }

    #[test]
    fn sun_crosses_the_equator_at_the_march_equinox() {
        let equinox = Utc.with_ymd_and_hms(2025, 3, 20, 9, 1, 0).unwrap();
        let sun = sun_equatorial(&equinox);
        assert!(sun.dec_deg.abs() < 0.1, "declination {}", sun.dec_deg);
        assert!(hours_apart(sun.ra_hours, 0.0) < 0.01, "right ascension {}", sun.ra_hours);
    }

    #[test]
    fn sun_reaches_the_tropic_at_the_june_solstice() {
        let solstice = Utc.with_ymd_and_hms(2025, 6, 21, 2, 42, 0).unwrap();
        let sun = sun_equatorial(&solstice);
        assert!((sun.dec_deg - 23.44).abs() < 0.05, "declination {}", sun.dec_deg);
        assert!(hours_apart(sun.ra_hours, 6.0) < 0.01);
    }

    #[test]
    fn eclipsed_moon_sits_opposite_the_sun() {
        // total lunar eclipse of 2025-03-14
        let at = Utc.with_ymd_and_hms(2025, 3, 14, 6, 58, 0).unwrap();
        let sun = sun_equatorial(&at);
        let anti_sun = Equatorial::new(sun.ra_hours + 12.0, -sun.dec_deg);
        let moon = moon_equatorial(&at);
        assert!(separation_deg(&moon, &anti_sun) < 1.0);
        assert!((0.85..1.0).contains(&moon_parallax_deg(&at)));
    }

    #[test]
    fn moon_moves_about_thirteen_degrees_a_day() {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        for day in 0..30 {
            let a = moon_equatorial(&(start + chrono::Duration::days(day)));
            let b = moon_equatorial(&(start + chrono::Duration::days(day + 1)));
            let step = separation_deg(&a, &b);
            assert!((11.0..16.0).contains(&step), "day {day}: {step}");
            assert!(a.dec_deg.abs() < 29.0);
        }
    }

    #[test]
    fn meridian_transit_gives_colatitude_elevation_due_south() {
        let (az, el) = horizontal(&Equatorial::new(6.0, 0.0), 6.0, 37.2339);
        assert!((az - 180.0).abs() < 1e-9);
        assert!((el - (90.0 - 37.2339)).abs() < 1e-9);

        let (_, zenith) = horizontal(&Equatorial::new(3.0, 37.2339), 3.0, 37.2339);
        assert!((zenith - 90.0).abs() < 1e-5);
    }

    #[test]
    fn rising_objects_are_east_and_setting_objects_west() {
        let (east, _) = horizontal(&Equatorial::new(12.0, 0.0), 9.0, 37.0);
        let (west, _) = horizontal(&Equatorial::new(12.0, 0.0), 15.0, 37.0);
        assert!((45.0..135.0).contains(&east), "rising azimuth {east}");
        assert!((225.0..315.0).contains(&west), "setting azimuth {west}");
    }

    #[test]
    fn pole_star_altitude_tracks_latitude() {
        let polaris = Equatorial::new(2.53, 89.26);
        for lst in [0.0, 6.0, 12.0, 18.0] {
            let (_, el) = horizontal(&polaris, lst, 37.2339);
            assert!((el - 37.2339).abs() < 0.8, "lst {lst}: {el}");
        }
    }
}
