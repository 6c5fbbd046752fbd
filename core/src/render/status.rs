use crate::engine::TickFrame;
use chrono::{DateTime, FixedOffset, Local, Utc};
use serde::{Deserialize, Serialize};

const CLOCK_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Text slots written once per tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusFields {
    pub utc: String,
    pub observer_local: String,
    pub viewer_local: String,
    pub sidereal: String,
    pub satellites_visible: usize,
    pub satellites_blocked: usize,
    pub satellites_in_fov: usize,
    pub aircraft_visible: usize,
    pub aircraft_blocked: usize,
    pub aircraft_in_fov: usize,
    #[serde(default)]
    pub sources_up: usize,
}

impl StatusFields {
    pub fn from_frame(frame: &TickFrame, utc_offset_hours: f64) -> Self {
        Self {
            utc: format!("{} UTC", frame.timestamp.format(CLOCK_FORMAT)),
            observer_local: observer_clock(&frame.timestamp, utc_offset_hours),
            viewer_local: frame
                .timestamp
                .with_timezone(&Local)
                .format(CLOCK_FORMAT)
                .to_string(),
            sidereal: format_sidereal(frame.local_sidereal_hours),
            satellites_visible: frame.satellites.len(),
            satellites_blocked: frame.blocked_satellites,
            satellites_in_fov: frame.satellites_in_fov(),
            aircraft_visible: frame.aircraft.len(),
            aircraft_blocked: frame.blocked_aircraft,
            aircraft_in_fov: frame.aircraft_in_fov(),
            sources_up: frame.celestial_up(),
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "satellites {} visible / {} blocked / {} in FOV, aircraft {} visible / {} blocked / {} in FOV, {} sources up",
            self.satellites_visible,
            self.satellites_blocked,
            self.satellites_in_fov,
            self.aircraft_visible,
            self.aircraft_blocked,
            self.aircraft_in_fov,
            self.sources_up
        )
    }
}

/// Clock at a fixed UTC offset. Offsets outside +/-24h fall back to UTC.
pub fn observer_clock(at: &DateTime<Utc>, utc_offset_hours: f64) -> String {
    let seconds = (utc_offset_hours * 3600.0).round();
    let offset = if seconds.is_finite() && seconds.abs() < 86_400.0 {
        FixedOffset::east_opt(seconds as i32)
    } else {
        None
    };
    match offset {
        Some(offset) => format!(
            "{} (UTC{})",
            at.with_timezone(&offset).format(CLOCK_FORMAT),
            offset
        ),
        None => format!("{} UTC", at.format(CLOCK_FORMAT)),
    }
}

/// `HHh MMm SSs`, wrapped into one sidereal day.
pub fn format_sidereal(hours: f64) -> String {
    let total = (hours.rem_euclid(24.0) * 3600.0).floor() as u64 % 86_400;
    format!(
        "{:02}h {:02}m {:02}s",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

/// Right ascension as `HHh MMm SS.SSs`.
pub fn format_ra(hours: f64) -> String {
    let centis = (hours.rem_euclid(24.0) * 360_000.0).round() as u64 % 8_640_000;
    format!(
        "{:02}h {:02}m {:02}.{:02}s",
        centis / 360_000,
        (centis / 6_000) % 60,
        (centis / 100) % 60,
        centis % 100
    )
}

/// Declination as `+DDdeg MM' SS.S"`.
pub fn format_dec(degrees: f64) -> String {
    let sign = if degrees < 0.0 { '-' } else { '+' };
    let tenths = (degrees.abs() * 36_000.0).round() as u64;
    format!(
        "{sign}{:02}deg {:02}' {:02}.{}\"",
        tenths / 36_000,
        (tenths / 600) % 60,
        (tenths / 10) % 60,
        tenths % 10
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::VisibleObject;
    use crate::prelude::Category;
    use chrono::TimeZone;

    #[test]
    fn sidereal_time_is_formatted_in_hours_minutes_seconds() {
        assert_eq!(format_sidereal(0.0), "00h 00m 00s");
        assert_eq!(format_sidereal(13.75), "13h 45m 00s");
        assert_eq!(format_sidereal(1.0078125), "01h 00m 28s");
        assert_eq!(format_sidereal(25.0), "01h 00m 00s");
        assert_eq!(format_sidereal(-1.0), "23h 00m 00s");
    }

    #[test]
    fn equatorial_coordinates_are_formatted_sexagesimally() {
        assert_eq!(format_ra(5.575), "05h 34m 30.00s");
        assert_eq!(format_ra(23.999_999_99), "00h 00m 00.00s");
        assert_eq!(format_dec(-22.01), "-22deg 00' 36.0\"");
        assert_eq!(format_dec(41.2691), "+41deg 16' 08.8\"");
    }

    #[test]
    fn observer_clock_applies_offset() {
        let at = Utc.with_ymd_and_hms(2025, 3, 14, 6, 30, 0).unwrap();
        assert_eq!(observer_clock(&at, -8.0), "2025-03-13 22:30:00 (UTC-08:00)");
        assert_eq!(observer_clock(&at, 5.5), "2025-03-14 12:00:00 (UTC+05:30)");
        assert_eq!(observer_clock(&at, 40.0), "2025-03-14 06:30:00 UTC");
    }

    #[test]
    fn counts_come_from_the_frame() {
        let object = VisibleObject {
            name: "ISS (ZARYA)".into(),
            category: Category::Station,
            azimuth_deg: 180.0,
            elevation_deg: 40.0,
            range_km: 600.0,
            in_fov: true,
        };
        let frame = TickFrame {
            timestamp: Utc.with_ymd_and_hms(2025, 3, 14, 6, 30, 0).unwrap(),
            local_sidereal_hours: 6.0,
            satellites: vec![object.clone(), VisibleObject { in_fov: false, ..object }],
            aircraft: Vec::new(),
            blocked_satellites: 4,
            blocked_aircraft: 1,
            celestial: Vec::new(),
        };

        let status = StatusFields::from_frame(&frame, -8.0);
        assert_eq!(status.utc, "2025-03-14 06:30:00 UTC");
        assert_eq!(status.sidereal, "06h 00m 00s");
        assert_eq!(status.satellites_visible, 2);
        assert_eq!(status.satellites_in_fov, 1);
        assert_eq!(status.satellites_blocked, 4);
        assert_eq!(status.aircraft_blocked, 1);
        assert!(status.summary().starts_with("satellites 2 visible / 4 blocked / 1 in FOV"));
    }
}
