use serde::{Deserialize, Serialize};
use skycore::engine::{CelestialFix, VisibleObject};
use skycore::prelude::Category;
use skycore::render::{format_dec, format_ra, StatusFields, SurfaceModel};
use skycore::telemetry::MetricsSnapshot;

/// Everything the viewer needs to repaint: both plot surfaces, status slots and counters.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VisualizationModel {
    pub observer: String,
    pub polar: SurfaceModel,
    pub rectangular: SurfaceModel,
    pub status: StatusFields,
    pub metrics: MetricsSnapshot,
    /// Visible satellites followed by visible aircraft.
    pub sources: Vec<VisibleObject>,
    /// Sun, Moon and configured sources, whether up or not.
    #[serde(default)]
    pub celestial: Vec<CelestialFix>,
}

impl VisualizationModel {
    pub fn new(observer: impl Into<String>) -> Self {
        Self {
            observer: observer.into(),
            ..Self::default()
        }
    }

    pub fn data_reply(&self) -> DataReply {
        DataReply {
            time: TimeFields {
                utc: self.status.utc.clone(),
                local: self.status.observer_local.clone(),
                lst: self.status.sidereal.clone(),
            },
            sources: self
                .celestial
                .iter()
                .map(|fix| SourceEntry {
                    name: fix.name.clone(),
                    category: fix.category,
                    az: round2(fix.azimuth_deg),
                    el: round2(fix.elevation_deg),
                    range_km: None,
                    in_fov: fix.in_fov,
                    ra: Some(format_ra(fix.ra_hours)),
                    dec: Some(format_dec(fix.dec_deg)),
                })
                .chain(self.sources.iter().map(|source| SourceEntry {
                    name: source.name.clone(),
                    category: source.category,
                    az: round2(source.azimuth_deg),
                    el: round2(source.elevation_deg),
                    range_km: Some(round2(source.range_km)),
                    in_fov: source.in_fov,
                    ra: None,
                    dec: None,
                }))
                .collect(),
        }
    }
}

/// Compact `/data` payload for scripting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataReply {
    pub time: TimeFields,
    pub sources: Vec<SourceEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeFields {
    pub utc: String,
    pub local: String,
    pub lst: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceEntry {
    pub name: String,
    pub category: Category,
    pub az: f64,
    pub el: f64,
    /// Absent for celestial sources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range_km: Option<f64>,
    pub in_fov: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ra: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dec: Option<String>,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_reply_rounds_angles() {
        let mut model = VisualizationModel::new("Test Site");
        model.status.sidereal = "01h 02m 03s".into();
        model.sources.push(VisibleObject {
            name: "ISS (ZARYA)".into(),
            category: Category::Station,
            azimuth_deg: 123.456,
            elevation_deg: 45.678,
            range_km: 812.349,
            in_fov: false,
        });

        let reply = model.data_reply();
        assert_eq!(reply.time.lst, "01h 02m 03s");
        assert_eq!(reply.sources.len(), 1);
        assert_eq!(reply.sources[0].az, 123.46);
        assert_eq!(reply.sources[0].el, 45.68);
        assert_eq!(reply.sources[0].category, Category::Station);
        assert_eq!(reply.sources[0].range_km, Some(812.35));
        assert_eq!(reply.sources[0].ra, None);
    }

    #[test]
    fn celestial_entries_lead_with_equatorial_coordinates() {
        let mut model = VisualizationModel::new("Test Site");
        model.sources.push(VisibleObject {
            name: "N12345".into(),
            category: Category::Aircraft,
            azimuth_deg: 10.0,
            elevation_deg: 3.0,
            range_km: 40.0,
            in_fov: false,
        });
        model.celestial.push(CelestialFix {
            name: "Crab".into(),
            category: Category::Source,
            azimuth_deg: 201.234,
            elevation_deg: 55.5,
            ra_hours: 5.575,
            dec_deg: 22.01,
            above_skyline: true,
            in_fov: true,
            track: Vec::new(),
        });

        let reply = model.data_reply();
        let names: Vec<&str> = reply.sources.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Crab", "N12345"]);
        assert_eq!(reply.sources[0].az, 201.23);
        assert_eq!(reply.sources[0].ra.as_deref(), Some("05h 34m 30.00s"));
        assert_eq!(reply.sources[0].dec.as_deref(), Some("+22deg 00' 36.0\""));

        let json = serde_json::to_value(&reply).unwrap();
        assert!(json["sources"][0].get("range_km").is_none());
        assert!(json["sources"][1].get("ra").is_none());
    }
}
