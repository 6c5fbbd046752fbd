use crate::engine::{CelestialFix, TickFrame, VisibleObject};
use crate::horizon::HorizonModel;
use crate::prelude::{Category, SensorFov};
use crate::render::status::{format_dec, format_ra};
use crate::render::trace::{Glyph, PlotLayout, PlotPoint, PlotSurface, Trace, TraceStyle};
use crate::telemetry::LogManager;
use std::collections::BTreeMap;

/// Rendered ahead of every other category, in this order.
pub const PRIORITY_CATEGORIES: [Category; 3] =
    [Category::Starlink, Category::OneWeb, Category::Station];

const SILHOUETTE_STEP_DEG: f64 = 2.0;
const WEDGE_STEP_DEG: f64 = 2.0;
/// Celestial markers stay on the plot a little below the horizon.
const CELESTIAL_FLOOR_DEG: f64 = -5.0;

/// Turns tick frames into trace updates for the polar and rectangular surfaces.
///
/// The field-of-view wedge and the terrain silhouette form a static prefix
/// that is only rebuilt when the horizon changes; every tick replaces the
/// dynamic traces above it in full.
pub struct RenderBridge {
    fov: Option<SensorFov>,
    background: Vec<Trace>,
    logger: LogManager,
}

impl RenderBridge {
    pub fn new(fov: Option<SensorFov>) -> Self {
        let mut bridge = Self {
            fov,
            background: Vec::new(),
            logger: LogManager::new("render"),
        };
        bridge.set_horizon(&HorizonModel::new());
        bridge
    }

    pub fn background(&self) -> &[Trace] {
        &self.background
    }

    /// Rebuilds the static layers; call [`initialize`](Self::initialize) afterwards.
    pub fn set_horizon(&mut self, horizon: &HorizonModel) {
        self.background.clear();
        if let Some(fov) = &self.fov {
            self.background.push(fov_wedge(fov));
        }
        let silhouette = horizon.silhouette(SILHOUETTE_STEP_DEG);
        if !silhouette.is_empty() {
            self.background.push(Trace {
                name: "Terrain".into(),
                style: TraceStyle {
                    color: [0x5d, 0x40, 0x37],
                    opacity: 0.8,
                    size: 1.5,
                    glyph: Glyph::Skyline,
                },
                points: silhouette
                    .into_iter()
                    .map(|s| PlotPoint::new(s.azimuth_deg, s.elevation_deg))
                    .collect(),
                labels: Vec::new(),
                show_in_legend: false,
            });
        }
        self.logger
            .detail(&format!("{} static layers", self.background.len()));
    }

    pub fn initialize(&self, polar: &mut dyn PlotSurface, rectangular: &mut dyn PlotSurface) {
        polar.configure(&PlotLayout::polar(), self.background.clone());
        rectangular.configure(&PlotLayout::rectangular(), self.background.clone());
    }

    pub fn render(
        &self,
        frame: &TickFrame,
        polar: &mut dyn PlotSurface,
        rectangular: &mut dyn PlotSurface,
    ) {
        let traces = Self::dynamic_traces(frame);
        rectangular.replace_traces(traces.clone());
        polar.replace_traces(traces);
    }

    /// Category-grouped traces for one frame. Empty categories produce nothing.
    pub fn dynamic_traces(frame: &TickFrame) -> Vec<Trace> {
        let mut groups: BTreeMap<Category, Vec<&VisibleObject>> = BTreeMap::new();
        for object in &frame.satellites {
            groups.entry(object.category).or_default().push(object);
        }

        let mut traces = Vec::with_capacity(groups.len() + 1);
        for category in PRIORITY_CATEGORIES {
            if let Some(objects) = groups.remove(&category) {
                traces.push(category_trace(category, &objects));
            }
        }
        for (category, objects) in &groups {
            traces.push(category_trace(*category, objects));
        }

        if !frame.aircraft.is_empty() {
            let aircraft: Vec<&VisibleObject> = frame.aircraft.iter().collect();
            traces.push(category_trace(Category::Aircraft, &aircraft));
        }

        traces.extend(
            frame
                .celestial
                .iter()
                .filter(|fix| fix.track.len() > 1)
                .map(track_trace),
        );
        let mut bodies: BTreeMap<Category, Vec<&CelestialFix>> = BTreeMap::new();
        for fix in frame
            .celestial
            .iter()
            .filter(|fix| fix.elevation_deg > CELESTIAL_FLOOR_DEG)
        {
            bodies.entry(fix.category).or_default().push(fix);
        }
        for (category, fixes) in &bodies {
            traces.push(celestial_trace(*category, fixes));
        }
        traces
    }
}

fn track_trace(fix: &CelestialFix) -> Trace {
    Trace {
        name: format!("{} track", fix.name),
        style: TraceStyle::track(fix.category),
        points: fix
            .track
            .iter()
            .map(|p| PlotPoint::new(p.azimuth_deg, p.elevation_deg))
            .collect(),
        labels: Vec::new(),
        show_in_legend: false,
    }
}

fn celestial_trace(category: Category, fixes: &[&CelestialFix]) -> Trace {
    Trace {
        name: format!("{} ({})", category.label(), fixes.len()),
        style: TraceStyle::for_category(category),
        points: fixes
            .iter()
            .map(|f| PlotPoint::new(f.azimuth_deg, f.elevation_deg))
            .collect(),
        labels: fixes
            .iter()
            .map(|f| {
                format!(
                    "{} az {:.1} el {:.1} RA {} Dec {}",
                    f.name,
                    f.azimuth_deg,
                    f.elevation_deg,
                    format_ra(f.ra_hours),
                    format_dec(f.dec_deg)
                )
            })
            .collect(),
        show_in_legend: true,
    }
}

fn category_trace(category: Category, objects: &[&VisibleObject]) -> Trace {
    Trace {
        name: format!("{} ({})", category.label(), objects.len()),
        style: TraceStyle::for_category(category),
        points: objects
            .iter()
            .map(|o| PlotPoint::new(o.azimuth_deg, o.elevation_deg))
            .collect(),
        labels: objects
            .iter()
            .map(|o| {
                format!(
                    "{} az {:.1} el {:.1} {:.0} km",
                    o.name, o.azimuth_deg, o.elevation_deg, o.range_km
                )
            })
            .collect(),
        show_in_legend: true,
    }
}

fn fov_wedge(fov: &SensorFov) -> Trace {
    let span = fov.azimuth_span_deg.clamp(0.0, 360.0);
    let start = fov.azimuth_deg - span / 2.0;
    let steps = ((span / WEDGE_STEP_DEG).ceil() as usize).max(1);
    let arc = move |elevation: f64| {
        (0..=steps).map(move |i| {
            let azimuth = start + span * i as f64 / steps as f64;
            PlotPoint::new(azimuth.rem_euclid(360.0), elevation)
        })
    };

    let mut points: Vec<PlotPoint> = arc(fov.min_elevation_deg).collect();
    let mut upper: Vec<PlotPoint> = arc(fov.max_elevation_deg).collect();
    upper.reverse();
    points.extend(upper);

    Trace {
        name: "Sensor FOV".into(),
        style: TraceStyle {
            color: [0x00, 0xff, 0x00],
            opacity: 0.12,
            size: 1.0,
            glyph: Glyph::Outline,
        },
        points,
        labels: Vec::new(),
        show_in_legend: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::SkyPoint;
    use crate::horizon::HorizonSample;
    use crate::render::trace::SurfaceModel;
    use chrono::Utc;

    fn visible(name: &str, category: Category) -> VisibleObject {
        VisibleObject {
            name: name.into(),
            category,
            azimuth_deg: 100.0,
            elevation_deg: 30.0,
            range_km: 900.0,
            in_fov: false,
        }
    }

    fn frame(satellites: Vec<VisibleObject>, aircraft: Vec<VisibleObject>) -> TickFrame {
        TickFrame {
            timestamp: Utc::now(),
            local_sidereal_hours: 0.0,
            satellites,
            aircraft,
            blocked_satellites: 0,
            blocked_aircraft: 0,
            celestial: Vec::new(),
        }
    }

    /// Records every call so tests can check what a surface was told.
    #[derive(Default)]
    struct RecordingSurface {
        configured: usize,
        replacements: Vec<Vec<String>>,
    }

    impl PlotSurface for RecordingSurface {
        fn configure(&mut self, _layout: &PlotLayout, _background: Vec<Trace>) {
            self.configured += 1;
        }

        fn replace_traces(&mut self, traces: Vec<Trace>) {
            self.replacements
                .push(traces.into_iter().map(|t| t.name).collect());
        }
    }

    #[test]
    fn priority_categories_lead_then_stable_order_then_aircraft() {
        let frame = frame(
            vec![
                visible("GPS BIIR-2", Category::Gps),
                visible("NOAA 19", Category::Other),
                visible("ISS (ZARYA)", Category::Station),
                visible("STARLINK-1", Category::Starlink),
                visible("IRIDIUM 106", Category::Iridium),
                visible("STARLINK-2", Category::Starlink),
            ],
            vec![visible("UAL123", Category::Aircraft)],
        );

        let names: Vec<String> = RenderBridge::dynamic_traces(&frame)
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(
            names,
            vec![
                "Starlink (2)",
                "Stations (1)",
                "Iridium (1)",
                "GPS (1)",
                "Other (1)",
                "Aircraft (1)"
            ]
        );
    }

    fn body(name: &str, category: Category, elevation_deg: f64, track_len: usize) -> CelestialFix {
        CelestialFix {
            name: name.into(),
            category,
            azimuth_deg: 120.0,
            elevation_deg,
            ra_hours: 5.575,
            dec_deg: 22.01,
            above_skyline: elevation_deg > 0.0,
            in_fov: false,
            track: (0..track_len)
                .map(|i| SkyPoint {
                    azimuth_deg: 120.0 + i as f64,
                    elevation_deg,
                })
                .collect(),
        }
    }

    #[test]
    fn celestial_tracks_then_markers_follow_aircraft() {
        let mut frame = frame(
            vec![visible("STARLINK-1", Category::Starlink)],
            vec![visible("UAL123", Category::Aircraft)],
        );
        frame.celestial = vec![
            body("Crab", Category::Source, 40.0, 12),
            body("Moon", Category::Moon, -3.0, 0),
            body("Sun", Category::Sun, -20.0, 0),
            body("Cas A", Category::Source, 10.0, 1),
        ];

        let traces = RenderBridge::dynamic_traces(&frame);
        let names: Vec<&str> = traces.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Starlink (1)", "Aircraft (1)", "Crab track", "Moon (1)", "Sources (2)"]
        );
        assert_eq!(traces[2].style.glyph, Glyph::Path);
        assert_eq!(traces[2].points.len(), 12);
        assert!(!traces[2].show_in_legend);
        assert_eq!(traces[4].labels[0], "Crab az 120.0 el 40.0 RA 05h 34m 30.00s Dec +22deg 00' 36.0\"");
    }

    #[test]
    fn empty_frame_yields_no_dynamic_traces() {
        assert!(RenderBridge::dynamic_traces(&frame(Vec::new(), Vec::new())).is_empty());
    }

    #[test]
    fn aircraft_trace_uses_square_glyph() {
        let traces =
            RenderBridge::dynamic_traces(&frame(Vec::new(), vec![visible("N42", Category::Aircraft)]));
        assert_eq!(traces.len(), 1);
        assert_eq!(traces[0].style.glyph, Glyph::Square);
        assert!(traces[0].labels[0].starts_with("N42 az 100.0 el 30.0"));
    }

    #[test]
    fn static_layers_follow_fov_and_horizon() {
        let mut bridge = RenderBridge::new(Some(SensorFov::default()));
        assert_eq!(bridge.background().len(), 1);
        assert_eq!(bridge.background()[0].style.glyph, Glyph::Outline);

        bridge.set_horizon(&HorizonModel::from_samples(vec![
            HorizonSample::new(0.0, 1.0),
            HorizonSample::new(180.0, 3.0),
        ]));
        assert_eq!(bridge.background().len(), 2);
        let terrain = &bridge.background()[1];
        assert_eq!(terrain.points.len(), 181);

        let bare = RenderBridge::new(None);
        assert!(bare.background().is_empty());
    }

    #[test]
    fn fov_wedge_wraps_through_north() {
        let wedge = fov_wedge(&SensorFov {
            azimuth_deg: 0.0,
            azimuth_span_deg: 20.0,
            min_elevation_deg: 5.0,
            max_elevation_deg: 60.0,
        });
        assert!(wedge
            .points
            .iter()
            .all(|p| (0.0..360.0).contains(&p.azimuth_deg)));
        assert_eq!(wedge.points.first().map(|p| p.azimuth_deg), Some(350.0));
        assert_eq!(wedge.points.len(), 22);
    }

    #[test]
    fn render_replaces_dynamic_layers_on_both_surfaces() {
        let bridge = RenderBridge::new(Some(SensorFov::default()));
        let mut polar = SurfaceModel::default();
        let mut rectangular = RecordingSurface::default();
        bridge.initialize(&mut polar, &mut rectangular);

        bridge.render(
            &frame(vec![visible("STARLINK-1", Category::Starlink)], Vec::new()),
            &mut polar,
            &mut rectangular,
        );
        bridge.render(&frame(Vec::new(), Vec::new()), &mut polar, &mut rectangular);

        assert_eq!(rectangular.configured, 1);
        assert_eq!(rectangular.replacements.len(), 2);
        assert!(rectangular.replacements[1].is_empty());
        assert_eq!(polar.traces.len(), 1);
        assert_eq!(polar.traces[0].name, "Sensor FOV");
        assert_eq!(polar.layout.as_ref().map(|l| l.kind), Some(crate::render::PlotKind::Polar));
    }
}
