use crate::prelude::Category;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlotKind {
    /// Zenith at the centre, horizon at the rim, north up, azimuth clockwise.
    Polar,
    /// Azimuth along x, elevation along y.
    Rectangular,
}

/// How a trace's points are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Glyph {
    Circle,
    Square,
    /// Closed polygon through the points, filled.
    Outline,
    /// Curve through the points, filled down to the plot floor.
    Skyline,
    /// Open line through the points.
    Path,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TraceStyle {
    pub color: [u8; 3],
    pub opacity: f32,
    pub size: f32,
    pub glyph: Glyph,
}

impl TraceStyle {
    pub fn for_category(category: Category) -> Self {
        let color = match category {
            Category::Starlink => [0x4f, 0xc3, 0xf7],
            Category::OneWeb => [0xba, 0x68, 0xc8],
            Category::Station => [0xff, 0xf1, 0x76],
            Category::Iridium => [0x81, 0xc7, 0x84],
            Category::Gps => [0xff, 0x8a, 0x65],
            Category::Glonass => [0xe5, 0x73, 0x73],
            Category::Galileo => [0x64, 0xb5, 0xf6],
            Category::Beidou => [0xf0, 0x62, 0x92],
            Category::Other => [0x00, 0x8b, 0x8b],
            Category::Aircraft => [0xff, 0xff, 0xff],
            Category::Sun => [0xff, 0xd7, 0x00],
            Category::Moon => [0xc0, 0xc0, 0xc0],
            Category::Source => [0x00, 0xff, 0xff],
        };
        match category {
            Category::Aircraft => Self {
                color,
                opacity: 1.0,
                size: 9.0,
                glyph: Glyph::Square,
            },
            Category::Station => Self {
                color,
                opacity: 1.0,
                size: 7.0,
                glyph: Glyph::Circle,
            },
            Category::Sun | Category::Moon => Self {
                color,
                opacity: 1.0,
                size: 13.0,
                glyph: Glyph::Circle,
            },
            Category::Source => Self {
                color,
                opacity: 1.0,
                size: 8.0,
                glyph: Glyph::Circle,
            },
            _ => Self {
                color,
                opacity: 0.85,
                size: 4.5,
                glyph: Glyph::Circle,
            },
        }
    }

    /// Line style for a celestial source's forward path.
    pub fn track(category: Category) -> Self {
        let color = match category {
            Category::Sun => [0xff, 0xd7, 0x00],
            Category::Moon => [0xc0, 0xc0, 0xc0],
            _ => [0x00, 0x8b, 0x8b],
        };
        Self {
            color,
            opacity: 0.6,
            size: 1.5,
            glyph: Glyph::Path,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlotPoint {
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
}

impl PlotPoint {
    pub fn new(azimuth_deg: f64, elevation_deg: f64) -> Self {
        Self {
            azimuth_deg,
            elevation_deg,
        }
    }
}

/// One drawable layer on a plot surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    pub name: String,
    pub style: TraceStyle,
    pub points: Vec<PlotPoint>,
    /// Per-point hover labels; empty for background layers.
    #[serde(default)]
    pub labels: Vec<String>,
    pub show_in_legend: bool,
}

impl Trace {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotLayout {
    pub kind: PlotKind,
    pub title: String,
    pub elevation_floor_deg: f64,
    pub elevation_ceiling_deg: f64,
}

impl PlotLayout {
    pub fn polar() -> Self {
        Self {
            kind: PlotKind::Polar,
            title: "Sky (polar)".into(),
            elevation_floor_deg: 0.0,
            elevation_ceiling_deg: 90.0,
        }
    }

    pub fn rectangular() -> Self {
        Self {
            kind: PlotKind::Rectangular,
            title: "Azimuth / elevation".into(),
            elevation_floor_deg: -10.0,
            elevation_ceiling_deg: 90.0,
        }
    }
}

/// A persistent plot target: configured once, then fed trace replacements.
pub trait PlotSurface {
    /// Sets the layout and the static background layers kept under every update.
    fn configure(&mut self, layout: &PlotLayout, background: Vec<Trace>);

    /// Replaces every trace above the static background.
    fn replace_traces(&mut self, traces: Vec<Trace>);
}

/// In-memory surface state; also the wire form the viewer draws from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SurfaceModel {
    pub layout: Option<PlotLayout>,
    pub static_count: usize,
    pub traces: Vec<Trace>,
}

impl SurfaceModel {
    pub fn background(&self) -> &[Trace] {
        &self.traces[..self.static_count.min(self.traces.len())]
    }

    pub fn dynamic(&self) -> &[Trace] {
        &self.traces[self.static_count.min(self.traces.len())..]
    }
}

impl PlotSurface for SurfaceModel {
    fn configure(&mut self, layout: &PlotLayout, background: Vec<Trace>) {
        self.layout = Some(layout.clone());
        self.static_count = background.len();
        self.traces = background;
    }

    fn replace_traces(&mut self, traces: Vec<Trace>) {
        self.traces.truncate(self.static_count);
        self.traces.extend(traces);
    }
}
