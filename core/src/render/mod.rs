//! Display-side plumbing: trace building, plot surfaces and status fields.

pub mod bridge;
pub mod status;
pub mod trace;

pub use bridge::{RenderBridge, PRIORITY_CATEGORIES};
pub use status::{format_dec, format_ra, format_sidereal, observer_clock, StatusFields};
pub use trace::{Glyph, PlotKind, PlotLayout, PlotPoint, PlotSurface, SurfaceModel, Trace, TraceStyle};
