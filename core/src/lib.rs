//! Visibility core for the skyview observer station.
//!
//! Feeds populate a shared object state on their own schedules; the
//! visibility engine turns that state into per-tick look angles filtered by
//! the local terrain horizon, and the render bridge pushes the result to the
//! plot surfaces.

pub mod cache;
pub mod engine;
pub mod feeds;
pub mod horizon;
pub mod math;
pub mod objects;
pub mod prelude;
pub mod render;
pub mod telemetry;

pub use engine::{CelestialFix, TickFrame, VisibilityEngine, VisibleObject};
pub use prelude::{Category, FeedError, FeedResult, ObserverSite, SensorFov, Thresholds};
