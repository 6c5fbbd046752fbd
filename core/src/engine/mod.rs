//! Visibility evaluation: which tracked objects clear the local skyline.

pub mod visibility;

pub use visibility::{CelestialFix, SkyPoint, TickFrame, VisibilityEngine, VisibleObject};
