//! Terrain horizon profile and occlusion lookup.

pub mod model;
pub mod profile;

pub use model::{HorizonModel, NO_PROFILE_ELEVATION_DEG};
pub use profile::{parse_profile, HorizonSample};
