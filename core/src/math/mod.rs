pub mod angles;
pub mod ephemeris;
pub mod frames;

pub use angles::AngleHelper;
pub use ephemeris::{horizontal, moon_equatorial, sun_equatorial, Equatorial};
pub use frames::{local_sidereal_hours, LookAngle, TopocentricFrame};
