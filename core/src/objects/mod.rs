pub mod aircraft;
pub mod celestial;
pub mod orbital;
pub mod state;

pub use aircraft::{AircraftFix, AircraftTracker, MergeSummary, TrackedAircraft};
pub use celestial::{from_sexagesimal, CelestialBody, CelestialSource, TrackWindow};
pub use orbital::{Catalog, OrbitalObject, Propagator, Sgp4Propagator};
pub use state::SharedState;
