use crate::horizon::HorizonModel;
use crate::objects::aircraft::{AircraftFix, AircraftTracker, MergeSummary, TrackedAircraft};
use crate::objects::orbital::Catalog;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Explicit context shared between feed completions and the visibility tick.
///
/// Writers build a complete value before swapping it in, so a reader sees
/// either the previous or the new horizon/catalog, never a mix.
pub struct SharedState {
    horizon: RwLock<Arc<HorizonModel>>,
    horizon_revision: AtomicU64,
    catalog: RwLock<Arc<Catalog>>,
    aircraft: RwLock<AircraftTracker>,
}

impl SharedState {
    pub fn new(aircraft_grace_ms: i64) -> Self {
        Self {
            horizon: RwLock::new(Arc::new(HorizonModel::new())),
            horizon_revision: AtomicU64::new(0),
            catalog: RwLock::new(Arc::new(Catalog::default())),
            aircraft: RwLock::new(AircraftTracker::new(aircraft_grace_ms)),
        }
    }

    pub fn horizon(&self) -> Arc<HorizonModel> {
        self.horizon
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Bumped on every horizon replacement.
    pub fn horizon_revision(&self) -> u64 {
        self.horizon_revision.load(Ordering::Acquire)
    }

    pub fn replace_horizon(&self, model: HorizonModel) {
        let model = Arc::new(model);
        let mut slot = self.horizon.write().unwrap_or_else(PoisonError::into_inner);
        *slot = model;
        self.horizon_revision.fetch_add(1, Ordering::AcqRel);
    }

    pub fn catalog(&self) -> Arc<Catalog> {
        self.catalog
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn replace_catalog(&self, catalog: Catalog) {
        let catalog = Arc::new(catalog);
        *self.catalog.write().unwrap_or_else(PoisonError::into_inner) = catalog;
    }

    pub fn merge_aircraft(&self, fixes: Vec<AircraftFix>, now_ms: i64) -> MergeSummary {
        self.aircraft
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .merge(fixes, now_ms)
    }

    /// Removes aircraft past the grace window; returns how many went.
    pub fn expire_aircraft(&self, now_ms: i64) -> usize {
        self.aircraft
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .expire(now_ms)
    }

    pub fn aircraft(&self) -> Vec<TrackedAircraft> {
        self.aircraft
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .snapshot()
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new(crate::prelude::Thresholds::default().aircraft_grace_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::horizon::HorizonSample;
    use crate::objects::orbital::{OrbitalObject, Propagator};
    use crate::prelude::Category;
    use chrono::{DateTime, Utc};
    use std::thread;

    struct Fixed;

    impl Propagator for Fixed {
        fn position_at(&self, _at: &DateTime<Utc>) -> Option<[f64; 3]> {
            Some([7000.0, 0.0, 0.0])
        }
    }

    fn generation(tag: &str, size: usize) -> Catalog {
        let propagator: Arc<dyn Propagator> = Arc::new(Fixed);
        Catalog::new(
            (0..size)
                .map(|i| OrbitalObject::new(format!("{tag}-{i}"), Category::Other, propagator.clone()))
                .collect(),
        )
    }

    #[test]
    fn catalog_readers_never_observe_a_partial_replacement() {
        let state = Arc::new(SharedState::default());
        state.replace_catalog(generation("old", 3));

        let writer_state = state.clone();
        let writer = thread::spawn(move || {
            for round in 0..500 {
                if round % 2 == 0 {
                    writer_state.replace_catalog(generation("new", 5));
                } else {
                    writer_state.replace_catalog(generation("old", 3));
                }
            }
        });

        for _ in 0..2_000 {
            let catalog = state.catalog();
            let tags: Vec<&str> = catalog
                .objects()
                .iter()
                .map(|o| o.name.split('-').next().unwrap_or(""))
                .collect();
            match catalog.len() {
                3 => assert!(tags.iter().all(|t| *t == "old")),
                5 => assert!(tags.iter().all(|t| *t == "new")),
                other => panic!("partial catalog of {other} objects"),
            }
        }
        writer.join().unwrap();
    }

    #[test]
    fn horizon_replacement_bumps_revision() {
        let state = SharedState::default();
        assert_eq!(state.horizon_revision(), 0);
        assert!(state.horizon().is_empty());

        state.replace_horizon(HorizonModel::from_samples(vec![HorizonSample::new(0.0, 1.0)]));
        assert_eq!(state.horizon_revision(), 1);
        assert_eq!(state.horizon().len(), 1);
    }
}
