use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// One usable position report from an aircraft snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct AircraftFix {
    pub hex: String,
    pub callsign: String,
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub altitude_km: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedAircraft {
    pub hex: String,
    pub callsign: String,
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub altitude_km: f64,
    pub last_update_ms: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    pub added: usize,
    pub updated: usize,
    pub expired: usize,
}

/// Aircraft keyed by hex id, merged on every snapshot. Entries missing from
/// a snapshot survive until they are older than the grace window.
#[derive(Debug, Clone)]
pub struct AircraftTracker {
    entries: HashMap<String, TrackedAircraft>,
    grace_ms: i64,
}

impl AircraftTracker {
    pub fn new(grace_ms: i64) -> Self {
        Self {
            entries: HashMap::new(),
            grace_ms,
        }
    }

    pub fn merge(&mut self, fixes: Vec<AircraftFix>, now_ms: i64) -> MergeSummary {
        let mut summary = MergeSummary::default();
        let mut seen = HashSet::with_capacity(fixes.len());

        for fix in fixes {
            seen.insert(fix.hex.clone());
            match self.entries.get_mut(&fix.hex) {
                Some(entry) => {
                    entry.callsign = fix.callsign;
                    entry.latitude_deg = fix.latitude_deg;
                    entry.longitude_deg = fix.longitude_deg;
                    entry.altitude_km = fix.altitude_km;
                    entry.last_update_ms = entry.last_update_ms.max(now_ms);
                    summary.updated += 1;
                }
                None => {
                    self.entries.insert(
                        fix.hex.clone(),
                        TrackedAircraft {
                            hex: fix.hex,
                            callsign: fix.callsign,
                            latitude_deg: fix.latitude_deg,
                            longitude_deg: fix.longitude_deg,
                            altitude_km: fix.altitude_km,
                            last_update_ms: now_ms,
                        },
                    );
                    summary.added += 1;
                }
            }
        }

        summary.expired = self.retain_recent(now_ms, |hex| seen.contains(hex));
        summary
    }

    /// Drops entries older than the grace window without a new snapshot.
    /// Runs when the feed cannot be reached, so an outage still empties the set.
    pub fn expire(&mut self, now_ms: i64) -> usize {
        self.retain_recent(now_ms, |_| false)
    }

    fn retain_recent(&mut self, now_ms: i64, keep: impl Fn(&str) -> bool) -> usize {
        let grace_ms = self.grace_ms;
        let before = self.entries.len();
        self.entries.retain(|hex, entry| {
            keep(hex) || now_ms.saturating_sub(entry.last_update_ms) < grace_ms
        });
        before - self.entries.len()
    }

    pub fn get(&self, hex: &str) -> Option<&TrackedAircraft> {
        self.entries.get(hex)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All tracked aircraft ordered by hex id.
    pub fn snapshot(&self) -> Vec<TrackedAircraft> {
        let mut aircraft: Vec<TrackedAircraft> = self.entries.values().cloned().collect();
        aircraft.sort_by(|a, b| a.hex.cmp(&b.hex));
        aircraft
    }
}
