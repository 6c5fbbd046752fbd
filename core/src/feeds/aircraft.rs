use crate::feeds::{Feed, FeedContext};
use crate::objects::{AircraftFix, SharedState};
use crate::prelude::{BoxFuture, FeedResult, ObserverSite};
use crate::telemetry::LogManager;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const FEET_TO_KM: f64 = 0.3048 / 1000.0;

/// Altitude field as published by readsb-style feeds: feet, or a label such as `"ground"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AltitudeField {
    Feet(f64),
    Label(String),
}

impl AltitudeField {
    fn feet(&self) -> Option<f64> {
        match self {
            AltitudeField::Feet(feet) if feet.is_finite() => Some(*feet),
            _ => None,
        }
    }
}

/// One aircraft record from the live snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AircraftRecord {
    #[serde(default)]
    pub hex: String,
    /// Live callsign, often space padded.
    #[serde(default)]
    pub flight: Option<String>,
    /// Registration.
    #[serde(default, rename = "r")]
    pub registration: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    #[serde(default)]
    pub alt_geom: Option<AltitudeField>,
    #[serde(default)]
    pub alt_baro: Option<AltitudeField>,
}

impl AircraftRecord {
    /// `None` unless the record has an id and plausible coordinates.
    pub fn to_fix(&self) -> Option<AircraftFix> {
        let hex = self.hex.trim();
        if hex.is_empty() {
            return None;
        }
        let latitude_deg = self.lat.filter(|lat| (-90.0..=90.0).contains(lat))?;
        let longitude_deg = self.lon.filter(|lon| (-180.0..=180.0).contains(lon))?;

        let callsign = [self.flight.as_deref(), self.registration.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|name| !name.is_empty())
            .unwrap_or(hex)
            .to_string();
        let altitude_feet = self
            .alt_geom
            .as_ref()
            .and_then(AltitudeField::feet)
            .or_else(|| self.alt_baro.as_ref().and_then(AltitudeField::feet))
            .unwrap_or(0.0);

        Some(AircraftFix {
            hex: hex.to_ascii_lowercase(),
            callsign,
            latitude_deg,
            longitude_deg,
            altitude_km: altitude_feet * FEET_TO_KM,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AircraftSnapshot {
    #[serde(default, alias = "aircraft")]
    pub ac: Vec<AircraftRecord>,
}

impl AircraftSnapshot {
    pub fn fixes(&self) -> Vec<AircraftFix> {
        self.ac.iter().filter_map(AircraftRecord::to_fix).collect()
    }
}

/// Live aircraft around the observer, merged into the tracked set.
pub struct AircraftFeed {
    url: String,
    cache_key: String,
    ttl: Duration,
    logger: LogManager,
}

impl AircraftFeed {
    /// `url_template` may contain `{lat}`, `{lon}` and `{radius}` placeholders.
    pub fn new(url_template: &str, site: &ObserverSite, radius_nm: u32, ttl: Duration) -> Self {
        let lat = format!("{:.4}", site.latitude_deg);
        let lon = format!("{:.4}", site.longitude_deg);
        let url = url_template
            .replace("{lat}", &lat)
            .replace("{lon}", &lon)
            .replace("{radius}", &radius_nm.to_string());
        Self {
            url,
            cache_key: format!("aircraft-{lat}-{lon}-{radius_nm}"),
            ttl,
            logger: LogManager::new("aircraft"),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn cache_key(&self) -> &str {
        &self.cache_key
    }

    async fn load(&self, ctx: &FeedContext, state: &SharedState) -> FeedResult<String> {
        let fetched: FeedResult<AircraftSnapshot> = ctx
            .cache
            .fetch_json_with_cache(ctx.transport.as_ref(), &self.url, &self.cache_key, self.ttl)
            .await;
        let snapshot = match fetched {
            Ok(snapshot) => snapshot,
            Err(err) => {
                let expired = state.expire_aircraft(Utc::now().timestamp_millis());
                if expired > 0 {
                    self.logger
                        .detail(&format!("feed down, expired {expired} stale aircraft"));
                }
                return Err(err);
            }
        };
        let fixes = snapshot.fixes();
        let ignored = snapshot.ac.len() - fixes.len();
        if ignored > 0 {
            self.logger
                .detail(&format!("ignored {ignored} records without usable position"));
        }

        let summary = state.merge_aircraft(fixes, Utc::now().timestamp_millis());
        Ok(format!(
            "{} new, {} updated, {} expired aircraft",
            summary.added, summary.updated, summary.expired
        ))
    }
}

impl Feed for AircraftFeed {
    fn name(&self) -> &'static str {
        "aircraft"
    }

    fn refresh<'a>(
        &'a self,
        ctx: &'a FeedContext,
        state: &'a SharedState,
    ) -> BoxFuture<'a, FeedResult<String>> {
        Box::pin(self.load(ctx, state))
    }
}
