use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use skycore::objects::{from_sexagesimal, CelestialSource, TrackWindow};
use skycore::prelude::{ObserverSite, SensorFov, Thresholds};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub observer: ObserverConfig,
    pub sensor: SensorFov,
    pub thresholds: Thresholds,
    pub feeds: FeedsConfig,
    pub schedule: ScheduleConfig,
    pub cache: CacheConfig,
    pub server: ServerConfig,
    pub sky: SkyConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ObserverConfig {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub elevation_m: f64,
    /// Offset of the observer-local clock from UTC.
    pub utc_offset_hours: f64,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            name: "Owens Valley".into(),
            latitude: 37.2339,
            longitude: -118.2825,
            elevation_m: 1222.0,
            utc_offset_hours: -8.0,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedsConfig {
    pub terrain_path: PathBuf,
    pub terrain_url: Option<String>,
    pub terrain_ttl_secs: u64,
    pub catalog_url: String,
    pub catalog_ttl_secs: u64,
    /// May contain `{lat}`, `{lon}` and `{radius}`.
    pub aircraft_url: String,
    pub aircraft_radius_nm: u32,
    pub aircraft_ttl_ms: u64,
}

impl Default for FeedsConfig {
    fn default() -> Self {
        Self {
            terrain_path: PathBuf::from("data/horizon.csv"),
            terrain_url: None,
            terrain_ttl_secs: 365 * 24 * 3600,
            catalog_url: "https://celestrak.org/NORAD/elements/gp.php?GROUP=active&FORMAT=tle"
                .into(),
            catalog_ttl_secs: 2 * 3600,
            aircraft_url: "https://api.airplanes.live/v2/point/{lat}/{lon}/{radius}".into(),
            aircraft_radius_nm: 50,
            aircraft_ttl_ms: 1000,
        }
    }
}

impl FeedsConfig {
    pub fn terrain_ttl(&self) -> Duration {
        Duration::from_secs(self.terrain_ttl_secs)
    }

    pub fn catalog_ttl(&self) -> Duration {
        Duration::from_secs(self.catalog_ttl_secs)
    }

    pub fn aircraft_ttl(&self) -> Duration {
        Duration::from_millis(self.aircraft_ttl_ms)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub tick_ms: u64,
    pub aircraft_ms: u64,
    pub catalog_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            tick_ms: 500,
            aircraft_ms: 1000,
            catalog_secs: 2 * 3600,
        }
    }
}

/// Clock-driven targets plotted next to the tracked objects.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SkyConfig {
    pub include_sun: bool,
    pub include_moon: bool,
    pub track: TrackWindow,
    pub sources: Vec<SourceConfig>,
}

impl Default for SkyConfig {
    fn default() -> Self {
        Self {
            include_sun: true,
            include_moon: true,
            track: TrackWindow::default(),
            sources: Vec::new(),
        }
    }
}

/// Fixed target; `ra` is `[hours, minutes, seconds]`, `dec` is `[degrees, arcmin, arcsec]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    pub ra: Vec<f64>,
    pub dec: Vec<f64>,
}

impl SourceConfig {
    fn to_source(&self) -> anyhow::Result<CelestialSource> {
        let ra_hours = from_sexagesimal(&self.ra)
            .filter(|ra| (0.0..24.0).contains(ra))
            .with_context(|| format!("source {} has an invalid right ascension {:?}", self.name, self.ra))?;
        let dec_deg = from_sexagesimal(&self.dec)
            .filter(|dec| (-90.0..=90.0).contains(dec))
            .with_context(|| format!("source {} has an invalid declination {:?}", self.name, self.dec))?;
        Ok(CelestialSource::fixed(self.name.clone(), ra_hours, dec_deg))
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub dir: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 9000,
        }
    }
}

impl TrackerConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading tracker config {}", path_ref.display()))?;
        let config: TrackerConfig = if contents.trim().is_empty() {
            TrackerConfig::default()
        } else {
            serde_yaml::from_str(&contents)
                .with_context(|| format!("parsing tracker config {}", path_ref.display()))?
        };
        Ok(config)
    }

    /// Rejects settings the scheduler or the engine cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.observer_site().is_valid() {
            bail!(
                "observer site {} ({}, {}) is out of range",
                self.observer.name,
                self.observer.latitude,
                self.observer.longitude
            );
        }
        if self.schedule.tick_ms == 0 || self.schedule.aircraft_ms == 0 || self.schedule.catalog_secs == 0 {
            bail!("schedule periods must be greater than zero");
        }
        if self.sensor.min_elevation_deg > self.sensor.max_elevation_deg {
            bail!("sensor elevation floor is above its ceiling");
        }
        self.celestial_sources()?;
        Ok(())
    }

    /// Sun and Moon when enabled, then the configured fixed targets in order.
    pub fn celestial_sources(&self) -> anyhow::Result<Vec<CelestialSource>> {
        let sky = &self.sky;
        let mut sources = Vec::with_capacity(sky.sources.len() + 2);
        if sky.include_sun {
            sources.push(CelestialSource::sun());
        }
        if sky.include_moon {
            sources.push(CelestialSource::moon());
        }
        for source in &sky.sources {
            sources.push(source.to_source()?);
        }
        Ok(sources)
    }

    pub fn observer_site(&self) -> ObserverSite {
        ObserverSite::new(
            self.observer.latitude,
            self.observer.longitude,
            self.observer.elevation_m,
        )
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.cache
            .dir
            .clone()
            .or_else(|| dirs::cache_dir().map(|dir| dir.join("skyview")))
            .unwrap_or_else(|| PathBuf::from(".skyview-cache"))
    }

    pub fn bind_address(&self) -> anyhow::Result<SocketAddr> {
        let address = format!("{}:{}", self.server.host, self.server.port);
        address
            .parse()
            .with_context(|| format!("parsing server address {address}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_are_usable() {
        let cfg = TrackerConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.thresholds.aircraft_grace_ms, 15_000);
        assert_eq!(cfg.feeds.aircraft_ttl(), Duration::from_secs(1));
        assert_eq!(cfg.bind_address().unwrap().port(), 9000);
    }

    #[test]
    fn config_load_reads_partial_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"observer:\n  name: Test Site\n  latitude: 52.1\n  longitude: 4.6\nserver:\n  port: 9100\nthresholds:\n  aircraft_margin_deg: 1.0\n",
        )
        .unwrap();
        let path = temp.into_temp_path();
        let cfg = TrackerConfig::load(&path).unwrap();

        assert_eq!(cfg.observer.name, "Test Site");
        assert_eq!(cfg.observer.elevation_m, 1222.0);
        assert_eq!(cfg.server.port, 9100);
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.thresholds.aircraft_margin_deg, 1.0);
        assert_eq!(cfg.thresholds.deep_occlusion_deg, -10.0);
        assert_eq!(cfg.schedule.tick_ms, 500);
    }

    #[test]
    fn empty_file_yields_defaults() {
        let temp = NamedTempFile::new().unwrap();
        let cfg = TrackerConfig::load(temp.path()).unwrap();
        assert_eq!(cfg.observer.latitude, 37.2339);
    }

    #[test]
    fn invalid_observer_is_rejected() {
        let mut cfg = TrackerConfig::default();
        cfg.observer.latitude = 123.0;
        assert!(cfg.validate().is_err());

        let mut cfg = TrackerConfig::default();
        cfg.schedule.tick_ms = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn sky_sources_parse_sexagesimal_coordinates() {
        let cfg: TrackerConfig = serde_yaml::from_str(
            "sky:\n  include_moon: false\n  track:\n    hours: 6\n  sources:\n    - { name: Crab, ra: [5, 34, 30], dec: [22, 0, 36] }\n    - { name: South, ra: [12], dec: [-0.0, 30, 0] }\n",
        )
        .unwrap();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.sky.track.hours, 6.0);
        assert_eq!(cfg.sky.track.step_minutes, 10.0);

        let sources = cfg.celestial_sources().unwrap();
        let names: Vec<&str> = sources.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Sun", "Crab", "South"]);
        assert_eq!(sources[1], CelestialSource::fixed("Crab", 5.575, 22.01));
        assert_eq!(sources[2], CelestialSource::fixed("South", 12.0, -0.5));
    }

    #[test]
    fn out_of_range_source_is_rejected() {
        let mut cfg = TrackerConfig::default();
        cfg.sky.sources.push(SourceConfig {
            name: "Bad".into(),
            ra: vec![25.0, 0.0, 0.0],
            dec: vec![10.0],
        });
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("Bad"));
    }

    #[test]
    fn explicit_cache_dir_wins() {
        let mut cfg = TrackerConfig::default();
        cfg.cache.dir = Some(PathBuf::from("/tmp/skyview-test"));
        assert_eq!(cfg.cache_dir(), PathBuf::from("/tmp/skyview-test"));
    }
}
