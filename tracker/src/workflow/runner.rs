use crate::gui_bridge::model::VisualizationModel;
use crate::workflow::config::TrackerConfig;
use chrono::{DateTime, Utc};
use skycore::engine::{TickFrame, VisibilityEngine};
use skycore::objects::SharedState;
use skycore::render::{RenderBridge, StatusFields};
use skycore::telemetry::{LogManager, MetricsRecorder};
use std::sync::Arc;

/// One fast tick: engine, render bridge, status fields.
///
/// Never waits on a feed; whatever is resident in [`SharedState`] is used.
pub struct TickRunner {
    engine: VisibilityEngine,
    render: RenderBridge,
    model: VisualizationModel,
    utc_offset_hours: f64,
    horizon_revision: Option<u64>,
    metrics: Arc<MetricsRecorder>,
    logger: LogManager,
}

impl TickRunner {
    pub fn new(config: &TrackerConfig, metrics: Arc<MetricsRecorder>) -> Self {
        let logger = LogManager::new("tick");
        let sources = config.celestial_sources().unwrap_or_else(|err| {
            logger.warn(&format!("celestial sources disabled: {err:#}"));
            Vec::new()
        });
        Self {
            engine: VisibilityEngine::new(config.observer_site(), config.thresholds, config.sensor)
                .with_sources(sources, config.sky.track),
            render: RenderBridge::new(Some(config.sensor)),
            model: VisualizationModel::new(config.observer.name.clone()),
            utc_offset_hours: config.observer.utc_offset_hours,
            horizon_revision: None,
            metrics,
            logger,
        }
    }

    pub fn execute(&mut self, state: &SharedState, now: DateTime<Utc>) -> &VisualizationModel {
        let revision = state.horizon_revision();
        if self.horizon_revision != Some(revision) {
            let horizon = state.horizon();
            self.render.set_horizon(&horizon);
            self.render
                .initialize(&mut self.model.polar, &mut self.model.rectangular);
            self.horizon_revision = Some(revision);
            self.logger.detail(&format!(
                "static layers rebuilt for horizon revision {revision} ({} samples)",
                horizon.len()
            ));
        }

        let frame = self.engine.tick(state, now);
        self.render
            .render(&frame, &mut self.model.polar, &mut self.model.rectangular);
        self.metrics.record_tick();

        self.model.status = StatusFields::from_frame(&frame, self.utc_offset_hours);
        self.model.metrics = self.metrics.snapshot();
        let TickFrame {
            satellites,
            aircraft,
            celestial,
            ..
        } = frame;
        self.model.sources = satellites;
        self.model.sources.extend(aircraft);
        self.model.celestial = celestial;
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::config::SourceConfig;
    use chrono::TimeZone;
    use skycore::horizon::{HorizonModel, HorizonSample};
    use skycore::objects::AircraftFix;
    use skycore::render::Glyph;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 6, 30, 0).unwrap()
    }

    #[test]
    fn empty_state_renders_background_only() {
        let mut config = TrackerConfig::default();
        config.sky.include_sun = false;
        config.sky.include_moon = false;
        let metrics = Arc::new(MetricsRecorder::new());
        let mut runner = TickRunner::new(&config, metrics.clone());
        let model = runner.execute(&SharedState::default(), now());

        assert_eq!(model.polar.traces.len(), 1);
        assert_eq!(model.polar.traces[0].style.glyph, Glyph::Outline);
        assert!(model.rectangular.dynamic().is_empty());
        assert!(model.sources.is_empty());
        assert_eq!(model.metrics.ticks, 1);
        assert_eq!(model.status.sidereal.len(), "00h 00m 00s".len());
        assert!(model.celestial.is_empty());
    }

    #[test]
    fn default_sky_follows_sun_and_moon() {
        // eclipse night: full Moon up, Sun far below the horizon
        let mut runner = TickRunner::new(&TrackerConfig::default(), Arc::new(MetricsRecorder::new()));
        let model = runner.execute(&SharedState::default(), now());

        let bodies: Vec<&str> = model.celestial.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(bodies, vec!["Sun", "Moon"]);
        assert!(!model.celestial[0].above_skyline);
        assert!(model.celestial[1].above_skyline);
        assert_eq!(model.status.sources_up, 1);

        let names: Vec<&str> = model.polar.dynamic().iter().map(|t| t.name.as_str()).collect();
        assert!(names.contains(&"Moon (1)"));
        assert!(!names.iter().any(|n| n.starts_with("Sun")));
    }

    #[test]
    fn configured_sources_reach_the_model_and_status() {
        let mut config = TrackerConfig::default();
        config.sky.include_sun = false;
        config.sky.include_moon = false;
        config.sky.sources.push(SourceConfig {
            name: "Polaris".into(),
            ra: vec![2.0, 31.0, 49.0],
            dec: vec![89.0, 15.0, 51.0],
        });

        let mut runner = TickRunner::new(&config, Arc::new(MetricsRecorder::new()));
        let model = runner.execute(&SharedState::default(), now());
        assert_eq!(model.celestial.len(), 1);
        let polaris = &model.celestial[0];
        assert!((polaris.elevation_deg - config.observer.latitude).abs() < 1.0);
        assert!(polaris.track.len() > 100);
        assert_eq!(model.status.sources_up, 1);
        assert!(model
            .polar
            .dynamic()
            .iter()
            .any(|t| t.name == "Sources (1)"));
    }

    #[test]
    fn horizon_change_rebuilds_static_layers() {
        let mut runner = TickRunner::new(&TrackerConfig::default(), Arc::new(MetricsRecorder::new()));
        let state = SharedState::default();
        runner.execute(&state, now());

        state.replace_horizon(HorizonModel::from_samples(vec![
            HorizonSample::new(0.0, 2.0),
            HorizonSample::new(180.0, 4.0),
        ]));
        let model = runner.execute(&state, now());
        assert_eq!(model.polar.static_count, 2);
        assert_eq!(model.rectangular.background()[1].name, "Terrain");
    }

    #[test]
    fn aircraft_overhead_reaches_sources_and_status() {
        let config = TrackerConfig::default();
        let state = SharedState::default();
        state.merge_aircraft(
            vec![AircraftFix {
                hex: "a1b2c3".into(),
                callsign: "UAL123".into(),
                latitude_deg: config.observer.latitude + 0.05,
                longitude_deg: config.observer.longitude,
                altitude_km: 10.0,
            }],
            now().timestamp_millis(),
        );

        let mut runner = TickRunner::new(&config, Arc::new(MetricsRecorder::new()));
        let model = runner.execute(&state, now());
        assert_eq!(model.status.aircraft_visible, 1);
        assert_eq!(model.sources[0].name, "UAL123");
        assert_eq!(model.polar.dynamic()[0].name, "Aircraft (1)");
    }
}
