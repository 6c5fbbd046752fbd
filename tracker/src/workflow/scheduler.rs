use crate::gui_bridge::bridge::GuiBridge;
use crate::workflow::config::TrackerConfig;
use crate::workflow::runner::TickRunner;
use chrono::Utc;
use log::info;
use skycore::feeds::{refresh_logged, AircraftFeed, CatalogFeed, CategoryRules, Feed, FeedContext, TerrainFeed};
use skycore::objects::SharedState;
use skycore::telemetry::MetricsRecorder;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

/// The three feeds configured for one observer.
pub struct FeedSet {
    pub terrain: TerrainFeed,
    pub catalog: CatalogFeed,
    pub aircraft: AircraftFeed,
}

impl FeedSet {
    pub fn from_config(config: &TrackerConfig) -> Self {
        let feeds = &config.feeds;
        Self {
            terrain: TerrainFeed::new(
                feeds.terrain_path.clone(),
                feeds.terrain_url.clone(),
                feeds.terrain_ttl(),
            ),
            catalog: CatalogFeed::new(
                feeds.catalog_url.clone(),
                feeds.catalog_ttl(),
                CategoryRules::default(),
            ),
            aircraft: AircraftFeed::new(
                &feeds.aircraft_url,
                &config.observer_site(),
                feeds.aircraft_radius_nm,
                feeds.aircraft_ttl(),
            ),
        }
    }
}

/// Handles to the shared pieces every task needs.
#[derive(Clone)]
pub struct Services {
    pub context: FeedContext,
    pub state: Arc<SharedState>,
    pub metrics: Arc<MetricsRecorder>,
}

/// Owns the one-shot terrain task and the three periodic tasks.
pub struct Scheduler {
    tasks: Vec<(&'static str, JoinHandle<()>)>,
}

impl Scheduler {
    /// Spawns every task on the current runtime.
    pub fn start(
        config: &TrackerConfig,
        feeds: FeedSet,
        services: Services,
        mut runner: TickRunner,
        bridge: GuiBridge,
    ) -> Self {
        let schedule = &config.schedule;
        let mut tasks = Vec::with_capacity(4);

        let once = services.clone();
        let terrain = feeds.terrain;
        tasks.push((
            "terrain",
            tokio::spawn(async move {
                refresh_logged(&terrain, &once.context, &once.state, &once.metrics).await;
            }),
        ));

        tasks.push((
            "aircraft",
            spawn_periodic(
                Box::new(feeds.aircraft),
                Duration::from_millis(schedule.aircraft_ms),
                services.clone(),
            ),
        ));
        tasks.push((
            "catalog",
            spawn_periodic(
                Box::new(feeds.catalog),
                Duration::from_secs(schedule.catalog_secs),
                services.clone(),
            ),
        ));

        let tick_period = Duration::from_millis(schedule.tick_ms);
        let state = services.state;
        tasks.push((
            "tick",
            tokio::spawn(async move {
                let mut interval = time::interval(tick_period);
                interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
                loop {
                    interval.tick().await;
                    let model = runner.execute(&state, Utc::now());
                    bridge.publish(model);
                }
            }),
        ));

        info!(
            "[scheduler] started {} tasks (tick {} ms, aircraft {} ms, catalog {} s)",
            tasks.len(),
            schedule.tick_ms,
            schedule.aircraft_ms,
            schedule.catalog_secs
        );
        Self { tasks }
    }

    pub fn task_names(&self) -> Vec<&'static str> {
        self.tasks.iter().map(|(name, _)| *name).collect()
    }

    /// Aborts every task; nothing further is scheduled.
    pub fn shutdown(self) {
        for (name, handle) in self.tasks {
            handle.abort();
            info!("[scheduler] stopped {name}");
        }
    }
}

fn spawn_periodic(feed: Box<dyn Feed>, period: Duration, services: Services) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            refresh_logged(feed.as_ref(), &services.context, &services.state, &services.metrics)
                .await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gui_bridge::model::VisualizationModel;
    use skycore::cache::TimedCache;
    use skycore::feeds::Transport;
    use skycore::prelude::{BoxFuture, FeedError, FeedResult};

    struct Offline;

    impl Transport for Offline {
        fn get_text<'a>(&'a self, url: &'a str) -> BoxFuture<'a, FeedResult<String>> {
            Box::pin(async move { Err(FeedError::Transport(format!("offline: {url}"))) })
        }
    }

    fn services() -> Services {
        Services {
            context: FeedContext::new(Arc::new(Offline), Arc::new(TimedCache::in_memory())),
            state: Arc::new(SharedState::default()),
            metrics: Arc::new(MetricsRecorder::new()),
        }
    }

    #[tokio::test]
    async fn failing_feeds_never_stop_the_tick() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = TrackerConfig::default();
        config.feeds.terrain_path = dir.path().join("absent.csv");
        config.schedule.tick_ms = 10;
        config.schedule.aircraft_ms = 10;

        let services = services();
        let metrics = services.metrics.clone();
        let bridge = GuiBridge::new(VisualizationModel::default());
        let runner = TickRunner::new(&config, metrics.clone());
        let scheduler = Scheduler::start(
            &config,
            FeedSet::from_config(&config),
            services,
            runner,
            bridge.clone(),
        );
        assert_eq!(scheduler.task_names(), vec!["terrain", "aircraft", "catalog", "tick"]);

        time::sleep(Duration::from_millis(120)).await;
        scheduler.shutdown();

        let snapshot = metrics.snapshot();
        assert!(snapshot.ticks >= 2);
        assert!(snapshot.feed_failures >= 3);
        assert_eq!(snapshot.feed_refreshes, 0);
        assert_eq!(bridge.snapshot().observer, config.observer.name);
    }
}
