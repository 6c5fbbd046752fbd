use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use gui_bridge::bridge::GuiBridge;
use gui_bridge::model::VisualizationModel;
use log::{error, info};
use skycore::cache::{DiskStore, TimedCache};
use skycore::feeds::{refresh_logged, FeedContext, HttpTransport};
use skycore::objects::SharedState;
use skycore::render::{format_dec, format_ra};
use skycore::telemetry::MetricsRecorder;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use workflow::config::TrackerConfig;
use workflow::runner::TickRunner;
use workflow::scheduler::{FeedSet, Scheduler, Services};

mod gui_bridge;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Terrain-aware satellite and aircraft visibility tracker")]
struct Args {
    /// Load the tracker config from YAML
    #[arg(long)]
    config: Option<PathBuf>,
    /// Refresh every feed once, run a single tick and print a summary
    #[arg(long, default_value_t = false)]
    once: bool,
    /// Append the `--once` summary to this file
    #[arg(long)]
    report: Option<PathBuf>,
    #[arg(long, allow_hyphen_values = true)]
    latitude: Option<f64>,
    #[arg(long, allow_hyphen_values = true)]
    longitude: Option<f64>,
    /// Observer elevation in metres
    #[arg(long, allow_hyphen_values = true)]
    elevation: Option<f64>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = load_config(&args).map_err(startup_abort)?;
    let runtime = TokioBuilder::new_current_thread()
        .enable_all()
        .build()
        .context("creating tracker runtime")?;

    if args.once {
        runtime.block_on(run_once(&config, args.report.as_deref()))
    } else {
        runtime.block_on(serve(&config))
    }
}

fn load_config(args: &Args) -> anyhow::Result<TrackerConfig> {
    let mut config = match &args.config {
        Some(path) => TrackerConfig::load(path)?,
        None => TrackerConfig::default(),
    };
    if let Some(latitude) = args.latitude {
        config.observer.latitude = latitude;
    }
    if let Some(longitude) = args.longitude {
        config.observer.longitude = longitude;
    }
    if let Some(elevation) = args.elevation {
        config.observer.elevation_m = elevation;
    }
    config.validate()?;
    Ok(config)
}

fn startup_abort(err: anyhow::Error) -> anyhow::Error {
    eprintln!("==== skyview tracker cannot start: {err:#} ====");
    error!("startup aborted: {err:#}");
    err
}

fn services(config: &TrackerConfig) -> Services {
    let cache_dir = config.cache_dir();
    info!("cache directory {}", cache_dir.display());
    Services {
        context: FeedContext::new(
            Arc::new(HttpTransport::new()),
            Arc::new(TimedCache::new(DiskStore::new(cache_dir))),
        ),
        state: Arc::new(SharedState::new(config.thresholds.aircraft_grace_ms)),
        metrics: Arc::new(MetricsRecorder::new()),
    }
}

async fn run_once(config: &TrackerConfig, report: Option<&std::path::Path>) -> anyhow::Result<()> {
    let services = services(config);
    let feeds = FeedSet::from_config(config);
    refresh_logged(&feeds.terrain, &services.context, &services.state, &services.metrics).await;
    refresh_logged(&feeds.catalog, &services.context, &services.state, &services.metrics).await;
    refresh_logged(&feeds.aircraft, &services.context, &services.state, &services.metrics).await;

    let mut runner = TickRunner::new(config, services.metrics.clone());
    let model = runner.execute(&services.state, Utc::now());
    let summary = format!(
        "{} | {} | LST {} | {}",
        config.observer.name,
        model.status.utc,
        model.status.sidereal,
        model.status.summary()
    );
    println!("Single pass -> {summary}");
    for source in model.sources.iter().take(10) {
        println!(
            "  {:<24} {:<9} az {:>6.1} el {:>5.1} {:>7.0} km{}",
            source.name,
            source.category.label(),
            source.azimuth_deg,
            source.elevation_deg,
            source.range_km,
            if source.in_fov { "  [FOV]" } else { "" }
        );
    }
    for fix in &model.celestial {
        println!(
            "  {:<24} {:<9} az {:>6.1} el {:>5.1} RA {} Dec {}{}",
            fix.name,
            fix.category.label(),
            fix.azimuth_deg,
            fix.elevation_deg,
            format_ra(fix.ra_hours),
            format_dec(fix.dec_deg),
            if fix.above_skyline { "" } else { "  [down]" }
        );
    }

    if let Some(report_path) = report {
        if let Some(parent) = report_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating report directory {}", parent.display()))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(report_path)
            .with_context(|| format!("opening report {}", report_path.display()))?;
        writeln!(file, "{summary}")
            .with_context(|| format!("writing report {}", report_path.display()))?;
    }
    Ok(())
}

async fn serve(config: &TrackerConfig) -> anyhow::Result<()> {
    let address = config.bind_address().map_err(startup_abort)?;
    let bridge = GuiBridge::new(VisualizationModel::new(config.observer.name.clone()));
    let (bound, server) = bridge.serve(address).map_err(startup_abort)?;

    let services = services(config);
    let runner = TickRunner::new(config, services.metrics.clone());
    let scheduler = Scheduler::start(
        config,
        FeedSet::from_config(config),
        services,
        runner,
        bridge,
    );
    info!(
        "tracking from {} ({:.4}, {:.4}); bridge on http://{bound} (Ctrl+C to stop)",
        config.observer.name, config.observer.latitude, config.observer.longitude
    );

    signal::ctrl_c().await.context("awaiting Ctrl+C to exit")?;
    scheduler.shutdown();
    server.abort();
    info!("shut down");
    Ok(())
}
