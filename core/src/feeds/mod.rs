//! The three external feeds (terrain, orbital catalog, live aircraft).
//!
//! Each feed is idempotent and may be refreshed any number of times. A failed
//! refresh leaves shared state as it was; callers normally go through
//! [`refresh_logged`], which logs the failure and carries on.

pub mod aircraft;
pub mod catalog;
pub mod terrain;
pub mod transport;

pub use aircraft::{AircraftFeed, AircraftRecord, AircraftSnapshot};
pub use catalog::{parse_catalog, CatalogFeed, CategoryRule, CategoryRules};
pub use terrain::TerrainFeed;
pub use transport::{HttpTransport, Transport};

use crate::cache::TimedCache;
use crate::objects::SharedState;
use crate::prelude::{BoxFuture, FeedResult};
use crate::telemetry::{LogManager, MetricsRecorder};
use std::sync::Arc;

/// Network access and cache shared by all feeds.
#[derive(Clone)]
pub struct FeedContext {
    pub transport: Arc<dyn Transport>,
    pub cache: Arc<TimedCache>,
}

impl FeedContext {
    pub fn new(transport: Arc<dyn Transport>, cache: Arc<TimedCache>) -> Self {
        Self { transport, cache }
    }
}

pub trait Feed: Send + Sync {
    fn name(&self) -> &'static str;

    /// Fetches, parses and publishes into `state`; returns a short report.
    fn refresh<'a>(
        &'a self,
        ctx: &'a FeedContext,
        state: &'a SharedState,
    ) -> BoxFuture<'a, FeedResult<String>>;
}

/// Runs one refresh, logging the outcome instead of returning errors.
pub async fn refresh_logged(
    feed: &dyn Feed,
    ctx: &FeedContext,
    state: &SharedState,
    metrics: &MetricsRecorder,
) -> bool {
    let logger = LogManager::new(feed.name());
    match feed.refresh(ctx, state).await {
        Ok(report) => {
            metrics.record_refresh();
            logger.detail(&report);
            true
        }
        Err(err) => {
            metrics.record_failure();
            logger.warn(&format!("refresh failed, keeping previous state: {err}"));
            false
        }
    }
}
