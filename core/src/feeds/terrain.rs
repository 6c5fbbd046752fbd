use crate::feeds::{Feed, FeedContext};
use crate::horizon::{parse_profile, HorizonModel, HorizonSample};
use crate::objects::SharedState;
use crate::prelude::{BoxFuture, FeedError, FeedResult};
use crate::telemetry::LogManager;
use std::path::PathBuf;
use std::time::Duration;

const CACHE_KEY: &str = "horizon";

/// Terrain profile: local table first, remote copy as fallback.
pub struct TerrainFeed {
    local_path: PathBuf,
    remote_url: Option<String>,
    ttl: Duration,
    logger: LogManager,
}

impl TerrainFeed {
    pub fn new(local_path: impl Into<PathBuf>, remote_url: Option<String>, ttl: Duration) -> Self {
        Self {
            local_path: local_path.into(),
            remote_url,
            ttl,
            logger: LogManager::new("terrain"),
        }
    }

    async fn read_local(&self) -> FeedResult<Vec<HorizonSample>> {
        let text = tokio::fs::read_to_string(&self.local_path).await?;
        non_empty(parse_profile(&text), &self.local_path.display().to_string())
    }

    async fn read_remote(&self, ctx: &FeedContext) -> FeedResult<Vec<HorizonSample>> {
        let url = self
            .remote_url
            .as_deref()
            .ok_or_else(|| FeedError::Empty("no remote terrain source configured".into()))?;
        ctx.cache
            .fetch_text_with_cache(ctx.transport.as_ref(), url, CACHE_KEY, self.ttl, |text| {
                non_empty(parse_profile(text), url)
            })
            .await
    }

    async fn load(&self, ctx: &FeedContext, state: &SharedState) -> FeedResult<String> {
        let (samples, source) = match self.read_local().await {
            Ok(samples) => (samples, "local"),
            Err(local_err) => {
                self.logger.detail(&format!(
                    "local profile {} unavailable ({local_err}), trying remote",
                    self.local_path.display()
                ));
                (self.read_remote(ctx).await?, "remote")
            }
        };

        let count = samples.len();
        state.replace_horizon(HorizonModel::from_samples(samples));
        Ok(format!("{count} horizon samples from {source} source"))
    }
}

fn non_empty(samples: Vec<HorizonSample>, origin: &str) -> FeedResult<Vec<HorizonSample>> {
    if samples.is_empty() {
        Err(FeedError::Empty(format!("no usable horizon rows in {origin}")))
    } else {
        Ok(samples)
    }
}

impl Feed for TerrainFeed {
    fn name(&self) -> &'static str {
        "terrain"
    }

    fn refresh<'a>(
        &'a self,
        ctx: &'a FeedContext,
        state: &'a SharedState,
    ) -> BoxFuture<'a, FeedResult<String>> {
        Box::pin(self.load(ctx, state))
    }
}
