use crate::cache::store::{CacheStore, MemoryStore};
use crate::feeds::transport::Transport;
use crate::prelude::{FeedError, FeedResult};
use crate::telemetry::LogManager;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Stored envelope: write time in epoch milliseconds plus the payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub timestamp: i64,
    pub payload: Value,
}

impl CacheEntry {
    pub fn is_fresh(&self, ttl: Duration, now_ms: i64) -> bool {
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        now_ms.saturating_sub(self.timestamp) < ttl_ms
    }
}

/// Read-through cache. Storage problems degrade to misses and are never
/// reported to callers.
pub struct TimedCache {
    store: Box<dyn CacheStore>,
    logger: LogManager,
}

impl TimedCache {
    pub fn new<S: CacheStore + 'static>(store: S) -> Self {
        Self {
            store: Box::new(store),
            logger: LogManager::new("cache"),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }

    async fn read_entry(&self, key: &str, ttl: Duration) -> Option<Value> {
        let raw = match self.store.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                self.logger.detail(&format!("read of {key} failed: {err}"));
                return None;
            }
        };
        let entry: CacheEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(err) => {
                self.logger.detail(&format!("entry {key} is corrupt: {err}"));
                return None;
            }
        };
        if entry.is_fresh(ttl, Utc::now().timestamp_millis()) {
            self.logger.detail(&format!("hit {key}"));
            Some(entry.payload)
        } else {
            self.logger.detail(&format!("stale {key}"));
            None
        }
    }

    async fn write_entry(&self, key: &str, payload: Value) {
        let entry = CacheEntry {
            timestamp: Utc::now().timestamp_millis(),
            payload,
        };
        let written = match serde_json::to_string(&entry) {
            Ok(raw) => self.store.put(key, &raw).await,
            Err(err) => Err(std::io::Error::from(err)),
        };
        if let Err(err) = written {
            self.logger.detail(&format!("write of {key} skipped: {err}"));
        }
    }

    pub async fn read_text(&self, key: &str, ttl: Duration) -> Option<String> {
        match self.read_entry(key, ttl).await? {
            Value::String(text) => Some(text),
            _ => None,
        }
    }

    pub async fn read_json<T: DeserializeOwned>(&self, key: &str, ttl: Duration) -> Option<T> {
        serde_json::from_value(self.read_entry(key, ttl).await?).ok()
    }

    pub async fn write_text(&self, key: &str, payload: &str) {
        self.write_entry(key, Value::String(payload.to_string())).await;
    }

    pub async fn write_json<T: Serialize>(&self, key: &str, payload: &T) {
        match serde_json::to_value(payload) {
            Ok(value) => self.write_entry(key, value).await,
            Err(err) => self.logger.detail(&format!("write of {key} skipped: {err}")),
        }
    }

    /// Fresh cached text run through `parse`, otherwise fetched from `url`.
    ///
    /// Text is only stored once `parse` accepts it, and a cached payload that
    /// `parse` rejects counts as a miss.
    pub async fn fetch_text_with_cache<T, F>(
        &self,
        transport: &dyn Transport,
        url: &str,
        key: &str,
        ttl: Duration,
        parse: F,
    ) -> FeedResult<T>
    where
        F: Fn(&str) -> FeedResult<T>,
    {
        if let Some(text) = self.read_text(key, ttl).await {
            match parse(&text) {
                Ok(value) => return Ok(value),
                Err(err) => self.logger.detail(&format!("cached {key} unusable: {err}")),
            }
        }
        self.logger.detail(&format!("miss {key}, fetching {url}"));
        let text = transport.get_text(url).await?;
        let value = parse(&text)?;
        self.write_text(key, &text).await;
        Ok(value)
    }

    pub async fn fetch_json_with_cache<T>(
        &self,
        transport: &dyn Transport,
        url: &str,
        key: &str,
        ttl: Duration,
    ) -> FeedResult<T>
    where
        T: DeserializeOwned,
    {
        if let Some(value) = self.read_json(key, ttl).await {
            return Ok(value);
        }
        self.logger.detail(&format!("miss {key}, fetching {url}"));
        let text = transport.get_text(url).await?;
        let value: Value =
            serde_json::from_str(&text).map_err(|err| FeedError::Parse(err.to_string()))?;
        let parsed = serde_json::from_value(value.clone())
            .map_err(|err| FeedError::Parse(err.to_string()))?;
        self.write_entry(key, value).await;
        Ok(parsed)
    }
}
