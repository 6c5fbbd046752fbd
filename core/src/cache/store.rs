use crate::prelude::BoxFuture;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::fs;

/// Durable key/value persistence for cache envelopes.
///
/// Methods are async so disk access never blocks the tick sharing the runtime.
pub trait CacheStore: Send + Sync {
    /// `Ok(None)` when the key has never been written.
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, io::Result<Option<String>>>;
    fn put<'a>(&'a self, key: &'a str, value: &'a str) -> BoxFuture<'a, io::Result<()>>;
}

/// One file per key inside a cache directory.
#[derive(Debug, Clone)]
pub struct DiskStore {
    root: PathBuf,
}

impl DiskStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.root.join(format!("{file_name}.json"))
    }
}

impl CacheStore for DiskStore {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, io::Result<Option<String>>> {
        Box::pin(async move {
            match fs::read_to_string(self.path_for(key)).await {
                Ok(contents) => Ok(Some(contents)),
                Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
                Err(err) => Err(err),
            }
        })
    }

    fn put<'a>(&'a self, key: &'a str, value: &'a str) -> BoxFuture<'a, io::Result<()>> {
        Box::pin(async move {
            fs::create_dir_all(&self.root).await?;
            let target = self.path_for(key);
            let staging = target.with_extension("json.tmp");
            fs::write(&staging, value).await?;
            fs::rename(&staging, &target).await
        })
    }
}

/// In-process store; clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryStore {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, io::Result<Option<String>>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let value = entries.get(key).cloned();
        Box::pin(async move { Ok(value) })
    }

    fn put<'a>(&'a self, key: &'a str, value: &'a str) -> BoxFuture<'a, io::Result<()>> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disk_store_round_trips_and_reports_missing_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskStore::new(dir.path().join("nested"));
        assert_eq!(store.get("catalog").await.unwrap(), None);

        store.put("catalog", "{\"a\":1}").await.unwrap();
        assert_eq!(store.get("catalog").await.unwrap().as_deref(), Some("{\"a\":1}"));
    }

    #[tokio::test]
    async fn disk_store_sanitises_keys_into_file_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskStore::new(dir.path());
        store.put("aircraft/37.2,-118.3/r25", "x").await.unwrap();
        assert!(dir.path().join("aircraft_37.2_-118.3_r25.json").exists());
        assert_eq!(
            store.get("aircraft/37.2,-118.3/r25").await.unwrap().as_deref(),
            Some("x")
        );
    }

    #[tokio::test]
    async fn memory_store_clones_share_entries() {
        let store = MemoryStore::new();
        let handle = store.clone();
        store.put("k", "v").await.unwrap();
        assert_eq!(handle.get("k").await.unwrap().as_deref(), Some("v"));
    }
}
