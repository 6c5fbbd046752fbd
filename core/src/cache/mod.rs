//! Read-through cache with per-read time-to-live over a durable key/value store.

pub mod store;
pub mod timed;

pub use store::{CacheStore, DiskStore, MemoryStore};
pub use timed::{CacheEntry, TimedCache};
