//! Cache store layer.
//!
//! Thumbnails are cached as opaque byte blobs under string keys with a
//! store-enforced expiry. The service never deletes entries; expiry is the
//! store's job.
//!
//! # Backends
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │            ThumbnailService             │
//! └────────────────────┬────────────────────┘
//!                      │  get / set_with_ttl
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │            CacheStore Trait             │
//! └────────────────────┬────────────────────┘
//!          ┌───────────┴───────────┐
//!          ▼                       ▼
//! ┌─────────────────┐    ┌─────────────────────┐
//! │   RedisStore    │    │    MemoryStore      │
//! │ (Redis/Valkey)  │    │ (in-process LRU)    │
//! └─────────────────┘    └─────────────────────┘
//! ```

mod memory;
mod redis_store;

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::StoreError;

pub use memory::{MemoryStore, DEFAULT_MEMORY_STORE_CAPACITY};
pub use redis_store::RedisStore;

/// Default time-to-live for cached thumbnails (1 hour).
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Key-value store with time-bounded entries.
///
/// Both operations may block on I/O. `set_with_ttl` replaces any existing
/// entry under the same key wholesale.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Fetch the bytes stored under `key`, or `None` if absent or expired.
    async fn get(&self, key: &str) -> Result<Option<Bytes>, StoreError>;

    /// Store `value` under `key`, expiring after `ttl`.
    async fn set_with_ttl(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), StoreError>;

    /// Short name of the backend, reported by the health endpoint.
    fn backend(&self) -> &'static str;

    /// Release any held connections. Called once by the process entry point.
    async fn shutdown(&self) {}
}
