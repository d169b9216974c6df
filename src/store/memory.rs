//! In-process cache store.
//!
//! An LRU map of byte blobs with a per-entry expiry instant. Expired entries
//! are dropped lazily when read. The total size of cached payloads is bounded
//! and least-recently-used entries are evicted once the budget is exceeded.

use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use lru::LruCache;
use tokio::sync::Mutex;
use tracing::debug;

use super::CacheStore;
use crate::error::StoreError;

/// Default capacity: 100MB
pub const DEFAULT_MEMORY_STORE_CAPACITY: usize = 100 * 1024 * 1024;

/// Default maximum number of entries (to bound LRU overhead)
const DEFAULT_MAX_ENTRIES: usize = 10_000;

#[derive(Debug, Clone)]
struct Entry {
    data: Bytes,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

struct Inner {
    entries: LruCache<String, Entry>,
    current_size: usize,
}

/// In-process [`CacheStore`] with TTL expiry and size-based eviction.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use bytes::Bytes;
/// use thumbnail_streamer::store::{CacheStore, MemoryStore};
///
/// #[tokio::main]
/// async fn main() {
///     let store = MemoryStore::new();
///     let data = Bytes::from_static(b"thumbnail");
///
///     store
///         .set_with_ttl("thumbnail:/a.jpg:w100:hauto", data.clone(), Duration::from_secs(60))
///         .await
///         .unwrap();
///
///     let cached = store.get("thumbnail:/a.jpg:w100:hauto").await.unwrap();
///     assert_eq!(cached, Some(data));
/// }
/// ```
pub struct MemoryStore {
    inner: Mutex<Inner>,

    /// Maximum total size in bytes
    max_size: usize,
}

impl MemoryStore {
    /// Create a store with the default capacity (100MB).
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MEMORY_STORE_CAPACITY)
    }

    /// Create a store holding at most `max_size` bytes of payload.
    pub fn with_capacity(max_size: usize) -> Self {
        Self::with_capacity_and_entries(max_size, DEFAULT_MAX_ENTRIES)
    }

    /// Create a store with explicit byte and entry limits.
    ///
    /// An entry limit of zero is treated as one.
    pub fn with_capacity_and_entries(max_size: usize, max_entries: usize) -> Self {
        let max_entries = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(Inner {
                entries: LruCache::new(max_entries),
                current_size: 0,
            }),
            max_size,
        }
    }

    /// Number of entries currently held, including expired ones not yet read.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.entries.len()
    }

    /// Check if the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.entries.is_empty()
    }

    /// Current total payload size in bytes.
    pub async fn size(&self) -> usize {
        self.inner.lock().await.current_size
    }

    /// Maximum payload capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.max_size
    }

    /// Drop every entry.
    pub async fn clear(&self) {
        let mut inner = self.inner.lock().await;
        inner.entries.clear();
        inner.current_size = 0;
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, StoreError> {
        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;

        match inner.entries.get(key) {
            None => return Ok(None),
            Some(entry) if !entry.is_expired(Instant::now()) => {
                return Ok(Some(entry.data.clone()))
            }
            Some(_) => {}
        }

        if let Some(entry) = inner.entries.pop(key) {
            inner.current_size = inner.current_size.saturating_sub(entry.data.len());
        }
        Ok(None)
    }

    async fn set_with_ttl(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), StoreError> {
        let data_size = value.len();
        let entry = Entry {
            data: value,
            expires_at: Instant::now() + ttl,
        };

        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;

        // A value over budget is never stored; it still replaces any older value.
        if data_size > self.max_size {
            if let Some(old) = inner.entries.pop(key) {
                inner.current_size = inner.current_size.saturating_sub(old.data.len());
            }
            debug!(
                key,
                size = data_size,
                capacity = self.max_size,
                "Value exceeds store capacity, not cached"
            );
            return Ok(());
        }

        if let Some(old) = inner.entries.peek(key) {
            inner.current_size = inner.current_size.saturating_sub(old.data.len());
        }

        // Entry-count eviction happens inside `push`; account for it too.
        if let Some((evicted_key, evicted)) = inner.entries.push(key.to_string(), entry) {
            if evicted_key != key {
                inner.current_size = inner.current_size.saturating_sub(evicted.data.len());
            }
        }
        inner.current_size += data_size;

        while inner.current_size > self.max_size {
            match inner.entries.pop_lru() {
                Some((_, evicted)) => {
                    inner.current_size = inner.current_size.saturating_sub(evicted.data.len());
                }
                None => break,
            }
        }

        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn shutdown(&self) {
        self.clear().await;
    }
}
