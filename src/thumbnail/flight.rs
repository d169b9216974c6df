//! Per-key deduplication of concurrent cache misses.
//!
//! When enabled, the first request to miss on a key runs the generation work
//! and any request that misses on the same key while that work is in flight
//! waits for, and shares, its result. Once the work completes the key is
//! released; later misses start a new flight.
//!
//! Followers inherit the leader's outcome, including failures, and its
//! latency. If the leader's future is dropped before finishing, one of the
//! waiting followers takes over the work.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use tokio::sync::OnceCell;

use super::key::CacheKey;

type Slot<T> = Arc<OnceCell<T>>;

/// Coordinator that lets one caller per key do the work.
pub struct SingleFlight<T> {
    in_flight: Mutex<HashMap<CacheKey, Slot<T>>>,
}

impl<T: Clone> SingleFlight<T> {
    /// Create an empty coordinator.
    pub fn new() -> Self {
        Self {
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Run `work` for `key` unless a flight for `key` is already running, in
    /// which case wait for that flight's result.
    ///
    /// Returns the value and `true` if this caller ran the work itself.
    pub async fn run<F, Fut>(&self, key: &CacheKey, work: F) -> (T, bool)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let slot = self.slot(key);

        let mut leader = false;
        let value = slot
            .get_or_init(|| {
                leader = true;
                work()
            })
            .await
            .clone();

        if leader {
            self.release(key, &slot);
        }

        (value, leader)
    }

    /// Number of keys with a flight currently registered.
    pub fn in_flight(&self) -> usize {
        self.lock().len()
    }

    fn slot(&self, key: &CacheKey) -> Slot<T> {
        let mut map = self.lock();
        Arc::clone(map.entry(key.clone()).or_default())
    }

    fn release(&self, key: &CacheKey, slot: &Slot<T>) {
        let mut map = self.lock();
        if map.get(key).is_some_and(|current| Arc::ptr_eq(current, slot)) {
            map.remove(key);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<CacheKey, Slot<T>>> {
        // The map is never left half-updated, so a poisoned lock is still usable.
        self.in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<T: Clone> Default for SingleFlight<T> {
    fn default() -> Self {
        Self::new()
    }
}
