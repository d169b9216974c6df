//! Redis/Valkey-backed cache store.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::{debug, info};

use super::CacheStore;
use crate::error::StoreError;

/// [`CacheStore`] backed by a Redis-compatible server.
///
/// Uses a [`ConnectionManager`], which multiplexes requests over a single
/// connection and reconnects transparently. Cloning the store is cheap and
/// shares the underlying connection.
///
/// Entries are written with `SET key value EX ttl`, so expiry is enforced by
/// the server.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
    url: String,
}

impl RedisStore {
    /// Connect to the server at `url` (e.g. `redis://localhost:6379`).
    ///
    /// Sends a `PING` so that an unreachable server fails here rather than on
    /// the first request.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client =
            redis::Client::open(url).map_err(|e| StoreError::Connection(e.to_string()))?;
        let mut conn = ConnectionManager::new(client).await?;

        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        info!(url = %redacted(url), "Connected to cache store");

        Ok(Self {
            conn,
            url: url.to_string(),
        })
    }

    /// Get the connection URL with any password removed.
    pub fn url(&self) -> String {
        redacted(&self.url)
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, StoreError> {
        let mut conn = self.conn.clone();
        let value: Option<Vec<u8>> = conn.get(key).await?;
        Ok(value.map(Bytes::from))
    }

    async fn set_with_ttl(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        // Redis rejects EX 0
        let seconds = ttl.as_secs().max(1);
        let _: () = conn.set_ex(key, value.as_ref(), seconds).await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "redis"
    }

    async fn shutdown(&self) {
        // ConnectionManager closes its connection when the last clone is dropped.
        debug!(url = %self.url(), "Releasing cache store connection");
    }
}

/// Strip the password component from a connection URL for logging.
fn redacted(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    match rest.rsplit_once('@') {
        Some((credentials, host)) => {
            let user = credentials.split(':').next().unwrap_or("");
            format!("{}://{}:***@{}", scheme, user, host)
        }
        None => url.to_string(),
    }
}
