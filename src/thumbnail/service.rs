//! Thumbnail Service for cache-aside thumbnail generation.
//!
//! The ThumbnailService is the main entry point for thumbnail requests. It
//! orchestrates:
//! - Request validation
//! - Cache lookups
//! - Source reads
//! - Resizing
//! - Detached cache write-back
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       ThumbnailService                          │
//! │  ┌─────────────────────────────────────────────────────────┐    │
//! │  │                   get_thumbnail()                       │    │
//! │  │  1. Validate params   4. Read source on miss            │    │
//! │  │  2. Build cache key   5. Resize (blocking pool)         │    │
//! │  │  3. Check store       6. Spawn write-back & return      │    │
//! │  └─────────────────────────────────────────────────────────┘    │
//! │           │                    │                    │           │
//! │           ▼                    ▼                    ▼           │
//! │    ┌────────────┐      ┌──────────────┐    ┌──────────────────┐ │
//! │    │ CacheStore │      │ SourceReader │    │ ImageTransformer │ │
//! │    └────────────┘      └──────────────┘    └──────────────────┘ │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Concurrency
//!
//! Requests are independent. Without single-flight, concurrent misses on the
//! same key each read and resize the source and each issue a write; the last
//! write wins, and since resizing is deterministic every write carries the
//! same bytes.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tracing::{debug, error, warn};

use crate::error::ThumbnailError;
use crate::source::SourceReader;
use crate::store::{CacheStore, DEFAULT_CACHE_TTL};

use super::flight::SingleFlight;
use super::key::CacheKey;
use super::mime::content_type_for;
use super::transform::{ImageTransformer, ResizeTransformer};

/// Width used when a request does not specify one.
pub const DEFAULT_WIDTH: u32 = 200;

// =============================================================================
// Thumbnail Request
// =============================================================================

/// A validated request for a thumbnail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailRequest {
    /// Decoded source identifier, passed to the source reader verbatim
    pub source_id: String,

    /// Bounding width in pixels (always positive)
    pub width: u32,

    /// Bounding height in pixels; `None` means derive from aspect ratio
    pub height: Option<u32>,
}

impl ThumbnailRequest {
    /// Create a width-only request.
    pub fn new(source_id: impl Into<String>, width: u32) -> Self {
        Self {
            source_id: source_id.into(),
            width,
            height: None,
        }
    }

    /// Create a request bounded by both width and height.
    pub fn with_height(source_id: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            source_id: source_id.into(),
            width,
            height: Some(height),
        }
    }

    /// Build a request from raw query values.
    ///
    /// - `path` is required and must be non-empty. It is percent-decoded once
    ///   more, on top of the decoding already applied to the query string.
    /// - `width` falls back to `default_width` when absent or empty, even if
    ///   `height` is given.
    /// - `height` is optional; empty means absent.
    ///
    /// Dimensions must parse as positive integers.
    pub fn from_params(
        path: Option<&str>,
        width: Option<&str>,
        height: Option<&str>,
        default_width: u32,
    ) -> Result<Self, ThumbnailError> {
        let path = match path {
            Some(p) if !p.is_empty() => p,
            _ => return Err(ThumbnailError::MissingPath),
        };

        let width = match width.filter(|w| !w.is_empty()) {
            Some(raw) => parse_dimension(raw)?,
            None => default_width,
        };
        let height = height
            .filter(|h| !h.is_empty())
            .map(parse_dimension)
            .transpose()?;

        let source_id = urlencoding::decode(path)
            .map_err(|e| ThumbnailError::InvalidPath(e.to_string()))?
            .into_owned();

        Ok(Self {
            source_id,
            width,
            height,
        })
    }

    /// The cache key for this request.
    pub fn cache_key(&self) -> CacheKey {
        CacheKey::build(&self.source_id, self.width, self.height)
    }

    fn validate(&self) -> Result<(), ThumbnailError> {
        if self.width == 0 || self.height == Some(0) {
            return Err(ThumbnailError::InvalidDimensions(format!(
                "{}x{}",
                self.width,
                self.height.map_or_else(|| "auto".to_string(), |h| h.to_string())
            )));
        }
        Ok(())
    }
}

/// Parse a positive pixel dimension.
fn parse_dimension(raw: &str) -> Result<u32, ThumbnailError> {
    match raw.trim().parse::<u32>() {
        Ok(0) | Err(_) => Err(ThumbnailError::InvalidDimensions(raw.to_string())),
        Ok(value) => Ok(value),
    }
}

// =============================================================================
// Thumbnail Response
// =============================================================================

/// Whether a thumbnail was served from the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    /// Value for the `X-Cache-Status` header.
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "hit",
            CacheStatus::Miss => "miss",
        }
    }
}

/// Response from the thumbnail service.
#[derive(Debug, Clone)]
pub struct ThumbnailResponse {
    /// The thumbnail bytes
    pub data: Bytes,

    /// Whether the bytes came from the store
    pub cache_status: CacheStatus,

    /// Content type derived from the source identifier's extension
    pub content_type: &'static str,
}

// =============================================================================
// Thumbnail Service
// =============================================================================

/// Service for generating and caching thumbnails.
///
/// # Type Parameters
///
/// * `S` - The source reader type (e.g., filesystem-based source)
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use thumbnail_streamer::source::FsSource;
/// use thumbnail_streamer::store::MemoryStore;
/// use thumbnail_streamer::thumbnail::{ThumbnailRequest, ThumbnailService};
///
/// let service = ThumbnailService::new(Arc::new(MemoryStore::new()), FsSource::new());
///
/// let request = ThumbnailRequest::new("/photos/a.jpg", 100);
/// let response = service.get_thumbnail(request).await?;
///
/// println!("{} bytes ({})", response.data.len(), response.cache_status.as_str());
/// ```
pub struct ThumbnailService<S: SourceReader> {
    /// Store for resized thumbnails
    store: Arc<dyn CacheStore>,

    /// Reader for original images
    source: Arc<S>,

    /// Resizer
    transformer: Arc<dyn ImageTransformer>,

    /// Expiry applied to every write
    ttl: Duration,

    /// Per-key miss deduplication, if enabled
    flight: Option<SingleFlight<Result<Bytes, ThumbnailError>>>,
}

impl<S: SourceReader + 'static> ThumbnailService<S> {
    /// Create a service with the default transformer and a one hour TTL.
    pub fn new(store: Arc<dyn CacheStore>, source: S) -> Self {
        Self {
            store,
            source: Arc::new(source),
            transformer: Arc::new(ResizeTransformer::new()),
            ttl: DEFAULT_CACHE_TTL,
            flight: None,
        }
    }

    /// Replace the transformer.
    pub fn with_transformer(mut self, transformer: Arc<dyn ImageTransformer>) -> Self {
        self.transformer = transformer;
        self
    }

    /// Set the expiry used for cache writes.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Enable or disable per-key deduplication of concurrent misses.
    pub fn with_single_flight(mut self, enabled: bool) -> Self {
        self.flight = enabled.then(SingleFlight::new);
        self
    }

    /// Get a thumbnail, using the store when available.
    ///
    /// On a hit the stored bytes are returned unchanged. On a miss the source
    /// is read and resized, a write-back is spawned without being awaited,
    /// and the fresh bytes are returned.
    ///
    /// A failing store read is logged and treated as a miss.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The dimensions are not positive
    /// - The source cannot be found or read
    /// - The source cannot be decoded, resized, or encoded
    pub async fn get_thumbnail(
        &self,
        request: ThumbnailRequest,
    ) -> Result<ThumbnailResponse, ThumbnailError> {
        request.validate()?;

        let key = request.cache_key();
        let content_type = content_type_for(&request.source_id);

        match self.store.get(key.as_str()).await {
            Ok(Some(data)) => {
                debug!(cache_key = %key, "Cache hit");
                return Ok(ThumbnailResponse {
                    data,
                    cache_status: CacheStatus::Hit,
                    content_type,
                });
            }
            Ok(None) => {
                debug!(cache_key = %key, "Cache miss, generating thumbnail");
            }
            Err(e) => {
                warn!(cache_key = %key, error = %e, "Cache read failed, treating as miss");
            }
        }

        let data = match &self.flight {
            Some(flight) => {
                let (result, leader) = flight
                    .run(&key, || self.generate_and_store(&request, &key))
                    .await;
                if !leader {
                    debug!(cache_key = %key, "Shared in-flight thumbnail");
                }
                result?
            }
            None => self.generate_and_store(&request, &key).await?,
        };

        Ok(ThumbnailResponse {
            data,
            cache_status: CacheStatus::Miss,
            content_type,
        })
    }

    /// Read and resize the source without touching the store.
    pub async fn generate(&self, request: &ThumbnailRequest) -> Result<Bytes, ThumbnailError> {
        request.validate()?;

        let source = self.source.read(&request.source_id).await?;

        let transformer = Arc::clone(&self.transformer);
        let (width, height) = (request.width, request.height);

        let resized = tokio::task::spawn_blocking(move || {
            transformer.transform(&source, width, height)
        })
        .await
        .map_err(|e| ThumbnailError::Internal(format!("Resize task failed: {}", e)))??;

        Ok(resized)
    }

    async fn generate_and_store(
        &self,
        request: &ThumbnailRequest,
        key: &CacheKey,
    ) -> Result<Bytes, ThumbnailError> {
        let data = self.generate(request).await?;
        self.spawn_write_back(key.clone(), data.clone());
        Ok(data)
    }

    /// Write `data` under `key` on a detached task.
    ///
    /// The outcome is only logged; the caller never waits on it.
    fn spawn_write_back(&self, key: CacheKey, data: Bytes) {
        let store = Arc::clone(&self.store);
        let ttl = self.ttl;

        tokio::spawn(async move {
            match store.set_with_ttl(key.as_str(), data, ttl).await {
                Ok(()) => debug!(cache_key = %key, ttl_secs = ttl.as_secs(), "Stored thumbnail"),
                Err(e) => error!(cache_key = %key, error = %e, "Failed to store thumbnail"),
            }
        });
    }

    /// Get a reference to the cache store.
    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    /// Get a reference to the source reader.
    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    /// Expiry applied to cache writes.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Whether concurrent misses are deduplicated.
    pub fn single_flight_enabled(&self) -> bool {
        self.flight.is_some()
    }
}

// =============================================================================
// Tests
// =============================================================================
