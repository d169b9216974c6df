//! Test utilities for integration tests.
//!
//! This module provides mock sources and stores with call tracking, plus
//! helpers for building test images and driving the router.

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use bytes::Bytes;
use http_body_util::BodyExt;
use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, Rgb, RgbImage};
use tower::ServiceExt;

use thumbnail_streamer::error::{SourceError, StoreError};
use thumbnail_streamer::source::SourceReader;
use thumbnail_streamer::store::{CacheStore, MemoryStore};
use thumbnail_streamer::thumbnail::ThumbnailService;
use thumbnail_streamer::{create_router, RouterConfig};

// =============================================================================
// Mock Source with Read Tracking
// =============================================================================

/// An in-memory source that counts reads.
#[derive(Clone, Default)]
pub struct MockSource {
    files: Arc<HashMap<String, Bytes>>,
    failing: Arc<Vec<String>>,
    delay: Option<Duration>,
    read_count: Arc<AtomicUsize>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file under `source_id`.
    pub fn with_file(mut self, source_id: &str, data: Vec<u8>) -> Self {
        Arc::make_mut(&mut self.files).insert(source_id.to_string(), Bytes::from(data));
        self
    }

    /// Make reads of `source_id` fail with an I/O error.
    pub fn with_failing(mut self, source_id: &str) -> Self {
        Arc::make_mut(&mut self.failing).push(source_id.to_string());
        self
    }

    /// Sleep before every read.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn read_count(&self) -> usize {
        self.read_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceReader for MockSource {
    async fn read(&self, source_id: &str) -> Result<Bytes, SourceError> {
        self.read_count.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.iter().any(|id| id == source_id) {
            return Err(SourceError::Io {
                source_id: source_id.to_string(),
                message: "permission denied".to_string(),
            });
        }

        self.files
            .get(source_id)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(source_id.to_string()))
    }
}

// =============================================================================
// Tracking Store
// =============================================================================

/// A memory-backed store that counts calls and can be told to fail.
#[derive(Default)]
pub struct TrackingStore {
    inner: MemoryStore,
    get_count: AtomicUsize,
    set_count: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl TrackingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_reads() -> Self {
        let store = Self::new();
        store.fail_reads.store(true, Ordering::SeqCst);
        store
    }

    pub fn failing_writes() -> Self {
        let store = Self::new();
        store.fail_writes.store(true, Ordering::SeqCst);
        store
    }

    pub fn get_count(&self) -> usize {
        self.get_count.load(Ordering::SeqCst)
    }

    pub fn set_count(&self) -> usize {
        self.set_count.load(Ordering::SeqCst)
    }

    /// Read straight from the backing store, bypassing counters and failures.
    pub async fn peek(&self, key: &str) -> Option<Bytes> {
        self.inner.get(key).await.ok().flatten()
    }

    pub async fn len(&self) -> usize {
        self.inner.len().await
    }
}

#[async_trait]
impl CacheStore for TrackingStore {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, StoreError> {
        self.get_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Connection("connection refused".to_string()));
        }
        self.inner.get(key).await
    }

    async fn set_with_ttl(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), StoreError> {
        self.set_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Command("OOM command not allowed".to_string()));
        }
        self.inner.set_with_ttl(key, value, ttl).await
    }

    fn backend(&self) -> &'static str {
        "tracking"
    }
}

// =============================================================================
// Hanging Store
// =============================================================================

/// A store whose writes never complete. Reads always miss.
#[derive(Default)]
pub struct HangingStore {
    started_writes: AtomicUsize,
}

impl HangingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of writes that have begun (none ever finish).
    pub fn started_writes(&self) -> usize {
        self.started_writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CacheStore for HangingStore {
    async fn get(&self, _key: &str) -> Result<Option<Bytes>, StoreError> {
        Ok(None)
    }

    async fn set_with_ttl(&self, _key: &str, _value: Bytes, _ttl: Duration) -> Result<(), StoreError> {
        self.started_writes.fetch_add(1, Ordering::SeqCst);
        std::future::pending().await
    }

    fn backend(&self) -> &'static str {
        "hanging"
    }
}

// =============================================================================
// Router Helpers
// =============================================================================

/// Build a router over `source` and `store` with default settings.
pub fn router_with(source: MockSource, store: Arc<TrackingStore>) -> Router {
    let service = ThumbnailService::new(store, source);
    create_router(service, RouterConfig::new().with_tracing(false))
}

/// Send a GET to `uri` and return the response.
pub async fn get(router: &Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    router.clone().oneshot(request).await.unwrap()
}

/// Collect a response body.
pub async fn body_bytes(response: Response<Body>) -> Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

/// Collect a response body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// Get a header value as a string.
pub fn header<'a>(response: &'a Response<Body>, name: &str) -> Option<&'a str> {
    response.headers().get(name).and_then(|v| v.to_str().ok())
}

/// Poll until the write-back for `key` has landed.
pub async fn wait_for_key(store: &TrackingStore, key: &str) -> Bytes {
    for _ in 0..200 {
        if let Some(data) = store.peek(key).await {
            return data;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("write-back for {} never completed", key);
}

/// Poll until at least `count` writes have been attempted.
pub async fn wait_for_sets(store: &TrackingStore, count: usize) {
    for _ in 0..200 {
        if store.set_count() >= count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("expected {} writes, saw {}", count, store.set_count());
}

// =============================================================================
// Test Image Creation
// =============================================================================

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let r = (x % 256) as u8;
        let g = (y % 256) as u8;
        let b = ((x + y) % 256) as u8;
        Rgb([r, g, b])
    })
}

/// Create a test RGB JPEG image.
pub fn create_test_jpeg(width: u32, height: u32) -> Vec<u8> {
    let mut buf = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buf, 90);
    encoder.encode_image(&gradient(width, height)).unwrap();
    buf
}

/// Create a test RGB image in `format`.
pub fn create_test_image(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    gradient(width, height).write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

/// Create a test RGB PNG image.
pub fn create_test_png(width: u32, height: u32) -> Vec<u8> {
    create_test_image(width, height, ImageFormat::Png)
}

/// Decode `data` and return its format and dimensions.
pub fn inspect_image(data: &[u8]) -> (ImageFormat, u32, u32) {
    let format = image::guess_format(data).unwrap();
    let img = image::load_from_memory(data).unwrap();
    (format, img.width(), img.height())
}
