//! # Thumbnail Streamer
//!
//! A thumbnail server that resizes source images on demand and caches the
//! results in Redis/Valkey.
//!
//! Every request is served cache-aside: the thumbnail is looked up under a
//! canonical key, and on a miss the source image is read, shrunk to fit the
//! requested box, written back to the store in the background, and returned.
//!
//! ## Features
//!
//! - **Cache-aside**: Thumbnails are cached for an hour under
//!   `thumbnail:<path>:w<width>:h<height|auto>`
//! - **Non-blocking write-back**: Store writes never delay or fail a response
//! - **Fit-inside resizing**: Aspect ratio is preserved and images are never enlarged
//! - **Pluggable backends**: Redis/Valkey, or an in-process LRU store
//! - **Optional single-flight**: Concurrent misses on one key share a single render
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`source`] - Reading source images
//! - [`store`] - Cache store trait and its Redis and in-memory backends
//! - [`thumbnail`] - Cache keys, resizing, and the cache-aside service
//! - [`server`] - Axum-based HTTP server and routes
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use thumbnail_streamer::{create_router, FsSource, MemoryStore, RouterConfig, ThumbnailService};
//!
//! #[tokio::main]
//! async fn main() {
//!     let service = ThumbnailService::new(Arc::new(MemoryStore::new()), FsSource::new());
//!     let router = create_router(service, RouterConfig::new());
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
//!     axum::serve(listener, router).await.unwrap();
//! }
//! ```

pub mod config;
pub mod error;
pub mod server;
pub mod source;
pub mod store;
pub mod thumbnail;

// Re-export commonly used types
pub use config::Config;
pub use error::{SourceError, StoreError, ThumbnailError, TransformError};
pub use server::{
    create_router, health_handler, thumbnail_handler, AppState, ErrorResponse, HealthResponse,
    RouterConfig, ThumbnailQueryParams, CACHE_STATUS_HEADER,
};
pub use source::{FsSource, SourceReader};
pub use store::{CacheStore, MemoryStore, RedisStore, DEFAULT_CACHE_TTL};
pub use thumbnail::{
    content_type_for, fit_inside, CacheKey, CacheStatus, ImageTransformer, ResizeTransformer,
    SingleFlight, ThumbnailRequest, ThumbnailResponse, ThumbnailService, DEFAULT_JPEG_QUALITY,
    DEFAULT_WIDTH,
};
