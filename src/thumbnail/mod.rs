//! Thumbnail service layer.
//!
//! This module provides cache-aside thumbnail generation: look the thumbnail
//! up in the store, and on a miss read the source, resize it, hand the result
//! to a detached write-back, and return it.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              HTTP Handlers              │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │            ThumbnailService             │
//! │  ┌──────────────┐  ┌─────────────────┐  │
//! │  │  CacheKey    │  │ ResizeTransform │  │
//! │  │  (canonical  │  │ (fit inside,    │  │
//! │  │   string)    │  │  no upscale)    │  │
//! │  └──────────────┘  └─────────────────┘  │
//! └──────────┬─────────────────────┬────────┘
//!            │                     │
//!            ▼                     ▼
//! ┌────────────────────┐  ┌─────────────────┐
//! │     CacheStore     │  │  SourceReader   │
//! └────────────────────┘  └─────────────────┘
//! ```
//!
//! # Components
//!
//! - [`ThumbnailService`]: Main entry point, orchestrates the full pipeline
//! - [`CacheKey`]: Canonical `thumbnail:<source>:w<width>:h<height|auto>` key
//! - [`ResizeTransformer`]: Decodes, shrinks, and re-encodes source images
//! - [`SingleFlight`]: Optional per-key deduplication of concurrent misses
//! - [`content_type_for`]: Extension to content-type lookup
//!
//! # Example
//!
//! ```
//! use thumbnail_streamer::thumbnail::{fit_inside, CacheKey};
//!
//! let key = CacheKey::build("/photos/a.jpg", 100, None);
//! assert_eq!(key.as_str(), "thumbnail:/photos/a.jpg:w100:hauto");
//!
//! // A 50x50 source is never enlarged
//! assert_eq!(fit_inside((50, 50), 200, None), (50, 50));
//! ```

mod flight;
mod key;
mod mime;
mod service;
mod transform;

pub use flight::SingleFlight;
pub use key::{CacheKey, AUTO_HEIGHT, KEY_PREFIX};
pub use mime::{content_type_for, DEFAULT_CONTENT_TYPE};
pub use service::{
    CacheStatus, ThumbnailRequest, ThumbnailResponse, ThumbnailService, DEFAULT_WIDTH,
};
pub use transform::{
    clamp_quality, fit_inside, is_valid_quality, ImageTransformer, ResizeTransformer,
    DEFAULT_JPEG_QUALITY, MAX_JPEG_QUALITY, MIN_JPEG_QUALITY,
};
