//! Router configuration for the thumbnail server.
//!
//! This module defines the HTTP routes and applies middleware for CORS and
//! request tracing.
//!
//! # Route Structure
//!
//! ```text
//! /health                      - Health check
//! /thumbnail?path=&width=      - Thumbnail endpoint
//! /api/image?path=&width=      - Alias of /thumbnail
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use thumbnail_streamer::server::routes::{create_router, RouterConfig};
//! use thumbnail_streamer::source::FsSource;
//! use thumbnail_streamer::store::MemoryStore;
//! use thumbnail_streamer::thumbnail::ThumbnailService;
//!
//! let service = ThumbnailService::new(Arc::new(MemoryStore::new()), FsSource::new());
//! let router = create_router(service, RouterConfig::new());
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::time::Duration;

use axum::{routing::get, Router};
use http::header::CONTENT_TYPE;
use http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{health_handler, thumbnail_handler, AppState};
use crate::source::SourceReader;
use crate::thumbnail::{ThumbnailService, DEFAULT_WIDTH};

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Clone)]
pub struct RouterConfig {
    /// Allowed CORS origins (None = allow any origin)
    pub cors_origins: Option<Vec<String>>,

    /// Cache-Control max-age in seconds
    pub cache_max_age: u32,

    /// Width used when a request does not give one
    pub default_width: u32,

    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl RouterConfig {
    /// Create a new router configuration.
    ///
    /// By default:
    /// - CORS allows any origin
    /// - Cache max-age is 1 hour (3600 seconds)
    /// - Default width is 200 pixels
    /// - Tracing is enabled
    pub fn new() -> Self {
        Self {
            cors_origins: None,
            cache_max_age: 3600,
            default_width: DEFAULT_WIDTH,
            enable_tracing: true,
        }
    }

    /// Set specific allowed CORS origins.
    ///
    /// Pass an empty vec to disallow all cross-origin requests.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    /// Allow any CORS origin.
    pub fn with_cors_any_origin(mut self) -> Self {
        self.cors_origins = None;
        self
    }

    /// Set the Cache-Control max-age in seconds.
    pub fn with_cache_max_age(mut self, seconds: u32) -> Self {
        self.cache_max_age = seconds;
        self
    }

    /// Set the width used when a request omits it.
    pub fn with_default_width(mut self, width: u32) -> Self {
        self.default_width = width;
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
///
/// # Arguments
///
/// * `thumbnail_service` - The service handling thumbnail requests
/// * `config` - Router configuration
pub fn create_router<S>(thumbnail_service: ThumbnailService<S>, config: RouterConfig) -> Router
where
    S: SourceReader + 'static,
{
    let app_state = AppState::new(thumbnail_service)
        .with_cache_max_age(config.cache_max_age)
        .with_default_width(config.default_width);

    let cors = build_cors_layer(&config);

    let router = Router::new()
        .route("/health", get(health_handler::<S>))
        .route("/thumbnail", get(thumbnail_handler::<S>))
        .route("/api/image", get(thumbnail_handler::<S>))
        .with_state(app_state)
        .layer(cors);

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Build the CORS layer based on configuration.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .expose_headers([super::handlers::CACHE_STATUS_HEADER])
        .max_age(Duration::from_secs(86400)); // 24 hours

    match &config.cors_origins {
        None => cors.allow_origin(Any),
        Some(origins) if origins.is_empty() => cors,
        Some(origins) => {
            let parsed_origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            cors.allow_origin(parsed_origins)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
