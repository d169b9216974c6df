//! HTTP request handlers for the thumbnail API.
//!
//! # Endpoints
//!
//! - `GET /thumbnail?path=...&width=...&height=...` - Serve a thumbnail
//! - `GET /health` - Health check endpoint

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::error::ThumbnailError;
use crate::source::SourceReader;
use crate::thumbnail::{ThumbnailRequest, ThumbnailService, DEFAULT_WIDTH};

/// Header reporting whether the thumbnail came from the store.
pub const CACHE_STATUS_HEADER: HeaderName = HeaderName::from_static("x-cache-status");

// =============================================================================
// Application State
// =============================================================================

/// Shared application state containing the thumbnail service.
///
/// This is passed to all handlers via Axum's State extractor.
pub struct AppState<S: SourceReader> {
    /// The thumbnail service for processing requests
    pub thumbnail_service: Arc<ThumbnailService<S>>,

    /// Cache-Control max-age in seconds (defaults to 1 hour)
    pub cache_max_age: u32,

    /// Width used when the request does not give one
    pub default_width: u32,
}

impl<S: SourceReader> AppState<S> {
    /// Create a new application state with the given thumbnail service.
    pub fn new(thumbnail_service: ThumbnailService<S>) -> Self {
        Self {
            thumbnail_service: Arc::new(thumbnail_service),
            cache_max_age: 3600,
            default_width: DEFAULT_WIDTH,
        }
    }

    /// Set the Cache-Control max-age.
    pub fn with_cache_max_age(mut self, cache_max_age: u32) -> Self {
        self.cache_max_age = cache_max_age;
        self
    }

    /// Set the default width.
    pub fn with_default_width(mut self, default_width: u32) -> Self {
        self.default_width = default_width;
        self
    }
}

impl<S: SourceReader> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            thumbnail_service: Arc::clone(&self.thumbnail_service),
            cache_max_age: self.cache_max_age,
            default_width: self.default_width,
        }
    }
}

// =============================================================================
// Request Parameters
// =============================================================================

/// Query parameters for thumbnail requests.
///
/// Dimensions are kept as raw strings so that malformed values produce the
/// service's own 400 body instead of an extractor rejection. Built from the
/// raw key/value pairs: the first occurrence of a repeated key wins and
/// unknown keys are ignored.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ThumbnailQueryParams {
    /// URL-encoded source identifier (required)
    pub path: Option<String>,

    /// Bounding width in pixels (default: 200)
    pub width: Option<String>,

    /// Bounding height in pixels (optional)
    pub height: Option<String>,
}

impl FromIterator<(String, String)> for ThumbnailQueryParams {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(pairs: I) -> Self {
        let mut params = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "path" => &mut params.path,
                "width" => &mut params.width,
                "height" => &mut params.height,
                _ => continue,
            };
            slot.get_or_insert(value);
        }
        params
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response returned for all error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub error: String,
}

impl ErrorResponse {
    /// Create a new error response.
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,

    /// Cache store backend name
    pub cache_backend: String,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Convert ThumbnailError to HTTP response.
///
/// The body carries a fixed public message; details stay in the logs:
/// - 400 errors are logged at DEBUG level
/// - 404 errors are logged at WARN level
/// - 5xx errors are logged at ERROR level
impl IntoResponse for ThumbnailError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            ThumbnailError::MissingPath => (
                StatusCode::BAD_REQUEST,
                "missing_path",
                "File path is required.",
            ),
            ThumbnailError::InvalidPath(_) => (
                StatusCode::BAD_REQUEST,
                "invalid_path",
                "Invalid file path.",
            ),
            ThumbnailError::InvalidDimensions(_) => (
                StatusCode::BAD_REQUEST,
                "invalid_dimensions",
                "Invalid width or height parameter.",
            ),
            ThumbnailError::NotFound { .. } => {
                (StatusCode::NOT_FOUND, "not_found", "File not found.")
            }
            ThumbnailError::Source(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "source_error",
                "Internal server error processing image.",
            ),
            ThumbnailError::Transform(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "transform_error",
                "Internal server error processing image.",
            ),
            ThumbnailError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "Internal server error processing image.",
            ),
        };

        if status.is_server_error() {
            error!(
                error_type = error_type,
                status = status.as_u16(),
                "Server error: {}",
                self
            );
        } else if status == StatusCode::NOT_FOUND {
            warn!(
                error_type = error_type,
                status = status.as_u16(),
                "{}",
                self
            );
        } else {
            debug!(
                error_type = error_type,
                status = status.as_u16(),
                "Client error: {}",
                self
            );
        }

        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle thumbnail requests.
///
/// # Endpoint
///
/// `GET /thumbnail`
///
/// # Query Parameters
///
/// - `path`: URL-encoded source identifier (required)
/// - `width`: Bounding width in pixels (default: 200)
/// - `height`: Bounding height in pixels (optional)
///
/// # Response
///
/// - `200 OK`: Thumbnail bytes
/// - `400 Bad Request`: Missing path or invalid dimensions
/// - `404 Not Found`: Source not found
/// - `500 Internal Server Error`: Read or resize failure
///
/// # Headers
///
/// - `Content-Type`: From the source extension (default `image/jpeg`)
/// - `Content-Length`
/// - `Cache-Control: public, max-age={cache_max_age}`
/// - `X-Cache-Status: hit|miss`
pub async fn thumbnail_handler<S: SourceReader + 'static>(
    State(state): State<AppState<S>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Response, ThumbnailError> {
    let query: ThumbnailQueryParams = pairs.into_iter().collect();

    let request = ThumbnailRequest::from_params(
        query.path.as_deref(),
        query.width.as_deref(),
        query.height.as_deref(),
        state.default_width,
    )?;

    let response = state.thumbnail_service.get_thumbnail(request).await?;

    let headers = [
        (header::CONTENT_TYPE, response.content_type.to_string()),
        (header::CONTENT_LENGTH, response.data.len().to_string()),
        (
            header::CACHE_CONTROL,
            format!("public, max-age={}", state.cache_max_age),
        ),
        (CACHE_STATUS_HEADER, response.cache_status.as_str().to_string()),
    ];

    Ok((StatusCode::OK, headers, Body::from(response.data)).into_response())
}

/// Handle health check requests.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "cache_backend": "redis"
/// }
/// ```
pub async fn health_handler<S: SourceReader + 'static>(
    State(state): State<AppState<S>>,
) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        cache_backend: state.thumbnail_service.store().backend().to_string(),
    })
}

// =============================================================================
// Tests
// =============================================================================
