//! HTTP server layer for the thumbnail server.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │          GET /thumbnail?path={id}&width={w}&height={h}          │
//! │                                                                 │
//! │  ┌──────────────────────────┐  ┌─────────────────────────────┐  │
//! │  │        handlers          │  │           routes            │  │
//! │  │ (requests, error codes)  │  │   (router, CORS, tracing)   │  │
//! │  └──────────────────────────┘  └─────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod handlers;
pub mod routes;

pub use handlers::{
    health_handler, thumbnail_handler, AppState, ErrorResponse, HealthResponse,
    ThumbnailQueryParams, CACHE_STATUS_HEADER,
};
pub use routes::{create_router, RouterConfig};
