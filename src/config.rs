//! Configuration management for the thumbnail server.
//!
//! This module provides a flexible configuration system that supports:
//! - Command-line arguments via clap
//! - Environment variables with `THUMB_` prefix
//! - Sensible defaults for all optional settings
//!
//! # Environment Variables
//!
//! - `THUMB_HOST` - Server bind address (default: 0.0.0.0)
//! - `THUMB_PORT` - Server port (default: 3000)
//! - `THUMB_REDIS_URL` - Redis/Valkey URL; falls back to `VALKEY_URL`. When
//!   neither is set an in-process store is used
//! - `THUMB_SOURCE_ROOT` - Directory that relative source paths resolve against
//! - `THUMB_CACHE_TTL` - Thumbnail cache TTL in seconds (default: 3600)
//! - `THUMB_CACHE_MAX_AGE` - HTTP cache max-age seconds (default: 3600)
//! - `THUMB_MEMORY_CACHE_SIZE` - In-process store budget in bytes (default: 100MB)
//! - `THUMB_DEFAULT_WIDTH` - Width used when a request omits it (default: 200)
//! - `THUMB_JPEG_QUALITY` - JPEG output quality (default: 80)
//! - `THUMB_SINGLE_FLIGHT` - Deduplicate concurrent misses per key (default: false)
//! - `THUMB_CORS_ORIGINS` - Allowed CORS origins, comma-separated

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::store::{DEFAULT_CACHE_TTL, DEFAULT_MEMORY_STORE_CAPACITY};
use crate::thumbnail::{is_valid_quality, DEFAULT_JPEG_QUALITY, DEFAULT_WIDTH};

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default HTTP cache max-age in seconds (1 hour).
pub const DEFAULT_CACHE_MAX_AGE: u32 = 3600;

// =============================================================================
// CLI Arguments
// =============================================================================

/// Thumbnail Streamer - resized thumbnails with a Redis-backed cache.
///
/// Reads source images from the local filesystem, shrinks them to the
/// requested size, and caches the result for an hour.
#[derive(Parser, Debug, Clone)]
#[command(name = "thumbnail-streamer")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "THUMB_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "THUMB_PORT")]
    pub port: u16,

    // =========================================================================
    // Store Configuration
    // =========================================================================
    /// Redis/Valkey connection URL (e.g. redis://localhost:6379).
    ///
    /// If not specified, `VALKEY_URL` is tried, then an in-process store is used.
    #[arg(long, env = "THUMB_REDIS_URL")]
    pub redis_url: Option<String>,

    /// Thumbnail cache TTL in seconds.
    #[arg(long, default_value_t = DEFAULT_CACHE_TTL.as_secs(), env = "THUMB_CACHE_TTL")]
    pub cache_ttl: u64,

    /// Maximum bytes held by the in-process store.
    #[arg(long, default_value_t = DEFAULT_MEMORY_STORE_CAPACITY, env = "THUMB_MEMORY_CACHE_SIZE")]
    pub memory_cache_size: usize,

    /// Deduplicate concurrent cache misses for the same thumbnail.
    ///
    /// Followers wait for, and share the result or failure of, the first request.
    #[arg(long, default_value_t = false, env = "THUMB_SINGLE_FLIGHT")]
    pub single_flight: bool,

    // =========================================================================
    // Source Configuration
    // =========================================================================
    /// Directory that relative source paths are resolved against.
    ///
    /// Absolute paths are read as-is.
    #[arg(long, env = "THUMB_SOURCE_ROOT")]
    pub source_root: Option<PathBuf>,

    // =========================================================================
    // Thumbnail Configuration
    // =========================================================================
    /// Width used when a request does not give one.
    #[arg(long, default_value_t = DEFAULT_WIDTH, env = "THUMB_DEFAULT_WIDTH")]
    pub default_width: u32,

    /// JPEG quality for JPEG thumbnails (1-100).
    #[arg(long, default_value_t = DEFAULT_JPEG_QUALITY, env = "THUMB_JPEG_QUALITY")]
    pub jpeg_quality: u8,

    /// HTTP Cache-Control max-age in seconds.
    #[arg(long, default_value_t = DEFAULT_CACHE_MAX_AGE, env = "THUMB_CACHE_MAX_AGE")]
    pub cache_max_age: u32,

    // =========================================================================
    // CORS Configuration
    // =========================================================================
    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "THUMB_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.cache_ttl == 0 {
            return Err("cache_ttl must be greater than 0".to_string());
        }

        if self.memory_cache_size == 0 {
            return Err("memory_cache_size must be greater than 0".to_string());
        }

        if self.default_width == 0 {
            return Err("default_width must be greater than 0".to_string());
        }

        if !is_valid_quality(self.jpeg_quality) {
            return Err("jpeg_quality must be between 1 and 100".to_string());
        }

        if let Some(url) = self.resolved_redis_url() {
            if !(url.starts_with("redis://")
                || url.starts_with("rediss://")
                || url.starts_with("redis+unix://")
                || url.starts_with("unix://"))
            {
                return Err(format!(
                    "redis_url must use a redis://, rediss:// or unix:// scheme, got '{}'",
                    url
                ));
            }
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Thumbnail cache TTL.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl)
    }

    /// The Redis URL to use: `--redis-url`, then `VALKEY_URL`, else none.
    pub fn resolved_redis_url(&self) -> Option<String> {
        self.redis_url
            .clone()
            .or_else(|| std::env::var("VALKEY_URL").ok())
            .filter(|url| !url.is_empty())
    }
}

// =============================================================================
// Tests
// =============================================================================
