use thiserror::Error;

/// Errors raised when reading source images.
#[derive(Debug, Clone, Error)]
pub enum SourceError {
    /// The source identifier does not resolve to a readable object
    #[error("Source not found: {0}")]
    NotFound(String),

    /// Any other I/O failure while reading the source
    #[error("I/O error reading {source_id}: {message}")]
    Io { source_id: String, message: String },
}

/// Errors raised by a cache store backend.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The backend could not be reached
    #[error("Connection error: {0}")]
    Connection(String),

    /// The backend rejected or failed a command
    #[error("Command failed: {0}")]
    Command(String),
}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_connection_refusal() || err.is_connection_dropped() || err.is_io_error() {
            StoreError::Connection(err.to_string())
        } else {
            StoreError::Command(err.to_string())
        }
    }
}

/// Errors raised while decoding, resizing, or re-encoding an image.
#[derive(Debug, Clone, Error)]
pub enum TransformError {
    /// Source bytes could not be decoded as an image
    #[error("Failed to decode image: {message}")]
    Decode { message: String },

    /// Resized image could not be encoded
    #[error("Failed to encode image: {message}")]
    Encode { message: String },

    /// Requested or computed dimensions are unusable
    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
}

/// Classified outcome of a failed thumbnail request.
///
/// Every variant maps to exactly one HTTP status; see the `IntoResponse`
/// implementation in the server layer.
#[derive(Debug, Clone, Error)]
pub enum ThumbnailError {
    /// The `path` parameter is absent or empty
    #[error("File path is required.")]
    MissingPath,

    /// The `path` parameter is not valid percent-encoded UTF-8
    #[error("Invalid file path: {0}")]
    InvalidPath(String),

    /// `width` or `height` is not a positive integer
    #[error("Invalid width or height parameter: {0}")]
    InvalidDimensions(String),

    /// The source identifier does not resolve
    #[error("File not found: {source_id}")]
    NotFound { source_id: String },

    /// Reading the source failed for a reason other than absence
    #[error("Source error: {0}")]
    Source(SourceError),

    /// Decoding, resizing, or encoding failed
    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),

    /// Anything else (e.g. a panicked blocking task)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<SourceError> for ThumbnailError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::NotFound(source_id) => ThumbnailError::NotFound { source_id },
            other => ThumbnailError::Source(other),
        }
    }
}
