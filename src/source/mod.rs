//! Source image access.
//!
//! A [`SourceReader`] turns a source identifier into the raw bytes of the
//! original image. The thumbnail service only needs to tell "does not exist"
//! apart from every other failure, so readers report absence through
//! [`SourceError::NotFound`].
//!
//! Identifiers are passed through verbatim. No normalization or sandboxing is
//! applied at this layer.

mod fs;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::SourceError;

pub use fs::FsSource;

/// Capability for reading the raw bytes of a source image.
///
/// Implementations must be cheap to share across requests; the service holds
/// one instance behind an `Arc` for the lifetime of the process.
#[async_trait]
pub trait SourceReader: Send + Sync {
    /// Read the full contents of the source identified by `source_id`.
    ///
    /// Returns [`SourceError::NotFound`] when the identifier does not resolve.
    async fn read(&self, source_id: &str) -> Result<Bytes, SourceError>;
}
