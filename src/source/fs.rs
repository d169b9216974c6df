//! Local filesystem source.

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::warn;

use super::SourceReader;
use crate::error::SourceError;

/// Reads source images from the local filesystem.
///
/// The source identifier is used as a path as-is. When a root is configured,
/// relative identifiers are joined onto it; absolute identifiers still replace
/// the root entirely, matching `Path::join` semantics. Nothing prevents an
/// identifier from escaping the root.
///
/// # Example
///
/// ```ignore
/// use thumbnail_streamer::source::{FsSource, SourceReader};
///
/// let source = FsSource::new();
/// let bytes = source.read("/photos/a.jpg").await?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct FsSource {
    root: Option<PathBuf>,
}

impl FsSource {
    /// Create a source that resolves identifiers relative to the working directory.
    pub fn new() -> Self {
        Self { root: None }
    }

    /// Create a source that resolves relative identifiers against `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    /// Get the configured root, if any.
    pub fn root(&self) -> Option<&PathBuf> {
        self.root.as_ref()
    }

    fn resolve(&self, source_id: &str) -> PathBuf {
        match &self.root {
            Some(root) => root.join(source_id),
            None => PathBuf::from(source_id),
        }
    }
}

#[async_trait]
impl SourceReader for FsSource {
    async fn read(&self, source_id: &str) -> Result<Bytes, SourceError> {
        let path = self.resolve(source_id);
        warn!(path = %path.display(), "Reading source without path validation");

        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(SourceError::NotFound(source_id.to_string()))
            }
            Err(e) => Err(SourceError::Io {
                source_id: source_id.to_string(),
                message: e.to_string(),
            }),
        }
    }
}
