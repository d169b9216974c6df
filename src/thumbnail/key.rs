//! Cache keys for resized thumbnails.
//!
//! Keys have the form `thumbnail:<source_id>:w<width>:h<height>`, where an
//! unspecified height is written as the literal `auto`. The source identifier
//! is embedded verbatim.

use std::fmt;
use std::sync::Arc;

/// Prefix shared by every thumbnail key.
pub const KEY_PREFIX: &str = "thumbnail";

/// Token written in place of an unspecified height.
pub const AUTO_HEIGHT: &str = "auto";

/// Canonical cache key for a `(source_id, width, height)` triple.
///
/// Identical inputs always produce identical keys. A request without a height
/// never shares a key with one that spells out a height, even if the computed
/// output would be the same size.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(Arc<str>);

impl CacheKey {
    /// Build the key for a thumbnail request.
    pub fn build(source_id: &str, width: u32, height: Option<u32>) -> Self {
        let key = match height {
            Some(h) => format!("{}:{}:w{}:h{}", KEY_PREFIX, source_id, width, h),
            None => format!("{}:{}:w{}:h{}", KEY_PREFIX, source_id, width, AUTO_HEIGHT),
        };
        Self(key.into())
    }

    /// Get the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
