//! Image resizing.
//!
//! This module decodes a source image, shrinks it to fit the requested box,
//! and re-encodes the result.
//!
//! # Resize Policy
//!
//! - **Fit inside**: the output fits entirely within `width × height`; nothing
//!   is cropped. With no height, only the width bounds the output.
//!
//! - **Preserve aspect ratio**: both axes are scaled by the same factor, up to
//!   rounding to whole pixels.
//!
//! - **No upscaling**: a source that already fits is kept at its native size.
//!
//! # Output Format
//!
//! The output is encoded in the source's own format when that format can be
//! written (PNG, GIF, WebP, BMP, TIFF); everything else, including JPEG, is
//! written as JPEG at the configured quality.

use std::io::Cursor;

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};

use crate::error::TransformError;

/// Default JPEG quality (1-100).
pub const DEFAULT_JPEG_QUALITY: u8 = 80;

/// Minimum allowed JPEG quality.
pub const MIN_JPEG_QUALITY: u8 = 1;

/// Maximum allowed JPEG quality.
pub const MAX_JPEG_QUALITY: u8 = 100;

/// Capability for turning source bytes into a thumbnail.
///
/// Implementations must be deterministic: the same input bytes and
/// dimensions always yield the same output bytes. The call is CPU-bound and
/// is run on the blocking thread pool by the service.
pub trait ImageTransformer: Send + Sync {
    /// Resize `source` to fit inside `width × height` (or `width` alone when
    /// `height` is `None`), never enlarging it.
    fn transform(
        &self,
        source: &[u8],
        width: u32,
        height: Option<u32>,
    ) -> Result<Bytes, TransformError>;
}

// =============================================================================
// Dimension Math
// =============================================================================

/// Compute the output size for a fit-inside, no-upscale resize.
///
/// `native` is the source size. Returns the native size unchanged when the
/// source already fits inside the box. Each output axis is at least 1 pixel
/// and never exceeds its bound.
pub fn fit_inside(native: (u32, u32), width: u32, height: Option<u32>) -> (u32, u32) {
    let (w0, h0) = native;
    if w0 == 0 || h0 == 0 {
        return native;
    }

    let scale_w = width as f64 / w0 as f64;
    let scale = match height {
        Some(h) => scale_w.min(h as f64 / h0 as f64),
        None => scale_w,
    };

    if scale >= 1.0 {
        return native;
    }

    let w = ((w0 as f64 * scale).round() as u32).clamp(1, width.max(1));
    let h_bound = height.unwrap_or(h0);
    let h = ((h0 as f64 * scale).round() as u32).clamp(1, h_bound.max(1));
    (w, h)
}

// =============================================================================
// Resize Transformer
// =============================================================================

/// [`ImageTransformer`] built on the `image` crate.
///
/// # Example
///
/// ```ignore
/// use thumbnail_streamer::thumbnail::{ImageTransformer, ResizeTransformer};
///
/// let transformer = ResizeTransformer::new();
/// let thumbnail = transformer.transform(&source_bytes, 200, None)?;
/// ```
#[derive(Debug, Clone)]
pub struct ResizeTransformer {
    jpeg_quality: u8,
    filter: FilterType,
}

impl ResizeTransformer {
    /// Create a transformer with default JPEG quality and Lanczos3 filtering.
    pub fn new() -> Self {
        Self::with_quality(DEFAULT_JPEG_QUALITY)
    }

    /// Create a transformer that writes JPEG output at `quality`.
    ///
    /// Quality is clamped to 1-100.
    pub fn with_quality(quality: u8) -> Self {
        Self {
            jpeg_quality: clamp_quality(quality),
            filter: FilterType::Lanczos3,
        }
    }

    /// Use a different resampling filter.
    pub fn with_filter(mut self, filter: FilterType) -> Self {
        self.filter = filter;
        self
    }

    /// JPEG quality used for JPEG output.
    pub fn jpeg_quality(&self) -> u8 {
        self.jpeg_quality
    }

    /// Read image dimensions without fully decoding.
    pub fn dimensions(&self, source: &[u8]) -> Result<(u32, u32), TransformError> {
        let reader = ImageReader::new(Cursor::new(source))
            .with_guessed_format()
            .map_err(|e| TransformError::Decode {
                message: e.to_string(),
            })?;

        reader.into_dimensions().map_err(|e| TransformError::Decode {
            message: e.to_string(),
        })
    }

    fn encode(&self, img: &DynamicImage, format: Option<ImageFormat>) -> Result<Bytes, TransformError> {
        let mut output = Vec::new();

        let result = match format {
            Some(ImageFormat::Png) => img.write_to(&mut Cursor::new(&mut output), ImageFormat::Png),
            Some(
                format @ (ImageFormat::Gif
                | ImageFormat::WebP
                | ImageFormat::Bmp
                | ImageFormat::Tiff),
            ) => {
                // These encoders only accept 8-bit samples
                DynamicImage::ImageRgba8(img.to_rgba8())
                    .write_to(&mut Cursor::new(&mut output), format)
            }
            _ => {
                let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
                JpegEncoder::new_with_quality(&mut output, self.jpeg_quality).encode_image(&rgb)
            }
        };

        result.map_err(|e| TransformError::Encode {
            message: e.to_string(),
        })?;

        Ok(Bytes::from(output))
    }
}

impl Default for ResizeTransformer {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageTransformer for ResizeTransformer {
    fn transform(
        &self,
        source: &[u8],
        width: u32,
        height: Option<u32>,
    ) -> Result<Bytes, TransformError> {
        if width == 0 || height == Some(0) {
            return Err(TransformError::InvalidDimensions {
                width,
                height: height.unwrap_or(0),
            });
        }

        let reader = ImageReader::new(Cursor::new(source))
            .with_guessed_format()
            .map_err(|e| TransformError::Decode {
                message: e.to_string(),
            })?;
        let format = reader.format();

        let img = reader.decode().map_err(|e| TransformError::Decode {
            message: e.to_string(),
        })?;

        let native = (img.width(), img.height());
        let (w, h) = fit_inside(native, width, height);

        let resized = if (w, h) == native {
            img
        } else {
            img.resize_exact(w, h, self.filter)
        };

        self.encode(&resized, format)
    }
}

// =============================================================================
// Utility Functions
// =============================================================================

/// Clamp quality to valid range.
///
/// Values below 1 become 1, values above 100 become 100.
#[inline]
pub fn clamp_quality(quality: u8) -> u8 {
    quality.clamp(MIN_JPEG_QUALITY, MAX_JPEG_QUALITY)
}

/// Validate JPEG quality parameter.
#[inline]
pub fn is_valid_quality(quality: u8) -> bool {
    (MIN_JPEG_QUALITY..=MAX_JPEG_QUALITY).contains(&quality)
}

// =============================================================================
// Tests
// =============================================================================
