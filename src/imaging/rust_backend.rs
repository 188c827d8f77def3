//! Pure Rust encoder backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder::new_with_quality` (alpha dropped) |
//! | Encode → PNG | `image::codecs::png::PngEncoder` (best compression, adaptive filter) |

use super::backend::{EncodeError, Encoder};
use super::params::Quality;
use crate::types::ImageFormat;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{DynamicImage, RgbaImage};

/// Encoder using the `image` crate's JPEG and PNG codecs.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustEncoder;

impl RustEncoder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustEncoder {
    fn default() -> Self {
        Self::new()
    }
}

fn encode_jpeg(surface: &RgbaImage, quality: Quality) -> Result<Vec<u8>, EncodeError> {
    // JPEG has no alpha channel
    let rgb = DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(surface.clone()).to_rgb8());
    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality.percent());
    rgb.write_with_encoder(encoder)
        .map_err(|e| EncodeError::Failed {
            format: ImageFormat::Jpg,
            message: e.to_string(),
        })?;
    Ok(buf)
}

fn encode_png(surface: &RgbaImage) -> Result<Vec<u8>, EncodeError> {
    let mut buf = Vec::new();
    let encoder =
        PngEncoder::new_with_quality(&mut buf, CompressionType::Best, FilterType::Adaptive);
    DynamicImage::ImageRgba8(surface.clone())
        .write_with_encoder(encoder)
        .map_err(|e| EncodeError::Failed {
            format: ImageFormat::Png,
            message: e.to_string(),
        })?;
    Ok(buf)
}

impl Encoder for RustEncoder {
    fn encode(
        &self,
        surface: &RgbaImage,
        format: ImageFormat,
        quality: Quality,
    ) -> Result<Vec<u8>, EncodeError> {
        match format {
            ImageFormat::Jpg => encode_jpeg(surface, quality),
            ImageFormat::Png => encode_png(surface),
        }
    }
}
