//! Encoder trait and shared error type.
//!
//! The [`Encoder`] trait is the one seam between pixel work and codecs: it
//! turns an upright RGBA surface into JPEG or PNG bytes at a given quality.
//! The compressor only ever talks to this trait, so its search can be
//! tested against a deterministic mock.
//!
//! The production implementation is
//! [`RustEncoder`](super::rust_backend::RustEncoder), built on the `image`
//! crate's pure-Rust codecs.

use super::params::Quality;
use crate::types::ImageFormat;
use image::RgbaImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("{format} encode failed: {message}")]
    Failed {
        format: ImageFormat,
        message: String,
    },
}

/// Trait for image encoders.
///
/// `quality` is ignored by lossless formats.
pub trait Encoder: Sync {
    fn encode(
        &self,
        surface: &RgbaImage,
        format: ImageFormat,
        quality: Quality,
    ) -> Result<Vec<u8>, EncodeError>;
}
