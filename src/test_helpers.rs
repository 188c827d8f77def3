//! Shared test utilities for the photofit test suite.
//!
//! Synthetic pixel surfaces, in-memory encoders, and a builder for JPEGs
//! carrying an EXIF orientation tag. Nothing here touches the filesystem.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let upright = quadrant_surface(64, 32);
//! let jpeg = insert_after_soi(&encode_jpeg(&upright, 90), &exif_app1_segment(6, true));
//! ```

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

// =========================================================================
// Surfaces
// =========================================================================

/// Opaque surface with smooth gradients plus a fine XOR texture, so lossy
/// encoders have detail to trade against size.
pub fn gradient_surface(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        Rgba([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            ((x ^ y) % 256) as u8,
            255,
        ])
    })
}

pub const QUADRANT_COLORS: [[u8; 4]; 4] = [
    [230, 30, 30, 255],  // top-left
    [30, 200, 30, 255],  // top-right
    [30, 30, 230, 255],  // bottom-left
    [230, 230, 30, 255], // bottom-right
];

/// Four solid quadrants, distinct under every rotation and flip.
pub fn quadrant_surface(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        let right = (x >= width / 2) as usize;
        let bottom = (y >= height / 2) as usize;
        Rgba(QUADRANT_COLORS[bottom * 2 + right])
    })
}

// =========================================================================
// Encoding
// =========================================================================

pub fn encode_png(surface: &RgbaImage) -> Vec<u8> {
    let mut buf = Vec::new();
    surface
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

pub fn encode_jpeg(surface: &RgbaImage, quality: u8) -> Vec<u8> {
    let mut buf = Vec::new();
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality);
    DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(surface.clone()).to_rgb8())
        .write_with_encoder(encoder)
        .unwrap();
    buf
}

// =========================================================================
// EXIF
// =========================================================================

/// A complete APP1 segment (`FF E1` + length + `Exif\0\0` + TIFF) whose
/// IFD0 holds a single Orientation entry.
pub fn exif_app1_segment(orientation: u16, big_endian: bool) -> Vec<u8> {
    let u16b = |v: u16| if big_endian { v.to_be_bytes() } else { v.to_le_bytes() };
    let u32b = |v: u32| if big_endian { v.to_be_bytes() } else { v.to_le_bytes() };

    let mut tiff = Vec::new();
    tiff.extend_from_slice(if big_endian { b"MM" } else { b"II" });
    tiff.extend_from_slice(&u16b(42));
    tiff.extend_from_slice(&u32b(8)); // IFD0 offset
    tiff.extend_from_slice(&u16b(1)); // entry count
    tiff.extend_from_slice(&u16b(0x0112)); // Orientation
    tiff.extend_from_slice(&u16b(3)); // SHORT
    tiff.extend_from_slice(&u32b(1)); // count
    tiff.extend_from_slice(&u16b(orientation));
    tiff.extend_from_slice(&[0, 0]); // value padding
    tiff.extend_from_slice(&u32b(0)); // next IFD

    let payload_len = 6 + tiff.len();
    let mut segment = vec![0xFF, 0xE1];
    segment.extend_from_slice(&((payload_len + 2) as u16).to_be_bytes());
    segment.extend_from_slice(b"Exif\0\0");
    segment.extend_from_slice(&tiff);
    segment
}

/// Splice `segment` into a JPEG right after its SOI marker.
pub fn insert_after_soi(jpeg: &[u8], segment: &[u8]) -> Vec<u8> {
    assert_eq!(&jpeg[..2], &[0xFF, 0xD8], "not a JPEG");
    let mut out = Vec::with_capacity(jpeg.len() + segment.len());
    out.extend_from_slice(&jpeg[..2]);
    out.extend_from_slice(segment);
    out.extend_from_slice(&jpeg[2..]);
    out
}

/// Small real JPEG with `segment` spliced in after SOI.
pub fn jpeg_with_segment(segment: &[u8]) -> Vec<u8> {
    insert_after_soi(&encode_jpeg(&gradient_surface(8, 8), 80), segment)
}
