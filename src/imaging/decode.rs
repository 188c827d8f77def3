//! Orientation-aware decoder.
//!
//! Turns uploaded bytes into an upright RGBA surface. Camera JPEGs often
//! store pixels sideways and record the intended rotation in EXIF; every
//! later stage expects upright pixels, so the correction happens here and
//! only here.
//!
//! ```text
//! code  transform                    dims
//!  1    identity                     w×h
//!  2    flip horizontal              w×h
//!  3    rotate 180°                  w×h
//!  4    flip vertical                w×h
//!  5    transpose (rot 90° + flip)   h×w
//!  6    rotate 90° clockwise         h×w
//!  7    transverse (rot 270° + flip) h×w
//!  8    rotate 270° clockwise        h×w
//! ```

use super::exif;
use crate::types::{Dimensions, ImageFormat, ImageSummary};
use image::RgbaImage;
use image::imageops;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("empty file")]
    Empty,
    #[error("could not decode image: {0}")]
    Invalid(#[from] image::ImageError),
    #[error("image has zero width or height")]
    ZeroDimensions,
}

/// An upright pixel surface plus the attributes of the file it came from.
///
/// Never mutated after construction: transforms produce new surfaces.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    surface: RgbaImage,
    /// Byte length of the uploaded file, not of the pixel buffer.
    pub size_bytes: u64,
    pub format: ImageFormat,
    /// EXIF orientation code the surface was corrected with.
    pub orientation: u8,
    /// Upright dimensions at decode time.
    pub original_dimensions: Dimensions,
}

impl DecodedImage {
    /// Wrap an already-upright surface.
    pub fn new(surface: RgbaImage, size_bytes: u64, format: ImageFormat, orientation: u8) -> Self {
        let original_dimensions = Dimensions::new(surface.width(), surface.height());
        Self {
            surface,
            size_bytes,
            format,
            orientation,
            original_dimensions,
        }
    }

    pub fn surface(&self) -> &RgbaImage {
        &self.surface
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.surface.width(), self.surface.height())
    }

    pub fn width(&self) -> u32 {
        self.surface.width()
    }

    pub fn height(&self) -> u32 {
        self.surface.height()
    }

    pub fn summary(&self) -> ImageSummary {
        ImageSummary {
            dimensions: self.dimensions(),
            format: self.format,
            size_bytes: self.size_bytes,
            orientation: self.orientation,
        }
    }
}

/// Decode JPEG or PNG bytes into an upright [`DecodedImage`].
///
/// The format is taken from `mime` (`image/png` is PNG, anything else JPEG);
/// the pixel decoder sniffs the actual content. Only JPEGs are scanned for
/// an orientation tag.
pub fn decode(bytes: &[u8], mime: &str) -> Result<DecodedImage, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }
    let format = ImageFormat::from_mime(mime);
    let orientation = match format {
        ImageFormat::Jpg => exif::read_orientation(bytes),
        ImageFormat::Png => 1,
    };

    let raw = image::load_from_memory(bytes)?.to_rgba8();
    if raw.width() == 0 || raw.height() == 0 {
        return Err(DecodeError::ZeroDimensions);
    }
    let surface = apply_orientation(&raw, orientation);
    log::debug!(
        "decoded {format} {}x{} (orientation {orientation}, {} bytes)",
        surface.width(),
        surface.height(),
        bytes.len()
    );

    Ok(DecodedImage::new(
        surface,
        bytes.len() as u64,
        format,
        orientation,
    ))
}

/// Map a stored surface to its upright form for an EXIF orientation code.
///
/// Unknown codes are treated as 1.
pub fn apply_orientation(surface: &RgbaImage, orientation: u8) -> RgbaImage {
    match orientation {
        2 => imageops::flip_horizontal(surface),
        3 => imageops::rotate180(surface),
        4 => imageops::flip_vertical(surface),
        5 => imageops::flip_horizontal(&imageops::rotate90(surface)),
        6 => imageops::rotate90(surface),
        7 => imageops::flip_horizontal(&imageops::rotate270(surface)),
        8 => imageops::rotate270(surface),
        _ => surface.clone(),
    }
}

/// Whether an orientation code swaps width and height.
pub fn swaps_dimensions(orientation: u8) -> bool {
    matches!(orientation, 5..=8)
}
