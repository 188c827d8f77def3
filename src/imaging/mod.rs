//! Image processing in pure Rust.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Orientation** | custom EXIF reader (JPEG APP1 + TIFF IFD0) |
//! | **Decode** | `image::load_from_memory` + rotate/flip per EXIF code |
//! | **Crop + resample** | `imageops::crop_imm` + `fast_image_resize` Lanczos3 |
//! | **Encode** | `image` JPEG / PNG encoders |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for crop/resize geometry (unit testable)
//! - **Parameters**: Encoding quality
//! - **Backend**: [`Encoder`] trait + [`RustEncoder`]
//! - **Decode / Transform / Compress**: the pixel stages, in pipeline order

pub mod backend;
mod calculations;
pub mod compress;
pub mod decode;
pub(crate) mod exif;
mod params;
pub mod rust_backend;
pub mod transform;

pub use backend::{EncodeError, Encoder};
pub use calculations::{
    Anchor, CROP_RATIO_THRESHOLD, CropRect, GeometryPlan, ParseCropError, plan_all_anchors,
    plan_crop_area, plan_fit, plan_smart_crop,
};
pub use compress::{Compressed, compress};
pub use decode::{DecodeError, DecodedImage, apply_orientation, decode};
pub use params::Quality;
pub use rust_backend::RustEncoder;
pub use transform::apply_plan;
