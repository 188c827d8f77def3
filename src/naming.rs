//! Human-readable labels and the output filename convention.
//!
//! Every string a user sees for a byte size, a pixel size, or an aspect ratio
//! is produced here so the analyzer, the change log, and the CLI agree:
//! - `3_500_000` bytes → `"3.3MB"`, `51_200` → `"50KB"`
//! - `400 × 500` → `"400×500px"`
//! - `4000 × 3000` → `"4:3"` (reduced by gcd)
//!
//! Fixed files are named `{platform_id}_photo_fixed.{ext}`.

use crate::types::{Dimensions, ImageFormat};

const BYTE_UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

/// Format a byte count with one decimal, trailing `.0` dropped.
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0B".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < BYTE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = (value * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{}{}", rounded as u64, BYTE_UNITS[unit])
    } else {
        format!("{rounded:.1}{}", BYTE_UNITS[unit])
    }
}

/// `"400×500px"`
pub fn format_dimensions(dims: Dimensions) -> String {
    format!("{}×{}px", dims.width, dims.height)
}

fn gcd(a: u32, b: u32) -> u32 {
    if b == 0 { a } else { gcd(b, a % b) }
}

/// Reduce `width:height` by their greatest common divisor.
pub fn ratio_label(width: u32, height: u32) -> String {
    let divisor = gcd(width, height).max(1);
    format!("{}:{}", width / divisor, height / divisor)
}

/// Filename offered for a fixed photo, e.g. `jobkorea_photo_fixed.jpg`.
pub fn output_filename(platform_id: &str, format: ImageFormat) -> String {
    format!("{}_photo_fixed.{}", platform_id, format.extension())
}
