//! Parameter types for encoding.
//!
//! - [`Quality`]: lossy encoding quality as a fraction (0.0–1.0). Clamped on
//!   construction. The compressor searches over this value; encoders map it
//!   to their own integer scale with [`Quality::percent`].

/// Quality setting for lossy image encoding (0.0-1.0).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Quality(f32);

impl Quality {
    pub fn new(value: f32) -> Self {
        if value.is_nan() {
            return Self::default();
        }
        Self(value.clamp(0.0, 1.0))
    }

    pub fn value(self) -> f32 {
        self.0
    }

    /// Integer quality on the 1-100 scale used by JPEG encoders.
    pub fn percent(self) -> u8 {
        (self.0 * 100.0).round().clamp(1.0, 100.0) as u8
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(0.95)
    }
}
