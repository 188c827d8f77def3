//! Size-targeting compressor.
//!
//! Finds the highest-fidelity encoding of a surface that fits a byte budget:
//!
//! ```text
//! 1. PNG preferred?   encode lossless ── fits ──▶ done
//!                          │ over
//!                          ▼
//! 2. JPEG @ max_quality ── fits ──▶ done
//!                          │ over
//!                          ▼
//! 3. binary search quality in [min, max]
//!       fits   → remember, search higher
//!       over   → search lower
//!       stop when 90–100% of budget, interval < epsilon, or iterations spent
//!                          │ nothing fit
//!                          ▼
//! 4. JPEG @ min_quality ── fits ──▶ done
//!                          │ over
//!                          ▼
//! 5. shrink pixels (×0.95, ×0.9 each retry, ≥ min_dimension) @ min_quality
//! ```
//!
//! Never fails on budget: if nothing fits, the smallest candidate comes back
//! with `within_budget == false`. The number of encoder calls is bounded by
//! [`CompressionConfig::max_encoder_calls`].

use super::backend::{EncodeError, Encoder};
use super::params::Quality;
use super::transform::resample;
use crate::config::CompressionConfig;
use crate::types::{Dimensions, ImageFormat};
use image::RgbaImage;

/// Encoded output of [`compress`].
#[derive(Debug, Clone, PartialEq)]
pub struct Compressed {
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
    /// Lossy quality used; `None` for lossless output.
    pub quality: Option<Quality>,
    /// Dimensions of the encoded picture; smaller than the input surface only
    /// when the scale fallback was needed.
    pub dimensions: Dimensions,
    pub within_budget: bool,
}

struct Attempt<'a, E: ?Sized> {
    encoder: &'a E,
    budget: u64,
    calls: u32,
    smallest: Option<Compressed>,
}

impl<E: Encoder + ?Sized> Attempt<'_, E> {
    fn encode(
        &mut self,
        surface: &RgbaImage,
        format: ImageFormat,
        quality: Quality,
    ) -> Result<Compressed, EncodeError> {
        let bytes = self.encoder.encode(surface, format, quality)?;
        self.calls += 1;
        let within_budget = bytes.len() as u64 <= self.budget;
        log::debug!(
            "encode #{} {format} q={:.3} {}x{} -> {} bytes (budget {})",
            self.calls,
            quality.value(),
            surface.width(),
            surface.height(),
            bytes.len(),
            self.budget
        );
        let candidate = Compressed {
            bytes,
            format,
            quality: (!format.is_lossless()).then_some(quality),
            dimensions: Dimensions::new(surface.width(), surface.height()),
            within_budget,
        };
        if self
            .smallest
            .as_ref()
            .is_none_or(|s| candidate.bytes.len() < s.bytes.len())
        {
            self.smallest = Some(candidate.clone());
        }
        Ok(candidate)
    }
}

/// Encode `surface` to at most `target_kb × 1024` bytes, best effort.
pub fn compress<E: Encoder + ?Sized>(
    encoder: &E,
    surface: &RgbaImage,
    target_kb: u32,
    preferred: ImageFormat,
    config: &CompressionConfig,
) -> Result<Compressed, EncodeError> {
    let budget = target_kb as u64 * 1024;
    let mut attempt = Attempt {
        encoder,
        budget,
        calls: 0,
        smallest: None,
    };

    if preferred.is_lossless() {
        let lossless = attempt.encode(surface, preferred, Quality::default())?;
        if lossless.within_budget {
            return Ok(lossless);
        }
        log::debug!("lossless output over budget, switching to JPEG");
    }

    let at_max = attempt.encode(surface, ImageFormat::Jpg, Quality::new(config.max_quality))?;
    if at_max.within_budget {
        return Ok(at_max);
    }

    // Quality search
    let close_enough = (budget as f64 * config.close_enough) as u64;
    let (mut lo, mut hi) = (config.min_quality, config.max_quality);
    let mut best: Option<Compressed> = None;
    for _ in 0..config.max_iterations {
        if hi - lo < config.quality_epsilon {
            break;
        }
        let mid = (lo + hi) / 2.0;
        let candidate = attempt.encode(surface, ImageFormat::Jpg, Quality::new(mid))?;
        if candidate.within_budget {
            let len = candidate.bytes.len() as u64;
            best = Some(candidate);
            lo = mid;
            if len >= close_enough {
                break;
            }
        } else {
            hi = mid;
        }
    }
    if let Some(best) = best {
        return Ok(best);
    }

    let min_quality = Quality::new(config.min_quality);
    let at_min = attempt.encode(surface, ImageFormat::Jpg, min_quality)?;
    if at_min.within_budget {
        return Ok(at_min);
    }

    // Quality alone cannot reach the budget: shrink the picture
    let mut scale = config.scale_start;
    for _ in 0..config.scale_attempts {
        let width = (surface.width() as f64 * scale).round() as u32;
        let height = (surface.height() as f64 * scale).round() as u32;
        if width < config.min_dimension || height < config.min_dimension {
            break;
        }
        let scaled = resample(surface, width, height);
        let candidate = attempt.encode(&scaled, ImageFormat::Jpg, min_quality)?;
        if candidate.within_budget {
            log::info!("fit budget after scaling to {width}x{height}");
            return Ok(candidate);
        }
        scale *= config.scale_step;
    }

    log::warn!(
        "could not reach {target_kb}KB budget after {} encodes; returning best effort",
        attempt.calls
    );
    // At least one encode happened above
    Ok(attempt.smallest.unwrap_or(at_min))
}
