//! Raster transformer: executes a [`GeometryPlan`] on a pixel surface.
//!
//! Always allocates a new surface. Large reductions are done in halving
//! steps until within 2× of the target, then one final precise pass, so no
//! single resample shrinks by more than half.
//!
//! Resampling uses `fast_image_resize` (Lanczos3 convolution). If it fails
//! the step falls back to `image::imageops::resize` with the same filter.

use super::calculations::GeometryPlan;
use fast_image_resize as fr;
use image::RgbaImage;
use image::imageops::{self, FilterType};

/// Crop and resample `surface` according to `plan`.
///
/// The plan's crop must lie within the surface; violating that is a caller
/// bug, not a runtime condition.
pub fn apply_plan(surface: &RgbaImage, plan: &GeometryPlan) -> RgbaImage {
    let crop = plan.crop;
    debug_assert!(
        crop.fits_within(crate::types::Dimensions::new(surface.width(), surface.height())),
        "crop {crop:?} outside {}x{}",
        surface.width(),
        surface.height()
    );

    let mut current = imageops::crop_imm(surface, crop.x, crop.y, crop.width, crop.height).to_image();
    let (target_w, target_h) = (plan.width.max(1), plan.height.max(1));

    for (w, h) in halving_steps((current.width(), current.height()), (target_w, target_h)) {
        log::debug!("halving {}x{} -> {w}x{h}", current.width(), current.height());
        current = resample(&current, w, h);
    }

    if current.dimensions() != (target_w, target_h) {
        current = resample(&current, target_w, target_h);
    }
    current
}

/// Intermediate sizes for progressive downscaling.
///
/// While either side is more than twice its target, halve it (never below
/// the target). The final precise resize is not included.
pub fn halving_steps(from: (u32, u32), to: (u32, u32)) -> Vec<(u32, u32)> {
    let halve = |cur: u32, target: u32| -> u32 {
        if cur > target.saturating_mul(2) {
            ((cur as f64 / 2.0).round() as u32).max(target)
        } else {
            cur
        }
    };

    let mut steps = Vec::new();
    let (mut w, mut h) = from;
    while w > to.0.saturating_mul(2) || h > to.1.saturating_mul(2) {
        (w, h) = (halve(w, to.0), halve(h, to.1));
        steps.push((w, h));
    }
    steps
}

/// Resize to exactly `width × height` with Lanczos3.
pub fn resample(src: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    match resample_fast(src, width, height) {
        Ok(out) => out,
        Err(err) => {
            log::warn!("fast_image_resize failed, falling back to image::imageops::resize: {err}");
            imageops::resize(src, width, height, FilterType::Lanczos3)
        }
    }
}

fn resample_fast(src: &RgbaImage, width: u32, height: u32) -> Result<RgbaImage, String> {
    let src_image = fr::images::Image::from_vec_u8(
        src.width(),
        src.height(),
        src.as_raw().clone(),
        fr::PixelType::U8x4,
    )
    .map_err(|e| format!("source buffer: {e}"))?;

    let mut dst_image = fr::images::Image::new(width, height, fr::PixelType::U8x4);

    let mut resizer = fr::Resizer::new();
    let options = fr::ResizeOptions::new()
        .resize_alg(fr::ResizeAlg::Convolution(fr::FilterType::Lanczos3));

    resizer
        .resize(&src_image, &mut dst_image, Some(&options))
        .map_err(|e| format!("resize: {e}"))?;

    RgbaImage::from_raw(width, height, dst_image.into_vec())
        .ok_or_else(|| "output buffer has unexpected length".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::calculations::CropRect;
    use crate::test_helpers::{gradient_surface, quadrant_surface};

    fn plan(crop: CropRect, width: u32, height: u32) -> GeometryPlan {
        GeometryPlan {
            crop,
            width,
            height,
        }
    }

    #[test]
    fn output_has_plan_dimensions() {
        let src = gradient_surface(300, 200);
        let out = apply_plan(&src, &plan(CropRect::new(10, 20, 150, 100), 75, 50));
        assert_eq!(out.dimensions(), (75, 50));
    }

    #[test]
    fn input_is_not_mutated() {
        let src = gradient_surface(120, 90);
        let before = src.clone();
        let _ = apply_plan(&src, &plan(CropRect::new(0, 0, 60, 90), 30, 45));
        assert_eq!(src, before);
    }

    #[test]
    fn upscale_in_one_pass() {
        let src = gradient_surface(50, 40);
        let out = apply_plan(&src, &plan(CropRect::full(crate::types::Dimensions::new(50, 40)), 200, 160));
        assert_eq!(out.dimensions(), (200, 160));
    }

    #[test]
    fn crop_samples_the_requested_region() {
        // Bottom-right quadrant only
        let src = quadrant_surface(64, 64);
        let expected = src.get_pixel(48, 48).0;
        let out = apply_plan(&src, &plan(CropRect::new(32, 32, 32, 32), 16, 16));
        let center = out.get_pixel(8, 8).0;
        for ch in 0..3 {
            assert!(center[ch].abs_diff(expected[ch]) < 8, "{center:?} vs {expected:?}");
        }
    }

    #[test]
    fn halving_steps_for_large_reduction() {
        // 2333x3000 → 413x531
        let steps = halving_steps((2333, 3000), (413, 531));
        assert_eq!(steps, vec![(1167, 1500), (584, 750)]);
    }

    #[test]
    fn halving_steps_none_within_2x() {
        assert!(halving_steps((800, 1000), (400, 500)).is_empty());
        assert!(halving_steps((100, 100), (400, 500)).is_empty());
    }

    #[test]
    fn halving_never_goes_below_target() {
        let steps = halving_steps((1000, 130), (100, 100));
        assert_eq!(steps, vec![(500, 130), (250, 130), (125, 130)]);
        for (w, h) in steps {
            assert!(w >= 100 && h >= 100);
        }
    }

    #[test]
    fn each_step_at_most_halves() {
        let steps = halving_steps((4000, 3000), (41, 53));
        let mut prev = (4000u32, 3000u32);
        for step in &steps {
            assert!(step.0 * 2 + 1 >= prev.0);
            assert!(step.1 * 2 + 1 >= prev.1);
            prev = *step;
        }
        assert!(prev.0 <= 82 && prev.1 <= 106);
    }

    #[test]
    fn resample_exact_dimensions() {
        let src = gradient_surface(97, 31);
        assert_eq!(resample(&src, 13, 7).dimensions(), (13, 7));
    }
}
