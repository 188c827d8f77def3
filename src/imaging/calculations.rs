//! Geometry planner: pure functions from dimensions to a [`GeometryPlan`].
//!
//! All functions here are pure and testable without any I/O or images.
//!
//! A plan says which source rectangle to sample and what size to produce.
//! Two modes:
//!
//! - **Fit**: scale the whole source down into the target box, never up.
//! - **Smart crop**: cut the largest target-ratio rectangle out of the
//!   source, then resample it to exactly the target size. Wide sources are
//!   cropped centered; tall sources use an [`Anchor`] for the vertical cut.

use crate::types::Dimensions;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Absolute ratio difference (width/height) up to which smart crop leaves the
/// frame alone.
pub const CROP_RATIO_THRESHOLD: f64 = 0.01;

/// A rectangle in source pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn full(source: Dimensions) -> Self {
        Self::new(0, 0, source.width, source.height)
    }

    pub fn dimensions(self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }

    pub fn fits_within(self, source: Dimensions) -> bool {
        self.x as u64 + self.width as u64 <= source.width as u64
            && self.y as u64 + self.height as u64 <= source.height as u64
    }
}

impl fmt::Display for CropRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{} {}×{}", self.x, self.y, self.width, self.height)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid crop '{0}': expected X,Y,W,H")]
pub struct ParseCropError(String);

impl FromStr for CropRect {
    type Err = ParseCropError;

    /// Parse `X,Y,W,H`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseCropError(s.to_string());
        let parts: Vec<u32> = s
            .split(',')
            .map(|p| p.trim().parse::<u32>().map_err(|_| err()))
            .collect::<Result<_, _>>()?;
        match parts.as_slice() {
            [x, y, w, h] => Ok(Self::new(*x, *y, *w, *h)),
            _ => Err(err()),
        }
    }
}

/// What to sample from the source and what size to produce.
///
/// Invariant: `crop` lies within the source bounds. A crop equal to the
/// full source is a pure resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeometryPlan {
    pub crop: CropRect,
    pub width: u32,
    pub height: u32,
}

impl GeometryPlan {
    pub fn output(self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }

    pub fn is_pure_resize(self, source: Dimensions) -> bool {
        self.crop == CropRect::full(source)
    }
}

/// Vertical placement of the crop when the source is taller than the target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Anchor {
    Top,
    Center,
    Bottom,
    /// Keep `bias` of the excess height above the crop. Framing heuristic
    /// that favours the upper part of the picture; no detection involved.
    Auto { bias: f64 },
}

impl Anchor {
    pub fn name(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Center => "center",
            Self::Bottom => "bottom",
            Self::Auto { .. } => "auto",
        }
    }

    fn offset(self, excess: u32) -> u32 {
        let excess_f = excess as f64;
        let y = match self {
            Self::Top => 0.0,
            Self::Center => (excess_f / 2.0).round(),
            Self::Bottom => excess_f,
            Self::Auto { bias } => (excess_f * bias.clamp(0.0, 1.0)).round(),
        };
        (y as u32).min(excess)
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Scale the whole source into the target box, never upscaling.
///
/// # Examples
/// ```
/// # use photofit::imaging::{plan_fit, CropRect};
/// # use photofit::types::Dimensions;
/// // 800x600 into 400x500 → limited by width: 400x300
/// let plan = plan_fit(Dimensions::new(800, 600), Dimensions::new(400, 500));
/// assert_eq!((plan.width, plan.height), (400, 300));
/// assert_eq!(plan.crop, CropRect::new(0, 0, 800, 600));
/// ```
pub fn plan_fit(source: Dimensions, target: Dimensions) -> GeometryPlan {
    let scale = (target.width as f64 / source.width as f64)
        .min(target.height as f64 / source.height as f64)
        .min(1.0);
    GeometryPlan {
        crop: CropRect::full(source),
        width: ((source.width as f64 * scale).round() as u32).max(1),
        height: ((source.height as f64 * scale).round() as u32).max(1),
    }
}

/// Cut the largest `target_ratio` rectangle from the source and resample it
/// to exactly `target`.
///
/// Ratios within [`CROP_RATIO_THRESHOLD`] (absolute) of each other keep the
/// full frame. Output is always `target`, even when that upscales.
pub fn plan_smart_crop(
    source: Dimensions,
    target: Dimensions,
    target_ratio: f64,
    anchor: Anchor,
) -> GeometryPlan {
    let source_ratio = source.ratio();
    let output = |crop| GeometryPlan {
        crop,
        width: target.width,
        height: target.height,
    };

    if (source_ratio - target_ratio).abs() <= CROP_RATIO_THRESHOLD {
        return output(CropRect::full(source));
    }

    if source_ratio > target_ratio {
        // Wider: keep full height, center horizontally
        let width = ((source.height as f64 * target_ratio).round() as u32).clamp(1, source.width);
        let x = ((source.width - width) as f64 / 2.0).round() as u32;
        output(CropRect::new(x, 0, width, source.height))
    } else {
        // Taller: keep full width, anchor vertically
        let height = ((source.width as f64 / target_ratio).round() as u32).clamp(1, source.height);
        let y = anchor.offset(source.height - height);
        output(CropRect::new(0, y, source.width, height))
    }
}

/// Plans for every anchor, in the order offered for comparison.
pub fn plan_all_anchors(
    source: Dimensions,
    target: Dimensions,
    target_ratio: f64,
    auto_bias: f64,
) -> Vec<(Anchor, GeometryPlan)> {
    [
        Anchor::Top,
        Anchor::Auto { bias: auto_bias },
        Anchor::Bottom,
        Anchor::Center,
    ]
    .into_iter()
    .map(|anchor| (anchor, plan_smart_crop(source, target, target_ratio, anchor)))
    .collect()
}

/// Use a caller-supplied crop rectangle, clamped into the source.
///
/// Returns `None` when nothing of the rectangle remains inside the source.
pub fn plan_crop_area(source: Dimensions, crop: CropRect, target: Dimensions) -> Option<GeometryPlan> {
    let x = crop.x.min(source.width);
    let y = crop.y.min(source.height);
    let width = crop.width.min(source.width - x);
    let height = crop.height.min(source.height - y);
    if width == 0 || height == 0 {
        return None;
    }
    Some(GeometryPlan {
        crop: CropRect::new(x, y, width, height),
        width: target.width,
        height: target.height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const AUTO: Anchor = Anchor::Auto { bias: 0.2 };

    fn dims(w: u32, h: u32) -> Dimensions {
        Dimensions::new(w, h)
    }

    // =========================================================================
    // plan_fit tests
    // =========================================================================

    #[test]
    fn fit_scales_down_to_limiting_side() {
        let plan = plan_fit(dims(800, 600), dims(400, 500));
        assert_eq!(plan.output(), dims(400, 300));
        assert!(plan.is_pure_resize(dims(800, 600)));
    }

    #[test]
    fn fit_never_upscales() {
        let plan = plan_fit(dims(200, 100), dims(400, 500));
        assert_eq!(plan.output(), dims(200, 100));
    }

    #[test]
    fn fit_portrait_limited_by_height() {
        let plan = plan_fit(dims(1000, 2000), dims(400, 500));
        assert_eq!(plan.output(), dims(250, 500));
    }

    // =========================================================================
    // plan_smart_crop tests
    // =========================================================================

    #[test]
    fn smart_crop_wider_source_centers_horizontally() {
        // 4000x3000 → 35:45: crop width = round(3000 × 35/45) = 2333
        let plan = plan_smart_crop(dims(4000, 3000), dims(413, 531), 35.0 / 45.0, AUTO);
        assert_eq!(plan.crop, CropRect::new(834, 0, 2333, 3000));
        assert_eq!(plan.output(), dims(413, 531));
    }

    #[test]
    fn smart_crop_taller_source_anchors() {
        // 1000x2000 → 4:5: crop height 1250, excess 750
        let source = dims(1000, 2000);
        let target = dims(400, 500);
        let y = |anchor| plan_smart_crop(source, target, 0.8, anchor).crop.y;
        assert_eq!(y(Anchor::Top), 0);
        assert_eq!(y(Anchor::Center), 375);
        assert_eq!(y(Anchor::Bottom), 750);
        assert_eq!(y(AUTO), 150);

        let plan = plan_smart_crop(source, target, 0.8, AUTO);
        assert_eq!((plan.crop.width, plan.crop.height), (1000, 1250));
    }

    #[test]
    fn smart_crop_within_threshold_keeps_frame() {
        // 0.5% off the target ratio
        let plan = plan_smart_crop(dims(804, 1000), dims(400, 500), 0.8, AUTO);
        assert!(plan.is_pure_resize(dims(804, 1000)));
        assert_eq!(plan.output(), dims(400, 500));
    }

    #[test]
    fn smart_crop_threshold_is_absolute() {
        // 0.770 vs 35:45 (0.7778): 0.0078 apart, just over 1% relative
        let target_ratio = 35.0 / 45.0;
        let plan = plan_smart_crop(dims(770, 1000), dims(413, 531), target_ratio, AUTO);
        assert!(plan.is_pure_resize(dims(770, 1000)));

        // 0.02 apart crops
        let plan = plan_smart_crop(dims(780, 1000), dims(400, 500), 0.8, AUTO);
        assert!(!plan.is_pure_resize(dims(780, 1000)));
    }

    #[test]
    fn smart_crop_exact_ratio_is_pure_resize() {
        let plan = plan_smart_crop(dims(800, 1000), dims(400, 500), 0.8, AUTO);
        assert_eq!(plan.crop, CropRect::full(dims(800, 1000)));
    }

    #[test]
    fn smart_crop_output_may_upscale() {
        let plan = plan_smart_crop(dims(200, 200), dims(400, 500), 0.8, AUTO);
        assert_eq!(plan.output(), dims(400, 500));
        assert_eq!(plan.crop, CropRect::new(20, 0, 160, 200));
    }

    #[test]
    fn auto_bias_is_clamped() {
        let plan = plan_smart_crop(dims(1000, 2000), dims(400, 500), 0.8, Anchor::Auto { bias: 3.0 });
        assert_eq!(plan.crop.y, 750);
    }

    #[test]
    fn all_anchors_in_display_order() {
        let plans = plan_all_anchors(dims(1000, 2000), dims(400, 500), 0.8, 0.2);
        let names: Vec<&str> = plans.iter().map(|(a, _)| a.name()).collect();
        assert_eq!(names, vec!["top", "auto", "bottom", "center"]);
        assert_eq!(plans[1].1.crop.y, 150);
    }

    // =========================================================================
    // plan_crop_area tests
    // =========================================================================

    #[test]
    fn crop_area_inside_source_is_kept() {
        let plan = plan_crop_area(dims(400, 500), CropRect::new(10, 20, 300, 375), dims(400, 500))
            .unwrap();
        assert_eq!(plan.crop, CropRect::new(10, 20, 300, 375));
        assert_eq!(plan.output(), dims(400, 500));
    }

    #[test]
    fn crop_area_is_clamped() {
        let plan = plan_crop_area(dims(400, 500), CropRect::new(300, 400, 300, 375), dims(40, 50))
            .unwrap();
        assert_eq!(plan.crop, CropRect::new(300, 400, 100, 100));
    }

    #[test]
    fn crop_area_outside_source_is_none() {
        assert!(plan_crop_area(dims(400, 500), CropRect::new(400, 0, 10, 10), dims(40, 50)).is_none());
        assert!(plan_crop_area(dims(400, 500), CropRect::new(0, 0, 0, 10), dims(40, 50)).is_none());
    }

    #[test]
    fn crop_rect_parses() {
        assert_eq!("10,20,300,375".parse::<CropRect>().unwrap(), CropRect::new(10, 20, 300, 375));
        assert_eq!(" 1, 2, 3, 4 ".parse::<CropRect>().unwrap(), CropRect::new(1, 2, 3, 4));
        assert!("1,2,3".parse::<CropRect>().is_err());
        assert!("1,2,3,x".parse::<CropRect>().is_err());
        assert!("-1,2,3,4".parse::<CropRect>().is_err());
    }

    // =========================================================================
    // Smart-crop invariant
    // =========================================================================

    proptest! {
        #[test]
        fn smart_crop_stays_in_bounds_and_keeps_ratio(
            sw in 1u32..6000,
            sh in 1u32..6000,
            tw in 1u32..2000,
            th in 1u32..2000,
            bias in 0.0f64..=1.0,
        ) {
            let source = dims(sw, sh);
            let target = dims(tw, th);
            let ratio = target.ratio();
            for anchor in [Anchor::Top, Anchor::Center, Anchor::Bottom, Anchor::Auto { bias }] {
                let plan = plan_smart_crop(source, target, ratio, anchor);
                prop_assert!(plan.crop.fits_within(source));
                prop_assert!(plan.crop.width >= 1 && plan.crop.height >= 1);
                prop_assert_eq!(plan.output(), target);

                if !plan.is_pure_resize(source) {
                    // Ratio matches within one pixel of rounding
                    let c = plan.crop;
                    if c.width == sw {
                        let ideal = sw as f64 / ratio;
                        prop_assert!((c.height as f64 - ideal).abs() <= 1.0 || c.height == 1 || c.height == sh);
                    } else {
                        let ideal = sh as f64 * ratio;
                        prop_assert!((c.width as f64 - ideal).abs() <= 1.0 || c.width == 1 || c.width == sw);
                    }
                }
            }
        }
    }
}
