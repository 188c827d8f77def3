//! Pipeline orchestrator.
//!
//! Sequences the stages for the three user-facing operations:
//!
//! ```text
//! load_and_analyze          bytes ─▶ decode ─▶ analyze
//! fix_image                 image ─▶ smart crop / resize ─▶ format ─▶ compress
//! fix_image_with_crop_area  image ─▶ manual crop ─────────▶ format ─▶ compress
//! ```
//!
//! Both fix paths share the format decision and compression tail, and both
//! return a [`FixResult`] whose change log lists only what was actually done.

use crate::analyze::{analyze, required_fixes};
use crate::config::FixerConfig;
use crate::imaging::{
    Anchor, CropRect, DecodeError, DecodedImage, EncodeError, Encoder, apply_plan, compress,
    decode, plan_crop_area, plan_smart_crop,
};
use crate::naming::{format_bytes, format_dimensions, output_filename};
use crate::platforms::TargetSpec;
use crate::types::{
    AnalysisResult, Dimensions, FixChange, FixKind, FixResult, ImageFormat, ImageSummary,
};
use image::RgbaImage;
use std::borrow::Cow;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error("crop rectangle {crop} has no area inside the {bounds} image")]
    InvalidCrop { crop: CropRect, bounds: Dimensions },
}

/// Encoded output of a fix and its report.
#[derive(Debug, Clone)]
pub struct FixOutcome {
    pub result: FixResult,
    pub bytes: Vec<u8>,
}

impl FixOutcome {
    /// Download name, e.g. `jobkorea_photo_fixed.jpg`.
    pub fn filename(&self, spec: &TargetSpec) -> String {
        output_filename(&spec.id, self.result.fixed.format)
    }
}

/// Decode uploaded bytes and check them against `spec`. No transformation.
pub fn load_and_analyze(
    bytes: &[u8],
    mime: &str,
    spec: &TargetSpec,
    config: &FixerConfig,
) -> Result<(DecodedImage, AnalysisResult), PipelineError> {
    let image = decode(bytes, mime)?;
    let analysis = analyze(&image, spec, &config.analysis);
    log::info!(
        "analyzed {}x{} {} against {}: score {}",
        image.width(),
        image.height(),
        image.format,
        spec.id,
        analysis.score
    );
    Ok((image, analysis))
}

/// Bring `image` into conformance with `spec`, guided by `analysis`.
///
/// Geometry is only touched when a ratio or dimension check failed; the
/// crop uses the `auto` anchor. Format and compression always run.
pub fn fix_image<E: Encoder + ?Sized>(
    encoder: &E,
    image: &DecodedImage,
    spec: &TargetSpec,
    analysis: &AnalysisResult,
    config: &FixerConfig,
) -> Result<FixOutcome, PipelineError> {
    let fixes = required_fixes(analysis);
    log::info!("fixing for {}: {:?}", spec.id, fixes);

    let source = image.dimensions();
    let mut changes = Vec::new();

    let surface: Cow<'_, RgbaImage> =
        if fixes.contains(&FixKind::Crop) || fixes.contains(&FixKind::Resize) {
            let anchor = Anchor::Auto {
                bias: config.crop.auto_bias,
            };
            let plan = plan_smart_crop(source, spec.dimensions(), spec.target_ratio(), anchor);
            let output = plan.output();
            if !plan.is_pure_resize(source) {
                changes.push(FixChange {
                    kind: FixKind::Crop,
                    before: format_dimensions(source),
                    after: format_dimensions(output),
                });
            } else if output != source {
                changes.push(FixChange {
                    kind: FixKind::Resize,
                    before: format_dimensions(source),
                    after: format_dimensions(output),
                });
            }
            Cow::Owned(apply_plan(image.surface(), &plan))
        } else {
            Cow::Borrowed(image.surface())
        };

    encode_result(encoder, image, spec, &surface, changes, config)
}

/// Like [`fix_image`], but crop to a caller-chosen rectangle in source
/// coordinates instead of the automatic planner. The rectangle is clamped
/// into the image; one with no area left is an error.
pub fn fix_image_with_crop_area<E: Encoder + ?Sized>(
    encoder: &E,
    image: &DecodedImage,
    spec: &TargetSpec,
    crop: CropRect,
    config: &FixerConfig,
) -> Result<FixOutcome, PipelineError> {
    let source = image.dimensions();
    let plan = plan_crop_area(source, crop, spec.dimensions()).ok_or(PipelineError::InvalidCrop {
        crop,
        bounds: source,
    })?;
    log::info!("manual crop {:?} for {}", plan.crop, spec.id);

    let changes = vec![FixChange {
        kind: FixKind::Crop,
        before: format_dimensions(source),
        after: format_dimensions(plan.output()),
    }];
    let surface = apply_plan(image.surface(), &plan);
    encode_result(encoder, image, spec, &surface, changes, config)
}

fn encode_result<E: Encoder + ?Sized>(
    encoder: &E,
    image: &DecodedImage,
    spec: &TargetSpec,
    surface: &RgbaImage,
    mut changes: Vec<FixChange>,
    config: &FixerConfig,
) -> Result<FixOutcome, PipelineError> {
    let transparency = image.format == ImageFormat::Png && has_transparency(image.surface());
    let mut format = determine_output_format(
        image.format,
        spec.max_size_kb,
        transparency,
        config.compression.lossy_threshold_kb,
    );
    if !spec.accepts(format) {
        format = spec.preferred_format;
    }

    let compressed = compress(
        encoder,
        surface,
        spec.max_size_kb,
        format,
        &config.compression,
    )?;

    let planned = Dimensions::new(surface.width(), surface.height());
    if compressed.dimensions != planned {
        changes.push(FixChange {
            kind: FixKind::Resize,
            before: format_dimensions(planned),
            after: format_dimensions(compressed.dimensions),
        });
    }
    if compressed.format != image.format {
        changes.push(FixChange {
            kind: FixKind::FormatConvert,
            before: image.format.to_string(),
            after: compressed.format.to_string(),
        });
    }
    let size_bytes = compressed.bytes.len() as u64;
    if size_bytes < image.size_bytes {
        changes.push(FixChange {
            kind: FixKind::Compress,
            before: format_bytes(image.size_bytes),
            after: format_bytes(size_bytes),
        });
    }
    if !compressed.within_budget {
        log::warn!(
            "{} output is {} over the {}KB budget",
            spec.id,
            format_bytes(size_bytes.saturating_sub(spec.max_size_bytes())),
            spec.max_size_kb
        );
    }

    let result = FixResult {
        original: image.summary(),
        fixed: ImageSummary {
            dimensions: compressed.dimensions,
            format: compressed.format,
            size_bytes,
            orientation: 1,
        },
        changes,
        within_budget: compressed.within_budget,
    };
    Ok(FixOutcome {
        result,
        bytes: compressed.bytes,
    })
}

/// Whether any pixel is not fully opaque.
pub fn has_transparency(surface: &RgbaImage) -> bool {
    surface.pixels().any(|p| p.0[3] < 255)
}

/// Pick the output format before compression.
///
/// Transparency keeps PNG; small budgets (`<= lossy_threshold_kb`) go JPEG;
/// otherwise the original format is kept.
pub fn determine_output_format(
    original: ImageFormat,
    max_size_kb: u32,
    has_transparency: bool,
    lossy_threshold_kb: u32,
) -> ImageFormat {
    if has_transparency {
        ImageFormat::Png
    } else if max_size_kb <= lossy_threshold_kb {
        ImageFormat::Jpg
    } else {
        original
    }
}
