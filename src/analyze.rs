//! Spec analyzer: five pass/fail checks of an image against a [`TargetSpec`].
//!
//! | Check | Passes iff |
//! |---|---|
//! | size | `ceil(size_bytes / 1024) <= max_size_kb` |
//! | width | `width >= target_width - tolerance` |
//! | height | `height >= target_height - tolerance` |
//! | ratio | `abs(current - target) / target <= ratio_tolerance` |
//! | format | format is one of the accepted formats |
//!
//! Width and height only gate feasibility: an image at least as large as the
//! target can always be brought down to it. Results are deterministic and
//! always contain the five issues in this order.

use crate::config::AnalysisConfig;
use crate::imaging::DecodedImage;
use crate::naming::{format_bytes, ratio_label};
use crate::platforms::TargetSpec;
use crate::types::{AnalysisIssue, AnalysisResult, FixKind, ImageSummary, IssueKind};

/// Absorbs float error at the inclusive ratio boundary.
const RATIO_EPSILON: f64 = 1e-9;

/// Analyze a decoded image.
pub fn analyze(image: &DecodedImage, spec: &TargetSpec, config: &AnalysisConfig) -> AnalysisResult {
    analyze_summary(&image.summary(), spec, config)
}

/// Analyze image attributes without pixels.
pub fn analyze_summary(
    image: &ImageSummary,
    spec: &TargetSpec,
    config: &AnalysisConfig,
) -> AnalysisResult {
    let dims = image.dimensions;

    let size_kb = image.size_bytes.div_ceil(1024);
    let size = AnalysisIssue {
        kind: IssueKind::Size,
        current: format_bytes(image.size_bytes),
        required: format!("≤ {}KB", spec.max_size_kb),
        passed: size_kb <= spec.max_size_kb as u64,
    };

    let width = AnalysisIssue {
        kind: IssueKind::Width,
        current: format!("{}px", dims.width),
        required: format!("≥ {}px", spec.width),
        passed: dims.width as i64 >= spec.width as i64 - spec.tolerance as i64,
    };

    let height = AnalysisIssue {
        kind: IssueKind::Height,
        current: format!("{}px", dims.height),
        required: format!("≥ {}px", spec.height),
        passed: dims.height as i64 >= spec.height as i64 - spec.tolerance as i64,
    };

    let target_ratio = spec.target_ratio();
    let ratio_diff = (dims.ratio() - target_ratio).abs() / target_ratio;
    let ratio = AnalysisIssue {
        kind: IssueKind::Ratio,
        current: ratio_label(dims.width, dims.height),
        required: spec.ratio().to_string(),
        passed: ratio_diff <= config.ratio_tolerance + RATIO_EPSILON,
    };

    let format = AnalysisIssue {
        kind: IssueKind::Format,
        current: image.format.to_string(),
        required: spec
            .formats
            .iter()
            .map(|f| f.to_string())
            .collect::<Vec<_>>()
            .join("/"),
        passed: spec.accepts(image.format),
    };

    let issues = vec![size, width, height, ratio, format];
    let passed_count = issues.iter().filter(|i| i.passed).count();
    let score = (100.0 * passed_count as f64 / issues.len() as f64).round() as u8;

    AnalysisResult {
        passed: passed_count == issues.len(),
        score,
        issues,
    }
}

/// Remediation categories for the failed issues, deduplicated, in issue order.
pub fn required_fixes(analysis: &AnalysisResult) -> Vec<FixKind> {
    let mut fixes = Vec::new();
    for issue in analysis.failed() {
        let fix = match issue.kind {
            IssueKind::Size => FixKind::Compress,
            IssueKind::Width | IssueKind::Height => FixKind::Resize,
            IssueKind::Ratio => FixKind::Crop,
            IssueKind::Format => FixKind::FormatConvert,
        };
        if !fixes.contains(&fix) {
            fixes.push(fix);
        }
    }
    fixes
}
