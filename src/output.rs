//! CLI output formatting.
//!
//! Every command prints through a pure `format_*` function that returns the
//! display lines, wrapped by a `print_*` function that writes them to stdout.
//! Tests assert on the lines directly.
//!
//! ## Analyze
//!
//! ```text
//! photo.jpg → JobKorea (jobkorea)
//!     ✗ File size       3.3MB      required ≤ 500KB
//!     ✓ Width           4000px     required ≥ 413px
//!     ✓ Height          3000px     required ≥ 531px
//!     ✗ Aspect ratio    4:3        required 7:9
//!     ✓ File format     JPG        required JPG/PNG
//! Score: 60% (2 issues)
//! ```
//!
//! ## Fix
//!
//! ```text
//! photo.jpg → out/jobkorea_photo_fixed.jpg
//!     Aspect ratio adjusted (crop): 4000×3000px → 413×531px
//!     File size optimized: 3.3MB → 48.2KB
//! ```
//!
//! ## Crop options
//!
//! ```text
//! 4000×3000 → 413×531 (7:9)
//!     top       1167,0 2333×3000
//!     auto      1167,0 2333×3000
//!     ...
//! ```

use crate::imaging::{Anchor, GeometryPlan};
use crate::naming::format_bytes;
use crate::platforms::TargetSpec;
use crate::types::{AnalysisResult, Dimensions, FixResult};

const INDENT: &str = "    ";

fn mark(passed: bool) -> char {
    if passed { '✓' } else { '✗' }
}

fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        format!("{count} {word}")
    } else {
        format!("{count} {word}s")
    }
}

fn platform_title(spec: &TargetSpec) -> String {
    if spec.display_name.is_empty() || spec.display_name == spec.id {
        spec.id.clone()
    } else {
        format!("{} ({})", spec.display_name, spec.id)
    }
}

// ============================================================================
// Analyze
// ============================================================================

/// Checklist of the five checks followed by the score line.
pub fn format_analysis(source: &str, spec: &TargetSpec, analysis: &AnalysisResult) -> Vec<String> {
    let mut lines = vec![format!("{source} \u{2192} {}", platform_title(spec))];
    for issue in &analysis.issues {
        lines.push(format!(
            "{INDENT}{} {:<15} {:<10} required {}",
            mark(issue.passed),
            issue.kind.label(),
            issue.current,
            issue.required
        ));
    }
    let failed = analysis.failed().count();
    if failed == 0 {
        lines.push(format!("Score: {}% (meets all requirements)", analysis.score));
    } else {
        lines.push(format!(
            "Score: {}% ({})",
            analysis.score,
            plural(failed, "issue")
        ));
    }
    lines
}

pub fn print_analysis(source: &str, spec: &TargetSpec, analysis: &AnalysisResult) {
    for line in format_analysis(source, spec, analysis) {
        println!("{}", line);
    }
}

// ============================================================================
// Fix
// ============================================================================

/// Change log of a fix, plus a notice when the byte budget was missed.
pub fn format_fix(source: &str, destination: &str, spec: &TargetSpec, result: &FixResult) -> Vec<String> {
    let mut lines = vec![format!("{source} \u{2192} {destination}")];
    if result.changes.is_empty() {
        lines.push(format!("{INDENT}No changes needed"));
    }
    for change in &result.changes {
        lines.push(format!(
            "{INDENT}{}: {} \u{2192} {}",
            change.kind.label(),
            change.before,
            change.after
        ));
    }
    if !result.within_budget {
        lines.push(format!(
            "{INDENT}Note: {} is still over the {}KB limit; this is the smallest version reachable",
            format_bytes(result.fixed.size_bytes),
            spec.max_size_kb
        ));
    }
    lines
}

pub fn print_fix(source: &str, destination: &str, spec: &TargetSpec, result: &FixResult) {
    for line in format_fix(source, destination, spec, result) {
        println!("{}", line);
    }
}

// ============================================================================
// Crop options
// ============================================================================

/// One line per anchor with the crop rectangle it would cut.
pub fn format_crop_options(source: Dimensions, spec: &TargetSpec, plans: &[(Anchor, GeometryPlan)]) -> Vec<String> {
    let mut lines = vec![format!(
        "{source} \u{2192} {} ({})",
        spec.dimensions(),
        spec.ratio()
    )];
    for (anchor, plan) in plans {
        let note = if plan.crop.dimensions() == source {
            "  (full frame)"
        } else {
            ""
        };
        lines.push(format!("{INDENT}{:<9} {}{note}", anchor.name(), plan.crop));
    }
    lines
}

pub fn print_crop_options(source: Dimensions, spec: &TargetSpec, plans: &[(Anchor, GeometryPlan)]) {
    for line in format_crop_options(source, spec, plans) {
        println!("{}", line);
    }
}

// ============================================================================
// Platforms
// ============================================================================

/// Known target specs, one block per platform.
pub fn format_platforms(specs: &[TargetSpec]) -> Vec<String> {
    let mut lines = Vec::new();
    for spec in specs {
        let estimate = if spec.is_estimate { "  (estimate)" } else { "" };
        lines.push(format!("{}{estimate}", platform_title(spec)));
        lines.push(format!(
            "{INDENT}{}px ({}), ≤ {}KB, {}",
            spec.dimensions(),
            spec.ratio(),
            spec.max_size_kb,
            spec.formats
                .iter()
                .map(|f| f.to_string())
                .collect::<Vec<_>>()
                .join("/")
        ));
        for note in &spec.notes {
            lines.push(format!("{INDENT}{note}"));
        }
    }
    lines
}

pub fn print_platforms(specs: &[TargetSpec]) {
    for line in format_platforms(specs) {
        println!("{}", line);
    }
}
