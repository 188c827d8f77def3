//! Shared types passed between the pipeline stages and rendered by the CLI.
//!
//! Everything here is plain data: no pixel buffers, no behavior beyond
//! small accessors. These are also the records serialized by `--json`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Raster formats the pipeline reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpg,
    Png,
}

impl ImageFormat {
    /// Infer the format from an upload's MIME type: `image/png` is PNG,
    /// anything else is treated as JPEG.
    pub fn from_mime(mime: &str) -> Self {
        if mime.eq_ignore_ascii_case("image/png") {
            Self::Png
        } else {
            Self::Jpg
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            Self::Jpg => "image/jpeg",
            Self::Png => "image/png",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpg => "jpg",
            Self::Png => "png",
        }
    }

    /// Whether the format encodes without loss (and ignores quality).
    pub fn is_lossless(self) -> bool {
        matches!(self, Self::Png)
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Jpg => "JPG",
            Self::Png => "PNG",
        })
    }
}

/// Pixel dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn ratio(self) -> f64 {
        self.width as f64 / self.height as f64
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}×{}", self.width, self.height)
    }
}

/// Which attribute an [`AnalysisIssue`] checks. Declaration order is the
/// order issues appear in every [`AnalysisResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueKind {
    Size,
    Width,
    Height,
    Ratio,
    Format,
}

impl IssueKind {
    pub const ALL: [IssueKind; 5] = [
        IssueKind::Size,
        IssueKind::Width,
        IssueKind::Height,
        IssueKind::Ratio,
        IssueKind::Format,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Size => "File size",
            Self::Width => "Width",
            Self::Height => "Height",
            Self::Ratio => "Aspect ratio",
            Self::Format => "File format",
        }
    }
}

/// One pass/fail check against a target spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisIssue {
    pub kind: IssueKind,
    /// Human-readable current value, e.g. `"3.3MB"` or `"4:3"`.
    pub current: String,
    /// Human-readable requirement, e.g. `"≤ 500KB"`.
    pub required: String,
    pub passed: bool,
}

/// Ordered checks (size, width, height, ratio, format) plus the summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub issues: Vec<AnalysisIssue>,
    /// AND of every issue.
    pub passed: bool,
    /// Percentage of passed issues, rounded.
    pub score: u8,
}

impl AnalysisResult {
    pub fn issue(&self, kind: IssueKind) -> Option<&AnalysisIssue> {
        self.issues.iter().find(|i| i.kind == kind)
    }

    pub fn failed(&self) -> impl Iterator<Item = &AnalysisIssue> {
        self.issues.iter().filter(|i| !i.passed)
    }
}

/// Remediation categories, derived from failed issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FixKind {
    Compress,
    Resize,
    Crop,
    FormatConvert,
}

impl FixKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Compress => "File size optimized",
            Self::Resize => "Resolution adjusted",
            Self::Crop => "Aspect ratio adjusted (crop)",
            Self::FormatConvert => "File format converted",
        }
    }
}

/// A record of one transformation actually applied. Display only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixChange {
    pub kind: FixKind,
    pub before: String,
    pub after: String,
}

/// Attributes of an image before or after a fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSummary {
    pub dimensions: Dimensions,
    pub format: ImageFormat,
    pub size_bytes: u64,
    pub orientation: u8,
}

/// Before/after summaries and the change log of one fix operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixResult {
    pub original: ImageSummary,
    pub fixed: ImageSummary,
    pub changes: Vec<FixChange>,
    /// False when even the compressor's fallbacks could not reach the byte
    /// budget. The output is still usable; callers only inform the user.
    pub within_budget: bool,
}

impl FixResult {
    pub fn has_change(&self, kind: FixKind) -> bool {
        self.changes.iter().any(|c| c.kind == kind)
    }
}
