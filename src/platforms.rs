//! Destination photo requirements.
//!
//! A [`TargetSpec`] is static data describing what a submission platform
//! accepts. The pipeline only reads it. Built-in presets cover the common
//! Korean ID and résumé destinations; `[platforms.<id>]` tables in
//! `config.toml` add new destinations or override a preset wholesale.
//!
//! Pixel sizes of the presets are the physical photo size at 300 dpi:
//!
//! ```text
//! 3.5cm × 4.5cm  →  413 × 531 px   (passport standard: licence, ID card)
//! 3cm   × 4cm    →  354 × 472 px   (résumé standard)
//! ```

use crate::config::{ConfigError, FixerConfig};
use crate::types::{Dimensions, ImageFormat};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const CM_TO_PX_300DPI: f64 = 118.11;

fn px(cm: f64) -> u32 {
    (cm * CM_TO_PX_300DPI).round() as u32
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid ratio '{0}': expected W:H with positive integers")]
pub struct ParseRatioError(String);

/// An aspect ratio written `W:H`, e.g. `35:45`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ratio {
    pub width: u32,
    pub height: u32,
}

impl Ratio {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn value(self) -> f64 {
        self.width as f64 / self.height as f64
    }
}

impl FromStr for Ratio {
    type Err = ParseRatioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseRatioError(s.to_string());
        let (w, h) = s.split_once(':').ok_or_else(err)?;
        let width: u32 = w.trim().parse().map_err(|_| err())?;
        let height: u32 = h.trim().parse().map_err(|_| err())?;
        if width == 0 || height == 0 {
            return Err(err());
        }
        Ok(Self { width, height })
    }
}

impl TryFrom<String> for Ratio {
    type Error = ParseRatioError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Ratio> for String {
    fn from(ratio: Ratio) -> Self {
        ratio.to_string()
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.width, self.height)
    }
}

/// A destination's photo requirements.
///
/// `ratio` may be omitted in config, in which case it is derived from
/// `width`/`height`. `is_estimate` marks values that are a recommendation
/// rather than a published requirement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetSpec {
    /// Filled from the `[platforms.<id>]` key when loaded from config.
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    pub width: u32,
    pub height: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ratio: Option<Ratio>,
    /// Allowed shortfall in pixels for the width/height checks.
    #[serde(default)]
    pub tolerance: u32,
    pub max_size_kb: u32,
    /// Accepted output formats, most preferred first.
    pub formats: Vec<ImageFormat>,
    pub preferred_format: ImageFormat,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    #[serde(default)]
    pub is_estimate: bool,
}

impl TargetSpec {
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }

    /// The ratio to crop to: the declared one, or `width:height`.
    pub fn ratio(&self) -> Ratio {
        self.ratio
            .unwrap_or_else(|| Ratio::new(self.width, self.height))
    }

    pub fn target_ratio(&self) -> f64 {
        self.ratio().value()
    }

    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_kb as u64 * 1024
    }

    pub fn accepts(&self, format: ImageFormat) -> bool {
        self.formats.contains(&format)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let fail = |msg: &str| Err(ConfigError::Validation(format!("platform '{}': {msg}", self.id)));
        if self.width == 0 || self.height == 0 {
            return fail("width and height must be positive");
        }
        if self.max_size_kb == 0 {
            return fail("max_size_kb must be positive");
        }
        if self.formats.is_empty() {
            return fail("formats must not be empty");
        }
        if !self.accepts(self.preferred_format) {
            return fail("preferred_format must be one of formats");
        }
        Ok(())
    }
}

fn passport_standard(id: &str, display_name: &str, notes: &[&str]) -> TargetSpec {
    TargetSpec {
        id: id.to_string(),
        display_name: display_name.to_string(),
        width: px(3.5),
        height: px(4.5),
        ratio: Some(Ratio::new(35, 45)),
        tolerance: 10,
        max_size_kb: 500,
        formats: vec![ImageFormat::Jpg],
        preferred_format: ImageFormat::Jpg,
        notes: notes.iter().map(|n| n.to_string()).collect(),
        is_estimate: false,
    }
}

fn resume_standard(id: &str, display_name: &str) -> TargetSpec {
    TargetSpec {
        id: id.to_string(),
        display_name: display_name.to_string(),
        width: px(3.0),
        height: px(4.0),
        ratio: Some(Ratio::new(3, 4)),
        tolerance: 10,
        max_size_kb: 500,
        formats: vec![ImageFormat::Jpg, ImageFormat::Png],
        preferred_format: ImageFormat::Jpg,
        notes: vec![
            "General résumé photo size (3cm × 4cm)".to_string(),
            "Per-platform pixel and size limits may differ".to_string(),
            "Plain light background, neat attire".to_string(),
        ],
        is_estimate: true,
    }
}

/// Built-in destinations, in display order.
pub fn presets() -> Vec<TargetSpec> {
    vec![
        passport_standard(
            "drivers-license",
            "Driver's license",
            &[
                "Same as the passport photo standard (3.5cm × 4.5cm)",
                "Colour photo taken within 6 months",
                "White or light plain background",
            ],
        ),
        passport_standard(
            "id-card",
            "Resident ID card",
            &[
                "Same as the passport photo standard (3.5cm × 4.5cm)",
                "Colour photo taken within 6 months",
                "White background, hair must not cover eyebrows",
            ],
        ),
        resume_standard("jobkorea", "JobKorea"),
        resume_standard("saramin", "Saramin"),
    ]
}

/// Every known destination: presets (possibly overridden by config) followed
/// by destinations that only exist in config.
pub fn all(config: &FixerConfig) -> Vec<TargetSpec> {
    let mut specs: Vec<TargetSpec> = presets()
        .into_iter()
        .map(|p| config_spec(config, &p.id).unwrap_or(p))
        .collect();
    let preset_ids: Vec<String> = specs.iter().map(|s| s.id.clone()).collect();
    specs.extend(
        config
            .platforms
            .keys()
            .filter(|id| !preset_ids.contains(id))
            .filter_map(|id| config_spec(config, id)),
    );
    specs
}

/// Look a destination up by id, config first, then presets.
pub fn resolve(id: &str, config: &FixerConfig) -> Result<TargetSpec, ConfigError> {
    config_spec(config, id)
        .or_else(|| presets().into_iter().find(|p| p.id == id))
        .ok_or_else(|| ConfigError::UnknownPlatform(id.to_string()))
}

fn config_spec(config: &FixerConfig, id: &str) -> Option<TargetSpec> {
    config.platforms.get(id).map(|spec| {
        let mut spec = spec.clone();
        spec.id = id.to_string();
        if spec.display_name.is_empty() {
            spec.display_name = id.to_string();
        }
        spec
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_parses_colon_form() {
        assert_eq!("35:45".parse::<Ratio>().unwrap(), Ratio::new(35, 45));
        assert_eq!(" 4 : 5 ".parse::<Ratio>().unwrap(), Ratio::new(4, 5));
    }

    #[test]
    fn ratio_rejects_malformed_input() {
        assert!("4x5".parse::<Ratio>().is_err());
        assert!("4:".parse::<Ratio>().is_err());
        assert!("0:5".parse::<Ratio>().is_err());
        assert!("a:b".parse::<Ratio>().is_err());
    }

    #[test]
    fn ratio_display_round_trips() {
        assert_eq!(Ratio::new(3, 4).to_string(), "3:4");
    }

    #[test]
    fn presets_use_300dpi_pixel_sizes() {
        let licence = presets().into_iter().find(|p| p.id == "drivers-license").unwrap();
        assert_eq!((licence.width, licence.height), (413, 531));

        let jobkorea = presets().into_iter().find(|p| p.id == "jobkorea").unwrap();
        assert_eq!((jobkorea.width, jobkorea.height), (354, 472));
        assert!(jobkorea.is_estimate);
        assert_eq!(jobkorea.formats, vec![ImageFormat::Jpg, ImageFormat::Png]);
    }

    #[test]
    fn presets_are_valid() {
        for preset in presets() {
            preset.validate().unwrap();
        }
    }

    #[test]
    fn ratio_derived_when_absent() {
        let spec = TargetSpec {
            ratio: None,
            ..resume_standard("x", "X")
        };
        assert_eq!(spec.ratio(), Ratio::new(354, 472));
    }

    #[test]
    fn validate_rejects_preferred_format_not_accepted() {
        let spec = TargetSpec {
            preferred_format: ImageFormat::Png,
            ..passport_standard("x", "X", &[])
        };
        assert!(matches!(spec.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn resolve_finds_preset() {
        let spec = resolve("saramin", &FixerConfig::default()).unwrap();
        assert_eq!(spec.max_size_kb, 500);
    }

    #[test]
    fn resolve_unknown_is_error() {
        let result = resolve("nowhere", &FixerConfig::default());
        assert!(matches!(result, Err(ConfigError::UnknownPlatform(id)) if id == "nowhere"));
    }

    #[test]
    fn config_overrides_preset_and_adds_new() {
        let mut config = FixerConfig::default();
        config.platforms.insert(
            "jobkorea".to_string(),
            TargetSpec {
                width: 400,
                height: 500,
                ratio: Some(Ratio::new(4, 5)),
                ..resume_standard("", "")
            },
        );
        config.platforms.insert(
            "visa".to_string(),
            passport_standard("", "", &[]),
        );

        let jobkorea = resolve("jobkorea", &config).unwrap();
        assert_eq!((jobkorea.width, jobkorea.height), (400, 500));
        assert_eq!(jobkorea.id, "jobkorea");

        let visa = resolve("visa", &config).unwrap();
        assert_eq!(visa.id, "visa");
        assert_eq!(visa.display_name, "visa");

        let ids: Vec<String> = all(&config).into_iter().map(|s| s.id).collect();
        assert_eq!(
            ids,
            vec!["drivers-license", "id-card", "jobkorea", "saramin", "visa"]
        );
    }
}
