//! Fixer configuration.
//!
//! Every tunable threshold of the pipeline lives in [`FixerConfig`] and is
//! passed explicitly into the analyzer, planner, and compressor. Nothing
//! reads a global.
//!
//! ## Config File Location
//!
//! `photofit` reads `config.toml` from the directory given by `--config`
//! (default: the current directory). The file is optional; stock defaults
//! apply to every key it does not mention.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [upload]
//! max_size_mb = 10          # Uploads above this are rejected before decoding
//!
//! [analysis]
//! ratio_tolerance = 0.1     # Relative aspect-ratio difference that still passes
//!
//! [crop]
//! auto_bias = 0.2           # "auto" anchor: fraction of excess height kept above
//!
//! [compression]
//! min_quality = 0.1         # Lossy quality search bounds (0.0-1.0)
//! max_quality = 0.95
//! max_iterations = 10       # Binary search step cap
//! quality_epsilon = 0.01    # Stop when the quality interval is narrower
//! close_enough = 0.9        # Stop once output reaches this share of the budget
//! scale_start = 0.95        # First scale factor when quality alone cannot fit
//! scale_step = 0.9          # Multiplier applied per scale retry
//! scale_attempts = 5
//! min_dimension = 100       # Never scale below this many pixels per side
//! lossy_threshold_kb = 300  # Budgets at or below this prefer JPEG
//!
//! [platforms.my-visa]       # Add a destination (or override a preset by id)
//! width = 413
//! height = 531
//! ratio = "35:45"
//! tolerance = 10
//! max_size_kb = 300
//! formats = ["jpg"]
//! preferred_format = "jpg"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::platforms::TargetSpec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Unknown platform: {0}")]
    UnknownPlatform(String),
}

/// Top-level configuration loaded from `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FixerConfig {
    pub upload: UploadConfig,
    pub analysis: AnalysisConfig,
    pub crop: CropConfig,
    pub compression: CompressionConfig,
    /// Extra or overriding destinations keyed by platform id.
    pub platforms: BTreeMap<String, TargetSpec>,
}

impl FixerConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.upload.max_size_mb == 0 {
            return Err(ConfigError::Validation(
                "upload.max_size_mb must be positive".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.analysis.ratio_tolerance) {
            return Err(ConfigError::Validation(
                "analysis.ratio_tolerance must be 0.0-1.0".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.crop.auto_bias) {
            return Err(ConfigError::Validation(
                "crop.auto_bias must be 0.0-1.0".into(),
            ));
        }
        self.compression.validate()?;
        for (id, spec) in &self.platforms {
            let mut spec = spec.clone();
            spec.id = id.clone();
            spec.validate()?;
        }
        Ok(())
    }
}

/// Upload gate applied before the decoder ever sees the bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UploadConfig {
    pub max_size_mb: u32,
}

impl UploadConfig {
    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_mb as u64 * 1024 * 1024
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self { max_size_mb: 10 }
    }
}

/// Analyzer thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Relative difference `|current - target| / target` that still passes.
    pub ratio_tolerance: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            ratio_tolerance: 0.10,
        }
    }
}

/// Smart-crop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CropConfig {
    /// Share of the excess height placed above the crop for the `auto`
    /// anchor. A fixed framing heuristic, not a detection result.
    pub auto_bias: f64,
}

impl Default for CropConfig {
    fn default() -> Self {
        Self { auto_bias: 0.2 }
    }
}

/// Size-targeting compressor bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompressionConfig {
    pub min_quality: f32,
    pub max_quality: f32,
    pub max_iterations: u32,
    pub quality_epsilon: f32,
    /// A result at or above `close_enough × budget` (and within budget) ends
    /// the search early.
    pub close_enough: f64,
    pub scale_start: f64,
    pub scale_step: f64,
    pub scale_attempts: u32,
    pub min_dimension: u32,
    pub lossy_threshold_kb: u32,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            min_quality: 0.1,
            max_quality: 0.95,
            max_iterations: 10,
            quality_epsilon: 0.01,
            close_enough: 0.9,
            scale_start: 0.95,
            scale_step: 0.9,
            scale_attempts: 5,
            min_dimension: 100,
            lossy_threshold_kb: 300,
        }
    }
}

impl CompressionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0 < self.min_quality && self.min_quality <= self.max_quality && self.max_quality <= 1.0)
        {
            return Err(ConfigError::Validation(
                "compression quality bounds must satisfy 0 < min_quality <= max_quality <= 1".into(),
            ));
        }
        if !(0.0 < self.scale_start && self.scale_start <= 1.0)
            || !(0.0 < self.scale_step && self.scale_step < 1.0)
        {
            return Err(ConfigError::Validation(
                "compression.scale_start must be in (0, 1] and scale_step in (0, 1)".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.close_enough) {
            return Err(ConfigError::Validation(
                "compression.close_enough must be 0.0-1.0".into(),
            ));
        }
        if self.min_dimension == 0 {
            return Err(ConfigError::Validation(
                "compression.min_dimension must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Upper bound on encoder calls for one compression: one lossless try,
    /// one at maximum quality, the search, one at minimum quality, and the
    /// scale retries.
    pub fn max_encoder_calls(&self) -> u32 {
        1 + 1 + self.max_iterations + 1 + self.scale_attempts
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(FixerConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the directory has no `config.toml`.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Load config from `config.toml` in the given directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(dir: &Path) -> Result<FixerConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match load_raw_config(dir)? {
        Some(overlay) => merge_toml(base, overlay),
        None => base,
    };
    let config: FixerConfig = merged.try_into()?;
    config.validate()?;
    log::debug!("loaded config from {}", dir.display());
    Ok(config)
}

/// Returns a fully-commented stock `config.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# photofit configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.

# ---------------------------------------------------------------------------
# Upload gate
# ---------------------------------------------------------------------------
[upload]
# Files larger than this are rejected before decoding.
max_size_mb = 10

# ---------------------------------------------------------------------------
# Analysis
# ---------------------------------------------------------------------------
[analysis]
# Relative aspect-ratio difference that still passes the ratio check.
ratio_tolerance = 0.1

# ---------------------------------------------------------------------------
# Smart crop
# ---------------------------------------------------------------------------
[crop]
# When a tall photo is cropped with the "auto" anchor, this share of the
# excess height is kept above the crop (0.0 = top, 0.5 = centered).
auto_bias = 0.2

# ---------------------------------------------------------------------------
# Compression
# ---------------------------------------------------------------------------
[compression]
# Lossy quality search bounds (0.0-1.0).
min_quality = 0.1
max_quality = 0.95

# Binary search step cap and stop conditions.
max_iterations = 10
quality_epsilon = 0.01
close_enough = 0.9

# When even minimum quality is over budget, shrink the picture instead.
scale_start = 0.95
scale_step = 0.9
scale_attempts = 5
min_dimension = 100

# Budgets at or below this many KB prefer JPEG output.
lossy_threshold_kb = 300

# ---------------------------------------------------------------------------
# Destinations
# ---------------------------------------------------------------------------
# Add a destination, or override a built-in one by using its id
# (drivers-license, id-card, jobkorea, saramin).
#
# [platforms.my-visa]
# display_name = "Visa application"
# width = 413
# height = 531
# ratio = "35:45"
# tolerance = 10
# max_size_kb = 300
# formats = ["jpg"]
# preferred_format = "jpg"
# is_estimate = false
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ImageFormat;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = FixerConfig::default();
        assert_eq!(config.upload.max_size_mb, 10);
        assert_eq!(config.analysis.ratio_tolerance, 0.10);
        assert_eq!(config.crop.auto_bias, 0.2);
        assert_eq!(config.compression.min_quality, 0.1);
        assert_eq!(config.compression.max_quality, 0.95);
        assert_eq!(config.compression.max_iterations, 10);
        assert_eq!(config.compression.scale_attempts, 5);
        assert_eq!(config.compression.lossy_threshold_kb, 300);
        assert!(config.platforms.is_empty());
    }

    #[test]
    fn upload_limit_in_bytes() {
        assert_eq!(UploadConfig::default().max_size_bytes(), 10 * 1024 * 1024);
    }

    #[test]
    fn encoder_call_bound() {
        assert_eq!(CompressionConfig::default().max_encoder_calls(), 18);
    }

    #[test]
    fn parse_partial_config() {
        let toml = r##"
[compression]
max_quality = 0.9
"##;
        let config: FixerConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.compression.max_quality, 0.9);
        // Defaults preserved
        assert_eq!(config.compression.min_quality, 0.1);
        assert_eq!(config.crop.auto_bias, 0.2);
    }

    #[test]
    fn unknown_keys_rejected() {
        let toml = r##"
[compression]
max_qualty = 0.9
"##;
        let result: Result<FixerConfig, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn merge_overlay_replaces_leaf_and_keeps_siblings() {
        let base: toml::Value = toml::from_str("[a]\nx = 1\ny = 2").unwrap();
        let overlay: toml::Value = toml::from_str("[a]\ny = 3").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"]["x"].as_integer(), Some(1));
        assert_eq!(merged["a"]["y"].as_integer(), Some(3));
    }

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.compression.max_iterations, 10);
    }

    #[test]
    fn load_config_reads_platforms() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            r##"
[crop]
auto_bias = 0.3

[platforms.visa]
width = 600
height = 600
max_size_kb = 240
formats = ["jpg"]
preferred_format = "jpg"
"##,
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.crop.auto_bias, 0.3);
        let visa = &config.platforms["visa"];
        assert_eq!(visa.width, 600);
        assert_eq!(visa.formats, vec![ImageFormat::Jpg]);
        assert_eq!(visa.ratio, None);
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("config.toml"), "this is not valid toml [[[").unwrap();
        let result = load_config(tmp.path());
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn load_config_rejects_inverted_quality_bounds() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            "[compression]\nmin_quality = 0.9\nmax_quality = 0.5\n",
        )
        .unwrap();
        let result = load_config(tmp.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn load_config_rejects_zero_min_dimension() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            "[compression]\nmin_dimension = 0\n",
        )
        .unwrap();
        let result = load_config(tmp.path());
        assert!(
            matches!(result, Err(ConfigError::Validation(msg)) if msg.contains("min_dimension"))
        );
    }

    #[test]
    fn load_config_rejects_invalid_platform() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("config.toml"),
            r##"
[platforms.broken]
width = 400
height = 500
max_size_kb = 100
formats = ["jpg"]
preferred_format = "png"
"##,
        )
        .unwrap();
        let result = load_config(tmp.path());
        assert!(matches!(result, Err(ConfigError::Validation(msg)) if msg.contains("broken")));
    }

    #[test]
    fn stock_config_parses_to_defaults() {
        let config: FixerConfig = toml::from_str(stock_config_toml()).unwrap();
        let defaults = FixerConfig::default();
        assert_eq!(config.upload.max_size_mb, defaults.upload.max_size_mb);
        assert_eq!(config.compression.max_quality, defaults.compression.max_quality);
        assert_eq!(config.crop.auto_bias, defaults.crop.auto_bias);
        config.validate().unwrap();
    }
}
