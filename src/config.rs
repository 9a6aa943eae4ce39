//! Configuration module.
//!
//! Handles loading, validating, and merging `squarify.toml`. User files are
//! sparse: they are merged key-by-key over the stock defaults, so a file only
//! needs the values it changes. Command-line flags override the merged result.
//!
//! ## Config File Location
//!
//! `squarify frame` looks for `squarify.toml` in the current directory, or
//! reads the file given with `--config`.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [border]
//! value = 5.0               # Pixels (fixed) or percent of longest side (proportional)
//! size_mode = "proportional" # "fixed" | "proportional"
//! color_mode = "color"      # "color" | "blur"
//! color = "#ffffff"         # Used when color_mode = "color"
//!
//! [batch]
//! pacing_ms = 500           # Pause between images
//!
//! [output]
//! format = "png"            # "png" | "jpeg" | "webp"
//! quality = 90              # JPEG quality (1-100)
//! suffix = "-framed"        # Appended to the file stem
//!
//! [processing]
//! max_processes = 4         # Max parallel decoders (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::framing::{BorderColorMode, BorderSizeMode, Color, FrameConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Name of the config file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "squarify.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `squarify.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SquarifyConfig {
    /// Border thickness and fill.
    pub border: BorderConfig,
    /// Batch pacing.
    pub batch: BatchConfig,
    /// Encoding of framed images.
    pub output: OutputConfig,
    /// Parallel decoding settings.
    pub processing: ProcessingConfig,
}

impl SquarifyConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.border.value.is_finite() || self.border.value < 0.0 {
            return Err(ConfigError::Validation(
                "border.value must be a non-negative number".into(),
            ));
        }
        if self.output.quality == 0 || self.output.quality > 100 {
            return Err(ConfigError::Validation(
                "output.quality must be 1-100".into(),
            ));
        }
        if self.output.suffix.contains(['/', '\\']) {
            return Err(ConfigError::Validation(
                "output.suffix must not contain path separators".into(),
            ));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// The framing parameters shared by every image of a batch.
    pub fn frame_config(&self) -> FrameConfig {
        FrameConfig {
            border_value: self.border.value,
            size_mode: self.border.size_mode,
            color_mode: self.border.color_mode,
            color: self.border.color,
        }
    }

    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.batch.pacing_ms)
    }
}

/// Border settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BorderConfig {
    pub value: f64,
    pub size_mode: BorderSizeMode,
    pub color_mode: BorderColorMode,
    pub color: Color,
}

impl Default for BorderConfig {
    fn default() -> Self {
        let frame = FrameConfig::default();
        Self {
            value: frame.border_value,
            size_mode: frame.size_mode,
            color_mode: frame.color_mode,
            color: frame.color,
        }
    }
}

/// Batch settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchConfig {
    /// Milliseconds to wait between images.
    pub pacing_ms: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { pacing_ms: 500 }
    }
}

/// Encoding format for framed images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    Jpeg,
    /// Lossless WebP.
    Webp,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Webp => "webp",
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub format: OutputFormat,
    /// JPEG quality, 1-100. Ignored by lossless formats.
    pub quality: u8,
    /// Appended to the source file stem.
    pub suffix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Png,
            quality: 90,
            suffix: "-framed".to_string(),
        }
    }
}

/// Parallel decoding settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel decoders.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SquarifyConfig::default()).expect("default config must serialize")
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

/// Read a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<SquarifyConfig, ConfigError> {
    let base = stock_defaults_value();
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SquarifyConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path`, falling back to stock defaults when it is missing.
pub fn load_config(path: &Path) -> Result<SquarifyConfig, ConfigError> {
    let overlay = load_raw_config(path)?;
    if overlay.is_some() {
        tracing::debug!(path = %path.display(), "loaded config file");
    }
    resolve_config(overlay)
}

/// Returns a fully-commented stock `squarify.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Squarify Configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Command-line flags override anything set here.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Border
# ---------------------------------------------------------------------------
[border]
# Border thickness. Pixels when size_mode = "fixed", percent of the photo's
# longest side when size_mode = "proportional".
value = 5.0

# "fixed" or "proportional".
size_mode = "proportional"

# What fills the border: "color" for a solid color, "blur" for a blurred,
# enlarged copy of the photo.
color_mode = "color"

# Border color as #rgb, #rrggbb or #rrggbbaa. Only used with color_mode = "color".
color = "#ffffff"

# ---------------------------------------------------------------------------
# Batch
# ---------------------------------------------------------------------------
[batch]
# Pause between images in milliseconds. Keeps long batches of large photos
# from saturating the machine. 0 disables pacing.
pacing_ms = 500

# ---------------------------------------------------------------------------
# Output
# ---------------------------------------------------------------------------
[output]
# "png", "jpeg" or "webp" (lossless). JPEG drops transparency.
format = "png"

# JPEG encoding quality (1 = worst, 100 = best).
quality = 90

# Appended to each source file stem: photo.jpg -> photo-framed.png
suffix = "-framed"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel image decoders.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = SquarifyConfig::default();
        assert_eq!(config.border.value, 5.0);
        assert_eq!(config.border.size_mode, BorderSizeMode::Proportional);
        assert_eq!(config.border.color_mode, BorderColorMode::SolidColor);
        assert_eq!(config.border.color, Color::WHITE);
        assert_eq!(config.batch.pacing_ms, 500);
        assert_eq!(config.output.format, OutputFormat::Png);
        assert_eq!(config.output.quality, 90);
        assert_eq!(config.output.suffix, "-framed");
        assert_eq!(config.processing.max_processes, None);
    }

    #[test]
    fn parse_partial_config() {
        let toml = r##"
[border]
color = "#000"
"##;
        let config: SquarifyConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.border.color, Color::BLACK);
        // Default values preserved
        assert_eq!(config.border.value, 5.0);
        assert_eq!(config.batch.pacing_ms, 500);
    }

    #[test]
    fn parse_blur_fixed_config() {
        let toml = r##"
[border]
value = 40
size_mode = "fixed"
color_mode = "blur"
"##;
        let config: SquarifyConfig = toml::from_str(toml).unwrap();
        let frame = config.frame_config();
        assert_eq!(frame.border_value, 40.0);
        assert_eq!(frame.size_mode, BorderSizeMode::Fixed);
        assert_eq!(frame.color_mode, BorderColorMode::BlurredPhoto);
    }

    #[test]
    fn pacing_converts_to_duration() {
        let mut config = SquarifyConfig::default();
        config.batch.pacing_ms = 250;
        assert_eq!(config.pacing(), Duration::from_millis(250));
    }

    #[test]
    fn output_format_extensions() {
        assert_eq!(OutputFormat::Png.extension(), "png");
        assert_eq!(OutputFormat::Jpeg.extension(), "jpg");
        assert_eq!(OutputFormat::Webp.extension(), "webp");
    }

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(config, SquarifyConfig::default());
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE_NAME);
        fs::write(
            &path,
            r##"
[border]
value = 12.5
color = "#102030"

[output]
format = "jpeg"
quality = 80
"##,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.border.value, 12.5);
        assert_eq!(config.border.color, Color([0x10, 0x20, 0x30, 255]));
        assert_eq!(config.output.format, OutputFormat::Jpeg);
        assert_eq!(config.output.quality, 80);
        // Unspecified values should be defaults
        assert_eq!(config.output.suffix, "-framed");
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "this is not valid toml [[[").unwrap();

        let result = load_config(&path);
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn load_config_invalid_color_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "[border]\ncolor = \"red\"\n").unwrap();

        assert!(matches!(load_config(&path), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn unknown_key_rejected() {
        let toml = "[border]\nwidth = 3\n";
        let result: Result<SquarifyConfig, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn unknown_section_rejected() {
        let toml = "[frame]\nvalue = 3\n";
        let result: Result<SquarifyConfig, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    // =========================================================================
    // Validation
    // =========================================================================

    #[test]
    fn validate_default_config_passes() {
        assert!(SquarifyConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_negative_border() {
        let mut config = SquarifyConfig::default();
        config.border.value = -1.0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_quality_bounds() {
        let mut config = SquarifyConfig::default();
        config.output.quality = 0;
        assert!(config.validate().is_err());
        config.output.quality = 101;
        assert!(config.validate().is_err());
        config.output.quality = 100;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_suffix_without_separators() {
        let mut config = SquarifyConfig::default();
        config.output.suffix = "/../x".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_zero_processes() {
        let mut config = SquarifyConfig::default();
        config.processing.max_processes = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn resolve_config_rejects_invalid_values() {
        let overlay: toml::Value = toml::from_str("[border]\nvalue = -4.0\n").unwrap();
        assert!(matches!(
            resolve_config(Some(overlay)),
            Err(ConfigError::Validation(_))
        ));
    }

    // =========================================================================
    // merge_toml
    // =========================================================================

    #[test]
    fn merge_toml_scalar_override() {
        let base: toml::Value = toml::from_str("a = 1\nb = 2").unwrap();
        let overlay: toml::Value = toml::from_str("b = 3").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"].as_integer(), Some(1));
        assert_eq!(merged["b"].as_integer(), Some(3));
    }

    #[test]
    fn merge_toml_nested_tables() {
        let base = stock_defaults_value();
        let overlay: toml::Value = toml::from_str("[border]\ncolor_mode = \"blur\"").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["border"]["color_mode"].as_str(), Some("blur"));
        assert_eq!(merged["border"]["color"].as_str(), Some("#ffffff"));
        assert_eq!(merged["batch"]["pacing_ms"].as_integer(), Some(500));
    }

    // =========================================================================
    // Stock config
    // =========================================================================

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let config: SquarifyConfig = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(config, SquarifyConfig::default());
    }

    #[test]
    fn stock_defaults_value_has_all_sections() {
        let value = stock_defaults_value();
        for section in ["border", "batch", "output", "processing"] {
            assert!(value.get(section).is_some(), "missing [{section}]");
        }
    }

    #[test]
    fn effective_threads_user_constrains_down() {
        let config = ProcessingConfig {
            max_processes: Some(1),
        };
        assert_eq!(effective_threads(&config), 1);
    }

    #[test]
    fn effective_threads_auto_uses_all_cores() {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(effective_threads(&ProcessingConfig::default()), cores);
    }
}
