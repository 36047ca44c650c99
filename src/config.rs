//! Converter configuration.
//!
//! Settings come from three layers, later ones winning:
//!
//! 1. stock defaults (this module)
//! 2. a TOML file: `--config <FILE>`, or `cbz-webp.toml` in the working
//!    directory when present
//! 3. command-line flags, applied by the binary
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [archive]
//! format = "cbz"              # cbz / zip, cbr / rar, cb7z / 7z
//! delete_originals = false    # batch: remove directories after conversion
//! on_image_error = "abort"    # "abort" or "skip"
//!
//! [images]
//! quality = 80                # WebP quality (1-100)
//! ```
//!
//! Config files are sparse and unknown keys are rejected to catch typos early.

use crate::types::FailurePolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "cbz-webp.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Converter configuration. Every field has a default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConverterConfig {
    /// Output container settings.
    pub archive: ArchiveConfig,
    /// Image re-encoding settings.
    pub images: ImagesConfig,
}

impl ConverterConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.images.quality) {
            return Err(ConfigError::Validation(
                "images.quality must be 1-100".into(),
            ));
        }
        let format = self.archive.format.trim();
        if format.is_empty() {
            return Err(ConfigError::Validation(
                "archive.format must not be empty".into(),
            ));
        }
        if format.contains(['/', '\\']) {
            return Err(ConfigError::Validation(
                "archive.format must not contain path separators".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArchiveConfig {
    /// Requested format label. Unknown labels produce a ZIP container but
    /// keep the label as the file extension.
    pub format: String,
    /// Remove source directories after a successful batch conversion.
    pub delete_originals: bool,
    /// What to do with images that fail to decode or encode.
    pub on_image_error: FailurePolicy,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            format: "cbz".to_string(),
            delete_originals: false,
            on_image_error: FailurePolicy::Abort,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// WebP encoding quality (1 = worst, 100 = best).
    pub quality: u32,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self { quality: 80 }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(ConverterConfig::default())?)
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
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<ConverterConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ConverterConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the effective config.
///
/// An explicit path must exist. Without one, [`DEFAULT_CONFIG_FILE`] in the
/// working directory is used if present, stock defaults otherwise.
pub fn load_config(explicit: Option<&Path>) -> Result<ConverterConfig, ConfigError> {
    let overlay = match explicit {
        Some(path) => match load_raw_config(path)? {
            Some(value) => Some(value),
            None => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source: std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        "config file not found",
                    ),
                });
            }
        },
        None => load_raw_config(Path::new(DEFAULT_CONFIG_FILE))?,
    };
    if overlay.is_some() {
        tracing::debug!("loaded config overlay");
    }
    resolve_config(stock_defaults_value()?, overlay)
}

/// Returns a fully-commented stock config file with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# cbz-webp Configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Picked up from ./cbz-webp.toml, or from the file passed with --config.
# Command-line flags override anything set here.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Output archive
# ---------------------------------------------------------------------------
[archive]
# Archive format: "cbz" (or "zip"), "cbr" (or "rar"), "cb7z" (or "7z").
# rar and 7z need the external `rar` / `7z` tools on PATH.
# Unknown names produce a ZIP archive with that name as extension.
format = "cbz"

# Batch mode only: delete each source directory once its archive is written.
delete_originals = false

# What to do when an image cannot be decoded or encoded:
#   "abort" - fail the whole archive (nothing usable is left behind)
#   "skip"  - leave the image out and keep going
on_image_error = "abort"

# ---------------------------------------------------------------------------
# Image re-encoding
# ---------------------------------------------------------------------------
[images]
# WebP encoding quality (1 = worst, 100 = best).
quality = 80
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = ConverterConfig::default();
        assert_eq!(config.archive.format, "cbz");
        assert!(!config.archive.delete_originals);
        assert_eq!(config.archive.on_image_error, FailurePolicy::Abort);
        assert_eq!(config.images.quality, 80);
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
[images]
quality = 60
"#;
        let config: ConverterConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.images.quality, 60);
        assert_eq!(config.archive.format, "cbz");
    }

    #[test]
    fn parse_failure_policy() {
        let toml = r#"
[archive]
on_image_error = "skip"
"#;
        let config: ConverterConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.archive.on_image_error, FailurePolicy::Skip);
    }

    #[test]
    fn unknown_key_rejected() {
        let toml_str = r#"
[images]
qualty = 90
"#;
        let err = toml::from_str::<ConverterConfig>(toml_str)
            .unwrap_err()
            .to_string();
        assert!(err.contains("unknown field"));
    }

    #[test]
    fn unknown_section_rejected() {
        let result: Result<ConverterConfig, _> = toml::from_str("[imagez]\nquality = 90\n");
        assert!(result.is_err());
    }

    #[test]
    fn unknown_failure_policy_rejected() {
        let result: Result<ConverterConfig, _> =
            toml::from_str("[archive]\non_image_error = \"ignore\"\n");
        assert!(result.is_err());
    }

    // =========================================================================
    // merge_toml tests
    // =========================================================================

    #[test]
    fn merge_toml_table_merge() {
        let base: toml::Value = toml::from_str(
            r#"
[archive]
format = "cbz"
delete_originals = false
"#,
        )
        .unwrap();
        let overlay: toml::Value = toml::from_str("[archive]\nformat = \"cbr\"\n").unwrap();
        let merged = merge_toml(base, overlay);
        let archive = merged.get("archive").unwrap();
        assert_eq!(archive.get("format").unwrap().as_str(), Some("cbr"));
        assert_eq!(archive.get("delete_originals").unwrap().as_bool(), Some(false));
    }

    #[test]
    fn merge_toml_scalar_replaces_table() {
        let base: toml::Value = toml::from_str("[a]\nb = 1\n").unwrap();
        let overlay: toml::Value = toml::from_str("a = 3\n").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged.get("a").unwrap().as_integer(), Some(3));
    }

    // =========================================================================
    // Loading tests
    // =========================================================================

    #[test]
    fn load_raw_config_returns_none_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let result = load_raw_config(&tmp.path().join("missing.toml")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn load_config_reads_explicit_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("settings.toml");
        fs::write(
            &path,
            r#"
[archive]
format = "cb7z"
delete_originals = true

[images]
quality = 55
"#,
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.archive.format, "cb7z");
        assert!(config.archive.delete_originals);
        assert_eq!(config.images.quality, 55);
        assert_eq!(config.archive.on_image_error, FailurePolicy::Abort);
    }

    #[test]
    fn load_config_missing_explicit_file_is_error() {
        let tmp = TempDir::new().unwrap();
        let result = load_config(Some(&tmp.path().join("nope.toml")));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bad.toml");
        fs::write(&path, "this is not valid toml [[[").unwrap();
        assert!(matches!(load_config(Some(&path)), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn load_config_validates_values() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("q.toml");
        fs::write(&path, "[images]\nquality = 200\n").unwrap();
        assert!(matches!(
            load_config(Some(&path)),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn resolve_config_with_no_overlay() {
        let config = resolve_config(stock_defaults_value().unwrap(), None).unwrap();
        assert_eq!(config, ConverterConfig::default());
    }

    // =========================================================================
    // Validation tests
    // =========================================================================

    #[test]
    fn validate_quality_bounds() {
        let mut config = ConverterConfig::default();
        config.images.quality = 1;
        assert!(config.validate().is_ok());
        config.images.quality = 100;
        assert!(config.validate().is_ok());

        config.images.quality = 0;
        assert!(config.validate().is_err());
        config.images.quality = 101;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("quality"));
    }

    #[test]
    fn validate_format_label() {
        let mut config = ConverterConfig::default();
        config.archive.format = "  ".into();
        assert!(config.validate().is_err());
        config.archive.format = "../cbz".into();
        assert!(config.validate().is_err());
        // Unknown but well-formed labels are accepted.
        config.archive.format = "book".into();
        assert!(config.validate().is_ok());
    }

    // =========================================================================
    // stock_config_toml tests
    // =========================================================================

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let config: ConverterConfig = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(config, ConverterConfig::default());
    }

    #[test]
    fn stock_defaults_value_has_all_sections() {
        let val = stock_defaults_value().unwrap();
        assert!(val.get("archive").is_some());
        assert!(val.get("images").is_some());
    }
}
