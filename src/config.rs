//! Configuration loading and validation.
//!
//! Configuration is read once at startup from a single TOML file (default
//! `fitcache.toml`, override with `--config`). A missing file means stock
//! defaults. The file is sparse: it is merged on top of the stock defaults,
//! so it only needs the keys it changes.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [resize]
//! folder = ".resized"   # Cache folder created next to each source image
//! quality = 85          # JPEG quality (0-100)
//!
//! [backend]
//! prefer = "auto"       # auto | magick | native
//!
//! [processing]
//! max_processes = 4     # Max batch workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{BackendPreference, Quality};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Cache layout and output encoding.
    pub resize: ResizeConfig,
    /// Backend selection.
    pub backend: BackendConfig,
    /// Parallel processing settings for batch runs.
    pub processing: ProcessingConfig,
}

impl Config {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.resize.quality > 100 {
            return Err(ConfigError::Validation(
                "resize.quality must be 0-100".into(),
            ));
        }
        let folder = self.resize.folder.as_str();
        if folder.is_empty() {
            return Err(ConfigError::Validation(
                "resize.folder must not be empty".into(),
            ));
        }
        if folder == "." || folder == ".." || folder.contains(['/', '\\']) {
            return Err(ConfigError::Validation(format!(
                "resize.folder must be a single directory name, got {:?}",
                folder
            )));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Cache layout and output encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResizeConfig {
    /// Name of the cache folder created inside each source image's directory.
    pub folder: String,
    /// JPEG encoding quality (0 = worst, 100 = best).
    pub quality: u32,
}

impl ResizeConfig {
    pub fn quality(&self) -> Quality {
        Quality::new(self.quality)
    }
}

impl Default for ResizeConfig {
    fn default() -> Self {
        Self {
            folder: ".resized".to_string(),
            quality: 85,
        }
    }
}

/// Backend selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackendConfig {
    pub prefer: BackendPreference,
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel batch workers.
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
    config.max_processes.map_or(cores, |n| n.min(cores))
}

// =============================================================================
// Loading and merging
// =============================================================================

/// Stock defaults as a TOML table, the base layer for user overrides.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(Config::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// Tables merge key-by-key; any other overlay value replaces the base value.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    let (toml::Value::Table(mut merged), toml::Value::Table(overlay)) = (base, overlay.clone())
    else {
        return overlay;
    };
    for (key, value) in overlay {
        let next = match merged.remove(&key) {
            Some(existing) => merge_toml(existing, value),
            None => value,
        };
        merged.insert(key, next);
    }
    toml::Value::Table(merged)
}

/// Parse config text, merge it over the defaults, and validate.
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let overlay: toml::Value = toml::from_str(content)?;
    let config: Config = merge_toml(stock_defaults_value(), overlay).try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the config file at `path`.
///
/// A missing file yields validated stock defaults; an unreadable or invalid
/// one is an error.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Ok(Config::default());
    }
    parse_config(&fs::read_to_string(path)?)
}

/// Returns a fully-commented stock config file with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# fitcache configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.

# ---------------------------------------------------------------------------
# Resizing
# ---------------------------------------------------------------------------
[resize]
# Cache folder created inside each source image's directory.
# photos/dawn.png resized to 400 wide lands at photos/.resized/dawn-400x.jpg
folder = ".resized"

# JPEG encoding quality (0 = worst, 100 = best).
quality = 85

# ---------------------------------------------------------------------------
# Backend
# ---------------------------------------------------------------------------
[backend]
# auto   - ImageMagick when installed, otherwise the built-in decoder
# magick - require ImageMagick (`magick`, or `convert` + `identify`)
# native - always use the built-in pure-Rust decoder
prefer = "auto"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers for `fitcache batch`.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_match_documented_values() {
        let c = Config::default();
        assert_eq!(c.resize.folder, ".resized");
        assert_eq!(c.resize.quality, 85);
        assert_eq!(c.backend.prefer, BackendPreference::Auto);
        assert_eq!(c.processing.max_processes, None);
        c.validate().unwrap();
    }

    #[test]
    fn stock_config_parses_to_defaults() {
        let c = parse_config(stock_config_toml()).unwrap();
        assert_eq!(c, Config::default());
    }

    #[test]
    fn sparse_override_keeps_other_defaults() {
        let c = parse_config("[resize]\nquality = 60\n").unwrap();
        assert_eq!(c.resize.quality, 60);
        assert_eq!(c.resize.folder, ".resized");
    }

    #[test]
    fn empty_file_is_defaults() {
        assert_eq!(parse_config("").unwrap(), Config::default());
    }

    #[test]
    fn backend_preference_parses() {
        let c = parse_config("[backend]\nprefer = \"native\"\n").unwrap();
        assert_eq!(c.backend.prefer, BackendPreference::Native);
    }

    #[test]
    fn unknown_key_rejected() {
        let err = parse_config("[resize]\nqualty = 60\n").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn unknown_backend_rejected() {
        assert!(parse_config("[backend]\nprefer = \"gd\"\n").is_err());
    }

    #[test]
    fn quality_above_100_rejected() {
        let err = parse_config("[resize]\nquality = 101\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn quality_zero_accepted_and_clamped_for_encoding() {
        let c = parse_config("[resize]\nquality = 0\n").unwrap();
        assert_eq!(c.resize.quality().value(), 1);
    }

    #[test]
    fn folder_must_be_single_segment() {
        for bad in ["", ".", "..", "a/b", "a\\b"] {
            let c = Config {
                resize: ResizeConfig {
                    folder: bad.to_string(),
                    ..ResizeConfig::default()
                },
                ..Config::default()
            };
            assert!(c.validate().is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn zero_max_processes_rejected() {
        assert!(parse_config("[processing]\nmax_processes = 0\n").is_err());
    }

    #[test]
    fn effective_threads_caps_at_cores() {
        let cores = effective_threads(&ProcessingConfig::default());
        let capped = effective_threads(&ProcessingConfig {
            max_processes: Some(usize::MAX),
        });
        assert_eq!(capped, cores);
        assert_eq!(
            effective_threads(&ProcessingConfig {
                max_processes: Some(1)
            }),
            1
        );
    }

    #[test]
    fn merge_toml_overlay_wins_on_scalars() {
        let base: toml::Value = toml::from_str("a = 1\n[t]\nx = 1\ny = 2\n").unwrap();
        let overlay: toml::Value = toml::from_str("[t]\ny = 3\n").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"].as_integer(), Some(1));
        assert_eq!(merged["t"]["x"].as_integer(), Some(1));
        assert_eq!(merged["t"]["y"].as_integer(), Some(3));
    }

    #[test]
    fn load_missing_file_returns_defaults() {
        let tmp = TempDir::new().unwrap();
        let c = load_config(&tmp.path().join("nope.toml")).unwrap();
        assert_eq!(c, Config::default());
    }

    #[test]
    fn load_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("fitcache.toml");
        fs::write(&path, "[resize]\nfolder = \"thumbs\"\n").unwrap();
        assert_eq!(load_config(&path).unwrap().resize.folder, "thumbs");
    }
}
