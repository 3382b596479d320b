//! Reader configuration.
//!
//! Everything works without a config file. To change the defaults, put a
//! `prompt-reader.toml` in the working directory or pass `--config <path>`:
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! not_found_text = "Prompt not found."   # Shown when an image has no annotation
//!
//! [save]
//! edit_suffix = "_edit"                  # photo.png -> photo_edit.png
//! fallback_name = "image.png"            # Used when the image has no name
//! ```
//!
//! Config files are sparse, and unknown keys are rejected to catch typos.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File looked up in the working directory when no `--config` is given.
pub const CONFIG_FILE: &str = "prompt-reader.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReaderConfig {
    /// Displayed in place of the prompt when nothing was found.
    pub not_found_text: String,
    /// Naming of re-encoded files.
    pub save: SaveConfig,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            not_found_text: "Prompt not found.".to_string(),
            save: SaveConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SaveConfig {
    /// Inserted between the original base name and its extension.
    pub edit_suffix: String,
    /// Name assumed for images loaded without one.
    pub fallback_name: String,
}

impl Default for SaveConfig {
    fn default() -> Self {
        Self {
            edit_suffix: "_edit".to_string(),
            fallback_name: "image.png".to_string(),
        }
    }
}

fn has_separator(s: &str) -> bool {
    s.contains('/') || s.contains('\\')
}

impl ReaderConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.save.edit_suffix.is_empty() {
            return Err(ConfigError::Validation(
                "save.edit_suffix must not be empty".into(),
            ));
        }
        if has_separator(&self.save.edit_suffix) {
            return Err(ConfigError::Validation(
                "save.edit_suffix must not contain path separators".into(),
            ));
        }
        if self.save.fallback_name.trim().is_empty() || has_separator(&self.save.fallback_name) {
            return Err(ConfigError::Validation(
                "save.fallback_name must be a plain, non-empty file name".into(),
            ));
        }
        Ok(())
    }
}

/// Load and validate a config file.
pub fn load_config(path: &Path) -> Result<ReaderConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: ReaderConfig = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Resolve the active config.
///
/// An explicit path must exist. Otherwise `prompt-reader.toml` in `dir` is
/// used if present, else the stock defaults.
pub fn discover_config(explicit: Option<&Path>, dir: &Path) -> Result<ReaderConfig, ConfigError> {
    if let Some(path) = explicit {
        return load_config(path);
    }
    let candidate = dir.join(CONFIG_FILE);
    if candidate.exists() {
        load_config(&candidate)
    } else {
        Ok(ReaderConfig::default())
    }
}

/// A fully-commented stock config with every key at its default.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# prompt-reader configuration
# ===========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Looked up as ./prompt-reader.toml, or pass --config <path>.
# Unknown keys will cause an error.

# Shown instead of the prompt when an image carries no annotation.
not_found_text = "Prompt not found."

# ---------------------------------------------------------------------------
# Saving edited images
# ---------------------------------------------------------------------------
[save]
# Inserted before the extension: photo.png -> photo_edit.png
edit_suffix = "_edit"

# Name assumed for images that arrive without one.
fallback_name = "image.png"
"##
}
