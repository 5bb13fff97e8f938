// SPDX-License-Identifier: GPL-3.0-only

use crate::constants::{
    CONFIG_DIR, CONFIG_FILE, DEFAULT_CAPTURE_HEIGHT, DEFAULT_CAPTURE_WIDTH,
    DEFAULT_MAX_DECODE_DIMENSION,
};
use crate::errors::{ScanError, ScanResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Decode tuning configuration
///
/// Loaded from `<config dir>/scanner/config.json` when present. Device
/// selection is deliberately not persisted here; the controller re-applies
/// its default-selection rule on every activation.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Capture resolution width requested from the device
    pub capture_width: u32,
    /// Capture resolution height requested from the device
    pub capture_height: u32,
    /// Frames with a larger dimension are downscaled before decoding
    pub max_decode_dimension: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capture_width: DEFAULT_CAPTURE_WIDTH,
            capture_height: DEFAULT_CAPTURE_HEIGHT,
            max_decode_dimension: DEFAULT_MAX_DECODE_DIMENSION,
        }
    }
}

impl Config {
    /// Path of the config file, if a user config directory exists
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Load the configuration, falling back to defaults
    ///
    /// A missing file is normal. An unreadable or malformed file is logged
    /// and replaced by defaults rather than surfaced to the caller.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::read_from(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to load config, using defaults");
                Self::default()
            }
        }
    }

    fn read_from(path: &Path) -> ScanResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw).map_err(|e| ScanError::Config(e.to_string()))
    }
}
