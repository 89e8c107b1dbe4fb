// SPDX-License-Identifier: GPL-3.0-only

//! Persisted session preferences
//!
//! Stored as JSON at `<config dir>/camera-session/config.json`. The initial
//! configuration snapshot of every session is derived from this file, and
//! `cancel()` resets the snapshot back to it.

use crate::backends::camera::{
    CameraPosition, FlashMode, HdrMode, OutputType, ResolutionPreset,
};
use crate::constants::{frame_rate, orientation};
use crate::errors::ConfigFileError;
use crate::pipelines::FilterType;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Current on-disk format version
pub const CONFIG_VERSION: u32 = 1;

const APP_DIR: &str = "camera-session";
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Format version; files with another version are ignored
    pub version: u32,
    /// Camera selected at setup
    pub camera_position: CameraPosition,
    /// Output attached at setup
    pub output_type: OutputType,
    pub flash_mode: FlashMode,
    /// Frame rate requested at setup (clamped to the device range)
    pub frame_rate: u32,
    pub resolution: ResolutionPreset,
    pub hdr_mode: HdrMode,
    /// Mirror the preview and captured output
    pub mirror_output: bool,
    pub grid_visible: bool,
    /// Filter chain, applied in order
    pub filters: Vec<FilterType>,
    /// Zoom requested at setup (clamped to the device range)
    pub zoom_factor: f64,
    /// Accelerometer sampling interval
    pub motion_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            camera_position: CameraPosition::Back,
            output_type: OutputType::Photo,
            flash_mode: FlashMode::Off,
            frame_rate: frame_rate::DEFAULT_FRAME_RATE,
            resolution: ResolutionPreset::default(),
            hdr_mode: HdrMode::default(),
            mirror_output: false,
            grid_visible: false,
            filters: Vec::new(),
            zoom_factor: 1.0,
            motion_interval_ms: orientation::DEFAULT_MOTION_INTERVAL_MS,
        }
    }
}

impl Config {
    /// Default location of the config file
    pub fn default_path() -> Result<PathBuf, ConfigFileError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
            .ok_or(ConfigFileError::NoConfigDir)
    }

    /// Load from the default location, falling back to defaults
    pub fn load() -> Self {
        match Self::default_path() {
            Ok(path) => Self::load_from(&path),
            Err(e) => {
                warn!(error = %e, "No config directory, using defaults");
                Self::default()
            }
        }
    }

    /// Load from `path`; a missing, unreadable or outdated file yields defaults
    pub fn load_from(path: &Path) -> Self {
        match Self::read(path) {
            Ok(config) if config.version == CONFIG_VERSION => {
                debug!(path = %path.display(), "Loaded config");
                config.normalized()
            }
            Ok(config) => {
                warn!(
                    found = config.version,
                    expected = CONFIG_VERSION,
                    "Config version mismatch, using defaults"
                );
                Self::default()
            }
            Err(ConfigFileError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No config file, using defaults");
                Self::default()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to load config, using defaults");
                Self::default()
            }
        }
    }

    /// Raise values below what any camera accepts; device maxima are applied at setup
    fn normalized(mut self) -> Self {
        if self.frame_rate < frame_rate::MIN_FRAME_RATE {
            warn!(
                frame_rate = self.frame_rate,
                "Frame rate below minimum, raising to {}",
                frame_rate::MIN_FRAME_RATE
            );
            self.frame_rate = frame_rate::MIN_FRAME_RATE;
        }
        if self.zoom_factor.is_nan() || self.zoom_factor < 1.0 {
            warn!(zoom = self.zoom_factor, "Zoom factor below 1.0, resetting");
            self.zoom_factor = 1.0;
        }
        self
    }

    fn read(path: &Path) -> Result<Self, ConfigFileError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Save to the default location
    pub fn save(&self) -> Result<(), ConfigFileError> {
        self.save_to(&Self::default_path()?)
    }

    /// Write pretty JSON to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        info!(path = %path.display(), "Config saved");
        Ok(())
    }

    pub fn motion_interval(&self) -> Duration {
        Duration::from_millis(self.motion_interval_ms.max(1))
    }
}
