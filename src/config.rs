//! Configuration management for PingCamera
//!
//! Provides loading, saving and validation of the session preset and the
//! window preferences that persist across runs.

use crate::chrome::{WindowPreferences, WindowSetup};
use crate::errors::CameraError;
use crate::session::SessionPreset;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PingCameraConfig {
    pub session: SessionConfig,
    pub window: WindowConfig,
}

/// Capture session configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Quality preset applied when the session is configured
    pub preset: SessionPreset,
}

/// Preview window configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Window title (visible only while the title bar is shown)
    pub title: String,
    /// Keep the preview floating above other windows
    pub pinned_on_top: bool,
    /// Flip the preview horizontally
    pub mirrored: bool,
    /// Show the native title bar
    pub show_title_bar: bool,
    /// Minimum window width in logical pixels
    pub min_width: f64,
    /// Minimum window height in logical pixels
    pub min_height: f64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "PingCamera".to_string(),
            pinned_on_top: true,
            mirrored: false,
            show_title_bar: false,
            min_width: 80.0,
            min_height: 60.0,
        }
    }
}

impl WindowConfig {
    pub fn preferences(&self) -> WindowPreferences {
        WindowPreferences {
            pinned_on_top: self.pinned_on_top,
            mirrored: self.mirrored,
            show_title_bar: self.show_title_bar,
        }
    }

    pub fn setup(&self) -> WindowSetup {
        WindowSetup {
            title: self.title.clone(),
            min_width: self.min_width,
            min_height: self.min_height,
        }
    }

    /// Copy runtime preferences back so they survive a restart.
    pub fn store_preferences(&mut self, prefs: WindowPreferences) {
        self.pinned_on_top = prefs.pinned_on_top;
        self.mirrored = prefs.mirrored;
        self.show_title_bar = prefs.show_title_bar;
    }
}

impl PingCameraConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, CameraError> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| CameraError::ConfigError(format!("Failed to read config file: {}", e)))?;

        let config: PingCameraConfig = toml::from_str(&contents)
            .map_err(|e| CameraError::ConfigError(format!("Failed to parse config file: {}", e)))?;

        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), CameraError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    CameraError::ConfigError(format!("Failed to create config directory: {}", e))
                })?;
            }
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| CameraError::ConfigError(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| CameraError::ConfigError(format!("Failed to write config file: {}", e)))?;

        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Get default config file path
    pub fn default_path() -> PathBuf {
        PathBuf::from("pingcamera.toml")
    }

    /// Load from default location or fall back to defaults
    pub fn load_or_default() -> Self {
        Self::load_from_file(Self::default_path()).unwrap_or_else(|e| {
            log::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.window.title.trim().is_empty() {
            return Err("Window title must not be empty".to_string());
        }
        if !(self.window.min_width > 0.0 && self.window.min_height > 0.0) {
            return Err("Minimum window size must be positive".to_string());
        }
        if !self.window.min_width.is_finite() || !self.window.min_height.is_finite() {
            return Err("Minimum window size must be finite".to_string());
        }
        Ok(())
    }
}
