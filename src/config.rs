//! Configuration file support for the scene annotator.
//!
//! Settings live in one JSON file under the user's config directory. A
//! missing file means defaults; a file written by a newer version is
//! rejected rather than half-read.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::data::OverlapPolicy;
use crate::format::SceneLayout;
use crate::migration::{DEFAULT_DISTANCE_UNIT, MigrationOptions};
use crate::model::camera::default_window_size;

/// Log level setting for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Show errors and warnings
    Warn,
    /// Show errors, warnings, and info messages
    #[default]
    Info,
    /// Show debug-level logging
    Debug,
    /// Show all log messages including trace
    Trace,
}

impl LogLevel {
    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Version of the configuration file format
    pub version: u32,

    /// Application name (for identification)
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// User preferences
    #[serde(default)]
    pub preferences: UserPreferences,

    /// Where meshes and masks are found inside a scene folder
    #[serde(default)]
    pub scene: SceneLayout,

    /// Mask builder settings
    #[serde(default)]
    pub mask: MaskConfig,

    /// Schema migration settings
    #[serde(default)]
    pub migration: MigrationConfig,
}

fn default_app_name() -> String {
    "scene-annotator".to_string()
}

/// User preferences section of the config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
    /// Log verbosity level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Viewer window `[width, height]` when no camera pose gives one
    #[serde(default = "default_window")]
    pub default_window: [u32; 2],
}

fn default_window() -> [u32; 2] {
    let (width, height) = default_window_size();
    [width, height]
}

impl UserPreferences {
    pub fn window_size(&self) -> (u32, u32) {
        (self.default_window[0], self.default_window[1])
    }
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            default_window: default_window(),
        }
    }
}

/// Mask builder section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MaskConfig {
    /// What to do when two groups claim the same point
    #[serde(default)]
    pub overlap_policy: OverlapPolicy,
}

/// Migration section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// Unit appended to distances in relational descriptions
    #[serde(default = "default_distance_unit")]
    pub distance_unit: String,
}

fn default_distance_unit() -> String {
    DEFAULT_DISTANCE_UNIT.to_string()
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            distance_unit: default_distance_unit(),
        }
    }
}

impl AppConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            app_name: default_app_name(),
            preferences: UserPreferences::default(),
            scene: SceneLayout::default(),
            mask: MaskConfig::default(),
            migration: MigrationConfig::default(),
        }
    }

    /// Options for the migration functions.
    pub fn migration_options(&self) -> MigrationOptions {
        MigrationOptions {
            distance_unit: self.migration.distance_unit.clone(),
        }
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;

        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }

        Ok(config)
    }

    pub fn default_filename() -> &'static str {
        "scene-annotator-config.json"
    }

    /// Default config file path.
    pub fn default_path() -> Option<PathBuf> {
        // Try to use XDG config directory, fall back to home directory
        if let Some(config_dir) = dirs::config_dir() {
            Some(config_dir.join("scene-annotator").join(Self::default_filename()))
        } else {
            dirs::home_dir().map(|home_dir| {
                home_dir
                    .join(".config")
                    .join("scene-annotator")
                    .join(Self::default_filename())
            })
        }
    }

    /// Load the config at `path`; a missing file gives the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::debug!("No config file found at {:?}, using defaults", path);
            return Ok(Self::new());
        }
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = self.to_json()?;
        std::fs::write(path, json)?;
        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Configuration version is newer than supported
    #[error(
        "Configuration file version {file_version} is newer than supported version {supported_version}"
    )]
    VersionTooNew {
        file_version: u32,
        supported_version: u32,
    },

    /// I/O error when reading/writing config
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
