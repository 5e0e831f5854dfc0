//! TOML-based configuration persistence for the radar server.
//!
//! Reads and writes `AppConfig` to the platform-appropriate config file:
//! - Windows:  `%APPDATA%\PlayerRadar\config.toml`
//! - Linux:    `~/.config/playerradar/config.toml`
//! - macOS:    `~/Library/Application Support/PlayerRadar/config.toml`
//!
//! # Serde default values
//!
//! Fields annotated with `#[serde(default = "some_fn")]` use the return value
//! of `some_fn()` when the field is absent from the TOML file. This allows
//! the radar to run correctly on first start (before a config file exists)
//! and when upgrading from an older config file that is missing newer fields.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::broadcast::BroadcastConfig;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level radar configuration stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub radar: RadarConfig,
    #[serde(default)]
    pub marker: MarkerConfig,
}

/// Broadcast loop settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RadarConfig {
    /// Milliseconds between scheduled broadcast passes.
    #[serde(default = "default_update_interval_ms")]
    pub update_interval_ms: u64,
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Marker appearance settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarkerConfig {
    /// Icon asset identifier shown on the compass for every entity.
    #[serde(default = "default_icon")]
    pub icon: String,
    /// Prefix for generated marker ids.
    #[serde(default = "default_id_prefix")]
    pub id_prefix: String,
}

impl Default for RadarConfig {
    fn default() -> Self {
        Self {
            update_interval_ms: default_update_interval_ms(),
            log_level: default_log_level(),
        }
    }
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            icon: default_icon(),
            id_prefix: default_id_prefix(),
        }
    }
}

impl AppConfig {
    /// Maps the on-disk schema to the application layer's broadcast config.
    pub fn broadcast_config(&self) -> BroadcastConfig {
        BroadcastConfig {
            update_interval: Duration::from_millis(self.radar.update_interval_ms),
            marker_icon: self.marker.icon.clone(),
            marker_id_prefix: self.marker.id_prefix.clone(),
        }
    }
}

fn default_update_interval_ms() -> u64 {
    500
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_icon() -> String {
    "Player.png".to_string()
}

fn default_id_prefix() -> String {
    "radar_".to_string()
}

// ── Load / save ───────────────────────────────────────────────────────────────

/// Resolves the directory holding the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the platform directory
/// cannot be determined.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path of the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the platform directory
/// cannot be determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads `AppConfig` from disk, returning `AppConfig::default()` if the file
/// does not yet exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    read_config_file(&config_file_path()?)
}

/// Persists `config` to disk, creating the directory and file as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config(config: &AppConfig) -> Result<(), ConfigError> {
    write_config_file(&config_file_path()?, config)
}

fn read_config_file(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let cfg: AppConfig = toml::from_str(&content)?;
            Ok(cfg)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

fn write_config_file(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

/// Resolves the platform config base directory including the app subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        // %APPDATA% e.g. C:\Users\<user>\AppData\Roaming
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("PlayerRadar"))
    }

    #[cfg(target_os = "linux")]
    {
        // XDG_CONFIG_HOME or ~/.config
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("playerradar"))
    }

    #[cfg(target_os = "macos")]
    {
        // ~/Library/Application Support/PlayerRadar
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("PlayerRadar")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
