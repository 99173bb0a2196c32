//! Configuration
//!
//! Loads configuration from TOML file at `~/.config/arbiter/config.toml`
//! Auto-generates default config file on first run if missing.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::shared::FrameExtents;

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub decorations: DecorationConfig,
    pub colors: ColorConfig,
    pub focus: FocusConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location, writing defaults there
    /// if the file doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from `path`, writing defaults there if missing
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("Config file not found at {:?}, using defaults", path);
            if let Err(e) = Self::save_default(path) {
                warn!("Failed to create default config file: {}", e);
            }
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {:?}", path))?;

        info!("Configuration loaded from {:?}", path);
        debug!("Config: {:?}", config);

        Ok(config)
    }

    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("arbiter");

        Ok(config_dir.join("config.toml"))
    }

    /// Save default configuration to file
    fn save_default(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .context("Failed to create config directory")?;
        }

        let toml_string = toml::to_string_pretty(&Self::default())
            .context("Failed to serialize default config")?;

        fs::write(path, toml_string)
            .context("Failed to write default config file")?;

        info!("Created default config file at {:?}", path);
        Ok(())
    }

    /// Decoration offsets around every managed client
    pub fn frame_extents(&self) -> FrameExtents {
        FrameExtents::with_titlebar(
            u32::from(self.decorations.titlebar_height),
            u32::from(self.decorations.border_width),
        )
    }
}

/// Frame geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecorationConfig {
    /// Titlebar height in pixels
    pub titlebar_height: u16,
    /// Border width in pixels
    pub border_width: u16,
}

impl Default for DecorationConfig {
    fn default() -> Self {
        Self {
            titlebar_height: 24,
            border_width: 4,
        }
    }
}

/// Frame colors (hex: 0xRRGGBB)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    pub frame: u32,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self { frame: 0x2e3440 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FocusConfig {
    /// How many previously focused windows fallback can choose from
    pub history_size: usize,
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self { history_size: 20 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter directive, used when RUST_LOG is unset
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "arbiter=debug,info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("arbiter").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config, Config::default());
        assert!(path.exists());

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded, Config::default());
    }

    #[test]
    fn test_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[decorations]\ntitlebar_height = 30\n\n[focus]\nhistory_size = 5\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.decorations.titlebar_height, 30);
        assert_eq!(config.decorations.border_width, 4);
        assert_eq!(config.focus.history_size, 5);
        assert_eq!(config.logging, LoggingConfig::default());
        assert_eq!(config.frame_extents(), FrameExtents::with_titlebar(30, 4));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[focus]\nhistory_size = \"lots\"\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse config file"));
    }
}
