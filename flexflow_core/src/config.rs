//! Configuration file support for FlexFlow.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/flexflow/config.toml`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub share: ShareConfig,

    #[serde(default)]
    pub training: TrainingConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Share link configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ShareConfig {
    /// Origin that `/import?data=` links are built against
    #[serde(default = "default_origin")]
    pub origin: String,
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
        }
    }
}

/// Live training configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Length of one rest countdown tick
    #[serde(default = "default_tick_millis")]
    pub tick_millis: u64,

    #[serde(default = "default_sound")]
    pub sound: bool,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            tick_millis: default_tick_millis(),
            sound: default_sound(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("flexflow")
}

fn default_origin() -> String {
    "https://flexflow.app".into()
}

fn default_tick_millis() -> u64 {
    1000
}

fn default_sound() -> bool {
    true
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::debug!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("flexflow").join("config.toml")
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        let origin = self.share.origin.trim();
        if !(origin.starts_with("http://") || origin.starts_with("https://")) {
            return Err(Error::Config(format!(
                "share.origin must be an http(s) URL, got {:?}",
                self.share.origin
            )));
        }
        Ok(())
    }
}
