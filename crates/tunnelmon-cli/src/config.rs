//! CLI configuration management
//!
//! Stores the daemon address and other defaults in ~/.tunnelmon/config.json

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Persistent CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Base URL of the daemon control API (e.g. http://127.0.0.1:5000)
    pub base_url: Option<String>,
    /// Use the 1-second ping cadence by default
    #[serde(default)]
    pub fast_ping: bool,
}

/// Configuration manager
pub struct ConfigManager;

impl ConfigManager {
    /// Get the config file path
    fn get_config_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Failed to get home directory")?;
        Ok(home.join(".tunnelmon").join("config.json"))
    }

    /// Load the configuration from disk
    pub fn load() -> Result<CliConfig> {
        Self::load_from(&Self::get_config_path()?)
    }

    fn load_from(path: &Path) -> Result<CliConfig> {
        // Return default config if file doesn't exist
        if !path.exists() {
            return Ok(CliConfig::default());
        }

        let json =
            fs::read_to_string(path).context(format!("Failed to read config file: {:?}", path))?;

        let config: CliConfig = serde_json::from_str(&json)
            .context(format!("Failed to parse config file: {:?}", path))?;

        Ok(config)
    }

    /// Save the configuration to disk
    pub fn save(config: &CliConfig) -> Result<()> {
        Self::save_to(&Self::get_config_path()?, config)
    }

    fn save_to(path: &Path, config: &CliConfig) -> Result<()> {
        // Ensure directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .context(format!("Failed to create config directory: {:?}", parent))?;
        }

        let json = serde_json::to_string_pretty(config).context("Failed to serialize config")?;
        fs::write(path, json).context(format!("Failed to write config file: {:?}", path))?;

        Ok(())
    }
}
