use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use tnua_engine::EngineConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
}

impl Config {
    /// Get config directory path (~/.tnua/)
    pub fn config_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not find home directory")?;
        Ok(home.join(".tnua"))
    }

    /// Get config file path (~/.tnua/config.toml)
    pub fn config_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Explicit path if given, the default location otherwise
    pub fn resolve(path: Option<&Path>) -> Result<PathBuf> {
        match path {
            Some(path) => Ok(path.to_path_buf()),
            None => Self::config_file(),
        }
    }

    /// Load configuration from file, falling back to defaults when it does
    /// not exist
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_file = Self::resolve(path)?;

        if !config_file.exists() {
            tracing::info!("Config file not found, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&config_file)
            .with_context(|| format!("Failed to read config file {}", config_file.display()))?;

        let config: Config = toml::from_str(&contents).context("Failed to parse config file")?;
        config
            .engine
            .validate()
            .context("Invalid engine configuration")?;

        tracing::debug!(path = %config_file.display(), "Loaded configuration");
        Ok(config)
    }

    /// Save configuration to file, returning where it was written
    pub fn save(&self, path: Option<&Path>) -> Result<PathBuf> {
        let config_file = Self::resolve(path)?;
        if let Some(dir) = config_file.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&config_file, contents).context("Failed to write config file")?;

        Ok(config_file)
    }
}
