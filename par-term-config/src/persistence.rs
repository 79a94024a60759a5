//! Config persistence and path resolution for `TmuxConfig`.
//!
//! Covers:
//! - `load` / `save` against the XDG-style default path
//! - `load_from` / `save_to` for explicit paths (atomic write)

use crate::error::ConfigError;
use crate::tmux_config::TmuxConfig;
use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};

impl TmuxConfig {
    /// Directory holding par-term configuration files.
    pub fn config_dir() -> PathBuf {
        #[cfg(target_os = "windows")]
        {
            if let Some(config_dir) = dirs::config_dir() {
                config_dir.join("par-term")
            } else {
                PathBuf::from(".")
            }
        }
        #[cfg(not(target_os = "windows"))]
        {
            // XDG convention on all platforms: ~/.config/par-term
            if let Some(home_dir) = dirs::home_dir() {
                home_dir.join(".config").join("par-term")
            } else {
                PathBuf::from(".")
            }
        }
    }

    /// Path of the tmux settings file.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("tmux.yaml")
    }

    /// Load configuration from the default path, creating it with defaults
    /// when it does not exist yet.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();
        log::info!("tmux config path: {:?}", config_path);

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            log::info!(
                "tmux config not found, creating default at {:?}",
                config_path
            );
            let config = Self::default();
            if let Err(e) = config.save() {
                log::error!("Failed to save default tmux config: {}", e);
                return Err(e);
            }
            Ok(config)
        }
    }

    /// Load and validate configuration from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self> {
        log::info!("Loading tmux config from {:?}", path);
        let contents = fs::read_to_string(path).map_err(ConfigError::from)?;
        let config: TmuxConfig = serde_yaml_ng::from_str(&contents).map_err(ConfigError::from)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the default path.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to an explicit path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.validate()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(ConfigError::from)?;
        }

        let yaml = serde_yaml_ng::to_string(self).map_err(ConfigError::from)?;

        // Atomic save: write to temp file then rename to prevent corruption on crash
        let temp_path = path.with_extension("yaml.tmp");
        fs::write(&temp_path, &yaml).map_err(ConfigError::from)?;
        fs::rename(&temp_path, path).map_err(ConfigError::from)?;

        log::info!("Saved tmux config to {:?}", path);
        Ok(())
    }
}
