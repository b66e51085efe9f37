//! Configuration manager for TOML file operations
//!
//! This module provides the `ConfigManager` which handles loading and saving
//! the `keepmerge` configuration file.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, ConfigResult};

use super::settings::MergeSettings;

/// Directory name under the platform configuration directory
const APP_DIR: &str = "keepmerge";

/// File name of the configuration file
const CONFIG_FILE: &str = "config.toml";

/// Configuration manager for `keepmerge`
///
/// Configuration is stored in `~/.config/keepmerge/config.toml` by default.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    /// Path of the configuration file
    config_path: PathBuf,
    /// Whether the file was named explicitly and therefore must exist
    explicit: bool,
}

impl ConfigManager {
    /// Creates a new `ConfigManager` using the default configuration file
    ///
    /// # Errors
    ///
    /// Returns an error if the platform configuration directory cannot be determined.
    pub fn new() -> ConfigResult<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ConfigError::NotFound(PathBuf::from("~/.config")))?
            .join(APP_DIR);
        Ok(Self::with_config_dir(config_dir))
    }

    /// Creates a new `ConfigManager` with a custom configuration directory
    ///
    /// This is useful for testing or non-standard configurations.
    #[must_use]
    pub fn with_config_dir(config_dir: PathBuf) -> Self {
        Self {
            config_path: config_dir.join(CONFIG_FILE),
            explicit: false,
        }
    }

    /// Creates a new `ConfigManager` for a configuration file given by the user
    ///
    /// Unlike the default location, an explicit file must exist when loading.
    #[must_use]
    pub const fn with_config_file(config_path: PathBuf) -> Self {
        Self {
            config_path,
            explicit: true,
        }
    }

    /// Returns the configuration file path
    #[must_use]
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Ensures the directory of the configuration file exists
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn ensure_config_dir(&self) -> ConfigResult<()> {
        let Some(dir) = self
            .config_path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
        else {
            return Ok(());
        };
        if !dir.exists() {
            fs::create_dir_all(dir).map_err(|e| {
                ConfigError::Write(format!(
                    "Failed to create config directory {}: {}",
                    dir.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Loads settings from the configuration file
    ///
    /// Returns default settings if the default file doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly named file is missing, or if the
    /// file exists but cannot be parsed.
    pub fn load_settings(&self) -> ConfigResult<MergeSettings> {
        if !self.config_path.exists() {
            if self.explicit {
                return Err(ConfigError::NotFound(self.config_path.clone()));
            }
            return Ok(MergeSettings::default());
        }
        Self::load_toml_file(&self.config_path)
    }

    /// Saves settings to the configuration file
    ///
    /// Creates the configuration directory if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_settings(&self, settings: &MergeSettings) -> ConfigResult<()> {
        self.ensure_config_dir()?;
        Self::save_toml_file(&self.config_path, settings)
    }

    /// Loads and parses a TOML file
    fn load_toml_file<T>(path: &Path) -> ConfigResult<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read {}: {}", path.display(), e)))?;

        toml::from_str(&content).map_err(|e| {
            ConfigError::Deserialize(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    /// Saves data to a TOML file
    fn save_toml_file<T>(path: &Path, data: &T) -> ConfigResult<()>
    where
        T: serde::Serialize,
    {
        let content = toml::to_string_pretty(data)
            .map_err(|e| ConfigError::Serialize(format!("Failed to serialize: {e}")))?;

        fs::write(path, content)
            .map_err(|e| ConfigError::Write(format!("Failed to write {}: {}", path.display(), e)))
    }
}
