//! Configuration file handling for ~/.tilecache/config.ini.
//!
//! Loads and saves user configuration with sensible defaults.
//! Settings structs live in [`super::settings`], constants in [`super::defaults`],
//! parsing in [`super::parser`], and serialization in [`super::writer`].

use ini::Ini;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::cache::CacheConfiguration;
use super::defaults::{default_internal_dir, default_themes_dir, DEFAULT_SCRATCH_DIR_NAME};
use super::error::ConfigError;
use super::settings::ConfigFile;
use crate::cache::LocalStorage;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Failed to write config file
    #[error("Failed to write config file: {0}")]
    WriteError(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// Failed to create config directory
    #[error("Failed to create config directory: {0}")]
    DirectoryError(std::io::Error),
}

impl ConfigFile {
    /// Load configuration from the default path (~/.tilecache/config.ini).
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        super::parser::parse_ini(&ini)
    }

    /// Save configuration to the default path (~/.tilecache/config.ini).
    pub fn save(&self) -> Result<(), ConfigFileError> {
        self.save_to(&config_file_path())
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigFileError::DirectoryError)?;
        }

        std::fs::write(path, self.to_config_string())
            .map_err(|e| ConfigFileError::WriteError(e.to_string()))
    }

    /// Render the configuration as commented INI text.
    pub fn to_config_string(&self) -> String {
        super::writer::to_config_string(self)
    }

    /// Build the cache configuration described by this file.
    ///
    /// Numeric values go through the normalising setters. The map file and
    /// an explicitly named theme are validated and fail the conversion if
    /// they are wrong.
    pub fn to_cache_configuration(&self) -> Result<CacheConfiguration, ConfigError> {
        let cache = &self.cache;
        let render = &self.render;

        let themes_dir = render.themes_dir.clone().unwrap_or_else(default_themes_dir);

        let mut config = CacheConfiguration::default()
            .with_themes_dir(themes_dir)
            .with_max_cache_size(cache.max_size)
            .with_clean_cache_trigger(cache.clean_trigger)
            .with_max_tile_age_ms(cache.max_tile_age_ms)
            .with_cache_enabled(cache.enabled)
            .with_external_storage(cache.external)
            .with_clean_on_destroy(cache.clean_on_destroy)
            .with_tile_size(render.tile_size)
            .with_overdraw_factor(render.overdraw_factor)
            .with_screen_ratio(render.screen_ratio)
            .with_cache_name(&cache.name)?;

        if let Some(map_file) = &render.map_file {
            config.set_map_file(map_file)?;
        }
        if let Some(theme) = &render.theme {
            config.set_render_theme(theme)?;
        }

        Ok(config)
    }

    /// Build the storage medium described by the `[cache]` directories.
    pub fn to_storage(&self) -> LocalStorage {
        let internal = self
            .cache
            .internal_dir
            .clone()
            .unwrap_or_else(default_internal_dir);
        let scratch = self
            .cache
            .scratch_dir
            .clone()
            .unwrap_or_else(|| internal.join(DEFAULT_SCRATCH_DIR_NAME));

        LocalStorage::new(internal)
            .with_scratch(scratch)
            .with_external(self.cache.external_dir.clone())
    }
}

/// Get the path to the config directory (~/.tilecache).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".tilecache")
}

/// Get the path to the config file (~/.tilecache/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}
