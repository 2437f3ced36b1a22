//! CLI runner for common setup and operations.
//!
//! Encapsulates config loading, logging initialization and cache creation
//! to reduce duplication across command handlers.

use std::path::{Path, PathBuf};

use tilecache::config::{config_directory, config_file_path, ConfigFile};
use tilecache::logging::{init_logging, LoggingGuard};
use tilecache::render::PlaceholderRenderer;
use tilecache::service::TileCache;
use tracing::info;

use crate::commands::common::CacheOverrides;
use crate::error::CliError;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    _logging_guard: LoggingGuard,
    /// Loaded configuration file, with command-line overrides applied
    config: ConfigFile,
}

impl CliRunner {
    /// Load the config file (or defaults), apply overrides and start logging.
    pub fn new(config_path: Option<&Path>, overrides: &CacheOverrides) -> Result<Self, CliError> {
        let path = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(config_file_path);
        let mut config = ConfigFile::load_from(&path)?;
        overrides.apply(&mut config);

        let log_dir = resolve_log_dir(&config.logging.directory, &path);
        let logging_guard = init_logging(&log_dir, &config.logging.file)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        info!("tilecache v{}", tilecache::VERSION);
        info!(config = %path.display(), "Configuration loaded");

        Ok(Self {
            _logging_guard: logging_guard,
            config,
        })
    }

    /// Open the tile cache described by the configuration.
    pub fn open_cache(&self) -> Result<TileCache, CliError> {
        let cache_config = self.config.to_cache_configuration()?;
        TileCache::builder(cache_config)
            .medium(self.config.to_storage())
            .build(PlaceholderRenderer::new())
            .map_err(CliError::CacheOpen)
            .inspect(|_| info!("Tile cache opened"))
    }
}

/// Resolve a relative log directory against the config file's directory.
pub fn resolve_log_dir(directory: &Path, config_path: &Path) -> PathBuf {
    if directory.is_absolute() {
        return directory.to_path_buf();
    }
    config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(config_directory)
        .join(directory)
}
