//! Settings structs for all configuration file sections.
//!
//! Each struct represents one `[section]` of the INI config file.
//! These are pure data types with no parsing or serialization logic.

use std::path::PathBuf;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    /// Cache settings
    pub cache: CacheSettings,
    /// Rendering settings handed through to the tile renderer
    pub render: RenderSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

/// `[cache]` section.
#[derive(Debug, Clone)]
pub struct CacheSettings {
    /// Cache name; the persistent root is `<medium root>/<name>`
    pub name: String,
    /// Whether rendered tiles are kept in the persistent root
    pub enabled: bool,
    /// Prefer the external storage medium when it is available
    pub external: bool,
    /// Maximum persistent cache size in bytes
    pub max_size: u64,
    /// Free-space floor in bytes that triggers cleaning
    pub clean_trigger: u64,
    /// Maximum tile age in milliseconds before a sweep may remove it
    pub max_tile_age_ms: u64,
    /// Delete the persistent root on destroy
    pub clean_on_destroy: bool,
    /// Internal storage medium root (default: platform cache dir)
    pub internal_dir: Option<PathBuf>,
    /// External storage medium root (e.g. removable card mount)
    pub external_dir: Option<PathBuf>,
    /// Scratch root for tiles rendered while caching is disabled
    pub scratch_dir: Option<PathBuf>,
}

/// `[render]` section.
#[derive(Debug, Clone)]
pub struct RenderSettings {
    /// Map data source (`.map`)
    pub map_file: Option<PathBuf>,
    /// Render theme (`.xml`); bare names resolve against `themes_dir`
    pub theme: Option<String>,
    /// Directory the asset provisioner staged themes into
    pub themes_dir: Option<PathBuf>,
    /// Tile edge length in pixels; negative values reset to the default
    pub tile_size: i64,
    /// Overdraw factor
    pub overdraw_factor: f32,
    /// Screen ratio
    pub screen_ratio: f32,
}

/// `[logging]` section.
#[derive(Debug, Clone)]
pub struct LoggingSettings {
    /// Log directory
    pub directory: PathBuf,
    /// Log file name
    pub file: String,
}
