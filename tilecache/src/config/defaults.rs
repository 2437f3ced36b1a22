//! Default values and constants for all configuration settings.
//!
//! Contains all `DEFAULT_*` constants and the floor/increment values used by
//! the normalising setters and the eviction policy.

use std::path::PathBuf;

use super::settings::*;

// =============================================================================
// Sizes
// =============================================================================

/// One megabyte, the unit the host-facing size setters use.
pub const MB: u64 = 1024 * 1024;

/// Default maximum persistent cache size (25 MB).
pub const DEFAULT_MAX_CACHE_SIZE: u64 = 25 * MB;

/// Default free-space floor that triggers cleaning (5 MB).
pub const DEFAULT_CLEAN_CACHE_TRIGGER: u64 = 5 * MB;

// =============================================================================
// Ages and cleaning cadence
// =============================================================================

/// Minimum (and default) age in milliseconds before a tile may be swept.
pub const MIN_TILE_AGE_MS: u64 = 15_000;

/// Default maximum tile age in milliseconds.
pub const DEFAULT_MAX_TILE_AGE_MS: u64 = MIN_TILE_AGE_MS;

/// Cleaning passes closer together than this grow the cap instead of sweeping.
pub const CLEANING_COOLDOWN_MS: u64 = 5_000;

/// Amount the cap grows by when a cleaning pass is rate-limited (5 MB).
pub const CAP_GROWTH_BYTES: u64 = 5 * MB;

// =============================================================================
// Storage
// =============================================================================

/// Default cache name (directory under the storage medium root).
pub const DEFAULT_CACHE_NAME: &str = "mapcache";

/// Directory name of the scratch root under the internal cache directory.
pub const DEFAULT_SCRATCH_DIR_NAME: &str = "tmp";

/// Application directory name under the platform cache directory.
pub const APP_DIR_NAME: &str = "tilecache";

// =============================================================================
// Rendering
// =============================================================================

/// Default tile edge length in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 256;

/// Default overdraw factor handed to the renderer.
pub const DEFAULT_OVERDRAW_FACTOR: f32 = 1.2;

/// Default screen ratio handed to the renderer.
pub const DEFAULT_SCREEN_RATIO: f32 = 1.0;

/// File extension required for map data sources.
pub const MAP_FILE_EXTENSION: &str = "map";

/// File extension required for render themes.
pub const THEME_FILE_EXTENSION: &str = "xml";

/// Theme picked from the staged themes directory when none is configured.
pub const DEFAULT_THEME_FILE: &str = "assets.xml";

/// Directory name the asset provisioner stages themes into.
pub const THEMES_DIR_NAME: &str = "renderthemes";

// =============================================================================
// Logging
// =============================================================================

/// Default log directory.
pub const DEFAULT_LOG_DIR: &str = "logs";

/// Default log file name.
pub const DEFAULT_LOG_FILE: &str = "tilecache.log";

/// Default internal cache directory (`<platform cache dir>/tilecache`).
pub fn default_internal_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

/// Default themes directory (`<platform data dir>/tilecache/renderthemes`).
pub fn default_themes_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
        .join(THEMES_DIR_NAME)
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            cache: CacheSettings {
                name: DEFAULT_CACHE_NAME.to_string(),
                enabled: true,
                external: true,
                max_size: DEFAULT_MAX_CACHE_SIZE,
                clean_trigger: DEFAULT_CLEAN_CACHE_TRIGGER,
                max_tile_age_ms: DEFAULT_MAX_TILE_AGE_MS,
                clean_on_destroy: true,
                internal_dir: None,
                external_dir: None,
                scratch_dir: None,
            },
            render: RenderSettings {
                map_file: None,
                theme: None,
                themes_dir: None,
                tile_size: DEFAULT_TILE_SIZE as i64,
                overdraw_factor: DEFAULT_OVERDRAW_FACTOR,
                screen_ratio: DEFAULT_SCREEN_RATIO,
            },
            logging: LoggingSettings {
                directory: PathBuf::from(DEFAULT_LOG_DIR),
                file: DEFAULT_LOG_FILE.to_string(),
            },
        }
    }
}
