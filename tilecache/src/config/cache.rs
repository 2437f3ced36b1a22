//! Tunable parameters of the tile cache.
//!
//! Setters normalise rather than reject: sizes keep the
//! `clean_cache_trigger < max_cache_size` invariant, the tile age has a
//! 15 second floor and a negative tile size resets to 256 pixels. Only the
//! path-valued setters can fail.

use std::path::{Path, PathBuf};

use tracing::warn;

use super::defaults::*;
use super::error::ConfigError;
use super::paths::{resolve_render_theme, validate_map_file};

/// Configuration of a tile cache instance.
///
/// # Example
///
/// ```
/// use tilecache::config::CacheConfiguration;
///
/// let config = CacheConfiguration::default()
///     .with_max_cache_size_mb(4)
///     .with_clean_cache_trigger_mb(10);
///
/// // A trigger at or above the cap is replaced by half the cap.
/// assert_eq!(config.clean_cache_trigger_bytes(), 2 * 1024 * 1024);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfiguration {
    max_cache_size_bytes: u64,
    clean_cache_trigger_bytes: u64,
    max_tile_age_ms: u64,
    cache_enabled: bool,
    use_external_storage: bool,
    cache_name: String,
    tile_size: u32,
    overdraw_factor: f32,
    screen_ratio: f32,
    clean_on_destroy: bool,
    map_file: Option<PathBuf>,
    render_theme: Option<PathBuf>,
    themes_dir: PathBuf,
}

impl Default for CacheConfiguration {
    fn default() -> Self {
        Self {
            max_cache_size_bytes: DEFAULT_MAX_CACHE_SIZE,
            clean_cache_trigger_bytes: DEFAULT_CLEAN_CACHE_TRIGGER,
            max_tile_age_ms: DEFAULT_MAX_TILE_AGE_MS,
            cache_enabled: true,
            use_external_storage: true,
            cache_name: DEFAULT_CACHE_NAME.to_string(),
            tile_size: DEFAULT_TILE_SIZE,
            overdraw_factor: DEFAULT_OVERDRAW_FACTOR,
            screen_ratio: DEFAULT_SCREEN_RATIO,
            clean_on_destroy: true,
            map_file: None,
            render_theme: None,
            themes_dir: default_themes_dir(),
        }
    }
}

impl CacheConfiguration {
    // -------------------------------------------------------------------------
    // Getters
    // -------------------------------------------------------------------------

    pub fn max_cache_size_bytes(&self) -> u64 {
        self.max_cache_size_bytes
    }

    pub fn clean_cache_trigger_bytes(&self) -> u64 {
        self.clean_cache_trigger_bytes
    }

    pub fn max_tile_age_ms(&self) -> u64 {
        self.max_tile_age_ms
    }

    /// Whether the host wants rendered tiles kept in the persistent root.
    pub fn is_cache_enabled(&self) -> bool {
        self.cache_enabled
    }

    /// Whether the host prefers the external storage medium.
    pub fn use_external_storage(&self) -> bool {
        self.use_external_storage
    }

    pub fn cache_name(&self) -> &str {
        &self.cache_name
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    pub fn overdraw_factor(&self) -> f32 {
        self.overdraw_factor
    }

    pub fn screen_ratio(&self) -> f32 {
        self.screen_ratio
    }

    pub fn clean_on_destroy(&self) -> bool {
        self.clean_on_destroy
    }

    pub fn map_file(&self) -> Option<&Path> {
        self.map_file.as_deref()
    }

    pub fn render_theme(&self) -> Option<&Path> {
        self.render_theme.as_deref()
    }

    pub fn themes_dir(&self) -> &Path {
        &self.themes_dir
    }

    // -------------------------------------------------------------------------
    // Normalising setters
    // -------------------------------------------------------------------------

    /// Set the size cap. A cap at or below the trigger halves the trigger.
    /// The cap never drops below one byte, so the trigger stays below it.
    pub fn set_max_cache_size(&mut self, bytes: u64) {
        let bytes = bytes.max(1);
        if bytes <= self.clean_cache_trigger_bytes {
            self.clean_cache_trigger_bytes = bytes / 2;
        }
        self.max_cache_size_bytes = bytes;
    }

    /// Set the free-space floor. A trigger at or above the cap becomes half the cap.
    pub fn set_clean_cache_trigger(&mut self, bytes: u64) {
        self.clean_cache_trigger_bytes = if bytes >= self.max_cache_size_bytes {
            self.max_cache_size_bytes / 2
        } else {
            bytes
        };
    }

    /// Set the maximum tile age, clamped to a 15 second floor.
    pub fn set_max_tile_age_ms(&mut self, ms: u64) {
        self.max_tile_age_ms = ms.max(MIN_TILE_AGE_MS);
    }

    pub fn set_cache_enabled(&mut self, enabled: bool) {
        self.cache_enabled = enabled;
    }

    pub fn set_use_external_storage(&mut self, external: bool) {
        self.use_external_storage = external;
    }

    /// Set the tile size in pixels. Negative input resets to 256.
    pub fn set_tile_size(&mut self, pixels: i64) {
        self.tile_size = if pixels < 0 {
            DEFAULT_TILE_SIZE
        } else {
            u32::try_from(pixels).unwrap_or(u32::MAX)
        };
    }

    pub fn set_overdraw_factor(&mut self, factor: f32) {
        self.overdraw_factor = factor;
    }

    pub fn set_screen_ratio(&mut self, ratio: f32) {
        self.screen_ratio = ratio;
    }

    pub fn set_clean_on_destroy(&mut self, clean: bool) {
        self.clean_on_destroy = clean;
    }

    /// Set the cache name.
    ///
    /// Returns `Ok(true)` when the name changed. An empty name is ignored
    /// and the previous name kept.
    pub fn set_cache_name(&mut self, name: &str) -> Result<bool, ConfigError> {
        let name = name.trim();
        if name.is_empty() {
            warn!(current = %self.cache_name, "Ignoring empty cache name");
            return Ok(false);
        }
        if name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(ConfigError::InvalidCacheName(name.to_string()));
        }
        if name == self.cache_name {
            return Ok(false);
        }
        self.cache_name = name.to_string();
        Ok(true)
    }

    /// Set the map data source. Must be an existing `.map` file.
    pub fn set_map_file(&mut self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        self.map_file = Some(validate_map_file(path)?);
        Ok(())
    }

    /// Set the render theme. Bare names resolve against the themes directory.
    pub fn set_render_theme(&mut self, theme: &str) -> Result<(), ConfigError> {
        self.render_theme = Some(resolve_render_theme(theme, &self.themes_dir)?);
        Ok(())
    }

    /// Make sure the render theme points at an existing file.
    ///
    /// A configured theme that has vanished is replaced, with a warning, by
    /// `<themes_dir>/assets.xml` if that exists and by no theme otherwise. With
    /// no theme configured the staged default is picked up when present.
    pub fn apply_default_theme(&mut self) {
        let vanished = match &self.render_theme {
            Some(theme) if theme.is_file() => return,
            Some(_) => true,
            None => false,
        };

        let default = self.themes_dir.join(DEFAULT_THEME_FILE);
        let fallback = default.is_file().then_some(default);
        if vanished {
            warn!(
                theme = ?self.render_theme,
                fallback = ?fallback,
                "Render theme not found, using default theme"
            );
        }
        self.render_theme = fallback;
    }

    pub fn set_themes_dir(&mut self, dir: impl Into<PathBuf>) {
        self.themes_dir = dir.into();
    }

    // -------------------------------------------------------------------------
    // Builder
    // -------------------------------------------------------------------------

    pub fn with_max_cache_size(mut self, bytes: u64) -> Self {
        self.set_max_cache_size(bytes);
        self
    }

    pub fn with_max_cache_size_mb(self, mb: u64) -> Self {
        self.with_max_cache_size(mb.saturating_mul(MB))
    }

    pub fn with_clean_cache_trigger(mut self, bytes: u64) -> Self {
        self.set_clean_cache_trigger(bytes);
        self
    }

    pub fn with_clean_cache_trigger_mb(self, mb: u64) -> Self {
        self.with_clean_cache_trigger(mb.saturating_mul(MB))
    }

    pub fn with_max_tile_age_ms(mut self, ms: u64) -> Self {
        self.set_max_tile_age_ms(ms);
        self
    }

    pub fn with_cache_enabled(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    pub fn with_external_storage(mut self, external: bool) -> Self {
        self.use_external_storage = external;
        self
    }

    pub fn with_cache_name(mut self, name: &str) -> Result<Self, ConfigError> {
        self.set_cache_name(name)?;
        Ok(self)
    }

    pub fn with_tile_size(mut self, pixels: i64) -> Self {
        self.set_tile_size(pixels);
        self
    }

    pub fn with_overdraw_factor(mut self, factor: f32) -> Self {
        self.overdraw_factor = factor;
        self
    }

    pub fn with_screen_ratio(mut self, ratio: f32) -> Self {
        self.screen_ratio = ratio;
        self
    }

    pub fn with_clean_on_destroy(mut self, clean: bool) -> Self {
        self.clean_on_destroy = clean;
        self
    }

    pub fn with_themes_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.themes_dir = dir.into();
        self
    }

    pub fn with_map_file(mut self, path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        self.set_map_file(path)?;
        Ok(self)
    }

    pub fn with_render_theme(mut self, theme: &str) -> Result<Self, ConfigError> {
        self.set_render_theme(theme)?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = CacheConfiguration::default();
        assert_eq!(config.max_cache_size_bytes(), 25 * MB);
        assert_eq!(config.clean_cache_trigger_bytes(), 5 * MB);
        assert_eq!(config.max_tile_age_ms(), 15_000);
        assert!(config.is_cache_enabled());
        assert!(config.use_external_storage());
        assert_eq!(config.cache_name(), "mapcache");
        assert_eq!(config.tile_size(), 256);
        assert_eq!(config.overdraw_factor(), 1.2);
        assert_eq!(config.screen_ratio(), 1.0);
        assert!(config.clean_on_destroy());
        assert!(config.map_file().is_none());
        assert!(config.render_theme().is_none());
    }

    #[test]
    fn test_max_size_at_or_below_trigger_halves_trigger() {
        let mut config = CacheConfiguration::default();
        config.set_max_cache_size(4 * MB);

        assert_eq!(config.max_cache_size_bytes(), 4 * MB);
        assert_eq!(config.clean_cache_trigger_bytes(), 2 * MB);

        config.set_max_cache_size(2 * MB);
        assert_eq!(config.clean_cache_trigger_bytes(), MB);
    }

    #[test]
    fn test_max_size_above_trigger_keeps_trigger() {
        let mut config = CacheConfiguration::default();
        config.set_max_cache_size(100 * MB);

        assert_eq!(config.max_cache_size_bytes(), 100 * MB);
        assert_eq!(config.clean_cache_trigger_bytes(), 5 * MB);
    }

    #[test]
    fn test_trigger_at_or_above_max_becomes_half_max() {
        let mut config = CacheConfiguration::default();
        config.set_clean_cache_trigger(25 * MB);
        assert_eq!(config.clean_cache_trigger_bytes(), 25 * MB / 2);

        config.set_clean_cache_trigger(40 * MB);
        assert_eq!(config.clean_cache_trigger_bytes(), 25 * MB / 2);

        config.set_clean_cache_trigger(3 * MB);
        assert_eq!(config.clean_cache_trigger_bytes(), 3 * MB);
    }

    #[test]
    fn test_trigger_always_below_max() {
        let mut config = CacheConfiguration::default();
        for mb in [1, 3, 5, 8, 25, 50] {
            config.set_max_cache_size(mb * MB);
            config.set_clean_cache_trigger(mb * MB);
            assert!(config.clean_cache_trigger_bytes() < config.max_cache_size_bytes());
        }
    }

    #[test]
    fn test_zero_max_size_keeps_trigger_below_cap() {
        let mut config = CacheConfiguration::default();
        config.set_max_cache_size(0);

        assert_eq!(config.max_cache_size_bytes(), 1);
        assert_eq!(config.clean_cache_trigger_bytes(), 0);

        config.set_clean_cache_trigger(0);
        assert!(config.clean_cache_trigger_bytes() < config.max_cache_size_bytes());
    }

    #[test]
    fn test_tile_age_floor() {
        let mut config = CacheConfiguration::default();
        config.set_max_tile_age_ms(1_000);
        assert_eq!(config.max_tile_age_ms(), 15_000);

        config.set_max_tile_age_ms(60_000);
        assert_eq!(config.max_tile_age_ms(), 60_000);
    }

    #[test]
    fn test_negative_tile_size_resets_to_default() {
        let mut config = CacheConfiguration::default();
        config.set_tile_size(512);
        assert_eq!(config.tile_size(), 512);

        config.set_tile_size(-1);
        assert_eq!(config.tile_size(), 256);
    }

    #[test]
    fn test_cache_name_rules() {
        let mut config = CacheConfiguration::default();

        assert!(!config.set_cache_name("").unwrap());
        assert_eq!(config.cache_name(), "mapcache");

        assert!(!config.set_cache_name("mapcache").unwrap());
        assert!(config.set_cache_name("altcache").unwrap());
        assert_eq!(config.cache_name(), "altcache");

        assert!(matches!(
            config.set_cache_name("../escape"),
            Err(ConfigError::InvalidCacheName(_))
        ));
        assert!(matches!(
            config.set_cache_name(".."),
            Err(ConfigError::InvalidCacheName(_))
        ));
        assert_eq!(config.cache_name(), "altcache");
    }

    #[test]
    fn test_failed_map_file_leaves_previous_value() {
        let temp = TempDir::new().unwrap();
        let good = temp.path().join("berlin.map");
        std::fs::write(&good, b"map").unwrap();

        let mut config = CacheConfiguration::default();
        config.set_map_file(&good).unwrap();

        assert!(config.set_map_file(temp.path().join("berlin.osm")).is_err());
        assert!(config.set_map_file(temp.path().join("missing.map")).is_err());
        assert_eq!(config.map_file(), Some(good.as_path()));
    }

    #[test]
    fn test_render_theme_uses_themes_dir() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("night.xml"), b"<rendertheme/>").unwrap();

        let config = CacheConfiguration::default()
            .with_themes_dir(temp.path())
            .with_render_theme("night.xml")
            .unwrap();

        assert_eq!(config.render_theme(), Some(temp.path().join("night.xml").as_path()));
    }

    #[test]
    fn test_vanished_theme_falls_back_to_staged_default() {
        let temp = TempDir::new().unwrap();
        let night = temp.path().join("night.xml");
        std::fs::write(&night, b"<rendertheme/>").unwrap();
        std::fs::write(temp.path().join("assets.xml"), b"<rendertheme/>").unwrap();

        let mut config = CacheConfiguration::default()
            .with_themes_dir(temp.path())
            .with_render_theme("night.xml")
            .unwrap();
        std::fs::remove_file(&night).unwrap();
        config.apply_default_theme();

        assert_eq!(config.render_theme(), Some(temp.path().join("assets.xml").as_path()));
    }

    #[test]
    fn test_no_staged_default_leaves_theme_unset() {
        let temp = TempDir::new().unwrap();
        let mut config = CacheConfiguration::default().with_themes_dir(temp.path());
        config.apply_default_theme();

        assert!(config.render_theme().is_none());
    }
}
