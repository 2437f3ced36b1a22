//! Builder for [`TileCache`] with injectable collaborators.
//!
//! Storage medium and clock default to [`LocalStorage`] and [`SystemClock`];
//! hosts that manage their own directories, and tests that need to control
//! free space or time, swap them out here.

use std::sync::Arc;

use super::error::TileCacheError;
use super::facade::TileCache;
use crate::cache::{LocalStorage, StorageMedium};
use crate::config::CacheConfiguration;
use crate::render::TileRenderer;
use crate::time::{Clock, SystemClock};

/// Builder for [`TileCache`].
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use tilecache::cache::FixedSpaceMedium;
/// use tilecache::config::CacheConfiguration;
/// use tilecache::render::PlaceholderRenderer;
/// use tilecache::service::TileCache;
///
/// let dir = tempfile::tempdir()?;
/// let medium = Arc::new(FixedSpaceMedium::new(dir.path(), 1 << 30));
///
/// let cache = TileCache::builder(CacheConfiguration::default())
///     .medium(medium)
///     .build(PlaceholderRenderer::new())?;
///
/// let path = cache.get_tile(1, 2, 3)?;
/// assert!(path.ends_with("mapcache/3/1/2.png"));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct TileCacheBuilder {
    config: CacheConfiguration,
    medium: Option<Arc<dyn StorageMedium>>,
    clock: Option<Arc<dyn Clock>>,
}

impl TileCacheBuilder {
    pub fn new(config: CacheConfiguration) -> Self {
        Self {
            config,
            medium: None,
            clock: None,
        }
    }

    /// Use `medium` instead of local storage under the platform cache directory.
    pub fn medium(mut self, medium: impl StorageMedium + 'static) -> Self {
        self.medium = Some(Arc::new(medium));
        self
    }

    /// Use `clock` instead of the system clock.
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    /// Build the cache, creating its directories.
    pub fn build(self, renderer: impl TileRenderer + 'static) -> Result<TileCache, TileCacheError> {
        let medium = self
            .medium
            .unwrap_or_else(|| Arc::new(LocalStorage::default()));
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));

        TileCache::from_parts(self.config, medium, clock, Box::new(renderer))
    }
}
