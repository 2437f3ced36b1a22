//! Tile cache facade implementation.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info, warn};

use super::builder::TileCacheBuilder;
use super::error::TileCacheError;
use crate::cache::{
    walk, CacheState, CacheStats, CleaningReport, EvictionEngine, StorageKind,
    StorageLocationResolver, StorageMedium, StorageRoot, TileStore,
};
use crate::config::{CacheConfiguration, MB};
use crate::coord::{TileKey, MAX_ZOOM};
use crate::render::{RenderRequest, TileRenderer};
use crate::time::Clock;

/// Bounded on-disk cache of rendered map tiles.
///
/// Every operation runs under one lock: lookups and writes move the size
/// counter and may trigger a cleaning pass, reconfiguration may purge a
/// whole directory tree, and the renderer is called one request at a time.
///
/// # Example
///
/// ```no_run
/// use tilecache::config::CacheConfiguration;
/// use tilecache::render::PlaceholderRenderer;
/// use tilecache::service::TileCache;
///
/// let cache = TileCache::new(CacheConfiguration::default(), PlaceholderRenderer::new())?;
/// let path = cache.get_tile(1, 2, 3)?;
/// println!("tile at {}", path.display());
/// cache.destroy()?;
/// # Ok::<(), tilecache::service::TileCacheError>(())
/// ```
pub struct TileCache {
    inner: Mutex<CacheInner>,
}

struct CacheInner {
    config: CacheConfiguration,
    resolver: StorageLocationResolver,
    store: TileStore,
    engine: EvictionEngine,
    state: CacheState,
    stats: CacheStats,
    renderer: Box<dyn TileRenderer>,
}

impl TileCache {
    /// Create a cache on local storage with the system clock.
    pub fn new(
        config: CacheConfiguration,
        renderer: impl TileRenderer + 'static,
    ) -> Result<Self, TileCacheError> {
        TileCacheBuilder::new(config).build(renderer)
    }

    /// Start building a cache with a custom storage medium or clock.
    pub fn builder(config: CacheConfiguration) -> TileCacheBuilder {
        TileCacheBuilder::new(config)
    }

    /// Resolve the persistent root, size it from disk, run the size and
    /// availability checks and create the scratch root.
    pub(super) fn from_parts(
        mut config: CacheConfiguration,
        medium: Arc<dyn StorageMedium>,
        clock: Arc<dyn Clock>,
        renderer: Box<dyn TileRenderer>,
    ) -> Result<Self, TileCacheError> {
        config.apply_default_theme();
        let resolver =
            StorageLocationResolver::new(medium, config.cache_name(), config.use_external_storage())?;

        let mut inner = CacheInner {
            store: TileStore::new(renderer.extension()),
            engine: EvictionEngine::new(clock),
            state: CacheState::default(),
            stats: CacheStats::new(),
            config,
            resolver,
            renderer,
        };
        inner.initialise_root()?;

        info!(
            root = %inner.resolver.persistent_root().display(),
            external = inner.resolver.uses_external(),
            current_size_bytes = inner.state.current_size_bytes,
            max_size_bytes = inner.config.max_cache_size_bytes(),
            caching = inner.is_caching(),
            "Tile cache ready"
        );

        Ok(Self {
            inner: Mutex::new(inner),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, CacheInner>, TileCacheError> {
        self.inner.lock().map_err(|_| TileCacheError::LockPoisoned)
    }

    // -------------------------------------------------------------------------
    // Tiles
    // -------------------------------------------------------------------------

    /// Return the path of the tile at `(x, y, zoom)`, rendering it on a miss.
    ///
    /// With caching on, a hit refreshes the file's modification time and a
    /// miss is written under the persistent root, followed by a size check.
    /// With caching off, the tile is always rendered and written to the
    /// scratch root, replacing any earlier scratch copy.
    ///
    /// Zoom levels above [`MAX_ZOOM`] are rejected before anything is rendered.
    pub fn get_tile(&self, x: u32, y: u32, zoom: u8) -> Result<PathBuf, TileCacheError> {
        if zoom > MAX_ZOOM {
            return Err(TileCacheError::InvalidZoom { zoom });
        }
        self.lock()?.get_tile(TileKey::new(x, y, zoom))
    }

    /// Same as [`get_tile`](Self::get_tile).
    pub fn tile_path(&self, x: u32, y: u32, zoom: u8) -> Result<PathBuf, TileCacheError> {
        self.get_tile(x, y, zoom)
    }

    /// Run a cleaning pass now, subject to the same cooldown as triggered passes.
    pub fn clean_now(&self) -> Result<CleaningReport, TileCacheError> {
        let mut inner = self.lock()?;
        inner.ensure_persistent_root()?;
        let inner = &mut *inner;
        let report = inner
            .engine
            .run_cleaning_pass(&mut inner.config, &mut inner.state, &inner.resolver);
        inner.stats.record_cleaning(&report);
        Ok(report)
    }

    /// Delete the scratch root, and the persistent root if clean-on-destroy is set.
    ///
    /// The cache stays usable: the next [`get_tile`](Self::get_tile)
    /// recreates the roots.
    pub fn destroy(&self) -> Result<(), TileCacheError> {
        let mut inner = self.lock()?;
        let scratch_removed = inner.resolver.purge_scratch_root();

        let persistent_removed = if inner.config.clean_on_destroy() {
            let removed = inner.resolver.purge_persistent_root();
            inner.state.current_size_bytes = walk::directory_size(inner.resolver.persistent_root());
            removed
        } else {
            false
        };

        info!(
            scratch_removed,
            persistent_removed,
            root = %inner.resolver.persistent_root().display(),
            "Tile cache destroyed"
        );
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Configuration
    // -------------------------------------------------------------------------

    pub fn set_max_cache_size(&self, bytes: u64) -> Result<(), TileCacheError> {
        self.lock()?.config.set_max_cache_size(bytes);
        Ok(())
    }

    pub fn set_max_cache_size_mb(&self, mb: u64) -> Result<(), TileCacheError> {
        self.set_max_cache_size(mb.saturating_mul(MB))
    }

    pub fn set_clean_cache_trigger(&self, bytes: u64) -> Result<(), TileCacheError> {
        self.lock()?.config.set_clean_cache_trigger(bytes);
        Ok(())
    }

    pub fn set_clean_cache_trigger_mb(&self, mb: u64) -> Result<(), TileCacheError> {
        self.set_clean_cache_trigger(mb.saturating_mul(MB))
    }

    pub fn set_max_tile_age_ms(&self, ms: u64) -> Result<(), TileCacheError> {
        self.lock()?.config.set_max_tile_age_ms(ms);
        Ok(())
    }

    /// Turn persistent caching on or off.
    ///
    /// Turning it on also lifts a suspension the eviction engine imposed.
    pub fn set_cache_enabled(&self, enabled: bool) -> Result<(), TileCacheError> {
        let mut inner = self.lock()?;
        inner.config.set_cache_enabled(enabled);
        if enabled {
            inner.state.suspended = false;
        }
        Ok(())
    }

    /// Prefer (or stop preferring) the external medium.
    ///
    /// If this moves the persistent root, the previous root is deleted with
    /// all its tiles before the new one is created. Returns whether it moved.
    /// A root that would overlap the scratch root is rejected and nothing
    /// changes.
    pub fn set_use_external_storage(&self, external: bool) -> Result<bool, TileCacheError> {
        let mut inner = self.lock()?;
        let moved = inner.resolver.set_prefer_external(external)?;
        inner.config.set_use_external_storage(external);
        if !moved {
            return Ok(false);
        }
        inner.initialise_root()?;
        Ok(true)
    }

    /// Rename the cache.
    ///
    /// The previous persistent root is deleted with all its tiles before the
    /// new one is created. An empty or unchanged name does nothing. Returns
    /// whether the cache was renamed.
    pub fn set_cache_name(&self, name: &str) -> Result<bool, TileCacheError> {
        let mut inner = self.lock()?;
        let mut candidate = inner.config.clone();
        if !candidate.set_cache_name(name)? {
            return Ok(false);
        }

        inner.resolver.set_cache_name(candidate.cache_name())?;
        inner.config = candidate;
        inner.initialise_root()?;
        Ok(true)
    }

    pub fn set_tile_size(&self, pixels: i64) -> Result<(), TileCacheError> {
        self.lock()?.config.set_tile_size(pixels);
        Ok(())
    }

    pub fn set_overdraw_factor(&self, factor: f32) -> Result<(), TileCacheError> {
        self.lock()?.config.set_overdraw_factor(factor);
        Ok(())
    }

    pub fn set_screen_ratio(&self, ratio: f32) -> Result<(), TileCacheError> {
        self.lock()?.config.set_screen_ratio(ratio);
        Ok(())
    }

    pub fn set_clean_on_destroy(&self, clean: bool) -> Result<(), TileCacheError> {
        self.lock()?.config.set_clean_on_destroy(clean);
        Ok(())
    }

    /// Set the map data source. Must be an existing `.map` file.
    pub fn set_map_file(&self, path: impl AsRef<Path>) -> Result<(), TileCacheError> {
        self.lock()?.config.set_map_file(path)?;
        Ok(())
    }

    /// Set the render theme. Must be an existing `.xml` file; a bare name is
    /// looked up in the themes directory.
    pub fn set_render_theme(&self, theme: &str) -> Result<(), TileCacheError> {
        self.lock()?.config.set_render_theme(theme)?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    pub fn current_size(&self) -> Result<u64, TileCacheError> {
        Ok(self.lock()?.state.current_size_bytes)
    }

    pub fn max_cache_size(&self) -> Result<u64, TileCacheError> {
        Ok(self.lock()?.config.max_cache_size_bytes())
    }

    pub fn clean_cache_trigger(&self) -> Result<u64, TileCacheError> {
        Ok(self.lock()?.config.clean_cache_trigger_bytes())
    }

    pub fn max_tile_age(&self) -> Result<u64, TileCacheError> {
        Ok(self.lock()?.config.max_tile_age_ms())
    }

    /// Whether new tiles currently go to the persistent root.
    ///
    /// False when the host turned caching off or the eviction engine
    /// suspended it for lack of space.
    pub fn is_cache_enabled(&self) -> Result<bool, TileCacheError> {
        Ok(self.lock()?.is_caching())
    }

    /// Whether the persistent root lives on the external medium.
    pub fn uses_external_storage(&self) -> Result<bool, TileCacheError> {
        Ok(self.lock()?.resolver.uses_external())
    }

    pub fn persistent_root(&self) -> Result<PathBuf, TileCacheError> {
        Ok(self.lock()?.resolver.persistent_root().to_path_buf())
    }

    pub fn scratch_root(&self) -> Result<PathBuf, TileCacheError> {
        Ok(self.lock()?.resolver.scratch_root())
    }

    pub fn configuration(&self) -> Result<CacheConfiguration, TileCacheError> {
        Ok(self.lock()?.config.clone())
    }

    /// Snapshot of the counters and current state.
    pub fn stats(&self) -> Result<CacheStats, TileCacheError> {
        let inner = self.lock()?;
        let mut stats = inner.stats.clone();
        stats.current_size_bytes = inner.state.current_size_bytes;
        stats.max_size_bytes = inner.config.max_cache_size_bytes();
        stats.cache_enabled = inner.is_caching();
        stats.persistent_root = inner.resolver.persistent_root().to_path_buf();
        Ok(stats)
    }
}

impl std::fmt::Debug for TileCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut debug = f.debug_struct("TileCache");
        match self.inner.lock() {
            Ok(inner) => debug
                .field("root", &inner.resolver.persistent_root())
                .field("current_size_bytes", &inner.state.current_size_bytes)
                .field("max_size_bytes", &inner.config.max_cache_size_bytes())
                .finish(),
            Err(_) => debug.field("poisoned", &true).finish(),
        }
    }
}

impl CacheInner {
    fn is_caching(&self) -> bool {
        self.config.is_cache_enabled() && !self.state.suspended
    }

    fn initialise_root(&mut self) -> Result<(), TileCacheError> {
        self.resolver.resolve_root()?;
        self.state.current_size_bytes = walk::directory_size(self.resolver.persistent_root());

        if let Some(report) =
            self.engine
                .check_cache_size(&mut self.config, &mut self.state, &self.resolver)
        {
            self.stats.record_cleaning(&report);
        }
        let usable = self.resolver.usable_space();
        self.engine
            .check_cache_availability(&mut self.config, &mut self.state, usable);
        Ok(())
    }

    /// Recreate the roots if something deleted the persistent root.
    fn ensure_persistent_root(&mut self) -> Result<(), TileCacheError> {
        if self.resolver.persistent_root().is_dir() {
            return Ok(());
        }
        warn!(
            root = %self.resolver.persistent_root().display(),
            "Persistent cache root missing, recreating"
        );
        self.initialise_root()
    }

    fn get_tile(&mut self, key: TileKey) -> Result<PathBuf, TileCacheError> {
        self.ensure_persistent_root()?;
        let caching = self.is_caching();

        if caching {
            let now = self.engine.now_millis();
            if let Some(path) = self.store.lookup(self.resolver.persistent_root(), &key, now) {
                self.stats.record_hit();
                debug!(x = key.x, y = key.y, zoom = key.zoom, "Tile cache hit");
                return Ok(path);
            }
        }
        self.stats.record_miss();

        let bytes = self.render(key)?;

        let root = if caching {
            StorageRoot::persistent(self.resolver.persistent_root())
        } else {
            StorageRoot::scratch(self.resolver.scratch_root())
        };
        let now = self.engine.now_millis();
        let persisted = self
            .store
            .persist(&root, &key, &bytes, now, &mut self.state)?;

        match persisted.kind {
            StorageKind::Persistent => {
                self.stats.record_persistent_write(persisted.bytes_written);
                if let Some(report) =
                    self.engine
                        .check_cache_size(&mut self.config, &mut self.state, &self.resolver)
                {
                    self.stats.record_cleaning(&report);
                }
            }
            StorageKind::Scratch => self.stats.record_scratch_write(persisted.bytes_written),
        }

        Ok(persisted.path)
    }

    fn render(&mut self, key: TileKey) -> Result<Vec<u8>, TileCacheError> {
        let request = RenderRequest {
            key,
            theme: self.config.render_theme().map(Path::to_path_buf),
            map_file: self.config.map_file().map(Path::to_path_buf),
            tile_size: self.config.tile_size(),
            overdraw_factor: self.config.overdraw_factor(),
            screen_ratio: self.config.screen_ratio(),
        };

        self.stats.record_render();
        let reason = match self.renderer.render(&request) {
            Ok(Some(bytes)) => return Ok(bytes),
            Ok(None) => "renderer produced no image".to_string(),
            Err(err) => err.to_string(),
        };

        self.stats.record_render_failure();
        warn!(x = key.x, y = key.y, zoom = key.zoom, reason = %reason, "Tile render failed");
        Err(TileCacheError::RenderFailed { key, reason })
    }
}

