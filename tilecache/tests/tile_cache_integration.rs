//! Integration tests for the tile cache facade.
//!
//! These tests drive `TileCache` end to end on a temporary medium:
//! - Miss, render, persist and the hit that follows
//! - Routing to the scratch root while caching is off
//! - Relocation on rename and external-storage toggles
//! - Failure paths leaving the size counter untouched
//! - Recovery after the roots disappear
//!
//! Run with: `cargo test --test tile_cache_integration`

mod common;

use std::fs;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use common::{
    file_count, mtime_millis, set_mtime, EmptyRenderer, FailingRenderer, Harness,
    RecordingRenderer, PLENTY_OF_SPACE,
};
use tempfile::TempDir;
use tilecache::cache::{FixedSpaceMedium, LocalStorage};
use tilecache::config::{CacheConfiguration, ConfigError};
use tilecache::coord::TileKey;
use tilecache::service::{TileCache, TileCacheError};
use tilecache::time::ManualClock;

const TILE_BYTES: usize = 40 * 1024;

// =============================================================================
// Lookup and persist
// =============================================================================

#[test]
fn test_miss_renders_and_persists_then_hit_reuses_file() {
    let renderer = RecordingRenderer::new(TILE_BYTES);
    let h = Harness::new(CacheConfiguration::default(), renderer.clone());

    let path = h.cache.get_tile(1, 2, 3).unwrap();

    assert!(path.ends_with("mapcache/3/1/2.png"));
    assert!(path.starts_with(h.cache.persistent_root().unwrap()));
    assert_eq!(fs::metadata(&path).unwrap().len(), TILE_BYTES as u64);
    assert_eq!(h.cache.current_size().unwrap(), TILE_BYTES as u64);
    assert_eq!(renderer.calls(), 1);

    h.clock.advance(Duration::from_secs(10));
    let again = h.cache.get_tile(1, 2, 3).unwrap();

    assert_eq!(again, path);
    assert_eq!(renderer.calls(), 1, "hit must not render");
    assert_eq!(h.cache.current_size().unwrap(), TILE_BYTES as u64);
    assert_eq!(mtime_millis(&path) / 1000, h.now() / 1000);
}

#[test]
fn test_hit_returns_bytes_the_renderer_produced() {
    let renderer = RecordingRenderer::new(512);
    let h = Harness::new(CacheConfiguration::default(), renderer);

    let first = h.cache.get_tile(7, 9, 12).unwrap();
    let written = fs::read(&first).unwrap();
    let second = h.cache.get_tile(7, 9, 12).unwrap();

    assert_eq!(fs::read(second).unwrap(), written);
    assert_eq!(written, vec![1u8; 512]);
}

#[test]
fn test_hit_refreshes_modification_time_of_old_tile() {
    let h = Harness::new(CacheConfiguration::default(), RecordingRenderer::new(64));
    let path = h.cache.get_tile(0, 0, 0).unwrap();

    let long_ago = h.now() - 3_600_000;
    set_mtime(&path, long_ago);
    h.cache.get_tile(0, 0, 0).unwrap();

    assert!(mtime_millis(&path) > long_ago + 3_000_000);
}

#[test]
fn test_distinct_tiles_accumulate_in_counter() {
    let h = Harness::new(CacheConfiguration::default(), RecordingRenderer::new(1000));

    h.cache.get_tile(1, 1, 5).unwrap();
    h.cache.get_tile(1, 2, 5).unwrap();
    h.cache.get_tile(2, 1, 6).unwrap();

    assert_eq!(h.cache.current_size().unwrap(), 3000);
    assert_eq!(file_count(&h.cache.persistent_root().unwrap()), 3);
}

#[test]
fn test_existing_tiles_are_counted_at_startup() {
    let temp = TempDir::new().unwrap();
    let medium = Arc::new(FixedSpaceMedium::new(temp.path(), PLENTY_OF_SPACE));
    let root = temp.path().join("external/mapcache/4/3");
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join("2.png"), vec![0u8; 2048]).unwrap();

    let renderer = RecordingRenderer::new(10);
    let cache = TileCache::builder(CacheConfiguration::default())
        .medium(medium)
        .build(renderer.clone())
        .unwrap();

    assert_eq!(cache.current_size().unwrap(), 2048);
    cache.get_tile(3, 2, 4).unwrap();
    assert_eq!(renderer.calls(), 0);
}

#[test]
fn test_stats_track_hits_misses_and_writes() {
    let h = Harness::new(CacheConfiguration::default(), RecordingRenderer::new(100));

    h.cache.get_tile(1, 1, 1).unwrap();
    h.cache.get_tile(1, 1, 1).unwrap();
    h.cache.get_tile(2, 2, 2).unwrap();

    let stats = h.cache.stats().unwrap();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 2);
    assert_eq!(stats.renders, 2);
    assert_eq!(stats.persistent_writes, 2);
    assert_eq!(stats.bytes_written, 200);
    assert_eq!(stats.current_size_bytes, 200);
    assert!(stats.cache_enabled);
}

#[test]
fn test_concurrent_requests_for_one_tile_render_once() {
    let renderer = RecordingRenderer::new(256);
    let h = Harness::new(CacheConfiguration::default(), renderer.clone());
    let cache = Arc::new(h.cache);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || cache.get_tile(10, 20, 8).unwrap())
        })
        .collect();
    let paths: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(renderer.calls(), 1);
    assert!(paths.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(cache.current_size().unwrap(), 256);
}

// =============================================================================
// Caching disabled
// =============================================================================

#[test]
fn test_disabled_cache_renders_every_time_into_scratch() {
    let renderer = RecordingRenderer::new(300);
    let h = Harness::new(CacheConfiguration::default(), renderer.clone());
    h.cache.set_cache_enabled(false).unwrap();

    let first = h.cache.get_tile(4, 5, 6).unwrap();
    let second = h.cache.get_tile(4, 5, 6).unwrap();

    assert_eq!(renderer.calls(), 2);
    assert_eq!(first, second);
    assert!(first.starts_with(h.cache.scratch_root().unwrap()));
    assert_eq!(fs::read(&second).unwrap(), vec![2u8; 300]);
    assert_eq!(file_count(&h.cache.scratch_root().unwrap()), 1);
    assert_eq!(h.cache.current_size().unwrap(), 0);
    assert!(!h.cache.is_cache_enabled().unwrap());
}

#[test]
fn test_disabled_cache_ignores_persistent_copy() {
    let renderer = RecordingRenderer::new(50);
    let h = Harness::new(CacheConfiguration::default(), renderer.clone());
    let persistent = h.cache.get_tile(1, 1, 1).unwrap();

    h.cache.set_cache_enabled(false).unwrap();
    let scratch = h.cache.get_tile(1, 1, 1).unwrap();

    assert_ne!(persistent, scratch);
    assert_eq!(renderer.calls(), 2);
    assert!(persistent.exists());
}

#[test]
fn test_reenabled_cache_writes_persistent_again() {
    let h = Harness::new(CacheConfiguration::default(), RecordingRenderer::new(50));
    h.cache.set_cache_enabled(false).unwrap();
    h.cache.get_tile(1, 1, 1).unwrap();

    h.cache.set_cache_enabled(true).unwrap();
    let path = h.cache.get_tile(1, 1, 1).unwrap();

    assert!(path.starts_with(h.cache.persistent_root().unwrap()));
    assert_eq!(h.cache.current_size().unwrap(), 50);
}

// =============================================================================
// Relocation
// =============================================================================

#[test]
fn test_rename_deletes_previous_root() {
    let h = Harness::new(CacheConfiguration::default(), RecordingRenderer::new(100));
    h.cache.get_tile(1, 2, 3).unwrap();
    h.cache.get_tile(2, 3, 4).unwrap();
    let old_root = h.cache.persistent_root().unwrap();

    assert!(h.cache.set_cache_name("altcache").unwrap());

    let new_root = h.cache.persistent_root().unwrap();
    assert!(!old_root.exists());
    assert!(new_root.ends_with("altcache"));
    assert!(new_root.is_dir());
    assert_eq!(h.cache.current_size().unwrap(), 0);
    assert!(h.cache.get_tile(1, 2, 3).unwrap().ends_with("altcache/3/1/2.png"));
}

#[test]
fn test_rename_to_same_or_empty_name_keeps_tiles() {
    let h = Harness::new(CacheConfiguration::default(), RecordingRenderer::new(100));
    let path = h.cache.get_tile(1, 2, 3).unwrap();

    assert!(!h.cache.set_cache_name("mapcache").unwrap());
    assert!(!h.cache.set_cache_name("").unwrap());

    assert!(path.exists());
    assert_eq!(h.cache.configuration().unwrap().cache_name(), "mapcache");
}

#[test]
fn test_invalid_cache_name_leaves_state_unchanged() {
    let h = Harness::new(CacheConfiguration::default(), RecordingRenderer::new(100));
    let path = h.cache.get_tile(1, 2, 3).unwrap();
    let root = h.cache.persistent_root().unwrap();

    let err = h.cache.set_cache_name("a/b").unwrap_err();

    assert!(matches!(
        err,
        TileCacheError::Config(ConfigError::InvalidCacheName(_))
    ));
    assert_eq!(h.cache.persistent_root().unwrap(), root);
    assert!(path.exists());
    assert_eq!(h.cache.current_size().unwrap(), 100);
}

#[test]
fn test_external_toggle_moves_root_to_internal() {
    let h = Harness::new(CacheConfiguration::default(), RecordingRenderer::new(100));
    assert!(h.cache.uses_external_storage().unwrap());
    h.cache.get_tile(1, 1, 1).unwrap();
    let external_root = h.cache.persistent_root().unwrap();

    assert!(h.cache.set_use_external_storage(false).unwrap());

    assert!(!external_root.exists());
    assert!(!h.cache.uses_external_storage().unwrap());
    assert!(h
        .cache
        .persistent_root()
        .unwrap()
        .starts_with(h.temp.path().join("internal")));
    assert!(!h.cache.set_use_external_storage(false).unwrap());
}

#[test]
fn test_unavailable_external_falls_back_to_internal() {
    let temp = TempDir::new().unwrap();
    let medium = Arc::new(FixedSpaceMedium::new(temp.path(), PLENTY_OF_SPACE));
    medium.set_external_available(false);

    let cache = TileCache::builder(CacheConfiguration::default())
        .medium(medium)
        .clock(Arc::new(ManualClock::starting_now()))
        .build(RecordingRenderer::new(10))
        .unwrap();

    assert!(!cache.uses_external_storage().unwrap());
    assert_eq!(
        cache.persistent_root().unwrap(),
        temp.path().join("internal/mapcache")
    );
}

#[test]
fn test_external_root_holding_scratch_is_rejected() {
    let temp = TempDir::new().unwrap();
    let card = temp.path().join("card");
    fs::create_dir_all(&card).unwrap();
    let storage = LocalStorage::new(temp.path().join("internal"))
        .with_external(Some(card.clone()))
        .with_scratch(card.join("mapcache/tmp"));
    let cache = TileCache::builder(CacheConfiguration::default().with_external_storage(false))
        .medium(storage)
        .clock(Arc::new(ManualClock::starting_now()))
        .build(RecordingRenderer::new(1000))
        .unwrap();
    let root = cache.persistent_root().unwrap();

    cache.set_cache_enabled(false).unwrap();
    cache.get_tile(1, 2, 3).unwrap();
    cache.set_cache_enabled(true).unwrap();

    let err = cache.set_use_external_storage(true).unwrap_err();

    assert!(matches!(
        err,
        TileCacheError::Config(ConfigError::InvalidCacheName(_))
    ));
    assert_eq!(cache.persistent_root().unwrap(), root);
    assert_eq!(root, temp.path().join("internal/mapcache"));
    assert!(!cache.uses_external_storage().unwrap());
    assert!(!cache.configuration().unwrap().use_external_storage());
    assert_eq!(cache.current_size().unwrap(), 0);
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn test_render_failure_names_tile_and_writes_nothing() {
    let h = Harness::new(CacheConfiguration::default(), FailingRenderer);

    let err = h.cache.get_tile(1, 2, 3).unwrap_err();

    assert_eq!(err.tile_key(), Some(TileKey::new(1, 2, 3)));
    assert!(err.to_string().contains("map database closed"));
    assert_eq!(h.cache.current_size().unwrap(), 0);
    assert_eq!(file_count(&h.cache.persistent_root().unwrap()), 0);
    assert_eq!(h.cache.stats().unwrap().render_failures, 1);
}

#[test]
fn test_zoom_above_max_is_rejected_without_rendering() {
    let renderer = RecordingRenderer::new(100);
    let h = Harness::new(CacheConfiguration::default(), renderer.clone());

    let err = h.cache.get_tile(0, 0, 31).unwrap_err();

    assert!(matches!(err, TileCacheError::InvalidZoom { zoom: 31 }));
    assert_eq!(renderer.calls(), 0);
    assert_eq!(file_count(&h.cache.persistent_root().unwrap()), 0);
    assert!(h.cache.get_tile(0, 0, 30).is_ok());
}

#[test]
fn test_renderer_without_image_is_a_failure() {
    let h = Harness::new(CacheConfiguration::default(), EmptyRenderer);

    let err = h.cache.get_tile(0, 0, 0).unwrap_err();

    assert!(matches!(err, TileCacheError::RenderFailed { .. }));
    assert_eq!(file_count(&h.cache.persistent_root().unwrap()), 0);
}

#[test]
fn test_write_failure_leaves_counter_unchanged() {
    let h = Harness::new(CacheConfiguration::default(), RecordingRenderer::new(100));
    h.cache.get_tile(9, 9, 9).unwrap();
    fs::write(h.cache.persistent_root().unwrap().join("3"), b"blocker").unwrap();

    let err = h.cache.get_tile(1, 2, 3).unwrap_err();

    assert!(matches!(err, TileCacheError::Io(_)));
    assert_eq!(h.cache.current_size().unwrap(), 100);
}

#[test]
fn test_invalid_paths_are_rejected() {
    let h = Harness::new(CacheConfiguration::default(), RecordingRenderer::new(10));
    let before = h.cache.configuration().unwrap();

    let map = h.cache.set_map_file("/data/region.pbf").unwrap_err();
    let theme = h.cache.set_render_theme("missing-theme.xml").unwrap_err();

    assert!(matches!(
        map,
        TileCacheError::Config(ConfigError::InvalidExtension { .. })
    ));
    assert!(matches!(
        theme,
        TileCacheError::Config(ConfigError::FileNotFound(_))
    ));
    assert_eq!(h.cache.configuration().unwrap(), before);
}

// =============================================================================
// Render parameters
// =============================================================================

#[test]
fn test_render_parameters_reach_renderer() {
    let themes = TempDir::new().unwrap();
    fs::write(themes.path().join("osmarender.xml"), "<rendertheme/>").unwrap();
    let map = themes.path().join("region.map");
    fs::write(&map, b"map").unwrap();

    let renderer = RecordingRenderer::new(10);
    let config = CacheConfiguration::default().with_themes_dir(themes.path());
    let h = Harness::new(config, renderer.clone());

    h.cache.set_render_theme("osmarender.xml").unwrap();
    h.cache.set_map_file(&map).unwrap();
    h.cache.set_tile_size(512).unwrap();
    h.cache.set_screen_ratio(2.0).unwrap();
    h.cache.get_tile(1, 1, 1).unwrap();

    let request = renderer.last_request().unwrap();
    assert_eq!(request.key, TileKey::new(1, 1, 1));
    assert_eq!(request.theme, Some(themes.path().join("osmarender.xml")));
    assert_eq!(request.map_file, Some(map));
    assert_eq!(request.tile_size, 512);
    assert_eq!(request.screen_ratio, 2.0);
}

#[test]
fn test_negative_tile_size_renders_default_size() {
    let renderer = RecordingRenderer::new(10);
    let h = Harness::new(CacheConfiguration::default(), renderer.clone());

    h.cache.set_tile_size(-1).unwrap();
    h.cache.get_tile(2, 2, 2).unwrap();

    assert_eq!(renderer.last_request().unwrap().tile_size, 256);
}

// =============================================================================
// Recovery and teardown
// =============================================================================

#[test]
fn test_deleted_root_is_recreated_on_next_request() {
    let renderer = RecordingRenderer::new(100);
    let h = Harness::new(CacheConfiguration::default(), renderer.clone());
    h.cache.get_tile(1, 2, 3).unwrap();
    let root = h.cache.persistent_root().unwrap();

    fs::remove_dir_all(&root).unwrap();
    let path = h.cache.get_tile(1, 2, 3).unwrap();

    assert!(path.exists());
    assert_eq!(renderer.calls(), 2);
    assert_eq!(h.cache.current_size().unwrap(), 100);
}

#[test]
fn test_destroy_removes_both_roots_and_cache_recovers() {
    let h = Harness::new(CacheConfiguration::default(), RecordingRenderer::new(100));
    h.cache.get_tile(1, 1, 1).unwrap();
    h.cache.set_cache_enabled(false).unwrap();
    h.cache.get_tile(2, 2, 2).unwrap();
    let persistent = h.cache.persistent_root().unwrap();
    let scratch = h.cache.scratch_root().unwrap();

    h.cache.destroy().unwrap();

    assert!(!persistent.exists());
    assert!(!scratch.exists());
    assert_eq!(h.cache.current_size().unwrap(), 0);

    h.cache.destroy().unwrap();
    h.cache.set_cache_enabled(true).unwrap();
    assert!(h.cache.get_tile(1, 1, 1).unwrap().exists());
}

#[test]
fn test_destroy_keeps_tiles_without_clean_on_destroy() {
    let config = CacheConfiguration::default().with_clean_on_destroy(false);
    let h = Harness::new(config, RecordingRenderer::new(100));
    let path = h.cache.get_tile(1, 1, 1).unwrap();
    h.cache.set_cache_enabled(false).unwrap();
    h.cache.get_tile(2, 2, 2).unwrap();

    h.cache.destroy().unwrap();

    assert!(path.exists());
    assert!(!h.cache.scratch_root().unwrap().exists());
    assert_eq!(h.cache.current_size().unwrap(), 100);
}
