//! tilecache - Bounded on-disk cache for rendered map tiles
//!
//! This library keeps rendered tiles on disk under `<root>/<zoom>/<x>/<y>.<ext>`,
//! renders missing tiles through a pluggable renderer, and keeps the cache
//! within a size budget and the free space of its storage medium.
//!
//! # High-Level API
//!
//! For most use cases, the [`service`] module provides a simplified facade:
//!
//! ```ignore
//! use tilecache::config::CacheConfiguration;
//! use tilecache::render::PlaceholderRenderer;
//! use tilecache::service::TileCache;
//!
//! let cache = TileCache::new(CacheConfiguration::default(), PlaceholderRenderer::new())?;
//! let path = cache.get_tile(1, 2, 3)?;
//! ```

pub mod cache;
pub mod config;
pub mod coord;
pub mod logging;
pub mod render;
pub mod service;
pub mod time;

/// Version of the tilecache library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
