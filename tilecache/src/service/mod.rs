//! Tile cache facade.
//!
//! [`TileCache`] is the single entry point hosts use: `get_tile`, the
//! configuration setters and `destroy`. It sequences the storage resolver,
//! tile store, renderer and eviction engine under one lock.
//!
//! # Example
//!
//! ```ignore
//! use tilecache::config::ConfigFile;
//! use tilecache::render::PlaceholderRenderer;
//! use tilecache::service::TileCache;
//!
//! let file = ConfigFile::load()?;
//! let cache = TileCache::builder(file.to_cache_configuration()?)
//!     .medium(file.to_storage())
//!     .build(PlaceholderRenderer::new())?;
//!
//! let path = cache.get_tile(8800, 5373, 14)?;
//! ```

mod builder;
mod error;
mod facade;

pub use builder::TileCacheBuilder;
pub use error::TileCacheError;
pub use facade::TileCache;
