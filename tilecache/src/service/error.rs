//! Service error types.

use std::io;

use thiserror::Error;

use crate::config::ConfigError;
use crate::coord::{TileKey, MAX_ZOOM};

/// Errors returned by [`TileCache`](super::TileCache) operations.
#[derive(Debug, Error)]
pub enum TileCacheError {
    /// A setter or the initial configuration was rejected
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A tile was requested above the highest supported zoom level
    #[error("Zoom level {zoom} is above the maximum of {}", MAX_ZOOM)]
    InvalidZoom { zoom: u8 },

    /// The renderer failed or produced no image
    #[error("Couldn't render tile, {key}: {reason}")]
    RenderFailed { key: TileKey, reason: String },

    /// A tile or cache directory could not be written
    #[error("Tile cache I/O error: {0}")]
    Io(#[from] io::Error),

    /// A thread panicked while holding the cache lock
    #[error("Failed to acquire tile cache lock")]
    LockPoisoned,
}

impl TileCacheError {
    /// The tile a render failure was reported for.
    pub fn tile_key(&self) -> Option<TileKey> {
        match self {
            Self::RenderFailed { key, .. } => Some(*key),
            _ => None,
        }
    }
}
