//! Tile key types.
//!
//! A [`TileKey`] identifies one rendered tile in the slippy-map grid. The
//! cache never does projection math; keys arrive from the host already in
//! tile space.

use std::fmt;

/// Highest zoom level accepted by the cache.
pub const MAX_ZOOM: u8 = 30;

/// Tile coordinates identifying a rendered tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileKey {
    /// X coordinate (east-west), 0 at west
    pub x: u32,
    /// Y coordinate (north-south), 0 at north
    pub y: u32,
    /// Zoom level
    pub zoom: u8,
}

impl TileKey {
    /// Create a new tile key.
    pub const fn new(x: u32, y: u32, zoom: u8) -> Self {
        Self { x, y, zoom }
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x: {}, y: {}, zoom: {}", self.x, self.y, self.zoom)
    }
}
