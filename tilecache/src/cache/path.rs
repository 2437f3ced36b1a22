//! Tile path construction.

use crate::coord::TileKey;
use std::path::{Path, PathBuf};

/// Construct the full path for a cached tile.
///
/// Creates a hierarchical path structure:
/// ```text
/// <root>/<zoom>/<x>/<y>.<extension>
/// ```
///
/// # Example
///
/// ```
/// use std::path::PathBuf;
/// use tilecache::cache::tile_path;
/// use tilecache::coord::TileKey;
///
/// let path = tile_path(&PathBuf::from("/cache/mapcache"), &TileKey::new(1, 2, 3), "png");
/// assert_eq!(path, PathBuf::from("/cache/mapcache/3/1/2.png"));
/// ```
pub fn tile_path(root: &Path, key: &TileKey, extension: &str) -> PathBuf {
    column_directory(root, key).join(format!("{}.{}", key.y, extension))
}

/// Directory holding every tile of one column (`<root>/<zoom>/<x>`).
fn column_directory(root: &Path, key: &TileKey) -> PathBuf {
    root.join(key.zoom.to_string()).join(key.x.to_string())
}
