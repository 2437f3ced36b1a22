//! Tile lookup and persistence.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use filetime::set_file_mtime;
use tracing::debug;

use super::eviction::CacheState;
use super::path::tile_path;
use super::storage::{StorageKind, StorageRoot};
use crate::coord::TileKey;
use crate::time::millis_to_file_time;

/// A tile written by [`TileStore::persist`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTile {
    pub path: PathBuf,
    pub kind: StorageKind,
    pub bytes_written: u64,
}

/// Maps tile keys to files under a root.
#[derive(Debug, Clone)]
pub struct TileStore {
    extension: String,
}

impl TileStore {
    /// Create a store writing `<y>.<extension>` files.
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
        }
    }

    /// Path of `key` under `root`.
    pub fn path_for(&self, root: &Path, key: &TileKey) -> PathBuf {
        tile_path(root, key, &self.extension)
    }

    /// Look up a cached tile under the persistent root.
    ///
    /// Existence is the only freshness test. On a hit the file's modification
    /// time is set to `now_millis` so the age sweep treats it as recently used.
    pub fn lookup(&self, persistent_root: &Path, key: &TileKey, now_millis: u64) -> Option<PathBuf> {
        let path = self.path_for(persistent_root, key);
        if !path.is_file() {
            return None;
        }

        if let Err(err) = set_file_mtime(&path, millis_to_file_time(now_millis)) {
            debug!(path = %path.display(), error = %err, "Failed to touch cached tile");
        }
        Some(path)
    }

    /// Write rendered tile bytes under `root`.
    ///
    /// Persistent writes replace any earlier file and move
    /// `state.current_size_bytes` by the size difference. Scratch writes delete
    /// any earlier file first and leave the counter alone. On failure nothing
    /// is counted and a partially written file is removed.
    pub fn persist(
        &self,
        root: &StorageRoot,
        key: &TileKey,
        bytes: &[u8],
        now_millis: u64,
        state: &mut CacheState,
    ) -> io::Result<PersistedTile> {
        let path = self.path_for(&root.path, key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let replaced_bytes = match root.kind {
            StorageKind::Persistent => fs::metadata(&path).map(|m| m.len()).unwrap_or(0),
            StorageKind::Scratch => {
                match fs::remove_file(&path) {
                    Ok(()) => {}
                    Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                    Err(err) => return Err(err),
                }
                0
            }
        };

        if let Err(err) = write_file(&path, bytes) {
            if let Err(cleanup) = fs::remove_file(&path) {
                debug!(path = %path.display(), error = %cleanup, "Failed to remove partial tile");
            }
            return Err(err);
        }

        if let Err(err) = set_file_mtime(&path, millis_to_file_time(now_millis)) {
            debug!(path = %path.display(), error = %err, "Failed to set tile modification time");
        }

        let bytes_written = bytes.len() as u64;
        if root.kind == StorageKind::Persistent {
            state.current_size_bytes = state
                .current_size_bytes
                .saturating_sub(replaced_bytes)
                .saturating_add(bytes_written);
        }

        debug!(
            path = %path.display(),
            bytes = bytes_written,
            kind = ?root.kind,
            "Tile written"
        );

        Ok(PersistedTile {
            path,
            kind: root.kind,
            bytes_written,
        })
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.flush()
}
