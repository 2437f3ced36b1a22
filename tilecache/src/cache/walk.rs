//! Directory traversal for size scans, age sweeps and subtree purges.
//!
//! All walks are iterative (`walkdir` keeps its own stack of open
//! directories) and never follow symlinks, so a link planted inside a cache
//! root can neither inflate the size count nor lead a purge outside the
//! root. Unreadable entries are skipped with a `debug!` event; none of these
//! functions return errors.

use std::fs;
use std::io;
use std::path::Path;

use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::time::system_time_to_millis;

/// Result of an age sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepResult {
    /// Files whose freshness marker predated the cutoff and were deleted
    pub files_deleted: u64,
    /// Total bytes freed by deleted files
    pub bytes_freed: u64,
    /// Subdirectories removed because the sweep left them empty
    pub dirs_removed: u64,
}

/// Result of a purge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeResult {
    pub files_removed: u64,
    pub dirs_removed: u64,
}

/// Sum the sizes of all regular files below `root`.
///
/// A missing root has size 0.
pub fn directory_size(root: &Path) -> u64 {
    entries(WalkDir::new(root).follow_links(false), "computing size")
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| match entry.metadata() {
            Ok(meta) => Some(meta.len()),
            Err(err) => {
                debug!(path = %entry.path().display(), error = %err, "Skipping unreadable file");
                None
            }
        })
        .fold(0_u64, u64::saturating_add)
}

/// Delete every file below `root` whose modification time is strictly older
/// than `cutoff_millis`, then remove subdirectories the sweep left empty.
///
/// `root` itself is never removed.
pub fn sweep_older_than(root: &Path, cutoff_millis: u64) -> SweepResult {
    let mut result = SweepResult::default();
    let walker = WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .contents_first(true);

    for entry in entries(walker, "sweeping") {
        let file_type = entry.file_type();

        if file_type.is_dir() {
            if is_empty_dir(entry.path()) && remove_dir(entry.path()) {
                result.dirs_removed += 1;
            }
            continue;
        }

        let meta = match entry.metadata() {
            Ok(meta) => meta,
            Err(err) => {
                debug!(path = %entry.path().display(), error = %err, "Skipping unreadable entry");
                continue;
            }
        };
        let modified = match meta.modified() {
            Ok(time) => system_time_to_millis(time),
            Err(err) => {
                debug!(path = %entry.path().display(), error = %err, "No modification time");
                continue;
            }
        };

        if modified < cutoff_millis && remove_file(entry.path()) {
            result.files_deleted += 1;
            if file_type.is_file() {
                result.bytes_freed = result.bytes_freed.saturating_add(meta.len());
            }
        }
    }

    result
}

/// Remove everything below `root`, keeping `root` itself.
pub fn purge_contents(root: &Path) -> PurgeResult {
    let mut result = PurgeResult::default();
    let walker = WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .contents_first(true);

    for entry in entries(walker, "purging") {
        if entry.file_type().is_dir() {
            if remove_dir(entry.path()) {
                result.dirs_removed += 1;
            }
        } else if remove_file(entry.path()) {
            result.files_removed += 1;
        }
    }

    result
}

/// Remove `root` and everything below it.
///
/// Returns `true` if `root` no longer exists afterward.
pub fn purge_tree(root: &Path) -> bool {
    match fs::symlink_metadata(root) {
        Err(err) if err.kind() == io::ErrorKind::NotFound => return true,
        Err(err) => {
            debug!(path = %root.display(), error = %err, "Cannot stat purge root");
            return false;
        }
        Ok(meta) if !meta.is_dir() => return remove_file(root),
        Ok(_) => {}
    }

    purge_contents(root);
    remove_dir(root)
}

fn entries(walker: WalkDir, activity: &'static str) -> impl Iterator<Item = DirEntry> {
    walker.into_iter().filter_map(move |entry| match entry {
        Ok(entry) => Some(entry),
        Err(err) => {
            let not_found = err
                .io_error()
                .is_some_and(|e| e.kind() == io::ErrorKind::NotFound);
            if !not_found {
                debug!(
                    path = ?err.path(),
                    error = %err,
                    activity,
                    "Failed to walk cache directory"
                );
            }
            None
        }
    })
}

fn is_empty_dir(path: &Path) -> bool {
    fs::read_dir(path)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false)
}

fn remove_file(path: &Path) -> bool {
    match fs::remove_file(path) {
        Ok(()) => true,
        Err(err) if err.kind() == io::ErrorKind::NotFound => false,
        Err(err) => {
            debug!(path = %path.display(), error = %err, "Failed to remove file");
            false
        }
    }
}

fn remove_dir(path: &Path) -> bool {
    match fs::remove_dir(path) {
        Ok(()) => true,
        Err(err) => {
            debug!(path = %path.display(), error = %err, "Failed to remove directory");
            false
        }
    }
}
