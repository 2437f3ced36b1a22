//! Storage media and persistent root resolution.
//!
//! A [`StorageMedium`] reports where the internal, external and scratch
//! directories live and how much space is usable. The
//! [`StorageLocationResolver`] turns that plus the configured cache name into
//! the persistent root (`<medium root>/<cache name>`) and purges the previous
//! root whenever a reconfiguration moves it.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::walk;
use crate::config::{default_internal_dir, ConfigError, DEFAULT_SCRATCH_DIR_NAME};

/// Which kind of root a tile is written under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    /// Counted toward the size budget; kept until swept or destroyed
    Persistent,
    /// Used while caching is off; never counted, purged on every cleaning pass
    Scratch,
}

/// A directory tiles are written under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageRoot {
    pub path: PathBuf,
    pub kind: StorageKind,
}

impl StorageRoot {
    pub fn persistent(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: StorageKind::Persistent,
        }
    }

    pub fn scratch(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: StorageKind::Scratch,
        }
    }
}

/// The filesystem the cache lives on.
pub trait StorageMedium: Send + Sync {
    /// Root of the always-present internal medium.
    fn internal_root(&self) -> PathBuf;

    /// Root of the external medium, or `None` if it is not available right now.
    fn external_root(&self) -> Option<PathBuf>;

    /// Whether an external medium is configured at all, mounted or not.
    fn has_external(&self) -> bool;

    /// Root of the scratch area.
    fn scratch_root(&self) -> PathBuf;

    /// Bytes usable by the cache on the filesystem holding `path`.
    fn usable_space(&self, path: &Path) -> u64;
}

impl<T: StorageMedium + ?Sized> StorageMedium for Arc<T> {
    fn internal_root(&self) -> PathBuf {
        (**self).internal_root()
    }

    fn external_root(&self) -> Option<PathBuf> {
        (**self).external_root()
    }

    fn has_external(&self) -> bool {
        (**self).has_external()
    }

    fn scratch_root(&self) -> PathBuf {
        (**self).scratch_root()
    }

    fn usable_space(&self, path: &Path) -> u64 {
        (**self).usable_space(path)
    }
}

/// Local directories, with free space read from the filesystem.
///
/// An external directory counts as available only while it exists, which is
/// how a removable card mount appears and disappears.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    internal: PathBuf,
    external: Option<PathBuf>,
    scratch: PathBuf,
}

impl LocalStorage {
    /// Internal root at `internal`, scratch at `<internal>/tmp`, no external medium.
    pub fn new(internal: impl Into<PathBuf>) -> Self {
        let internal = internal.into();
        let scratch = internal.join(DEFAULT_SCRATCH_DIR_NAME);
        Self {
            internal,
            external: None,
            scratch,
        }
    }

    pub fn with_scratch(mut self, scratch: impl Into<PathBuf>) -> Self {
        self.scratch = scratch.into();
        self
    }

    pub fn with_external(mut self, external: Option<PathBuf>) -> Self {
        self.external = external;
        self
    }
}

impl Default for LocalStorage {
    fn default() -> Self {
        Self::new(default_internal_dir())
    }
}

impl StorageMedium for LocalStorage {
    fn internal_root(&self) -> PathBuf {
        self.internal.clone()
    }

    fn external_root(&self) -> Option<PathBuf> {
        self.external.clone().filter(|dir| dir.is_dir())
    }

    fn has_external(&self) -> bool {
        self.external.is_some()
    }

    fn scratch_root(&self) -> PathBuf {
        self.scratch.clone()
    }

    fn usable_space(&self, path: &Path) -> u64 {
        // The root may not exist yet; ask about the nearest existing ancestor.
        let Some(existing) = path.ancestors().find(|p| p.exists()) else {
            return 0;
        };
        match fs2::available_space(existing) {
            Ok(bytes) => bytes,
            Err(err) => {
                debug!(path = %existing.display(), error = %err, "Free space query failed");
                0
            }
        }
    }
}

/// A medium with fixed directories and an adjustable free-space reading.
///
/// Lets a host (or a test) simulate a filling disk or a card being removed.
#[derive(Debug)]
pub struct FixedSpaceMedium {
    internal: PathBuf,
    external: PathBuf,
    scratch: PathBuf,
    external_available: AtomicBool,
    usable: AtomicU64,
}

impl FixedSpaceMedium {
    /// Lay the medium out under `base` (`internal/`, `external/`, `scratch/`)
    /// with the external medium available.
    pub fn new(base: &Path, usable_bytes: u64) -> Self {
        Self {
            internal: base.join("internal"),
            external: base.join("external"),
            scratch: base.join("scratch"),
            external_available: AtomicBool::new(true),
            usable: AtomicU64::new(usable_bytes),
        }
    }

    pub fn set_usable_space(&self, bytes: u64) {
        self.usable.store(bytes, Ordering::SeqCst);
    }

    pub fn set_external_available(&self, available: bool) {
        self.external_available.store(available, Ordering::SeqCst);
    }
}

impl StorageMedium for FixedSpaceMedium {
    fn internal_root(&self) -> PathBuf {
        self.internal.clone()
    }

    fn external_root(&self) -> Option<PathBuf> {
        self.external_available
            .load(Ordering::SeqCst)
            .then(|| self.external.clone())
    }

    fn has_external(&self) -> bool {
        true
    }

    fn scratch_root(&self) -> PathBuf {
        self.scratch.clone()
    }

    fn usable_space(&self, _path: &Path) -> u64 {
        self.usable.load(Ordering::SeqCst)
    }
}

/// Decides the persistent root and keeps the scratch root separate from it.
pub struct StorageLocationResolver {
    medium: Arc<dyn StorageMedium>,
    cache_name: String,
    prefer_external: bool,
    persistent_root: PathBuf,
    uses_external: bool,
    fallback_logged: bool,
}

impl StorageLocationResolver {
    /// Compute the initial roots. Nothing is created on disk yet.
    pub fn new(
        medium: Arc<dyn StorageMedium>,
        cache_name: &str,
        prefer_external: bool,
    ) -> Result<Self, ConfigError> {
        let (medium_root, uses_external) = medium_root(medium.as_ref(), prefer_external);
        let persistent_root = medium_root.join(cache_name);
        check_separate_from_scratch(&persistent_root, &medium.scratch_root(), cache_name)?;

        let mut resolver = Self {
            medium,
            cache_name: cache_name.to_string(),
            prefer_external,
            persistent_root,
            uses_external: false,
            fallback_logged: false,
        };
        resolver.note_medium(uses_external);
        Ok(resolver)
    }

    pub fn persistent_root(&self) -> &Path {
        &self.persistent_root
    }

    pub fn scratch_root(&self) -> PathBuf {
        self.medium.scratch_root()
    }

    /// Whether the persistent root currently lives on the external medium.
    pub fn uses_external(&self) -> bool {
        self.uses_external
    }

    pub fn cache_name(&self) -> &str {
        &self.cache_name
    }

    /// Usable space on the medium holding the persistent root.
    pub fn usable_space(&self) -> u64 {
        self.medium.usable_space(&self.persistent_root)
    }

    /// Re-check the media and create the persistent root (and the scratch
    /// root) if missing. Returns the persistent root.
    ///
    /// A recomputed root that would overlap the scratch root is not adopted;
    /// the current root is kept and recreated instead.
    pub fn resolve_root(&mut self) -> io::Result<&Path> {
        let (medium_root, uses_external) = medium_root(self.medium.as_ref(), self.prefer_external);
        let new_root = medium_root.join(&self.cache_name);
        match check_separate_from_scratch(&new_root, &self.medium.scratch_root(), &self.cache_name) {
            Ok(()) => {
                self.persistent_root = new_root;
                self.note_medium(uses_external);
            }
            Err(err) => warn!(
                root = %new_root.display(),
                kept = %self.persistent_root.display(),
                error = %err,
                "Recomputed cache root overlaps the scratch root, keeping the current root"
            ),
        }

        fs::create_dir_all(&self.persistent_root)?;
        fs::create_dir_all(self.medium.scratch_root())?;
        Ok(&self.persistent_root)
    }

    /// Check that `name` would give a usable persistent root without applying it.
    pub fn validate_cache_name(&self, name: &str) -> Result<(), ConfigError> {
        let (medium_root, _) = medium_root(self.medium.as_ref(), self.prefer_external);
        check_separate_from_scratch(&medium_root.join(name), &self.medium.scratch_root(), name)
    }

    /// Switch to a new cache name.
    ///
    /// If the persistent root moves, the previous root is deleted with
    /// everything below it before the new one is created. Returns whether
    /// the root moved.
    pub fn set_cache_name(&mut self, name: &str) -> Result<bool, ConfigError> {
        self.validate_cache_name(name)?;
        let previous = std::mem::replace(&mut self.cache_name, name.to_string());
        self.relocate().inspect_err(|_| self.cache_name = previous)
    }

    /// Switch the external-medium preference. Same purge rule as
    /// [`set_cache_name`](Self::set_cache_name).
    ///
    /// A root that would overlap the scratch root is rejected and the
    /// preference is left as it was.
    pub fn set_prefer_external(&mut self, prefer_external: bool) -> Result<bool, ConfigError> {
        let previous = std::mem::replace(&mut self.prefer_external, prefer_external);
        self.relocate().inspect_err(|_| self.prefer_external = previous)
    }

    /// Delete the persistent root and everything below it.
    pub fn purge_persistent_root(&self) -> bool {
        walk::purge_tree(&self.persistent_root)
    }

    /// Delete the scratch root and everything below it.
    pub fn purge_scratch_root(&self) -> bool {
        walk::purge_tree(&self.medium.scratch_root())
    }

    fn relocate(&mut self) -> Result<bool, ConfigError> {
        let (medium_root, uses_external) = medium_root(self.medium.as_ref(), self.prefer_external);
        let new_root = medium_root.join(&self.cache_name);
        check_separate_from_scratch(&new_root, &self.medium.scratch_root(), &self.cache_name)?;
        self.note_medium(uses_external);

        if new_root == self.persistent_root {
            return Ok(false);
        }

        let old_root = std::mem::replace(&mut self.persistent_root, new_root);
        let removed = walk::purge_tree(&old_root);
        info!(
            old_root = %old_root.display(),
            new_root = %self.persistent_root.display(),
            removed,
            "Persistent cache root moved; previous root purged"
        );
        Ok(true)
    }

    /// Record which medium the root is on, logging an external fallback once
    /// until the external medium is used again.
    fn note_medium(&mut self, uses_external: bool) {
        self.uses_external = uses_external;
        if !self.prefer_external || uses_external {
            self.fallback_logged = false;
            return;
        }
        if self.fallback_logged {
            return;
        }
        self.fallback_logged = true;

        if self.medium.has_external() {
            warn!("External storage unavailable, using internal storage");
        } else {
            debug!("No external storage configured, using internal storage");
        }
    }
}

impl std::fmt::Debug for StorageLocationResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageLocationResolver")
            .field("cache_name", &self.cache_name)
            .field("prefer_external", &self.prefer_external)
            .field("persistent_root", &self.persistent_root)
            .field("uses_external", &self.uses_external)
            .finish()
    }
}

fn medium_root(medium: &dyn StorageMedium, prefer_external: bool) -> (PathBuf, bool) {
    match medium.external_root().filter(|_| prefer_external) {
        Some(root) => (root, true),
        None => (medium.internal_root(), false),
    }
}

fn check_separate_from_scratch(
    root: &Path,
    scratch: &Path,
    name: &str,
) -> Result<(), ConfigError> {
    if root == scratch || scratch.starts_with(root) || root.starts_with(scratch) {
        return Err(ConfigError::InvalidCacheName(name.to_string()));
    }
    Ok(())
}
