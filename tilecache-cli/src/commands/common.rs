//! Common types and utilities shared across CLI commands.

use std::path::PathBuf;

use clap::Args;
use tilecache::config::{ConfigFile, Size};

/// Command-line overrides for the `[cache]` section.
///
/// CLI takes precedence, then config.
#[derive(Debug, Clone, Default, Args)]
pub struct CacheOverrides {
    /// Cache name (directory under the storage root)
    #[arg(long, global = true)]
    pub name: Option<String>,

    /// Maximum cache size (e.g. 25MB, 1GB)
    #[arg(long, global = true)]
    pub max_size: Option<Size>,

    /// Internal storage directory
    #[arg(long, global = true)]
    pub cache_dir: Option<PathBuf>,

    /// Do not persist tiles; render into the scratch directory instead
    #[arg(long, global = true)]
    pub no_cache: bool,

    /// Keep tiles on internal storage even if external storage is configured
    #[arg(long, global = true)]
    pub internal_only: bool,
}

impl CacheOverrides {
    /// Apply the overrides to a loaded config file.
    pub fn apply(&self, config: &mut ConfigFile) {
        if let Some(name) = &self.name {
            config.cache.name = name.clone();
        }
        if let Some(size) = self.max_size {
            config.cache.max_size = size.0;
        }
        if let Some(dir) = &self.cache_dir {
            config.cache.internal_dir = Some(dir.clone());
        }
        if self.no_cache {
            config.cache.enabled = false;
        }
        if self.internal_only {
            config.cache.external = false;
        }
    }
}
