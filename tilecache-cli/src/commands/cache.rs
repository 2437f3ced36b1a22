//! Cache management CLI commands.

use clap::Subcommand;
use tilecache::config::format_size;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Cache action subcommands.
#[derive(Debug, Subcommand)]
pub enum CacheAction {
    /// Show cache location, size and limits
    Stats,
    /// Run a cleaning pass now, deleting tiles older than the maximum age
    Clean,
    /// Delete the scratch directory, and the cache itself if clean_on_destroy is set
    Destroy,
}

/// Run a cache subcommand.
pub fn run(runner: &CliRunner, action: CacheAction) -> Result<(), CliError> {
    let cache = runner.open_cache()?;

    match action {
        CacheAction::Stats => {
            let stats = cache.stats()?;
            println!("Tile cache: {}", stats.persistent_root.display());
            println!(
                "  Storage:  {}",
                if cache.uses_external_storage()? {
                    "external"
                } else {
                    "internal"
                }
            );
            println!(
                "  Caching:  {}",
                if stats.cache_enabled { "on" } else { "off" }
            );
            println!("  Size:     {}", format_size(stats.current_size_bytes));
            println!("  Limit:    {}", format_size(stats.max_size_bytes));
            println!(
                "  Trigger:  {}",
                format_size(cache.clean_cache_trigger()?)
            );
            println!("  Max age:  {} ms", cache.max_tile_age()?);
            println!("  Scratch:  {}", cache.scratch_root()?.display());
            Ok(())
        }
        CacheAction::Clean => {
            let report = cache.clean_now()?;
            if report.rate_limited {
                println!(
                    "Cleaned too recently; limit raised to {}",
                    format_size(report.max_size_after)
                );
            } else {
                println!(
                    "Deleted {} files, freed {}",
                    report.files_deleted,
                    format_size(report.bytes_freed)
                );
            }
            println!(
                "Cache size: {} (limit {})",
                format_size(report.size_after),
                format_size(report.max_size_after)
            );
            Ok(())
        }
        CacheAction::Destroy => {
            let root = cache.persistent_root()?;
            let clean_on_destroy = cache.configuration()?.clean_on_destroy();
            cache.destroy()?;

            if clean_on_destroy {
                println!("Removed tile cache at: {}", root.display());
            } else {
                println!("Removed scratch tiles; kept cache at: {}", root.display());
            }
            Ok(())
        }
    }
}
