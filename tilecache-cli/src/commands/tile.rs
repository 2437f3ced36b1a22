//! Single tile lookup.

use tilecache::config::format_size;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Fetch one tile, rendering it on a miss, and print its path.
pub fn run(runner: &CliRunner, x: u32, y: u32, zoom: u8) -> Result<(), CliError> {
    let cache = runner.open_cache()?;
    let path = cache.get_tile(x, y, zoom)?;

    println!("{}", path.display());

    let stats = cache.stats()?;
    let outcome = if stats.hits > 0 { "hit" } else { "rendered" };
    eprintln!(
        "Tile {}/{}/{} {} (cache {} of {})",
        zoom,
        x,
        y,
        outcome,
        format_size(stats.current_size_bytes),
        format_size(stats.max_size_bytes)
    );
    Ok(())
}
