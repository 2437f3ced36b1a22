//! INI serialization logic for converting `ConfigFile` → INI string.
//!
//! This module contains the `to_config_string()` function that produces
//! the commented INI representation written to `config.ini`.

use std::path::Path;

use super::settings::ConfigFile;
use super::size::format_size;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let cache = &config.cache;
    let render = &config.render;

    let internal_dir = optional_path(cache.internal_dir.as_deref());
    let external_dir = optional_path(cache.external_dir.as_deref());
    let scratch_dir = optional_path(cache.scratch_dir.as_deref());
    let map_file = optional_path(render.map_file.as_deref());
    let themes_dir = optional_path(render.themes_dir.as_deref());
    let theme = render.theme.as_deref().unwrap_or("");

    format!(
        r#"[cache]
; Cache name; tiles are stored under <storage root>/<name>
name = {}
; Keep rendered tiles in the persistent cache (false routes them to scratch)
enabled = {}
; Prefer the external storage medium when it is mounted
external = {}
; Maximum persistent cache size (e.g. 25MB, 1GB)
max_size = {}
; Free-space floor that triggers cleaning; kept below max_size
clean_trigger = {}
; Tiles older than this (milliseconds, minimum 15000) may be swept
max_tile_age_ms = {}
; Delete the persistent cache directory on destroy
clean_on_destroy = {}
; Internal storage root (leave empty for the platform cache directory)
internal_dir = {}
; External storage root, e.g. a removable card mount (leave empty for none)
external_dir = {}
; Scratch directory for tiles rendered while caching is off
scratch_dir = {}

[render]
; Map data source (.map)
map_file = {}
; Render theme (.xml); a bare file name is looked up in themes_dir
theme = {}
; Directory holding staged render themes
themes_dir = {}
; Tile edge length in pixels
tile_size = {}
; Overdraw factor handed to the renderer
overdraw_factor = {}
; Screen ratio handed to the renderer
screen_ratio = {}

[logging]
; Log directory
directory = {}
; Log file name (truncated on each start)
file = {}
"#,
        cache.name,
        cache.enabled,
        cache.external,
        format_size(cache.max_size),
        format_size(cache.clean_trigger),
        cache.max_tile_age_ms,
        cache.clean_on_destroy,
        internal_dir,
        external_dir,
        scratch_dir,
        map_file,
        theme,
        themes_dir,
        render.tile_size,
        render.overdraw_factor,
        render.screen_ratio,
        path_to_string(&config.logging.directory),
        config.logging.file,
    )
}

fn optional_path(path: Option<&Path>) -> String {
    path.map(path_to_string).unwrap_or_default()
}

fn path_to_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
