//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use ini::{Ini, Properties};
use std::path::PathBuf;

use super::file::ConfigFileError;
use super::settings::ConfigFile;
use super::size::parse_size;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [cache] section
    if let Some(section) = ini.section(Some("cache")) {
        if let Some(v) = non_empty(section, "name") {
            config.cache.name = v.to_string();
        }
        if let Some(v) = section.get("enabled") {
            config.cache.enabled = parse_bool("cache", "enabled", v)?;
        }
        if let Some(v) = section.get("external") {
            config.cache.external = parse_bool("cache", "external", v)?;
        }
        if let Some(v) = section.get("max_size") {
            config.cache.max_size = parse_size(v)
                .map_err(|_| invalid("cache", "max_size", v, "expected format like '25MB' or '1GB'"))?;
        }
        if let Some(v) = section.get("clean_trigger") {
            config.cache.clean_trigger = parse_size(v)
                .map_err(|_| invalid("cache", "clean_trigger", v, "expected format like '5MB'"))?;
        }
        if let Some(v) = section.get("max_tile_age_ms") {
            config.cache.max_tile_age_ms = v.trim().parse().map_err(|_| {
                invalid(
                    "cache",
                    "max_tile_age_ms",
                    v,
                    "must be a non-negative integer (milliseconds)",
                )
            })?;
        }
        if let Some(v) = section.get("clean_on_destroy") {
            config.cache.clean_on_destroy = parse_bool("cache", "clean_on_destroy", v)?;
        }
        config.cache.internal_dir = non_empty(section, "internal_dir").map(expand_tilde);
        config.cache.external_dir = non_empty(section, "external_dir").map(expand_tilde);
        config.cache.scratch_dir = non_empty(section, "scratch_dir").map(expand_tilde);
    }

    // [render] section
    if let Some(section) = ini.section(Some("render")) {
        config.render.map_file = non_empty(section, "map_file").map(expand_tilde);
        config.render.theme = non_empty(section, "theme").map(str::to_string);
        config.render.themes_dir = non_empty(section, "themes_dir").map(expand_tilde);
        if let Some(v) = section.get("tile_size") {
            config.render.tile_size = v
                .trim()
                .parse()
                .map_err(|_| invalid("render", "tile_size", v, "must be an integer (pixels)"))?;
        }
        if let Some(v) = section.get("overdraw_factor") {
            config.render.overdraw_factor = parse_float("render", "overdraw_factor", v)?;
        }
        if let Some(v) = section.get("screen_ratio") {
            config.render.screen_ratio = parse_float("render", "screen_ratio", v)?;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = non_empty(section, "directory") {
            config.logging.directory = expand_tilde(v);
        }
        if let Some(v) = non_empty(section, "file") {
            config.logging.file = v.to_string();
        }
    }

    Ok(config)
}

fn non_empty<'a>(section: &'a Properties, key: &str) -> Option<&'a str> {
    section.get(key).map(str::trim).filter(|v| !v.is_empty())
}

fn parse_bool(section: &str, key: &str, value: &str) -> Result<bool, ConfigFileError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(invalid(section, key, value, "must be true or false")),
    }
}

fn parse_float(section: &str, key: &str, value: &str) -> Result<f32, ConfigFileError> {
    value
        .trim()
        .parse::<f32>()
        .ok()
        .filter(|v| v.is_finite() && *v > 0.0)
        .ok_or_else(|| invalid(section, key, value, "must be a positive number"))
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Expand a leading `~` to the user's home directory.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path)),
        None if path == "~" => dirs::home_dir().unwrap_or_else(|| PathBuf::from(path)),
        None => PathBuf::from(path),
    }
}
