//! Validation of path-valued settings (map data source, render theme).

use std::path::{Path, PathBuf};

use super::defaults::{MAP_FILE_EXTENSION, THEME_FILE_EXTENSION};
use super::error::ConfigError;

/// Validate a map data source path.
///
/// The path must end in `.map` and point at an existing file.
pub fn validate_map_file(path: impl AsRef<Path>) -> Result<PathBuf, ConfigError> {
    let path = path.as_ref();
    require_extension(path, MAP_FILE_EXTENSION)?;
    require_exists(path)?;
    Ok(path.to_path_buf())
}

/// Resolve and validate a render theme path.
///
/// A bare file name (no directory component) is looked up in `themes_dir`,
/// the directory the asset provisioner staged themes into. The result must
/// end in `.xml` and exist.
///
/// ```
/// use std::path::Path;
/// use tilecache::config::{resolve_render_theme, ConfigError};
///
/// let err = resolve_render_theme("osmarender.txt", Path::new("/themes")).unwrap_err();
/// assert!(matches!(err, ConfigError::InvalidExtension { .. }));
/// ```
pub fn resolve_render_theme(theme: &str, themes_dir: &Path) -> Result<PathBuf, ConfigError> {
    let candidate = Path::new(theme);
    require_extension(candidate, THEME_FILE_EXTENSION)?;

    let resolved = if is_bare_name(candidate) {
        themes_dir.join(candidate)
    } else {
        candidate.to_path_buf()
    };

    require_exists(&resolved)?;
    Ok(resolved)
}

fn is_bare_name(path: &Path) -> bool {
    path.parent().map_or(true, |p| p.as_os_str().is_empty())
}

fn require_extension(path: &Path, expected: &'static str) -> Result<(), ConfigError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext == expected && path.file_stem().is_some() => Ok(()),
        _ => Err(ConfigError::InvalidExtension {
            path: path.to_path_buf(),
            expected,
        }),
    }
}

fn require_exists(path: &Path) -> Result<(), ConfigError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(ConfigError::FileNotFound(path.to_path_buf()))
    }
}
