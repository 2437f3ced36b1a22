//! Configuration errors raised by path-valued setters.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from configuration setters that cannot be coerced.
///
/// Numeric and boolean settings are normalised instead of rejected; only
/// path-valued settings can fail.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The path does not carry the required file extension
    #[error("Incorrect file path '{}' or file format (should be .{expected})", .path.display())]
    InvalidExtension { path: PathBuf, expected: &'static str },

    /// The referenced file does not exist
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// The cache name cannot be used as a directory name
    #[error("Invalid cache name '{0}': must be a single directory name outside the scratch root")]
    InvalidCacheName(String),
}
