//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::path::PathBuf;
use std::process;
use tilecache::config::{ConfigError, ConfigFileError};
use tilecache::service::TileCacheError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration file could not be read, written or applied
    Config(String),
    /// Failed to open the tile cache
    CacheOpen(TileCacheError),
    /// A cache operation failed
    Cache(TileCacheError),
    /// Refused to overwrite an existing config file
    ConfigExists(PathBuf),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::CacheOpen(TileCacheError::Config(_)) | CliError::Config(_) => {
                eprintln!();
                eprintln!("Check the settings with: tilecache config show");
            }
            CliError::ConfigExists(_) => {
                eprintln!();
                eprintln!("Use --force to replace it with the defaults.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::CacheOpen(e) => write!(f, "Failed to open tile cache: {}", e),
            CliError::Cache(e) => write!(f, "{}", e),
            CliError::ConfigExists(path) => {
                write!(f, "Config file already exists: {}", path.display())
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::CacheOpen(e) | CliError::Cache(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TileCacheError> for CliError {
    fn from(e: TileCacheError) -> Self {
        CliError::Cache(e)
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}
