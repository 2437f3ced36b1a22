//! Configuration for the tile cache.
//!
//! Two layers live here:
//!
//! - [`CacheConfiguration`]: the normalised runtime settings the cache
//!   operates on. Numeric setters coerce out-of-range values instead of
//!   failing; only path-valued settings return [`ConfigError`].
//! - [`ConfigFile`]: the `~/.tilecache/config.ini` representation, which
//!   converts into a `CacheConfiguration` and a storage medium.
//!
//! # Example
//!
//! ```
//! use tilecache::config::CacheConfiguration;
//!
//! let config = CacheConfiguration::default()
//!     .with_max_cache_size_mb(4)
//!     .with_clean_cache_trigger_mb(10);
//!
//! // The trigger always stays below the cap.
//! assert_eq!(config.clean_cache_trigger_bytes(), 2 * 1024 * 1024);
//! ```

mod cache;
mod defaults;
mod error;
mod file;
mod parser;
mod paths;
mod settings;
mod size;
mod writer;

pub use cache::CacheConfiguration;
pub use defaults::*;
pub use error::ConfigError;
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use paths::{resolve_render_theme, validate_map_file};
pub use settings::{CacheSettings, ConfigFile, LoggingSettings, RenderSettings};
pub use size::{format_size, parse_size, Size, SizeParseError};
