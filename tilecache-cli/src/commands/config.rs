//! Configuration management CLI commands.
//!
//! Provides `config show`, `config init` and `config path` for viewing and
//! creating the configuration file from the command line.

use std::path::Path;

use clap::Subcommand;
use tilecache::config::{format_size, CacheConfiguration, ConfigFile};

use crate::commands::common::CacheOverrides;
use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration as INI
    Show,

    /// Write a config file with default settings
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Show the configuration file path
    Path,
}

/// Run a config subcommand.
pub fn run(
    command: ConfigCommands,
    path: &Path,
    overrides: &CacheOverrides,
) -> Result<(), CliError> {
    match command {
        ConfigCommands::Show => run_show(path, overrides),
        ConfigCommands::Init { force } => run_init(path, force),
        ConfigCommands::Path => {
            println!("{}", path.display());
            Ok(())
        }
    }
}

/// Print the configuration, then check it the way the cache would.
fn run_show(path: &Path, overrides: &CacheOverrides) -> Result<(), CliError> {
    let mut config = ConfigFile::load_from(path)?;
    overrides.apply(&mut config);

    print!("{}", config.to_config_string());

    let effective = config.to_cache_configuration()?;
    print_normalised(&config, &effective);
    Ok(())
}

/// Point out values the cache will adjust on load.
fn print_normalised(config: &ConfigFile, effective: &CacheConfiguration) {
    if effective.clean_cache_trigger_bytes() != config.cache.clean_trigger {
        println!(
            "; note: clean_trigger is not below max_size and will be {}",
            format_size(effective.clean_cache_trigger_bytes())
        );
    }
    if effective.max_tile_age_ms() != config.cache.max_tile_age_ms {
        println!(
            "; note: max_tile_age_ms is below the minimum and will be {}",
            effective.max_tile_age_ms()
        );
    }
    if i64::from(effective.tile_size()) != config.render.tile_size {
        println!(
            "; note: tile_size is negative and will be {}",
            effective.tile_size()
        );
    }
}

/// Write a default config file.
fn run_init(path: &Path, force: bool) -> Result<(), CliError> {
    if path.exists() && !force {
        return Err(CliError::ConfigExists(path.to_path_buf()));
    }

    ConfigFile::default().save_to(path)?;
    println!("Wrote default configuration to: {}", path.display());
    Ok(())
}
