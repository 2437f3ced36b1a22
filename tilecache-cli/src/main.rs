//! tilecache CLI - Command-line interface
//!
//! This binary hosts a tile cache from the command line: fetch tiles, inspect
//! and clean the cache, and manage the configuration file.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tilecache::config::config_file_path;

use commands::cache::CacheAction;
use commands::common::CacheOverrides;
use commands::config::ConfigCommands;
use error::CliError;
use runner::CliRunner;

#[derive(Parser)]
#[command(name = "tilecache")]
#[command(version = tilecache::VERSION)]
#[command(about = "Bounded on-disk cache for rendered map tiles", long_about = None)]
struct Cli {
    /// Config file (default: ~/.tilecache/config.ini)
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: CacheOverrides,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the path of a tile, rendering it if it is not cached
    Get {
        /// Tile column
        x: u32,
        /// Tile row
        y: u32,
        /// Zoom level
        #[arg(value_parser = clap::value_parser!(u8).range(0..=i64::from(tilecache::coord::MAX_ZOOM)))]
        zoom: u8,
    },

    #[command(flatten)]
    Cache(CacheAction),

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        e.exit();
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Config { command } => {
            let path = cli.config.unwrap_or_else(config_file_path);
            commands::config::run(command, &path, &cli.overrides)
        }
        Commands::Get { x, y, zoom } => {
            let runner = CliRunner::new(cli.config.as_deref(), &cli.overrides)?;
            commands::tile::run(&runner, x, y, zoom)
        }
        Commands::Cache(action) => {
            let runner = CliRunner::new(cli.config.as_deref(), &cli.overrides)?;
            commands::cache::run(&runner, action)
        }
    }
}
