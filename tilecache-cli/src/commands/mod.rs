//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`cache`] - Cache maintenance (stats, clean, destroy)
//! - [`config`] - Configuration management (show, init, path)
//! - [`tile`] - Single tile lookup

pub mod cache;
pub mod common;
pub mod config;
pub mod tile;
