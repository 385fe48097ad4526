//! QuadMap CLI - Command-line interface
//!
//! This binary provides a command-line interface to the quadmap library.

mod commands;
mod error;

use clap::{Parser, Subcommand};
use commands::{import, info, preload, tile};
use error::CliError;
use quadmap::logging::{default_log_dir, default_log_file, init_logging};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "quadmap")]
#[command(version = quadmap::VERSION)]
#[command(about = "Import map data and build styled tile meshes", long_about = None)]
struct Cli {
    /// Path to the INI configuration file
    #[arg(long, global = true, default_value = "quadmap.ini")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Import a map data file into a store
    Import(import::ImportArgs),
    /// Build a tile and write its meshes as Wavefront OBJ
    Tile(tile::TileArgs),
    /// Show configuration and per-location tile state
    Info(info::InfoArgs),
    /// Warm the elevation cache for a region
    Preload(preload::PreloadArgs),
}

fn main() {
    let Cli { config, command } = Cli::parse();

    let _logging_guard = match init_logging(default_log_dir(), default_log_file()) {
        Ok(guard) => guard,
        Err(e) => CliError::LoggingInit(e.to_string()).exit(),
    };

    let result = match command {
        Commands::Import(args) => import::run(&config, args),
        Commands::Tile(args) => tile::run(&config, args),
        Commands::Info(args) => info::run(&config, args),
        Commands::Preload(args) => preload::run(&config, args),
    };

    if let Err(e) = result {
        e.exit();
    }
}
