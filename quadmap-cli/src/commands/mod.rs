//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and a
//! `run` handler.
//!
//! # Command Modules
//!
//! - [`import`] - Load a map data file into a store
//! - [`info`] - Show configuration and per-location tile state
//! - [`preload`] - Warm the elevation cache for a region
//! - [`tile`] - Build one tile and write its meshes as Wavefront OBJ

mod common;

pub mod import;
pub mod info;
pub mod preload;
pub mod tile;
