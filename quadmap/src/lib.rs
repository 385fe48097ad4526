//! QuadMap - quadkey-addressed map data engine
//!
//! This library imports vector map data, indexes it under quadkey tiles
//! across levels of detail, and builds styled 3D meshes per tile with
//! optional SRTM elevation.
//!
//! # High-Level API
//!
//! For most use cases, the [`service`] module provides a simplified facade:
//!
//! ```ignore
//! use quadmap::coord::{to_quad_key, LodRange};
//! use quadmap::service::{MapService, ServiceConfig};
//! use quadmap::store::StorageKind;
//!
//! let config = ServiceConfig::new("index", "data", "elevation");
//! let service = MapService::new(config)?;
//!
//! // Import map data, then build a tile
//! service.add_to_store(StorageKind::Persistent, style, osm_file, &LodRange::new(14, 16)?)?;
//! let content = service.load_quad_key(style, to_quad_key(52.52, 13.38, 16)?)?;
//! ```

pub mod builder;
pub mod config;
pub mod coord;
pub mod elevation;
pub mod entity;
pub mod format;
pub mod logging;
pub mod mesh;
pub mod service;
pub mod store;
pub mod strings;
pub mod style;

/// Version of the QuadMap library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
