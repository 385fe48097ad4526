//! High-level service facade for map operations.
//!
//! This module wires stores, stylesheets, elevation and mesh building
//! behind one API, following the Facade pattern.
//!
//! # Example
//!
//! ```ignore
//! use quadmap::coord::{to_quad_key, LodRange};
//! use quadmap::service::{MapService, ServiceConfig};
//! use quadmap::store::StorageKind;
//!
//! // Create service configuration
//! let config = ServiceConfig::new("index", "data", "elevation")
//!     .with_srtm_lod_start(14);
//!
//! // Create service
//! let service = MapService::new(config)?;
//!
//! // Import map data, then build a tile
//! let range = LodRange::new(14, 16)?;
//! service.add_to_store(StorageKind::Persistent, style, osm_file, &range)?;
//! let content = service.load_quad_key(style, to_quad_key(52.52, 13.38, 16)?)?;
//! ```

mod config;
mod error;
mod facade;

pub use config::{ServiceConfig, DEFAULT_TERRAIN_GRID_SIZE};
pub use error::ServiceError;
pub use facade::{MapService, TileContent};
