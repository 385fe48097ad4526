//! Elevation providers.
//!
//! Terrain and object builders sample elevation per vertex through
//! [`ElevationProvider`]. [`FlatElevationProvider`] pins everything to sea
//! level; [`SrtmElevationProvider`] reads `.hgt` tiles from a directory.

mod flat;
mod srtm;

pub use flat::FlatElevationProvider;
pub use srtm::SrtmElevationProvider;

use crate::coord::{BoundingBox, GeoCoordinate};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ElevationError {
    #[error("elevation i/o: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed elevation tile {path}: {message}")]
    Malformed { path: PathBuf, message: String },
}

pub trait ElevationProvider: Send + Sync {
    /// Elevation above sea level in meters.
    fn elevation(&self, coordinate: &GeoCoordinate) -> f64;

    /// Loads every tile covering the box ahead of time.
    fn preload(&self, bounds: &BoundingBox) -> Result<(), ElevationError>;
}
