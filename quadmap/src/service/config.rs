//! Service configuration types.

use crate::coord::{MAX_LOD, MIN_LOD};
use crate::service::ServiceError;
use std::path::{Path, PathBuf};

/// Default terrain grid resolution in cells per tile side.
pub const DEFAULT_TERRAIN_GRID_SIZE: usize = 16;

/// Configuration for the map service.
///
/// Holds the three directories the service works out of plus the terrain
/// and elevation knobs. Paths are created on service startup if missing.
///
/// # Example
///
/// ```
/// use quadmap::service::ServiceConfig;
///
/// let config = ServiceConfig::new("index", "data", "elevation")
///     .with_srtm_lod_start(14)
///     .with_terrain_grid_size(32);
///
/// assert_eq!(config.terrain_grid_size(), 32);
/// assert_eq!(config.srtm_lod_start(), Some(14));
/// ```
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Directory holding the string interning table
    strings_path: PathBuf,
    /// Root directory for persisted tile files
    map_data_path: PathBuf,
    /// Directory holding `.hgt` elevation tiles
    elevation_path: PathBuf,
    /// Level of detail from which SRTM elevation applies, flat below
    srtm_lod_start: Option<i32>,
    /// Terrain grid resolution in cells per tile side
    terrain_grid_size: usize,
}

impl ServiceConfig {
    /// Create a configuration from the three service directories.
    ///
    /// SRTM elevation is off by default; every tile builds against sea
    /// level until [`with_srtm_lod_start`] turns it on.
    ///
    /// [`with_srtm_lod_start`]: ServiceConfig::with_srtm_lod_start
    pub fn new(
        strings_path: impl Into<PathBuf>,
        map_data_path: impl Into<PathBuf>,
        elevation_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            strings_path: strings_path.into(),
            map_data_path: map_data_path.into(),
            elevation_path: elevation_path.into(),
            srtm_lod_start: None,
            terrain_grid_size: DEFAULT_TERRAIN_GRID_SIZE,
        }
    }

    /// Use SRTM elevation for tiles at this level of detail and above.
    pub fn with_srtm_lod_start(mut self, level_of_detail: i32) -> Self {
        self.srtm_lod_start = Some(level_of_detail);
        self
    }

    /// Set the terrain grid resolution in cells per tile side.
    pub fn with_terrain_grid_size(mut self, cells: usize) -> Self {
        self.terrain_grid_size = cells;
        self
    }

    /// Get the string table directory.
    pub fn strings_path(&self) -> &Path {
        &self.strings_path
    }

    /// Get the map data root directory.
    pub fn map_data_path(&self) -> &Path {
        &self.map_data_path
    }

    /// Get the elevation tile directory.
    pub fn elevation_path(&self) -> &Path {
        &self.elevation_path
    }

    /// Get the level of detail from which SRTM elevation applies.
    pub fn srtm_lod_start(&self) -> Option<i32> {
        self.srtm_lod_start
    }

    /// Get the terrain grid resolution.
    pub fn terrain_grid_size(&self) -> usize {
        self.terrain_grid_size
    }

    /// Check value ranges before the service opens anything.
    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.terrain_grid_size == 0 {
            return Err(ServiceError::Config(
                "terrain grid size must be at least 1".to_string(),
            ));
        }
        if let Some(level_of_detail) = self.srtm_lod_start {
            if !(MIN_LOD..=MAX_LOD).contains(&level_of_detail) {
                return Err(ServiceError::Config(format!(
                    "srtm lod start {} outside {}..={}",
                    level_of_detail, MIN_LOD, MAX_LOD
                )));
            }
        }
        Ok(())
    }
}
