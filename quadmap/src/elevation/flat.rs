use crate::coord::{BoundingBox, GeoCoordinate};
use crate::elevation::{ElevationError, ElevationProvider};

/// Sea level everywhere.
#[derive(Debug, Default)]
pub struct FlatElevationProvider;

impl FlatElevationProvider {
    pub fn new() -> Self {
        Self
    }
}

impl ElevationProvider for FlatElevationProvider {
    fn elevation(&self, _coordinate: &GeoCoordinate) -> f64 {
        0.0
    }

    fn preload(&self, _bounds: &BoundingBox) -> Result<(), ElevationError> {
        Ok(())
    }
}
