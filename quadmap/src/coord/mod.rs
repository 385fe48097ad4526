//! Geographic and tile coordinate module
//!
//! Provides conversions between geographic coordinates (latitude/longitude)
//! and the Web Mercator quadkey tiles addressing all stored map data.

mod types;

pub use types::{
    BoundingBox, CoordError, GeoCoordinate, LodRange, QuadKey, MAX_LAT, MAX_LOD, MAX_LON, MIN_LAT,
    MIN_LOD, MIN_LON,
};

use std::f64::consts::PI;

/// Meters per degree of latitude (WGS84 mean).
const METERS_PER_LAT_DEGREE: f64 = 111_320.0;

/// Converts a geographic coordinate to the quadkey containing it.
///
/// # Arguments
///
/// * `latitude` - Latitude in degrees (-85.05112878 to 85.05112878)
/// * `longitude` - Longitude in degrees (-180.0 to 180.0)
/// * `level_of_detail` - Tile level (1 to 16)
///
/// # Returns
///
/// A `Result` containing the quadkey or an error if inputs are invalid.
pub fn to_quad_key(
    latitude: f64,
    longitude: f64,
    level_of_detail: i32,
) -> Result<QuadKey, CoordError> {
    if !(MIN_LAT..=MAX_LAT).contains(&latitude) {
        return Err(CoordError::InvalidLatitude(latitude));
    }
    if !(MIN_LON..=MAX_LON).contains(&longitude) {
        return Err(CoordError::InvalidLongitude(longitude));
    }
    if !(MIN_LOD..=MAX_LOD).contains(&level_of_detail) {
        return Err(CoordError::InvalidLevelOfDetail(level_of_detail));
    }

    let n = 2.0_f64.powi(level_of_detail);
    let side = (1i32 << level_of_detail) - 1;

    let x = ((longitude + 180.0) / 360.0 * n) as i32;

    let lat_rad = latitude * PI / 180.0;
    let y = ((1.0 - lat_rad.tan().asinh() / PI) / 2.0 * n) as i32;

    // Clamp the projection edge onto the last tile.
    Ok(QuadKey {
        tile_x: x.min(side),
        tile_y: y.min(side),
        level_of_detail,
    })
}

/// Returns the geographic extent of a quadkey's tile.
pub fn quad_key_bounds(quad_key: &QuadKey) -> BoundingBox {
    let n = 2.0_f64.powi(quad_key.level_of_detail);

    let min_lon = quad_key.tile_x as f64 / n * 360.0 - 180.0;
    let max_lon = (quad_key.tile_x + 1) as f64 / n * 360.0 - 180.0;

    // Row 0 is the northernmost tile, so the lower row edge is the southern bound.
    let max_lat = tile_edge_latitude(quad_key.tile_y, n);
    let min_lat = tile_edge_latitude(quad_key.tile_y + 1, n);

    BoundingBox::new(
        GeoCoordinate::new(min_lat, min_lon),
        GeoCoordinate::new(max_lat, max_lon),
    )
}

fn tile_edge_latitude(tile_y: i32, n: f64) -> f64 {
    let y = tile_y as f64 / n;
    let lat_rad = (PI * (1.0 - 2.0 * y)).sinh().atan();
    lat_rad * 180.0 / PI
}

/// Enumerates every quadkey at one level of detail whose tile intersects
/// the given bounding box.
pub fn quad_keys_in(
    bounding_box: &BoundingBox,
    level_of_detail: i32,
) -> Result<QuadKeyRangeIterator, CoordError> {
    let min = to_quad_key(
        bounding_box.max_point.latitude.clamp(MIN_LAT, MAX_LAT),
        bounding_box.min_point.longitude.clamp(MIN_LON, MAX_LON),
        level_of_detail,
    )?;
    let max = to_quad_key(
        bounding_box.min_point.latitude.clamp(MIN_LAT, MAX_LAT),
        bounding_box.max_point.longitude.clamp(MIN_LON, MAX_LON),
        level_of_detail,
    )?;

    Ok(QuadKeyRangeIterator {
        start_x: min.tile_x,
        end_x: max.tile_x,
        end_y: max.tile_y,
        current_x: min.tile_x,
        current_y: min.tile_y,
        level_of_detail,
        done: false,
    })
}

/// Iterator over a rectangular range of quadkeys at one level of detail.
///
/// Yields tiles in row-major order, north to south.
#[derive(Debug, Clone)]
pub struct QuadKeyRangeIterator {
    start_x: i32,
    end_x: i32,
    end_y: i32,
    current_x: i32,
    current_y: i32,
    level_of_detail: i32,
    done: bool,
}

impl Iterator for QuadKeyRangeIterator {
    type Item = QuadKey;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let quad_key = QuadKey {
            tile_x: self.current_x,
            tile_y: self.current_y,
            level_of_detail: self.level_of_detail,
        };

        if self.current_x < self.end_x {
            self.current_x += 1;
        } else if self.current_y < self.end_y {
            self.current_x = self.start_x;
            self.current_y += 1;
        } else {
            self.done = true;
        }

        Some(quad_key)
    }
}

/// Converts a north-south distance in meters to degrees of latitude.
pub fn meters_to_lat_degrees(meters: f64) -> f64 {
    meters / METERS_PER_LAT_DEGREE
}

/// Converts an east-west distance in meters to degrees of longitude
/// at the given latitude.
pub fn meters_to_lon_degrees(meters: f64, latitude: f64) -> f64 {
    meters / (METERS_PER_LAT_DEGREE * (latitude * PI / 180.0).cos())
}
