//! Geographic and tile coordinate type definitions

use std::fmt;
use std::str::FromStr;

/// Web Mercator valid latitude range
pub const MIN_LAT: f64 = -85.05112878;
pub const MAX_LAT: f64 = 85.05112878;

/// Valid longitude range
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// Level of detail range supported by the tile index
pub const MIN_LOD: i32 = 1;
pub const MAX_LOD: i32 = 16;

/// A geographic coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GeoCoordinate {
    /// Latitude in degrees, positive north
    pub latitude: f64,
    /// Longitude in degrees, positive east
    pub longitude: f64,
}

impl GeoCoordinate {
    /// Create a coordinate without validation.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check whether the coordinate lies inside the Web Mercator domain.
    pub fn is_valid(&self) -> bool {
        (MIN_LAT..=MAX_LAT).contains(&self.latitude)
            && (MIN_LON..=MAX_LON).contains(&self.longitude)
    }
}

impl fmt::Display for GeoCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.7}, {:.7})", self.latitude, self.longitude)
    }
}

/// Tile address in the quadkey scheme.
///
/// A quadkey identifies one Web Mercator tile by column (`tile_x`, 0 at west),
/// row (`tile_y`, 0 at north) and level of detail. Its string form is the
/// base-4 digit sequence used by Bing-style tile services: one digit per
/// level, most significant level first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QuadKey {
    /// X coordinate (east-west), 0 at west
    pub tile_x: i32,
    /// Y coordinate (north-south), 0 at north
    pub tile_y: i32,
    /// Level of detail (1-16)
    pub level_of_detail: i32,
}

impl QuadKey {
    /// Create a quadkey, validating the level of detail and tile range.
    pub fn new(tile_x: i32, tile_y: i32, level_of_detail: i32) -> Result<Self, CoordError> {
        if !(MIN_LOD..=MAX_LOD).contains(&level_of_detail) {
            return Err(CoordError::InvalidLevelOfDetail(level_of_detail));
        }
        let side = 1i32 << level_of_detail;
        if !(0..side).contains(&tile_x) || !(0..side).contains(&tile_y) {
            return Err(CoordError::InvalidQuadKey(format!(
                "tile ({}, {}) out of range at level {}",
                tile_x, tile_y, level_of_detail
            )));
        }
        Ok(Self {
            tile_x,
            tile_y,
            level_of_detail,
        })
    }
}

impl fmt::Display for QuadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // One base-4 digit per level, most significant level first.
        for i in (1..=self.level_of_detail).rev() {
            let mask = 1i32 << (i - 1);
            let mut digit = 0u8;
            if self.tile_x & mask != 0 {
                digit += 1;
            }
            if self.tile_y & mask != 0 {
                digit += 2;
            }
            write!(f, "{}", digit)?;
        }
        Ok(())
    }
}

impl FromStr for QuadKey {
    type Err = CoordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let level = s.len() as i32;
        if !(MIN_LOD..=MAX_LOD).contains(&level) {
            return Err(CoordError::InvalidQuadKey(s.to_string()));
        }
        let mut tile_x = 0i32;
        let mut tile_y = 0i32;
        for (i, c) in s.chars().enumerate() {
            let mask = 1i32 << (level - 1 - i as i32);
            match c {
                '0' => {}
                '1' => tile_x |= mask,
                '2' => tile_y |= mask,
                '3' => {
                    tile_x |= mask;
                    tile_y |= mask;
                }
                _ => return Err(CoordError::InvalidQuadKey(s.to_string())),
            }
        }
        Ok(Self {
            tile_x,
            tile_y,
            level_of_detail: level,
        })
    }
}

/// Geographic extent described by two corner coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// South-west corner
    pub min_point: GeoCoordinate,
    /// North-east corner
    pub max_point: GeoCoordinate,
}

impl BoundingBox {
    /// Create a bounding box from its south-west and north-east corners.
    pub fn new(min_point: GeoCoordinate, max_point: GeoCoordinate) -> Self {
        Self {
            min_point,
            max_point,
        }
    }

    /// Create an inverted box that any expansion will overwrite.
    pub fn empty() -> Self {
        Self {
            min_point: GeoCoordinate::new(90.0, 180.0),
            max_point: GeoCoordinate::new(-90.0, -180.0),
        }
    }

    /// A box is valid once its corners are properly ordered.
    pub fn is_valid(&self) -> bool {
        self.min_point.latitude <= self.max_point.latitude
            && self.min_point.longitude <= self.max_point.longitude
    }

    /// Grow the box to include the given coordinate.
    pub fn expand(&mut self, coordinate: &GeoCoordinate) {
        self.min_point.latitude = self.min_point.latitude.min(coordinate.latitude);
        self.min_point.longitude = self.min_point.longitude.min(coordinate.longitude);
        self.max_point.latitude = self.max_point.latitude.max(coordinate.latitude);
        self.max_point.longitude = self.max_point.longitude.max(coordinate.longitude);
    }

    /// Grow the box to include another box.
    pub fn expand_to_include(&mut self, other: &BoundingBox) {
        self.expand(&other.min_point);
        self.expand(&other.max_point);
    }

    /// Check whether two boxes overlap (inclusive of edges).
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_point.latitude <= other.max_point.latitude
            && self.max_point.latitude >= other.min_point.latitude
            && self.min_point.longitude <= other.max_point.longitude
            && self.max_point.longitude >= other.min_point.longitude
    }

    /// Check whether a coordinate lies inside the box (inclusive of edges).
    pub fn contains(&self, coordinate: &GeoCoordinate) -> bool {
        (self.min_point.latitude..=self.max_point.latitude).contains(&coordinate.latitude)
            && (self.min_point.longitude..=self.max_point.longitude).contains(&coordinate.longitude)
    }

    /// Center point of the box.
    pub fn center(&self) -> GeoCoordinate {
        GeoCoordinate::new(
            (self.min_point.latitude + self.max_point.latitude) / 2.0,
            (self.min_point.longitude + self.max_point.longitude) / 2.0,
        )
    }

    /// Box height in degrees of latitude.
    pub fn latitude_span(&self) -> f64 {
        self.max_point.latitude - self.min_point.latitude
    }

    /// Box width in degrees of longitude.
    pub fn longitude_span(&self) -> f64 {
        self.max_point.longitude - self.min_point.longitude
    }
}

/// Inclusive range of levels of detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LodRange {
    pub min: i32,
    pub max: i32,
}

impl LodRange {
    /// Create a range, validating bounds and ordering.
    pub fn new(min: i32, max: i32) -> Result<Self, CoordError> {
        if !(MIN_LOD..=MAX_LOD).contains(&min) {
            return Err(CoordError::InvalidLevelOfDetail(min));
        }
        if !(MIN_LOD..=MAX_LOD).contains(&max) {
            return Err(CoordError::InvalidLevelOfDetail(max));
        }
        if min > max {
            return Err(CoordError::InvalidLevelOfDetail(max));
        }
        Ok(Self { min, max })
    }

    /// Range covering every supported level.
    pub fn all() -> Self {
        Self {
            min: MIN_LOD,
            max: MAX_LOD,
        }
    }

    /// Range containing a single level.
    pub fn single(level_of_detail: i32) -> Result<Self, CoordError> {
        Self::new(level_of_detail, level_of_detail)
    }

    /// Check whether the range contains the given level.
    pub fn contains(&self, level_of_detail: i32) -> bool {
        (self.min..=self.max).contains(&level_of_detail)
    }

    /// Iterate the levels from min to max.
    pub fn levels(&self) -> std::ops::RangeInclusive<i32> {
        self.min..=self.max
    }
}

impl fmt::Display for LodRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.min, self.max)
    }
}

/// Errors that can occur during coordinate conversion.
#[derive(Debug, Clone, PartialEq)]
pub enum CoordError {
    /// Latitude is outside valid range (-85.05112878 to 85.05112878)
    InvalidLatitude(f64),
    /// Longitude is outside valid range (-180.0 to 180.0)
    InvalidLongitude(f64),
    /// Level of detail is outside valid range (1 to 16)
    InvalidLevelOfDetail(i32),
    /// Quadkey is out of tile range or contains invalid digits
    InvalidQuadKey(String),
}

impl fmt::Display for CoordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordError::InvalidLatitude(lat) => {
                write!(
                    f,
                    "Invalid latitude: {} (must be between {} and {})",
                    lat, MIN_LAT, MAX_LAT
                )
            }
            CoordError::InvalidLongitude(lon) => {
                write!(
                    f,
                    "Invalid longitude: {} (must be between {} and {})",
                    lon, MIN_LON, MAX_LON
                )
            }
            CoordError::InvalidLevelOfDetail(lod) => {
                write!(
                    f,
                    "Invalid level of detail: {} (must be between {} and {})",
                    lod, MIN_LOD, MAX_LOD
                )
            }
            CoordError::InvalidQuadKey(quad_key) => {
                write!(
                    f,
                    "Invalid quadkey: '{}' (digits 0-3, length between {} and {})",
                    quad_key, MIN_LOD, MAX_LOD
                )
            }
        }
    }
}

impl std::error::Error for CoordError {}
