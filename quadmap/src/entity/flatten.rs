//! Interleaved array layout for element geometry and tags.
//!
//! Geometry flattens to `[lat0, lon0, lat1, lon1, ...]` and tags to
//! `[key0, value0, key1, value1, ...]`. The persistent store serializes
//! through this layout, and embedders exchanging raw arrays rely on it.

use crate::coord::GeoCoordinate;
use crate::entity::Tag;

/// Error type for rebuilding structured data from interleaved arrays.
#[derive(Debug, thiserror::Error)]
pub enum FlattenError {
    #[error("geometry array has odd length {0}, expected lat/lon pairs")]
    OddGeometry(usize),
    #[error("tag array has odd length {0}, expected key/value pairs")]
    OddTags(usize),
}

/// Flatten coordinates into `[lat, lon, lat, lon, ...]`.
pub fn flatten_coordinates(coordinates: &[GeoCoordinate]) -> Vec<f64> {
    let mut values = Vec::with_capacity(coordinates.len() * 2);
    for coordinate in coordinates {
        values.push(coordinate.latitude);
        values.push(coordinate.longitude);
    }
    values
}

/// Rebuild coordinates from an interleaved `[lat, lon, ...]` array.
pub fn unflatten_coordinates(values: &[f64]) -> Result<Vec<GeoCoordinate>, FlattenError> {
    if values.len() % 2 != 0 {
        return Err(FlattenError::OddGeometry(values.len()));
    }
    Ok(values
        .chunks_exact(2)
        .map(|pair| GeoCoordinate::new(pair[0], pair[1]))
        .collect())
}

/// Flatten tags into `[key, value, key, value, ...]`.
pub fn flatten_tags(tags: &[Tag]) -> Vec<String> {
    let mut values = Vec::with_capacity(tags.len() * 2);
    for tag in tags {
        values.push(tag.key.clone());
        values.push(tag.value.clone());
    }
    values
}

/// Rebuild tags from an interleaved `[key, value, ...]` array.
pub fn unflatten_tags(values: &[String]) -> Result<Vec<Tag>, FlattenError> {
    if values.len() % 2 != 0 {
        return Err(FlattenError::OddTags(values.len()));
    }
    Ok(values
        .chunks_exact(2)
        .map(|pair| Tag::new(pair[0].clone(), pair[1].clone()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry_layout_is_lat_then_lon() {
        let coordinates = vec![
            GeoCoordinate::new(52.52, 13.40),
            GeoCoordinate::new(48.85, 2.35),
        ];

        let flat = flatten_coordinates(&coordinates);
        assert_eq!(flat, vec![52.52, 13.40, 48.85, 2.35]);
        assert_eq!(flat[0], coordinates[0].latitude, "Even index holds latitude");
        assert_eq!(flat[1], coordinates[0].longitude, "Odd index holds longitude");
    }

    #[test]
    fn test_tag_layout_is_key_then_value() {
        let tags = vec![Tag::new("building", "yes"), Tag::new("height", "12")];

        let flat = flatten_tags(&tags);
        assert_eq!(flat, vec!["building", "yes", "height", "12"]);
    }

    #[test]
    fn test_geometry_roundtrip_is_exact() {
        let coordinates = vec![
            GeoCoordinate::new(-33.8688, 151.2093),
            GeoCoordinate::new(35.6762, 139.6503),
            GeoCoordinate::new(0.0, 0.0),
        ];

        let rebuilt = unflatten_coordinates(&flatten_coordinates(&coordinates)).unwrap();
        assert_eq!(rebuilt, coordinates);
    }

    #[test]
    fn test_tags_roundtrip_is_exact() {
        let tags = vec![Tag::new("name", "Brandenburger Tor"), Tag::new("tourism", "attraction")];

        let rebuilt = unflatten_tags(&flatten_tags(&tags)).unwrap();
        assert_eq!(rebuilt, tags);
    }

    #[test]
    fn test_empty_arrays() {
        assert!(flatten_coordinates(&[]).is_empty());
        assert!(unflatten_coordinates(&[]).unwrap().is_empty());
        assert!(flatten_tags(&[]).is_empty());
        assert!(unflatten_tags(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_odd_lengths_are_rejected() {
        let geometry = unflatten_coordinates(&[1.0, 2.0, 3.0]);
        assert!(matches!(geometry, Err(FlattenError::OddGeometry(3))));

        let tags = unflatten_tags(&["key".to_string()]);
        assert!(matches!(tags, Err(FlattenError::OddTags(1))));
    }
}
