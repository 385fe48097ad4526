//! Common utilities shared across CLI commands.

use quadmap::coord::{BoundingBox, GeoCoordinate};
use quadmap::service::MapService;
use std::path::Path;

use crate::error::CliError;

/// Load the INI configuration and start the service.
pub fn open_service(config_path: &Path) -> Result<MapService, CliError> {
    let config = quadmap::config::load_from(config_path)?;
    Ok(MapService::new(config)?)
}

/// Parse a `min_lat,min_lon,max_lat,max_lon` region argument.
pub fn parse_bounds(text: &str) -> Result<BoundingBox, CliError> {
    let parts: Vec<&str> = text.split(',').map(str::trim).collect();
    if parts.len() != 4 {
        return Err(CliError::InvalidArgument(format!(
            "expected 'min_lat,min_lon,max_lat,max_lon', got '{}'",
            text
        )));
    }

    let mut values = [0.0f64; 4];
    for (slot, part) in values.iter_mut().zip(&parts) {
        *slot = part.parse().map_err(|_| {
            CliError::InvalidArgument(format!("'{}' is not a number", part))
        })?;
    }

    let [min_lat, min_lon, max_lat, max_lon] = values;
    if min_lat >= max_lat || min_lon >= max_lon {
        return Err(CliError::InvalidArgument(
            "bounds must run south-west to north-east".to_string(),
        ));
    }

    Ok(BoundingBox::new(
        GeoCoordinate::new(min_lat, min_lon),
        GeoCoordinate::new(max_lat, max_lon),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bounds() {
        let bounds = parse_bounds("52.4, 13.2, 52.6, 13.5").expect("Should parse");
        assert_eq!(bounds.min_point.latitude, 52.4);
        assert_eq!(bounds.min_point.longitude, 13.2);
        assert_eq!(bounds.max_point.latitude, 52.6);
        assert_eq!(bounds.max_point.longitude, 13.5);
    }

    #[test]
    fn test_parse_bounds_rejects_wrong_arity() {
        let error = parse_bounds("52.4,13.2,52.6").expect_err("Three values");
        assert!(error.to_string().contains("min_lat,min_lon,max_lat,max_lon"));
    }

    #[test]
    fn test_parse_bounds_rejects_non_numbers() {
        let error = parse_bounds("a,b,c,d").expect_err("Not numbers");
        assert!(error.to_string().contains("not a number"));
    }

    #[test]
    fn test_parse_bounds_rejects_inverted_corners() {
        let error = parse_bounds("52.6,13.2,52.4,13.5").expect_err("North before south");
        assert!(error.to_string().contains("south-west to north-east"));
    }
}
