//! Info command - show configuration and per-location tile state.

use clap::Args;
use quadmap::coord::{quad_key_bounds, to_quad_key};
use quadmap::service::ServiceError;
use std::path::Path;

use super::common::open_service;
use crate::error::CliError;

/// Arguments for the info command.
#[derive(Debug, Args)]
pub struct InfoArgs {
    /// Latitude to inspect
    #[arg(long, requires = "lon")]
    pub lat: Option<f64>,

    /// Longitude to inspect
    #[arg(long, requires = "lat")]
    pub lon: Option<f64>,

    /// Level of detail to inspect at
    #[arg(long, default_value_t = 16)]
    pub lod: i32,
}

/// Run the info command.
pub fn run(config_path: &Path, args: InfoArgs) -> Result<(), CliError> {
    let service = open_service(config_path)?;
    let config = service.config();

    println!("QuadMap {}", quadmap::VERSION);
    println!("  String table: {}", config.strings_path().display());
    println!("  Map data: {}", config.map_data_path().display());
    println!("  Elevation: {}", config.elevation_path().display());
    match config.srtm_lod_start() {
        Some(level) => println!("  SRTM: from lod {}", level),
        None => println!("  SRTM: off"),
    }
    println!("  Stores: {}", service.store_keys().join(", "));

    if let (Some(lat), Some(lon)) = (args.lat, args.lon) {
        let quad_key = to_quad_key(lat, lon, args.lod).map_err(ServiceError::from)?;
        let bounds = quad_key_bounds(&quad_key);

        println!();
        println!("Tile {} (lod {})", quad_key, args.lod);
        println!(
            "  Bounds: {:.6},{:.6} to {:.6},{:.6}",
            bounds.min_point.latitude,
            bounds.min_point.longitude,
            bounds.max_point.latitude,
            bounds.max_point.longitude
        );
        println!(
            "  Has data: {}",
            if service.has_data(&quad_key) { "yes" } else { "no" }
        );
    }

    Ok(())
}
