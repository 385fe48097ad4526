//! Preload command - warm the elevation cache for a region.

use clap::Args;
use quadmap::coord::{quad_keys_in, QuadKey};
use quadmap::service::ServiceError;
use std::path::Path;

use super::common::{open_service, parse_bounds};
use crate::error::CliError;

/// Arguments for the preload command.
#[derive(Debug, Args)]
pub struct PreloadArgs {
    /// Region to warm as 'min_lat,min_lon,max_lat,max_lon'
    #[arg(long)]
    pub bounds: String,

    /// Level of detail whose tiles are enumerated
    #[arg(long, default_value_t = 14)]
    pub lod: i32,
}

/// Run the preload command.
pub fn run(config_path: &Path, args: PreloadArgs) -> Result<(), CliError> {
    let service = open_service(config_path)?;
    let bounds = parse_bounds(&args.bounds)?;

    let quad_keys: Vec<QuadKey> = quad_keys_in(&bounds, args.lod)
        .map_err(ServiceError::from)?
        .collect();
    println!(
        "Preloading elevation for {} tiles at lod {}",
        quad_keys.len(),
        args.lod
    );

    for quad_key in &quad_keys {
        service.preload_elevation(quad_key)?;
    }

    println!("✓ Elevation ready");
    Ok(())
}
