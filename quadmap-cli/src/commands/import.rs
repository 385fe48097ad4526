//! Import command - load a map data file into a store.

use clap::Args;
use quadmap::coord::{LodRange, QuadKey};
use quadmap::service::ServiceError;
use quadmap::store::StorageKind;
use std::path::{Path, PathBuf};

use super::common::{open_service, parse_bounds};
use crate::error::CliError;

/// Arguments for the import command.
#[derive(Debug, Args)]
pub struct ImportArgs {
    /// Map data file (.osm/.xml, .pbf or .shp)
    #[arg(long)]
    pub input: PathBuf,

    /// MapCSS stylesheet used to filter elements per level of detail
    #[arg(long)]
    pub style: PathBuf,

    /// Target store
    #[arg(long, default_value = "persistent")]
    pub storage: StorageKind,

    /// Lowest level of detail to index at
    #[arg(long, default_value_t = 1)]
    pub min_lod: i32,

    /// Highest level of detail to index at
    #[arg(long, default_value_t = 16)]
    pub max_lod: i32,

    /// Import into this quad key only, ignoring the level range
    #[arg(long, conflicts_with_all = ["min_lod", "max_lod", "bounds"])]
    pub quad_key: Option<QuadKey>,

    /// Restrict the import to 'min_lat,min_lon,max_lat,max_lon'
    #[arg(long)]
    pub bounds: Option<String>,
}

/// Run the import command.
pub fn run(config_path: &Path, args: ImportArgs) -> Result<(), CliError> {
    let service = open_service(config_path)?;

    println!(
        "Importing {} into the {} store",
        args.input.display(),
        args.storage
    );

    let stats = if let Some(quad_key) = args.quad_key {
        service.add_to_store_in_quad_key(args.storage, &args.style, &args.input, &quad_key)?
    } else {
        let range = LodRange::new(args.min_lod, args.max_lod).map_err(ServiceError::from)?;
        match &args.bounds {
            Some(text) => {
                let bounds = parse_bounds(text)?;
                service.add_to_store_in_bounding_box(
                    args.storage,
                    &args.style,
                    &args.input,
                    &bounds,
                    &range,
                )?
            }
            None => service.add_to_store(args.storage, &args.style, &args.input, &range)?,
        }
    };

    service.flush()?;
    println!("✓ Import finished: {}", stats);
    Ok(())
}
