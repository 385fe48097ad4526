//! Tile command - build one tile and write its meshes as Wavefront OBJ.

use clap::Args;
use quadmap::coord::{to_quad_key, QuadKey};
use quadmap::mesh::Mesh;
use quadmap::service::{ServiceError, TileContent};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use super::common::open_service;
use crate::error::CliError;

/// Arguments for the tile command.
#[derive(Debug, Args)]
pub struct TileArgs {
    /// MapCSS stylesheet driving terrain and object builders
    #[arg(long)]
    pub style: PathBuf,

    /// Latitude of a point inside the tile
    #[arg(long, required_unless_present = "quad_key", conflicts_with = "quad_key")]
    pub lat: Option<f64>,

    /// Longitude of a point inside the tile
    #[arg(long, required_unless_present = "quad_key", conflicts_with = "quad_key")]
    pub lon: Option<f64>,

    /// Level of detail of the tile
    #[arg(long, default_value_t = 16)]
    pub lod: i32,

    /// Tile addressed directly by its quad key digits
    #[arg(long)]
    pub quad_key: Option<QuadKey>,

    /// Output OBJ file
    #[arg(long)]
    pub output: PathBuf,

    /// Also write the styled element listing to this file
    #[arg(long)]
    pub elements: Option<PathBuf>,
}

/// Run the tile command.
pub fn run(config_path: &Path, args: TileArgs) -> Result<(), CliError> {
    let service = open_service(config_path)?;

    let quad_key = match args.quad_key {
        Some(quad_key) => quad_key,
        // Safe: clap requires lat/lon when no quad key is given.
        None => {
            to_quad_key(args.lat.unwrap(), args.lon.unwrap(), args.lod)
                .map_err(ServiceError::from)?
        }
    };

    println!("Building tile {} (lod {})", quad_key, quad_key.level_of_detail);
    let content = service.load_quad_key(&args.style, quad_key)?;

    println!("  Meshes: {}", content.meshes.len());
    for mesh in &content.meshes {
        println!(
            "    {} ({} vertices, {} triangles)",
            mesh.name,
            mesh.vertex_count(),
            mesh.triangle_count()
        );
    }
    println!("  Elements: {}", content.elements.len());

    write_obj(&args.output, &content.meshes)?;
    println!("✓ Wrote {}", args.output.display());

    if let Some(path) = &args.elements {
        write_elements(path, &content)?;
        println!("✓ Wrote {}", path.display());
    }

    Ok(())
}

/// Write meshes as one Wavefront OBJ file.
///
/// One `o` object per mesh; vertex lines carry the unpacked mesh color in
/// the common `v x y z r g b` extension. Face indices are global and
/// 1-based, as OBJ requires.
fn write_obj(path: &Path, meshes: &[Mesh]) -> Result<(), CliError> {
    let mut out = String::new();
    let mut base = 1usize;

    for mesh in meshes {
        let _ = writeln!(out, "o {}", mesh.name);
        for (vertex, color) in mesh.vertices.chunks_exact(3).zip(&mesh.colors) {
            let (r, g, b) = unpack_rgb(*color);
            let _ = writeln!(
                out,
                "v {} {} {} {:.4} {:.4} {:.4}",
                vertex[0], vertex[1], vertex[2], r, g, b
            );
        }
        for triangle in mesh.triangles.chunks_exact(3) {
            let _ = writeln!(
                out,
                "f {} {} {}",
                base + triangle[0] as usize,
                base + triangle[1] as usize,
                base + triangle[2] as usize
            );
        }
        base += mesh.vertex_count();
    }

    std::fs::write(path, out).map_err(|error| CliError::FileWrite {
        path: path.display().to_string(),
        error,
    })
}

/// Write the styled element listing as tab-separated plain text.
fn write_elements(path: &Path, content: &TileContent) -> Result<(), CliError> {
    let mut out = String::new();
    for element in &content.elements {
        let tags: Vec<String> = element
            .tags
            .iter()
            .map(|tag| format!("{}={}", tag.key, tag.value))
            .collect();
        let _ = writeln!(
            out,
            "{}\t{}\t{} points",
            element.id,
            tags.join(","),
            element.geometry.len()
        );
    }

    std::fs::write(path, out).map_err(|error| CliError::FileWrite {
        path: path.display().to_string(),
        error,
    })
}

fn unpack_rgb(color: i32) -> (f64, f64, f64) {
    let c = color as u32;
    (
        ((c >> 24) & 0xff) as f64 / 255.0,
        ((c >> 16) & 0xff) as f64 / 255.0,
        ((c >> 8) & 0xff) as f64 / 255.0,
    )
}
