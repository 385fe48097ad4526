//! Tile terrain surface.

use crate::builder::{BuilderContext, ElementBuilder, MeshSink};
use crate::coord::GeoCoordinate;
use crate::entity::Element;
use crate::mesh::Mesh;
use crate::style::{Color, Style};
use glam::DVec3;

/// Surface color when the canvas declares none.
const DEFAULT_COLOR: Color = Color::opaque(0x7a, 0x8f, 0x5a);

/// Builds the tile-wide ground grid from the canvas style.
///
/// The tile extent divides into `grid-size` cells per side; every vertex
/// samples the elevation provider and takes its color from the canvas
/// `color` gradient, positioned by the vertex height relative to the
/// tile's height range.
#[derive(Debug, Default)]
pub struct TerrainBuilder;

impl TerrainBuilder {
    pub fn new() -> Self {
        Self
    }
}

impl ElementBuilder for TerrainBuilder {
    /// The grid is canvas-driven; individual elements contribute nothing.
    fn visit(
        &mut self,
        _element: &Element,
        _style: &Style,
        _context: &BuilderContext<'_>,
        _sink: &mut MeshSink<'_>,
    ) {
    }

    fn complete(&mut self, context: &BuilderContext<'_>, sink: &mut MeshSink<'_>) {
        if context.canvas.is_empty() {
            return;
        }
        let cells = context
            .canvas
            .f64_or("grid-size", context.grid_size as f64)
            .max(1.0) as usize;
        let gradient = context.canvas.gradient_or("color", DEFAULT_COLOR);

        let bounds = &context.bounds;
        let side = cells + 1;
        let mut samples = Vec::with_capacity(side * side);
        let mut min_height = f64::INFINITY;
        let mut max_height = f64::NEG_INFINITY;
        for row in 0..side {
            let latitude =
                bounds.min_point.latitude + bounds.latitude_span() * row as f64 / cells as f64;
            for col in 0..side {
                let longitude = bounds.min_point.longitude
                    + bounds.longitude_span() * col as f64 / cells as f64;
                let height = context.elevation_at(&GeoCoordinate::new(latitude, longitude));
                min_height = min_height.min(height);
                max_height = max_height.max(height);
                samples.push((longitude, latitude, height));
            }
        }

        let span = max_height - min_height;
        let mut mesh = Mesh::new("terrain");
        for &(longitude, latitude, height) in &samples {
            let t = if span > f64::EPSILON {
                (height - min_height) / span
            } else {
                0.0
            };
            mesh.add_vertex(
                DVec3::new(longitude, latitude, height),
                gradient.evaluate(t).packed(),
            );
        }
        // Rows run south to north; two triangles per cell, counter-clockwise
        // seen from above.
        for row in 0..cells {
            for col in 0..cells {
                let sw = (row * side + col) as i32;
                let se = sw + 1;
                let nw = ((row + 1) * side + col) as i32;
                let ne = nw + 1;
                mesh.add_triangle(sw, se, ne);
                mesh.add_triangle(sw, ne, nw);
            }
        }
        sink(mesh);
    }
}
