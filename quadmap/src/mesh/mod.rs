//! Mesh output types.
//!
//! A tile build produces meshes whose arrays match what rendering hosts
//! consume directly: interleaved vertex doubles, triangle indices and one
//! packed RGBA color per vertex.

mod polygon;

pub use polygon::{centroid, is_clockwise, signed_area, Polygon, Triangulation};

use glam::DVec3;

/// Triangle mesh with flat attribute arrays.
///
/// Vertices are interleaved `x = longitude, y = latitude, z = elevation`
/// triples; `colors` holds one packed RGBA value per vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub name: String,
    pub vertices: Vec<f64>,
    pub triangles: Vec<i32>,
    pub colors: Vec<i32>,
}

impl Mesh {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vertices: Vec::new(),
            triangles: Vec::new(),
            colors: Vec::new(),
        }
    }

    /// A mesh with no vertices carries nothing to render.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len() / 3
    }

    /// Append a vertex and its color, returning the new vertex index.
    pub fn add_vertex(&mut self, position: DVec3, color: i32) -> i32 {
        let index = self.vertex_count() as i32;
        self.vertices.push(position.x);
        self.vertices.push(position.y);
        self.vertices.push(position.z);
        self.colors.push(color);
        index
    }

    /// Append a triangle by vertex indices.
    pub fn add_triangle(&mut self, a: i32, b: i32, c: i32) {
        self.triangles.push(a);
        self.triangles.push(b);
        self.triangles.push(c);
    }
}
