//! Wall strips for linear barriers.

use crate::builder::{BuilderContext, ElementBuilder, MeshSink};
use crate::entity::Element;
use crate::mesh::Mesh;
use crate::style::{Color, Style};
use glam::DVec3;

const DEFAULT_HEIGHT: f64 = 1.5;
const DEFAULT_COLOR: Color = Color::opaque(0x6e, 0x6a, 0x64);

/// Raises a vertical wall along a polyline.
///
/// Ways build an open strip, areas a closed loop. The wall bottom follows
/// the terrain at each point and rises by the style `height`.
#[derive(Debug, Default)]
pub struct BarrierBuilder;

impl BarrierBuilder {
    pub fn new() -> Self {
        Self
    }
}

impl ElementBuilder for BarrierBuilder {
    fn visit(
        &mut self,
        element: &Element,
        style: &Style,
        context: &BuilderContext<'_>,
        sink: &mut MeshSink<'_>,
    ) {
        let (points, closed) = match element {
            Element::Way(way) => (&way.coordinates, false),
            Element::Area(area) => (&area.coordinates, true),
            _ => return,
        };
        if points.len() < 2 {
            return;
        }

        let mut height = style.f64_or("height", DEFAULT_HEIGHT);
        if height <= 0.0 {
            height = DEFAULT_HEIGHT;
        }
        let color = style.color_or("color", DEFAULT_COLOR).packed();

        let n = points.len();
        let segments = if closed { n } else { n - 1 };
        let mut mesh = Mesh::new(format!("barrier:{}", element.id()));
        for i in 0..segments {
            let a = &points[i];
            let b = &points[(i + 1) % n];
            let a_ground = context.elevation_at(a);
            let b_ground = context.elevation_at(b);

            let a_bottom = mesh.add_vertex(
                DVec3::new(a.longitude, a.latitude, a_ground),
                color,
            );
            let b_bottom = mesh.add_vertex(
                DVec3::new(b.longitude, b.latitude, b_ground),
                color,
            );
            let b_top = mesh.add_vertex(
                DVec3::new(b.longitude, b.latitude, b_ground + height),
                color,
            );
            let a_top = mesh.add_vertex(
                DVec3::new(a.longitude, a.latitude, a_ground + height),
                color,
            );
            mesh.add_triangle(a_bottom, b_bottom, b_top);
            mesh.add_triangle(a_bottom, b_top, a_top);
        }

        sink(mesh);
    }
}
