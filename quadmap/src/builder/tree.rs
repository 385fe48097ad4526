//! Tree props for tagged nodes.

use crate::builder::{BuilderContext, ElementBuilder, MeshSink};
use crate::coord::{meters_to_lat_degrees, meters_to_lon_degrees};
use crate::entity::Element;
use crate::mesh::Mesh;
use crate::style::{Color, Style};
use glam::DVec3;
use std::f64::consts::TAU;

const DEFAULT_HEIGHT: f64 = 4.0;
const TRUNK_RADIUS_METERS: f64 = 0.2;
const CROWN_SEGMENTS: usize = 8;

const DEFAULT_TRUNK: Color = Color::opaque(0x8b, 0x45, 0x13);
const DEFAULT_FOLIAGE: Color = Color::opaque(0x2d, 0x5a, 0x27);

/// Places a trunk box and a cone crown at each visited node.
///
/// The trunk takes the lower third of `height`, the crown the rest with a
/// radius of a quarter height. Colors come from `trunk-color` and
/// `foliage-color`.
#[derive(Debug, Default)]
pub struct TreeBuilder;

impl TreeBuilder {
    pub fn new() -> Self {
        Self
    }
}

impl ElementBuilder for TreeBuilder {
    fn visit(
        &mut self,
        element: &Element,
        style: &Style,
        context: &BuilderContext<'_>,
        sink: &mut MeshSink<'_>,
    ) {
        let Element::Node(node) = element else {
            return;
        };

        let mut height = style.f64_or("height", DEFAULT_HEIGHT);
        if height <= 0.0 {
            height = DEFAULT_HEIGHT;
        }
        let trunk_color = style.color_or("trunk-color", DEFAULT_TRUNK).packed();
        let foliage_color = style.color_or("foliage-color", DEFAULT_FOLIAGE).packed();

        let latitude = node.coordinate.latitude;
        let longitude = node.coordinate.longitude;
        let base = context.elevation_at(&node.coordinate);
        let trunk_top = base + height / 3.0;
        let apex_height = base + height;

        let trunk_dlat = meters_to_lat_degrees(TRUNK_RADIUS_METERS);
        let trunk_dlon = meters_to_lon_degrees(TRUNK_RADIUS_METERS, latitude);
        let crown_radius = height / 4.0;
        let crown_dlat = meters_to_lat_degrees(crown_radius);
        let crown_dlon = meters_to_lon_degrees(crown_radius, latitude);

        let mut mesh = Mesh::new(format!("tree:{}", node.id));

        // Trunk: a square prism from the ground to a third of the height.
        let corners = [
            (longitude - trunk_dlon, latitude - trunk_dlat),
            (longitude + trunk_dlon, latitude - trunk_dlat),
            (longitude + trunk_dlon, latitude + trunk_dlat),
            (longitude - trunk_dlon, latitude + trunk_dlat),
        ];
        let bottom: Vec<i32> = corners
            .iter()
            .map(|&(x, y)| mesh.add_vertex(DVec3::new(x, y, base), trunk_color))
            .collect();
        let top: Vec<i32> = corners
            .iter()
            .map(|&(x, y)| mesh.add_vertex(DVec3::new(x, y, trunk_top), trunk_color))
            .collect();
        for i in 0..4 {
            let j = (i + 1) % 4;
            mesh.add_triangle(bottom[i], bottom[j], top[j]);
            mesh.add_triangle(bottom[i], top[j], top[i]);
        }

        // Crown: a cone from the trunk top to the apex.
        let ring: Vec<i32> = (0..CROWN_SEGMENTS)
            .map(|segment| {
                let angle = segment as f64 / CROWN_SEGMENTS as f64 * TAU;
                mesh.add_vertex(
                    DVec3::new(
                        longitude + crown_dlon * angle.cos(),
                        latitude + crown_dlat * angle.sin(),
                        trunk_top,
                    ),
                    foliage_color,
                )
            })
            .collect();
        let apex = mesh.add_vertex(DVec3::new(longitude, latitude, apex_height), foliage_color);
        for i in 0..CROWN_SEGMENTS {
            mesh.add_triangle(ring[i], ring[(i + 1) % CROWN_SEGMENTS], apex);
        }

        sink(mesh);
    }
}
