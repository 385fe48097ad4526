//! Building volumes from areas and multipolygon relations.

use crate::builder::{BuilderContext, ElementBuilder, MeshSink};
use crate::coord::GeoCoordinate;
use crate::entity::Element;
use crate::mesh::{centroid, is_clockwise, Mesh, Polygon};
use crate::style::{Color, Gradient, Style};
use glam::{DVec2, DVec3};
use tracing::{debug, warn};

/// Buildings mapped with no height extrude to ten meters.
const DEFAULT_HEIGHT: f64 = 10.0;

const DEFAULT_FACADE: Color = Color::opaque(0xb0, 0xa8, 0x96);
const DEFAULT_ROOF: Color = Color::opaque(0x8a, 0x3a, 0x2a);

/// Extrudes building footprints into facade walls plus a roof.
///
/// Consumes areas and relations; relation member rings split into contours
/// and holes by winding (clockwise rings are contours). Walls rise from the
/// ground elevation plus `min-height` up to `height`; the roof shape
/// follows `roof-type` (`flat`, `pyramidal` or `none`). Facade and roof
/// colors come from the `facade-color` / `roof-color` gradients.
#[derive(Debug, Default)]
pub struct BuildingBuilder;

impl BuildingBuilder {
    pub fn new() -> Self {
        Self
    }
}

impl ElementBuilder for BuildingBuilder {
    fn visit(
        &mut self,
        element: &Element,
        style: &Style,
        context: &BuilderContext<'_>,
        sink: &mut MeshSink<'_>,
    ) {
        let (contours, holes) = footprint_rings(element);
        if contours.is_empty() {
            debug!(id = element.id(), "no usable building footprint");
            return;
        }

        let min_height = style.f64_or("min-height", 0.0);
        let mut height = style.f64_or("height", 0.0);
        if height <= 0.0 {
            height = DEFAULT_HEIGHT;
        }
        let facade = style.gradient_or("facade-color", DEFAULT_FACADE);
        let roof = style.gradient_or("roof-color", DEFAULT_ROOF);

        let anchor = centroid(&contours[0]);
        let base = context.elevation_at(&GeoCoordinate::new(anchor.y, anchor.x));
        let bottom = base + min_height;
        let top = base + height;

        let mut mesh = Mesh::new(format!("building:{}", element.id()));
        for ring in contours.iter().chain(holes.iter()) {
            build_walls(&mut mesh, ring, bottom, top, &facade);
        }

        match style.get("roof-type").unwrap_or("flat") {
            "none" => {}
            "pyramidal" => {
                let apex = top + style.f64_or("roof-height", 3.0);
                for ring in &contours {
                    build_pyramidal_roof(&mut mesh, ring, top, apex, &roof);
                }
            }
            "flat" => build_flat_roof(&mut mesh, &contours, &holes, top, &roof),
            other => {
                warn!(id = element.id(), roof_type = other, "unknown roof type, building flat");
                build_flat_roof(&mut mesh, &contours, &holes, top, &roof);
            }
        }

        if !mesh.is_empty() {
            sink(mesh);
        }
    }
}

/// Split an element into contour and hole rings.
///
/// A standalone area is always a contour; relation member areas are split
/// by winding. Rings below three points are dropped.
fn footprint_rings(element: &Element) -> (Vec<Vec<DVec2>>, Vec<Vec<DVec2>>) {
    let mut contours = Vec::new();
    let mut holes = Vec::new();
    match element {
        Element::Area(area) => {
            let ring = ring_of(&area.coordinates);
            if ring.len() >= 3 {
                contours.push(ring);
            }
        }
        Element::Relation(relation) => {
            for member in &relation.elements {
                if let Element::Area(area) = member {
                    let ring = ring_of(&area.coordinates);
                    if ring.len() < 3 {
                        continue;
                    }
                    if is_clockwise(&ring) {
                        contours.push(ring);
                    } else {
                        holes.push(ring);
                    }
                }
            }
        }
        _ => {}
    }
    (contours, holes)
}

fn ring_of(coordinates: &[GeoCoordinate]) -> Vec<DVec2> {
    coordinates
        .iter()
        .map(|c| DVec2::new(c.longitude, c.latitude))
        .collect()
}

fn build_walls(mesh: &mut Mesh, ring: &[DVec2], bottom: f64, top: f64, facade: &Gradient) {
    let bottom_color = facade.evaluate(0.0).packed();
    let top_color = facade.evaluate(1.0).packed();
    let n = ring.len();
    for i in 0..n {
        let a = ring[i];
        let b = ring[(i + 1) % n];
        let a_bottom = mesh.add_vertex(DVec3::new(a.x, a.y, bottom), bottom_color);
        let b_bottom = mesh.add_vertex(DVec3::new(b.x, b.y, bottom), bottom_color);
        let b_top = mesh.add_vertex(DVec3::new(b.x, b.y, top), top_color);
        let a_top = mesh.add_vertex(DVec3::new(a.x, a.y, top), top_color);
        mesh.add_triangle(a_bottom, b_bottom, b_top);
        mesh.add_triangle(a_bottom, b_top, a_top);
    }
}

fn build_flat_roof(
    mesh: &mut Mesh,
    contours: &[Vec<DVec2>],
    holes: &[Vec<DVec2>],
    top: f64,
    roof: &Gradient,
) {
    let color = roof.evaluate(0.0).packed();
    for contour in contours {
        let mut polygon = Polygon::new(contour.clone());
        for hole in holes {
            // A multi-contour relation's holes belong to the contour
            // enclosing them.
            if ring_contains(contour, hole[0]) {
                polygon.add_hole(hole.clone());
            }
        }
        let triangulation = polygon.triangulate();
        if triangulation.is_empty() {
            continue;
        }
        let indices: Vec<i32> = triangulation
            .points
            .iter()
            .map(|p| mesh.add_vertex(DVec3::new(p.x, p.y, top), color))
            .collect();
        for triangle in triangulation.indices.chunks_exact(3) {
            mesh.add_triangle(indices[triangle[0]], indices[triangle[1]], indices[triangle[2]]);
        }
    }
}

fn build_pyramidal_roof(mesh: &mut Mesh, ring: &[DVec2], top: f64, apex_height: f64, roof: &Gradient) {
    let edge_color = roof.evaluate(0.0).packed();
    let apex_color = roof.evaluate(1.0).packed();
    let apex = centroid(ring);
    let apex_index = mesh.add_vertex(DVec3::new(apex.x, apex.y, apex_height), apex_color);
    let indices: Vec<i32> = ring
        .iter()
        .map(|p| mesh.add_vertex(DVec3::new(p.x, p.y, top), edge_color))
        .collect();
    let n = indices.len();
    for i in 0..n {
        mesh.add_triangle(indices[i], indices[(i + 1) % n], apex_index);
    }
}

/// Even-odd point-in-ring test.
fn ring_contains(ring: &[DVec2], point: DVec2) -> bool {
    let mut inside = false;
    let n = ring.len();
    let mut j = n - 1;
    for i in 0..n {
        let a = ring[i];
        let b = ring[j];
        if (a.y > point.y) != (b.y > point.y) {
            let crossing = a.x + (point.y - a.y) / (b.y - a.y) * (b.x - a.x);
            if point.x < crossing {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::to_quad_key;
    use crate::elevation::FlatElevationProvider;
    use crate::entity::{Area, Relation, Tag, Way};

    fn style_of(pairs: &[(&str, &str)]) -> Style {
        let mut style = Style::default();
        let owned: Vec<(String, String)> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        style.merge(&owned);
        style
    }

    /// Clockwise square footprint about a tenth of a millidegree wide.
    fn square_area(id: i64) -> Element {
        Element::Area(Area {
            id,
            tags: vec![Tag::new("building", "yes")],
            coordinates: vec![
                GeoCoordinate::new(0.0, 0.0),
                GeoCoordinate::new(0.0001, 0.0),
                GeoCoordinate::new(0.0001, 0.0001),
                GeoCoordinate::new(0.0, 0.0001),
            ],
        })
    }

    fn build(element: &Element, style: &Style) -> Vec<Mesh> {
        let quad_key = to_quad_key(0.00005, 0.00005, 16).expect("Coordinate should project");
        let flat = FlatElevationProvider::new();
        let context = BuilderContext::new(quad_key, Style::default(), 4, &flat);
        let mut meshes = Vec::new();
        let mut sink = |mesh: Mesh| meshes.push(mesh);
        BuildingBuilder::new().visit(element, style, &context, &mut sink);
        meshes
    }

    fn z_values(mesh: &Mesh) -> Vec<f64> {
        mesh.vertices.chunks_exact(3).map(|v| v[2]).collect()
    }

    #[test]
    fn test_flat_building() {
        let meshes = build(&square_area(5), &style_of(&[("height", "12")]));

        assert_eq!(meshes.len(), 1);
        let mesh = &meshes[0];
        assert_eq!(mesh.name, "building:5");
        assert_eq!(mesh.vertex_count(), 20, "16 wall vertices plus 4 roof");
        assert_eq!(mesh.triangle_count(), 10, "8 wall triangles plus 2 roof");

        let z = z_values(mesh);
        assert_eq!(z.iter().cloned().fold(f64::INFINITY, f64::min), 0.0);
        assert_eq!(z.iter().cloned().fold(f64::NEG_INFINITY, f64::max), 12.0);
    }

    #[test]
    fn test_zero_height_extrudes_to_default() {
        let meshes = build(&square_area(6), &style_of(&[]));
        let z = z_values(&meshes[0]);
        assert_eq!(
            z.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
            10.0,
            "Unmapped heights default to ten meters"
        );
    }

    #[test]
    fn test_min_height_raises_the_floor() {
        let meshes = build(
            &square_area(7),
            &style_of(&[("height", "12"), ("min-height", "4")]),
        );
        let z = z_values(&meshes[0]);
        assert_eq!(z.iter().cloned().fold(f64::INFINITY, f64::min), 4.0);
    }

    #[test]
    fn test_pyramidal_roof() {
        let meshes = build(
            &square_area(8),
            &style_of(&[
                ("height", "10"),
                ("roof-type", "pyramidal"),
                ("roof-height", "5"),
            ]),
        );
        let mesh = &meshes[0];
        assert_eq!(mesh.vertex_count(), 21, "16 wall vertices, apex and 4 ring");
        assert_eq!(mesh.triangle_count(), 12);
        let z = z_values(mesh);
        assert_eq!(z.iter().cloned().fold(f64::NEG_INFINITY, f64::max), 15.0);
    }

    #[test]
    fn test_roof_type_none() {
        let meshes = build(
            &square_area(9),
            &style_of(&[("height", "10"), ("roof-type", "none")]),
        );
        let mesh = &meshes[0];
        assert_eq!(mesh.vertex_count(), 16, "walls only");
        assert_eq!(mesh.triangle_count(), 8);
    }

    #[test]
    fn test_relation_splits_rings_by_winding() {
        // Contour ring clockwise, courtyard counter-clockwise.
        let contour = Area {
            id: 1,
            tags: vec![],
            coordinates: vec![
                GeoCoordinate::new(0.0, 0.0),
                GeoCoordinate::new(0.001, 0.0),
                GeoCoordinate::new(0.001, 0.001),
                GeoCoordinate::new(0.0, 0.001),
            ],
        };
        let courtyard = Area {
            id: 2,
            tags: vec![],
            coordinates: vec![
                GeoCoordinate::new(0.00025, 0.00025),
                GeoCoordinate::new(0.00025, 0.00075),
                GeoCoordinate::new(0.00075, 0.00075),
                GeoCoordinate::new(0.00075, 0.00025),
            ],
        };
        let relation = Element::Relation(Relation {
            id: 10,
            tags: vec![Tag::new("building", "yes")],
            elements: vec![Element::Area(contour), Element::Area(courtyard)],
        });

        let meshes = build(&relation, &style_of(&[("height", "10")]));
        let mesh = &meshes[0];
        assert_eq!(mesh.name, "building:10");
        assert_eq!(
            mesh.vertex_count(),
            42,
            "32 wall vertices on 8 edges plus a 10 point bridged roof"
        );
        assert_eq!(mesh.triangle_count(), 24, "16 wall triangles plus 8 roof");
    }

    #[test]
    fn test_open_way_is_ignored() {
        let way = Element::Way(Way {
            id: 11,
            tags: vec![Tag::new("building", "yes")],
            coordinates: vec![GeoCoordinate::new(0.0, 0.0), GeoCoordinate::new(0.0001, 0.0)],
        });
        assert!(build(&way, &style_of(&[("height", "10")])).is_empty());
    }

    #[test]
    fn test_degenerate_ring_is_ignored() {
        let sliver = Element::Area(Area {
            id: 12,
            tags: vec![],
            coordinates: vec![GeoCoordinate::new(0.0, 0.0), GeoCoordinate::new(0.0001, 0.0)],
        });
        assert!(build(&sliver, &style_of(&[("height", "10")])).is_empty());
    }

    #[test]
    fn test_ring_contains() {
        let ring = vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(1.0, 0.0),
            DVec2::new(1.0, 1.0),
            DVec2::new(0.0, 1.0),
        ];
        assert!(ring_contains(&ring, DVec2::new(0.5, 0.5)));
        assert!(!ring_contains(&ring, DVec2::new(1.5, 0.5)));
    }
}
