//! Polygon triangulation.
//!
//! Ear clipping over a single ring; holes are first bridged into the outer
//! ring with duplicated bridge vertices, rightmost hole first. Degenerate
//! input yields an empty triangulation rather than an error.

use glam::DVec2;
use std::cmp::Ordering;
use tracing::debug;

/// Rings whose area falls below this are treated as degenerate.
const AREA_EPSILON: f64 = 1e-12;

/// Distance squared below which two points count as coincident.
const COINCIDENT_EPSILON: f64 = 1e-20;

/// Polygon with an outer boundary and optional holes.
#[derive(Debug, Clone)]
pub struct Polygon {
    outer: Vec<DVec2>,
    holes: Vec<Vec<DVec2>>,
}

/// Triangulation result: the merged point list and triangle index triples.
#[derive(Debug, Clone)]
pub struct Triangulation {
    pub points: Vec<DVec2>,
    pub indices: Vec<usize>,
}

impl Triangulation {
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    fn empty() -> Self {
        Self {
            points: Vec::new(),
            indices: Vec::new(),
        }
    }
}

impl Polygon {
    pub fn new(outer: Vec<DVec2>) -> Self {
        Self {
            outer,
            holes: Vec::new(),
        }
    }

    pub fn add_hole(&mut self, hole: Vec<DVec2>) {
        self.holes.push(hole);
    }

    /// Triangulate the polygon.
    ///
    /// The outer ring may arrive in either winding; holes likewise. Rings
    /// smaller than a triangle or with near-zero area are dropped.
    pub fn triangulate(&self) -> Triangulation {
        let mut ring = dedup_ring(&self.outer);
        if ring.len() < 3 || signed_area(&ring).abs() < AREA_EPSILON {
            return Triangulation::empty();
        }
        if is_clockwise(&ring) {
            ring.reverse();
        }

        let mut holes: Vec<Vec<DVec2>> = self
            .holes
            .iter()
            .map(|hole| dedup_ring(hole))
            .filter(|hole| hole.len() >= 3 && signed_area(hole).abs() > AREA_EPSILON)
            .collect();
        for hole in holes.iter_mut() {
            // Holes run opposite to the outer ring so the bridge keeps
            // the merged boundary consistently counter-clockwise.
            if !is_clockwise(hole) {
                hole.reverse();
            }
        }
        holes.sort_by(|a, b| {
            max_x(b)
                .partial_cmp(&max_x(a))
                .unwrap_or(Ordering::Equal)
        });
        for hole in &holes {
            bridge_hole(&mut ring, hole);
        }

        let indices = ear_clip(&ring);
        Triangulation {
            points: ring,
            indices,
        }
    }
}

/// Signed ring area via the shoelace formula; positive when counter-clockwise.
pub fn signed_area(points: &[DVec2]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        sum += a.x * b.y - b.x * a.y;
    }
    sum / 2.0
}

pub fn is_clockwise(points: &[DVec2]) -> bool {
    signed_area(points) < 0.0
}

/// Vertex average, used for apex and label placement.
pub fn centroid(points: &[DVec2]) -> DVec2 {
    if points.is_empty() {
        return DVec2::ZERO;
    }
    points.iter().copied().sum::<DVec2>() / points.len() as f64
}

/// Drop consecutive duplicates and a repeated closing point.
fn dedup_ring(points: &[DVec2]) -> Vec<DVec2> {
    let mut ring: Vec<DVec2> = Vec::with_capacity(points.len());
    for &point in points {
        if ring
            .last()
            .map_or(true, |&last| (last - point).length_squared() > COINCIDENT_EPSILON)
        {
            ring.push(point);
        }
    }
    while ring.len() > 1
        && (ring[0] - *ring.last().unwrap()).length_squared() <= COINCIDENT_EPSILON
    {
        ring.pop();
    }
    ring
}

fn max_x(points: &[DVec2]) -> f64 {
    points.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max)
}

fn coincident(a: DVec2, b: DVec2) -> bool {
    (a - b).length_squared() <= COINCIDENT_EPSILON
}

/// Cross product of `o->a` and `o->b`; positive when `b` lies left of `o->a`.
fn cross(o: DVec2, a: DVec2, b: DVec2) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Splice a hole into the ring through a two-way bridge.
///
/// The bridge runs from the hole's rightmost vertex to a ring vertex it can
/// reach without crossing either boundary; both endpoints are duplicated so
/// the merged ring stays a single closed loop.
fn bridge_hole(ring: &mut Vec<DVec2>, hole: &[DVec2]) {
    let m_idx = hole
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.x.partial_cmp(&b.1.x).unwrap_or(Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0);
    let m = hole[m_idx];

    let mut candidates: Vec<usize> = (0..ring.len()).filter(|&i| ring[i].x >= m.x).collect();
    if candidates.is_empty() {
        candidates = (0..ring.len()).collect();
    }
    candidates.sort_by(|&a, &b| {
        (ring[a] - m)
            .length_squared()
            .partial_cmp(&(ring[b] - m).length_squared())
            .unwrap_or(Ordering::Equal)
    });

    let p_idx = candidates
        .iter()
        .copied()
        .find(|&i| segments_clear(ring, m, ring[i]) && segments_clear(hole, m, ring[i]))
        .unwrap_or(candidates[0]);

    let mut merged = Vec::with_capacity(ring.len() + hole.len() + 2);
    merged.extend_from_slice(&ring[..=p_idx]);
    for k in 0..hole.len() {
        merged.push(hole[(m_idx + k) % hole.len()]);
    }
    merged.push(m);
    merged.push(ring[p_idx]);
    merged.extend_from_slice(&ring[p_idx + 1..]);
    *ring = merged;
}

/// Check the candidate bridge against every edge of one boundary.
fn segments_clear(points: &[DVec2], m: DVec2, p: DVec2) -> bool {
    let n = points.len();
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        // Edges sharing a bridge endpoint cannot block it.
        if coincident(a, m) || coincident(b, m) || coincident(a, p) || coincident(b, p) {
            continue;
        }
        if segments_intersect(m, p, a, b) {
            return false;
        }
    }
    true
}

/// Proper segment intersection via orientation signs.
fn segments_intersect(p1: DVec2, p2: DVec2, p3: DVec2, p4: DVec2) -> bool {
    let d1 = cross(p3, p4, p1);
    let d2 = cross(p3, p4, p2);
    let d3 = cross(p1, p2, p3);
    let d4 = cross(p1, p2, p4);
    ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
}

/// Clip ears off a counter-clockwise ring until only one triangle remains.
fn ear_clip(points: &[DVec2]) -> Vec<usize> {
    let n = points.len();
    let mut remaining: Vec<usize> = (0..n).collect();
    let mut indices = Vec::with_capacity(n.saturating_sub(2) * 3);

    while remaining.len() > 3 {
        let len = remaining.len();
        let mut clipped = false;
        for i in 0..len {
            let prev = remaining[(i + len - 1) % len];
            let cur = remaining[i];
            let next = remaining[(i + 1) % len];
            if is_ear(points, &remaining, prev, cur, next) {
                indices.extend_from_slice(&[prev, cur, next]);
                remaining.remove(i);
                clipped = true;
                break;
            }
        }
        if !clipped {
            // Numerically stuck; drop the flattest corner and keep going.
            let i = flattest_corner(points, &remaining);
            debug!(vertex = remaining[i], "no ear found, dropping flattest corner");
            remaining.remove(i);
        }
    }
    if remaining.len() == 3 {
        indices.extend_from_slice(&remaining);
    }
    indices
}

fn is_ear(points: &[DVec2], remaining: &[usize], prev: usize, cur: usize, next: usize) -> bool {
    let a = points[prev];
    let b = points[cur];
    let c = points[next];
    // Reflex corners of a counter-clockwise ring are never ears.
    if cross(a, b, c) <= 0.0 {
        return false;
    }
    for &other in remaining {
        if other == prev || other == cur || other == next {
            continue;
        }
        let p = points[other];
        // Bridge duplicates share coordinates with corner vertices.
        if coincident(p, a) || coincident(p, b) || coincident(p, c) {
            continue;
        }
        if point_in_triangle(p, a, b, c) {
            return false;
        }
    }
    true
}

/// Inclusive containment for a counter-clockwise triangle.
fn point_in_triangle(p: DVec2, a: DVec2, b: DVec2, c: DVec2) -> bool {
    cross(a, b, p) >= 0.0 && cross(b, c, p) >= 0.0 && cross(c, a, p) >= 0.0
}

fn flattest_corner(points: &[DVec2], remaining: &[usize]) -> usize {
    let len = remaining.len();
    let mut best = 0;
    let mut best_area = f64::INFINITY;
    for i in 0..len {
        let a = points[remaining[(i + len - 1) % len]];
        let b = points[remaining[i]];
        let c = points[remaining[(i + 1) % len]];
        let area = cross(a, b, c).abs();
        if area < best_area {
            best_area = area;
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Sum of triangle areas, for checking coverage of the input shape.
    fn triangulated_area(triangulation: &Triangulation) -> f64 {
        triangulation
            .indices
            .chunks_exact(3)
            .map(|t| {
                let a = triangulation.points[t[0]];
                let b = triangulation.points[t[1]];
                let c = triangulation.points[t[2]];
                cross(a, b, c).abs() / 2.0
            })
            .sum()
    }

    fn unit_square() -> Vec<DVec2> {
        vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(1.0, 0.0),
            DVec2::new(1.0, 1.0),
            DVec2::new(0.0, 1.0),
        ]
    }

    #[test]
    fn test_triangle_passes_through() {
        let polygon = Polygon::new(vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(2.0, 0.0),
            DVec2::new(1.0, 1.0),
        ]);
        let result = polygon.triangulate();
        assert_eq!(result.triangle_count(), 1);
        assert!((triangulated_area(&result) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_square_splits_into_two_triangles() {
        let result = Polygon::new(unit_square()).triangulate();
        assert_eq!(result.triangle_count(), 2);
        assert!((triangulated_area(&result) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_clockwise_input_is_normalized() {
        let mut reversed = unit_square();
        reversed.reverse();
        let result = Polygon::new(reversed).triangulate();
        assert_eq!(result.triangle_count(), 2);
        assert!((triangulated_area(&result) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_concave_polygon() {
        // L-shape: 2x2 square with the top-right 1x1 corner removed
        let polygon = Polygon::new(vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(2.0, 0.0),
            DVec2::new(2.0, 1.0),
            DVec2::new(1.0, 1.0),
            DVec2::new(1.0, 2.0),
            DVec2::new(0.0, 2.0),
        ]);
        let result = polygon.triangulate();
        assert_eq!(result.triangle_count(), 4, "n vertices yield n-2 triangles");
        assert!((triangulated_area(&result) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_square_with_hole() {
        let mut polygon = Polygon::new(unit_square());
        polygon.add_hole(vec![
            DVec2::new(0.25, 0.25),
            DVec2::new(0.25, 0.75),
            DVec2::new(0.75, 0.75),
            DVec2::new(0.75, 0.25),
        ]);

        let result = polygon.triangulate();
        assert_eq!(
            result.triangle_count(),
            8,
            "Bridged ring of 10 vertices yields 8 triangles"
        );
        assert!(
            (triangulated_area(&result) - 0.75).abs() < 1e-9,
            "Covered area should exclude the hole"
        );
    }

    #[test]
    fn test_too_few_points_is_empty() {
        let result = Polygon::new(vec![DVec2::new(0.0, 0.0), DVec2::new(1.0, 1.0)]).triangulate();
        assert!(result.is_empty());
    }

    #[test]
    fn test_collinear_ring_is_empty() {
        let polygon = Polygon::new(vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(1.0, 1.0),
            DVec2::new(2.0, 2.0),
            DVec2::new(3.0, 3.0),
        ]);
        assert!(polygon.triangulate().is_empty());
    }

    #[test]
    fn test_repeated_closing_point_is_dropped() {
        let mut ring = unit_square();
        ring.push(ring[0]);
        let result = Polygon::new(ring).triangulate();
        assert_eq!(result.triangle_count(), 2);
    }

    #[test]
    fn test_degenerate_hole_is_ignored() {
        let mut polygon = Polygon::new(unit_square());
        polygon.add_hole(vec![DVec2::new(0.5, 0.5), DVec2::new(0.6, 0.6)]);
        let result = polygon.triangulate();
        assert_eq!(result.triangle_count(), 2, "Undersized hole cannot carve anything");
    }

    #[test]
    fn test_winding_helpers() {
        assert!(!is_clockwise(&unit_square()));
        let mut reversed = unit_square();
        reversed.reverse();
        assert!(is_clockwise(&reversed));
        assert!((signed_area(&unit_square()) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_centroid() {
        let c = centroid(&unit_square());
        assert!((c - DVec2::new(0.5, 0.5)).length() < 1e-12);
    }
}
