//! ESRI shapefile import.
//!
//! Geometry comes from the `.shp` file and tags from the sibling `.dbf`
//! attribute table, paired by record order. Points become nodes, polyline
//! parts become ways, and polygons become areas, or a relation of areas
//! when a record carries several rings. Shapefile ring winding already
//! matches the relation convention: outer rings clockwise, holes
//! counter-clockwise. Element ids are assigned sequentially because the
//! format has no native ids.

mod dbf;
mod shp;

use crate::coord::GeoCoordinate;
use crate::entity::{Area, Element, Node, Relation, Way};
use crate::format::FormatError;
use shp::ShapeGeometry;
use std::path::Path;
use tracing::debug;

pub(crate) fn parse(path: &Path) -> Result<Vec<Element>, FormatError> {
    let shapes = shp::parse(path)?;

    let attribute_path = path.with_extension("dbf");
    let attributes = if attribute_path.exists() {
        let records = dbf::parse(&attribute_path)?;
        if records.len() != shapes.len() {
            return Err(FormatError::Shape(format!(
                "attribute table has {} records, geometry has {}",
                records.len(),
                shapes.len()
            )));
        }
        Some(records)
    } else {
        debug!(path = %attribute_path.display(), "no attribute table");
        None
    };

    let mut elements = Vec::new();
    let mut next_id = 0i64;

    for (index, geometry) in shapes.into_iter().enumerate() {
        let tags = attributes
            .as_ref()
            .map(|records| records[index].clone())
            .unwrap_or_default();

        match geometry {
            ShapeGeometry::Null => {}
            ShapeGeometry::Point(coordinate) => {
                next_id += 1;
                elements.push(Element::Node(Node {
                    id: next_id,
                    tags,
                    coordinate,
                }));
            }
            ShapeGeometry::MultiPoint(points) => {
                for coordinate in points {
                    next_id += 1;
                    elements.push(Element::Node(Node {
                        id: next_id,
                        tags: tags.clone(),
                        coordinate,
                    }));
                }
            }
            ShapeGeometry::PolyLine(parts) => {
                for coordinates in parts {
                    if coordinates.len() < 2 {
                        continue;
                    }
                    next_id += 1;
                    elements.push(Element::Way(Way {
                        id: next_id,
                        tags: tags.clone(),
                        coordinates,
                    }));
                }
            }
            ShapeGeometry::Polygon(rings) => {
                let mut rings: Vec<Vec<GeoCoordinate>> = rings
                    .into_iter()
                    .map(strip_closing_point)
                    .filter(|ring| ring.len() >= 3)
                    .collect();
                match rings.len() {
                    0 => {}
                    1 => {
                        next_id += 1;
                        elements.push(Element::Area(Area {
                            id: next_id,
                            tags,
                            coordinates: rings.swap_remove(0),
                        }));
                    }
                    _ => {
                        let members = rings
                            .into_iter()
                            .map(|coordinates| {
                                next_id += 1;
                                Element::Area(Area {
                                    id: next_id,
                                    tags: Vec::new(),
                                    coordinates,
                                })
                            })
                            .collect();
                        next_id += 1;
                        elements.push(Element::Relation(Relation {
                            id: next_id,
                            tags,
                            elements: members,
                        }));
                    }
                }
            }
        }
    }

    Ok(elements)
}

/// Shapefile rings repeat the first point as the last; our areas do not.
fn strip_closing_point(mut ring: Vec<GeoCoordinate>) -> Vec<GeoCoordinate> {
    if ring.len() >= 2 && ring.first() == ring.last() {
        ring.pop();
    }
    ring
}

#[cfg(test)]
mod tests {
    use super::dbf::test_support::dbf;
    use super::shp::test_support::{parts_content, point_content, record, shp_header};
    use super::*;
    use crate::entity::Tag;
    use std::fs;
    use std::path::PathBuf;

    fn write_pair(shp_body: &[u8], dbf_body: Option<&[u8]>) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("data.shp");
        fs::write(&path, shp_body).expect("Failed to write shp");
        if let Some(body) = dbf_body {
            fs::write(dir.path().join("data.dbf"), body).expect("Failed to write dbf");
        }
        (dir, path)
    }

    #[test]
    fn test_points_with_attributes() {
        let mut shp = shp_header(1);
        shp.extend(record(1, &point_content(13.38, 52.52)));
        shp.extend(record(2, &point_content(2.29, 48.85)));
        let dbf_body = dbf(
            &[("NAME", 10)],
            &[Some(vec!["Berlin"]), Some(vec!["Paris"])],
        );
        let (_dir, path) = write_pair(&shp, Some(&dbf_body));

        let elements = parse(&path).expect("Shapefile should parse");
        assert_eq!(elements.len(), 2);
        assert_eq!(elements[0].id(), 1);
        assert_eq!(elements[0].tag("name"), Some("Berlin"));
        assert_eq!(elements[1].tag("name"), Some("Paris"));
    }

    #[test]
    fn test_polygon_record_becomes_area() {
        let ring = [(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0), (0.0, 0.0)];
        let mut shp = shp_header(5);
        shp.extend(record(1, &parts_content(5, &[&ring])));
        let dbf_body = dbf(&[("BUILDING", 4)], &[Some(vec!["yes"])]);
        let (_dir, path) = write_pair(&shp, Some(&dbf_body));

        let elements = parse(&path).expect("Shapefile should parse");
        let Element::Area(area) = &elements[0] else {
            panic!("expected area");
        };
        assert_eq!(area.coordinates.len(), 4, "Closing point is stripped");
        assert_eq!(area.tags, vec![Tag::new("building", "yes")]);
    }

    #[test]
    fn test_multi_ring_polygon_becomes_relation() {
        let outer = [(0.0, 0.0), (0.0, 4.0), (4.0, 4.0), (4.0, 0.0), (0.0, 0.0)];
        let hole = [(1.0, 1.0), (2.0, 1.0), (2.0, 2.0), (1.0, 2.0), (1.0, 1.0)];
        let mut shp = shp_header(5);
        shp.extend(record(1, &parts_content(5, &[&outer, &hole])));
        let (_dir, path) = write_pair(&shp, None);

        let elements = parse(&path).expect("Shapefile should parse");
        let Element::Relation(relation) = &elements[0] else {
            panic!("expected relation");
        };
        assert_eq!(relation.elements.len(), 2);
        assert!(relation
            .elements
            .iter()
            .all(|member| matches!(member, Element::Area(_))));
    }

    #[test]
    fn test_missing_dbf_gives_untagged_elements() {
        let mut shp = shp_header(1);
        shp.extend(record(1, &point_content(1.0, 2.0)));
        let (_dir, path) = write_pair(&shp, None);

        let elements = parse(&path).expect("Shapefile should parse");
        assert_eq!(elements.len(), 1);
        assert!(elements[0].tags().is_empty());
    }

    #[test]
    fn test_record_count_mismatch() {
        let mut shp = shp_header(1);
        shp.extend(record(1, &point_content(1.0, 2.0)));
        let dbf_body = dbf(&[("NAME", 8)], &[Some(vec!["One"]), Some(vec!["Two"])]);
        let (_dir, path) = write_pair(&shp, Some(&dbf_body));

        let err = parse(&path).unwrap_err();
        assert!(matches!(err, FormatError::Shape(message) if message.contains("records")));
    }

    #[test]
    fn test_null_records_align_attributes() {
        let mut shp = shp_header(1);
        shp.extend(record(1, &0i32.to_le_bytes()));
        shp.extend(record(2, &point_content(1.0, 2.0)));
        let dbf_body = dbf(
            &[("NAME", 8)],
            &[Some(vec!["Skipped"]), Some(vec!["Kept"])],
        );
        let (_dir, path) = write_pair(&shp, Some(&dbf_body));

        let elements = parse(&path).expect("Shapefile should parse");
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].tag("name"), Some("Kept"));
    }
}
