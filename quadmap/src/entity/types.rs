//! Map element type definitions.

use crate::coord::{BoundingBox, GeoCoordinate};

/// A single key/value annotation on a map element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A point feature.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: i64,
    pub tags: Vec<Tag>,
    pub coordinate: GeoCoordinate,
}

/// An open polyline feature.
#[derive(Debug, Clone, PartialEq)]
pub struct Way {
    pub id: i64,
    pub tags: Vec<Tag>,
    pub coordinates: Vec<GeoCoordinate>,
}

/// A closed ring feature.
///
/// The ring is stored without repeating the first coordinate at the end.
#[derive(Debug, Clone, PartialEq)]
pub struct Area {
    pub id: i64,
    pub tags: Vec<Tag>,
    pub coordinates: Vec<GeoCoordinate>,
}

/// A compound feature grouping other elements, e.g. a multipolygon.
#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    pub id: i64,
    pub tags: Vec<Tag>,
    pub elements: Vec<Element>,
}

/// Any map feature the engine stores and builds.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Node(Node),
    Way(Way),
    Area(Area),
    Relation(Relation),
}

/// Discriminates element kinds without borrowing the payload.
///
/// Stylesheet selectors and the storage codec dispatch on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Node,
    Way,
    Area,
    Relation,
}

impl ElementKind {
    /// Selector name used by stylesheets.
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementKind::Node => "node",
            ElementKind::Way => "way",
            ElementKind::Area => "area",
            ElementKind::Relation => "relation",
        }
    }
}

impl Element {
    pub fn id(&self) -> i64 {
        match self {
            Element::Node(node) => node.id,
            Element::Way(way) => way.id,
            Element::Area(area) => area.id,
            Element::Relation(relation) => relation.id,
        }
    }

    pub fn tags(&self) -> &[Tag] {
        match self {
            Element::Node(node) => &node.tags,
            Element::Way(way) => &way.tags,
            Element::Area(area) => &area.tags,
            Element::Relation(relation) => &relation.tags,
        }
    }

    pub fn kind(&self) -> ElementKind {
        match self {
            Element::Node(_) => ElementKind::Node,
            Element::Way(_) => ElementKind::Way,
            Element::Area(_) => ElementKind::Area,
            Element::Relation(_) => ElementKind::Relation,
        }
    }

    /// Look up a tag value by key.
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags()
            .iter()
            .find(|tag| tag.key == key)
            .map(|tag| tag.value.as_str())
    }

    /// The element's own coordinates; relations concatenate their members.
    pub fn geometry(&self) -> Vec<GeoCoordinate> {
        match self {
            Element::Node(node) => vec![node.coordinate],
            Element::Way(way) => way.coordinates.clone(),
            Element::Area(area) => area.coordinates.clone(),
            Element::Relation(relation) => relation
                .elements
                .iter()
                .flat_map(|element| element.geometry())
                .collect(),
        }
    }

    /// Geographic extent of the element, `None` for empty geometry.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let mut bbox = BoundingBox::empty();
        let mut seen = false;
        for coordinate in self.geometry() {
            bbox.expand(&coordinate);
            seen = true;
        }
        seen.then_some(bbox)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn berlin_way() -> Element {
        Element::Way(Way {
            id: 7,
            tags: vec![Tag::new("highway", "residential")],
            coordinates: vec![
                GeoCoordinate::new(52.52, 13.40),
                GeoCoordinate::new(52.53, 13.41),
                GeoCoordinate::new(52.54, 13.39),
            ],
        })
    }

    #[test]
    fn test_element_accessors() {
        let element = berlin_way();
        assert_eq!(element.id(), 7);
        assert_eq!(element.kind(), ElementKind::Way);
        assert_eq!(element.tag("highway"), Some("residential"));
        assert_eq!(element.tag("building"), None);
    }

    #[test]
    fn test_bounding_box_spans_geometry() {
        let bbox = berlin_way().bounding_box().unwrap();
        assert_eq!(bbox.min_point, GeoCoordinate::new(52.52, 13.39));
        assert_eq!(bbox.max_point, GeoCoordinate::new(52.54, 13.41));
    }

    #[test]
    fn test_node_bounding_box_is_point() {
        let node = Element::Node(Node {
            id: 1,
            tags: vec![],
            coordinate: GeoCoordinate::new(48.85, 2.35),
        });
        let bbox = node.bounding_box().unwrap();
        assert_eq!(bbox.min_point, bbox.max_point);
    }

    #[test]
    fn test_relation_geometry_concatenates_members() {
        let relation = Element::Relation(Relation {
            id: 9,
            tags: vec![Tag::new("type", "multipolygon")],
            elements: vec![
                berlin_way(),
                Element::Node(Node {
                    id: 2,
                    tags: vec![],
                    coordinate: GeoCoordinate::new(52.55, 13.38),
                }),
            ],
        });

        let geometry = relation.geometry();
        assert_eq!(geometry.len(), 4, "3 way points plus 1 node");

        let bbox = relation.bounding_box().unwrap();
        assert_eq!(bbox.max_point.latitude, 52.55);
    }

    #[test]
    fn test_empty_relation_has_no_bounding_box() {
        let relation = Element::Relation(Relation {
            id: 3,
            tags: vec![],
            elements: vec![],
        });
        assert!(relation.bounding_box().is_none());
    }

    #[test]
    fn test_kind_selector_names() {
        assert_eq!(ElementKind::Node.as_str(), "node");
        assert_eq!(ElementKind::Way.as_str(), "way");
        assert_eq!(ElementKind::Area.as_str(), "area");
        assert_eq!(ElementKind::Relation.as_str(), "relation");
    }
}
