//! Map data import formats.
//!
//! Three source formats are supported, selected by file extension: OSM XML
//! (`.osm`, `.xml`), OSM PBF (`.pbf`) and ESRI shapefiles (`.shp`). Each
//! parser produces plain [`Element`] values ready for the store import
//! fan-out.

mod pbf;
mod shape;
mod xml;

use crate::coord::GeoCoordinate;
use crate::entity::{Area, Element, Node, Relation, Tag, Way};
use glam::DVec2;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("map data i/o: {0}")]
    Io(#[from] std::io::Error),

    #[error("xml parse error at line {line}: {message}")]
    Xml { line: usize, message: String },

    #[error("pbf parse error: {0}")]
    Pbf(String),

    #[error("pbf decode error: {0}")]
    PbfDecode(#[from] prost::DecodeError),

    #[error("shapefile parse error: {0}")]
    Shape(String),

    #[error("unsupported map data extension `{0}`")]
    UnsupportedExtension(String),
}

/// Source format, detected from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatKind {
    OsmXml,
    OsmPbf,
    Shapefile,
}

impl FormatKind {
    pub fn from_path(path: &Path) -> Result<Self, FormatError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "osm" | "xml" => Ok(FormatKind::OsmXml),
            "pbf" => Ok(FormatKind::OsmPbf),
            "shp" => Ok(FormatKind::Shapefile),
            _ => Err(FormatError::UnsupportedExtension(
                path.display().to_string(),
            )),
        }
    }
}

/// Parses a map data file into elements.
pub fn parse_file(path: &Path) -> Result<Vec<Element>, FormatError> {
    let kind = FormatKind::from_path(path)?;
    let elements = match kind {
        FormatKind::OsmXml => {
            let source = std::fs::read_to_string(path)?;
            xml::parse(&source)?
        }
        FormatKind::OsmPbf => {
            let mut reader = BufReader::new(File::open(path)?);
            pbf::parse(&mut reader)?
        }
        FormatKind::Shapefile => shape::parse(path)?,
    };
    info!(path = %path.display(), ?kind, count = elements.len(), "parsed map data");
    Ok(elements)
}

/// Assembles referenced OSM primitives into standalone elements.
///
/// Both OSM parsers feed nodes, ways and relations in document order and the
/// assembler resolves the id references between them. Untagged nodes and ways
/// only contribute geometry; they never become standalone elements. Closed
/// tagged ways are promoted to areas when their tags describe a surface.
/// Elements with unresolvable references are dropped with a warning.
pub(crate) struct ElementAssembler {
    nodes: HashMap<i64, GeoCoordinate>,
    ways: HashMap<i64, Vec<GeoCoordinate>>,
    relations: HashMap<i64, Relation>,
    elements: Vec<Element>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MemberKind {
    Node,
    Way,
    Relation,
}

#[derive(Debug, Clone)]
pub(crate) struct MemberRef {
    pub kind: MemberKind,
    pub id: i64,
    pub role: String,
}

impl ElementAssembler {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            ways: HashMap::new(),
            relations: HashMap::new(),
            elements: Vec::new(),
        }
    }

    pub fn add_node(&mut self, id: i64, coordinate: GeoCoordinate, tags: Vec<Tag>) {
        self.nodes.insert(id, coordinate);
        if !tags.is_empty() {
            self.elements.push(Element::Node(Node {
                id,
                tags,
                coordinate,
            }));
        }
    }

    pub fn add_way(&mut self, id: i64, refs: &[i64], tags: Vec<Tag>) {
        let mut coordinates = Vec::with_capacity(refs.len());
        for node_ref in refs {
            match self.nodes.get(node_ref) {
                Some(coordinate) => coordinates.push(*coordinate),
                None => {
                    warn!(way = id, node = node_ref, "dropping way with unresolved node");
                    return;
                }
            }
        }
        if coordinates.len() < 2 {
            debug!(way = id, "dropping degenerate way");
            return;
        }
        self.ways.insert(id, coordinates.clone());

        if tags.is_empty() {
            return;
        }
        let closed = refs.len() >= 4 && refs.first() == refs.last();
        if closed && promote_to_area(&tags) {
            coordinates.pop();
            self.elements.push(Element::Area(Area {
                id,
                tags,
                coordinates,
            }));
        } else {
            self.elements.push(Element::Way(Way {
                id,
                tags,
                coordinates,
            }));
        }
    }

    pub fn add_relation(&mut self, id: i64, members: &[MemberRef], tags: Vec<Tag>) {
        let mut elements = Vec::new();
        for member in members {
            match member.kind {
                MemberKind::Node => match self.nodes.get(&member.id) {
                    Some(coordinate) => elements.push(Element::Node(Node {
                        id: member.id,
                        tags: Vec::new(),
                        coordinate: *coordinate,
                    })),
                    None => {
                        warn!(relation = id, node = member.id, "unresolved member node")
                    }
                },
                MemberKind::Way => match self.ways.get(&member.id) {
                    Some(coordinates) => {
                        elements.push(relation_ring(member, coordinates.clone()))
                    }
                    None => warn!(relation = id, way = member.id, "unresolved member way"),
                },
                MemberKind::Relation => match self.relations.get(&member.id) {
                    Some(nested) => elements.push(Element::Relation(nested.clone())),
                    None => {
                        warn!(relation = id, nested = member.id, "unresolved member relation")
                    }
                },
            }
        }

        if elements.is_empty() {
            warn!(relation = id, "dropping relation with no resolvable members");
            return;
        }
        let relation = Relation { id, tags, elements };
        self.relations.insert(id, relation.clone());
        if !relation.tags.is_empty() {
            self.elements.push(Element::Relation(relation));
        }
    }

    pub fn finish(self) -> Vec<Element> {
        self.elements
    }
}

/// Closed member ways become rings oriented by role: outer rings clockwise,
/// inner rings counter-clockwise. Open member ways stay ways.
fn relation_ring(member: &MemberRef, mut coordinates: Vec<GeoCoordinate>) -> Element {
    let closed = coordinates.len() >= 4 && coordinates.first() == coordinates.last();
    if closed {
        coordinates.pop();
        let coordinates = orient_ring(coordinates, member.role == "inner");
        Element::Area(Area {
            id: member.id,
            tags: Vec::new(),
            coordinates,
        })
    } else {
        Element::Way(Way {
            id: member.id,
            tags: Vec::new(),
            coordinates,
        })
    }
}

/// Reverses the ring if its winding does not match the requested role.
pub(crate) fn orient_ring(mut ring: Vec<GeoCoordinate>, inner: bool) -> Vec<GeoCoordinate> {
    let points: Vec<DVec2> = ring
        .iter()
        .map(|c| DVec2::new(c.longitude, c.latitude))
        .collect();
    if crate::mesh::is_clockwise(&points) == inner {
        ring.reverse();
    }
    ring
}

/// Whether a closed way's tags describe a surface rather than an outline.
fn promote_to_area(tags: &[Tag]) -> bool {
    let get = |key: &str| {
        tags.iter()
            .find(|tag| tag.key == key)
            .map(|tag| tag.value.as_str())
    };
    match get("area") {
        Some("yes") => return true,
        Some("no") => return false,
        _ => {}
    }
    if get("building").is_some() || get("landuse").is_some() || get("leisure").is_some() {
        return true;
    }
    matches!(get("natural"), Some(value) if value != "tree")
}
