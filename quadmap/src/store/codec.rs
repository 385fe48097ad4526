//! Binary tile codec.
//!
//! Tile files start with a `QMD1` magic and hold a flat sequence of element
//! records. Tag keys and values are stored as string table ids, so a tile
//! file is only readable together with its string table. All integers and
//! floats are little-endian.
//!
//! Record layout:
//!
//! ```text
//! kind: u8            0 node, 1 way, 2 area, 3 relation
//! id:   i64
//! tags: u32 count, then (key id: u32, value id: u32) per tag
//! body: node      lat f64, lon f64
//!       way/area  u32 count, then (lat f64, lon f64) per coordinate
//!       relation  u32 count, then nested records
//! ```

use crate::entity::{flatten_coordinates, unflatten_coordinates, Area, Element, Node, Relation, Tag, Way};
use crate::store::StoreError;
use crate::strings::StringTable;
use std::io::{self, Read, Write};

pub(crate) const MAGIC: [u8; 4] = *b"QMD1";

const KIND_NODE: u8 = 0;
const KIND_WAY: u8 = 1;
const KIND_AREA: u8 = 2;
const KIND_RELATION: u8 = 3;

pub(crate) fn write_magic(writer: &mut impl Write) -> Result<(), StoreError> {
    writer.write_all(&MAGIC)?;
    Ok(())
}

pub(crate) fn read_magic(reader: &mut impl Read) -> Result<(), StoreError> {
    let magic: [u8; 4] = read_bytes(reader)?;
    if magic != MAGIC {
        return Err(StoreError::Corrupt(format!(
            "bad tile magic {magic:02x?}, expected {MAGIC:02x?}"
        )));
    }
    Ok(())
}

pub(crate) fn write_element(
    writer: &mut impl Write,
    element: &Element,
    strings: &StringTable,
) -> Result<(), StoreError> {
    let kind = match element {
        Element::Node(_) => KIND_NODE,
        Element::Way(_) => KIND_WAY,
        Element::Area(_) => KIND_AREA,
        Element::Relation(_) => KIND_RELATION,
    };
    writer.write_all(&[kind])?;
    writer.write_all(&element.id().to_le_bytes())?;
    write_tags(writer, element.tags(), strings)?;

    match element {
        Element::Node(node) => {
            writer.write_all(&node.coordinate.latitude.to_le_bytes())?;
            writer.write_all(&node.coordinate.longitude.to_le_bytes())?;
        }
        Element::Way(way) => write_coordinates(writer, &flatten_coordinates(&way.coordinates))?,
        Element::Area(area) => write_coordinates(writer, &flatten_coordinates(&area.coordinates))?,
        Element::Relation(relation) => {
            writer.write_all(&(relation.elements.len() as u32).to_le_bytes())?;
            for member in &relation.elements {
                write_element(writer, member, strings)?;
            }
        }
    }
    Ok(())
}

/// Reads the next record, or `None` at a clean end of stream.
pub(crate) fn read_element(
    reader: &mut impl Read,
    strings: &StringTable,
) -> Result<Option<Element>, StoreError> {
    let mut kind = [0u8; 1];
    match reader.read_exact(&mut kind) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }
    read_body(reader, kind[0], strings).map(Some)
}

/// Reads a record that must be present, e.g. a relation member.
fn read_record(reader: &mut impl Read, strings: &StringTable) -> Result<Element, StoreError> {
    let kind: [u8; 1] = read_bytes(reader)?;
    read_body(reader, kind[0], strings)
}

fn read_body(
    reader: &mut impl Read,
    kind: u8,
    strings: &StringTable,
) -> Result<Element, StoreError> {
    let id = i64::from_le_bytes(read_bytes(reader)?);
    let tags = read_tags(reader, strings)?;

    match kind {
        KIND_NODE => {
            let latitude = f64::from_le_bytes(read_bytes(reader)?);
            let longitude = f64::from_le_bytes(read_bytes(reader)?);
            Ok(Element::Node(Node {
                id,
                tags,
                coordinate: crate::coord::GeoCoordinate::new(latitude, longitude),
            }))
        }
        KIND_WAY => Ok(Element::Way(Way {
            id,
            tags,
            coordinates: read_coordinates(reader)?,
        })),
        KIND_AREA => Ok(Element::Area(Area {
            id,
            tags,
            coordinates: read_coordinates(reader)?,
        })),
        KIND_RELATION => {
            let count = u32::from_le_bytes(read_bytes(reader)?);
            let mut elements = Vec::new();
            for _ in 0..count {
                elements.push(read_record(reader, strings)?);
            }
            Ok(Element::Relation(Relation { id, tags, elements }))
        }
        other => Err(StoreError::Corrupt(format!("unknown element kind {other}"))),
    }
}

fn write_tags(
    writer: &mut impl Write,
    tags: &[Tag],
    strings: &StringTable,
) -> Result<(), StoreError> {
    writer.write_all(&(tags.len() as u32).to_le_bytes())?;
    for tag in tags {
        writer.write_all(&strings.intern(&tag.key)?.to_le_bytes())?;
        writer.write_all(&strings.intern(&tag.value)?.to_le_bytes())?;
    }
    Ok(())
}

fn read_tags(reader: &mut impl Read, strings: &StringTable) -> Result<Vec<Tag>, StoreError> {
    let count = u32::from_le_bytes(read_bytes(reader)?);
    let mut tags = Vec::new();
    for _ in 0..count {
        let key = lookup(strings, u32::from_le_bytes(read_bytes(reader)?))?;
        let value = lookup(strings, u32::from_le_bytes(read_bytes(reader)?))?;
        tags.push(Tag { key, value });
    }
    Ok(tags)
}

fn lookup(strings: &StringTable, id: u32) -> Result<String, StoreError> {
    strings
        .lookup(id)
        .ok_or_else(|| StoreError::Corrupt(format!("unknown string id {id}")))
}

fn write_coordinates(writer: &mut impl Write, flattened: &[f64]) -> Result<(), StoreError> {
    writer.write_all(&((flattened.len() / 2) as u32).to_le_bytes())?;
    for value in flattened {
        writer.write_all(&value.to_le_bytes())?;
    }
    Ok(())
}

fn read_coordinates(
    reader: &mut impl Read,
) -> Result<Vec<crate::coord::GeoCoordinate>, StoreError> {
    let count = u32::from_le_bytes(read_bytes(reader)?);
    let mut flattened = Vec::new();
    for _ in 0..count {
        flattened.push(f64::from_le_bytes(read_bytes(reader)?));
        flattened.push(f64::from_le_bytes(read_bytes(reader)?));
    }
    unflatten_coordinates(&flattened).map_err(|e| StoreError::Corrupt(e.to_string()))
}

fn read_bytes<const N: usize>(reader: &mut impl Read) -> Result<[u8; N], StoreError> {
    let mut buffer = [0u8; N];
    reader.read_exact(&mut buffer).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            StoreError::Corrupt("truncated element record".to_string())
        } else {
            StoreError::Io(e)
        }
    })?;
    Ok(buffer)
}
