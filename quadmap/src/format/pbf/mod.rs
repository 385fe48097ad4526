//! OSM PBF parser.

mod proto;

use crate::coord::GeoCoordinate;
use crate::entity::{Element, Tag};
use crate::format::{ElementAssembler, FormatError, MemberKind, MemberRef};
use flate2::read::ZlibDecoder;
use prost::Message;
use std::io::{self, Read};
use tracing::debug;

// Size caps from the PBF format definition.
const MAX_BLOB_HEADER_SIZE: usize = 64 * 1024;
const MAX_BLOB_SIZE: usize = 32 * 1024 * 1024;

const SUPPORTED_FEATURES: [&str; 2] = ["OsmSchema-V0.6", "DenseNodes"];

pub(crate) fn parse(reader: &mut impl Read) -> Result<Vec<Element>, FormatError> {
    let mut assembler = ElementAssembler::new();

    loop {
        let mut length = [0u8; 4];
        match reader.read_exact(&mut length) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e.into()),
        }
        let header_size = u32::from_be_bytes(length) as usize;
        if header_size > MAX_BLOB_HEADER_SIZE {
            return Err(FormatError::Pbf(format!(
                "blob header of {header_size} bytes exceeds the format limit"
            )));
        }

        let header_bytes = read_exact_vec(reader, header_size)?;
        let header = proto::BlobHeader::decode(header_bytes.as_slice())?;
        let blob_size = usize::try_from(header.datasize)
            .map_err(|_| FormatError::Pbf(format!("negative blob size {}", header.datasize)))?;
        if blob_size > MAX_BLOB_SIZE {
            return Err(FormatError::Pbf(format!(
                "blob of {blob_size} bytes exceeds the format limit"
            )));
        }

        let blob_bytes = read_exact_vec(reader, blob_size)?;
        let blob = proto::Blob::decode(blob_bytes.as_slice())?;
        let data = decompress(blob)?;

        match header.r#type.as_str() {
            "OSMHeader" => check_header(&proto::HeaderBlock::decode(data.as_slice())?)?,
            "OSMData" => {
                read_block(&proto::PrimitiveBlock::decode(data.as_slice())?, &mut assembler)
            }
            other => debug!(blob_type = other, "skipping unknown blob"),
        }
    }

    Ok(assembler.finish())
}

fn read_exact_vec(reader: &mut impl Read, size: usize) -> Result<Vec<u8>, FormatError> {
    let mut buffer = vec![0u8; size];
    reader.read_exact(&mut buffer)?;
    Ok(buffer)
}

fn decompress(blob: proto::Blob) -> Result<Vec<u8>, FormatError> {
    if let Some(raw) = blob.raw {
        return Ok(raw);
    }
    if let Some(compressed) = blob.zlib_data {
        let mut data = match blob.raw_size {
            Some(size) if size > 0 => Vec::with_capacity(size as usize),
            _ => Vec::new(),
        };
        ZlibDecoder::new(compressed.as_slice()).read_to_end(&mut data)?;
        return Ok(data);
    }
    Err(FormatError::Pbf("unsupported blob compression".to_string()))
}

fn check_header(header: &proto::HeaderBlock) -> Result<(), FormatError> {
    for feature in &header.required_features {
        if !SUPPORTED_FEATURES.contains(&feature.as_str()) {
            return Err(FormatError::Pbf(format!(
                "unsupported required feature `{feature}`"
            )));
        }
    }
    Ok(())
}

fn read_block(block: &proto::PrimitiveBlock, assembler: &mut ElementAssembler) {
    let strings: Vec<String> = block
        .stringtable
        .s
        .iter()
        .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
        .collect();
    let granularity = i64::from(block.granularity.unwrap_or(100));
    let lat_offset = block.lat_offset.unwrap_or(0);
    let lon_offset = block.lon_offset.unwrap_or(0);
    let degrees = |offset: i64, raw: i64| 1e-9 * (offset + granularity * raw) as f64;

    for group in &block.primitivegroup {
        for node in &group.nodes {
            assembler.add_node(
                node.id,
                GeoCoordinate::new(degrees(lat_offset, node.lat), degrees(lon_offset, node.lon)),
                tags_from_indices(&node.keys, &node.vals, &strings),
            );
        }
        if let Some(dense) = &group.dense {
            read_dense(dense, &strings, lat_offset, lon_offset, granularity, assembler);
        }
        for way in &group.ways {
            let refs = delta_decode(&way.refs);
            assembler.add_way(way.id, &refs, tags_from_indices(&way.keys, &way.vals, &strings));
        }
        for relation in &group.relations {
            assembler.add_relation(
                relation.id,
                &relation_members(relation, &strings),
                tags_from_indices(&relation.keys, &relation.vals, &strings),
            );
        }
    }
}

fn read_dense(
    dense: &proto::DenseNodes,
    strings: &[String],
    lat_offset: i64,
    lon_offset: i64,
    granularity: i64,
    assembler: &mut ElementAssembler,
) {
    let count = dense.id.len().min(dense.lat.len()).min(dense.lon.len());
    let mut id = 0i64;
    let mut lat = 0i64;
    let mut lon = 0i64;
    let mut kv_index = 0usize;

    for i in 0..count {
        id += dense.id[i];
        lat += dense.lat[i];
        lon += dense.lon[i];

        let mut tags = Vec::new();
        while kv_index < dense.keys_vals.len() {
            let key_index = dense.keys_vals[kv_index];
            kv_index += 1;
            if key_index == 0 {
                break;
            }
            if kv_index >= dense.keys_vals.len() {
                break;
            }
            let value_index = dense.keys_vals[kv_index];
            kv_index += 1;
            if let (Some(key), Some(value)) = (
                string_at(strings, key_index),
                string_at(strings, value_index),
            ) {
                tags.push(Tag { key, value });
            }
        }

        assembler.add_node(
            id,
            GeoCoordinate::new(
                1e-9 * (lat_offset + granularity * lat) as f64,
                1e-9 * (lon_offset + granularity * lon) as f64,
            ),
            tags,
        );
    }
}

fn tags_from_indices(keys: &[u32], vals: &[u32], strings: &[String]) -> Vec<Tag> {
    keys.iter()
        .zip(vals)
        .filter_map(|(&key, &value)| {
            Some(Tag {
                key: strings.get(key as usize)?.clone(),
                value: strings.get(value as usize)?.clone(),
            })
        })
        .collect()
}

fn string_at(strings: &[String], index: i32) -> Option<String> {
    let index = usize::try_from(index).ok()?;
    strings.get(index).cloned()
}

fn delta_decode(deltas: &[i64]) -> Vec<i64> {
    let mut accumulator = 0i64;
    deltas
        .iter()
        .map(|delta| {
            accumulator += delta;
            accumulator
        })
        .collect()
}

fn relation_members(relation: &proto::Relation, strings: &[String]) -> Vec<MemberRef> {
    let mut members = Vec::new();
    let mut member_id = 0i64;
    for (i, delta) in relation.memids.iter().enumerate() {
        member_id += delta;
        let Some(member_type) = relation
            .types
            .get(i)
            .and_then(|&value| proto::MemberType::try_from(value).ok())
        else {
            continue;
        };
        let kind = match member_type {
            proto::MemberType::Node => MemberKind::Node,
            proto::MemberType::Way => MemberKind::Way,
            proto::MemberType::Relation => MemberKind::Relation,
        };
        let role = relation
            .roles_sid
            .get(i)
            .and_then(|&sid| string_at(strings, sid))
            .unwrap_or_default();
        members.push(MemberRef {
            kind,
            id: member_id,
            role,
        });
    }
    members
}
