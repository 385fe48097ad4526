//! `.dbf` attribute reader.
//!
//! Field values become tags on the elements of the matching geometry
//! record. Field names are lowercased and blank values are dropped.

use crate::entity::Tag;
use crate::format::FormatError;
use std::fs;
use std::path::Path;

const FIELD_DESCRIPTOR_SIZE: usize = 32;
const HEADER_TERMINATOR: u8 = 0x0D;
const DELETED_FLAG: u8 = 0x2A;

pub(crate) fn parse(path: &Path) -> Result<Vec<Vec<Tag>>, FormatError> {
    let bytes = fs::read(path)?;
    if bytes.len() < 32 {
        return Err(FormatError::Shape("attribute table too short".to_string()));
    }

    let record_count = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize;
    let header_size = u16::from_le_bytes([bytes[8], bytes[9]]) as usize;
    let record_size = u16::from_le_bytes([bytes[10], bytes[11]]) as usize;
    if record_size == 0 {
        return Err(FormatError::Shape("zero attribute record size".to_string()));
    }

    let fields = read_fields(&bytes, header_size)?;

    let mut records = Vec::with_capacity(record_count);
    for i in 0..record_count {
        let start = header_size + i * record_size;
        let end = start + record_size;
        if end > bytes.len() {
            return Err(FormatError::Shape(format!(
                "attribute table truncated at record {}",
                i + 1
            )));
        }
        records.push(read_record(&bytes[start..end], &fields));
    }
    Ok(records)
}

struct Field {
    name: String,
    length: usize,
}

fn read_fields(bytes: &[u8], header_size: usize) -> Result<Vec<Field>, FormatError> {
    let mut fields = Vec::new();
    let mut offset = FIELD_DESCRIPTOR_SIZE;

    while offset < bytes.len() && bytes[offset] != HEADER_TERMINATOR {
        if offset + FIELD_DESCRIPTOR_SIZE > bytes.len() || offset >= header_size {
            return Err(FormatError::Shape(
                "truncated attribute field descriptors".to_string(),
            ));
        }
        let descriptor = &bytes[offset..offset + FIELD_DESCRIPTOR_SIZE];
        let name_end = descriptor[..11].iter().position(|&b| b == 0).unwrap_or(11);
        let name = String::from_utf8_lossy(&descriptor[..name_end])
            .trim()
            .to_lowercase();
        fields.push(Field {
            name,
            length: descriptor[16] as usize,
        });
        offset += FIELD_DESCRIPTOR_SIZE;
    }
    Ok(fields)
}

fn read_record(record: &[u8], fields: &[Field]) -> Vec<Tag> {
    if record.first() == Some(&DELETED_FLAG) {
        return Vec::new();
    }

    let mut tags = Vec::new();
    let mut pos = 1;
    for field in fields {
        if pos + field.length > record.len() {
            break;
        }
        let raw = &record[pos..pos + field.length];
        pos += field.length;

        let value = String::from_utf8_lossy(raw)
            .trim_matches(|c: char| c.is_whitespace() || c == '\0')
            .to_string();
        if !field.name.is_empty() && !value.is_empty() {
            tags.push(Tag {
                key: field.name.clone(),
                value,
            });
        }
    }
    tags
}
