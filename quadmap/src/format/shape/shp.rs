//! `.shp` geometry reader.
//!
//! The main file header and record headers are big-endian, record contents
//! little-endian. Z and M shape variants share the XY layout of their base
//! type; the trailing measure sections are ignored.

use crate::coord::GeoCoordinate;
use crate::format::FormatError;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

const FILE_CODE: i32 = 9994;
const VERSION: i32 = 1000;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ShapeGeometry {
    /// Placeholder keeping record numbering aligned with the attribute table.
    Null,
    Point(GeoCoordinate),
    MultiPoint(Vec<GeoCoordinate>),
    PolyLine(Vec<Vec<GeoCoordinate>>),
    Polygon(Vec<Vec<GeoCoordinate>>),
}

pub(crate) fn parse(path: &Path) -> Result<Vec<ShapeGeometry>, FormatError> {
    let mut reader = BufReader::new(File::open(path)?);
    read_header(&mut reader)?;

    let mut shapes = Vec::new();
    loop {
        let mut record_header = [0u8; 8];
        match reader.read_exact(&mut record_header) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e.into()),
        }
        let number = i32::from_be_bytes([
            record_header[0],
            record_header[1],
            record_header[2],
            record_header[3],
        ]);
        let content_words = i32::from_be_bytes([
            record_header[4],
            record_header[5],
            record_header[6],
            record_header[7],
        ]);
        let content_size = usize::try_from(content_words)
            .map_err(|_| FormatError::Shape(format!("negative content length in record {number}")))?
            * 2;

        let mut content = vec![0u8; content_size];
        reader.read_exact(&mut content)?;
        shapes.push(parse_record(&content, number)?);
    }
    Ok(shapes)
}

fn read_header(reader: &mut impl Read) -> Result<(), FormatError> {
    let mut header = [0u8; 100];
    reader.read_exact(&mut header)?;

    let file_code = i32::from_be_bytes([header[0], header[1], header[2], header[3]]);
    if file_code != FILE_CODE {
        return Err(FormatError::Shape(format!(
            "bad file code {file_code}, expected {FILE_CODE}"
        )));
    }
    let version = i32::from_le_bytes([header[28], header[29], header[30], header[31]]);
    if version != VERSION {
        return Err(FormatError::Shape(format!(
            "unsupported shapefile version {version}"
        )));
    }
    Ok(())
}

fn parse_record(content: &[u8], number: i32) -> Result<ShapeGeometry, FormatError> {
    let mut cursor = Cursor::new(content, number);
    let shape_type = cursor.read_i32()?;

    match shape_type {
        0 => Ok(ShapeGeometry::Null),
        1 | 11 | 21 => {
            let longitude = cursor.read_f64()?;
            let latitude = cursor.read_f64()?;
            Ok(ShapeGeometry::Point(GeoCoordinate::new(latitude, longitude)))
        }
        3 | 13 | 23 => Ok(ShapeGeometry::PolyLine(cursor.read_parts()?)),
        5 | 15 | 25 => Ok(ShapeGeometry::Polygon(cursor.read_parts()?)),
        8 | 18 | 28 => {
            cursor.skip(32)?; // bounding box
            let count = cursor.read_count()?;
            Ok(ShapeGeometry::MultiPoint(cursor.read_points(count)?))
        }
        other => Err(FormatError::Shape(format!(
            "unsupported shape type {other} in record {number}"
        ))),
    }
}

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
    record: i32,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8], record: i32) -> Self {
        Self {
            data,
            pos: 0,
            record,
        }
    }

    fn truncated(&self) -> FormatError {
        FormatError::Shape(format!("truncated content in record {}", self.record))
    }

    fn take(&mut self, size: usize) -> Result<&'a [u8], FormatError> {
        let end = self.pos.checked_add(size).ok_or_else(|| self.truncated())?;
        if end > self.data.len() {
            return Err(self.truncated());
        }
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn skip(&mut self, size: usize) -> Result<(), FormatError> {
        self.take(size).map(|_| ())
    }

    fn read_i32(&mut self) -> Result<i32, FormatError> {
        let bytes = self.take(4)?;
        Ok(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_f64(&mut self) -> Result<f64, FormatError> {
        let bytes = self.take(8)?;
        Ok(f64::from_le_bytes([
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        ]))
    }

    fn read_count(&mut self) -> Result<usize, FormatError> {
        let value = self.read_i32()?;
        usize::try_from(value).map_err(|_| {
            FormatError::Shape(format!("negative count in record {}", self.record))
        })
    }

    fn read_points(&mut self, count: usize) -> Result<Vec<GeoCoordinate>, FormatError> {
        let mut points = Vec::new();
        for _ in 0..count {
            let longitude = self.read_f64()?;
            let latitude = self.read_f64()?;
            points.push(GeoCoordinate::new(latitude, longitude));
        }
        Ok(points)
    }

    /// Shared layout of polyline and polygon records: bounding box, part
    /// offsets, then the point array.
    fn read_parts(&mut self) -> Result<Vec<Vec<GeoCoordinate>>, FormatError> {
        self.skip(32)?; // bounding box
        let part_count = self.read_count()?;
        let point_count = self.read_count()?;

        let mut offsets = Vec::new();
        for _ in 0..part_count {
            offsets.push(self.read_count()?);
        }
        let points = self.read_points(point_count)?;

        let mut parts = Vec::with_capacity(part_count);
        for (i, &start) in offsets.iter().enumerate() {
            let end = offsets.get(i + 1).copied().unwrap_or(points.len());
            if start > end || end > points.len() {
                return Err(FormatError::Shape(format!(
                    "invalid part offsets in record {}",
                    self.record
                )));
            }
            parts.push(points[start..end].to_vec());
        }
        Ok(parts)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Binary builders shared with the attribute and assembly tests.

    pub fn shp_header(shape_type: i32) -> Vec<u8> {
        let mut header = vec![0u8; 100];
        header[0..4].copy_from_slice(&9994i32.to_be_bytes());
        header[28..32].copy_from_slice(&1000i32.to_le_bytes());
        header[32..36].copy_from_slice(&shape_type.to_le_bytes());
        header
    }

    pub fn record(number: i32, content: &[u8]) -> Vec<u8> {
        assert_eq!(content.len() % 2, 0, "content must be whole 16-bit words");
        let mut out = Vec::new();
        out.extend_from_slice(&number.to_be_bytes());
        out.extend_from_slice(&((content.len() / 2) as i32).to_be_bytes());
        out.extend_from_slice(content);
        out
    }

    pub fn point_content(longitude: f64, latitude: f64) -> Vec<u8> {
        let mut content = 1i32.to_le_bytes().to_vec();
        content.extend_from_slice(&longitude.to_le_bytes());
        content.extend_from_slice(&latitude.to_le_bytes());
        content
    }

    pub fn parts_content(shape_type: i32, parts: &[&[(f64, f64)]]) -> Vec<u8> {
        let mut content = shape_type.to_le_bytes().to_vec();
        content.extend_from_slice(&[0u8; 32]); // bounding box
        content.extend_from_slice(&(parts.len() as i32).to_le_bytes());
        let total: usize = parts.iter().map(|part| part.len()).sum();
        content.extend_from_slice(&(total as i32).to_le_bytes());
        let mut offset = 0i32;
        for part in parts {
            content.extend_from_slice(&offset.to_le_bytes());
            offset += part.len() as i32;
        }
        for part in parts {
            for (longitude, latitude) in *part {
                content.extend_from_slice(&longitude.to_le_bytes());
                content.extend_from_slice(&latitude.to_le_bytes());
            }
        }
        content
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use std::io::Write;

    fn write_shp(dir: &Path, name: &str, body: &[u8]) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).expect("Failed to create shapefile");
        file.write_all(body).expect("Failed to write shapefile");
        path
    }

    #[test]
    fn test_point_records() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let mut body = shp_header(1);
        body.extend(record(1, &point_content(13.38, 52.52)));
        body.extend(record(2, &point_content(2.29, 48.85)));
        let path = write_shp(dir.path(), "points.shp", &body);

        let shapes = parse(&path).expect("File should parse");
        assert_eq!(shapes.len(), 2);
        assert_eq!(
            shapes[0],
            ShapeGeometry::Point(GeoCoordinate::new(52.52, 13.38)),
            "x maps to longitude, y to latitude"
        );
    }

    #[test]
    fn test_polygon_with_hole() {
        let outer = [(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0), (0.0, 0.0)];
        let hole = [(0.25, 0.25), (0.75, 0.25), (0.75, 0.75), (0.25, 0.75), (0.25, 0.25)];
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let mut body = shp_header(5);
        body.extend(record(1, &parts_content(5, &[&outer, &hole])));
        let path = write_shp(dir.path(), "areas.shp", &body);

        let shapes = parse(&path).expect("File should parse");
        let ShapeGeometry::Polygon(rings) = &shapes[0] else {
            panic!("expected polygon");
        };
        assert_eq!(rings.len(), 2);
        assert_eq!(rings[0].len(), 5);
        assert_eq!(rings[1].len(), 5);
    }

    #[test]
    fn test_polyline_parts() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let mut body = shp_header(3);
        body.extend(record(
            1,
            &parts_content(3, &[&[(0.0, 0.0), (1.0, 0.0)], &[(2.0, 2.0), (3.0, 3.0), (4.0, 4.0)]]),
        ));
        let path = write_shp(dir.path(), "lines.shp", &body);

        let shapes = parse(&path).expect("File should parse");
        let ShapeGeometry::PolyLine(parts) = &shapes[0] else {
            panic!("expected polyline");
        };
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].len(), 2);
        assert_eq!(parts[1].len(), 3);
    }

    #[test]
    fn test_null_record_keeps_numbering() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let mut body = shp_header(1);
        body.extend(record(1, &0i32.to_le_bytes()));
        body.extend(record(2, &point_content(1.0, 2.0)));
        let path = write_shp(dir.path(), "sparse.shp", &body);

        let shapes = parse(&path).expect("File should parse");
        assert_eq!(shapes.len(), 2);
        assert_eq!(shapes[0], ShapeGeometry::Null);
    }

    #[test]
    fn test_bad_file_code() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let mut body = shp_header(1);
        body[0..4].copy_from_slice(&1234i32.to_be_bytes());
        let path = write_shp(dir.path(), "bad.shp", &body);

        let err = parse(&path).unwrap_err();
        assert!(matches!(err, FormatError::Shape(message) if message.contains("file code")));
    }

    #[test]
    fn test_unsupported_shape_type() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let mut body = shp_header(31);
        body.extend(record(1, &31i32.to_le_bytes()));
        let path = write_shp(dir.path(), "patches.shp", &body);

        let err = parse(&path).unwrap_err();
        assert!(matches!(err, FormatError::Shape(message) if message.contains("shape type 31")));
    }

    #[test]
    fn test_truncated_record_content() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let mut body = shp_header(1);
        let full = record(1, &point_content(1.0, 2.0));
        body.extend(&full[..full.len() - 6]);
        let path = write_shp(dir.path(), "cut.shp", &body);

        assert!(parse(&path).is_err());
    }
}
