use crate::coord::{BoundingBox, GeoCoordinate};
use crate::elevation::{ElevationError, ElevationProvider};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

const VOID_SAMPLE: i16 = -32768;

/// Elevation from SRTM `.hgt` tiles.
///
/// Tiles are named after their south-west corner (`N47E009.hgt`) and hold a
/// square grid of big-endian 16-bit samples, the first row being the
/// northern edge. Both 1 and 3 arc-second tiles work since the grid side is
/// derived from the file size. Tiles load lazily on first touch and stay
/// cached; missing tiles and void samples read as sea level.
pub struct SrtmElevationProvider {
    directory: PathBuf,
    tiles: RwLock<HashMap<(i32, i32), Option<Arc<SrtmTile>>>>,
}

struct SrtmTile {
    samples: Vec<i16>,
    side: usize,
}

impl SrtmElevationProvider {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            tiles: RwLock::new(HashMap::new()),
        }
    }

    fn tile_path(&self, cell: (i32, i32)) -> PathBuf {
        let (latitude, longitude) = cell;
        let ns = if latitude >= 0 { 'N' } else { 'S' };
        let ew = if longitude >= 0 { 'E' } else { 'W' };
        self.directory.join(format!(
            "{ns}{:02}{ew}{:03}.hgt",
            latitude.abs(),
            longitude.abs()
        ))
    }

    fn load_tile(&self, cell: (i32, i32)) -> Result<Option<Arc<SrtmTile>>, ElevationError> {
        if let Some(cached) = self.tiles.read().unwrap().get(&cell) {
            return Ok(cached.clone());
        }

        let path = self.tile_path(cell);
        let tile = match fs::read(&path) {
            Ok(bytes) => {
                let tile = Arc::new(SrtmTile::from_bytes(&path, &bytes)?);
                debug!(path = %path.display(), side = tile.side, "loaded elevation tile");
                Some(tile)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        self.tiles.write().unwrap().insert(cell, tile.clone());
        Ok(tile)
    }
}

impl ElevationProvider for SrtmElevationProvider {
    fn elevation(&self, coordinate: &GeoCoordinate) -> f64 {
        let cell = (
            coordinate.latitude.floor() as i32,
            coordinate.longitude.floor() as i32,
        );
        let tile = match self.load_tile(cell) {
            Ok(tile) => tile,
            Err(e) => {
                warn!(?cell, error = %e, "elevation tile unusable, using sea level");
                self.tiles.write().unwrap().insert(cell, None);
                None
            }
        };
        match tile {
            Some(tile) => tile.sample_bilinear(
                coordinate.latitude - f64::from(cell.0),
                coordinate.longitude - f64::from(cell.1),
            ),
            None => 0.0,
        }
    }

    fn preload(&self, bounds: &BoundingBox) -> Result<(), ElevationError> {
        let min_lat = bounds.min_point.latitude.floor() as i32;
        let max_lat = bounds.max_point.latitude.floor() as i32;
        let min_lon = bounds.min_point.longitude.floor() as i32;
        let max_lon = bounds.max_point.longitude.floor() as i32;

        for latitude in min_lat..=max_lat {
            for longitude in min_lon..=max_lon {
                self.load_tile((latitude, longitude))?;
            }
        }
        Ok(())
    }
}

impl SrtmTile {
    fn from_bytes(path: &Path, bytes: &[u8]) -> Result<Self, ElevationError> {
        if bytes.len() % 2 != 0 {
            return Err(ElevationError::Malformed {
                path: path.to_path_buf(),
                message: format!("odd file size {}", bytes.len()),
            });
        }
        let count = bytes.len() / 2;
        let side = (count as f64).sqrt().round() as usize;
        if side < 2 || side * side != count {
            return Err(ElevationError::Malformed {
                path: path.to_path_buf(),
                message: format!("{count} samples do not form a square grid"),
            });
        }

        let samples = bytes
            .chunks_exact(2)
            .map(|pair| i16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        Ok(Self { samples, side })
    }

    fn sample(&self, row: usize, col: usize) -> f64 {
        let value = self.samples[row * self.side + col];
        if value == VOID_SAMPLE {
            0.0
        } else {
            f64::from(value)
        }
    }

    /// Bilinear interpolation of the four surrounding samples.
    ///
    /// `lat_fraction` and `lon_fraction` are offsets from the tile's
    /// south-west corner in (0, 1); row 0 is the northern edge.
    fn sample_bilinear(&self, lat_fraction: f64, lon_fraction: f64) -> f64 {
        let span = (self.side - 1) as f64;
        let row = ((1.0 - lat_fraction) * span).clamp(0.0, span);
        let col = (lon_fraction * span).clamp(0.0, span);

        let row0 = (row.floor() as usize).min(self.side - 2);
        let col0 = (col.floor() as usize).min(self.side - 2);
        let t_row = row - row0 as f64;
        let t_col = col - col0 as f64;

        let top = self.sample(row0, col0) * (1.0 - t_col) + self.sample(row0, col0 + 1) * t_col;
        let bottom =
            self.sample(row0 + 1, col0) * (1.0 - t_col) + self.sample(row0 + 1, col0 + 1) * t_col;
        top * (1.0 - t_row) + bottom * t_row
    }
}
