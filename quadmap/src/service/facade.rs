//! Map service facade implementation.

use super::config::ServiceConfig;
use super::error::ServiceError;
use crate::builder::{LoadedElement, QuadKeyBuilder};
use crate::coord::{quad_key_bounds, BoundingBox, LodRange, QuadKey, MAX_LOD, MIN_LOD};
use crate::elevation::{ElevationProvider, FlatElevationProvider, SrtmElevationProvider};
use crate::entity::Element;
use crate::format;
use crate::mesh::Mesh;
use crate::store::{GeoStore, ImportStats, InMemoryStore, PersistentStore, StorageKind};
use crate::strings::StringTable;
use crate::style::StyleProvider;
use dashmap::DashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Everything loaded for one quad key.
#[derive(Debug)]
pub struct TileContent {
    /// The tile that was built.
    pub quad_key: QuadKey,
    /// Meshes produced by the builders, terrain included.
    pub meshes: Vec<Mesh>,
    /// Styled elements inside the tile with their resolved styles.
    pub elements: Vec<LoadedElement>,
}

/// High-level facade over stores, stylesheets, elevation and mesh building.
///
/// Owns the two element stores registered at startup, the string table
/// backing persisted tags and a cache of parsed stylesheets. One instance
/// is meant to live for the whole session; buffered writes flush on drop.
///
/// # Example
///
/// ```ignore
/// use quadmap::coord::{to_quad_key, LodRange};
/// use quadmap::service::{MapService, ServiceConfig};
/// use quadmap::store::StorageKind;
///
/// let config = ServiceConfig::new("index", "data", "elevation");
/// let service = MapService::new(config)?;
///
/// let range = LodRange::new(14, 16)?;
/// service.add_to_store(StorageKind::Persistent, style, osm_file, &range)?;
///
/// let content = service.load_quad_key(style, to_quad_key(52.52, 13.38, 16)?)?;
/// println!("{} meshes", content.meshes.len());
/// ```
pub struct MapService {
    /// Service configuration
    config: ServiceConfig,
    /// Shared string interning table
    strings: Arc<StringTable>,
    /// Registered element stores
    stores: GeoStore,
    /// Mesh builder registry
    builder: QuadKeyBuilder,
    /// Parsed stylesheets keyed by path
    styles: DashMap<PathBuf, Arc<StyleProvider>>,
    /// SRTM elevation for detailed tiles
    srtm: SrtmElevationProvider,
    /// Sea level fallback
    flat: FlatElevationProvider,
}

impl MapService {
    /// Create a service from configuration.
    ///
    /// Prepares the directory layout: the string table and elevation
    /// directories, plus one tile directory per level of detail under the
    /// map data path. Registers the in-memory and persistent stores under
    /// their fixed keys.
    ///
    /// # Arguments
    ///
    /// * `config` - Validated paths and terrain settings
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, a directory
    /// cannot be created or the string table fails to open.
    pub fn new(config: ServiceConfig) -> Result<Self, ServiceError> {
        config.validate()?;

        fs::create_dir_all(config.strings_path())?;
        fs::create_dir_all(config.elevation_path())?;
        // One directory per level of detail, so tile files never share a
        // flat namespace.
        for level_of_detail in MIN_LOD..=MAX_LOD {
            fs::create_dir_all(config.map_data_path().join(level_of_detail.to_string()))?;
        }

        let strings = Arc::new(StringTable::open(config.strings_path())?);

        let mut stores = GeoStore::new();
        stores.register(
            StorageKind::InMemory.store_key(),
            Arc::new(InMemoryStore::new()),
        );
        stores.register(
            StorageKind::Persistent.store_key(),
            Arc::new(PersistentStore::new(config.map_data_path(), strings.clone())),
        );

        let srtm = SrtmElevationProvider::new(config.elevation_path());

        info!(
            map_data = %config.map_data_path().display(),
            strings = strings.len(),
            "map service ready"
        );

        Ok(Self {
            config,
            strings,
            stores,
            builder: QuadKeyBuilder::with_default_builders(),
            styles: DashMap::new(),
            srtm,
            flat: FlatElevationProvider::new(),
        })
    }

    /// Get the service configuration.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Registry keys of the element stores, in registration order.
    pub fn store_keys(&self) -> Vec<&str> {
        self.stores.store_keys()
    }

    /// Parse a stylesheet and keep it cached for later operations.
    ///
    /// Imports and tile loads resolve stylesheets through the same cache,
    /// so registering ahead of time just front-loads the parse.
    pub fn register_stylesheet(&self, path: &Path) -> Result<(), ServiceError> {
        self.stylesheet(path)?;
        Ok(())
    }

    /// Import a map data file across a level of detail range.
    ///
    /// The format is picked by file extension. Elements are filtered
    /// through the stylesheet and stored under every quad key they touch
    /// at each level where a rule matches.
    ///
    /// # Arguments
    ///
    /// * `storage` - Which registered store receives the elements
    /// * `style_path` - Stylesheet used to filter elements per level
    /// * `data_path` - Map data file to import
    /// * `range` - Levels of detail to index the elements at
    ///
    /// # Errors
    ///
    /// Returns an error if either file cannot be parsed or a store write
    /// fails.
    pub fn add_to_store(
        &self,
        storage: StorageKind,
        style_path: &Path,
        data_path: &Path,
        range: &LodRange,
    ) -> Result<ImportStats, ServiceError> {
        let styles = self.stylesheet(style_path)?;
        let elements = format::parse_file(data_path)?;
        Ok(self
            .stores
            .import(storage.store_key(), elements, range, &styles)?)
    }

    /// Import a map data file into a single quad key.
    ///
    /// Elements outside the tile or unmatched by the stylesheet at the
    /// tile's level of detail are skipped.
    pub fn add_to_store_in_quad_key(
        &self,
        storage: StorageKind,
        style_path: &Path,
        data_path: &Path,
        quad_key: &QuadKey,
    ) -> Result<ImportStats, ServiceError> {
        let styles = self.stylesheet(style_path)?;
        let elements = format::parse_file(data_path)?;
        Ok(self
            .stores
            .import_in_quad_key(storage.store_key(), elements, quad_key, &styles)?)
    }

    /// Import a map data file restricted to a geographic region.
    ///
    /// Works like [`add_to_store`] but only stores under quad keys whose
    /// bounds intersect the given box.
    ///
    /// [`add_to_store`]: MapService::add_to_store
    pub fn add_to_store_in_bounding_box(
        &self,
        storage: StorageKind,
        style_path: &Path,
        data_path: &Path,
        bounds: &BoundingBox,
        range: &LodRange,
    ) -> Result<ImportStats, ServiceError> {
        let styles = self.stylesheet(style_path)?;
        let elements = format::parse_file(data_path)?;
        Ok(self.stores.import_in_bounding_box(
            storage.store_key(),
            elements,
            bounds,
            range,
            &styles,
        )?)
    }

    /// Import a single element built in code rather than read from a file.
    pub fn add_element_to_store(
        &self,
        storage: StorageKind,
        style_path: &Path,
        element: &Element,
        range: &LodRange,
    ) -> Result<ImportStats, ServiceError> {
        let styles = self.stylesheet(style_path)?;
        Ok(self.stores.import(
            storage.store_key(),
            std::iter::once(element.clone()),
            range,
            &styles,
        )?)
    }

    /// Whether any registered store holds elements for the quad key.
    pub fn has_data(&self, quad_key: &QuadKey) -> bool {
        self.stores.has_data(quad_key)
    }

    /// Build a tile: meshes plus the styled elements inside the quad key.
    ///
    /// Elements come from every registered store. The canvas rule drives
    /// a terrain grid even when the tile holds no elements, and each
    /// element routes to the builder its style names.
    ///
    /// # Errors
    ///
    /// Returns an error if the stylesheet fails to parse or a store read
    /// fails. Missing elevation tiles are not an error; affected vertices
    /// sit at sea level.
    pub fn load_quad_key(
        &self,
        style_path: &Path,
        quad_key: QuadKey,
    ) -> Result<TileContent, ServiceError> {
        let styles = self.stylesheet(style_path)?;
        let elevation = self.elevation_for(quad_key.level_of_detail);
        let built = self.builder.build(
            &self.stores,
            &styles,
            quad_key,
            elevation,
            self.config.terrain_grid_size(),
        )?;
        Ok(TileContent {
            quad_key,
            meshes: built.meshes,
            elements: built.elements,
        })
    }

    /// Load every elevation tile covering the quad key ahead of time.
    ///
    /// A no-op when the quad key's level of detail resolves to flat
    /// elevation.
    ///
    /// # Errors
    ///
    /// Returns an error when an elevation tile exists but cannot be read.
    /// Missing tiles are fine; they read as sea level later.
    pub fn preload_elevation(&self, quad_key: &QuadKey) -> Result<(), ServiceError> {
        let bounds = quad_key_bounds(quad_key);
        self.elevation_for(quad_key.level_of_detail)
            .preload(&bounds)?;
        Ok(())
    }

    /// Write buffered tile and string data through to disk.
    pub fn flush(&self) -> Result<(), ServiceError> {
        self.stores.flush()?;
        self.strings.flush()?;
        Ok(())
    }

    fn stylesheet(&self, path: &Path) -> Result<Arc<StyleProvider>, ServiceError> {
        if let Some(cached) = self.styles.get(path) {
            return Ok(cached.value().clone());
        }
        let provider = Arc::new(StyleProvider::from_file(path)?);
        self.styles.insert(path.to_path_buf(), provider.clone());
        Ok(provider)
    }

    fn elevation_for(&self, level_of_detail: i32) -> &dyn ElevationProvider {
        match self.config.srtm_lod_start() {
            Some(threshold) if level_of_detail >= threshold => &self.srtm,
            _ => &self.flat,
        }
    }
}

impl Drop for MapService {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            warn!(error = %e, "flush on drop failed");
        }
    }
}
