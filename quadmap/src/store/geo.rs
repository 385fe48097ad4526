use crate::coord::{quad_key_bounds, quad_keys_in, BoundingBox, LodRange, QuadKey};
use crate::entity::Element;
use crate::store::r#trait::ElementStore;
use crate::store::{ImportStats, StoreError};
use crate::style::StyleProvider;
use std::sync::Arc;
use tracing::{debug, info};

/// Registry of element stores plus the import fan-out logic.
///
/// Imports are style-filtered: an element only lands at a level of detail
/// where the stylesheet matches it, and is stored under every quad key its
/// bounding box touches at that level. Elements without geometry or without
/// any matching rule are counted as skipped.
pub struct GeoStore {
    stores: Vec<(String, Arc<dyn ElementStore>)>,
}

impl GeoStore {
    pub fn new() -> Self {
        Self { stores: Vec::new() }
    }

    pub fn register(&mut self, key: impl Into<String>, store: Arc<dyn ElementStore>) {
        let key = key.into();
        debug!(key, "registered element store");
        self.stores.push((key, store));
    }

    pub fn store(&self, key: &str) -> Result<&Arc<dyn ElementStore>, StoreError> {
        self.stores
            .iter()
            .find(|(registered, _)| registered == key)
            .map(|(_, store)| store)
            .ok_or_else(|| StoreError::UnknownStore(key.to_string()))
    }

    pub fn store_keys(&self) -> Vec<&str> {
        self.stores.iter().map(|(key, _)| key.as_str()).collect()
    }

    /// Imports elements across a level of detail range.
    pub fn import(
        &self,
        key: &str,
        elements: impl IntoIterator<Item = Element>,
        range: &LodRange,
        styles: &StyleProvider,
    ) -> Result<ImportStats, StoreError> {
        self.import_filtered(key, elements, range, styles, |_| true)
    }

    /// Imports elements into a single quad key.
    ///
    /// Elements outside the tile or unmatched by the stylesheet at the
    /// tile's level of detail are skipped.
    pub fn import_in_quad_key(
        &self,
        key: &str,
        elements: impl IntoIterator<Item = Element>,
        quad_key: &QuadKey,
        styles: &StyleProvider,
    ) -> Result<ImportStats, StoreError> {
        let store = self.store(key)?;
        let tile_bounds = quad_key_bounds(quad_key);
        let mut stats = ImportStats::default();

        for element in elements {
            stats.read += 1;
            let in_tile = element
                .bounding_box()
                .map_or(false, |bounds| bounds.intersects(&tile_bounds));
            if in_tile
                && styles
                    .for_element(&element, quad_key.level_of_detail)
                    .is_some()
            {
                store.insert(quad_key, &element)?;
                stats.stored += 1;
            } else {
                stats.skipped += 1;
            }
        }

        info!(key, quad_key = %quad_key, %stats, "import finished");
        Ok(stats)
    }

    /// Imports elements across a level of detail range, restricted to quad
    /// keys intersecting the given bounding box.
    pub fn import_in_bounding_box(
        &self,
        key: &str,
        elements: impl IntoIterator<Item = Element>,
        bounds: &BoundingBox,
        range: &LodRange,
        styles: &StyleProvider,
    ) -> Result<ImportStats, StoreError> {
        let limit = *bounds;
        self.import_filtered(key, elements, range, styles, move |quad_key| {
            quad_key_bounds(quad_key).intersects(&limit)
        })
    }

    fn import_filtered(
        &self,
        key: &str,
        elements: impl IntoIterator<Item = Element>,
        range: &LodRange,
        styles: &StyleProvider,
        accept: impl Fn(&QuadKey) -> bool,
    ) -> Result<ImportStats, StoreError> {
        let store = self.store(key)?;
        let mut stats = ImportStats::default();

        for element in elements {
            stats.read += 1;
            let Some(bounds) = element.bounding_box() else {
                stats.skipped += 1;
                continue;
            };

            let mut stored = false;
            for level_of_detail in range.levels() {
                if styles.for_element(&element, level_of_detail).is_none() {
                    continue;
                }
                for quad_key in quad_keys_in(&bounds, level_of_detail)? {
                    if !accept(&quad_key) {
                        continue;
                    }
                    store.insert(&quad_key, &element)?;
                    stored = true;
                }
            }

            if stored {
                stats.stored += 1;
            } else {
                stats.skipped += 1;
            }
        }

        info!(key, range = %range, %stats, "import finished");
        Ok(stats)
    }

    /// Whether any registered store has data for the quad key.
    pub fn has_data(&self, quad_key: &QuadKey) -> bool {
        self.stores.iter().any(|(_, store)| store.has_data(quad_key))
    }

    /// Elements for the quad key collected across every registered store.
    pub fn elements_in(&self, quad_key: &QuadKey) -> Result<Vec<Element>, StoreError> {
        let mut elements = Vec::new();
        for (_, store) in &self.stores {
            elements.extend(store.elements(quad_key)?);
        }
        Ok(elements)
    }

    pub fn flush(&self) -> Result<(), StoreError> {
        for (_, store) in &self.stores {
            store.flush()?;
        }
        Ok(())
    }
}

impl Default for GeoStore {
    fn default() -> Self {
        Self::new()
    }
}
