use crate::coord::QuadKey;
use crate::entity::Element;
use crate::store::r#trait::ElementStore;
use crate::store::StoreError;
use std::collections::HashMap;
use std::sync::RwLock;

/// Element store backed by a quad-key map. Contents are lost on drop.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    elements: RwLock<HashMap<QuadKey, Vec<Element>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of quad keys holding at least one element.
    pub fn tile_count(&self) -> usize {
        self.elements.read().unwrap().len()
    }
}

impl ElementStore for InMemoryStore {
    fn insert(&self, quad_key: &QuadKey, element: &Element) -> Result<(), StoreError> {
        self.elements
            .write()
            .unwrap()
            .entry(*quad_key)
            .or_default()
            .push(element.clone());
        Ok(())
    }

    fn elements(&self, quad_key: &QuadKey) -> Result<Vec<Element>, StoreError> {
        Ok(self
            .elements
            .read()
            .unwrap()
            .get(quad_key)
            .cloned()
            .unwrap_or_default())
    }

    fn has_data(&self, quad_key: &QuadKey) -> bool {
        self.elements
            .read()
            .unwrap()
            .get(quad_key)
            .map_or(false, |stored| !stored.is_empty())
    }

    fn flush(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.elements.write().unwrap().clear();
        Ok(())
    }
}
