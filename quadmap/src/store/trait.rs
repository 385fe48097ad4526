use crate::coord::QuadKey;
use crate::entity::Element;
use crate::store::StoreError;

/// Tile-addressed element storage.
///
/// Implementations are shared across threads behind `Arc`, so every method
/// takes `&self` and handles its own locking.
pub trait ElementStore: Send + Sync {
    /// Stores a copy of the element under the given quad key.
    fn insert(&self, quad_key: &QuadKey, element: &Element) -> Result<(), StoreError>;

    /// All elements stored under the given quad key.
    fn elements(&self, quad_key: &QuadKey) -> Result<Vec<Element>, StoreError>;

    /// Whether anything is stored under the given quad key.
    fn has_data(&self, quad_key: &QuadKey) -> bool;

    /// Makes buffered writes durable. A no-op for purely in-memory stores.
    fn flush(&self) -> Result<(), StoreError>;

    /// Drops every stored element, buffered or durable.
    fn clear(&self) -> Result<(), StoreError>;
}
