//! Element storage.
//!
//! Two stores back the service: [`InMemoryStore`] for scratch data and
//! [`PersistentStore`] for tile files on disk. [`GeoStore`] holds both under
//! their registry keys and runs the style-filtered import fan-out that
//! spreads each element over the quad keys it touches.

mod codec;
mod geo;
mod memory;
mod persistent;
mod r#trait;
mod types;

pub use geo::GeoStore;
pub use memory::InMemoryStore;
pub use persistent::PersistentStore;
pub use r#trait::ElementStore;
pub use types::{ImportStats, StorageKind, StoreError};
