//! Map element model.
//!
//! Elements are the unit of storage and tile building: nodes, ways, closed
//! areas and relations, each carrying an id and free-form tags.

mod flatten;
mod types;

pub use flatten::{
    flatten_coordinates, flatten_tags, unflatten_coordinates, unflatten_tags, FlattenError,
};
pub use types::{Area, Element, ElementKind, Node, Relation, Tag, Way};
