//! Tile mesh construction.
//!
//! A tile build gathers the quad key's elements from the stores, resolves
//! each element's style and routes it to the mesh builder named by the
//! style's `builder` declaration. Builder instances live for one tile and
//! stream finished meshes through a sink; empty meshes are dropped rather
//! than emitted. Styled elements are reported alongside the meshes whether
//! or not a builder consumed them.

mod barrier;
mod building;
mod terrain;
mod tree;

pub use barrier::BarrierBuilder;
pub use building::BuildingBuilder;
pub use terrain::TerrainBuilder;
pub use tree::TreeBuilder;

use crate::coord::{quad_key_bounds, BoundingBox, GeoCoordinate, QuadKey};
use crate::elevation::ElevationProvider;
use crate::entity::{Element, Tag};
use crate::mesh::Mesh;
use crate::store::{GeoStore, StoreError};
use crate::style::{Style, StyleProvider};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Per-tile state shared by every mesh builder.
pub struct BuilderContext<'a> {
    pub quad_key: QuadKey,
    /// Geographic extent of the tile.
    pub bounds: BoundingBox,
    /// Merged canvas style at the tile's level of detail; empty when the
    /// stylesheet has no canvas rule there.
    pub canvas: Style,
    /// Terrain grid resolution used when the canvas does not override it.
    pub grid_size: usize,
    elevation: &'a dyn ElevationProvider,
}

impl<'a> BuilderContext<'a> {
    pub fn new(
        quad_key: QuadKey,
        canvas: Style,
        grid_size: usize,
        elevation: &'a dyn ElevationProvider,
    ) -> Self {
        Self {
            quad_key,
            bounds: quad_key_bounds(&quad_key),
            canvas,
            grid_size,
            elevation,
        }
    }

    /// Terrain height in meters at a coordinate.
    pub fn elevation_at(&self, coordinate: &GeoCoordinate) -> f64 {
        self.elevation.elevation(coordinate)
    }
}

/// Receives meshes as builders finish them.
pub type MeshSink<'a> = dyn FnMut(Mesh) + 'a;

/// Builds meshes for the styled elements of one tile.
///
/// An instance is created per tile from a registered factory and visited
/// with every element whose style names it; `complete` runs once after the
/// last element so aggregating builders can emit.
pub trait ElementBuilder {
    fn visit(
        &mut self,
        element: &Element,
        style: &Style,
        context: &BuilderContext<'_>,
        sink: &mut MeshSink<'_>,
    );

    fn complete(&mut self, _context: &BuilderContext<'_>, _sink: &mut MeshSink<'_>) {}
}

/// A styled element reported from a tile build: identity, tags, raw
/// geometry and the merged style, all owned.
#[derive(Debug, Clone)]
pub struct LoadedElement {
    pub id: i64,
    pub tags: Vec<Tag>,
    pub geometry: Vec<GeoCoordinate>,
    pub style: Style,
}

/// Everything one tile build produced.
#[derive(Debug)]
pub struct BuiltTile {
    pub meshes: Vec<Mesh>,
    pub elements: Vec<LoadedElement>,
}

type BuilderFactory = Box<dyn Fn() -> Box<dyn ElementBuilder> + Send + Sync>;

/// Registry of mesh builder factories plus the per-tile dispatch loop.
pub struct QuadKeyBuilder {
    factories: HashMap<String, BuilderFactory>,
}

impl QuadKeyBuilder {
    /// An empty registry; elements still resolve styles but no meshes are
    /// produced.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registry with the standard builders: `terrain`, `building`, `tree`
    /// and `barrier`.
    pub fn with_default_builders() -> Self {
        let mut registry = Self::new();
        registry.register("terrain", || Box::new(TerrainBuilder::new()));
        registry.register("building", || Box::new(BuildingBuilder::new()));
        registry.register("tree", || Box::new(TreeBuilder::new()));
        registry.register("barrier", || Box::new(BarrierBuilder::new()));
        registry
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        factory: impl Fn() -> Box<dyn ElementBuilder> + Send + Sync + 'static,
    ) {
        self.factories.insert(name.into(), Box::new(factory));
    }

    /// Build one tile.
    ///
    /// Gathers elements across the registered stores, dispatches them to
    /// builders and collects the non-empty meshes plus every styled element.
    pub fn build(
        &self,
        store: &GeoStore,
        styles: &StyleProvider,
        quad_key: QuadKey,
        elevation: &dyn ElevationProvider,
        grid_size: usize,
    ) -> Result<BuiltTile, StoreError> {
        let elements = store.elements_in(&quad_key)?;
        let level_of_detail = quad_key.level_of_detail;
        let canvas = styles.canvas_style(level_of_detail).unwrap_or_default();
        let has_canvas = !canvas.is_empty();
        let context = BuilderContext::new(quad_key, canvas, grid_size, elevation);

        let mut meshes: Vec<Mesh> = Vec::new();
        let mut sink = |mesh: Mesh| {
            if !mesh.is_empty() {
                meshes.push(mesh);
            }
        };

        let mut active: HashMap<String, Box<dyn ElementBuilder>> = HashMap::new();
        // The terrain builder is canvas-driven and runs even when no
        // element routes to it.
        if has_canvas {
            if let Some(factory) = self.factories.get("terrain") {
                active.insert("terrain".to_string(), factory());
            }
        }

        let mut unknown: HashSet<String> = HashSet::new();
        let mut loaded = Vec::with_capacity(elements.len());
        for element in &elements {
            let Some(style) = styles.for_element(element, level_of_detail) else {
                continue;
            };

            if let Some(name) = style.get("builder") {
                if !active.contains_key(name) {
                    match self.factories.get(name) {
                        Some(factory) => {
                            active.insert(name.to_string(), factory());
                        }
                        None => {
                            if unknown.insert(name.to_string()) {
                                warn!(builder = name, "style names an unregistered builder");
                            }
                        }
                    }
                }
                if let Some(builder) = active.get_mut(name) {
                    builder.visit(element, &style, &context, &mut sink);
                }
            }

            loaded.push(LoadedElement {
                id: element.id(),
                tags: element.tags().to_vec(),
                geometry: element.geometry(),
                style,
            });
        }

        for builder in active.values_mut() {
            builder.complete(&context, &mut sink);
        }

        debug!(
            quad_key = %quad_key,
            elements = loaded.len(),
            meshes = meshes.len(),
            "tile build finished"
        );
        Ok(BuiltTile {
            meshes,
            elements: loaded,
        })
    }
}

impl Default for QuadKeyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::to_quad_key;
    use crate::elevation::FlatElevationProvider;
    use crate::entity::{Node, Way};
    use crate::store::{ElementStore, InMemoryStore};
    use glam::DVec3;
    use std::sync::Arc;

    const SHEET: &str = r#"
        canvas { color: green; grid-size: 2; }
        node[natural=tree] { builder: tree; height: 6; }
        way[barrier] { builder: barrier; height: 2; }
        way[highway] { width: 3; }
        node[amenity=fountain] { builder: fountain; }
    "#;

    fn tile() -> QuadKey {
        to_quad_key(52.52, 13.38, 16).expect("Coordinate should project")
    }

    fn populated_store(elements: &[Element]) -> GeoStore {
        let memory = Arc::new(InMemoryStore::new());
        for element in elements {
            memory
                .insert(&tile(), element)
                .expect("Insert should succeed");
        }
        let mut geo = GeoStore::new();
        geo.register("InMemory", memory);
        geo
    }

    fn tree_node(id: i64) -> Element {
        Element::Node(Node {
            id,
            tags: vec![Tag::new("natural", "tree")],
            coordinate: GeoCoordinate::new(52.52, 13.38),
        })
    }

    fn barrier_way(id: i64) -> Element {
        Element::Way(Way {
            id,
            tags: vec![Tag::new("barrier", "wall")],
            coordinates: vec![
                GeoCoordinate::new(52.5200, 13.3800),
                GeoCoordinate::new(52.5201, 13.3801),
            ],
        })
    }

    fn styles(source: &str) -> StyleProvider {
        StyleProvider::from_source(source).expect("Sheet should parse")
    }

    #[test]
    fn test_build_dispatches_to_named_builders() {
        let store = populated_store(&[tree_node(1), barrier_way(2)]);
        let registry = QuadKeyBuilder::with_default_builders();

        let built = registry
            .build(&store, &styles(SHEET), tile(), &FlatElevationProvider::new(), 4)
            .expect("Build should succeed");

        let names: Vec<&str> = built.meshes.iter().map(|m| m.name.as_str()).collect();
        assert!(names.contains(&"terrain"), "canvas drives a terrain mesh");
        assert!(names.contains(&"tree:1"), "got {names:?}");
        assert!(names.contains(&"barrier:2"), "got {names:?}");
        assert_eq!(built.elements.len(), 2);
    }

    #[test]
    fn test_styled_element_without_builder_is_reported() {
        let road = Element::Way(Way {
            id: 3,
            tags: vec![Tag::new("highway", "residential")],
            coordinates: vec![
                GeoCoordinate::new(52.5200, 13.3800),
                GeoCoordinate::new(52.5202, 13.3802),
            ],
        });
        let store = populated_store(&[road]);
        let registry = QuadKeyBuilder::with_default_builders();

        let built = registry
            .build(&store, &styles(SHEET), tile(), &FlatElevationProvider::new(), 4)
            .expect("Build should succeed");

        assert_eq!(built.elements.len(), 1);
        assert_eq!(built.elements[0].style.get("width"), Some("3"));
        assert_eq!(built.elements[0].geometry.len(), 2);
        let names: Vec<&str> = built.meshes.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["terrain"], "no builder was named for the road");
    }

    #[test]
    fn test_unstyled_element_is_excluded() {
        let bench = Element::Node(Node {
            id: 4,
            tags: vec![Tag::new("amenity", "bench")],
            coordinate: GeoCoordinate::new(52.52, 13.38),
        });
        let store = populated_store(&[bench, tree_node(5)]);
        let registry = QuadKeyBuilder::with_default_builders();

        let built = registry
            .build(&store, &styles(SHEET), tile(), &FlatElevationProvider::new(), 4)
            .expect("Build should succeed");

        assert_eq!(built.elements.len(), 1, "only the tree resolves a style");
        assert_eq!(built.elements[0].id, 5);
    }

    #[test]
    fn test_unregistered_builder_name_is_skipped() {
        let fountain = Element::Node(Node {
            id: 6,
            tags: vec![Tag::new("amenity", "fountain")],
            coordinate: GeoCoordinate::new(52.52, 13.38),
        });
        let store = populated_store(&[fountain]);
        let registry = QuadKeyBuilder::with_default_builders();

        let built = registry
            .build(&store, &styles(SHEET), tile(), &FlatElevationProvider::new(), 4)
            .expect("Build should succeed");

        assert_eq!(built.elements.len(), 1, "the element itself still loads");
        let names: Vec<&str> = built.meshes.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["terrain"]);
    }

    #[test]
    fn test_no_canvas_rule_no_terrain() {
        let store = populated_store(&[tree_node(7)]);
        let registry = QuadKeyBuilder::with_default_builders();
        let sheet = "node[natural=tree] { builder: tree; height: 6; }";

        let built = registry
            .build(&store, &styles(sheet), tile(), &FlatElevationProvider::new(), 4)
            .expect("Build should succeed");

        let names: Vec<&str> = built.meshes.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["tree:7"]);
    }

    #[test]
    fn test_empty_tile_still_builds_terrain() {
        let store = populated_store(&[]);
        let registry = QuadKeyBuilder::with_default_builders();

        let built = registry
            .build(&store, &styles(SHEET), tile(), &FlatElevationProvider::new(), 4)
            .expect("Build should succeed");

        assert!(built.elements.is_empty());
        assert_eq!(built.meshes.len(), 1);
        assert_eq!(built.meshes[0].name, "terrain");
    }

    struct FlagBuilder;

    impl ElementBuilder for FlagBuilder {
        fn visit(
            &mut self,
            element: &Element,
            _style: &Style,
            _context: &BuilderContext<'_>,
            sink: &mut MeshSink<'_>,
        ) {
            let mut mesh = Mesh::new(format!("flag:{}", element.id()));
            mesh.add_vertex(DVec3::ZERO, 0);
            sink(mesh);
            // Dropped by the collector.
            sink(Mesh::new("empty"));
        }
    }

    #[test]
    fn test_custom_builder_and_empty_mesh_filter() {
        let viewpoint = Element::Node(Node {
            id: 8,
            tags: vec![Tag::new("tourism", "viewpoint")],
            coordinate: GeoCoordinate::new(52.52, 13.38),
        });
        let store = populated_store(&[viewpoint]);
        let mut registry = QuadKeyBuilder::new();
        registry.register("flag", || Box::new(FlagBuilder));
        let sheet = "node[tourism=viewpoint] { builder: flag; }";

        let built = registry
            .build(&store, &styles(sheet), tile(), &FlatElevationProvider::new(), 4)
            .expect("Build should succeed");

        let names: Vec<&str> = built.meshes.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["flag:8"], "empty meshes are never emitted");
    }
}
