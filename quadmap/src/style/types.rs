//! Stylesheet model and computed style values.

use crate::coord::{MAX_LOD, MIN_LOD};
use crate::entity::{Element, ElementKind, Tag};
use crate::style::{Color, Gradient};
use std::collections::HashMap;
use tracing::warn;

/// What a selector applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorTarget {
    Node,
    Way,
    Area,
    Relation,
    /// Tile-wide terrain rules.
    Canvas,
    /// `*` matches every element kind (but not the canvas).
    Any,
}

impl SelectorTarget {
    pub fn matches_kind(&self, kind: ElementKind) -> bool {
        match self {
            SelectorTarget::Node => kind == ElementKind::Node,
            SelectorTarget::Way => kind == ElementKind::Way,
            SelectorTarget::Area => kind == ElementKind::Area,
            SelectorTarget::Relation => kind == ElementKind::Relation,
            SelectorTarget::Canvas => false,
            SelectorTarget::Any => true,
        }
    }
}

/// A single `[...]` tag condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// `[key]` - tag must be present
    Exists { key: String },
    /// `[key=value]`
    Equals { key: String, value: String },
    /// `[key!=value]` - absent tags match
    NotEquals { key: String, value: String },
}

impl Condition {
    pub fn matches(&self, tags: &[Tag]) -> bool {
        let lookup = |key: &str| tags.iter().find(|tag| tag.key == key);
        match self {
            Condition::Exists { key } => lookup(key).is_some(),
            Condition::Equals { key, value } => {
                lookup(key).map_or(false, |tag| tag.value == *value)
            }
            Condition::NotEquals { key, value } => {
                lookup(key).map_or(true, |tag| tag.value != *value)
            }
        }
    }
}

/// One selector: target kind, zoom range and tag conditions.
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    pub target: SelectorTarget,
    pub zoom_min: i32,
    pub zoom_max: i32,
    pub conditions: Vec<Condition>,
}

impl Selector {
    pub fn new(target: SelectorTarget) -> Self {
        Self {
            target,
            zoom_min: MIN_LOD,
            zoom_max: MAX_LOD,
            conditions: Vec::new(),
        }
    }

    fn zoom_contains(&self, level_of_detail: i32) -> bool {
        (self.zoom_min..=self.zoom_max).contains(&level_of_detail)
    }

    pub fn matches(&self, element: &Element, level_of_detail: i32) -> bool {
        self.target.matches_kind(element.kind())
            && self.zoom_contains(level_of_detail)
            && self
                .conditions
                .iter()
                .all(|condition| condition.matches(element.tags()))
    }

    pub fn matches_canvas(&self, level_of_detail: i32) -> bool {
        self.target == SelectorTarget::Canvas && self.zoom_contains(level_of_detail)
    }
}

/// A rule: one or more selectors sharing a declaration block.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub selectors: Vec<Selector>,
    pub declarations: Vec<(String, String)>,
}

/// A parsed stylesheet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stylesheet {
    pub rules: Vec<Rule>,
}

/// Declarations merged from every rule matching one element.
///
/// Later rules override earlier ones per key, so stylesheet order is the
/// cascade order.
#[derive(Debug, Clone, Default)]
pub struct Style {
    declarations: HashMap<String, String>,
}

impl Style {
    pub(crate) fn merge(&mut self, declarations: &[(String, String)]) {
        for (key, value) in declarations {
            self.declarations.insert(key.clone(), value.clone());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.declarations.get(key).map(String::as_str)
    }

    pub fn has(&self, key: &str) -> bool {
        self.declarations.contains_key(key)
    }

    /// Numeric declaration, falling back when missing or unparseable.
    pub fn f64_or(&self, key: &str, default: f64) -> f64 {
        self.get(key)
            .and_then(|value| value.parse().ok())
            .unwrap_or(default)
    }

    /// Color declaration, falling back when missing or invalid.
    pub fn color_or(&self, key: &str, default: Color) -> Color {
        match self.get(key) {
            None => default,
            Some(value) => Color::parse(value).unwrap_or_else(|e| {
                warn!(key, error = %e, "invalid color declaration");
                default
            }),
        }
    }

    /// Gradient declaration, falling back to a solid color.
    pub fn gradient_or(&self, key: &str, default: Color) -> Gradient {
        match self.get(key) {
            None => Gradient::solid(default),
            Some(value) => Gradient::parse(value).unwrap_or_else(|e| {
                warn!(key, error = %e, "invalid gradient declaration");
                Gradient::solid(default)
            }),
        }
    }

    /// All declarations in sorted order, for export alongside elements.
    pub fn declarations(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = self
            .declarations
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        pairs.sort();
        pairs
    }
}
