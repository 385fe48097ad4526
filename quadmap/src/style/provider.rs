//! Style resolution for elements and the tile canvas.

use crate::entity::Element;
use crate::style::parser::MapCssParser;
use crate::style::types::{Style, Stylesheet};
use crate::style::StyleError;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Resolves merged styles against a parsed stylesheet.
///
/// Rules cascade in stylesheet order: every matching rule contributes its
/// declarations, later rules overriding earlier ones per key. An element no
/// rule matches resolves to `None` and is skipped by the mesh builders.
#[derive(Debug)]
pub struct StyleProvider {
    stylesheet: Stylesheet,
}

impl StyleProvider {
    pub fn new(stylesheet: Stylesheet) -> Self {
        Self { stylesheet }
    }

    pub fn from_source(source: &str) -> Result<Self, StyleError> {
        Ok(Self::new(MapCssParser::parse(source)?))
    }

    pub fn from_file(path: &Path) -> Result<Self, StyleError> {
        let source = fs::read_to_string(path)?;
        let provider = Self::from_source(&source)?;
        debug!(
            path = %path.display(),
            rules = provider.stylesheet.rules.len(),
            "loaded stylesheet"
        );
        Ok(provider)
    }

    /// Merged style for an element, or `None` when no rule matches.
    pub fn for_element(&self, element: &Element, level_of_detail: i32) -> Option<Style> {
        let mut style = Style::default();
        let mut matched = false;

        for rule in &self.stylesheet.rules {
            if rule
                .selectors
                .iter()
                .any(|selector| selector.matches(element, level_of_detail))
            {
                style.merge(&rule.declarations);
                matched = true;
            }
        }

        matched.then_some(style)
    }

    /// Merged `canvas` style, or `None` when the sheet has no canvas rule
    /// for this zoom.
    pub fn canvas_style(&self, level_of_detail: i32) -> Option<Style> {
        let mut style = Style::default();
        let mut matched = false;

        for rule in &self.stylesheet.rules {
            if rule
                .selectors
                .iter()
                .any(|selector| selector.matches_canvas(level_of_detail))
            {
                style.merge(&rule.declarations);
                matched = true;
            }
        }

        matched.then_some(style)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::GeoCoordinate;
    use crate::entity::{Node, Tag};
    use std::fs::File;
    use std::io::Write;

    const SHEET: &str = r#"
        canvas { color: green; grid-size: 8; }
        area[building] { height: 10; facade-color: gray; }
        area[building=cathedral] { height: 40; }
        node|z16[natural=tree] { height: 4; }
    "#;

    fn building(value: &str) -> Element {
        Element::Area(crate::entity::Area {
            id: 1,
            tags: vec![Tag::new("building", value)],
            coordinates: vec![
                GeoCoordinate::new(0.0, 0.0),
                GeoCoordinate::new(0.0, 0.001),
                GeoCoordinate::new(0.001, 0.001),
            ],
        })
    }

    #[test]
    fn test_for_element_merges_cascade() {
        let provider = StyleProvider::from_source(SHEET).expect("Sheet should parse");

        let style = provider
            .for_element(&building("cathedral"), 16)
            .expect("Building rule should match");
        assert_eq!(style.get("height"), Some("40"), "Later rule wins");
        assert_eq!(
            style.get("facade-color"),
            Some("gray"),
            "Earlier declarations survive when not overridden"
        );
    }

    #[test]
    fn test_for_element_unmatched_is_none() {
        let provider = StyleProvider::from_source(SHEET).expect("Sheet should parse");

        let element = Element::Node(Node {
            id: 7,
            tags: vec![Tag::new("amenity", "bench")],
            coordinate: GeoCoordinate::new(0.0, 0.0),
        });
        assert!(provider.for_element(&element, 16).is_none());
    }

    #[test]
    fn test_for_element_respects_zoom() {
        let provider = StyleProvider::from_source(SHEET).expect("Sheet should parse");

        let tree = Element::Node(Node {
            id: 9,
            tags: vec![Tag::new("natural", "tree")],
            coordinate: GeoCoordinate::new(0.0, 0.0),
        });
        assert!(provider.for_element(&tree, 16).is_some());
        assert!(
            provider.for_element(&tree, 15).is_none(),
            "Rule is pinned to zoom 16"
        );
    }

    #[test]
    fn test_canvas_style() {
        let provider = StyleProvider::from_source(SHEET).expect("Sheet should parse");

        let canvas = provider.canvas_style(12).expect("Canvas rule should match");
        assert_eq!(canvas.get("color"), Some("green"));
        assert_eq!(canvas.f64_or("grid-size", 0.0), 8.0);
    }

    #[test]
    fn test_canvas_absent() {
        let provider =
            StyleProvider::from_source("area[building] { height: 1; }").expect("Sheet should parse");
        assert!(provider.canvas_style(12).is_none());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("default.mapcss");
        let mut file = File::create(&path).expect("Failed to create stylesheet");
        file.write_all(SHEET.as_bytes())
            .expect("Failed to write stylesheet");

        let provider = StyleProvider::from_file(&path).expect("Sheet should load");
        assert!(provider.for_element(&building("yes"), 16).is_some());
    }

    #[test]
    fn test_from_file_missing() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let err = StyleProvider::from_file(&dir.path().join("absent.mapcss")).unwrap_err();
        assert!(matches!(err, StyleError::Io(_)));
    }
}
