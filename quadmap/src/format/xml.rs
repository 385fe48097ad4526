//! OSM XML parser.
//!
//! Hand-rolled tag scanner for the small OSM vocabulary: `node`, `way`,
//! `relation`, `tag`, `nd` and `member`. Everything else, including
//! comments, processing instructions and character data, is skipped.

use crate::coord::GeoCoordinate;
use crate::entity::{Element, Tag};
use crate::format::{ElementAssembler, FormatError, MemberKind, MemberRef};
use tracing::warn;

pub(crate) fn parse(source: &str) -> Result<Vec<Element>, FormatError> {
    let mut scanner = XmlScanner::new(source);
    let mut assembler = ElementAssembler::new();
    let mut context = Context::None;

    while let Some(tag) = scanner.next_tag()? {
        match tag.kind {
            XmlTagKind::Open | XmlTagKind::SelfClose => match tag.name.as_str() {
                "node" => {
                    let id = tag.require_i64("id")?;
                    let coordinate =
                        GeoCoordinate::new(tag.require_f64("lat")?, tag.require_f64("lon")?);
                    if tag.kind == XmlTagKind::SelfClose {
                        assembler.add_node(id, coordinate, Vec::new());
                    } else {
                        context = Context::Node {
                            id,
                            coordinate,
                            tags: Vec::new(),
                        };
                    }
                }
                "way" => {
                    let id = tag.require_i64("id")?;
                    if tag.kind == XmlTagKind::SelfClose {
                        assembler.add_way(id, &[], Vec::new());
                    } else {
                        context = Context::Way {
                            id,
                            refs: Vec::new(),
                            tags: Vec::new(),
                        };
                    }
                }
                "relation" => {
                    let id = tag.require_i64("id")?;
                    if tag.kind == XmlTagKind::SelfClose {
                        assembler.add_relation(id, &[], Vec::new());
                    } else {
                        context = Context::Relation {
                            id,
                            members: Vec::new(),
                            tags: Vec::new(),
                        };
                    }
                }
                "tag" => {
                    let key = tag.require_str("k")?.to_string();
                    let value = tag.require_str("v")?.to_string();
                    match &mut context {
                        Context::Node { tags, .. }
                        | Context::Way { tags, .. }
                        | Context::Relation { tags, .. } => tags.push(Tag { key, value }),
                        Context::None => {}
                    }
                }
                "nd" => {
                    if let Context::Way { refs, .. } = &mut context {
                        refs.push(tag.require_i64("ref")?);
                    }
                }
                "member" => {
                    if let Context::Relation { members, .. } = &mut context {
                        let kind = match tag.require_str("type")? {
                            "node" => Some(MemberKind::Node),
                            "way" => Some(MemberKind::Way),
                            "relation" => Some(MemberKind::Relation),
                            other => {
                                warn!(member_type = other, "skipping unknown member type");
                                None
                            }
                        };
                        if let Some(kind) = kind {
                            members.push(MemberRef {
                                kind,
                                id: tag.require_i64("ref")?,
                                role: tag.attribute("role").unwrap_or_default().to_string(),
                            });
                        }
                    }
                }
                _ => {}
            },
            XmlTagKind::Close => {
                match (tag.name.as_str(), std::mem::replace(&mut context, Context::None)) {
                    ("node", Context::Node { id, coordinate, tags }) => {
                        assembler.add_node(id, coordinate, tags)
                    }
                    ("way", Context::Way { id, refs, tags }) => {
                        assembler.add_way(id, &refs, tags)
                    }
                    ("relation", Context::Relation { id, members, tags }) => {
                        assembler.add_relation(id, &members, tags)
                    }
                    (_, restored) => context = restored,
                }
            }
        }
    }

    Ok(assembler.finish())
}

enum Context {
    None,
    Node {
        id: i64,
        coordinate: GeoCoordinate,
        tags: Vec<Tag>,
    },
    Way {
        id: i64,
        refs: Vec<i64>,
        tags: Vec<Tag>,
    },
    Relation {
        id: i64,
        members: Vec<MemberRef>,
        tags: Vec<Tag>,
    },
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
enum XmlTagKind {
    Open,
    Close,
    SelfClose,
}

struct XmlTag {
    name: String,
    attributes: Vec<(String, String)>,
    kind: XmlTagKind,
    line: usize,
}

impl XmlTag {
    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(attr, _)| attr == name)
            .map(|(_, value)| value.as_str())
    }

    fn require_str(&self, name: &str) -> Result<&str, FormatError> {
        self.attribute(name).ok_or_else(|| FormatError::Xml {
            line: self.line,
            message: format!("missing `{name}` attribute on <{}>", self.name),
        })
    }

    fn require_i64(&self, name: &str) -> Result<i64, FormatError> {
        self.require_parsed(name)
    }

    fn require_f64(&self, name: &str) -> Result<f64, FormatError> {
        self.require_parsed(name)
    }

    fn require_parsed<T: std::str::FromStr>(&self, name: &str) -> Result<T, FormatError> {
        self.require_str(name)?
            .parse()
            .map_err(|_| FormatError::Xml {
                line: self.line,
                message: format!("invalid `{name}` attribute on <{}>", self.name),
            })
    }
}

struct XmlScanner {
    chars: Vec<char>,
    pos: usize,
    line: usize,
}

impl XmlScanner {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
        }
        Some(ch)
    }

    fn starts_with(&self, prefix: &str) -> bool {
        prefix
            .chars()
            .enumerate()
            .all(|(i, expected)| self.chars.get(self.pos + i) == Some(&expected))
    }

    fn skip_past(&mut self, terminator: &str) -> Result<(), FormatError> {
        while self.pos < self.chars.len() {
            if self.starts_with(terminator) {
                for _ in 0..terminator.chars().count() {
                    self.bump();
                }
                return Ok(());
            }
            self.bump();
        }
        Err(self.error(format!("missing `{terminator}`")))
    }

    fn next_tag(&mut self) -> Result<Option<XmlTag>, FormatError> {
        loop {
            while let Some(ch) = self.peek() {
                if ch == '<' {
                    break;
                }
                self.bump();
            }
            if self.peek().is_none() {
                return Ok(None);
            }

            if self.starts_with("<!--") {
                self.skip_past("-->")?;
            } else if self.starts_with("<?") {
                self.skip_past("?>")?;
            } else if self.starts_with("<!") {
                self.skip_past(">")?;
            } else {
                return self.parse_tag().map(Some);
            }
        }
    }

    fn parse_tag(&mut self) -> Result<XmlTag, FormatError> {
        let line = self.line;
        self.bump(); // consume '<'
        let closing = if self.peek() == Some('/') {
            self.bump();
            true
        } else {
            false
        };

        let name = self.take_name();
        if name.is_empty() {
            return Err(self.error("expected element name"));
        }

        let mut attributes = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some('>') => {
                    self.bump();
                    let kind = if closing {
                        XmlTagKind::Close
                    } else {
                        XmlTagKind::Open
                    };
                    return Ok(XmlTag {
                        name,
                        attributes,
                        kind,
                        line,
                    });
                }
                Some('/') => {
                    self.bump();
                    self.expect('>')?;
                    return Ok(XmlTag {
                        name,
                        attributes,
                        kind: XmlTagKind::SelfClose,
                        line,
                    });
                }
                Some(_) => {
                    let attr_name = self.take_name();
                    if attr_name.is_empty() {
                        return Err(self.error(format!("malformed attribute in <{name}>")));
                    }
                    self.skip_whitespace();
                    self.expect('=')?;
                    self.skip_whitespace();
                    let quote = match self.peek() {
                        Some(q @ ('"' | '\'')) => {
                            self.bump();
                            q
                        }
                        _ => return Err(self.error("expected quoted attribute value")),
                    };
                    let raw = self.take_until(quote);
                    self.expect(quote)?;
                    attributes.push((attr_name, unescape(&raw)));
                }
                None => return Err(self.error(format!("unterminated tag <{name}>"))),
            }
        }
    }

    fn take_name(&mut self) -> String {
        let mut name = String::new();
        while let Some(ch) = self.peek() {
            if ch.is_alphanumeric() || matches!(ch, '_' | '-' | ':' | '.') {
                name.push(ch);
                self.bump();
            } else {
                break;
            }
        }
        name
    }

    fn take_until(&mut self, stop: char) -> String {
        let mut out = String::new();
        while let Some(ch) = self.peek() {
            if ch == stop {
                break;
            }
            out.push(ch);
            self.bump();
        }
        out
    }

    fn skip_whitespace(&mut self) {
        while self.peek().map_or(false, char::is_whitespace) {
            self.bump();
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), FormatError> {
        match self.peek() {
            Some(ch) if ch == expected => {
                self.bump();
                Ok(())
            }
            Some(other) => Err(self.error(format!("expected `{expected}`, found `{other}`"))),
            None => Err(self.error(format!("expected `{expected}`, found end of input"))),
        }
    }

    fn error(&self, message: impl Into<String>) -> FormatError {
        FormatError::Xml {
            line: self.line,
            message: message.into(),
        }
    }
}

/// Resolves the predefined XML entities and numeric character references.
fn unescape(value: &str) -> String {
    if !value.contains('&') {
        return value.to_string();
    }
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch != '&' {
            out.push(ch);
            continue;
        }
        let mut entity = String::new();
        let mut terminated = false;
        for e in chars.by_ref() {
            if e == ';' {
                terminated = true;
                break;
            }
            entity.push(e);
            if entity.len() > 10 {
                break;
            }
        }
        if !terminated {
            out.push('&');
            out.push_str(&entity);
            continue;
        }
        match entity.as_str() {
            "amp" => out.push('&'),
            "lt" => out.push('<'),
            "gt" => out.push('>'),
            "quot" => out.push('"'),
            "apos" => out.push('\''),
            other => match parse_char_reference(other) {
                Some(resolved) => out.push(resolved),
                None => {
                    out.push('&');
                    out.push_str(other);
                    out.push(';');
                }
            },
        }
    }
    out
}

fn parse_char_reference(entity: &str) -> Option<char> {
    let digits = entity.strip_prefix('#')?;
    let code = if let Some(hex) = digits.strip_prefix('x').or_else(|| digits.strip_prefix('X')) {
        u32::from_str_radix(hex, 16).ok()?
    } else {
        digits.parse().ok()?
    };
    char::from_u32(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    const OSM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<osm version="0.6" generator="test">
  <bounds minlat="0.0" minlon="0.0" maxlat="0.01" maxlon="0.01"/>
  <!-- four corners plus one tree -->
  <node id="1" lat="0.0" lon="0.0"/>
  <node id="2" lat="0.0" lon="0.001"/>
  <node id="3" lat="0.001" lon="0.001"/>
  <node id="4" lat="0.001" lon="0.0"/>
  <node id="5" lat="0.0005" lon="0.0005">
    <tag k="natural" v="tree"/>
    <tag k="name" v="Tilia &amp; friends"/>
  </node>
  <way id="10">
    <nd ref="1"/>
    <nd ref="2"/>
    <nd ref="3"/>
    <nd ref="4"/>
    <nd ref="1"/>
    <tag k="building" v="yes"/>
  </way>
  <relation id="20">
    <member type="way" ref="10" role="outer"/>
    <tag k="type" v="multipolygon"/>
    <tag k="building" v="yes"/>
  </relation>
</osm>
"#;

    #[test]
    fn test_parse_full_document() {
        let elements = parse(OSM).expect("Document should parse");
        assert_eq!(elements.len(), 3);

        match &elements[0] {
            Element::Node(node) => {
                assert_eq!(node.id, 5);
                assert_eq!(node.tags[0], Tag::new("natural", "tree"));
                assert_eq!(node.tags[1].value, "Tilia & friends");
                assert!((node.coordinate.latitude - 0.0005).abs() < 1e-12);
            }
            other => panic!("expected node, got {other:?}"),
        }
        match &elements[1] {
            Element::Area(area) => {
                assert_eq!(area.id, 10);
                assert_eq!(area.coordinates.len(), 4);
            }
            other => panic!("expected area, got {other:?}"),
        }
        match &elements[2] {
            Element::Relation(relation) => {
                assert_eq!(relation.id, 20);
                assert_eq!(relation.elements.len(), 1);
            }
            other => panic!("expected relation, got {other:?}"),
        }
    }

    #[test]
    fn test_way_with_missing_node_is_dropped() {
        let source = r#"
            <osm>
              <node id="1" lat="0.0" lon="0.0"/>
              <way id="10">
                <nd ref="1"/>
                <nd ref="99"/>
                <tag k="barrier" v="wall"/>
              </way>
            </osm>
        "#;
        let elements = parse(source).expect("Document should parse");
        assert!(elements.is_empty());
    }

    #[test]
    fn test_missing_latitude_reports_line() {
        let source = "<osm>\n  <node id=\"1\" lon=\"2.0\"/>\n</osm>";
        let err = parse(source).unwrap_err();
        match err {
            FormatError::Xml { line, message } => {
                assert_eq!(line, 2);
                assert!(message.contains("lat"), "unexpected message: {message}");
            }
            other => panic!("expected xml error, got {other:?}"),
        }
    }

    #[test]
    fn test_unterminated_tag() {
        let err = parse("<osm><node id=\"1\" lat=\"0\" lon=\"0\"").unwrap_err();
        assert!(matches!(err, FormatError::Xml { .. }));
    }

    #[test]
    fn test_single_quoted_attributes() {
        let source = "<osm><node id='7' lat='1.5' lon='2.5'><tag k='amenity' v='cafe'/></node></osm>";
        let elements = parse(source).expect("Document should parse");
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].id(), 7);
        assert_eq!(elements[0].tag("amenity"), Some("cafe"));
    }

    #[test]
    fn test_numeric_character_reference() {
        assert_eq!(unescape("caf&#233;"), "café");
        assert_eq!(unescape("caf&#xE9;"), "café");
        assert_eq!(unescape("unknown &foo; stays"), "unknown &foo; stays");
    }
}
