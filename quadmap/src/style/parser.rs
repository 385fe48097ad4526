//! MapCSS parser.
//!
//! Supports the subset the mesh builders consume: `node`, `way`, `area`,
//! `relation`, `canvas` and `*` selectors, `|z` zoom ranges, `[key]`,
//! `[key=value]` and `[key!=value]` conditions, and `key: value;`
//! declaration blocks. Both `/* */` and `//` comments are recognised.

use crate::coord::{MAX_LOD, MIN_LOD};
use crate::style::types::{Condition, Rule, Selector, SelectorTarget, Stylesheet};
use crate::style::StyleError;

pub struct MapCssParser;

impl MapCssParser {
    pub fn parse(source: &str) -> Result<Stylesheet, StyleError> {
        let mut scanner = Scanner::new(source);
        let mut rules = Vec::new();

        loop {
            scanner.skip_trivia();
            if scanner.at_end() {
                break;
            }
            rules.push(Self::parse_rule(&mut scanner)?);
        }

        Ok(Stylesheet { rules })
    }

    fn parse_rule(scanner: &mut Scanner) -> Result<Rule, StyleError> {
        let mut selectors = vec![Self::parse_selector(scanner)?];
        loop {
            scanner.skip_trivia();
            match scanner.peek() {
                Some(',') => {
                    scanner.bump();
                    selectors.push(Self::parse_selector(scanner)?);
                }
                Some('{') => break,
                Some(other) => {
                    return Err(scanner.error(format!(
                        "expected `,` or `{{` after selector, found `{other}`"
                    )));
                }
                None => return Err(scanner.error("expected `{` after selector")),
            }
        }

        scanner.expect('{')?;
        let declarations = Self::parse_declarations(scanner)?;
        scanner.expect('}')?;

        Ok(Rule {
            selectors,
            declarations,
        })
    }

    fn parse_selector(scanner: &mut Scanner) -> Result<Selector, StyleError> {
        scanner.skip_trivia();

        let target = if scanner.peek() == Some('*') {
            scanner.bump();
            SelectorTarget::Any
        } else {
            let word = scanner.take_word();
            match word.as_str() {
                "node" => SelectorTarget::Node,
                "way" => SelectorTarget::Way,
                "area" => SelectorTarget::Area,
                "relation" => SelectorTarget::Relation,
                "canvas" => SelectorTarget::Canvas,
                "" => return Err(scanner.error("expected selector")),
                other => {
                    return Err(scanner.error(format!("unknown selector target `{other}`")));
                }
            }
        };

        let mut selector = Selector::new(target);

        if scanner.peek() == Some('|') {
            scanner.bump();
            scanner.expect('z')?;
            let (zoom_min, zoom_max) = Self::parse_zoom(scanner)?;
            selector.zoom_min = zoom_min;
            selector.zoom_max = zoom_max;
        }

        while scanner.peek() == Some('[') {
            scanner.bump();
            let body = scanner.take_until(']');
            scanner.expect(']')?;
            selector.conditions.push(Self::parse_condition(scanner, &body)?);
        }

        Ok(selector)
    }

    /// `|z16`, `|z12-14`, `|z16-` and `|z-12` forms.
    fn parse_zoom(scanner: &mut Scanner) -> Result<(i32, i32), StyleError> {
        let low = Self::parse_zoom_level(scanner)?;
        if scanner.peek() != Some('-') {
            let level = low.ok_or_else(|| scanner.error("expected zoom level after `|z`"))?;
            return Ok((level, level));
        }
        scanner.bump();
        let high = Self::parse_zoom_level(scanner)?;
        if low.is_none() && high.is_none() {
            return Err(scanner.error("expected zoom level after `|z`"));
        }
        Ok((low.unwrap_or(MIN_LOD), high.unwrap_or(MAX_LOD)))
    }

    fn parse_zoom_level(scanner: &mut Scanner) -> Result<Option<i32>, StyleError> {
        let digits = scanner.take_while(|ch| ch.is_ascii_digit());
        if digits.is_empty() {
            return Ok(None);
        }
        digits
            .parse()
            .map(Some)
            .map_err(|_| scanner.error(format!("invalid zoom level `{digits}`")))
    }

    fn parse_condition(scanner: &Scanner, body: &str) -> Result<Condition, StyleError> {
        let condition = if let Some((key, value)) = body.split_once("!=") {
            Condition::NotEquals {
                key: key.trim().to_string(),
                value: value.trim().to_string(),
            }
        } else if let Some((key, value)) = body.split_once('=') {
            Condition::Equals {
                key: key.trim().to_string(),
                value: value.trim().to_string(),
            }
        } else {
            Condition::Exists {
                key: body.trim().to_string(),
            }
        };

        let key = match &condition {
            Condition::Exists { key }
            | Condition::Equals { key, .. }
            | Condition::NotEquals { key, .. } => key,
        };
        if key.is_empty() {
            return Err(scanner.error("empty condition key"));
        }

        Ok(condition)
    }

    fn parse_declarations(scanner: &mut Scanner) -> Result<Vec<(String, String)>, StyleError> {
        let mut declarations = Vec::new();

        loop {
            scanner.skip_trivia();
            match scanner.peek() {
                Some('}') | None => break,
                Some(';') => {
                    scanner.bump();
                    continue;
                }
                Some(_) => {}
            }

            let key = scanner.take_until_any(&[':', ';', '}']);
            if scanner.peek() != Some(':') {
                return Err(scanner.error(format!(
                    "expected `:` in declaration `{}`",
                    key.trim()
                )));
            }
            scanner.bump();
            let value = scanner.take_until_any(&[';', '}']);

            let key = key.trim().to_string();
            let value = value.trim().to_string();
            if key.is_empty() {
                return Err(scanner.error("empty declaration key"));
            }
            if value.is_empty() {
                return Err(scanner.error(format!("empty value for `{key}`")));
            }
            declarations.push((key, value));
        }

        Ok(declarations)
    }
}

/// Character scanner tracking the current line for error reporting.
struct Scanner {
    chars: Vec<char>,
    pos: usize,
    line: usize,
}

impl Scanner {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
        }
        Some(ch)
    }

    fn expect(&mut self, expected: char) -> Result<(), StyleError> {
        match self.peek() {
            Some(ch) if ch == expected => {
                self.bump();
                Ok(())
            }
            Some(other) => Err(self.error(format!("expected `{expected}`, found `{other}`"))),
            None => Err(self.error(format!("expected `{expected}`, found end of input"))),
        }
    }

    /// Skips whitespace and both comment forms.
    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(ch) if ch.is_whitespace() => {
                    self.bump();
                }
                Some('/') if self.peek_at(1) == Some('/') => {
                    while let Some(ch) = self.peek() {
                        if ch == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                Some('/') if self.peek_at(1) == Some('*') => {
                    self.bump();
                    self.bump();
                    while !self.at_end() {
                        if self.peek() == Some('*') && self.peek_at(1) == Some('/') {
                            self.bump();
                            self.bump();
                            break;
                        }
                        self.bump();
                    }
                }
                _ => break,
            }
        }
    }

    fn take_word(&mut self) -> String {
        self.take_while(|ch| ch.is_ascii_alphanumeric() || ch == '_')
    }

    fn take_while(&mut self, keep: impl Fn(char) -> bool) -> String {
        let mut out = String::new();
        while let Some(ch) = self.peek() {
            if !keep(ch) {
                break;
            }
            out.push(ch);
            self.bump();
        }
        out
    }

    fn take_until(&mut self, stop: char) -> String {
        self.take_while(|ch| ch != stop)
    }

    fn take_until_any(&mut self, stops: &[char]) -> String {
        let mut out = String::new();
        while let Some(ch) = self.peek() {
            if stops.contains(&ch) {
                break;
            }
            out.push(ch);
            self.bump();
        }
        out
    }

    fn error(&self, message: impl Into<String>) -> StyleError {
        StyleError::Parse {
            line: self.line,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_rule() {
        let sheet = MapCssParser::parse("area|z14-16[building] { height: 10; color: #ff0000; }")
            .expect("Stylesheet should parse");

        assert_eq!(sheet.rules.len(), 1);
        let rule = &sheet.rules[0];
        assert_eq!(rule.selectors.len(), 1);

        let selector = &rule.selectors[0];
        assert_eq!(selector.target, SelectorTarget::Area);
        assert_eq!(selector.zoom_min, 14);
        assert_eq!(selector.zoom_max, 16);
        assert_eq!(
            selector.conditions,
            vec![Condition::Exists {
                key: "building".to_string()
            }]
        );
        assert_eq!(
            rule.declarations,
            vec![
                ("height".to_string(), "10".to_string()),
                ("color".to_string(), "#ff0000".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_selector_list() {
        let sheet = MapCssParser::parse("node, way[highway] { color: red; }")
            .expect("Stylesheet should parse");

        let rule = &sheet.rules[0];
        assert_eq!(rule.selectors.len(), 2);
        assert_eq!(rule.selectors[0].target, SelectorTarget::Node);
        assert_eq!(rule.selectors[1].target, SelectorTarget::Way);
        assert_eq!(rule.selectors[1].conditions.len(), 1);
    }

    #[test]
    fn test_parse_zoom_forms() {
        let sheet = MapCssParser::parse(
            "way|z16 { a: 1; } way|z10- { a: 1; } way|z-8 { a: 1; } way|z3-5 { a: 1; }",
        )
        .expect("Stylesheet should parse");

        let zooms: Vec<(i32, i32)> = sheet
            .rules
            .iter()
            .map(|rule| (rule.selectors[0].zoom_min, rule.selectors[0].zoom_max))
            .collect();
        assert_eq!(zooms, vec![(16, 16), (10, MAX_LOD), (MIN_LOD, 8), (3, 5)]);
    }

    #[test]
    fn test_parse_conditions() {
        let sheet = MapCssParser::parse("area[building=yes][natural!=tree] { height: 1; }")
            .expect("Stylesheet should parse");

        assert_eq!(
            sheet.rules[0].selectors[0].conditions,
            vec![
                Condition::Equals {
                    key: "building".to_string(),
                    value: "yes".to_string()
                },
                Condition::NotEquals {
                    key: "natural".to_string(),
                    value: "tree".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_parse_comments() {
        let source = r#"
            /* terrain defaults
               span multiple lines */
            canvas {
                grid-size: 16; // cells per tile edge
                color: gradient(#228b22, #8b4513 80%);
            }
        "#;
        let sheet = MapCssParser::parse(source).expect("Stylesheet should parse");

        assert_eq!(sheet.rules.len(), 1);
        assert_eq!(sheet.rules[0].selectors[0].target, SelectorTarget::Canvas);
        assert_eq!(
            sheet.rules[0].declarations[1].1,
            "gradient(#228b22, #8b4513 80%)"
        );
    }

    #[test]
    fn test_parse_star_selector() {
        let sheet = MapCssParser::parse("* { visible: true; }").expect("Stylesheet should parse");
        assert_eq!(sheet.rules[0].selectors[0].target, SelectorTarget::Any);
    }

    #[test]
    fn test_empty_source() {
        let sheet = MapCssParser::parse("  /* nothing here */  ").expect("Empty sheet is valid");
        assert!(sheet.rules.is_empty());
    }

    #[test]
    fn test_error_missing_brace() {
        let err = MapCssParser::parse("way height: 4;").unwrap_err();
        match err {
            StyleError::Parse { line, message } => {
                assert_eq!(line, 1);
                assert!(message.contains('{'), "unexpected message: {message}");
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_error_reports_line() {
        let source = "canvas {\n  color: green;\n  grid-size\n}";
        let err = MapCssParser::parse(source).unwrap_err();
        match err {
            StyleError::Parse { line, message } => {
                assert_eq!(line, 4, "error should point at the line where `:` was expected");
                assert!(message.contains("grid-size"), "unexpected message: {message}");
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_error_unknown_target() {
        let err = MapCssParser::parse("line { color: red; }").unwrap_err();
        assert!(matches!(err, StyleError::Parse { line: 1, .. }));
    }
}
