//! Color values for mesh vertex coloring.

use crate::style::StyleError;

/// RGBA color.
///
/// Meshes carry one packed color per vertex; `packed` produces the
/// `0xRRGGBBAA` integer form those arrays use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Parse `#rgb`, `#rrggbb` or a named color.
    pub fn parse(value: &str) -> Result<Self, StyleError> {
        let value = value.trim();
        if let Some(hex) = value.strip_prefix('#') {
            return Self::parse_hex(hex).ok_or_else(|| StyleError::InvalidColor(value.to_string()));
        }
        named_color(value).ok_or_else(|| StyleError::InvalidColor(value.to_string()))
    }

    fn parse_hex(hex: &str) -> Option<Self> {
        match hex.len() {
            3 => {
                let r = u8::from_str_radix(&hex[0..1], 16).ok()?;
                let g = u8::from_str_radix(&hex[1..2], 16).ok()?;
                let b = u8::from_str_radix(&hex[2..3], 16).ok()?;
                Some(Self::opaque(r * 17, g * 17, b * 17))
            }
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                Some(Self::opaque(r, g, b))
            }
            _ => None,
        }
    }

    /// Pack into the `0xRRGGBBAA` integer used in mesh color arrays.
    pub fn packed(&self) -> i32 {
        let value = ((self.r as u32) << 24)
            | ((self.g as u32) << 16)
            | ((self.b as u32) << 8)
            | self.a as u32;
        value as i32
    }

    /// Linear interpolation between two colors.
    pub fn lerp(&self, other: &Color, t: f64) -> Color {
        let t = t.clamp(0.0, 1.0);
        let channel = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Color::new(
            channel(self.r, other.r),
            channel(self.g, other.g),
            channel(self.b, other.b),
            channel(self.a, other.a),
        )
    }
}

fn named_color(name: &str) -> Option<Color> {
    let color = match name.to_ascii_lowercase().as_str() {
        "white" => Color::opaque(255, 255, 255),
        "black" => Color::opaque(0, 0, 0),
        "red" => Color::opaque(255, 0, 0),
        "green" => Color::opaque(0, 128, 0),
        "blue" => Color::opaque(0, 0, 255),
        "yellow" => Color::opaque(255, 255, 0),
        "orange" => Color::opaque(255, 165, 0),
        "brown" => Color::opaque(165, 42, 42),
        "gray" | "grey" => Color::opaque(128, 128, 128),
        _ => return None,
    };
    Some(color)
}
