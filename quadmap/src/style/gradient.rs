//! Color gradients.
//!
//! Stylesheets describe surface colors either as a single color or as
//! `gradient(#c1, #c2 50%, #c3)` stop lists evaluated by position.

use crate::style::{Color, StyleError};

/// Piecewise-linear color gradient over `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Gradient {
    stops: Vec<(f64, Color)>,
}

impl Gradient {
    /// Gradient evaluating to the same color everywhere.
    pub fn solid(color: Color) -> Self {
        Self {
            stops: vec![(0.0, color)],
        }
    }

    /// Parse a gradient expression or a bare color.
    pub fn parse(value: &str) -> Result<Self, StyleError> {
        let value = value.trim();
        let inner = match value
            .strip_prefix("gradient(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            Some(inner) => inner,
            None => return Ok(Self::solid(Color::parse(value)?)),
        };

        let entries: Vec<&str> = inner.split(',').map(str::trim).collect();
        if entries.is_empty() || entries.iter().any(|e| e.is_empty()) {
            return Err(StyleError::InvalidGradient(value.to_string()));
        }

        let count = entries.len();
        let mut stops = Vec::with_capacity(count);
        for (i, entry) in entries.iter().enumerate() {
            let mut parts = entry.split_whitespace();
            let color_text = parts
                .next()
                .ok_or_else(|| StyleError::InvalidGradient(value.to_string()))?;
            let color = Color::parse(color_text)?;

            let position = match parts.next() {
                Some(pct) => {
                    let number = pct
                        .strip_suffix('%')
                        .and_then(|n| n.parse::<f64>().ok())
                        .ok_or_else(|| StyleError::InvalidGradient(value.to_string()))?;
                    (number / 100.0).clamp(0.0, 1.0)
                }
                // Unpositioned stops spread evenly across the range.
                None if count == 1 => 0.0,
                None => i as f64 / (count - 1) as f64,
            };
            stops.push((position, color));
        }

        // Positions must not run backwards.
        for i in 1..stops.len() {
            if stops[i].0 < stops[i - 1].0 {
                stops[i].0 = stops[i - 1].0;
            }
        }

        Ok(Self { stops })
    }

    /// Color at position `t`, clamped to the gradient range.
    pub fn evaluate(&self, t: f64) -> Color {
        let t = t.clamp(0.0, 1.0);

        let first = self.stops[0];
        if t <= first.0 || self.stops.len() == 1 {
            return first.1;
        }
        let last = self.stops[self.stops.len() - 1];
        if t >= last.0 {
            return last.1;
        }

        for window in self.stops.windows(2) {
            let (start, start_color) = window[0];
            let (end, end_color) = window[1];
            if t <= end {
                if (end - start).abs() < f64::EPSILON {
                    return end_color;
                }
                return start_color.lerp(&end_color, (t - start) / (end - start));
            }
        }
        last.1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_color_is_solid() {
        let gradient = Gradient::parse("#ff0000").unwrap();
        assert_eq!(gradient.evaluate(0.0), Color::opaque(255, 0, 0));
        assert_eq!(gradient.evaluate(1.0), Color::opaque(255, 0, 0));
    }

    #[test]
    fn test_two_stop_midpoint() {
        let gradient = Gradient::parse("gradient(#000000, #ffffff)").unwrap();
        let mid = gradient.evaluate(0.5);
        assert_eq!(mid.r, 128);
        assert_eq!(gradient.evaluate(0.0), Color::opaque(0, 0, 0));
        assert_eq!(gradient.evaluate(1.0), Color::opaque(255, 255, 255));
    }

    #[test]
    fn test_explicit_positions() {
        let gradient = Gradient::parse("gradient(#000000, #ffffff 25%, #000000)").unwrap();
        assert_eq!(gradient.evaluate(0.25), Color::opaque(255, 255, 255));
        // Past the middle stop the ramp descends back to black at 100%
        let late = gradient.evaluate(0.625);
        assert_eq!(late.r, 128);
    }

    #[test]
    fn test_named_colors_in_gradient() {
        let gradient = Gradient::parse("gradient(red, blue)").unwrap();
        assert_eq!(gradient.evaluate(0.0), Color::opaque(255, 0, 0));
        assert_eq!(gradient.evaluate(1.0), Color::opaque(0, 0, 255));
    }

    #[test]
    fn test_evaluate_clamps() {
        let gradient = Gradient::parse("gradient(#102030, #405060)").unwrap();
        assert_eq!(gradient.evaluate(-1.0), Color::opaque(0x10, 0x20, 0x30));
        assert_eq!(gradient.evaluate(2.0), Color::opaque(0x40, 0x50, 0x60));
    }

    #[test]
    fn test_invalid_gradient() {
        assert!(Gradient::parse("gradient()").is_err());
        assert!(Gradient::parse("gradient(#000000, )").is_err());
        assert!(Gradient::parse("gradient(#000000 half)").is_err());
    }
}
