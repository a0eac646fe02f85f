//! Fill colors as the provider hands them over (`rgb(...)`, `rgba(...)`,
//! `#rrggbb`, `#rgb`) and the channel math the shading pass runs on them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::MapError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Adds `delta` to every channel, clamping to 0..=255.
    pub fn shifted(self, delta: i16) -> Self {
        let shift = |c: u8| (c as i16 + delta).clamp(0, 255) as u8;
        Self::new(shift(self.r), shift(self.g), shift(self.b))
    }

    pub fn darker(self, step: u8) -> Self {
        self.shifted(-(step as i16))
    }

    pub fn lighter(self, step: u8) -> Self {
        self.shifted(step as i16)
    }
}

/// An RGB color with straight alpha in 0.0..=1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub rgb: Rgb,
    pub alpha: f32,
}

impl Rgba {
    pub const fn opaque(rgb: Rgb) -> Self {
        Self { rgb, alpha: 1.0 }
    }
}

/// A color in its textual fill-style form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FillColor(String);

impl FillColor {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parses exactly three channels. Alpha-carrying forms are rejected.
    pub fn parse_rgb(&self) -> Result<Rgb, MapError> {
        let raw = self.0.trim();
        if let Some(hex) = raw.strip_prefix('#') {
            return parse_hex(hex).ok_or_else(|| self.malformed());
        }
        let inner = raw
            .strip_prefix("rgb(")
            .and_then(|s| s.strip_suffix(')'))
            .ok_or_else(|| self.malformed())?;
        match channels(inner).as_deref() {
            Some([r, g, b]) => Ok(Rgb::new(*r, *g, *b)),
            _ => Err(self.malformed()),
        }
    }

    /// Parses any supported form, including `rgba(r, g, b, a)`.
    pub fn parse_rgba(&self) -> Result<Rgba, MapError> {
        let raw = self.0.trim();
        if let Some(inner) = raw.strip_prefix("rgba(").and_then(|s| s.strip_suffix(')')) {
            let (rgb, alpha) = inner.rsplit_once(',').ok_or_else(|| self.malformed())?;
            let alpha: f32 = alpha.trim().parse().map_err(|_| self.malformed())?;
            return match channels(rgb).as_deref() {
                Some([r, g, b]) => Ok(Rgba {
                    rgb: Rgb::new(*r, *g, *b),
                    alpha: alpha.clamp(0.0, 1.0),
                }),
                _ => Err(self.malformed()),
            };
        }
        self.parse_rgb().map(Rgba::opaque)
    }

    /// Darkened copy; malformed colors come back as an error and callers
    /// keep the original.
    pub fn darker(&self, step: u8) -> Result<FillColor, MapError> {
        self.parse_rgb().map(|rgb| rgb.darker(step).into())
    }

    pub fn lighter(&self, step: u8) -> Result<FillColor, MapError> {
        self.parse_rgb().map(|rgb| rgb.lighter(step).into())
    }

    fn malformed(&self) -> MapError {
        MapError::MalformedColor(self.0.clone())
    }
}

impl From<Rgb> for FillColor {
    fn from(rgb: Rgb) -> Self {
        Self(format!("rgb({},{},{})", rgb.r, rgb.g, rgb.b))
    }
}

impl From<&str> for FillColor {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl fmt::Display for FillColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn channels(list: &str) -> Option<Vec<u8>> {
    list.split(',').map(|c| c.trim().parse::<u8>().ok()).collect()
}

fn parse_hex(hex: &str) -> Option<Rgb> {
    let digit = |i: usize| u8::from_str_radix(hex.get(i..i + 1)?, 16).ok();
    let pair = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    match hex.len() {
        3 => Some(Rgb::new(digit(0)? * 17, digit(1)? * 17, digit(2)? * 17)),
        6 => Some(Rgb::new(pair(0)?, pair(2)?, pair(4)?)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_forms() {
        assert_eq!(FillColor::new("rgb(100,150,80)").parse_rgb(), Ok(Rgb::new(100, 150, 80)));
        assert_eq!(FillColor::new("rgb(200, 200, 200)").parse_rgb(), Ok(Rgb::new(200, 200, 200)));
        assert_eq!(FillColor::new("#d3d3d3").parse_rgb(), Ok(Rgb::new(211, 211, 211)));
        assert_eq!(FillColor::new("#fff").parse_rgb(), Ok(Rgb::new(255, 255, 255)));
    }

    #[test]
    fn test_malformed_colors() {
        for raw in ["", "red", "rgb(1,2)", "rgb(1,2,3,4)", "rgb(300,0,0)", "#12345", "rgba(1,2,3,0.5)"] {
            assert_eq!(
                FillColor::new(raw).parse_rgb(),
                Err(MapError::MalformedColor(raw.to_string())),
                "{raw}"
            );
        }
    }

    #[test]
    fn test_parse_rgba() {
        let c = FillColor::new("rgba(255, 255, 255, 0.4)").parse_rgba().unwrap();
        assert_eq!(c.rgb, Rgb::new(255, 255, 255));
        assert!((c.alpha - 0.4).abs() < f32::EPSILON);
        assert_eq!(FillColor::new("#000000").parse_rgba().unwrap().alpha, 1.0);
    }

    #[test]
    fn test_shift_is_clamped() {
        assert_eq!(Rgb::new(10, 250, 128).darker(20), Rgb::new(0, 230, 108));
        assert_eq!(Rgb::new(10, 250, 128).lighter(20), Rgb::new(30, 255, 148));
        assert_eq!(Rgb::new(0, 0, 0).darker(20).darker(20), Rgb::new(0, 0, 0));
    }

    #[test]
    fn test_darken_then_lighten_restores_unclamped() {
        let base = FillColor::new("rgb(100,150,80)");
        let back = base.darker(20).unwrap().lighter(20).unwrap();
        assert_eq!(back, base);

        // Clamped channels do not come back.
        let edge = FillColor::new("rgb(5,150,80)");
        let back = edge.darker(20).unwrap().lighter(20).unwrap();
        assert_eq!(back.parse_rgb().unwrap(), Rgb::new(20, 150, 80));
    }

    #[test]
    fn test_display_form() {
        assert_eq!(FillColor::from(Rgb::new(1, 2, 3)).as_str(), "rgb(1,2,3)");
    }
}
