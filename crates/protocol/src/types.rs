use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }
}

/// A panel slot on the output canvas, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Pixels per typographic point. Font sizes in settings are points.
    pub px_per_pt: f64,
}

impl Viewport {
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    /// Convert a font size in points to pixels for this canvas.
    pub fn font_px(&self, points: f64) -> f64 {
        points * self.px_per_pt
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ColorParseError {
    #[error("invalid hex color: {0}")]
    Hex(String),
    #[error("invalid rgb triplet: {0}")]
    Rgb(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const GRAY: Color = Color::from_rgb8(0x80, 0x80, 0x80);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, 1.0)
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    /// Parse `#rrggbb` (or `rrggbb`).
    pub fn from_hex(hex: &str) -> Result<Self, ColorParseError> {
        let digits = hex.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(ColorParseError::Hex(hex.to_string()));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .map_err(|_| ColorParseError::Hex(hex.to_string()))
        };
        Ok(Self::from_rgb8(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Parse a BED `itemRgb` field: `r,g,b` with 0-255 channels, or a hex
    /// color.
    pub fn from_item_rgb(field: &str) -> Result<Self, ColorParseError> {
        let field = field.trim();
        if field.starts_with('#') {
            return Self::from_hex(field);
        }
        let channels: Vec<&str> = field.split(',').map(str::trim).collect();
        let [r, g, b] = channels.as_slice() else {
            return Err(ColorParseError::Rgb(field.to_string()));
        };
        let parse = |c: &str| {
            c.parse::<u8>()
                .map_err(|_| ColorParseError::Rgb(field.to_string()))
        };
        Ok(Self::from_rgb8(parse(r)?, parse(g)?, parse(b)?))
    }

    /// `#rrggbb`, alpha is dropped.
    pub fn to_hex(&self) -> String {
        let to8 = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!("#{:02x}{:02x}{:02x}", to8(self.r), to8(self.g), to8(self.b))
    }
}
