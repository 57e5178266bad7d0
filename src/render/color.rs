use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Straight (non-premultiplied) RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0x00, 0x00, 0x00);
    pub const WHITE: Color = Color::rgb(0xFF, 0xFF, 0xFF);
    /// Outline color for keys and note borders.
    pub const OUTLINE: Color = Color::rgb(0x25, 0x25, 0x25);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xFF }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Same color with `alpha` (0.0..=1.0) as its opacity.
    pub fn with_alpha(self, alpha: f64) -> Self {
        Self {
            a: (alpha.clamp(0.0, 1.0) * 255.0).round() as u8,
            ..self
        }
    }

    /// Parses `#rgb`, `#rrggbb`, `0xrgb` or `0xrrggbb`.
    pub fn from_hex(src: &str) -> Result<Self, ConfigError> {
        let invalid = || ConfigError::InvalidColor(src.to_string());
        let digits = src
            .strip_prefix('#')
            .or_else(|| src.strip_prefix("0x"))
            .or_else(|| src.strip_prefix("0X"))
            .ok_or_else(invalid)?;
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let channel = |s: &str| u8::from_str_radix(s, 16).map_err(|_| invalid());
        match digits.len() {
            3 => {
                let r = channel(&digits[0..1])?;
                let g = channel(&digits[1..2])?;
                let b = channel(&digits[2..3])?;
                Ok(Self::rgb(r * 0x11, g * 0x11, b * 0x11))
            }
            6 => Ok(Self::rgb(
                channel(&digits[0..2])?,
                channel(&digits[2..4])?,
                channel(&digits[4..6])?,
            )),
            _ => Err(invalid()),
        }
    }

    /// Note color for a channel or track index.
    pub fn palette(index: u32) -> Self {
        PALETTE[index as usize % PALETTE.len()]
    }
}

const PALETTE: [Color; 16] = [
    Color::rgb(0x33, 0x66, 0xFF),
    Color::rgb(0xFF, 0x7E, 0x33),
    Color::rgb(0x33, 0xFF, 0x66),
    Color::rgb(0xFF, 0x33, 0x81),
    Color::rgb(0x33, 0xFF, 0xFF),
    Color::rgb(0xE4, 0x33, 0xFF),
    Color::rgb(0x99, 0xFF, 0x33),
    Color::rgb(0x4B, 0x33, 0xFF),
    Color::rgb(0xFF, 0xCC, 0x33),
    Color::rgb(0x33, 0xB4, 0xFF),
    Color::rgb(0xFF, 0x33, 0x33),
    Color::rgb(0x33, 0xFF, 0xB1),
    Color::rgb(0xFF, 0x33, 0xCC),
    Color::rgb(0x4E, 0xFF, 0x33),
    Color::rgb(0x99, 0x33, 0xFF),
    Color::rgb(0xE7, 0xFF, 0x33),
];

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl FromStr for Color {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl TryFrom<String> for Color {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}
