//! Palette colors and color-key resolution.
//!
//! Objects reference colors by key into the project's palette. A key that is
//! unset or absent from the palette resolves to [`FALLBACK_COLOR`] instead of
//! failing; callers are told which case applied so they can warn.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Color used for objects with no color key or an unknown one (pure blue).
pub const FALLBACK_COLOR: Color = Color::rgb(0x00, 0x00, 0xFF);

/// An opaque RGB color. Serialized as a `#RRGGBB` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Errors from parsing a color string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ColorParseError {
    #[error("color '{0}' must start with '#'")]
    MissingHash(String),
    #[error("color '{0}' must have exactly six hex digits")]
    BadLength(String),
    #[error("color '{0}' contains a non-hex digit")]
    BadDigit(String),
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RRGGBB` (case-insensitive).
    pub fn from_hex(s: &str) -> Result<Self, ColorParseError> {
        let digits = s
            .strip_prefix('#')
            .ok_or_else(|| ColorParseError::MissingHash(s.to_string()))?;
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(ColorParseError::BadLength(s.to_string()));
        }
        // from_str_radix tolerates a leading '+', so check digits up front.
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ColorParseError::BadDigit(s.to_string()));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16)
                .map_err(|_| ColorParseError::BadDigit(s.to_string()))
        };
        Ok(Self {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }

    /// Upper-case `#RRGGBB` form.
    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl TryFrom<String> for Color {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::from_hex(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

// ---------------------------------------------------------------------------
// Palette
// ---------------------------------------------------------------------------

/// Mapping from color key to color. Ordered so serialization is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Palette(BTreeMap<String, Color>);

/// Outcome of resolving an object's color key against the palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorResolution<'a> {
    /// The object has no color key.
    Unset,
    /// The key was found.
    Found(Color),
    /// The key is not in the palette; the fallback applies.
    Unknown { key: &'a str },
}

impl ColorResolution<'_> {
    pub fn color(&self) -> Color {
        match self {
            ColorResolution::Found(c) => *c,
            ColorResolution::Unset | ColorResolution::Unknown { .. } => FALLBACK_COLOR,
        }
    }
}

impl Palette {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a color, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, color: Color) -> Option<Color> {
        self.0.insert(key.into(), color)
    }

    pub fn remove(&mut self, key: &str) -> Option<Color> {
        self.0.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<Color> {
        self.0.get(key).copied()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Color)> {
        self.0.iter().map(|(k, c)| (k.as_str(), *c))
    }

    /// Resolve an optional color key. Never fails.
    pub fn resolve<'a>(&self, key: Option<&'a str>) -> ColorResolution<'a> {
        match key {
            None => ColorResolution::Unset,
            Some(k) => match self.get(k) {
                Some(c) => ColorResolution::Found(c),
                None => ColorResolution::Unknown { key: k },
            },
        }
    }
}
