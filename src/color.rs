//! Color utilities for tile colors
//!
//! Tile colors are always stored as canonical lowercase `#rrggbb` strings.
//! This module provides:
//! - Canonicalization and strict validation of hex strings
//! - Conversion between hex strings and RGB triples
//! - The redmean perceptual distance used for color matching
//! - HSL hue, used to order palettes in rainbow order

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

/// Strict pattern for a canonical tile color.
static HEX_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#[0-9a-f]{6}$").expect("hex pattern is a valid regex"));

/// Error type for color parsing failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorError {
    /// Input string was empty
    #[error("empty color string")]
    Empty,
    /// Invalid length (must be exactly 6 hex chars after the optional #)
    #[error("invalid color length {0}, expected 6")]
    InvalidLength(usize),
    /// Contains non-hex characters
    #[error("invalid hex character '{0}'")]
    InvalidHex(char),
}

/// An opaque RGB color.
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

    /// Parse a hex color (`#rrggbb` or `rrggbb`, any case).
    ///
    /// # Errors
    ///
    /// Returns `ColorError` if the input is not exactly six hex digits.
    pub fn from_hex(s: &str) -> Result<Self, ColorError> {
        let canonical = canonicalize_hex(s)?;
        let value = u32::from_str_radix(&canonical[1..], 16)
            .map_err(|_| ColorError::InvalidHex(canonical.chars().nth(1).unwrap_or('#')))?;
        Ok(Self { r: (value >> 16) as u8, g: (value >> 8) as u8, b: value as u8 })
    }

    /// Format as canonical lowercase `#rrggbb`.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Canonicalize a hex color string to lowercase `#rrggbb`.
///
/// Surrounding whitespace is ignored and the leading `#` is optional.
/// Shorthand forms such as `#f00` are rejected.
///
/// # Examples
///
/// ```
/// use mosaicplan::color::canonicalize_hex;
///
/// assert_eq!(canonicalize_hex("FF8800").unwrap(), "#ff8800");
/// assert_eq!(canonicalize_hex(" #00aaFF ").unwrap(), "#00aaff");
/// assert!(canonicalize_hex("#f80").is_err());
/// ```
///
/// # Errors
///
/// Returns `ColorError` if the input is empty, has the wrong length, or
/// contains non-hex characters.
pub fn canonicalize_hex(s: &str) -> Result<String, ColorError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(ColorError::Empty);
    }

    let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
    let candidate = format!("#{}", digits.to_ascii_lowercase());
    if HEX_PATTERN.is_match(&candidate) {
        return Ok(candidate);
    }

    if let Some(bad) = digits.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(ColorError::InvalidHex(bad));
    }
    Err(ColorError::InvalidLength(digits.len()))
}

/// Squared redmean distance between two colors.
///
/// Red and blue are weighted by the mean red level of the pair and green is
/// weighted most heavily, approximating human luminance sensitivity:
///
/// `(2 + r̄/256)·Δr² + 4·Δg² + (2 + (255 − r̄)/256)·Δb²`
pub fn perceptual_distance_sq(a: Rgb, b: Rgb) -> f64 {
    let mean_r = (a.r as f64 + b.r as f64) / 2.0;
    let dr = a.r as f64 - b.r as f64;
    let dg = a.g as f64 - b.g as f64;
    let db = a.b as f64 - b.b as f64;

    (2.0 + mean_r / 256.0) * dr * dr + 4.0 * dg * dg + (2.0 + (255.0 - mean_r) / 256.0) * db * db
}

/// Redmean distance between two colors.
pub fn perceptual_distance(a: Rgb, b: Rgb) -> f64 {
    perceptual_distance_sq(a, b).sqrt()
}

/// Perceptual distance between two hex strings.
///
/// Any operand that is not a valid hex color yields `f64::INFINITY`, which
/// keeps it from ever winning a nearest-color comparison.
pub fn hex_distance(a: &str, b: &str) -> f64 {
    match (Rgb::from_hex(a), Rgb::from_hex(b)) {
        (Ok(a), Ok(b)) => perceptual_distance(a, b),
        _ => f64::INFINITY,
    }
}

/// HSL hue of a color in degrees, in `[0, 360)`. Greys have hue 0.
pub fn hue(color: Rgb) -> f64 {
    let r = color.r as f64 / 255.0;
    let g = color.g as f64 / 255.0;
    let b = color.b as f64 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;
    if delta == 0.0 {
        return 0.0;
    }

    let h = if max == r {
        ((g - b) / delta) % 6.0
    } else if max == g {
        (b - r) / delta + 2.0
    } else {
        (r - g) / delta + 4.0
    };

    let degrees = h * 60.0;
    if degrees < 0.0 {
        degrees + 360.0
    } else {
        degrees
    }
}
