//! Cell values stored in the tile grid.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::color::{canonicalize_hex, ColorError, Rgb};

/// Serialized marker for an empty cell.
pub const CLEAR_MARKER: &str = "clear";
/// Serialized marker for the reserved special material.
pub const RESERVED_MARKER: &str = "reserved";
/// Older project files spell the reserved material this way.
const LEGACY_RESERVED_MARKER: &str = "metallic";

/// A canonical lowercase `#rrggbb` tile color.
///
/// The only way to build one is through validation, so a `HexColor` is always
/// a valid color reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HexColor(String);

impl HexColor {
    /// Validate and canonicalize a hex string.
    ///
    /// # Errors
    ///
    /// Returns `ColorError` when `s` is not six hex digits.
    pub fn parse(s: &str) -> Result<Self, ColorError> {
        canonicalize_hex(s).map(HexColor)
    }

    pub fn from_rgb(rgb: Rgb) -> Self {
        HexColor(rgb.to_hex())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn rgb(&self) -> Rgb {
        let value = u32::from_str_radix(&self.0[1..], 16).unwrap_or(0);
        Rgb::new((value >> 16) as u8, (value >> 8) as u8, value as u8)
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The value of one grid cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CellValue {
    /// No tile placed.
    #[default]
    Clear,
    /// Special non-purchasable material, never matched against image colors.
    Reserved,
    /// A colored tile.
    Color(HexColor),
}

impl CellValue {
    /// Shorthand for a color cell from a hex literal.
    ///
    /// # Errors
    ///
    /// Returns `ColorError` when `s` is not a valid hex color.
    pub fn color(s: &str) -> Result<Self, ColorError> {
        HexColor::parse(s).map(CellValue::Color)
    }

    pub fn is_clear(&self) -> bool {
        matches!(self, CellValue::Clear)
    }

    /// True for `Clear` and `Reserved`, the entries excluded from supply math.
    pub fn is_special(&self) -> bool {
        !matches!(self, CellValue::Color(_))
    }

    pub fn as_color(&self) -> Option<&HexColor> {
        match self {
            CellValue::Color(c) => Some(c),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Clear => f.write_str(CLEAR_MARKER),
            CellValue::Reserved => f.write_str(RESERVED_MARKER),
            CellValue::Color(c) => write!(f, "{}", c),
        }
    }
}

impl FromStr for CellValue {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(CLEAR_MARKER) {
            return Ok(CellValue::Clear);
        }
        if trimmed.eq_ignore_ascii_case(RESERVED_MARKER)
            || trimmed.eq_ignore_ascii_case(LEGACY_RESERVED_MARKER)
        {
            return Ok(CellValue::Reserved);
        }
        CellValue::color(trimmed)
    }
}

impl TryFrom<String> for CellValue {
    type Error = ColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CellValue> for String {
    fn from(value: CellValue) -> Self {
        value.to_string()
    }
}

impl From<HexColor> for CellValue {
    fn from(value: HexColor) -> Self {
        CellValue::Color(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_markers() {
        assert_eq!("clear".parse::<CellValue>().unwrap(), CellValue::Clear);
        assert_eq!("".parse::<CellValue>().unwrap(), CellValue::Clear);
        assert_eq!("RESERVED".parse::<CellValue>().unwrap(), CellValue::Reserved);
        assert_eq!("metallic".parse::<CellValue>().unwrap(), CellValue::Reserved);
    }

    #[test]
    fn test_parse_color_canonicalizes() {
        let v: CellValue = "FF0000".parse().unwrap();
        assert_eq!(v.to_string(), "#ff0000");
    }

    #[test]
    fn test_parse_invalid_color() {
        assert!("#12345".parse::<CellValue>().is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let cells = vec![CellValue::Clear, CellValue::Reserved, CellValue::color("#00ff00").unwrap()];
        let json = serde_json::to_string(&cells).unwrap();
        assert_eq!(json, r##"["clear","reserved","#00ff00"]"##);
        let back: Vec<CellValue> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cells);
    }

    #[test]
    fn test_serde_rejects_bad_hex() {
        let result: Result<CellValue, _> = serde_json::from_str(r##""#zzzzzz""##);
        assert!(result.is_err());
    }

    #[test]
    fn test_special_flags() {
        assert!(CellValue::Clear.is_special());
        assert!(CellValue::Reserved.is_special());
        assert!(!CellValue::color("#010203").unwrap().is_special());
    }

    #[test]
    fn test_hex_color_rgb() {
        let c = HexColor::parse("#102030").unwrap();
        assert_eq!(c.rgb(), Rgb::new(0x10, 0x20, 0x30));
    }
}
