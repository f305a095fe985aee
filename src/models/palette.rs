//! Palette entry and supply quantity types.

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

use super::cell::CellValue;

/// Serialized marker for an unlimited supply.
pub const UNLIMITED_MARKER: &str = "unlimited";

/// How many tiles of a color are available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Quantity {
    /// A finite stock of tiles.
    Limited(u32),
    /// No supply constraint.
    #[default]
    Unlimited,
}

impl Quantity {
    pub fn is_unlimited(&self) -> bool {
        matches!(self, Quantity::Unlimited)
    }

    /// The finite count, if any.
    pub fn limit(&self) -> Option<u32> {
        match self {
            Quantity::Limited(n) => Some(*n),
            Quantity::Unlimited => None,
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quantity::Limited(n) => write!(f, "{}", n),
            Quantity::Unlimited => f.write_str(UNLIMITED_MARKER),
        }
    }
}

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Quantity::Limited(n) => serializer.serialize_u32(*n),
            Quantity::Unlimited => serializer.serialize_str(UNLIMITED_MARKER),
        }
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct QuantityVisitor;

        impl<'de> Visitor<'de> for QuantityVisitor {
            type Value = Quantity;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a non-negative integer or \"unlimited\"")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Quantity, E> {
                u32::try_from(v).map(Quantity::Limited).map_err(|_| E::custom("quantity too large"))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Quantity, E> {
                u32::try_from(v)
                    .map(Quantity::Limited)
                    .map_err(|_| E::custom("quantity must be a non-negative integer"))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Quantity, E> {
                if v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v <= u32::MAX as f64 {
                    Ok(Quantity::Limited(v as u32))
                } else {
                    Err(E::custom("quantity must be a non-negative integer"))
                }
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Quantity, E> {
                if v.eq_ignore_ascii_case(UNLIMITED_MARKER) {
                    Ok(Quantity::Unlimited)
                } else {
                    v.trim()
                        .parse::<u32>()
                        .map(Quantity::Limited)
                        .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
                }
            }

            fn visit_unit<E: de::Error>(self) -> Result<Quantity, E> {
                Ok(Quantity::Unlimited)
            }

            fn visit_none<E: de::Error>(self) -> Result<Quantity, E> {
                Ok(Quantity::Unlimited)
            }
        }

        deserializer.deserialize_any(QuantityVisitor)
    }
}

/// One color available for painting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaletteEntry {
    /// The color (or sentinel) this entry paints.
    #[serde(rename = "hex")]
    pub key: CellValue,
    /// Available supply.
    #[serde(default)]
    pub quantity: Quantity,
    /// Optional display name.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub name: Option<String>,
}

impl PaletteEntry {
    pub fn new(key: CellValue, quantity: Quantity) -> Self {
        Self { key, quantity, name: None }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// The entry every palette starts with.
    pub fn clear() -> Self {
        Self::new(CellValue::Clear, Quantity::Unlimited)
    }
}
