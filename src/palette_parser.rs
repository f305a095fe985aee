//! Palette import and export
//!
//! Two textual forms are accepted:
//! - Structured JSON: `{ "colors": [...] }` or a bare array of
//!   `{ "hex", "quantity", "name" }` objects
//! - Delimited text: one `name, quantity, hex` entry per line, with an
//!   optional header line
//!
//! Parsing is lenient by default: a malformed entry is skipped (bad hex) or
//! patched (bad quantity becomes unlimited) and reported as a [`ParseWarning`],
//! so one bad line never sinks the whole import.
//!
//! # Example
//!
//! ```
//! use mosaicplan::palette_parser::{parse_palette, ParseMode};
//!
//! let text = "name,quantity,hex\nEmpty,,n/a\nRed,12,FF0000\nBad,3,#xyz\n";
//! let parsed = parse_palette(text, ParseMode::Lenient).unwrap();
//!
//! assert_eq!(parsed.entries.len(), 2);
//! assert_eq!(parsed.warnings.len(), 1);
//! ```

use serde::Deserialize;
use thiserror::Error;

use crate::color::{hue, ColorError};
use crate::models::{CellValue, HexColor, PaletteEntry, Quantity};

/// Hex tokens that mark a special (non-color) row in delimited text.
const NOT_APPLICABLE: &[&str] = &["", "n/a", "na", "none", "-"];
/// Quantity tokens meaning no supply limit.
const UNLIMITED_TOKENS: &[&str] = &["", "unlimited", "inf", "∞"];
/// Header detection keywords for the first field.
const HEADER_KEYWORDS: &[&str] = &["hex", "color", "name"];

/// Error during palette parsing
#[derive(Debug, Error)]
pub enum PaletteParseError {
    /// The structured form is not valid JSON
    #[error("invalid palette JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The JSON is neither an array nor an object with a `colors` array
    #[error("palette JSON must be an array or an object with a \"colors\" array")]
    UnsupportedShape,
    /// Strict mode: a line was rejected
    #[error("line {line}: {message}")]
    Rejected { line: usize, message: String },
}

/// A skipped or patched entry in lenient mode.
///
/// `line` is the 1-based source line for delimited text and the 1-based entry
/// index for JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWarning {
    pub line: usize,
    pub message: String,
}

impl ParseWarning {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self { line, message: message.into() }
    }
}

impl std::fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

/// Parsing mode for palette import
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseMode {
    /// Stop on first malformed entry
    Strict,
    /// Skip or patch malformed entries and record warnings
    #[default]
    Lenient,
}

/// Result of parsing a palette
#[derive(Debug, Clone, Default)]
pub struct ParsedPalette {
    /// Specials first, then colors in hue order
    pub entries: Vec<PaletteEntry>,
    /// Warnings generated during lenient parsing
    pub warnings: Vec<ParseWarning>,
}

/// Field separator of a delimited palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Comma,
    Semicolon,
    Tab,
}

impl Delimiter {
    /// Tab if the line has one, semicolon if it has semicolons but no comma,
    /// comma otherwise.
    pub fn detect(line: &str) -> Self {
        if line.contains('\t') {
            Delimiter::Tab
        } else if line.contains(';') && !line.contains(',') {
            Delimiter::Semicolon
        } else {
            Delimiter::Comma
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Delimiter::Comma => ',',
            Delimiter::Semicolon => ';',
            Delimiter::Tab => '\t',
        }
    }
}

/// Collects entries and warnings, honoring the parse mode.
struct Collector {
    mode: ParseMode,
    specials_seen: usize,
    result: ParsedPalette,
}

impl Collector {
    fn new(mode: ParseMode) -> Self {
        Self { mode, specials_seen: 0, result: ParsedPalette::default() }
    }

    fn reject(&mut self, line: usize, message: String) -> Result<(), PaletteParseError> {
        if self.mode == ParseMode::Strict {
            return Err(PaletteParseError::Rejected { line, message });
        }
        log::warn!("palette line {}: {}", line, message);
        self.result.warnings.push(ParseWarning::new(line, message));
        Ok(())
    }

    /// The first special row becomes `Clear`, the second `Reserved`, the
    /// rest are ignored.
    fn push_special(&mut self, line: usize, quantity: Quantity, name: Option<String>) -> Result<(), PaletteParseError> {
        let key = match self.specials_seen {
            0 => CellValue::Clear,
            1 => CellValue::Reserved,
            _ => {
                self.specials_seen += 1;
                return self.reject(line, "extra special row ignored".to_string());
            }
        };
        self.specials_seen += 1;
        self.result.entries.push(PaletteEntry { key, quantity, name });
        Ok(())
    }

    fn push_color(&mut self, line: usize, color: HexColor, quantity: Quantity, name: Option<String>) -> Result<(), PaletteParseError> {
        let key = CellValue::Color(color);
        if self.result.entries.iter().any(|e| e.key == key) {
            return self.reject(line, format!("duplicate color {} ignored", key));
        }
        self.result.entries.push(PaletteEntry { key, quantity, name });
        Ok(())
    }

    fn finish(mut self) -> ParsedPalette {
        self.result.entries = rainbow_order(self.result.entries);
        self.result
    }
}

/// Parse a palette in either form, choosing JSON when the text starts with
/// `{` or `[`.
pub fn parse_palette(text: &str, mode: ParseMode) -> Result<ParsedPalette, PaletteParseError> {
    let body = text.trim_start_matches('\u{feff}');
    let head = body.trim_start();
    if head.starts_with('{') || head.starts_with('[') {
        parse_json(head, mode)
    } else {
        parse_delimited(body, mode)
    }
}

#[derive(Deserialize)]
struct RawEntry {
    #[serde(default)]
    hex: Option<String>,
    #[serde(default)]
    quantity: Option<serde_json::Value>,
    #[serde(default)]
    name: Option<String>,
}

/// Parse the structured JSON form.
///
/// Entries are validated one by one so a single bad hex only drops that entry.
/// `"clear"` and `"reserved"` hex values name the special entries.
pub fn parse_json(text: &str, mode: ParseMode) -> Result<ParsedPalette, PaletteParseError> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    let items = match value {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(mut map) => match map.remove("colors").or_else(|| map.remove("palette")) {
            Some(serde_json::Value::Array(items)) => items,
            _ => return Err(PaletteParseError::UnsupportedShape),
        },
        _ => return Err(PaletteParseError::UnsupportedShape),
    };

    let mut collector = Collector::new(mode);
    for (index, item) in items.into_iter().enumerate() {
        let line = index + 1;
        let raw: RawEntry = match serde_json::from_value(item) {
            Ok(raw) => raw,
            Err(e) => {
                collector.reject(line, format!("malformed entry: {}", e))?;
                continue;
            }
        };
        let Some(hex) = raw.hex else {
            collector.reject(line, "entry has no hex".to_string())?;
            continue;
        };

        let quantity = match raw.quantity {
            None => Quantity::Unlimited,
            Some(value) => match serde_json::from_value::<Quantity>(value.clone()) {
                Ok(q) => q,
                Err(_) => {
                    collector.reject(line, format!("invalid quantity {}, using unlimited", value))?;
                    Quantity::Unlimited
                }
            },
        };

        match hex.parse::<CellValue>() {
            Ok(CellValue::Color(color)) => collector.push_color(line, color, quantity, raw.name)?,
            Ok(special) => {
                let key_taken = collector.result.entries.iter().any(|e| e.key == special);
                if key_taken {
                    collector.reject(line, format!("duplicate {} entry ignored", special))?;
                } else {
                    collector.result.entries.push(PaletteEntry { key: special, quantity, name: raw.name });
                }
            }
            Err(e) => collector.reject(line, format!("invalid hex '{}': {}", hex, e))?,
        }
    }
    Ok(collector.finish())
}

/// Parse the delimited `name, quantity, hex` form.
pub fn parse_delimited(text: &str, mode: ParseMode) -> Result<ParsedPalette, PaletteParseError> {
    let mut lines = text.lines().enumerate().filter(|(_, l)| !l.trim().is_empty()).peekable();
    let delimiter = match lines.peek() {
        Some((_, first)) => Delimiter::detect(first),
        None => return Ok(ParsedPalette::default()),
    };

    let mut collector = Collector::new(mode);
    let mut first = true;
    for (index, raw_line) in lines {
        let line = index + 1;
        let fields = split_fields(raw_line, delimiter.as_char());
        let field = |i: usize| fields.get(i).map(String::as_str).unwrap_or("");

        if std::mem::take(&mut first) && is_header(field(0)) {
            continue;
        }

        let name = Some(field(0).to_string()).filter(|n| !n.is_empty());
        let quantity = match parse_quantity(field(1)) {
            Some(q) => q,
            None => {
                collector.reject(line, format!("invalid quantity '{}', using unlimited", field(1)))?;
                Quantity::Unlimited
            }
        };

        let hex = field(2);
        if is_not_applicable(hex) {
            collector.push_special(line, quantity, name)?;
            continue;
        }
        match HexColor::parse(hex) {
            Ok(color) => collector.push_color(line, color, quantity, name)?,
            Err(e) => collector.reject(line, invalid_hex_message(hex, &e))?,
        }
    }
    Ok(collector.finish())
}

fn invalid_hex_message(hex: &str, error: &ColorError) -> String {
    format!("invalid hex '{}': {}", hex, error)
}

/// Split on `delimiter`, except inside double quotes.
fn split_fields(line: &str, delimiter: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    for ch in line.chars() {
        match ch {
            '"' => {
                quoted = !quoted;
                current.push(ch);
            }
            c if c == delimiter && !quoted => fields.push(clean_field(&std::mem::take(&mut current))),
            c => current.push(c),
        }
    }
    fields.push(clean_field(&current));
    fields
}

fn clean_field(field: &str) -> String {
    let trimmed = field.trim();
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed);
    unquoted.trim().to_string()
}

fn is_header(first_field: &str) -> bool {
    let lower = first_field.to_lowercase();
    HEADER_KEYWORDS.iter().any(|k| lower.contains(k))
}

fn is_not_applicable(hex: &str) -> bool {
    NOT_APPLICABLE.iter().any(|t| hex.eq_ignore_ascii_case(t))
}

/// `None` for an unparsable token.
fn parse_quantity(token: &str) -> Option<Quantity> {
    if UNLIMITED_TOKENS.iter().any(|t| token.eq_ignore_ascii_case(t)) {
        return Some(Quantity::Unlimited);
    }
    token.parse::<u32>().ok().map(Quantity::Limited)
}

/// Specials first (`Clear` before `Reserved`), then colors by ascending hue.
///
/// The sort is stable, so colors of equal hue keep their input order.
pub fn rainbow_order(entries: Vec<PaletteEntry>) -> Vec<PaletteEntry> {
    let (mut specials, mut colors): (Vec<_>, Vec<_>) = entries.into_iter().partition(|e| e.key.is_special());
    specials.sort_by_key(|e| !e.key.is_clear());
    colors.sort_by(|a, b| entry_hue(a).total_cmp(&entry_hue(b)));
    specials.extend(colors);
    specials
}

fn entry_hue(entry: &PaletteEntry) -> f64 {
    entry.key.as_color().map(|c| hue(c.rgb())).unwrap_or(0.0)
}

/// Export as comma-delimited text with a header.
///
/// Specials are written with an `n/a` hex, `Clear` first, so the output
/// re-imports to the same palette.
pub fn to_delimited(entries: &[PaletteEntry]) -> String {
    let mut ordered: Vec<&PaletteEntry> = entries.iter().filter(|e| e.key.is_special()).collect();
    ordered.sort_by_key(|e| !e.key.is_clear());
    ordered.extend(entries.iter().filter(|e| !e.key.is_special()));

    let mut out = String::from("name,quantity,hex\n");
    for entry in ordered {
        let hex = match &entry.key {
            CellValue::Color(c) => c.to_string(),
            _ => "n/a".to_string(),
        };
        let name = entry.name.as_deref().unwrap_or("");
        let name = if name.contains(',') { format!("\"{}\"", name) } else { name.to_string() };
        out.push_str(&format!("{},{},{}\n", name, entry.quantity, hex));
    }
    out
}
