//! Serialized project document.

use serde::{Deserialize, Serialize};

use super::cell::CellValue;
use super::palette::PaletteEntry;

/// The on-disk project format.
///
/// `rows`, `columns` and `cells` are required; a missing field fails
/// deserialization. The palette is optional and defaults to empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectFile {
    pub rows: usize,
    pub columns: usize,
    pub cells: Vec<Vec<CellValue>>,
    #[serde(default)]
    pub palette: Vec<PaletteEntry>,
}
