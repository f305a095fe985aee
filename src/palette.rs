//! Ordered palette of paintable colors with supply bookkeeping.
//!
//! The registry always holds exactly one `Clear` entry, and keys are unique.
//! `Clear` and `Reserved` are special entries: their quantities are
//! informational only and they never take part in supply math.

use std::collections::HashSet;
use thiserror::Error;

use crate::grid::Grid;
use crate::models::{CellValue, HexColor, PaletteEntry, Quantity};

/// Rejected palette edit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaletteError {
    /// The target key is already used by another entry.
    #[error("palette already contains '{0}'")]
    DuplicateKey(CellValue),
    /// Sentinel entries cannot be renamed, and nothing can be renamed to one.
    #[error("'{0}' is a protected palette entry")]
    ProtectedEntry(CellValue),
    #[error("palette has no entry '{0}'")]
    NotFound(CellValue),
}

/// How much of one palette color the grid uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorUsage {
    pub key: CellValue,
    pub name: Option<String>,
    pub used: usize,
    pub quantity: Quantity,
    /// Cells beyond the available supply, zero when within limits.
    pub shortfall: usize,
}

/// Registry of palette entries plus the active painting color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaletteRegistry {
    entries: Vec<PaletteEntry>,
    active: CellValue,
}

impl Default for PaletteRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PaletteRegistry {
    /// A palette holding only the `Clear` entry.
    pub fn new() -> Self {
        Self { entries: vec![PaletteEntry::clear()], active: CellValue::Clear }
    }

    /// Build a registry from raw entries.
    ///
    /// A missing `Clear` entry is synthesized and prepended. Later entries
    /// with an already-seen key are dropped.
    pub fn from_entries(entries: impl IntoIterator<Item = PaletteEntry>) -> Self {
        let mut seen = HashSet::new();
        let mut kept: Vec<PaletteEntry> = Vec::new();
        for entry in entries {
            if seen.insert(entry.key.clone()) {
                kept.push(entry);
            } else {
                log::debug!("dropping duplicate palette entry {}", entry.key);
            }
        }
        if !seen.contains(&CellValue::Clear) {
            kept.insert(0, PaletteEntry::clear());
        }
        Self { entries: kept, active: CellValue::Clear }
    }

    pub fn entries(&self) -> &[PaletteEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Never true: `Clear` is always present.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &CellValue) -> bool {
        self.position(key).is_some()
    }

    pub fn get(&self, key: &CellValue) -> Option<&PaletteEntry> {
        self.entries.iter().find(|e| e.key == *key)
    }

    fn position(&self, key: &CellValue) -> Option<usize> {
        self.entries.iter().position(|e| e.key == *key)
    }

    /// Append a color. Returns false (and changes nothing) if the key exists.
    pub fn add_color(&mut self, key: CellValue, quantity: Quantity, name: Option<String>) -> bool {
        if self.contains(&key) {
            return false;
        }
        self.entries.push(PaletteEntry { key, quantity, name });
        true
    }

    /// Rename `old` to `new` in place, keeping its quantity, name and position.
    ///
    /// Only the palette is touched; the caller is responsible for replacing
    /// the color in the grid in the same operation.
    ///
    /// # Errors
    ///
    /// - `ProtectedEntry` if either key is a sentinel
    /// - `NotFound` if `old` is not in the palette
    /// - `DuplicateKey` if `new` is already used by another entry
    pub fn edit_color(&mut self, old: &CellValue, new: HexColor) -> Result<(), PaletteError> {
        if old.is_special() {
            return Err(PaletteError::ProtectedEntry(old.clone()));
        }
        let new = CellValue::Color(new);
        let index = self.position(old).ok_or_else(|| PaletteError::NotFound(old.clone()))?;
        if *old == new {
            return Ok(());
        }
        if self.contains(&new) {
            return Err(PaletteError::DuplicateKey(new));
        }
        if self.active == *old {
            self.active = new.clone();
        }
        self.entries[index].key = new;
        Ok(())
    }

    /// Remove every entry whose key is in `keys`, except `Clear`.
    ///
    /// Resets the active color to `Clear` if it was removed. Returns the
    /// number of entries removed.
    pub fn remove_colors(&mut self, keys: &[CellValue]) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.key.is_clear() || !keys.contains(&e.key));
        if !self.contains(&self.active) {
            self.active = CellValue::Clear;
        }
        before - self.entries.len()
    }

    /// Returns false if the key is not in the palette.
    pub fn set_quantity(&mut self, key: &CellValue, quantity: Quantity) -> bool {
        match self.entries.iter_mut().find(|e| e.key == *key) {
            Some(entry) => {
                entry.quantity = quantity;
                true
            }
            None => false,
        }
    }

    /// Returns false if the key is not in the palette.
    pub fn set_name(&mut self, key: &CellValue, name: Option<String>) -> bool {
        match self.entries.iter_mut().find(|e| e.key == *key) {
            Some(entry) => {
                entry.name = name;
                true
            }
            None => false,
        }
    }

    /// The color painted by single-cell paint.
    pub fn active(&self) -> &CellValue {
        &self.active
    }

    /// Select the painting color. Keys not in the palette are rejected.
    pub fn set_active(&mut self, key: &CellValue) -> bool {
        if !self.contains(key) {
            return false;
        }
        self.active = key.clone();
        true
    }

    /// Candidate colors for assignment: every non-special entry with its supply.
    pub fn supply(&self) -> Vec<(HexColor, Quantity)> {
        self.entries.iter().filter_map(|e| e.key.as_color().map(|c| (c.clone(), e.quantity))).collect()
    }

    /// Sum of finite quantities over non-special entries.
    ///
    /// `None` when there are no colors or any color is unlimited.
    pub fn total_finite_supply(&self) -> Option<u64> {
        let supply = self.supply();
        if supply.is_empty() {
            return None;
        }
        supply.iter().try_fold(0u64, |total, (_, quantity)| quantity.limit().map(|n| total + u64::from(n)))
    }

    /// Per-entry usage of `grid`, in palette order.
    ///
    /// Special entries report their count but never a shortfall.
    pub fn usage(&self, grid: &Grid) -> Vec<ColorUsage> {
        let counts = grid.counts();
        self.entries
            .iter()
            .map(|entry| {
                let used = counts.get(&entry.key).copied().unwrap_or(0);
                let shortfall = match entry.quantity.limit() {
                    Some(limit) if !entry.key.is_special() => used.saturating_sub(limit as usize),
                    _ => 0,
                };
                ColorUsage { key: entry.key.clone(), name: entry.name.clone(), used, quantity: entry.quantity, shortfall }
            })
            .collect()
    }

    /// Cell values present in the grid that the palette does not list.
    pub fn unknown_cells(&self, grid: &Grid) -> Vec<CellValue> {
        let mut unknown: Vec<CellValue> = grid.counts().into_keys().filter(|k| !self.contains(k)).collect();
        unknown.sort_by_key(|k| k.to_string());
        unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn color(hex: &str) -> CellValue {
        CellValue::color(hex).unwrap()
    }

    fn hex(s: &str) -> HexColor {
        HexColor::parse(s).unwrap()
    }

    fn sample() -> PaletteRegistry {
        let mut palette = PaletteRegistry::new();
        palette.add_color(color("#ff0000"), Quantity::Limited(4), Some("Red".into()));
        palette.add_color(color("#0000ff"), Quantity::Unlimited, None);
        palette
    }

    #[test]
    fn test_new_has_clear() {
        let palette = PaletteRegistry::new();
        assert_eq!(palette.len(), 1);
        assert!(palette.contains(&CellValue::Clear));
        assert_eq!(palette.active(), &CellValue::Clear);
    }

    #[test]
    fn test_from_entries_synthesizes_clear() {
        let palette = PaletteRegistry::from_entries(vec![PaletteEntry::new(color("#00ff00"), Quantity::Limited(2))]);
        assert_eq!(palette.entries()[0].key, CellValue::Clear);
        assert_eq!(palette.len(), 2);
    }

    #[test]
    fn test_from_entries_dedupes_first_wins() {
        let palette = PaletteRegistry::from_entries(vec![
            PaletteEntry::clear(),
            PaletteEntry::new(color("#00ff00"), Quantity::Limited(2)),
            PaletteEntry::new(color("#00ff00"), Quantity::Limited(9)),
            PaletteEntry::clear(),
        ]);
        assert_eq!(palette.len(), 2);
        assert_eq!(palette.get(&color("#00ff00")).unwrap().quantity, Quantity::Limited(2));
    }

    #[test]
    fn test_add_duplicate_is_noop() {
        let mut palette = sample();
        assert!(!palette.add_color(color("#ff0000"), Quantity::Limited(99), None));
        assert_eq!(palette.get(&color("#ff0000")).unwrap().quantity, Quantity::Limited(4));
        assert!(!palette.add_color(CellValue::Clear, Quantity::Unlimited, None));
    }

    #[test]
    fn test_edit_color_keeps_position_and_active() {
        let mut palette = sample();
        palette.set_active(&color("#ff0000"));
        palette.edit_color(&color("#ff0000"), hex("#ee0000")).unwrap();
        assert_eq!(palette.entries()[1].key, color("#ee0000"));
        assert_eq!(palette.entries()[1].name.as_deref(), Some("Red"));
        assert_eq!(palette.active(), &color("#ee0000"));
    }

    #[test]
    fn test_edit_color_rejects_collision() {
        let mut palette = sample();
        let before = palette.clone();
        assert_eq!(
            palette.edit_color(&color("#ff0000"), hex("#0000ff")),
            Err(PaletteError::DuplicateKey(color("#0000ff")))
        );
        assert_eq!(palette, before);
    }

    #[test]
    fn test_edit_color_protects_sentinels() {
        let mut palette = sample();
        assert_eq!(
            palette.edit_color(&CellValue::Clear, hex("#123456")),
            Err(PaletteError::ProtectedEntry(CellValue::Clear))
        );
    }

    #[test]
    fn test_edit_color_missing() {
        let mut palette = sample();
        assert!(matches!(palette.edit_color(&color("#abcdef"), hex("#123456")), Err(PaletteError::NotFound(_))));
    }

    #[test]
    fn test_remove_protects_clear_and_resets_active() {
        let mut palette = sample();
        palette.set_active(&color("#0000ff"));
        let removed = palette.remove_colors(&[CellValue::Clear, color("#0000ff"), color("#999999")]);
        assert_eq!(removed, 1);
        assert!(palette.contains(&CellValue::Clear));
        assert_eq!(palette.active(), &CellValue::Clear);
    }

    #[test]
    fn test_set_active_unknown_rejected() {
        let mut palette = sample();
        assert!(!palette.set_active(&color("#111111")));
        assert_eq!(palette.active(), &CellValue::Clear);
    }

    #[test]
    fn test_supply_excludes_specials() {
        let mut palette = sample();
        palette.add_color(CellValue::Reserved, Quantity::Limited(10), None);
        let supply = palette.supply();
        assert_eq!(supply.len(), 2);
        assert_eq!(supply[0], (hex("#ff0000"), Quantity::Limited(4)));
    }

    #[test]
    fn test_total_finite_supply() {
        let mut palette = sample();
        assert_eq!(palette.total_finite_supply(), None);
        palette.set_quantity(&color("#0000ff"), Quantity::Limited(6));
        assert_eq!(palette.total_finite_supply(), Some(10));
        assert_eq!(PaletteRegistry::new().total_finite_supply(), None);
    }

    #[test]
    fn test_usage_reports_shortfall() {
        let palette = sample();
        let mut grid = Grid::new(2, 3);
        grid.fill_region(grid.bounds(), &color("#ff0000"));
        grid.set(0, 0, CellValue::Reserved);

        let usage = palette.usage(&grid);
        let red = usage.iter().find(|u| u.key == color("#ff0000")).unwrap();
        assert_eq!(red.used, 5);
        assert_eq!(red.shortfall, 1);
        let blue = usage.iter().find(|u| u.key == color("#0000ff")).unwrap();
        assert_eq!(blue.shortfall, 0);
        assert_eq!(palette.unknown_cells(&grid), vec![CellValue::Reserved]);
    }
}
