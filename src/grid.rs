//! Tile grid storage and mutation primitives.
//!
//! A [`Grid`] is a rows×columns matrix of [`CellValue`]s that is never empty
//! and always rectangular. Every mutation clips to the grid bounds: cells that
//! would land outside are dropped, never reported as errors. Mutations report
//! whether they touched anything so the caller can decide whether to record a
//! history entry.

use std::collections::HashMap;
use thiserror::Error;

use crate::models::CellValue;

/// Error building a grid from raw cells.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    /// The grid has no rows or no columns.
    #[error("grid must have at least one row and one column")]
    Empty,
    /// A row has a different length than the first row.
    #[error("row {row} has {found} cells, expected {expected} (rows must have consistent width)")]
    NotRectangular { row: usize, expected: usize, found: usize },
}

/// A rectangle of cells, inclusive on both ends, with `start <= end` on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect {
    pub start_row: usize,
    pub start_col: usize,
    pub end_row: usize,
    pub end_col: usize,
}

impl Rect {
    /// Create a rectangle from two corners, normalizing so start <= end.
    pub fn new(r1: usize, c1: usize, r2: usize, c2: usize) -> Self {
        Self { start_row: r1.min(r2), start_col: c1.min(c2), end_row: r1.max(r2), end_col: c1.max(c2) }
    }

    /// Create a rectangle from a top-left corner and a size. Sizes are floored to 1.
    pub fn from_origin(row: usize, col: usize, height: usize, width: usize) -> Self {
        Self::new(row, col, row + height.max(1) - 1, col + width.max(1) - 1)
    }

    pub fn single(row: usize, col: usize) -> Self {
        Self::new(row, col, row, col)
    }

    pub fn height(&self) -> usize {
        self.end_row - self.start_row + 1
    }

    pub fn width(&self) -> usize {
        self.end_col - self.start_col + 1
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        row >= self.start_row && row <= self.end_row && col >= self.start_col && col <= self.end_col
    }

    /// Intersect with a `rows`×`cols` grid. `None` if nothing remains.
    pub fn clamp_to(&self, rows: usize, cols: usize) -> Option<Rect> {
        if self.start_row >= rows || self.start_col >= cols {
            return None;
        }
        Some(Rect {
            start_row: self.start_row,
            start_col: self.start_col,
            end_row: self.end_row.min(rows - 1),
            end_col: self.end_col.min(cols - 1),
        })
    }

    /// Iterate over all cells in this rectangle (row-major order).
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> {
        let (start_col, end_col) = (self.start_col, self.end_col);
        (self.start_row..=self.end_row).flat_map(move |r| (start_col..=end_col).map(move |c| (r, c)))
    }
}

/// Clip a block of `height`×`width` placed at a signed origin to a grid.
///
/// Returns the in-bounds rectangle together with the offset of its top-left
/// cell inside the block.
fn clip_placement(
    top: isize,
    left: isize,
    height: usize,
    width: usize,
    rows: usize,
    cols: usize,
) -> Option<(Rect, usize, usize)> {
    let bottom = top + height as isize - 1;
    let right = left + width as isize - 1;
    if bottom < 0 || right < 0 || top >= rows as isize || left >= cols as isize {
        return None;
    }

    let start_row = top.max(0) as usize;
    let start_col = left.max(0) as usize;
    let end_row = (bottom as usize).min(rows - 1);
    let end_col = (right as usize).min(cols - 1);
    let skip_rows = (start_row as isize - top) as usize;
    let skip_cols = (start_col as isize - left) as usize;

    Some((Rect { start_row, start_col, end_row, end_col }, skip_rows, skip_cols))
}

/// Axis reflection applied to single-cell paint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum MirrorMode {
    #[default]
    None,
    /// Reflect across the vertical center line (`col -> cols-1-col`).
    Horizontal,
    /// Reflect across the horizontal center line (`row -> rows-1-row`).
    Vertical,
    Both,
}

impl MirrorMode {
    pub fn mirrors_columns(self) -> bool {
        matches!(self, MirrorMode::Horizontal | MirrorMode::Both)
    }

    pub fn mirrors_rows(self) -> bool {
        matches!(self, MirrorMode::Vertical | MirrorMode::Both)
    }
}

/// All cells a mirrored paint at `(row, col)` touches, identity first.
///
/// Targets outside the grid are dropped; duplicates (a cell on a mirror axis)
/// appear once.
pub fn mirror_targets(row: usize, col: usize, rows: usize, cols: usize, mode: MirrorMode) -> Vec<(usize, usize)> {
    if row >= rows || col >= cols {
        return Vec::new();
    }

    let mirrored_row = rows - 1 - row;
    let mirrored_col = cols - 1 - col;
    let mut targets = vec![(row, col)];
    if mode.mirrors_columns() {
        targets.push((row, mirrored_col));
    }
    if mode.mirrors_rows() {
        targets.push((mirrored_row, col));
    }
    if mode.mirrors_columns() && mode.mirrors_rows() {
        targets.push((mirrored_row, mirrored_col));
    }

    let mut unique = Vec::with_capacity(targets.len());
    for t in targets {
        if !unique.contains(&t) {
            unique.push(t);
        }
    }
    unique
}

/// Where new lines go relative to the reference index.
///
/// For columns, `Above` means to the left and `Below` to the right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum InsertPosition {
    #[value(alias = "left")]
    Above,
    #[value(alias = "right")]
    Below,
}

/// A rectangular grid of cell values.
///
/// The grid uses (row, col) coordinates where (0,0) is top-left.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    /// 2D array indexed as `cells[row][col]`.
    cells: Vec<Vec<CellValue>>,
    rows: usize,
    cols: usize,
}

impl Grid {
    /// Create an all-`Clear` grid. Dimensions are floored to 1.
    pub fn new(rows: usize, cols: usize) -> Self {
        let rows = rows.max(1);
        let cols = cols.max(1);
        Self { cells: vec![vec![CellValue::Clear; cols]; rows], rows, cols }
    }

    /// Build a grid from raw rows, validating that it is non-empty and rectangular.
    ///
    /// # Errors
    ///
    /// Returns `GridError::Empty` for zero rows or columns, and
    /// `GridError::NotRectangular` when row lengths differ.
    pub fn from_cells(cells: Vec<Vec<CellValue>>) -> Result<Self, GridError> {
        let cols = cells.first().map(Vec::len).unwrap_or(0);
        if cells.is_empty() || cols == 0 {
            return Err(GridError::Empty);
        }
        for (row, line) in cells.iter().enumerate() {
            if line.len() != cols {
                return Err(GridError::NotRectangular { row, expected: cols, found: line.len() });
            }
        }
        let rows = cells.len();
        Ok(Self { cells, rows, cols })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// The full cell matrix, row-major.
    pub fn cells(&self) -> &[Vec<CellValue>] {
        &self.cells
    }

    pub fn into_cells(self) -> Vec<Vec<CellValue>> {
        self.cells
    }

    /// Rectangle covering the whole grid.
    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.rows - 1, self.cols - 1)
    }

    /// Get the value at (row, col). Returns `None` if out of bounds.
    pub fn get(&self, row: usize, col: usize) -> Option<&CellValue> {
        self.cells.get(row).and_then(|r| r.get(col))
    }

    /// Set one cell. Out-of-bounds writes are dropped.
    ///
    /// Returns true if the cell's value changed.
    pub fn set(&mut self, row: usize, col: usize, value: CellValue) -> bool {
        match self.cells.get_mut(row).and_then(|r| r.get_mut(col)) {
            Some(cell) if *cell != value => {
                *cell = value;
                true
            }
            _ => false,
        }
    }

    /// Paint a cell and its mirror counterparts.
    ///
    /// Returns true if any targeted cell changed.
    pub fn paint(&mut self, row: usize, col: usize, value: &CellValue, mode: MirrorMode) -> bool {
        let mut changed = false;
        for (r, c) in mirror_targets(row, col, self.rows, self.cols, mode) {
            changed |= self.set(r, c, value.clone());
        }
        changed
    }

    /// Fill an entire row. Returns false if the row does not exist.
    pub fn fill_row(&mut self, row: usize, value: &CellValue) -> bool {
        match self.cells.get_mut(row) {
            Some(line) => {
                line.iter_mut().for_each(|cell| *cell = value.clone());
                true
            }
            None => false,
        }
    }

    /// Fill an entire column. Returns false if the column does not exist.
    pub fn fill_column(&mut self, col: usize, value: &CellValue) -> bool {
        if col >= self.cols {
            return false;
        }
        for line in &mut self.cells {
            line[col] = value.clone();
        }
        true
    }

    /// Fill a rectangle, clamped to the grid. Returns false if it lies entirely outside.
    pub fn fill_region(&mut self, rect: Rect, value: &CellValue) -> bool {
        let Some(clamped) = rect.clamp_to(self.rows, self.cols) else {
            return false;
        };
        for (r, c) in clamped.cells() {
            self.cells[r][c] = value.clone();
        }
        true
    }

    /// Replace every cell equal to `source` with `target`, optionally only
    /// inside `scope`. Returns the number of cells replaced.
    pub fn replace_color(&mut self, source: &CellValue, target: &CellValue, scope: Option<Rect>) -> usize {
        let area = match scope {
            Some(rect) => match rect.clamp_to(self.rows, self.cols) {
                Some(clamped) => clamped,
                None => return 0,
            },
            None => self.bounds(),
        };

        let mut replaced = 0;
        for (r, c) in area.cells() {
            if self.cells[r][c] == *source {
                self.cells[r][c] = target.clone();
                replaced += 1;
            }
        }
        replaced
    }

    /// Resize to `rows`×`cols` (floored to 1), keeping the overlapping
    /// top-left region and filling new cells with `Clear`.
    ///
    /// Returns false if the dimensions are unchanged.
    pub fn resize(&mut self, rows: usize, cols: usize) -> bool {
        let rows = rows.max(1);
        let cols = cols.max(1);
        if rows == self.rows && cols == self.cols {
            return false;
        }

        let mut cells = vec![vec![CellValue::Clear; cols]; rows];
        for (r, line) in cells.iter_mut().enumerate().take(self.rows) {
            for (c, cell) in line.iter_mut().enumerate().take(self.cols) {
                *cell = self.cells[r][c].clone();
            }
        }
        self.cells = cells;
        self.rows = rows;
        self.cols = cols;
        true
    }

    /// Insert `count` empty rows above or below `index`.
    ///
    /// The insertion point is clamped to the grid. Returns false for `count == 0`.
    pub fn insert_rows(&mut self, index: usize, position: InsertPosition, count: usize) -> bool {
        if count == 0 {
            return false;
        }
        let at = insertion_point(index, position, self.rows);
        let blank = vec![CellValue::Clear; self.cols];
        self.cells.splice(at..at, std::iter::repeat(blank).take(count));
        self.rows += count;
        true
    }

    /// Insert `count` empty columns left (`Above`) or right (`Below`) of `index`.
    pub fn insert_columns(&mut self, index: usize, position: InsertPosition, count: usize) -> bool {
        if count == 0 {
            return false;
        }
        let at = insertion_point(index, position, self.cols);
        for line in &mut self.cells {
            line.splice(at..at, std::iter::repeat(CellValue::Clear).take(count));
        }
        self.cols += count;
        true
    }

    /// Delete up to `count` rows starting at `index`.
    ///
    /// At least one row always remains. Returns the number of rows removed.
    pub fn delete_rows(&mut self, index: usize, count: usize) -> usize {
        let removable = deletable(index, count, self.rows);
        if removable > 0 {
            self.cells.drain(index..index + removable);
            self.rows -= removable;
        }
        removable
    }

    /// Delete up to `count` columns starting at `index`.
    ///
    /// At least one column always remains. Returns the number of columns removed.
    pub fn delete_columns(&mut self, index: usize, count: usize) -> usize {
        let removable = deletable(index, count, self.cols);
        if removable > 0 {
            for line in &mut self.cells {
                line.drain(index..index + removable);
            }
            self.cols -= removable;
        }
        removable
    }

    /// Copy the cells of `rect` (clamped to the grid) into a new grid.
    pub fn extract(&self, rect: Rect) -> Option<Grid> {
        let clamped = rect.clamp_to(self.rows, self.cols)?;
        let cells = (clamped.start_row..=clamped.end_row)
            .map(|r| self.cells[r][clamped.start_col..=clamped.end_col].to_vec())
            .collect();
        Some(Grid { cells, rows: clamped.height(), cols: clamped.width() })
    }

    /// Write `content` with its top-left at (`top`, `left`), dropping cells
    /// that fall outside. Returns the rectangle actually written.
    pub fn blit(&mut self, content: &Grid, top: isize, left: isize) -> Option<Rect> {
        let (area, skip_rows, skip_cols) =
            clip_placement(top, left, content.rows, content.cols, self.rows, self.cols)?;
        for (r, c) in area.cells() {
            let src = &content.cells[r - area.start_row + skip_rows][c - area.start_col + skip_cols];
            self.cells[r][c] = src.clone();
        }
        Some(area)
    }

    /// Move a region: clear the source to `Clear`, then write its former
    /// content at (`top`, `left`), clipped to the grid.
    ///
    /// Content that lands outside the grid is lost. Returns the destination
    /// rectangle actually written, or `None` if the source lies outside the
    /// grid or nothing of it lands inside.
    pub fn move_region(&mut self, source: Rect, top: isize, left: isize) -> Option<Rect> {
        let content = self.extract(source)?;
        self.fill_region(source, &CellValue::Clear);
        self.blit(&content, top, left)
    }

    /// Write externally supplied content at (`top`, `left`) without touching any source.
    pub fn duplicate_region(&mut self, content: &Grid, top: isize, left: isize) -> Option<Rect> {
        self.blit(content, top, left)
    }

    /// Number of cells holding `value`.
    pub fn count(&self, value: &CellValue) -> usize {
        self.cells.iter().flatten().filter(|c| *c == value).count()
    }

    /// Tally of every distinct cell value.
    pub fn counts(&self) -> HashMap<CellValue, usize> {
        let mut counts = HashMap::new();
        for cell in self.cells.iter().flatten() {
            *counts.entry(cell.clone()).or_insert(0) += 1;
        }
        counts
    }
}

/// Index at which new rows or columns land for an insert at `index`.
pub(crate) fn insertion_point(index: usize, position: InsertPosition, len: usize) -> usize {
    let at = match position {
        InsertPosition::Above => index,
        InsertPosition::Below => index.saturating_add(1),
    };
    at.min(len)
}

fn deletable(index: usize, count: usize, len: usize) -> usize {
    if index >= len {
        return 0;
    }
    count.min(len - index).min(len - 1)
}
