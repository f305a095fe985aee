//! Rectangular selection, clipboard, and drag/duplicate staging.
//!
//! The selection follows an explicit state machine:
//!
//! ```text
//! None -> Selecting -> Selected -> Dragging    -> Selected | None
//!                              \-> Duplicating -> Selected
//! ```
//!
//! Staged previews never touch the grid. Only the commit transitions
//! ([`SelectionModel::commit_drag`], [`SelectionModel::place_duplicate`],
//! [`SelectionModel::paste`]) write to it, and they report whether anything
//! changed so the caller can record one history entry.

use crate::grid::{Grid, Rect};

/// A candidate destination for staged content. The origin may lie outside
/// the grid while the pointer is dragged past an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub top: isize,
    pub left: isize,
    pub height: usize,
    pub width: usize,
}

impl Placement {
    fn of(rect: Rect) -> Self {
        Self { top: rect.start_row as isize, left: rect.start_col as isize, height: rect.height(), width: rect.width() }
    }
}

/// Enumerated selection states.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SelectionState {
    #[default]
    None,
    /// Pointer is down and the rectangle grows from `anchor`.
    Selecting { anchor: (usize, usize), rect: Rect },
    /// A frozen selection.
    Selected { rect: Rect },
    /// The selected content is being dragged; `offset` is the pointer's
    /// position inside the selection when the drag started.
    Dragging { rect: Rect, offset: (usize, usize), preview: Placement },
    /// A copy of the selection waits to be placed.
    Duplicating { rect: Rect, payload: Grid, preview: Option<Placement> },
}

/// Selection state plus the clipboard, which outlives selection changes.
#[derive(Debug, Clone, Default)]
pub struct SelectionModel {
    state: SelectionState,
    clipboard: Option<Grid>,
}

impl SelectionModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    /// The active rectangle, in any state that has one.
    pub fn rect(&self) -> Option<Rect> {
        match &self.state {
            SelectionState::None => None,
            SelectionState::Selecting { rect, .. }
            | SelectionState::Selected { rect }
            | SelectionState::Dragging { rect, .. }
            | SelectionState::Duplicating { rect, .. } => Some(*rect),
        }
    }

    /// The frozen rectangle, only when no gesture is in progress.
    pub fn selected(&self) -> Option<Rect> {
        match &self.state {
            SelectionState::Selected { rect } => Some(*rect),
            _ => None,
        }
    }

    /// Where staged content would land, for drawing the preview.
    pub fn drag_preview(&self) -> Option<Placement> {
        match &self.state {
            SelectionState::Dragging { preview, .. } => Some(*preview),
            SelectionState::Duplicating { preview, .. } => *preview,
            _ => None,
        }
    }

    pub fn clipboard(&self) -> Option<&Grid> {
        self.clipboard.as_ref()
    }

    pub fn is_staging(&self) -> bool {
        matches!(self.state, SelectionState::Dragging { .. } | SelectionState::Duplicating { .. })
    }

    /// Start a new selection at (row, col), discarding any staged gesture.
    pub fn begin(&mut self, row: usize, col: usize) {
        self.state = SelectionState::Selecting { anchor: (row, col), rect: Rect::single(row, col) };
    }

    /// Grow the selection toward (row, col). Only valid while selecting.
    pub fn extend(&mut self, row: usize, col: usize) -> bool {
        match &mut self.state {
            SelectionState::Selecting { anchor, rect } => {
                *rect = Rect::new(anchor.0, anchor.1, row, col);
                true
            }
            _ => false,
        }
    }

    /// Freeze the selection on pointer release.
    pub fn end(&mut self) -> bool {
        match self.state {
            SelectionState::Selecting { rect, .. } => {
                self.state = SelectionState::Selected { rect };
                true
            }
            _ => false,
        }
    }

    /// Select every cell of a `rows`×`cols` grid.
    pub fn select_all(&mut self, rows: usize, cols: usize) {
        self.state = SelectionState::Selected { rect: Rect::new(0, 0, rows.max(1) - 1, cols.max(1) - 1) };
    }

    /// Drop the selection entirely.
    pub fn clear(&mut self) {
        self.state = SelectionState::None;
    }

    /// Escape: discard a staged drag or duplicate and keep the selection;
    /// with nothing staged, clear the selection.
    pub fn cancel(&mut self) {
        self.state = match std::mem::take(&mut self.state) {
            SelectionState::Dragging { rect, .. } | SelectionState::Duplicating { rect, .. } => {
                SelectionState::Selected { rect }
            }
            _ => SelectionState::None,
        };
    }

    /// Intersect the selection with a resized grid, clearing it if nothing remains.
    pub fn clamp_to(&mut self, rows: usize, cols: usize) {
        if self.is_staging() {
            self.cancel();
        }
        self.state = match std::mem::take(&mut self.state) {
            SelectionState::Selecting { anchor, rect } => match rect.clamp_to(rows, cols) {
                Some(rect) => SelectionState::Selecting { anchor, rect },
                None => SelectionState::None,
            },
            SelectionState::Selected { rect } => match rect.clamp_to(rows, cols) {
                Some(rect) => SelectionState::Selected { rect },
                None => SelectionState::None,
            },
            other => other,
        };
    }

    /// Keep the selection on the same cells after `count` rows are inserted
    /// before row `at`. A selection spanning the insertion point grows.
    pub fn rows_inserted(&mut self, at: usize, count: usize) {
        self.remap(|r| {
            let (start_row, end_row) = shift_for_insert(r.start_row, r.end_row, at, count);
            Some(Rect { start_row, end_row, ..r })
        });
    }

    /// Column counterpart of [`SelectionModel::rows_inserted`].
    pub fn columns_inserted(&mut self, at: usize, count: usize) {
        self.remap(|r| {
            let (start_col, end_col) = shift_for_insert(r.start_col, r.end_col, at, count);
            Some(Rect { start_col, end_col, ..r })
        });
    }

    /// Follow the selected cells after `removed` rows starting at `index` are
    /// deleted. A selection that loses cells is cleared.
    pub fn rows_deleted(&mut self, index: usize, removed: usize) {
        self.remap(|r| {
            let (start_row, end_row) = shift_for_delete(r.start_row, r.end_row, index, removed)?;
            Some(Rect { start_row, end_row, ..r })
        });
    }

    /// Column counterpart of [`SelectionModel::rows_deleted`].
    pub fn columns_deleted(&mut self, index: usize, removed: usize) {
        self.remap(|r| {
            let (start_col, end_col) = shift_for_delete(r.start_col, r.end_col, index, removed)?;
            Some(Rect { start_col, end_col, ..r })
        });
    }

    /// Apply `map` to the selection and its anchor, dropping any staged gesture.
    fn remap(&mut self, map: impl Fn(Rect) -> Option<Rect>) {
        if self.is_staging() {
            self.cancel();
        }
        self.state = match std::mem::take(&mut self.state) {
            SelectionState::Selecting { anchor, rect } => {
                match (map(Rect::single(anchor.0, anchor.1)), map(rect)) {
                    (Some(a), Some(rect)) => SelectionState::Selecting { anchor: (a.start_row, a.start_col), rect },
                    _ => SelectionState::None,
                }
            }
            SelectionState::Selected { rect } => match map(rect) {
                Some(rect) => SelectionState::Selected { rect },
                None => SelectionState::None,
            },
            other => other,
        };
    }

    /// Copy the selected cells into the clipboard.
    pub fn copy(&mut self, grid: &Grid) -> bool {
        let Some(rect) = self.selected() else {
            return false;
        };
        match grid.extract(rect) {
            Some(content) => {
                self.clipboard = Some(content);
                true
            }
            None => false,
        }
    }

    /// Write the clipboard at the selection's top-left, clipped to the grid.
    ///
    /// The clipboard is kept, so pasting can be repeated.
    pub fn paste(&self, grid: &mut Grid) -> bool {
        let (Some(rect), Some(content)) = (self.selected(), self.clipboard.as_ref()) else {
            return false;
        };
        grid.blit(content, rect.start_row as isize, rect.start_col as isize).is_some()
    }

    /// Start dragging the selection. The pointer must be inside it.
    pub fn start_drag(&mut self, row: usize, col: usize) -> bool {
        match self.state {
            SelectionState::Selected { rect } if rect.contains(row, col) => {
                self.state = SelectionState::Dragging {
                    rect,
                    offset: (row - rect.start_row, col - rect.start_col),
                    preview: Placement::of(rect),
                };
                true
            }
            _ => false,
        }
    }

    /// Move the drag preview so the grabbed cell follows the pointer.
    pub fn move_drag(&mut self, row: usize, col: usize) -> bool {
        match &mut self.state {
            SelectionState::Dragging { offset, preview, .. } => {
                preview.top = row as isize - offset.0 as isize;
                preview.left = col as isize - offset.1 as isize;
                true
            }
            _ => false,
        }
    }

    /// Commit the drag: clear the original rectangle and write its content at
    /// the preview. The selection follows the content, clamped to the grid.
    ///
    /// Returns true if the grid changed. A drag released where it started
    /// changes nothing and just returns to the selected state.
    pub fn commit_drag(&mut self, grid: &mut Grid) -> bool {
        let SelectionState::Dragging { rect, preview, .. } = self.state else {
            return false;
        };
        if preview == Placement::of(rect) {
            self.state = SelectionState::Selected { rect };
            return false;
        }

        let destination = grid.move_region(rect, preview.top, preview.left);
        self.state = match destination {
            Some(dest) => SelectionState::Selected { rect: dest },
            None => SelectionState::None,
        };
        true
    }

    /// Stage a copy of the selection for placement without clearing the source.
    pub fn start_duplicate(&mut self, grid: &Grid) -> bool {
        let Some(rect) = self.selected() else {
            return false;
        };
        match grid.extract(rect) {
            Some(payload) => {
                self.state = SelectionState::Duplicating { rect, payload, preview: None };
                true
            }
            None => false,
        }
    }

    /// Move the duplicate preview so its top-left follows the pointer.
    pub fn move_duplicate(&mut self, row: usize, col: usize) -> bool {
        match &mut self.state {
            SelectionState::Duplicating { payload, preview, .. } => {
                *preview = Some(Placement {
                    top: row as isize,
                    left: col as isize,
                    height: payload.rows(),
                    width: payload.cols(),
                });
                true
            }
            _ => false,
        }
    }

    /// Place the staged duplicate with its top-left at (row, col), clipped to
    /// the grid, and return to the original selection.
    ///
    /// Returns true if any cell was written.
    pub fn place_duplicate(&mut self, row: usize, col: usize, grid: &mut Grid) -> bool {
        let SelectionState::Duplicating { rect, payload, .. } = &self.state else {
            return false;
        };
        let written = grid.duplicate_region(payload, row as isize, col as isize).is_some();
        self.state = SelectionState::Selected { rect: *rect };
        written
    }
}

fn shift_for_insert(start: usize, end: usize, at: usize, count: usize) -> (usize, usize) {
    if start >= at {
        (start + count, end + count)
    } else if end >= at {
        (start, end + count)
    } else {
        (start, end)
    }
}

/// `None` when the deleted band overlaps `start..=end`.
fn shift_for_delete(start: usize, end: usize, index: usize, removed: usize) -> Option<(usize, usize)> {
    if start >= index + removed {
        Some((start - removed, end - removed))
    } else if end < index {
        Some((start, end))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CellValue;

    fn tag(r: usize, c: usize) -> CellValue {
        CellValue::color(&format!("#{:02x}{:02x}00", r, c)).unwrap()
    }

    fn numbered(rows: usize, cols: usize) -> Grid {
        Grid::from_cells((0..rows).map(|r| (0..cols).map(|c| tag(r, c)).collect()).collect()).unwrap()
    }

    fn selected(rect: Rect) -> SelectionModel {
        let mut model = SelectionModel::new();
        model.begin(rect.start_row, rect.start_col);
        model.extend(rect.end_row, rect.end_col);
        model.end();
        model
    }

    #[test]
    fn test_select_normalizes_while_dragging() {
        let mut model = SelectionModel::new();
        model.begin(3, 3);
        model.extend(1, 0);
        assert_eq!(model.rect(), Some(Rect::new(1, 0, 3, 3)));
        assert!(model.end());
        assert_eq!(model.selected(), Some(Rect { start_row: 1, start_col: 0, end_row: 3, end_col: 3 }));
    }

    #[test]
    fn test_extend_requires_selecting() {
        let mut model = SelectionModel::new();
        assert!(!model.extend(1, 1));
        assert!(!model.end());
    }

    #[test]
    fn test_copy_requires_selection() {
        let mut model = SelectionModel::new();
        assert!(!model.copy(&numbered(2, 2)));
        assert!(model.clipboard().is_none());
    }

    #[test]
    fn test_copy_paste_repeatable() {
        let mut grid = numbered(3, 3);
        let mut model = selected(Rect::new(0, 0, 0, 1));
        assert!(model.copy(&grid));

        model.clear();
        assert!(model.clipboard().is_some(), "clipboard outlives the selection");
        assert!(!model.paste(&mut grid), "paste needs a selection");

        model = SelectionModel { clipboard: model.clipboard.clone(), ..selected(Rect::single(2, 2)) };
        assert!(model.paste(&mut grid));
        assert_eq!(grid.get(2, 2), Some(&tag(0, 0)));
        // (2, 3) is outside the grid and dropped
        assert_eq!(grid.get(2, 1), Some(&tag(2, 1)));

        model = SelectionModel { clipboard: model.clipboard.clone(), ..selected(Rect::single(1, 0)) };
        assert!(model.paste(&mut grid));
        assert_eq!(grid.get(1, 0), Some(&tag(0, 0)));
        assert_eq!(grid.get(1, 1), Some(&tag(0, 1)));
    }

    #[test]
    fn test_start_drag_outside_selection_rejected() {
        let mut model = selected(Rect::new(0, 0, 1, 1));
        assert!(!model.start_drag(2, 2));
        assert!(matches!(model.state(), SelectionState::Selected { .. }));
    }

    #[test]
    fn test_drag_moves_content_and_selection() {
        let mut grid = numbered(4, 4);
        let mut model = selected(Rect::new(0, 0, 1, 1));
        assert!(model.start_drag(1, 1));
        assert!(model.move_drag(2, 3));
        assert_eq!(model.drag_preview(), Some(Placement { top: 1, left: 2, height: 2, width: 2 }));
        // Preview alone leaves the grid untouched
        assert_eq!(grid, numbered(4, 4));

        assert!(model.commit_drag(&mut grid));
        assert_eq!(grid.get(0, 0), Some(&CellValue::Clear));
        assert_eq!(grid.get(1, 2), Some(&tag(0, 0)));
        assert_eq!(grid.get(2, 3), Some(&tag(1, 1)));
        assert_eq!(model.selected(), Some(Rect::new(1, 2, 2, 3)));
    }

    #[test]
    fn test_drag_past_edge_clamps_selection() {
        let mut grid = numbered(3, 3);
        let mut model = selected(Rect::new(0, 0, 1, 1));
        model.start_drag(0, 0);
        model.move_drag(2, 2);
        assert!(model.commit_drag(&mut grid));
        assert_eq!(model.selected(), Some(Rect::single(2, 2)));
        assert_eq!(grid.get(2, 2), Some(&tag(0, 0)));
    }

    #[test]
    fn test_drag_released_in_place_is_noop() {
        let mut grid = numbered(3, 3);
        let mut model = selected(Rect::new(0, 0, 1, 1));
        model.start_drag(0, 0);
        assert!(!model.commit_drag(&mut grid));
        assert_eq!(grid, numbered(3, 3));
        assert_eq!(model.selected(), Some(Rect::new(0, 0, 1, 1)));
    }

    #[test]
    fn test_cancel_drag_keeps_selection() {
        let grid = numbered(3, 3);
        let mut model = selected(Rect::new(0, 0, 1, 1));
        model.start_drag(0, 0);
        model.move_drag(1, 1);
        model.cancel();
        assert_eq!(model.selected(), Some(Rect::new(0, 0, 1, 1)));
        assert_eq!(grid, numbered(3, 3));
        model.cancel();
        assert_eq!(model.rect(), None);
    }

    #[test]
    fn test_duplicate_keeps_source() {
        let mut grid = numbered(3, 3);
        let mut model = selected(Rect::new(0, 0, 0, 1));
        assert!(model.start_duplicate(&grid));
        assert!(model.move_duplicate(2, 0));
        assert_eq!(model.drag_preview(), Some(Placement { top: 2, left: 0, height: 1, width: 2 }));
        assert!(model.place_duplicate(2, 0, &mut grid));
        assert_eq!(grid.get(0, 0), Some(&tag(0, 0)));
        assert_eq!(grid.get(2, 0), Some(&tag(0, 0)));
        assert_eq!(grid.get(2, 1), Some(&tag(0, 1)));
        assert_eq!(model.selected(), Some(Rect::new(0, 0, 0, 1)));
    }

    #[test]
    fn test_place_duplicate_requires_staging() {
        let mut grid = numbered(2, 2);
        let mut model = selected(Rect::single(0, 0));
        assert!(!model.place_duplicate(1, 1, &mut grid));
        assert_eq!(model.selected(), Some(Rect::single(0, 0)));
        assert_eq!(grid, numbered(2, 2));
    }

    #[test]
    fn test_clamp_to_smaller_grid() {
        let mut model = selected(Rect::new(1, 1, 5, 5));
        model.clamp_to(3, 3);
        assert_eq!(model.selected(), Some(Rect::new(1, 1, 2, 2)));
        model.clamp_to(1, 1);
        assert_eq!(model.rect(), None);
    }

    #[test]
    fn test_selection_follows_deleted_rows() {
        let mut model = selected(Rect::new(3, 1, 4, 2));
        model.rows_deleted(0, 2);
        assert_eq!(model.selected(), Some(Rect::new(1, 1, 2, 2)));
        model.rows_deleted(5, 1);
        assert_eq!(model.selected(), Some(Rect::new(1, 1, 2, 2)));
        model.rows_deleted(2, 1);
        assert_eq!(model.selected(), None);
    }

    #[test]
    fn test_selection_follows_inserted_columns() {
        let mut model = selected(Rect::new(0, 2, 1, 3));
        model.columns_inserted(1, 2);
        assert_eq!(model.selected(), Some(Rect::new(0, 4, 1, 5)));
        model.columns_inserted(5, 1);
        assert_eq!(model.selected(), Some(Rect::new(0, 4, 1, 6)));
        model.columns_inserted(7, 3);
        assert_eq!(model.selected(), Some(Rect::new(0, 4, 1, 6)));
    }

    #[test]
    fn test_selecting_anchor_follows_insert() {
        let mut model = SelectionModel::new();
        model.begin(2, 2);
        model.extend(3, 3);
        model.rows_inserted(0, 1);
        assert!(model.extend(0, 0));
        assert_eq!(model.rect(), Some(Rect::new(0, 0, 3, 2)));
    }

    #[test]
    fn test_select_all() {
        let mut model = SelectionModel::new();
        model.select_all(4, 6);
        assert_eq!(model.selected(), Some(Rect::new(0, 0, 3, 5)));
    }
}
