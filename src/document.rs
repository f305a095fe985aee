//! The authoritative editing state: grid, history, selection and palette.
//!
//! Every edit goes through a [`Document`] method. A method that changes the
//! grid records exactly one history entry when it completes, so each call is
//! one undo step. Methods that cannot apply (out of range, nothing selected,
//! stale import) leave every part of the state untouched.

use tokio::sync::watch;
use tokio::time::Instant;

use crate::grid::{insertion_point, Grid, InsertPosition, MirrorMode, Rect};
use crate::history::{CommitOutcome, History, DEFAULT_HISTORY_LIMIT};
use crate::import::assignment::DEFAULT_MAX_ROUNDS;
use crate::import::{
    assign_colors, AssignmentReport, ImportError, ImportPlan, ImportScheduler, ImportSizing, ImportTicket, Raster,
    SampledImage, DEFAULT_ALPHA_THRESHOLD, DEFAULT_MIN_DIMENSION, DEFAULT_SUPPLY_COVERAGE,
};
use crate::models::{CellValue, HexColor, PaletteEntry, Quantity};
use crate::palette::{PaletteError, PaletteRegistry};
use crate::project::{Project, ProjectError};
use crate::selection::{SelectionModel, SelectionState};

/// Tunables for a document, usually filled from configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DocumentOptions {
    pub history_limit: usize,
    pub max_rounds: usize,
    pub alpha_threshold: u8,
    pub supply_coverage: f64,
    pub min_dimension: usize,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            max_rounds: DEFAULT_MAX_ROUNDS,
            alpha_threshold: DEFAULT_ALPHA_THRESHOLD,
            supply_coverage: DEFAULT_SUPPLY_COVERAGE,
            min_dimension: DEFAULT_MIN_DIMENSION,
        }
    }
}

/// A mosaic being edited.
#[derive(Debug)]
pub struct Document {
    grid: Grid,
    history: History,
    selection: SelectionModel,
    palette: PaletteRegistry,
    mirror: MirrorMode,
    imports: ImportScheduler,
    unsaved: watch::Sender<Option<Instant>>,
    options: DocumentOptions,
}

impl Document {
    /// An all-`Clear` document with an empty palette.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self::with_options(rows, cols, DocumentOptions::default())
    }

    pub fn with_options(rows: usize, cols: usize, options: DocumentOptions) -> Self {
        Self::from_project(Project::new(Grid::new(rows, cols), PaletteRegistry::new()), options)
    }

    /// Open an already validated project. History starts at its grid.
    pub fn from_project(project: Project, options: DocumentOptions) -> Self {
        let history = History::with_limit(&project.grid, options.history_limit);
        let (unsaved, _) = watch::channel(None);
        Self {
            grid: project.grid,
            history,
            selection: SelectionModel::new(),
            palette: project.palette,
            mirror: MirrorMode::None,
            imports: ImportScheduler::new(),
            unsaved,
            options,
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn palette(&self) -> &PaletteRegistry {
        &self.palette
    }

    pub fn selection(&self) -> &SelectionModel {
        &self.selection
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn options(&self) -> &DocumentOptions {
        &self.options
    }

    pub fn mirror_mode(&self) -> MirrorMode {
        self.mirror
    }

    pub fn set_mirror_mode(&mut self, mode: MirrorMode) {
        self.mirror = mode;
    }

    /// Record the live grid after a mutation.
    fn record(&mut self) {
        match self.history.commit(&self.grid) {
            CommitOutcome::Recorded | CommitOutcome::Deferred => self.mark_unsaved(),
            CommitOutcome::Suppressed => {}
        }
    }

    fn mark_unsaved(&mut self) {
        self.unsaved.send_if_modified(|since| {
            if since.is_none() {
                *since = Some(Instant::now());
                true
            } else {
                false
            }
        });
    }

    // ========== Painting ==========

    /// Paint the active color at (row, col) and its mirror counterparts.
    pub fn paint(&mut self, row: usize, col: usize) -> bool {
        let value = self.palette.active().clone();
        self.paint_with(row, col, &value)
    }

    /// Paint a specific value at (row, col) and its mirror counterparts.
    pub fn paint_with(&mut self, row: usize, col: usize, value: &CellValue) -> bool {
        let changed = self.grid.paint(row, col, value, self.mirror);
        if changed {
            self.record();
        }
        changed
    }

    /// Start a drag-paint gesture. Paints made before [`Document::end_stroke`]
    /// become one history entry.
    pub fn begin_stroke(&mut self) {
        self.history.begin_stroke();
    }

    pub fn end_stroke(&mut self) -> bool {
        self.history.end_stroke(&self.grid)
    }

    // ========== Region fills ==========

    pub fn fill_row(&mut self, row: usize, value: &CellValue) -> bool {
        let filled = self.grid.fill_row(row, value);
        if filled {
            self.record();
        }
        filled
    }

    pub fn fill_column(&mut self, col: usize, value: &CellValue) -> bool {
        let filled = self.grid.fill_column(col, value);
        if filled {
            self.record();
        }
        filled
    }

    pub fn fill_region(&mut self, rect: Rect, value: &CellValue) -> bool {
        let filled = self.grid.fill_region(rect, value);
        if filled {
            self.record();
        }
        filled
    }

    /// Fill the frozen selection.
    pub fn fill_selection(&mut self, value: &CellValue) -> bool {
        match self.selection.selected() {
            Some(rect) => self.fill_region(rect, value),
            None => false,
        }
    }

    pub fn clear_selection_cells(&mut self) -> bool {
        self.fill_selection(&CellValue::Clear)
    }

    /// Replace `source` with `target` across the grid or inside `scope`.
    ///
    /// Records one entry whenever the scope overlaps the grid, even if no
    /// cell matched. Returns the number of cells replaced.
    pub fn replace_color(&mut self, source: &CellValue, target: &CellValue, scope: Option<Rect>) -> usize {
        if let Some(rect) = scope {
            if rect.clamp_to(self.grid.rows(), self.grid.cols()).is_none() {
                return 0;
            }
        }
        let replaced = self.grid.replace_color(source, target, scope);
        self.record();
        replaced
    }

    // ========== Structure ==========

    pub fn resize(&mut self, rows: usize, cols: usize) -> bool {
        let resized = self.grid.resize(rows, cols);
        if resized {
            self.selection.clamp_to(self.grid.rows(), self.grid.cols());
            self.record();
        }
        resized
    }

    /// Insert rows; the selection stays on the cells it held.
    pub fn insert_rows(&mut self, index: usize, position: InsertPosition, count: usize) -> bool {
        let at = insertion_point(index, position, self.grid.rows());
        let inserted = self.grid.insert_rows(index, position, count);
        if inserted {
            self.selection.rows_inserted(at, count);
            self.record();
        }
        inserted
    }

    /// Insert columns; the selection stays on the cells it held.
    pub fn insert_columns(&mut self, index: usize, position: InsertPosition, count: usize) -> bool {
        let at = insertion_point(index, position, self.grid.cols());
        let inserted = self.grid.insert_columns(index, position, count);
        if inserted {
            self.selection.columns_inserted(at, count);
            self.record();
        }
        inserted
    }

    /// Delete rows; a selection that loses cells is cleared, one past the
    /// deleted band moves up with its cells.
    pub fn delete_rows(&mut self, index: usize, count: usize) -> usize {
        let removed = self.grid.delete_rows(index, count);
        if removed > 0 {
            self.selection.rows_deleted(index, removed);
            self.record();
        }
        removed
    }

    /// Delete columns; a selection that loses cells is cleared, one past the
    /// deleted band moves left with its cells.
    pub fn delete_columns(&mut self, index: usize, count: usize) -> usize {
        let removed = self.grid.delete_columns(index, count);
        if removed > 0 {
            self.selection.columns_deleted(index, removed);
            self.record();
        }
        removed
    }

    // ========== History ==========

    pub fn undo(&mut self) -> bool {
        self.end_stroke();
        let Some(snapshot) = self.history.undo().cloned() else {
            return false;
        };
        self.install(snapshot);
        true
    }

    pub fn redo(&mut self) -> bool {
        self.end_stroke();
        let Some(snapshot) = self.history.redo().cloned() else {
            return false;
        };
        self.install(snapshot);
        true
    }

    /// Install an undo/redo snapshot through the regular commit path, which
    /// swallows it.
    fn install(&mut self, snapshot: Grid) {
        self.grid = snapshot;
        self.selection.clamp_to(self.grid.rows(), self.grid.cols());
        self.record();
        self.mark_unsaved();
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // ========== Selection ==========

    pub fn selection_state(&self) -> &SelectionState {
        self.selection.state()
    }

    pub fn begin_selection(&mut self, row: usize, col: usize) {
        self.selection.begin(row.min(self.grid.rows() - 1), col.min(self.grid.cols() - 1));
    }

    pub fn extend_selection(&mut self, row: usize, col: usize) -> bool {
        self.selection.extend(row.min(self.grid.rows() - 1), col.min(self.grid.cols() - 1))
    }

    pub fn end_selection(&mut self) -> bool {
        self.selection.end()
    }

    pub fn select_all(&mut self) {
        self.selection.select_all(self.grid.rows(), self.grid.cols());
    }

    /// Drop a staged drag or duplicate, or with nothing staged the selection.
    pub fn cancel(&mut self) {
        self.selection.cancel();
    }

    pub fn copy(&mut self) -> bool {
        self.selection.copy(&self.grid)
    }

    pub fn paste(&mut self) -> bool {
        let pasted = self.selection.paste(&mut self.grid);
        if pasted {
            self.record();
        }
        pasted
    }

    pub fn start_drag(&mut self, row: usize, col: usize) -> bool {
        self.selection.start_drag(row, col)
    }

    pub fn move_drag(&mut self, row: usize, col: usize) -> bool {
        self.selection.move_drag(row, col)
    }

    pub fn commit_drag(&mut self) -> bool {
        let moved = self.selection.commit_drag(&mut self.grid);
        if moved {
            self.record();
        }
        moved
    }

    pub fn start_duplicate(&mut self) -> bool {
        self.selection.start_duplicate(&self.grid)
    }

    pub fn move_duplicate(&mut self, row: usize, col: usize) -> bool {
        self.selection.move_duplicate(row, col)
    }

    pub fn place_duplicate(&mut self, row: usize, col: usize) -> bool {
        let placed = self.selection.place_duplicate(row, col, &mut self.grid);
        if placed {
            self.record();
        }
        placed
    }

    /// Move `source` so its top-left lands at (`top`, `left`), as one entry.
    ///
    /// Returns the destination written, or `None` if nothing landed inside
    /// the grid. The source is still cleared in that case if it overlaps the grid.
    pub fn move_region(&mut self, source: Rect, top: isize, left: isize) -> Option<Rect> {
        source.clamp_to(self.grid.rows(), self.grid.cols())?;
        let destination = self.grid.move_region(source, top, left);
        self.record();
        destination
    }

    pub fn duplicate_region(&mut self, content: &Grid, top: isize, left: isize) -> Option<Rect> {
        let destination = self.grid.duplicate_region(content, top, left)?;
        self.record();
        Some(destination)
    }

    // ========== Palette ==========

    pub fn add_color(&mut self, key: CellValue, quantity: Quantity, name: Option<String>) -> bool {
        let added = self.palette.add_color(key, quantity, name);
        if added {
            self.mark_unsaved();
        }
        added
    }

    /// Rename a palette color and repaint every cell holding it, as one
    /// operation with one history entry.
    ///
    /// On error neither the palette nor the grid changes. Returns the number
    /// of cells repainted. Undo reverts the repainted cells only; the palette
    /// keeps the new key.
    pub fn edit_color(&mut self, old: &CellValue, new: HexColor) -> Result<usize, PaletteError> {
        self.palette.edit_color(old, new.clone())?;
        let new = CellValue::Color(new);
        if *old == new {
            return Ok(0);
        }
        let replaced = self.grid.replace_color(old, &new, None);
        self.record();
        Ok(replaced)
    }

    pub fn remove_colors(&mut self, keys: &[CellValue]) -> usize {
        let removed = self.palette.remove_colors(keys);
        if removed > 0 {
            self.mark_unsaved();
        }
        removed
    }

    pub fn set_active_color(&mut self, key: &CellValue) -> bool {
        self.palette.set_active(key)
    }

    pub fn set_quantity(&mut self, key: &CellValue, quantity: Quantity) -> bool {
        let set = self.palette.set_quantity(key, quantity);
        if set {
            self.mark_unsaved();
        }
        set
    }

    /// Replace the palette with imported entries.
    pub fn import_palette(&mut self, entries: Vec<PaletteEntry>) {
        self.palette = PaletteRegistry::from_entries(entries);
        log::info!("imported palette with {} entries", self.palette.len());
        self.mark_unsaved();
    }

    // ========== Image import ==========

    /// Start an import request.
    pub fn begin_import(&mut self) -> ImportTicket {
        self.imports.issue()
    }

    /// The decode plan for the next import, matching the grid or fitting the supply.
    pub fn import_plan(&self, fit_supply: bool) -> ImportPlan {
        let sizing = if fit_supply {
            ImportSizing::FitSupply {
                supply: self.palette.total_finite_supply(),
                fallback_rows: self.grid.rows(),
                fallback_columns: self.grid.cols(),
            }
        } else {
            ImportSizing::MatchGrid { rows: self.grid.rows(), columns: self.grid.cols() }
        };
        ImportPlan {
            sizing,
            alpha_threshold: self.options.alpha_threshold,
            supply_coverage: self.options.supply_coverage,
            min_dimension: self.options.min_dimension,
        }
    }

    /// Assign colors to `raster` and make it the grid, as one history entry.
    ///
    /// Returns `Ok(None)` without touching anything when `ticket` has been
    /// superseded by an import that was already applied.
    pub fn apply_import(
        &mut self,
        ticket: ImportTicket,
        raster: &Raster,
    ) -> Result<Option<AssignmentReport>, ImportError> {
        if !self.imports.accept(ticket) {
            return Ok(None);
        }
        let assignment = assign_colors(raster, &self.palette.supply(), self.options.max_rounds)?;
        self.grid = assignment.grid;
        self.selection.clamp_to(self.grid.rows(), self.grid.cols());
        self.record();
        Ok(Some(assignment.report))
    }

    pub fn apply_sampled(&mut self, sampled: &SampledImage) -> Result<Option<AssignmentReport>, ImportError> {
        self.apply_import(sampled.ticket, &sampled.raster)
    }

    // ========== Persistence ==========

    pub fn to_project(&self) -> Project {
        Project::new(self.grid.clone(), self.palette.clone())
    }

    /// Replace the document with a project parsed from JSON.
    ///
    /// A malformed project is rejected and the document is left unchanged.
    /// On success history restarts at the loaded grid and the document is
    /// considered saved.
    pub fn load_project(&mut self, json: &str) -> Result<(), ProjectError> {
        let project = Project::from_json(json).inspect_err(|e| log::warn!("rejected project load: {}", e))?;
        self.install_project(project);
        Ok(())
    }

    pub fn install_project(&mut self, project: Project) {
        self.grid = project.grid;
        self.palette = project.palette;
        self.history.reset(&self.grid);
        self.selection.clear();
        self.mark_saved();
    }

    pub fn mark_saved(&mut self) {
        self.unsaved.send_replace(None);
    }

    /// When the first edit since the last save happened, if any.
    pub fn unsaved_since(&self) -> Option<Instant> {
        *self.unsaved.borrow()
    }

    pub fn is_dirty(&self) -> bool {
        self.unsaved_since().is_some()
    }

    /// A receiver for the unsaved marker, for the save reminder.
    pub fn subscribe_unsaved(&self) -> watch::Receiver<Option<Instant>> {
        self.unsaved.subscribe()
    }
}
