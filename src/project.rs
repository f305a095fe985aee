//! Project file load and save.
//!
//! A project is a JSON [`ProjectFile`]. Loading validates the whole document
//! before anything is returned, so a rejected load never leaves partial state.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::grid::{Grid, GridError};
use crate::models::ProjectFile;
use crate::palette::PaletteRegistry;

/// Error loading or saving a project.
#[derive(Debug, Error)]
pub enum ProjectError {
    /// Not JSON, or a required field is missing or mistyped.
    #[error("invalid project file: {0}")]
    Parse(#[from] serde_json::Error),
    /// The declared dimensions are not at least 1×1.
    #[error("project dimensions must be at least 1x1, got {rows}x{columns}")]
    InvalidDimensions { rows: usize, columns: usize },
    /// `cells` does not match the declared `rows`/`columns`.
    #[error("cells are {found_rows}x{found_columns} but project declares {rows}x{columns}")]
    DimensionMismatch { rows: usize, columns: usize, found_rows: usize, found_columns: usize },
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error("failed to access '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// A validated project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub grid: Grid,
    pub palette: PaletteRegistry,
}

impl Project {
    pub fn new(grid: Grid, palette: PaletteRegistry) -> Self {
        Self { grid, palette }
    }

    /// Validate a deserialized project file.
    ///
    /// A palette without a `Clear` entry gets one prepended.
    pub fn from_file(file: ProjectFile) -> Result<Self, ProjectError> {
        let ProjectFile { rows, columns, cells, palette } = file;
        if rows == 0 || columns == 0 {
            return Err(ProjectError::InvalidDimensions { rows, columns });
        }
        let found_columns = cells.first().map(Vec::len).unwrap_or(0);
        if cells.len() != rows || found_columns != columns {
            return Err(ProjectError::DimensionMismatch { rows, columns, found_rows: cells.len(), found_columns });
        }
        let grid = Grid::from_cells(cells)?;
        Ok(Self { grid, palette: PaletteRegistry::from_entries(palette) })
    }

    pub fn to_file(&self) -> ProjectFile {
        ProjectFile {
            rows: self.grid.rows(),
            columns: self.grid.cols(),
            cells: self.grid.cells().to_vec(),
            palette: self.palette.entries().to_vec(),
        }
    }

    /// Parse and validate project JSON.
    pub fn from_json(text: &str) -> Result<Self, ProjectError> {
        let file: ProjectFile = serde_json::from_str(text)?;
        Self::from_file(file)
    }

    pub fn to_json(&self) -> Result<String, ProjectError> {
        Ok(serde_json::to_string_pretty(&self.to_file())?)
    }
}

/// Read and validate a project from disk.
pub fn read_project(path: &Path) -> Result<Project, ProjectError> {
    let text = fs::read_to_string(path).map_err(|source| ProjectError::Io { path: path.display().to_string(), source })?;
    Project::from_json(&text)
}

/// Write a project to disk as pretty-printed JSON.
pub fn write_project(path: &Path, project: &Project) -> Result<(), ProjectError> {
    let json = project.to_json()?;
    fs::write(path, json + "\n").map_err(|source| ProjectError::Io { path: path.display().to_string(), source })
}
