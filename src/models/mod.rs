//! Data models for mosaic projects (cells, palette entries, project files)

mod cell;
mod palette;
mod project;

// Re-export all public types
pub use cell::{CellValue, HexColor, CLEAR_MARKER, RESERVED_MARKER};
pub use palette::{PaletteEntry, Quantity, UNLIMITED_MARKER};
pub use project::ProjectFile;
