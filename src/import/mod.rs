//! Image import: decode a raster, size it to a grid, and sample it to cells.
//!
//! The pipeline is:
//! 1. [`decode`] the source bytes
//! 2. choose target dimensions with [`ImportPlan::dimensions`]
//! 3. [`sample`] the image down to exactly that many cells
//! 4. hand the [`Raster`] to [`assignment::assign_colors`]
//!
//! Steps 1 to 3 are I/O-bound and run off the event loop via
//! [`scheduler::ImportScheduler::decode_and_sample`].

pub mod assignment;
pub mod scheduler;

use image::imageops::FilterType;
use image::DynamicImage;
use thiserror::Error;

use crate::color::Rgb;
use crate::grid::GridError;

pub use assignment::{assign_colors, Assignment, AssignmentReport};
pub use scheduler::{ImportScheduler, ImportTicket, SampledImage};

/// Alpha below this becomes `Clear`.
pub const DEFAULT_ALPHA_THRESHOLD: u8 = 128;
/// Fraction of finite supply a fitted import aims to use.
pub const DEFAULT_SUPPLY_COVERAGE: f64 = 0.85;
/// Smallest row or column count a fitted import produces.
pub const DEFAULT_MIN_DIMENSION: usize = 10;

/// Sampled target colors, one per cell. `None` marks a transparent cell.
pub type Raster = Vec<Vec<Option<Rgb>>>;

/// Error during image import.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("image has no pixels")]
    EmptyImage,
    #[error("raster must be non-empty and rectangular: {0}")]
    Raster(#[from] GridError),
    #[error("import task failed: {0}")]
    Task(String),
}

/// How the target grid size is chosen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ImportSizing {
    /// Use the current grid's dimensions.
    MatchGrid { rows: usize, columns: usize },
    /// Size from the image aspect ratio and the palette's finite supply.
    ///
    /// Without a finite supply the fallback dimensions are used.
    FitSupply { supply: Option<u64>, fallback_rows: usize, fallback_columns: usize },
}

/// Everything the decode step needs to produce a raster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImportPlan {
    pub sizing: ImportSizing,
    pub alpha_threshold: u8,
    pub supply_coverage: f64,
    pub min_dimension: usize,
}

impl ImportPlan {
    pub fn new(sizing: ImportSizing) -> Self {
        Self {
            sizing,
            alpha_threshold: DEFAULT_ALPHA_THRESHOLD,
            supply_coverage: DEFAULT_SUPPLY_COVERAGE,
            min_dimension: DEFAULT_MIN_DIMENSION,
        }
    }

    /// Target (rows, columns) for an image of `width`×`height` pixels.
    pub fn dimensions(&self, width: u32, height: u32) -> (usize, usize) {
        match self.sizing {
            ImportSizing::MatchGrid { rows, columns } => (rows.max(1), columns.max(1)),
            ImportSizing::FitSupply { supply: Some(supply), .. } => {
                fit_dimensions(width, height, supply, self.supply_coverage, self.min_dimension)
            }
            ImportSizing::FitSupply { supply: None, fallback_rows, fallback_columns } => {
                (fallback_rows.max(1), fallback_columns.max(1))
            }
        }
    }
}

impl Default for ImportPlan {
    fn default() -> Self {
        Self::new(ImportSizing::MatchGrid { rows: 32, columns: 32 })
    }
}

/// Choose rows and columns that keep the image's aspect ratio and use about
/// `coverage × supply` cells, each dimension at least `min_dimension`.
pub fn fit_dimensions(width: u32, height: u32, supply: u64, coverage: f64, min_dimension: usize) -> (usize, usize) {
    let min_dimension = min_dimension.max(1);
    if width == 0 || height == 0 {
        return (min_dimension, min_dimension);
    }

    let aspect = width as f64 / height as f64;
    let target = (supply as f64 * coverage).floor().max(1.0);
    let rows = (target / aspect).sqrt().floor().max(1.0);
    let columns = (rows * aspect).round().min((target / rows).floor()).max(1.0);

    let rows = (rows as usize).max(min_dimension);
    let columns = (columns as usize).max(min_dimension);
    log::info!(
        "fitted import to {}x{} for {}x{} image and supply {}",
        rows, columns, width, height, supply
    );
    (rows, columns)
}

/// Decode image bytes in any format the `image` crate recognizes.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, ImportError> {
    let image = image::load_from_memory(bytes)?;
    if image.width() == 0 || image.height() == 0 {
        return Err(ImportError::EmptyImage);
    }
    Ok(image)
}

/// Resample `image` to exactly `rows`×`columns` and read one color per cell.
///
/// Pixels whose alpha is below `alpha_threshold` become `None`.
pub fn sample(image: &DynamicImage, rows: usize, columns: usize, alpha_threshold: u8) -> Raster {
    let resized = image.resize_exact(columns.max(1) as u32, rows.max(1) as u32, FilterType::Triangle).to_rgba8();
    resized
        .rows()
        .map(|line| {
            line.map(|pixel| {
                let [r, g, b, a] = pixel.0;
                (a >= alpha_threshold).then(|| Rgb::new(r, g, b))
            })
            .collect()
        })
        .collect()
}

/// Parse a raster from text, one row per line, cells separated by
/// whitespace: a hex color, or `clear`/`-` for a transparent cell.
///
/// Used to feed the assignment engine without an image file.
pub fn parse_raster(text: &str) -> Result<Raster, crate::color::ColorError> {
    text.lines()
        .filter(|l| !l.trim().is_empty())
        .map(|line| {
            line.split_whitespace()
                .map(|token| {
                    if token == "-" || token.eq_ignore_ascii_case("clear") {
                        Ok(None)
                    } else {
                        Rgb::from_hex(token).map(Some)
                    }
                })
                .collect::<Result<Vec<_>, _>>()
        })
        .collect()
}
