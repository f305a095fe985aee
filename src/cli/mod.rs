//! Command-line interface implementation
//!
//! This module provides the CLI entry point and dispatches to submodules
//! for specific command implementations.

mod edit;
mod import;
mod info;
mod new;
mod palette;

use clap::{Parser, Subcommand};
use flexi_logger::{Logger, LoggerHandle};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::config::{load_config, merge_cli_overrides, CliOverrides, MosaicConfig};
use crate::document::Document;
use crate::grid::MirrorMode;
use crate::project::{read_project, write_project};

pub use palette::PaletteAction;

/// Exit codes
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;
pub(crate) const EXIT_INVALID_ARGS: u8 = 2;

/// Mosaic planner - tile grids with palette supply limits
#[derive(Parser)]
#[command(name = "mosaic")]
#[command(about = "Mosaic planner - paint tile grids, track tile supply, and import images under supply limits")]
#[command(version)]
pub struct Cli {
    /// Configuration file (default: discover mosaic.toml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log level (off, error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new all-clear project
    New {
        /// Project file to create
        output: PathBuf,

        /// Number of rows (default: [grid] rows)
        #[arg(long)]
        rows: Option<usize>,

        /// Number of columns (default: [grid] columns)
        #[arg(long)]
        columns: Option<usize>,

        /// Palette file to import (JSON or delimited text)
        #[arg(long, value_name = "FILE")]
        palette: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Modify a project's grid with coordinate-based operations.
    ///
    /// Operations run in a fixed order: resize, insertions, deletions, fills,
    /// paints, replacements, moves. Coordinates are zero-based ROW,COLUMN.
    Edit {
        /// Project file to modify
        project: PathBuf,

        /// Paint a cell (mirrored per --mirror): R,C=VALUE
        #[arg(long, value_name = "R,C=VALUE")]
        paint: Vec<String>,

        /// Fill a row: R=VALUE
        #[arg(long, value_name = "R=VALUE")]
        fill_row: Vec<String>,

        /// Fill a column: C=VALUE
        #[arg(long, value_name = "C=VALUE")]
        fill_column: Vec<String>,

        /// Fill a rectangle: R,C,H,W=VALUE
        #[arg(long, value_name = "R,C,H,W=VALUE")]
        fill_rect: Vec<String>,

        /// Replace every cell holding one value with another: FROM=TO
        #[arg(long, value_name = "FROM=TO")]
        replace: Vec<String>,

        /// Resize the grid, keeping the top-left overlap: ROWSxCOLUMNS
        #[arg(long, value_name = "ROWSxCOLUMNS")]
        resize: Option<String>,

        /// Insert clear rows: I,above|below,N
        #[arg(long, value_name = "I,POSITION,N")]
        insert_rows: Vec<String>,

        /// Insert clear columns: I,left|right,N
        #[arg(long, value_name = "I,POSITION,N")]
        insert_columns: Vec<String>,

        /// Delete rows (at least one row always remains): I,N
        #[arg(long, value_name = "I,N")]
        delete_rows: Vec<String>,

        /// Delete columns (at least one column always remains): I,N
        #[arg(long, value_name = "I,N")]
        delete_columns: Vec<String>,

        /// Move a region, clearing the source: R,C,H,W>R2,C2
        #[arg(long = "move", value_name = "R,C,H,W>R2,C2")]
        moves: Vec<String>,

        /// Mirror mode applied to --paint
        #[arg(long, value_enum, default_value = "none")]
        mirror: MirrorMode,

        /// Output file (default: overwrite input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Show what would change without writing
        #[arg(long)]
        dry_run: bool,
    },

    /// Import an image into a project, rationing colors by supply
    Import {
        /// Image file (PNG, JPEG, GIF, ...) or, with --raster, a text raster
        input: PathBuf,

        /// Project whose palette is used and whose grid is replaced
        #[arg(short, long)]
        project: PathBuf,

        /// Output file (default: overwrite the project)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Size the grid from the image aspect ratio and the palette's finite supply
        #[arg(long)]
        fit_supply: bool,

        /// Treat the input as whitespace-separated hex colors, one row per line
        #[arg(long)]
        raster: bool,

        /// Rationing round cap (default: [import] max_rounds)
        #[arg(long)]
        max_rounds: Option<usize>,

        /// Alpha below this becomes clear (default: [import] alpha_threshold)
        #[arg(long)]
        alpha_threshold: Option<u8>,
    },

    /// Import or export a project's palette
    Palette {
        #[command(subcommand)]
        action: PaletteAction,
    },

    /// Show grid dimensions and per-color usage against supply
    Info {
        /// Project file
        project: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    fn overrides(&self) -> CliOverrides {
        let mut overrides = CliOverrides { log_level: self.log_level.clone(), ..Default::default() };
        match &self.command {
            Commands::New { rows, columns, .. } => {
                overrides.rows = *rows;
                overrides.columns = *columns;
            }
            Commands::Import { max_rounds, alpha_threshold, .. } => {
                overrides.max_rounds = *max_rounds;
                overrides.alpha_threshold = *alpha_threshold;
            }
            _ => {}
        }
        overrides
    }
}

/// Load configuration and apply command-line overrides.
fn resolve_config(cli: &Cli) -> Result<MosaicConfig, ExitCode> {
    let mut config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Err(ExitCode::from(EXIT_ERROR));
        }
    };

    merge_cli_overrides(&mut config, &cli.overrides());
    let errors = config.validate();
    if !errors.is_empty() {
        for error in errors {
            eprintln!("Error: {}", error);
        }
        return Err(ExitCode::from(EXIT_INVALID_ARGS));
    }
    Ok(config)
}

/// Install the stderr logger. `RUST_LOG` wins over the configured level.
fn init_logging(level: &str) -> Option<LoggerHandle> {
    match Logger::try_with_env_or_str(level).and_then(|logger| logger.log_to_stderr().start()) {
        Ok(handle) => Some(handle),
        Err(e) => {
            eprintln!("Warning: logging disabled: {}", e);
            None
        }
    }
}

/// Open a project file as a document configured from `config`.
pub(crate) fn open_document(path: &Path, config: &MosaicConfig) -> Result<Document, ExitCode> {
    match read_project(path) {
        Ok(project) => Ok(Document::from_project(project, config.document_options())),
        Err(e) => {
            eprintln!("Error: {}", e);
            Err(ExitCode::from(EXIT_ERROR))
        }
    }
}

/// Write a document's project to `path` and report it.
pub(crate) fn save_document(document: &mut Document, path: &Path) -> Result<(), ExitCode> {
    match write_project(path, &document.to_project()) {
        Ok(()) => {
            document.mark_saved();
            eprintln!("Wrote: {}", path.display());
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            Err(ExitCode::from(EXIT_ERROR))
        }
    }
}

/// Warn about grid cells whose value is not in the palette.
pub(crate) fn warn_unknown_cells(document: &Document) {
    for value in document.palette().unknown_cells(document.grid()) {
        eprintln!("Warning: '{}' is painted but not in the palette", value);
    }
}

/// Run the CLI application
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let config = match resolve_config(&cli) {
        Ok(config) => config,
        Err(code) => return code,
    };
    let _logger = init_logging(&config.logging.level);

    match cli.command {
        Commands::New { output, palette, force, .. } => {
            new::run_new(&output, palette.as_deref(), force, &config)
        }
        Commands::Edit {
            project,
            paint,
            fill_row,
            fill_column,
            fill_rect,
            replace,
            resize,
            insert_rows,
            insert_columns,
            delete_rows,
            delete_columns,
            moves,
            mirror,
            output,
            dry_run,
        } => {
            let args = edit::EditArgs {
                paint,
                fill_row,
                fill_column,
                fill_rect,
                replace,
                resize,
                insert_rows,
                insert_columns,
                delete_rows,
                delete_columns,
                moves,
            };
            edit::run_edit(&project, &args, mirror, output.as_deref(), dry_run, &config)
        }
        Commands::Import { input, project, output, fit_supply, raster, .. } => {
            import::run_import(&input, &project, output.as_deref(), fit_supply, raster, &config)
        }
        Commands::Palette { action } => palette::run_palette(action, &config),
        Commands::Info { project, json } => info::run_info(&project, json, &config),
    }
}
