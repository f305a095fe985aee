//! `mosaic palette` command implementations (import, export)

use clap::Subcommand;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::config::MosaicConfig;
use crate::palette_parser::{parse_palette, to_delimited, ParseMode};

use super::{open_document, save_document, warn_unknown_cells, EXIT_ERROR, EXIT_SUCCESS};

#[derive(Subcommand)]
pub enum PaletteAction {
    /// Replace a project's palette with one read from a file
    Import {
        /// Project file
        project: PathBuf,

        /// Palette file (JSON or name,quantity,hex lines)
        file: PathBuf,

        /// Fail on the first malformed entry instead of skipping it
        #[arg(long)]
        strict: bool,

        /// Output file (default: overwrite the project)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Write a project's palette as name,quantity,hex lines
    Export {
        /// Project file
        project: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Execute a palette subcommand
pub fn run_palette(action: PaletteAction, config: &MosaicConfig) -> ExitCode {
    match action {
        PaletteAction::Import { project, file, strict, output } => {
            run_palette_import(&project, &file, strict, output.as_deref(), config)
        }
        PaletteAction::Export { project, output } => run_palette_export(&project, output.as_deref(), config),
    }
}

fn run_palette_import(
    project: &Path,
    file: &Path,
    strict: bool,
    output: Option<&Path>,
    config: &MosaicConfig,
) -> ExitCode {
    let mut document = match open_document(project, config) {
        Ok(document) => document,
        Err(code) => return code,
    };

    let text = match std::fs::read_to_string(file) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Error: Failed to read '{}': {}", file.display(), e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let mode = if strict { ParseMode::Strict } else { ParseMode::Lenient };
    let parsed = match parse_palette(&text, mode) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("Error: {}: {}", file.display(), e);
            return ExitCode::from(EXIT_ERROR);
        }
    };
    for warning in &parsed.warnings {
        eprintln!("Warning: {}: {}", file.display(), warning);
    }

    document.import_palette(parsed.entries);
    warn_unknown_cells(&document);

    let target = output.unwrap_or(project);
    if let Err(code) = save_document(&mut document, target) {
        return code;
    }
    println!("Imported {} palette entries into {}", document.palette().len(), target.display());
    ExitCode::from(EXIT_SUCCESS)
}

fn run_palette_export(project: &Path, output: Option<&Path>, config: &MosaicConfig) -> ExitCode {
    let document = match open_document(project, config) {
        Ok(document) => document,
        Err(code) => return code,
    };

    let text = to_delimited(document.palette().entries());
    match output {
        None => {
            print!("{}", text);
            ExitCode::from(EXIT_SUCCESS)
        }
        Some(path) => match std::fs::write(path, &text) {
            Ok(()) => {
                eprintln!("Wrote: {}", path.display());
                ExitCode::from(EXIT_SUCCESS)
            }
            Err(e) => {
                eprintln!("Error: Failed to write '{}': {}", path.display(), e);
                ExitCode::from(EXIT_ERROR)
            }
        },
    }
}
