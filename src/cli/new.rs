//! `mosaic new` command implementation

use std::path::Path;
use std::process::ExitCode;

use crate::config::MosaicConfig;
use crate::document::Document;
use crate::palette_parser::{parse_palette, ParseMode};

use super::{save_document, EXIT_ERROR, EXIT_SUCCESS};

/// Execute the new command
pub fn run_new(output: &Path, palette: Option<&Path>, force: bool, config: &MosaicConfig) -> ExitCode {
    if output.exists() && !force {
        eprintln!("Error: '{}' already exists (use --force to overwrite)", output.display());
        return ExitCode::from(EXIT_ERROR);
    }

    let mut document = Document::with_options(config.grid.rows, config.grid.columns, config.document_options());

    if let Some(path) = palette {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                eprintln!("Error: Failed to read '{}': {}", path.display(), e);
                return ExitCode::from(EXIT_ERROR);
            }
        };
        match parse_palette(&text, ParseMode::Lenient) {
            Ok(parsed) => {
                for warning in &parsed.warnings {
                    eprintln!("Warning: {}: {}", path.display(), warning);
                }
                document.import_palette(parsed.entries);
            }
            Err(e) => {
                eprintln!("Error: {}: {}", path.display(), e);
                return ExitCode::from(EXIT_ERROR);
            }
        }
    }

    if let Err(code) = save_document(&mut document, output) {
        return code;
    }
    println!(
        "Created: {} ({}x{}, {} palette entries)",
        output.display(),
        document.grid().rows(),
        document.grid().cols(),
        document.palette().len()
    );
    ExitCode::from(EXIT_SUCCESS)
}
