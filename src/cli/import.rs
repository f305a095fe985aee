//! `mosaic import` command implementation

use std::path::Path;
use std::process::ExitCode;

use crate::config::MosaicConfig;
use crate::document::Document;
use crate::import::{parse_raster, AssignmentReport, ImportError, ImportScheduler};

use super::{open_document, save_document, warn_unknown_cells, EXIT_ERROR, EXIT_SUCCESS};

/// Execute the import command
pub fn run_import(
    input: &Path,
    project: &Path,
    output: Option<&Path>,
    fit_supply: bool,
    raster: bool,
    config: &MosaicConfig,
) -> ExitCode {
    let mut document = match open_document(project, config) {
        Ok(document) => document,
        Err(code) => return code,
    };

    let bytes = match std::fs::read(input) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error: Failed to read '{}': {}", input.display(), e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let result = if raster {
        import_raster(&mut document, &bytes)
    } else {
        import_image(&mut document, bytes, fit_supply)
    };

    let report = match result {
        Ok(Some(report)) => report,
        Ok(None) => {
            eprintln!("Error: import was superseded before it could be applied");
            return ExitCode::from(EXIT_ERROR);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    warn_unknown_cells(&document);
    if report.oversubscribed > 0 {
        eprintln!(
            "Warning: {} cell{} exceed palette supply",
            report.oversubscribed,
            if report.oversubscribed == 1 { "" } else { "s" }
        );
    }

    let target = output.unwrap_or(project);
    if let Err(code) = save_document(&mut document, target) {
        return code;
    }
    print_report(&document, target, &report);
    ExitCode::from(EXIT_SUCCESS)
}

/// Assign colors to a text raster directly.
fn import_raster(document: &mut Document, bytes: &[u8]) -> Result<Option<AssignmentReport>, String> {
    let text = String::from_utf8_lossy(bytes);
    let raster = parse_raster(&text).map_err(|e| format!("invalid raster: {}", e))?;
    let ticket = document.begin_import();
    document.apply_import(ticket, &raster).map_err(|e| e.to_string())
}

/// Decode and sample on the blocking pool, then assign on this thread.
fn import_image(
    document: &mut Document,
    bytes: Vec<u8>,
    fit_supply: bool,
) -> Result<Option<AssignmentReport>, String> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to start runtime: {}", e))?;

    let ticket = document.begin_import();
    let plan = document.import_plan(fit_supply);
    let sampled = runtime
        .block_on(ImportScheduler::decode_and_sample(ticket, bytes, plan))
        .map_err(|e: ImportError| e.to_string())?;
    log::info!(
        "decoded {}x{} image into {}x{} cells",
        sampled.source_width,
        sampled.source_height,
        sampled.rows,
        sampled.columns
    );
    document.apply_sampled(&sampled).map_err(|e| e.to_string())
}

fn print_report(document: &Document, target: &Path, report: &AssignmentReport) {
    println!(
        "Imported: {} ({}x{}, {} round{})",
        target.display(),
        document.grid().rows(),
        document.grid().cols(),
        report.rounds,
        if report.rounds == 1 { "" } else { "s" }
    );
    for (color, count) in &report.assigned_per_color {
        println!("  {} {}", color, count);
    }
    if report.cleared > 0 {
        println!("  clear {}", report.cleared);
    }
}
