//! `mosaic info` command implementation

use serde_json::json;
use std::path::Path;
use std::process::ExitCode;

use crate::config::MosaicConfig;
use crate::document::Document;
use crate::models::Quantity;

use super::{open_document, EXIT_SUCCESS};

/// Execute the info command
pub fn run_info(project: &Path, json: bool, config: &MosaicConfig) -> ExitCode {
    let document = match open_document(project, config) {
        Ok(document) => document,
        Err(code) => return code,
    };

    if json {
        print_info_json(&document);
    } else {
        print_info_text(&document);
    }
    ExitCode::from(EXIT_SUCCESS)
}

fn print_info_text(document: &Document) {
    let grid = document.grid();
    let palette = document.palette();
    println!("Grid: {}x{} ({} cells)", grid.rows(), grid.cols(), grid.rows() * grid.cols());
    println!("Palette: {} entries", palette.len());

    for usage in palette.usage(grid) {
        let name = usage.name.as_deref().unwrap_or("");
        let supply = match usage.quantity {
            Quantity::Limited(limit) if !usage.key.is_special() => format!(" / {}", limit),
            _ => String::new(),
        };
        let short = if usage.shortfall > 0 { format!("  (short {})", usage.shortfall) } else { String::new() };
        println!("  {:<9} {:<16} {}{}{}", usage.key.to_string(), name, usage.used, supply, short);
    }

    for value in palette.unknown_cells(grid) {
        println!("  {:<9} {:<16} {} (not in palette)", value.to_string(), "", grid.count(&value));
    }

    match palette.total_finite_supply() {
        Some(total) => println!("Supply: {} tiles", total),
        None => println!("Supply: unlimited"),
    }
}

fn print_info_json(document: &Document) {
    let grid = document.grid();
    let palette = document.palette();
    let usage: Vec<_> = palette
        .usage(grid)
        .into_iter()
        .map(|u| {
            json!({
                "key": u.key,
                "name": u.name,
                "used": u.used,
                "quantity": u.quantity,
                "shortfall": u.shortfall,
            })
        })
        .collect();
    let unknown: Vec<_> = palette
        .unknown_cells(grid)
        .into_iter()
        .map(|value| json!({ "key": value, "used": grid.count(&value) }))
        .collect();

    let output = json!({
        "rows": grid.rows(),
        "columns": grid.cols(),
        "palette": usage,
        "unknown": unknown,
        "total_supply": palette.total_finite_supply(),
    });
    match serde_json::to_string_pretty(&output) {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("Error: {}", e),
    }
}
