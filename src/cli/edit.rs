//! CLI dispatch for the `mosaic edit` command.
//!
//! Parses coordinate-based operation arguments and applies them to a
//! project's document.

use std::path::Path;
use std::process::ExitCode;

use clap::ValueEnum;

use crate::config::MosaicConfig;
use crate::document::Document;
use crate::grid::{InsertPosition, MirrorMode, Rect};
use crate::models::CellValue;

use super::{open_document, save_document, warn_unknown_cells, EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};

/// Raw operation arguments as collected by clap.
#[derive(Debug, Default)]
pub struct EditArgs {
    pub paint: Vec<String>,
    pub fill_row: Vec<String>,
    pub fill_column: Vec<String>,
    pub fill_rect: Vec<String>,
    pub replace: Vec<String>,
    pub resize: Option<String>,
    pub insert_rows: Vec<String>,
    pub insert_columns: Vec<String>,
    pub delete_rows: Vec<String>,
    pub delete_columns: Vec<String>,
    pub moves: Vec<String>,
}

/// One parsed edit operation.
#[derive(Debug, Clone, PartialEq)]
pub enum EditOp {
    Paint { row: usize, col: usize, value: CellValue },
    FillRow { row: usize, value: CellValue },
    FillColumn { col: usize, value: CellValue },
    FillRect { rect: Rect, value: CellValue },
    Replace { from: CellValue, to: CellValue },
    Resize { rows: usize, columns: usize },
    InsertRows { index: usize, position: InsertPosition, count: usize },
    InsertColumns { index: usize, position: InsertPosition, count: usize },
    DeleteRows { index: usize, count: usize },
    DeleteColumns { index: usize, count: usize },
    Move { source: Rect, top: isize, left: isize },
}

impl EditOp {
    /// Apply to `document`. Returns whether the grid changed.
    pub fn apply(&self, document: &mut Document) -> bool {
        match self {
            EditOp::Paint { row, col, value } => document.paint_with(*row, *col, value),
            EditOp::FillRow { row, value } => document.fill_row(*row, value),
            EditOp::FillColumn { col, value } => document.fill_column(*col, value),
            EditOp::FillRect { rect, value } => document.fill_region(*rect, value),
            EditOp::Replace { from, to } => document.replace_color(from, to, None) > 0,
            EditOp::Resize { rows, columns } => document.resize(*rows, *columns),
            EditOp::InsertRows { index, position, count } => document.insert_rows(*index, *position, *count),
            EditOp::InsertColumns { index, position, count } => {
                document.insert_columns(*index, *position, *count)
            }
            EditOp::DeleteRows { index, count } => document.delete_rows(*index, *count) > 0,
            EditOp::DeleteColumns { index, count } => document.delete_columns(*index, *count) > 0,
            EditOp::Move { source, top, left } => document.move_region(*source, *top, *left).is_some(),
        }
    }
}

/// Parse every operation in application order.
pub fn parse_ops(args: &EditArgs) -> Result<Vec<EditOp>, String> {
    let mut ops = Vec::new();

    if let Some(resize) = &args.resize {
        ops.push(parse_resize(resize)?);
    }
    for arg in &args.insert_rows {
        let (index, position, count) = parse_insert(arg)?;
        ops.push(EditOp::InsertRows { index, position, count });
    }
    for arg in &args.insert_columns {
        let (index, position, count) = parse_insert(arg)?;
        ops.push(EditOp::InsertColumns { index, position, count });
    }
    for arg in &args.delete_rows {
        let [index, count] = parse_numbers::<2>(arg)?;
        ops.push(EditOp::DeleteRows { index, count });
    }
    for arg in &args.delete_columns {
        let [index, count] = parse_numbers::<2>(arg)?;
        ops.push(EditOp::DeleteColumns { index, count });
    }
    for arg in &args.fill_row {
        let (coords, value) = split_assignment(arg)?;
        let [row] = parse_numbers::<1>(coords)?;
        ops.push(EditOp::FillRow { row, value });
    }
    for arg in &args.fill_column {
        let (coords, value) = split_assignment(arg)?;
        let [col] = parse_numbers::<1>(coords)?;
        ops.push(EditOp::FillColumn { col, value });
    }
    for arg in &args.fill_rect {
        let (coords, value) = split_assignment(arg)?;
        let rect = parse_rect(coords)?;
        ops.push(EditOp::FillRect { rect, value });
    }
    for arg in &args.paint {
        let (coords, value) = split_assignment(arg)?;
        let [row, col] = parse_numbers::<2>(coords)?;
        ops.push(EditOp::Paint { row, col, value });
    }
    for arg in &args.replace {
        let (from, to) = arg.split_once('=').ok_or_else(|| format!("expected FROM=TO, got '{}'", arg))?;
        ops.push(EditOp::Replace { from: parse_value(from)?, to: parse_value(to)? });
    }
    for arg in &args.moves {
        ops.push(parse_move(arg)?);
    }

    Ok(ops)
}

/// Split `COORDS=VALUE` at the last `=`.
fn split_assignment(arg: &str) -> Result<(&str, CellValue), String> {
    let (coords, value) = arg.rsplit_once('=').ok_or_else(|| format!("expected COORDS=VALUE, got '{}'", arg))?;
    Ok((coords, parse_value(value)?))
}

fn parse_value(s: &str) -> Result<CellValue, String> {
    if s.trim().is_empty() {
        return Err("missing cell value (use a hex color, 'clear' or 'reserved')".to_string());
    }
    s.parse().map_err(|e| format!("invalid cell value '{}': {}", s, e))
}

/// Parse exactly `N` comma-separated non-negative integers.
fn parse_numbers<const N: usize>(s: &str) -> Result<[usize; N], String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != N {
        return Err(format!("expected {} comma-separated numbers, got '{}'", N, s));
    }
    let mut numbers = [0; N];
    for (slot, part) in numbers.iter_mut().zip(parts) {
        *slot = part.parse().map_err(|_| format!("invalid number '{}' in '{}'", part, s))?;
    }
    Ok(numbers)
}

fn parse_rect(s: &str) -> Result<Rect, String> {
    let [row, col, height, width] = parse_numbers::<4>(s)?;
    if height == 0 || width == 0 {
        return Err(format!("rectangle '{}' must have a positive height and width", s));
    }
    Ok(Rect::from_origin(row, col, height, width))
}

fn parse_resize(s: &str) -> Result<EditOp, String> {
    let (rows, columns) = s
        .split_once(|c| c == 'x' || c == 'X')
        .ok_or_else(|| format!("expected ROWSxCOLUMNS, got '{}'", s))?;
    let rows = rows.trim().parse().map_err(|_| format!("invalid row count in '{}'", s))?;
    let columns = columns.trim().parse().map_err(|_| format!("invalid column count in '{}'", s))?;
    Ok(EditOp::Resize { rows, columns })
}

fn parse_insert(s: &str) -> Result<(usize, InsertPosition, usize), String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    let [index, position, count] = parts.as_slice() else {
        return Err(format!("expected INDEX,POSITION,COUNT, got '{}'", s));
    };
    let index = index.parse().map_err(|_| format!("invalid index in '{}'", s))?;
    let position = InsertPosition::from_str(position, true)
        .map_err(|_| format!("invalid position '{}' (use above, below, left or right)", position))?;
    let count = count.parse().map_err(|_| format!("invalid count in '{}'", s))?;
    Ok((index, position, count))
}

fn parse_move(s: &str) -> Result<EditOp, String> {
    let (source, dest) = s.split_once('>').ok_or_else(|| format!("expected R,C,H,W>R2,C2, got '{}'", s))?;
    let source = parse_rect(source)?;
    let [top, left] = parse_numbers::<2>(dest)?;
    Ok(EditOp::Move { source, top: top as isize, left: left as isize })
}

/// Execute the edit command.
pub fn run_edit(
    input: &Path,
    args: &EditArgs,
    mirror: MirrorMode,
    output: Option<&Path>,
    dry_run: bool,
    config: &MosaicConfig,
) -> ExitCode {
    let ops = match parse_ops(args) {
        Ok(ops) if ops.is_empty() => {
            eprintln!("Error: no edit operations given");
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
        Ok(ops) => ops,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };

    let mut document = match open_document(input, config) {
        Ok(document) => document,
        Err(code) => return code,
    };
    let original = document.to_project();
    document.set_mirror_mode(mirror);

    let mut changed = 0;
    for op in &ops {
        if op.apply(&mut document) {
            changed += 1;
        } else {
            log::info!("operation had no effect: {:?}", op);
        }
    }
    warn_unknown_cells(&document);

    if dry_run {
        let (before, after) = match (original.to_json(), document.to_project().to_json()) {
            (Ok(before), Ok(after)) => (before, after),
            (Err(e), _) | (_, Err(e)) => {
                eprintln!("Error: {}", e);
                return ExitCode::from(EXIT_ERROR);
            }
        };
        if before == after {
            println!("No changes.");
        } else {
            let target = output.unwrap_or(input);
            println!("--- {}", input.display());
            println!("+++ {} (after edit)", target.display());
            print_simple_diff(&before, &after);
        }
        return ExitCode::from(EXIT_SUCCESS);
    }

    eprintln!("Applied {} of {} operations", changed, ops.len());
    match save_document(&mut document, output.unwrap_or(input)) {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(code) => code,
    }
}

/// Print a simple line-by-line diff between two strings.
fn print_simple_diff(original: &str, modified: &str) {
    let orig_lines: Vec<&str> = original.lines().collect();
    let mod_lines: Vec<&str> = modified.lines().collect();

    for i in 0..orig_lines.len().max(mod_lines.len()) {
        let orig = orig_lines.get(i).copied().unwrap_or("");
        let modi = mod_lines.get(i).copied().unwrap_or("");
        if orig != modi {
            if !orig.is_empty() {
                println!("-{}", orig);
            }
            if !modi.is_empty() {
                println!("+{}", modi);
            }
        }
    }
}
