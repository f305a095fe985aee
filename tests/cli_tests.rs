//! CLI integration tests for the `mosaic` binary.
//!
//! Each test works in its own temp directory with config discovery pointed
//! at it, so a developer's `mosaic.toml` never leaks in.

use std::path::{Path, PathBuf};
use std::process::Command;

use mosaicplan::models::{CellValue, Quantity};
use mosaicplan::project::read_project;

/// Run mosaic in `dir` and return (stdout, stderr, exit code).
fn run_in(dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_mosaic"))
        .args(args)
        .current_dir(dir)
        .env("XDG_CONFIG_HOME", dir.join("xdg"))
        .env("HOME", dir)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute mosaic");
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.code().unwrap_or(-1))
}

fn color(hex: &str) -> CellValue {
    CellValue::color(hex).unwrap()
}

/// A 2x2 project with a red and a blue tile of supply 1 each.
fn create_rationed_project(dir: &tempfile::TempDir) -> PathBuf {
    let path = dir.path().join("rationed.json");
    let content = r##"{
  "rows": 2,
  "columns": 2,
  "cells": [["clear", "clear"], ["clear", "clear"]],
  "palette": [
    {"hex": "clear", "quantity": "unlimited"},
    {"hex": "#ff0000", "quantity": 1, "name": "Red"},
    {"hex": "#0000ff", "quantity": 1, "name": "Blue"}
  ]
}"##;
    std::fs::write(&path, content).unwrap();
    path
}

/// A 3x4 all-clear project with an unlimited green tile.
fn create_plain_project(dir: &tempfile::TempDir) -> PathBuf {
    let path = dir.path().join("plain.json");
    let content = r##"{
  "rows": 3,
  "columns": 4,
  "cells": [
    ["clear", "clear", "clear", "clear"],
    ["clear", "clear", "clear", "clear"],
    ["clear", "clear", "clear", "clear"]
  ],
  "palette": [{"hex": "#00ff00", "quantity": "unlimited"}]
}"##;
    std::fs::write(&path, content).unwrap();
    path
}

// ============================================================================
// new
// ============================================================================

#[test]
fn test_new_creates_clear_grid() {
    let dir = tempfile::TempDir::new().unwrap();
    let (stdout, stderr, code) = run_in(dir.path(), &["new", "art.json", "--rows", "3", "--columns", "5"]);
    assert_eq!(code, 0, "stderr: {}", stderr);
    assert!(stdout.contains("Created: art.json (3x5, 1 palette entries)"), "stdout: {}", stdout);
    assert!(stderr.contains("Wrote: art.json"));

    let project = read_project(&dir.path().join("art.json")).unwrap();
    assert_eq!(project.grid.rows(), 3);
    assert_eq!(project.grid.cols(), 5);
    assert_eq!(project.grid.count(&CellValue::Clear), 15);
    assert!(project.palette.contains(&CellValue::Clear));
}

#[test]
fn test_new_uses_config_defaults() {
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(dir.path().join("mosaic.toml"), "[grid]\nrows = 6\ncolumns = 7\n").unwrap();
    let (_, stderr, code) = run_in(dir.path(), &["new", "art.json"]);
    assert_eq!(code, 0, "stderr: {}", stderr);

    let project = read_project(&dir.path().join("art.json")).unwrap();
    assert_eq!(project.grid.rows(), 6);
    assert_eq!(project.grid.cols(), 7);
}

#[test]
fn test_new_with_palette_file() {
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(dir.path().join("tiles.csv"), "Red,10,#FF0000\nGold,5,n/a\nBlue,unlimited,#0000ff\n").unwrap();
    let (_, stderr, code) = run_in(dir.path(), &["new", "art.json", "--rows", "2", "--columns", "2", "--palette", "tiles.csv"]);
    assert_eq!(code, 0, "stderr: {}", stderr);

    let project = read_project(&dir.path().join("art.json")).unwrap();
    let red = project.palette.get(&color("#ff0000")).unwrap();
    assert_eq!(red.quantity, Quantity::Limited(10));
    assert_eq!(red.name.as_deref(), Some("Red"));
    assert!(project.palette.contains(&color("#0000ff")));
    assert!(project.palette.contains(&CellValue::Clear));
}

#[test]
fn test_new_refuses_to_overwrite() {
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(dir.path().join("art.json"), "keep me").unwrap();

    let (_, stderr, code) = run_in(dir.path(), &["new", "art.json"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("already exists"));
    assert_eq!(std::fs::read_to_string(dir.path().join("art.json")).unwrap(), "keep me");

    let (_, _, code) = run_in(dir.path(), &["new", "art.json", "--force", "--rows", "1", "--columns", "1"]);
    assert_eq!(code, 0);
    assert!(read_project(&dir.path().join("art.json")).is_ok());
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_invalid_config_exits_with_invalid_args() {
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(dir.path().join("mosaic.toml"), "[history]\nlimit = 0\n").unwrap();
    let (_, stderr, code) = run_in(dir.path(), &["new", "art.json"]);
    assert_eq!(code, 2);
    assert!(stderr.contains("mosaic.toml: 'history.limit' must be a positive integer"), "stderr: {}", stderr);
    assert!(!dir.path().join("art.json").exists());
}

#[test]
fn test_zero_rows_override_rejected() {
    let dir = tempfile::TempDir::new().unwrap();
    let (_, stderr, code) = run_in(dir.path(), &["new", "art.json", "--rows", "0"]);
    assert_eq!(code, 2);
    assert!(stderr.contains("grid.rows"));
}

#[test]
fn test_flag_overrides_invalid_config_value() {
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(dir.path().join("mosaic.toml"), "[grid]\nrows = 0\ncolumns = 3\n").unwrap();
    let (_, stderr, code) = run_in(dir.path(), &["new", "art.json", "--rows", "4"]);
    assert_eq!(code, 0, "stderr: {}", stderr);

    let project = read_project(&dir.path().join("art.json")).unwrap();
    assert_eq!(project.grid.rows(), 4);
    assert_eq!(project.grid.cols(), 3);
}

#[test]
fn test_malformed_config_is_an_error() {
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(dir.path().join("custom.toml"), "[grid\nrows = 3").unwrap();
    let (_, stderr, code) = run_in(dir.path(), &["--config", "custom.toml", "new", "art.json"]);
    assert_eq!(code, 1);
    assert!(stderr.starts_with("Error:"), "stderr: {}", stderr);
}

// ============================================================================
// edit
// ============================================================================

#[test]
fn test_edit_paint_and_fill() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = create_plain_project(&dir);
    let (_, stderr, code) = run_in(
        dir.path(),
        &["edit", "plain.json", "--paint", "0,0=#00FF00", "--fill-row", "2=reserved"],
    );
    assert_eq!(code, 0, "stderr: {}", stderr);
    assert!(stderr.contains("Applied 2 of 2 operations"));

    let project = read_project(&path).unwrap();
    assert_eq!(project.grid.get(0, 0), Some(&color("#00ff00")));
    assert_eq!(project.grid.count(&CellValue::Reserved), 4);
    assert_eq!(project.grid.count(&CellValue::Clear), 7);
}

#[test]
fn test_edit_mirrored_paint() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = create_plain_project(&dir);
    let (_, _, code) = run_in(dir.path(), &["edit", "plain.json", "--paint", "0,0=#00ff00", "--mirror", "both"]);
    assert_eq!(code, 0);

    let project = read_project(&path).unwrap();
    for (row, col) in [(0, 0), (0, 3), (2, 0), (2, 3)] {
        assert_eq!(project.grid.get(row, col), Some(&color("#00ff00")), "cell {},{}", row, col);
    }
    assert_eq!(project.grid.count(&color("#00ff00")), 4);
}

#[test]
fn test_edit_resize_and_delete() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = create_plain_project(&dir);
    let (_, _, code) = run_in(dir.path(), &["edit", "plain.json", "--resize", "5x2", "--delete-rows", "0,10"]);
    assert_eq!(code, 0);

    let project = read_project(&path).unwrap();
    // Deleting never removes the last row.
    assert_eq!(project.grid.rows(), 1);
    assert_eq!(project.grid.cols(), 2);
}

#[test]
fn test_edit_output_leaves_input_untouched() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = create_plain_project(&dir);
    let before = std::fs::read_to_string(&path).unwrap();

    let (_, _, code) = run_in(dir.path(), &["edit", "plain.json", "--fill-rect", "0,0,2,2=#00ff00", "-o", "out.json"]);
    assert_eq!(code, 0);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), before);

    let project = read_project(&dir.path().join("out.json")).unwrap();
    assert_eq!(project.grid.count(&color("#00ff00")), 4);
}

#[test]
fn test_edit_move_region() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = create_plain_project(&dir);
    let (_, _, code) = run_in(
        dir.path(),
        &["edit", "plain.json", "--paint", "0,0=#00ff00", "--move", "0,0,1,1>2,3"],
    );
    assert_eq!(code, 0);

    let project = read_project(&path).unwrap();
    assert_eq!(project.grid.get(0, 0), Some(&CellValue::Clear));
    assert_eq!(project.grid.get(2, 3), Some(&color("#00ff00")));
}

#[test]
fn test_edit_dry_run_does_not_write() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = create_plain_project(&dir);
    let before = std::fs::read_to_string(&path).unwrap();

    let (stdout, _, code) = run_in(dir.path(), &["edit", "plain.json", "--paint", "1,1=#00ff00", "--dry-run"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("--- plain.json"));
    assert!(stdout.contains("+++ plain.json (after edit)"));
    assert!(stdout.contains("#00ff00"));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
}

#[test]
fn test_edit_dry_run_no_changes() {
    let dir = tempfile::TempDir::new().unwrap();
    create_plain_project(&dir);
    let (stdout, _, code) = run_in(dir.path(), &["edit", "plain.json", "--paint", "1,1=clear", "--dry-run"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("No changes."));
}

#[test]
fn test_edit_invalid_operation() {
    let dir = tempfile::TempDir::new().unwrap();
    create_plain_project(&dir);

    let (_, stderr, code) = run_in(dir.path(), &["edit", "plain.json", "--paint", "0,0=#zzzzzz"]);
    assert_eq!(code, 2);
    assert!(stderr.contains("invalid cell value"));

    let (_, stderr, code) = run_in(dir.path(), &["edit", "plain.json"]);
    assert_eq!(code, 2);
    assert!(stderr.contains("no edit operations given"));
}

#[test]
fn test_edit_warns_about_unknown_colors() {
    let dir = tempfile::TempDir::new().unwrap();
    create_plain_project(&dir);
    let (_, stderr, code) = run_in(dir.path(), &["edit", "plain.json", "--paint", "0,0=#123456"]);
    assert_eq!(code, 0);
    assert!(stderr.contains("'#123456' is painted but not in the palette"));
}

#[test]
fn test_edit_malformed_project() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, r#"{"rows": 2, "columns": 2}"#).unwrap();

    let (_, stderr, code) = run_in(dir.path(), &["edit", "broken.json", "--paint", "0,0=clear"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("invalid project file"), "stderr: {}", stderr);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), r#"{"rows": 2, "columns": 2}"#);
}

#[test]
fn test_edit_missing_project() {
    let dir = tempfile::TempDir::new().unwrap();
    let (_, stderr, code) = run_in(dir.path(), &["edit", "nope.json", "--paint", "0,0=clear"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("failed to access"));
}

// ============================================================================
// import
// ============================================================================

#[test]
fn test_import_raster_rations_supply() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = create_rationed_project(&dir);
    std::fs::write(dir.path().join("picture.txt"), "#fe0001 #fe0001\n#0000fe clear\n").unwrap();

    let (stdout, stderr, code) = run_in(dir.path(), &["import", "picture.txt", "-p", "rationed.json", "--raster"]);
    assert_eq!(code, 0, "stderr: {}", stderr);
    assert!(stdout.contains("Imported: rationed.json (2x2"));
    assert!(stderr.contains("1 cell exceed palette supply"));

    let project = read_project(&path).unwrap();
    assert_eq!(project.grid.get(1, 1), Some(&CellValue::Clear));
    assert_eq!(project.grid.get(1, 0), Some(&color("#0000ff")));
    assert_eq!(project.grid.count(&color("#0000ff")), 1);
    assert_eq!(project.grid.count(&color("#ff0000")), 2);
}

#[test]
fn test_import_png_matches_grid() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = create_plain_project(&dir);
    let image = image::RgbaImage::from_pixel(8, 6, image::Rgba([10, 240, 20, 255]));
    image.save(dir.path().join("green.png")).unwrap();

    let (_, stderr, code) = run_in(dir.path(), &["import", "green.png", "-p", "plain.json", "-o", "out.json"]);
    assert_eq!(code, 0, "stderr: {}", stderr);

    let project = read_project(&dir.path().join("out.json")).unwrap();
    assert_eq!(project.grid.rows(), 3);
    assert_eq!(project.grid.cols(), 4);
    assert_eq!(project.grid.count(&color("#00ff00")), 12);
    // The source project is untouched.
    assert_eq!(read_project(&path).unwrap().grid.count(&CellValue::Clear), 12);
}

#[test]
fn test_import_transparent_pixels_become_clear() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = create_plain_project(&dir);
    let image = image::RgbaImage::from_pixel(4, 3, image::Rgba([0, 255, 0, 0]));
    image.save(dir.path().join("ghost.png")).unwrap();

    let (_, _, code) = run_in(dir.path(), &["import", "ghost.png", "-p", "plain.json"]);
    assert_eq!(code, 0);
    assert_eq!(read_project(&path).unwrap().grid.count(&CellValue::Clear), 12);
}

#[test]
fn test_import_undecodable_image() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = create_plain_project(&dir);
    let before = std::fs::read_to_string(&path).unwrap();
    std::fs::write(dir.path().join("junk.png"), b"definitely not a png").unwrap();

    let (_, stderr, code) = run_in(dir.path(), &["import", "junk.png", "-p", "plain.json"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Error:"));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
}

// ============================================================================
// palette
// ============================================================================

#[test]
fn test_palette_export_to_stdout() {
    let dir = tempfile::TempDir::new().unwrap();
    create_rationed_project(&dir);
    let (stdout, _, code) = run_in(dir.path(), &["palette", "export", "rationed.json"]);
    assert_eq!(code, 0);

    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines[0], "name,quantity,hex");
    assert_eq!(lines[1], ",unlimited,n/a");
    assert!(lines.contains(&"Red,1,#ff0000"));
    assert!(lines.contains(&"Blue,1,#0000ff"));
}

#[test]
fn test_palette_export_then_import_round_trip() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = create_rationed_project(&dir);
    let (_, _, code) = run_in(dir.path(), &["palette", "export", "rationed.json", "-o", "tiles.csv"]);
    assert_eq!(code, 0);

    let (_, _, code) = run_in(dir.path(), &["new", "fresh.json", "--rows", "1", "--columns", "1"]);
    assert_eq!(code, 0);
    let (stdout, stderr, code) = run_in(dir.path(), &["palette", "import", "fresh.json", "tiles.csv"]);
    assert_eq!(code, 0, "stderr: {}", stderr);
    assert!(stdout.contains("Imported 3 palette entries into fresh.json"));

    let original = read_project(&path).unwrap();
    let fresh = read_project(&dir.path().join("fresh.json")).unwrap();
    for entry in original.palette.entries() {
        assert_eq!(fresh.palette.get(&entry.key), Some(entry));
    }
}

#[test]
fn test_palette_import_lenient_and_strict() {
    let dir = tempfile::TempDir::new().unwrap();
    create_plain_project(&dir);
    std::fs::write(dir.path().join("tiles.csv"), "Red,4,#ff0000\nBad,2,#nothex\n").unwrap();

    let (_, stderr, code) = run_in(dir.path(), &["palette", "import", "plain.json", "tiles.csv", "--strict"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("line 2"), "stderr: {}", stderr);

    let (_, stderr, code) = run_in(dir.path(), &["palette", "import", "plain.json", "tiles.csv"]);
    assert_eq!(code, 0);
    assert!(stderr.contains("Warning:"));
    let project = read_project(&dir.path().join("plain.json")).unwrap();
    assert!(project.palette.contains(&color("#ff0000")));
    // Replacing the palette drops the old green entry.
    assert!(!project.palette.contains(&color("#00ff00")));
}

// ============================================================================
// info
// ============================================================================

#[test]
fn test_info_text() {
    let dir = tempfile::TempDir::new().unwrap();
    create_rationed_project(&dir);
    let (stdout, _, code) = run_in(dir.path(), &["info", "rationed.json"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Grid: 2x2 (4 cells)"));
    assert!(stdout.contains("Palette: 3 entries"));
    assert!(stdout.contains("Supply: 2 tiles"));
}

#[test]
fn test_info_json_reports_shortfall() {
    let dir = tempfile::TempDir::new().unwrap();
    create_rationed_project(&dir);
    let (_, _, code) = run_in(dir.path(), &["edit", "rationed.json", "--fill-row", "0=#ff0000"]);
    assert_eq!(code, 0);

    let (stdout, _, code) = run_in(dir.path(), &["info", "rationed.json", "--json"]);
    assert_eq!(code, 0);
    let info: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(info["rows"], 2);
    assert_eq!(info["columns"], 2);
    assert_eq!(info["total_supply"], 2);

    let palette = info["palette"].as_array().unwrap();
    let red = palette.iter().find(|u| u["key"] == "#ff0000").unwrap();
    assert_eq!(red["used"], 2);
    assert_eq!(red["shortfall"], 1);
    assert!(info["unknown"].as_array().unwrap().is_empty());
}
