//! Mosaic planner - library for planning tile mosaics
//!
//! This library provides functionality to:
//! - Edit a rectangular grid of tile cells with bounded undo/redo, selection,
//!   clipboard and mirrored painting
//! - Track a palette of tile colors with finite or unlimited supply
//! - Import a raster image as a tile layout, rationing scarce colors fairly
//! - Load and save projects, and import or export palettes

pub mod cli;
pub mod color;
pub mod config;
pub mod document;
pub mod grid;
pub mod history;
pub mod import;
pub mod models;
pub mod palette;
pub mod palette_parser;
pub mod project;
pub mod reminder;
pub mod selection;
