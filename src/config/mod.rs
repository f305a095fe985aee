//! Configuration for the mosaic planner
//!
//! Provides types, discovery and parsing for `mosaic.toml`.

pub mod loader;
pub mod schema;

pub use loader::*;
pub use schema::*;
