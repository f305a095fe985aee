//! `mosaic` - command-line mosaic planner

use std::process::ExitCode;

use mosaicplan::cli;

fn main() -> ExitCode {
    cli::run()
}
