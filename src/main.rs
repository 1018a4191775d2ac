//! # pin-differ CLI
//!
//! This is the binary entry point for the `pin-differ` command-line tool.
//!
//! Its primary responsibilities are:
//! - Parsing command-line arguments using `clap`.
//! - Configuring logging from the `--verbose`/`--debug` flags.
//! - Handling top-level application errors and translating them into
//!   user-friendly output and exit codes.
//!
//! The comparison logic lives in the `pin_differ` library crate, keeping the
//! binary a thin wrapper around reusable functionality.

mod cli;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
