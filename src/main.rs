//! # scour
//!
//! Command-line front end for the validation loop.
//!
//! ```bash
//! scour run hotel_bookings.csv --yes
//! scour check hotel_bookings_cleaned.csv
//! scour schema > hotel_bookings.schema.json
//! ```
//!
//! `run` writes `<stem>_cleaned.csv` next to the input and, when database
//! parameters are given (flags or `DATABASE_URL` / `DB_*` environment
//! variables), replaces the target PostgreSQL table with the result. The
//! tokio runtime only exists for that last step.

#![expect(clippy::print_stdout)] // Allow println! in main binary

mod cli;

use anyhow::Result;
use clap::Parser as _;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    // RUST_LOG=debug shows every rule evaluation
    scour::logging::init()?;

    tokio::runtime::Runtime::new()?.block_on(cli::run_command(cli.command))
}
