//! # scour - declarative validation and repair for tabular data
//!
//! scour checks an in-memory table against a declared [`schema`], repairs
//! what it can and drops what it cannot, until every rule passes. The
//! hotel bookings dataset is the built-in reference: its schema and repair
//! policy ship with the crate.
//!
//! ```no_run
//! use scour::config::PipelineConfig;
//! use scour::quality::{NeverDrop, Pipeline};
//! use scour::schema::Schema;
//! use std::path::Path;
//!
//! # fn main() -> scour::error::Result<()> {
//! let config = PipelineConfig::hotel_bookings();
//! let df = scour::io::load_table(Path::new("hotel_bookings.csv"), &config.null_values)?;
//!
//! let pipeline = Pipeline::standard(
//!     Schema::hotel_bookings(),
//!     &config,
//!     "hotel_bookings_duplicates.csv",
//!     Box::new(NeverDrop),
//! );
//! for report in pipeline.check(&df)? {
//!     println!("{report}");
//! }
//!
//! let (mut clean, report) = pipeline.run(df)?;
//! scour::io::save_table(&mut clean, Path::new("hotel_bookings_cleaned.csv"))?;
//! println!("{}", report.summary());
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Modules
//!
//! - [`schema`]: per-column semantic types and business-rule domains
//! - [`config`]: fill, correction and loop policies; database settings
//! - [`quality`]: rules, repairs and the validation loop
//! - [`io`]: CSV loading and saving
//! - [`db`]: PostgreSQL sink
//! - [`error`]: error types and handling utilities
//! - [`logging`]: console and rolling-file `tracing` setup

pub mod config;
pub mod db;
pub mod error;
pub mod io;
pub mod logging;
pub mod quality;
pub mod schema;
