//! Data-quality rules, repairs and the loop that drives them.
//!
//! A [`RuleRegistry`] holds named checks in evaluation order, a
//! [`RepairRegistry`] maps each repairable rule to the transformation that
//! clears it, and a [`Pipeline`] alternates between the two until the table
//! is clean:
//!
//! ```no_run
//! use scour::config::PipelineConfig;
//! use scour::quality::{AlwaysDrop, Pipeline};
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
//!     Box::new(AlwaysDrop),
//! );
//! let (clean, report) = pipeline.run(df)?;
//! println!("{} ({} rows)", report.summary(), clean.height());
//! # Ok(())
//! # }
//! ```

mod coerce;
mod domain;
mod engine;
mod repairs;
mod report;
mod review;
mod rows;
mod rules;

pub use coerce::coerce_series;
pub use engine::{Pipeline, RepairRecord, RunReport};
pub use repairs::{
    DatatypeRepair, DomainRepair, DuplicatesRepair, MissingValuesRepair, Repair, RepairOutcome,
    RepairRegistry,
};
pub use report::{ALL_COLUMNS, RuleReport, Violation, ViolationKind};
pub use review::{AlwaysDrop, DuplicateReview, DuplicateReviewer, NeverDrop};
pub use rules::{
    COLUMN_NAMES, ColumnNamesRule, DATATYPES, DOMAIN, DUPLICATES, DatatypeRule, DomainRule,
    DuplicatesRule, MISSING_VALUES, MissingValuesRule, Rule, RuleRegistry,
};
