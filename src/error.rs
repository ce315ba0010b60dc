//! Error handling for scour.
//!
//! The pipeline distinguishes three families of failure:
//!
//! - [`ScourError::Schema`]: the table cannot be made to fit the declared
//!   schema (malformed or unknown column names, values that cannot be
//!   coerced). Always fatal.
//! - [`ScourError::DataQuality`]: a rule found violations. Recoverable, the
//!   validation loop repairs these. Surfaced to callers only by checks that
//!   do not repair.
//! - [`ScourError::NonConvergence`]: a repair did not clear its rule within
//!   the iteration cap. Fatal.
//!
//! Everything else (I/O, polars, the database sink, configuration parsing)
//! is wrapped so `?` works across the crate:
//!
//! ```no_run
//! use scour::error::{Result, ResultExt as _};
//!
//! fn read_schema(path: &str) -> Result<String> {
//!     let text = std::fs::read_to_string(path).context("Failed to read schema")?;
//!     Ok(text)
//! }
//! ```

use crate::quality::RuleReport;
use std::fmt;

/// Main error type for scour operations.
#[derive(Debug)]
pub enum ScourError {
    /// Fatal schema problem detected or raised by a rule.
    Schema { rule: String, message: String },

    /// Recoverable data-quality violations.
    DataQuality(Box<RuleReport>),

    /// The loop hit its iteration cap while a rule still failed.
    NonConvergence {
        rule: String,
        iterations: usize,
        report: Box<RuleReport>,
    },

    /// I/O errors (files, side outputs)
    Io(std::io::Error),

    /// Polars errors
    DataProcessing(String),

    /// Database sink errors
    Database(String),

    /// Configuration and schema file errors
    Config(String),

    /// Generic error with context
    Other(String),
}

impl ScourError {
    pub fn schema(rule: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Schema {
            rule: rule.into(),
            message: message.into(),
        }
    }

    /// Whether the validation loop may attempt a repair for this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::DataQuality(_))
    }
}

impl fmt::Display for ScourError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Schema { rule, message } => write!(f, "Schema error ({rule}): {message}"),
            Self::DataQuality(report) => write!(f, "Data quality error: {report}"),
            Self::NonConvergence {
                rule,
                iterations,
                report,
            } => write!(
                f,
                "Rule '{rule}' still failing after {iterations} passes: {report}"
            ),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::DataProcessing(msg) => write!(f, "Data processing error: {msg}"),
            Self::Database(msg) => write!(f, "Database error: {msg}"),
            Self::Config(msg) => write!(f, "Configuration error: {msg}"),
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for ScourError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ScourError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<anyhow::Error> for ScourError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<serde_json::Error> for ScourError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(format!("JSON error: {err}"))
    }
}

impl From<polars::error::PolarsError> for ScourError {
    fn from(err: polars::error::PolarsError) -> Self {
        Self::DataProcessing(err.to_string())
    }
}

impl From<sqlx::Error> for ScourError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Result type alias for scour operations.
pub type Result<T> = std::result::Result<T, ScourError>;

/// Extension trait to add context to results.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, msg: impl Into<String>) -> Result<T>;

    /// Add context using a closure (lazy evaluation).
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<ScourError>,
{
    fn context(self, msg: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err: ScourError = e.into();
            ScourError::Other(format!("{}: {}", msg.into(), err))
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err: ScourError = e.into();
            ScourError::Other(format!("{}: {}", f(), err))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::{Violation, ViolationKind};

    #[test]
    fn test_schema_error_display() {
        let err = ScourError::schema("column_names", "column 'arrival date' contains whitespace");
        assert_eq!(
            err.to_string(),
            "Schema error (column_names): column 'arrival date' contains whitespace"
        );
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_non_convergence_carries_report() {
        let mut report = RuleReport::new("domain");
        report.push(
            "adr",
            Violation::new(ViolationKind::OutOfRange, 3, "3 values below 0"),
        );
        let err = ScourError::NonConvergence {
            rule: "domain".to_owned(),
            iterations: 10,
            report: Box::new(report),
        };
        let msg = err.to_string();
        assert!(msg.contains("after 10 passes"));
        assert!(msg.contains("adr"));
    }

    #[test]
    fn test_data_quality_is_recoverable() {
        let err = ScourError::DataQuality(Box::new(RuleReport::new("missing_values")));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_result_context() {
        let result: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "bookings.csv",
        ));

        let result: Result<()> = result.context("Failed to read input");
        assert!(
            result
                .expect_err("context keeps the error")
                .to_string()
                .contains("Failed to read input")
        );
    }
}
