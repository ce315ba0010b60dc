//! Evaluation of business-rule domains against a single column.

use crate::config::FillValue;
use crate::error::Result;
use crate::quality::report::{Violation, ViolationKind};
use crate::schema::Domain;
use chrono::NaiveDate;
use polars::prelude::*;

/// Days between the Unix epoch and `date`, matching polars' `Date` physical
/// representation.
pub(crate) fn epoch_days(date: NaiveDate) -> i64 {
    date.signed_duration_since(NaiveDate::default()).num_days()
}

/// Per-row flags, `true` where the cell violates `domain`.
///
/// Nulls never violate a domain (missingness has its own rule) and neither
/// do cells holding the column's sentinel.
pub(crate) fn violation_mask(
    series: &Series,
    domain: &Domain,
    sentinel: Option<&FillValue>,
) -> Result<Vec<bool>> {
    let mask: Vec<bool> = match domain {
        Domain::Range { min, max } => {
            let values = series.cast(&DataType::Float64)?;
            values
                .f64()?
                .into_iter()
                .map(|cell| {
                    cell.is_some_and(|v| {
                        !sentinel.is_some_and(|s| s.matches_number(v))
                            && (min.is_some_and(|lo| v < lo) || max.is_some_and(|hi| v > hi))
                    })
                })
                .collect()
        }
        Domain::OneOf { values } => {
            let text = series.cast(&DataType::String)?;
            text.str()?
                .into_iter()
                .map(|cell| {
                    cell.is_some_and(|v| {
                        !sentinel.is_some_and(|s| s.matches_text(v))
                            && !values.iter().any(|allowed| allowed == v)
                    })
                })
                .collect()
        }
        Domain::DateRange { min, max } => {
            let (lo, hi) = (epoch_days(*min), epoch_days(*max));
            let days = series.cast(&DataType::Int32)?;
            days.i32()?
                .into_iter()
                .map(|cell| cell.is_some_and(|d| i64::from(d) < lo || i64::from(d) > hi))
                .collect()
        }
    };
    Ok(mask)
}

/// Summarize a violation mask for reporting.
pub(crate) fn describe(series: &Series, domain: &Domain, mask: &[bool]) -> Option<Violation> {
    let count = mask.iter().filter(|v| **v).count();
    if count == 0 {
        return None;
    }

    let kind = match domain {
        Domain::Range { .. } => ViolationKind::OutOfRange,
        Domain::OneOf { .. } => ViolationKind::NotInDomain,
        Domain::DateRange { .. } => ViolationKind::DateOutOfRange,
    };

    let example = first_offender(series, mask).unwrap_or_default();

    Some(Violation::new(
        kind,
        count,
        format!(
            "{count} values outside {} (e.g. '{example}')",
            domain.describe()
        ),
    ))
}

fn first_offender(series: &Series, mask: &[bool]) -> Option<String> {
    let position = mask.iter().position(|v| *v)?;
    let text = series.cast(&DataType::String).ok()?;
    text.str().ok()?.get(position).map(ToOwned::to_owned)
}
