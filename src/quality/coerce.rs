//! Coercive casts from whatever dtype a column was loaded with to the
//! dtype its semantic type requires.
//!
//! Casts never lose information silently: a non-null value that cannot be
//! represented exactly in the target type is a [`ScourError::Schema`],
//! never a zero or a null.

use crate::error::{Result, ScourError};
use crate::quality::domain::epoch_days;
use crate::quality::rules::DATATYPES;
use crate::schema::SemanticType;
use chrono::NaiveDate;
use polars::prelude::*;

/// Largest magnitude an `f64` holds while every integer up to it is exact.
const MAX_EXACT_FLOAT_INT: f64 = 9_007_199_254_740_992.0;

/// Cast `series` to the dtype of `kind`.
pub fn coerce_series(series: &Series, kind: SemanticType, date_formats: &[String]) -> Result<Series> {
    if kind.matches(series.dtype()) {
        return Ok(series.clone());
    }

    match kind {
        SemanticType::Integer => coerce_integer(series),
        SemanticType::Float => coerce_float(series),
        SemanticType::Categorical | SemanticType::Text => Ok(series.cast(&DataType::String)?),
        SemanticType::Date => coerce_date(series, date_formats),
    }
}

fn coerce_integer(series: &Series) -> Result<Series> {
    if series.dtype().is_integer() || series.dtype().is_bool() {
        return Ok(series.strict_cast(&DataType::Int64)?);
    }

    let name = series.name().clone();
    let text = series.cast(&DataType::String)?;
    let mut out = Vec::with_capacity(text.len());
    let mut rejected = Rejected::new(series, SemanticType::Integer);

    for (row, cell) in text.str()?.into_iter().enumerate() {
        let value = match cell {
            None => None,
            Some(raw) => {
                let parsed = parse_integer(raw);
                if parsed.is_none() {
                    rejected.record(row, raw);
                }
                parsed
            }
        };
        out.push(value);
    }

    rejected.into_result()?;
    Ok(Series::new(name, out))
}

/// Parse integer text, accepting whole-valued floats such as `"3.0"`.
fn parse_integer(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(v) = raw.parse::<i64>() {
        return Some(v);
    }
    let v = raw.parse::<f64>().ok()?;
    if v.is_finite() && v.fract() == 0.0 && v.abs() <= MAX_EXACT_FLOAT_INT {
        Some(v as i64)
    } else {
        None
    }
}

fn coerce_float(series: &Series) -> Result<Series> {
    if series.dtype().is_primitive_numeric() || series.dtype().is_bool() {
        return Ok(series.strict_cast(&DataType::Float64)?);
    }

    let name = series.name().clone();
    let text = series.cast(&DataType::String)?;
    let mut out = Vec::with_capacity(text.len());
    let mut rejected = Rejected::new(series, SemanticType::Float);

    for (row, cell) in text.str()?.into_iter().enumerate() {
        let value = match cell {
            None => None,
            Some(raw) => {
                let parsed = raw.trim().parse::<f64>().ok();
                if parsed.is_none() {
                    rejected.record(row, raw);
                }
                parsed
            }
        };
        out.push(value);
    }

    rejected.into_result()?;
    Ok(Series::new(name, out))
}

fn coerce_date(series: &Series, formats: &[String]) -> Result<Series> {
    if matches!(series.dtype(), DataType::Datetime(_, _)) {
        return Ok(series.cast(&DataType::Date)?);
    }

    let name = series.name().clone();
    let text = series.cast(&DataType::String)?;
    let mut days = Vec::with_capacity(text.len());
    let mut rejected = Rejected::new(series, SemanticType::Date);

    for (row, cell) in text.str()?.into_iter().enumerate() {
        let value = match cell {
            None => None,
            Some(raw) => {
                let parsed = parse_date(raw, formats).and_then(|d| i32::try_from(epoch_days(d)).ok());
                if parsed.is_none() {
                    rejected.record(row, raw);
                }
                parsed
            }
        };
        days.push(value);
    }

    rejected.into_result()?;
    Ok(Series::new(name, days).cast(&DataType::Date)?)
}

fn parse_date(raw: &str, formats: &[String]) -> Option<NaiveDate> {
    let raw = raw.trim();
    formats
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

/// Collects values that failed to coerce so the error names all of them.
struct Rejected {
    column: String,
    kind: SemanticType,
    count: usize,
    first: Option<(usize, String)>,
}

impl Rejected {
    fn new(series: &Series, kind: SemanticType) -> Self {
        Self {
            column: series.name().to_string(),
            kind,
            count: 0,
            first: None,
        }
    }

    fn record(&mut self, row: usize, raw: &str) {
        self.count += 1;
        if self.first.is_none() {
            self.first = Some((row, raw.to_owned()));
        }
    }

    fn into_result(self) -> Result<()> {
        match self.first {
            None => Ok(()),
            Some((row, raw)) => Err(ScourError::schema(
                DATATYPES,
                format!(
                    "column '{}': {} values cannot be coerced to {} (first at row {row}: '{raw}')",
                    self.column, self.count, self.kind
                ),
            )),
        }
    }
}
