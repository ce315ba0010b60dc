//! Row-level helpers: duplicate scans, NaN counts and row selection.

use crate::error::Result;
use polars::prelude::*;

/// Exact duplicate rows of a table, compared across every column.
#[derive(Debug, Clone)]
pub(crate) struct DuplicateScan {
    /// Every row that has at least one twin, sorted so copies sit together
    pub copies: DataFrame,
    /// Distinct rows among the copies
    pub groups: usize,
    /// Rows that deduplication would remove
    pub surplus: usize,
}

impl DuplicateScan {
    pub fn scan(df: &DataFrame) -> Result<Self> {
        if df.height() < 2 || df.width() == 0 {
            return Ok(Self {
                copies: df.clear(),
                groups: 0,
                surplus: 0,
            });
        }

        let twins = df.is_duplicated()?;
        let copies = df.filter(&twins)?;
        if copies.height() == 0 {
            return Ok(Self {
                copies,
                groups: 0,
                surplus: 0,
            });
        }

        let groups = copies
            .unique_stable(None, UniqueKeepStrategy::First, None)?
            .height();
        let surplus = copies.height() - groups;
        let copies = copies.sort(
            copies.get_column_names_owned(),
            SortMultipleOptions::default().with_maintain_order(true),
        )?;

        Ok(Self {
            copies,
            groups,
            surplus,
        })
    }

    pub fn has_duplicates(&self) -> bool {
        self.surplus > 0
    }
}

/// Keep the first copy of every row, preserving order.
pub(crate) fn deduplicate(df: &DataFrame) -> Result<DataFrame> {
    Ok(df.unique_stable(None, UniqueKeepStrategy::First, None)?)
}

/// Number of `NaN` cells; zero for non-float columns.
pub(crate) fn nan_count(column: &Column) -> Result<usize> {
    if !column.dtype().is_float() {
        return Ok(0);
    }
    Ok(column.as_materialized_series().is_nan()?.num_trues())
}

/// Keep rows whose mask entry is `true`, preserving order.
pub(crate) fn filter_rows(df: &DataFrame, keep: &[bool]) -> Result<DataFrame> {
    let mask = BooleanChunked::from_slice("keep".into(), keep);
    Ok(df.filter(&mask)?)
}
