//! The repair registry: one transformation per repairable rule.
//!
//! A repair receives the table together with the report of the rule it
//! fixes and returns a table on which that rule passes, or waives the rule
//! when the operator declines a destructive change. Repairs never add
//! rows or columns, and on a table the rule already accepts they return it
//! unchanged.

use crate::config::{CorrectionPolicy, FillPolicy, PipelineConfig};
use crate::error::Result;
use crate::io::save_table;
use crate::quality::coerce::coerce_series;
use crate::quality::domain::violation_mask;
use crate::quality::report::RuleReport;
use crate::quality::review::{DuplicateReview, DuplicateReviewer};
use crate::quality::rows::{DuplicateScan, deduplicate, filter_rows, nan_count};
use crate::quality::rules::{DATATYPES, DOMAIN, DUPLICATES, MISSING_VALUES};
use crate::schema::{Domain, Schema};
use polars::prelude::*;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Result of applying a repair.
#[derive(Debug, Clone)]
pub enum RepairOutcome {
    /// The rule's violations were fixed.
    Applied(DataFrame),

    /// The operator declined; the rule is skipped for the rest of the run.
    Waived {
        table: DataFrame,
        review_file: Option<PathBuf>,
    },
}

pub trait Repair {
    fn apply(&self, df: DataFrame, report: &RuleReport) -> Result<RepairOutcome>;
}

/// Fill sentinel columns, then drop rows that still have a null.
pub struct MissingValuesRepair {
    fill: FillPolicy,
}

impl MissingValuesRepair {
    pub fn new(fill: FillPolicy) -> Self {
        Self { fill }
    }
}

impl Repair for MissingValuesRepair {
    fn apply(&self, df: DataFrame, report: &RuleReport) -> Result<RepairOutcome> {
        let mut fills = Vec::new();
        for column in report.columns() {
            let Ok(existing) = df.column(column) else {
                continue;
            };
            let nans = nan_count(existing)?;
            let sentinel = self.fill.sentinel(column);
            if nans == 0 && sentinel.is_none() {
                continue;
            }

            let mut expr = col(column);
            if nans > 0 {
                expr = expr.fill_nan(lit(NULL));
            }
            if let Some(sentinel) = sentinel {
                info!(
                    "Filling {} missing values in column {column} with {sentinel}",
                    existing.null_count() + nans
                );
                expr = expr.fill_null(sentinel.literal_for(existing.dtype()));
            }
            fills.push(expr);
        }

        let before = df.height();
        let lf = df.lazy();
        let lf = if fills.is_empty() { lf } else { lf.with_columns(fills) };
        let df = lf.drop_nulls(None).collect()?;
        let dropped = before - df.height();
        if dropped > 0 {
            info!("Dropping {dropped} rows with missing values");
        }
        Ok(RepairOutcome::Applied(df))
    }
}

/// Coerce mistyped columns to the dtype their schema entry requires.
pub struct DatatypeRepair {
    schema: Arc<Schema>,
    date_formats: Vec<String>,
}

impl DatatypeRepair {
    pub fn new(schema: Arc<Schema>, date_formats: Vec<String>) -> Self {
        Self {
            schema,
            date_formats,
        }
    }
}

impl Repair for DatatypeRepair {
    fn apply(&self, mut df: DataFrame, report: &RuleReport) -> Result<RepairOutcome> {
        for name in report.columns() {
            let Some(spec) = self.schema.column(name) else {
                continue;
            };
            let series = df.column(name)?.as_materialized_series();
            let from = series.dtype().clone();
            let coerced = coerce_series(series, spec.kind, &self.date_formats)?;
            info!("Coerced column {name} from {from} to {}", coerced.dtype());
            df.with_column(coerced)?;
        }
        Ok(RepairOutcome::Applied(df))
    }
}

/// Remove surplus copies of duplicated rows, subject to operator review.
///
/// Every copy of every duplicated row is written to the review file before
/// anything is removed. The file is deleted once the removal is confirmed
/// and kept when it is declined.
pub struct DuplicatesRepair {
    review_path: PathBuf,
    reviewer: Box<dyn DuplicateReviewer>,
}

impl DuplicatesRepair {
    pub fn new(review_path: impl Into<PathBuf>, reviewer: Box<dyn DuplicateReviewer>) -> Self {
        Self {
            review_path: review_path.into(),
            reviewer,
        }
    }
}

impl Repair for DuplicatesRepair {
    fn apply(&self, df: DataFrame, _report: &RuleReport) -> Result<RepairOutcome> {
        let scan = DuplicateScan::scan(&df)?;
        if !scan.has_duplicates() {
            return Ok(RepairOutcome::Applied(df));
        }

        let mut copies = scan.copies;
        save_table(&mut copies, &self.review_path)?;
        let review = DuplicateReview {
            path: self.review_path.clone(),
            rows: copies.height(),
            surplus: scan.surplus,
        };
        info!(
            "Wrote {} duplicated rows to {}",
            review.rows,
            review.path.display()
        );

        if !self.reviewer.confirm(&review)? {
            warn!(
                "Duplicate removal declined, {} surplus rows kept; review file left at {}",
                review.surplus,
                review.path.display()
            );
            return Ok(RepairOutcome::Waived {
                table: df,
                review_file: Some(review.path),
            });
        }

        let deduped = deduplicate(&df)?;
        std::fs::remove_file(&self.review_path)?;
        info!("Dropped {} duplicate rows", review.surplus);
        Ok(RepairOutcome::Applied(deduped))
    }
}

/// Correct what can be corrected deterministically, drop what cannot.
pub struct DomainRepair {
    schema: Arc<Schema>,
    corrections: CorrectionPolicy,
    fill: FillPolicy,
}

impl DomainRepair {
    pub fn new(schema: Arc<Schema>, corrections: CorrectionPolicy, fill: FillPolicy) -> Self {
        Self {
            schema,
            corrections,
            fill,
        }
    }

    fn correct(&self, series: &Series, domain: &Domain) -> Result<Option<Series>> {
        let name = series.name().as_str();

        if let Some(aliases) = self.corrections.aliases_for(name)
            && series.dtype() == &DataType::String
        {
            let mut rewritten = 0usize;
            let values: Vec<Option<String>> = series
                .str()?
                .into_iter()
                .map(|cell| {
                    cell.map(|v| match aliases.get(v) {
                        Some(canonical) => {
                            rewritten += 1;
                            canonical.clone()
                        }
                        None => v.to_owned(),
                    })
                })
                .collect();
            if rewritten > 0 {
                info!("Rewrote {rewritten} aliased values in column {name}");
                return Ok(Some(Series::new(series.name().clone(), values)));
            }
        }

        if let Domain::Range { min, max } = domain
            && self.corrections.clamps(name)
            && series.dtype().is_primitive_numeric()
        {
            let sentinel = self.fill.sentinel(name);
            let mut clamped = 0usize;
            let values: Vec<Option<f64>> = series
                .cast(&DataType::Float64)?
                .f64()?
                .into_iter()
                .map(|cell| {
                    cell.map(|v| {
                        if sentinel.is_some_and(|s| s.matches_number(v)) {
                            return v;
                        }
                        let bounded = max.map_or(v, |hi| v.min(hi));
                        let bounded = min.map_or(bounded, |lo| bounded.max(lo));
                        if bounded != v {
                            clamped += 1;
                        }
                        bounded
                    })
                })
                .collect();
            if clamped > 0 {
                info!("Clamped {clamped} values in column {name} into {}", domain.describe());
                let series = Series::new(series.name().clone(), values).cast(series.dtype())?;
                return Ok(Some(series));
            }
        }

        Ok(None)
    }
}

impl Repair for DomainRepair {
    fn apply(&self, mut df: DataFrame, report: &RuleReport) -> Result<RepairOutcome> {
        let mut rejected = vec![false; df.height()];

        for name in report.columns() {
            let Some(spec) = self.schema.column(name) else {
                continue;
            };
            let Some(domain) = &spec.domain else {
                continue;
            };

            let original = df.column(name)?.as_materialized_series().clone();
            let series = match self.correct(&original, domain)? {
                Some(corrected) => {
                    df.with_column(corrected.clone())?;
                    corrected
                }
                None => original,
            };

            let mask = violation_mask(&series, domain, self.fill.sentinel(name))?;
            let remaining = mask.iter().filter(|v| **v).count();
            if remaining > 0 {
                warn!("{remaining} values in column {name} outside {}, dropping rows", domain.describe());
            }
            for (r, m) in rejected.iter_mut().zip(mask) {
                *r |= m;
            }
        }

        if !rejected.contains(&true) {
            return Ok(RepairOutcome::Applied(df));
        }
        let keep: Vec<bool> = rejected.iter().map(|r| !r).collect();
        info!(
            "Dropping {} rows with uncorrectable domain violations",
            rejected.iter().filter(|r| **r).count()
        );
        Ok(RepairOutcome::Applied(filter_rows(&df, &keep)?))
    }
}

/// Repairs keyed by the name of the rule they fix.
#[derive(Default)]
pub struct RepairRegistry {
    repairs: BTreeMap<&'static str, Box<dyn Repair>>,
}

impl RepairRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repairs for the standard rules. `column_names` has none.
    pub fn standard(
        schema: &Arc<Schema>,
        config: &PipelineConfig,
        review_path: impl Into<PathBuf>,
        reviewer: Box<dyn DuplicateReviewer>,
    ) -> Self {
        Self::new()
            .with_repair(MISSING_VALUES, MissingValuesRepair::new(config.fill.clone()))
            .with_repair(
                DATATYPES,
                DatatypeRepair::new(Arc::clone(schema), config.date_formats.clone()),
            )
            .with_repair(DUPLICATES, DuplicatesRepair::new(review_path, reviewer))
            .with_repair(
                DOMAIN,
                DomainRepair::new(
                    Arc::clone(schema),
                    config.corrections.clone(),
                    config.fill.clone(),
                ),
            )
    }

    #[must_use]
    pub fn with_repair(mut self, rule: &'static str, repair: impl Repair + 'static) -> Self {
        self.repairs.insert(rule, Box::new(repair));
        self
    }

    pub fn get(&self, rule: &str) -> Option<&dyn Repair> {
        self.repairs.get(rule).map(|r| r.as_ref())
    }

    pub fn contains(&self, rule: &str) -> bool {
        self.repairs.contains_key(rule)
    }
}
