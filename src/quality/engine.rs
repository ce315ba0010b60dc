//! The validation loop.
//!
//! Evaluates the rule registry in order and repairs the first failing rule,
//! then starts over, until every rule passes or is waived. Passes are
//! capped; a rule that is still failing at the cap aborts the run.

use crate::config::PipelineConfig;
use crate::error::{Result, ScourError};
use crate::quality::repairs::{RepairOutcome, RepairRegistry};
use crate::quality::report::RuleReport;
use crate::quality::review::DuplicateReviewer;
use crate::quality::rules::RuleRegistry;
use crate::schema::Schema;
use polars::prelude::DataFrame;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// One repair applied during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairRecord {
    pub rule: String,
    pub rows_before: usize,
    pub rows_after: usize,

    /// Violations reported by the rule before the repair
    pub violations: usize,
}

impl RepairRecord {
    pub fn rows_removed(&self) -> usize {
        self.rows_before.saturating_sub(self.rows_after)
    }
}

/// Report generated after a validation run
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Number of rows before processing
    pub rows_before: usize,

    /// Number of rows after processing
    pub rows_after: usize,

    /// Evaluation passes, including the final clean one
    pub iterations: usize,

    /// Repairs applied, in order
    pub repairs: Vec<RepairRecord>,

    /// Rules the operator declined to repair
    pub waived: Vec<String>,

    /// Duplicate review file left on disk, if any
    pub review_file: Option<PathBuf>,

    /// Time taken for the run
    pub duration: Duration,
}

impl RunReport {
    pub fn rows_removed(&self) -> usize {
        self.rows_before.saturating_sub(self.rows_after)
    }

    /// Create a summary message
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "Validation completed: {} rows ({} → {}), {} repairs in {} passes, {:.2}s",
            if self.rows_after < self.rows_before {
                "removed"
            } else {
                "unchanged"
            },
            self.rows_before,
            self.rows_after,
            self.repairs.len(),
            self.iterations,
            self.duration.as_secs_f64()
        );
        if !self.waived.is_empty() {
            summary.push_str(&format!(", waived: {}", self.waived.join(", ")));
        }
        if let Some(path) = &self.review_file {
            summary.push_str(&format!(", review file: {}", path.display()));
        }
        summary
    }
}

/// Rule and repair registries plus the loop bound.
pub struct Pipeline {
    rules: RuleRegistry,
    repairs: RepairRegistry,
    max_iterations: usize,
}

impl Pipeline {
    /// `max_iterations` bounds the number of repairs. With `0` no repair is
    /// ever tried, so any failing table ends in `NonConvergence`; config
    /// files and the CLI refuse that value.
    pub fn new(rules: RuleRegistry, repairs: RepairRegistry, max_iterations: usize) -> Self {
        Self {
            rules,
            repairs,
            max_iterations,
        }
    }

    /// The standard rules and repairs for `schema` under `config`.
    pub fn standard(
        schema: Schema,
        config: &PipelineConfig,
        review_path: impl Into<PathBuf>,
        reviewer: Box<dyn DuplicateReviewer>,
    ) -> Self {
        let schema = Arc::new(schema);
        Self::new(
            RuleRegistry::standard(&schema, config),
            RepairRegistry::standard(&schema, config, review_path, reviewer),
            config.max_iterations,
        )
    }

    pub fn rules(&self) -> &RuleRegistry {
        &self.rules
    }

    /// Evaluate every rule without repairing anything.
    pub fn check(&self, df: &DataFrame) -> Result<Vec<RuleReport>> {
        self.rules.evaluate_all(df)
    }

    /// Fail with the first failing rule's report, if any.
    ///
    /// Schema-level failures come back as [`ScourError::Schema`], everything
    /// else as the recoverable [`ScourError::DataQuality`].
    pub fn validate(&self, df: &DataFrame) -> Result<()> {
        match self.first_failure(df, &BTreeSet::new())? {
            None => Ok(()),
            Some((rule, report)) if report.has_schema_violation() => {
                Err(ScourError::schema(rule, report.to_string()))
            }
            Some((_, report)) => Err(ScourError::DataQuality(Box::new(report))),
        }
    }

    /// Repair `df` until every rule passes or is waived.
    pub fn run(&self, df: DataFrame) -> Result<(DataFrame, RunReport)> {
        let start = Instant::now();
        let rows_before = df.height();
        let columns: Vec<String> = df
            .get_column_names()
            .into_iter()
            .map(|c| c.to_string())
            .collect();

        let mut table = df;
        let mut waived: BTreeSet<&'static str> = BTreeSet::new();
        let mut repairs = Vec::new();
        let mut review_file = None;
        let mut iterations = 0;

        while let Some((rule, report)) = self.first_failure(&table, &waived)? {
            iterations += 1;

            if report.has_schema_violation() {
                return Err(ScourError::schema(rule, report.to_string()));
            }
            if iterations > self.max_iterations {
                return Err(ScourError::NonConvergence {
                    rule: rule.to_owned(),
                    iterations: self.max_iterations,
                    report: Box::new(report),
                });
            }
            let Some(repair) = self.repairs.get(rule) else {
                return Err(ScourError::schema(
                    rule,
                    format!("no repair registered: {report}"),
                ));
            };

            for (column, violation) in &report.violations {
                warn!(
                    "Rule {rule}: {} violations in column {column}: {}",
                    violation.count, violation.detail
                );
            }

            let rows = table.height();
            match repair.apply(table, &report)? {
                RepairOutcome::Applied(next) => {
                    ensure_shape(rule, rows, &columns, &next)?;
                    repairs.push(RepairRecord {
                        rule: rule.to_owned(),
                        rows_before: rows,
                        rows_after: next.height(),
                        violations: report.total_count(),
                    });
                    table = next;
                }
                RepairOutcome::Waived {
                    table: next,
                    review_file: file,
                } => {
                    ensure_shape(rule, rows, &columns, &next)?;
                    info!("Rule {rule} waived for the rest of the run");
                    waived.insert(rule);
                    review_file = file.or(review_file);
                    table = next;
                }
            }
        }

        let report = RunReport {
            rows_before,
            rows_after: table.height(),
            iterations: iterations + 1,
            repairs,
            waived: waived.into_iter().map(ToOwned::to_owned).collect(),
            review_file,
            duration: start.elapsed(),
        };
        info!("{}", report.summary());
        Ok((table, report))
    }

    /// First rule, in registry order, that is neither waived nor clean.
    fn first_failure(
        &self,
        df: &DataFrame,
        waived: &BTreeSet<&'static str>,
    ) -> Result<Option<(&'static str, RuleReport)>> {
        for rule in self.rules.iter() {
            if waived.contains(rule.name()) {
                continue;
            }
            let report = rule.evaluate(df)?;
            if report.is_clean() {
                debug!("Rule {} passed", rule.name());
            } else {
                return Ok(Some((rule.name(), report)));
            }
        }
        Ok(None)
    }
}

/// Repairs may remove rows, never add rows or touch the column set.
fn ensure_shape(rule: &str, rows_before: usize, columns: &[String], df: &DataFrame) -> Result<()> {
    if df.height() > rows_before {
        return Err(ScourError::DataProcessing(format!(
            "repair for rule {rule} grew the table from {rows_before} to {} rows",
            df.height()
        )));
    }
    let same_columns = df.width() == columns.len()
        && df
            .get_column_names()
            .iter()
            .zip(columns)
            .all(|(a, b)| a.as_str() == b);
    if !same_columns {
        return Err(ScourError::DataProcessing(format!(
            "repair for rule {rule} changed the column set"
        )));
    }
    Ok(())
}
