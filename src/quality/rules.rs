//! The rule registry: named, read-only checks evaluated in a fixed order.

use crate::config::{FillPolicy, PipelineConfig};
use crate::error::Result;
use crate::quality::domain;
use crate::quality::report::{ALL_COLUMNS, RuleReport, Violation, ViolationKind};
use crate::quality::rows::{DuplicateScan, nan_count};
use crate::schema::Schema;
use polars::prelude::*;
use std::sync::Arc;
use tracing::debug;

pub const COLUMN_NAMES: &str = "column_names";
pub const MISSING_VALUES: &str = "missing_values";
pub const DATATYPES: &str = "datatypes";
pub const DUPLICATES: &str = "duplicates";
pub const DOMAIN: &str = "domain";

/// A single data-quality check.
///
/// Rules never modify the table and may be evaluated any number of times.
pub trait Rule {
    fn name(&self) -> &'static str;

    /// Report every violation of this rule in `df`.
    fn evaluate(&self, df: &DataFrame) -> Result<RuleReport>;
}

/// Column names are well formed and match the schema exactly.
pub struct ColumnNamesRule {
    schema: Arc<Schema>,
}

impl ColumnNamesRule {
    pub fn new(schema: Arc<Schema>) -> Self {
        Self { schema }
    }
}

impl Rule for ColumnNamesRule {
    fn name(&self) -> &'static str {
        COLUMN_NAMES
    }

    fn evaluate(&self, df: &DataFrame) -> Result<RuleReport> {
        let mut report = RuleReport::new(COLUMN_NAMES);

        for name in df.get_column_names() {
            let name = name.as_str();
            if name.contains(char::is_whitespace) {
                report.push(
                    name,
                    Violation::new(ViolationKind::ColumnName, 1, "name contains whitespace"),
                );
            }
            if !self.schema.contains(name) {
                report.push(
                    name,
                    Violation::new(ViolationKind::UnknownColumn, 1, "not declared in schema"),
                );
            }
        }

        for expected in self.schema.names() {
            if df.column(expected).is_err() {
                report.push(
                    expected,
                    Violation::new(ViolationKind::MissingColumn, 1, "declared column is absent"),
                );
            }
        }

        Ok(report)
    }
}

/// No cell is null, and no float cell is `NaN`.
pub struct MissingValuesRule;

impl Rule for MissingValuesRule {
    fn name(&self) -> &'static str {
        MISSING_VALUES
    }

    fn evaluate(&self, df: &DataFrame) -> Result<RuleReport> {
        let mut report = RuleReport::new(MISSING_VALUES);
        for column in df.get_columns() {
            let nulls = column.null_count() + nan_count(column)?;
            if nulls > 0 {
                debug!("{nulls} missing values in column {}", column.name());
                report.push(
                    column.name().as_str(),
                    Violation::new(
                        ViolationKind::MissingValues,
                        nulls,
                        format!("{nulls} missing values"),
                    ),
                );
            }
        }
        Ok(report)
    }
}

/// Every declared column carries the dtype of its semantic type.
pub struct DatatypeRule {
    schema: Arc<Schema>,
}

impl DatatypeRule {
    pub fn new(schema: Arc<Schema>) -> Self {
        Self { schema }
    }
}

impl Rule for DatatypeRule {
    fn name(&self) -> &'static str {
        DATATYPES
    }

    fn evaluate(&self, df: &DataFrame) -> Result<RuleReport> {
        let mut report = RuleReport::new(DATATYPES);
        for spec in &self.schema.columns {
            let Ok(column) = df.column(&spec.name) else {
                continue;
            };
            let found = column.dtype();
            if !spec.kind.matches(found) {
                debug!(
                    "Column {} is {found}, expected {} ({})",
                    spec.name,
                    spec.kind,
                    spec.kind.dtype()
                );
                report.push(
                    spec.name.as_str(),
                    Violation::new(
                        ViolationKind::DtypeMismatch,
                        1,
                        format!("expected {} ({}), found {found}", spec.kind, spec.kind.dtype()),
                    ),
                );
            }
        }
        Ok(report)
    }
}

/// No two rows are identical across every column.
pub struct DuplicatesRule;

impl Rule for DuplicatesRule {
    fn name(&self) -> &'static str {
        DUPLICATES
    }

    fn evaluate(&self, df: &DataFrame) -> Result<RuleReport> {
        let mut report = RuleReport::new(DUPLICATES);
        let scan = DuplicateScan::scan(df)?;
        if scan.has_duplicates() {
            let groups = scan.groups;
            debug!("{} duplicate rows in {groups} groups", scan.surplus);
            report.push(
                ALL_COLUMNS,
                Violation::new(
                    ViolationKind::DuplicateRows,
                    scan.surplus,
                    format!("{} surplus copies in {groups} groups", scan.surplus),
                ),
            );
        }
        Ok(report)
    }
}

/// Values fall inside their column's declared domain.
///
/// Sentinel cells are exempt, and columns whose dtype does not match the
/// schema yet are left to [`DatatypeRule`].
pub struct DomainRule {
    schema: Arc<Schema>,
    fill: FillPolicy,
}

impl DomainRule {
    pub fn new(schema: Arc<Schema>, fill: FillPolicy) -> Self {
        Self { schema, fill }
    }
}

impl Rule for DomainRule {
    fn name(&self) -> &'static str {
        DOMAIN
    }

    fn evaluate(&self, df: &DataFrame) -> Result<RuleReport> {
        let mut report = RuleReport::new(DOMAIN);
        for spec in &self.schema.columns {
            let Some(domain) = &spec.domain else {
                continue;
            };
            let Ok(column) = df.column(&spec.name) else {
                continue;
            };
            if !spec.kind.matches(column.dtype()) {
                continue;
            }

            let series = column.as_materialized_series();
            let mask = domain::violation_mask(series, domain, self.fill.sentinel(&spec.name))?;
            if let Some(violation) = domain::describe(series, domain, &mask) {
                debug!("{} in column {}", violation.detail, spec.name);
                report.push(spec.name.as_str(), violation);
            }
        }
        Ok(report)
    }
}

/// Ordered collection of rules.
#[derive(Default)]
pub struct RuleRegistry {
    rules: Vec<Box<dyn Rule>>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The five standard rules, in evaluation order.
    pub fn standard(schema: &Arc<Schema>, config: &PipelineConfig) -> Self {
        Self::new()
            .with_rule(ColumnNamesRule::new(Arc::clone(schema)))
            .with_rule(MissingValuesRule)
            .with_rule(DatatypeRule::new(Arc::clone(schema)))
            .with_rule(DuplicatesRule)
            .with_rule(DomainRule::new(Arc::clone(schema), config.fill.clone()))
    }

    #[must_use]
    pub fn with_rule(mut self, rule: impl Rule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Rule> {
        self.rules.iter().map(|r| r.as_ref())
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Evaluate every rule without touching the table.
    pub fn evaluate_all(&self, df: &DataFrame) -> Result<Vec<RuleReport>> {
        self.rules.iter().map(|rule| rule.evaluate(df)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FillValue;
    use crate::schema::{ColumnSpec, SemanticType};

    fn schema() -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            ColumnSpec::new("hotel", SemanticType::Categorical)
                .one_of(&["Resort Hotel", "City Hotel"]),
            ColumnSpec::new("agent", SemanticType::Integer).at_least(-1.0),
            ColumnSpec::new("adr", SemanticType::Float).at_least(0.0),
        ]))
    }

    #[test]
    fn test_column_names_rule() -> Result<()> {
        let df = df!(
            "hotel" => ["City Hotel"],
            "arrival date" => ["2015-07-01"],
            "adr" => [75.0],
        )?;
        let report = ColumnNamesRule::new(schema()).evaluate(&df)?;

        let bad = report.get("arrival date").expect("whitespace column reported");
        assert_eq!(bad.kind, ViolationKind::ColumnName);
        assert_eq!(bad.count, 2);
        assert_eq!(
            report.get("agent").map(|v| v.kind),
            Some(ViolationKind::MissingColumn)
        );
        assert!(report.has_schema_violation());
        Ok(())
    }

    #[test]
    fn test_missing_values_rule_counts_nulls() -> Result<()> {
        let df = df!(
            "hotel" => ["City Hotel", "Resort Hotel", "City Hotel"],
            "agent" => [None, Some(9i64), None],
        )?;
        let report = MissingValuesRule.evaluate(&df)?;
        assert_eq!(report.get("agent").map(|v| v.count), Some(2));
        assert!(report.get("hotel").is_none());
        Ok(())
    }

    #[test]
    fn test_missing_values_rule_counts_nan() -> Result<()> {
        let df = df!(
            "adr" => [Some(75.0), Some(f64::NAN), None],
        )?;
        let report = MissingValuesRule.evaluate(&df)?;
        assert_eq!(report.get("adr").map(|v| v.count), Some(2));
        Ok(())
    }

    #[test]
    fn test_datatype_rule() -> Result<()> {
        let df = df!(
            "hotel" => ["City Hotel"],
            "agent" => [9.0],
            "adr" => [75.0],
        )?;
        let report = DatatypeRule::new(schema()).evaluate(&df)?;
        assert_eq!(report.columns().collect::<Vec<_>>(), vec!["agent"]);
        Ok(())
    }

    #[test]
    fn test_duplicates_rule_reports_surplus() -> Result<()> {
        let df = df!(
            "hotel" => ["City Hotel", "City Hotel", "City Hotel", "Resort Hotel"],
            "adr" => [98.0, 98.0, 98.0, 75.0],
        )?;
        let report = DuplicatesRule.evaluate(&df)?;
        let v = report.get(ALL_COLUMNS).expect("duplicates reported");
        assert_eq!(v.kind, ViolationKind::DuplicateRows);
        assert_eq!(v.count, 2);
        assert!(v.detail.contains("in 1 groups"), "{}", v.detail);
        Ok(())
    }

    #[test]
    fn test_domain_rule_exempts_sentinel_and_skips_mistyped() -> Result<()> {
        let fill = FillPolicy::default().with_sentinel("agent", FillValue::Integer(-99));
        let rule = DomainRule::new(schema(), fill);

        let df = df!(
            "hotel" => ["City Hotel", "Motel"],
            "agent" => [-99i64, 9],
            "adr" => ["-50.0", "75.0"],
        )?;
        let report = rule.evaluate(&df)?;
        assert_eq!(report.columns().collect::<Vec<_>>(), vec!["hotel"]);
        Ok(())
    }

    #[test]
    fn test_standard_registry_order() {
        let registry = RuleRegistry::standard(&schema(), &PipelineConfig::default());
        assert_eq!(
            registry.names(),
            vec![COLUMN_NAMES, MISSING_VALUES, DATATYPES, DUPLICATES, DOMAIN]
        );
    }

    #[test]
    fn test_evaluate_all_leaves_table_untouched() -> Result<()> {
        let df = df!(
            "hotel" => ["City Hotel", "City Hotel"],
            "agent" => [Some(9i64), None],
            "adr" => [-1.0, 75.0],
        )?;
        let before = df.clone();
        let registry = RuleRegistry::standard(&schema(), &PipelineConfig::default());
        let reports = registry.evaluate_all(&df)?;
        assert_eq!(reports.len(), 5);
        assert!(reports[0].is_clean());
        assert!(!reports[1].is_clean());
        assert!(!reports[4].is_clean());
        assert!(df.equals_missing(&before));
        Ok(())
    }
}
