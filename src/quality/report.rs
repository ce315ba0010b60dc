//! Violation reports produced by rules.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Pseudo column used for violations that span whole rows.
pub const ALL_COLUMNS: &str = "*";

/// Category of a single violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    ColumnName,
    UnknownColumn,
    MissingColumn,
    MissingValues,
    DtypeMismatch,
    DuplicateRows,
    OutOfRange,
    NotInDomain,
    DateOutOfRange,
}

impl ViolationKind {
    /// Schema-level problems are fatal; everything else can be repaired.
    pub fn is_schema_level(self) -> bool {
        matches!(
            self,
            Self::ColumnName | Self::UnknownColumn | Self::MissingColumn
        )
    }
}

/// Why a column failed a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub kind: ViolationKind,
    /// Number of offending cells (or rows, for row-level checks)
    pub count: usize,
    pub detail: String,
}

impl Violation {
    pub fn new(kind: ViolationKind, count: usize, detail: impl Into<String>) -> Self {
        Self {
            kind,
            count,
            detail: detail.into(),
        }
    }
}

/// Outcome of evaluating one rule against a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleReport {
    pub rule: String,
    pub violations: BTreeMap<String, Violation>,
}

impl RuleReport {
    pub fn new(rule: impl Into<String>) -> Self {
        Self {
            rule: rule.into(),
            violations: BTreeMap::new(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    /// Record a violation for `column`, merging with any existing entry.
    pub fn push(&mut self, column: impl Into<String>, violation: Violation) {
        self.violations
            .entry(column.into())
            .and_modify(|existing| {
                existing.count += violation.count;
                existing.detail = format!("{}; {}", existing.detail, violation.detail);
            })
            .or_insert(violation);
    }

    pub fn get(&self, column: &str) -> Option<&Violation> {
        self.violations.get(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.violations.keys().map(String::as_str)
    }

    pub fn total_count(&self) -> usize {
        self.violations.values().map(|v| v.count).sum()
    }

    pub fn has_schema_violation(&self) -> bool {
        self.violations.values().any(|v| v.kind.is_schema_level())
    }
}

impl fmt::Display for RuleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_clean() {
            return write!(f, "{}: clean", self.rule);
        }
        write!(f, "{}: ", self.rule)?;
        let parts: Vec<String> = self
            .violations
            .iter()
            .map(|(column, v)| format!("{column} ({})", v.detail))
            .collect();
        f.write_str(&parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_merges_same_column() {
        let mut report = RuleReport::new("column_names");
        report.push(
            "arrival date",
            Violation::new(ViolationKind::ColumnName, 1, "contains whitespace"),
        );
        report.push(
            "arrival date",
            Violation::new(ViolationKind::UnknownColumn, 1, "not declared in schema"),
        );

        assert_eq!(report.violations.len(), 1);
        let v = report.get("arrival date").expect("merged violation");
        assert_eq!(v.count, 2);
        assert_eq!(v.detail, "contains whitespace; not declared in schema");
        assert!(report.has_schema_violation());
    }

    #[test]
    fn test_display() {
        let mut report = RuleReport::new("missing_values");
        assert_eq!(report.to_string(), "missing_values: clean");

        report.push(
            "company",
            Violation::new(ViolationKind::MissingValues, 94, "94 missing values"),
        );
        report.push(
            "agent",
            Violation::new(ViolationKind::MissingValues, 14, "14 missing values"),
        );
        assert_eq!(
            report.to_string(),
            "missing_values: agent (14 missing values), company (94 missing values)"
        );
        assert_eq!(report.total_count(), 108);
        assert!(!report.has_schema_violation());
    }
}
