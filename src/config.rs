//! Pipeline policies and connection settings.
//!
//! Everything a repair needs to decide *how* to fix a table lives here
//! rather than in the repairs themselves: which columns get a sentinel
//! instead of losing rows, which categorical aliases map to which canonical
//! value, which numeric columns are clamped into range.

use crate::error::{Result, ResultExt as _, ScourError};
use polars::prelude::{DataType, Expr, lit};
use secrecy::{ExposeSecret as _, SecretString};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

pub const DEFAULT_MAX_ITERATIONS: usize = 10;

/// Placeholder written into a cell that is intentionally missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FillValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl FillValue {
    /// Literal expression for filling a column of the given dtype.
    ///
    /// String columns receive the textual form so the fill never changes the
    /// column's dtype; the datatype rule decides later whether it coerces.
    pub fn literal_for(&self, dtype: &DataType) -> Expr {
        if *dtype == DataType::String {
            return lit(self.to_string());
        }
        match self {
            Self::Integer(v) => lit(*v),
            Self::Float(v) => lit(*v),
            Self::Text(v) => lit(v.clone()),
        }
    }

    /// Whether a numeric cell holds this sentinel.
    pub fn matches_number(&self, value: f64) -> bool {
        match self {
            Self::Integer(v) => (*v as f64 - value).abs() < f64::EPSILON,
            Self::Float(v) => (*v - value).abs() < f64::EPSILON,
            Self::Text(v) => v.parse::<f64>().is_ok_and(|s| (s - value).abs() < f64::EPSILON),
        }
    }

    /// Whether a text cell holds this sentinel.
    pub fn matches_text(&self, value: &str) -> bool {
        self.to_string() == value
    }
}

impl std::fmt::Display for FillValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
        }
    }
}

/// Which columns are filled with a sentinel instead of dropping rows.
///
/// This is a domain decision made per dataset (a column that is mostly
/// empty carries information in its emptiness); it is never inferred.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FillPolicy {
    #[serde(default)]
    pub sentinels: BTreeMap<String, FillValue>,
}

impl FillPolicy {
    pub fn with_sentinel(mut self, column: impl Into<String>, value: FillValue) -> Self {
        self.sentinels.insert(column.into(), value);
        self
    }

    pub fn sentinel(&self, column: &str) -> Option<&FillValue> {
        self.sentinels.get(column)
    }
}

/// Deterministic corrections applied before rows are dropped for domain
/// violations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrectionPolicy {
    /// column -> (alias -> canonical value)
    #[serde(default)]
    pub aliases: BTreeMap<String, BTreeMap<String, String>>,

    /// Numeric columns whose out-of-range values are clamped into range.
    #[serde(default)]
    pub clamp: BTreeSet<String>,
}

impl CorrectionPolicy {
    pub fn with_alias(
        mut self,
        column: impl Into<String>,
        alias: impl Into<String>,
        canonical: impl Into<String>,
    ) -> Self {
        self.aliases
            .entry(column.into())
            .or_default()
            .insert(alias.into(), canonical.into());
        self
    }

    pub fn with_clamp(mut self, column: impl Into<String>) -> Self {
        self.clamp.insert(column.into());
        self
    }

    pub fn aliases_for(&self, column: &str) -> Option<&BTreeMap<String, String>> {
        self.aliases.get(column)
    }

    pub fn clamps(&self, column: &str) -> bool {
        self.clamp.contains(column)
    }
}

/// Full policy set for one validation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub fill: FillPolicy,

    #[serde(default)]
    pub corrections: CorrectionPolicy,

    /// Upper bound on validate/repair passes before giving up
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Tokens read as null when loading delimited files
    #[serde(default = "default_null_values")]
    pub null_values: Vec<String>,

    /// `chrono` formats tried, in order, when coercing text to dates
    #[serde(default = "default_date_formats")]
    pub date_formats: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fill: FillPolicy::default(),
            corrections: CorrectionPolicy::default(),
            max_iterations: default_max_iterations(),
            null_values: default_null_values(),
            date_formats: default_date_formats(),
        }
    }
}

impl PipelineConfig {
    /// Policies for the hotel bookings dataset.
    ///
    /// `company` is ~94% empty and `agent` ~14%; both keep their rows and
    /// take the numeric sentinel `-99`.
    pub fn hotel_bookings() -> Self {
        Self {
            fill: FillPolicy::default()
                .with_sentinel("company", FillValue::Integer(-99))
                .with_sentinel("agent", FillValue::Integer(-99)),
            corrections: CorrectionPolicy::default()
                .with_alias("country", "CN", "CHN")
                .with_clamp("adr"),
            ..Self::default()
        }
    }

    /// Load a pipeline config from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        if config.max_iterations == 0 {
            return Err(ScourError::Config(
                "max_iterations must be at least 1".to_owned(),
            ));
        }
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn default_max_iterations() -> usize {
    DEFAULT_MAX_ITERATIONS
}

fn default_null_values() -> Vec<String> {
    vec!["NA".to_owned(), "NULL".to_owned()]
}

fn default_date_formats() -> Vec<String> {
    vec!["%Y-%m-%d".to_owned()]
}

/// Connection parameters for the relational sink.
#[derive(Debug, Clone)]
pub struct DbSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: SecretString,
    pub database: String,
    pub schema: String,
    pub table: String,
}

impl Default for DbSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_owned(),
            port: 5432,
            user: "postgres".to_owned(),
            password: SecretString::new(String::new().into()),
            database: "postgres".to_owned(),
            schema: "public".to_owned(),
            table: "hotel_bookings".to_owned(),
        }
    }
}

impl DbSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user,
            self.password.expose_secret(),
            self.host,
            self.port,
            self.database
        )
    }

    /// Connection string safe for logs.
    pub fn redacted(&self) -> String {
        format!(
            "postgres://{}:***@{}:{}/{}",
            self.user, self.host, self.port, self.database
        )
    }
}
