//! Declarative column expectations.
//!
//! A [`Schema`] lists every column a table is expected to carry, the
//! semantic type of its values and an optional domain (numeric bounds, a
//! fixed categorical set or a date window). Rules and repairs read their
//! expectations from here instead of hard-coding them per dataset.
//!
//! Schemas round-trip through JSON:
//!
//! ```json
//! {
//!   "columns": [
//!     { "name": "adr", "kind": "float", "domain": { "rule": "range", "min": 0.0 } },
//!     { "name": "meal", "kind": "categorical",
//!       "domain": { "rule": "one_of", "values": ["BB", "FB", "HB", "SC", "Undefined"] } }
//!   ]
//! }
//! ```

mod countries;

use crate::error::{Result, ResultExt as _};
use chrono::NaiveDate;
use polars::prelude::DataType;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub use countries::ISO_ALPHA3;

/// Semantic type of a column's values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SemanticType {
    Integer,
    Float,
    Categorical,
    Text,
    Date,
}

impl SemanticType {
    /// Physical polars dtype a clean column of this type carries.
    pub fn dtype(self) -> DataType {
        match self {
            Self::Integer => DataType::Int64,
            Self::Float => DataType::Float64,
            Self::Categorical | Self::Text => DataType::String,
            Self::Date => DataType::Date,
        }
    }

    pub fn matches(self, dtype: &DataType) -> bool {
        *dtype == self.dtype()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Categorical => "categorical",
            Self::Text => "text",
            Self::Date => "date",
        }
    }
}

impl std::fmt::Display for SemanticType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Business-rule domain of a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum Domain {
    /// Inclusive numeric bounds. Either side may be open.
    Range {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },

    /// Fixed set of allowed categorical values.
    OneOf { values: Vec<String> },

    /// Inclusive date window.
    DateRange { min: NaiveDate, max: NaiveDate },
}

impl Domain {
    pub fn describe(&self) -> String {
        match self {
            Self::Range { min, max } => {
                let lo = min.map_or_else(|| "-inf".to_owned(), |v| v.to_string());
                let hi = max.map_or_else(|| "+inf".to_owned(), |v| v.to_string());
                format!("[{lo}, {hi}]")
            }
            Self::OneOf { values } => format!("one of {} values", values.len()),
            Self::DateRange { min, max } => format!("[{min}, {max}]"),
        }
    }
}

/// Expectations for a single column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub kind: SemanticType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<Domain>,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, kind: SemanticType) -> Self {
        Self {
            name: name.into(),
            kind,
            domain: None,
        }
    }

    pub fn range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.domain = Some(Domain::Range { min, max });
        self
    }

    pub fn at_least(self, min: f64) -> Self {
        self.range(Some(min), None)
    }

    pub fn between(self, min: f64, max: f64) -> Self {
        self.range(Some(min), Some(max))
    }

    pub fn one_of<S: AsRef<str>>(mut self, values: &[S]) -> Self {
        self.domain = Some(Domain::OneOf {
            values: values.iter().map(|v| v.as_ref().to_owned()).collect(),
        });
        self
    }

    pub fn dated_between(mut self, min: NaiveDate, max: NaiveDate) -> Self {
        self.domain = Some(Domain::DateRange { min, max });
        self
    }
}

/// Ordered set of column expectations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub columns: Vec<ColumnSpec>,
}

impl Schema {
    pub fn new(columns: Vec<ColumnSpec>) -> Self {
        Self { columns }
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Load a schema from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read schema file {}", path.display()))?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Expectations for the hotel bookings dataset.
    ///
    /// `agent` and `company` are integer identifiers where `-1` is the
    /// lowest real value; the missing-value sentinel sits outside that range
    /// and is exempted by the domain rule.
    pub fn hotel_bookings() -> Self {
        use SemanticType::{Categorical, Date, Float, Integer};

        const MONTHS: [&str; 12] = [
            "January",
            "February",
            "March",
            "April",
            "May",
            "June",
            "July",
            "August",
            "September",
            "October",
            "November",
            "December",
        ];
        const ROOM_TYPES: [&str; 26] = [
            "A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "K", "L", "M", "N", "O", "P", "Q",
            "R", "S", "T", "U", "V", "W", "X", "Y", "Z",
        ];

        let mut countries: Vec<&str> = ISO_ALPHA3.to_vec();
        countries.push("TMP");

        let (first_day, last_day) = reservation_window();

        Self::new(vec![
            ColumnSpec::new("hotel", Categorical).one_of(&["Resort Hotel", "City Hotel"]),
            ColumnSpec::new("is_canceled", Integer).between(0.0, 1.0),
            ColumnSpec::new("lead_time", Float).at_least(0.0),
            ColumnSpec::new("arrival_date_year", Integer).between(2000.0, 2025.0),
            ColumnSpec::new("arrival_date_month", Categorical).one_of(&MONTHS),
            ColumnSpec::new("arrival_date_week_number", Integer).between(1.0, 53.0),
            ColumnSpec::new("arrival_date_day_of_month", Integer).between(1.0, 31.0),
            ColumnSpec::new("stays_in_weekend_nights", Integer).at_least(0.0),
            ColumnSpec::new("stays_in_week_nights", Integer).between(0.0, 1000.0),
            ColumnSpec::new("adults", Integer).at_least(0.0),
            ColumnSpec::new("children", Integer).at_least(0.0),
            ColumnSpec::new("babies", Integer).at_least(0.0),
            ColumnSpec::new("meal", Categorical).one_of(&["BB", "FB", "HB", "SC", "Undefined"]),
            ColumnSpec::new("country", Categorical).one_of(countries.as_slice()),
            ColumnSpec::new("market_segment", Categorical).one_of(&[
                "Direct",
                "Corporate",
                "Online TA",
                "Offline TA/TO",
                "Complementary",
                "Groups",
                "Aviation",
            ]),
            ColumnSpec::new("distribution_channel", Categorical).one_of(&[
                "Direct",
                "Corporate",
                "TA/TO",
                "Undefined",
                "GDS",
            ]),
            ColumnSpec::new("is_repeated_guest", Integer).between(0.0, 1.0),
            ColumnSpec::new("previous_cancellations", Integer).at_least(0.0),
            ColumnSpec::new("previous_bookings_not_canceled", Integer).at_least(0.0),
            ColumnSpec::new("reserved_room_type", Categorical).one_of(&ROOM_TYPES),
            ColumnSpec::new("assigned_room_type", Categorical).one_of(&ROOM_TYPES),
            ColumnSpec::new("booking_changes", Integer).at_least(0.0),
            ColumnSpec::new("deposit_type", Categorical).one_of(&[
                "No Deposit",
                "Non Refund",
                "Refundable",
            ]),
            ColumnSpec::new("agent", Integer).at_least(-1.0),
            ColumnSpec::new("company", Integer).at_least(-1.0),
            ColumnSpec::new("days_in_waiting_list", Float).at_least(0.0),
            ColumnSpec::new("customer_type", Categorical).one_of(&[
                "Contract",
                "Group",
                "Transient",
                "Transient-Party",
            ]),
            ColumnSpec::new("adr", Float).at_least(0.0),
            ColumnSpec::new("required_car_parking_spaces", Integer).at_least(0.0),
            ColumnSpec::new("total_of_special_requests", Integer).at_least(0.0),
            ColumnSpec::new("reservation_status", Categorical).one_of(&[
                "Canceled",
                "Check-Out",
                "No-Show",
            ]),
            ColumnSpec::new("reservation_status_date", Date).dated_between(first_day, last_day),
        ])
    }
}

fn reservation_window() -> (NaiveDate, NaiveDate) {
    let first = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or_default();
    let last = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or_default();
    (first, last)
}
