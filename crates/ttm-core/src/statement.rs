//! Statement tables returned by fundamentals providers.
//!
//! - [`StatementTable`] - line item name to [`PeriodSeries`]
//! - [`PeriodSeries`] - per-period values, most recent first
//! - [`InfoMap`] - descriptive key/value info (market cap, trailing EPS, ...)

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::period::PeriodType;

/// A single cell reported by a provider.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    /// A numeric value.
    Number(f64),
    /// No value reported for this period.
    Missing,
    /// A value that is present but not numeric.
    Invalid(String),
}

impl FieldValue {
    /// Returns the number, if this is a non-NaN numeric value.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(v) if !v.is_nan() => Some(*v),
            _ => None,
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        if value.is_nan() {
            Self::Missing
        } else {
            Self::Number(value)
        }
    }
}

impl From<Option<f64>> for FieldValue {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Self::Missing, Self::from)
    }
}

/// A value for one reporting period.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PeriodValue {
    /// End date of the reporting period.
    pub period_end: NaiveDate,
    /// The reported value.
    pub value: FieldValue,
}

/// Values of a single line item across reporting periods.
///
/// Providers return periods most recent first. The order is kept as given:
/// consumers take leading entries without re-sorting.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodSeries {
    points: Vec<PeriodValue>,
}

impl PeriodSeries {
    /// Creates an empty series.
    #[must_use]
    pub const fn new() -> Self {
        Self { points: Vec::new() }
    }

    /// Creates a series from points already in descending recency order.
    #[must_use]
    pub const fn from_points(points: Vec<PeriodValue>) -> Self {
        Self { points }
    }

    /// Appends a point after the existing ones.
    pub fn push(&mut self, period_end: NaiveDate, value: impl Into<FieldValue>) {
        self.points.push(PeriodValue {
            period_end,
            value: value.into(),
        });
    }

    /// Returns the number of periods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns true if there are no periods.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Returns an iterator over the periods in stored order.
    pub fn iter(&self) -> impl Iterator<Item = &PeriodValue> {
        self.points.iter()
    }

    /// Returns the first (most recent) period.
    #[must_use]
    pub fn first(&self) -> Option<&PeriodValue> {
        self.points.first()
    }
}

impl FromIterator<PeriodValue> for PeriodSeries {
    fn from_iter<I: IntoIterator<Item = PeriodValue>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}

/// A financial statement keyed by line item name (e.g. "Total Revenue").
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StatementTable {
    /// Reporting period of every series in the table.
    pub period_type: PeriodType,
    line_items: HashMap<String, PeriodSeries>,
}

impl StatementTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new(period_type: PeriodType) -> Self {
        Self {
            period_type,
            line_items: HashMap::new(),
        }
    }

    /// Adds or replaces a line item.
    pub fn insert(&mut self, name: impl Into<String>, series: PeriodSeries) {
        self.line_items.insert(name.into(), series);
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with_line_item(mut self, name: impl Into<String>, series: PeriodSeries) -> Self {
        self.insert(name, series);
        self
    }

    /// Returns the series for a line item.
    #[must_use]
    pub fn line_item(&self, name: &str) -> Option<&PeriodSeries> {
        self.line_items.get(name)
    }

    /// Returns true if the table has no line items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.line_items.is_empty()
    }
}

/// Descriptive info about a ticker (Yahoo's `info` mapping).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InfoMap {
    values: HashMap<String, FieldValue>,
}

impl InfoMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a value, keeping the first one when the key is already present.
    pub fn insert_if_absent(&mut self, key: impl Into<String>, value: FieldValue) {
        self.values.entry(key.into()).or_insert(value);
    }

    /// Builder-style insert that overwrites existing values.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Returns the value for a key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.values.get(key)
    }

    /// Returns the number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if there are no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
