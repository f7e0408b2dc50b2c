//! Core data types for TTM fundamentals.
//!
//! This module defines the fundamental data structures:
//!
//! - [`Symbol`] - Trading symbol/ticker
//! - [`MetricField`] - The six persisted metrics and their column names
//! - [`TickerRecord`] - One row of the fundamentals store
//! - [`PriorRow`] - Previously known metric values for a ticker
//! - [`RawRecord`] - An untyped CSV row keyed by column name

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Column holding the ticker symbol.
pub const TICKER_COLUMN: &str = "Ticker";

/// Canonical store header: `Ticker` followed by the six metric columns.
pub const STORE_HEADER: [&str; 7] = [
    TICKER_COLUMN,
    "Total Revenue",
    "Net Income",
    "Net income to total revenue ratio",
    "Market Cap",
    "Free Cash Flow",
    "EPS",
];

/// An untyped CSV row: column name to raw cell text.
pub type RawRecord = HashMap<String, String>;

/// A trading symbol/ticker.
///
/// Symbols are trimmed and uppercased on creation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    /// Creates a new symbol from a string, converting to uppercase.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into().trim().to_uppercase())
    }

    /// Returns the symbol as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the symbol is blank.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Symbol {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.0
    }
}

/// One of the six numeric metrics persisted per ticker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetricField {
    /// TTM total revenue.
    TotalRevenue,
    /// TTM net income.
    NetIncome,
    /// Net income divided by total revenue.
    NetIncomeToRevenueRatio,
    /// Market capitalization.
    MarketCap,
    /// Most recent annual free cash flow.
    FreeCashFlow,
    /// Trailing earnings per share.
    Eps,
}

impl MetricField {
    /// All metrics in store column order.
    pub const ALL: [Self; 6] = [
        Self::TotalRevenue,
        Self::NetIncome,
        Self::NetIncomeToRevenueRatio,
        Self::MarketCap,
        Self::FreeCashFlow,
        Self::Eps,
    ];

    /// The CSV column name for this metric.
    #[must_use]
    pub const fn column_name(&self) -> &'static str {
        STORE_HEADER[self.index() + 1]
    }

    /// Position of this metric among the six numeric columns.
    #[must_use]
    pub const fn index(&self) -> usize {
        match self {
            Self::TotalRevenue => 0,
            Self::NetIncome => 1,
            Self::NetIncomeToRevenueRatio => 2,
            Self::MarketCap => 3,
            Self::FreeCashFlow => 4,
            Self::Eps => 5,
        }
    }

    /// Looks up a metric by its exact column name.
    #[must_use]
    pub fn from_column(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.column_name() == name)
    }
}

impl fmt::Display for MetricField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

/// One row of the fundamentals store.
///
/// Field order and serde names match [`STORE_HEADER`], so a record serializes
/// straight into a store row.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TickerRecord {
    /// Ticker symbol.
    #[serde(rename = "Ticker")]
    pub ticker: Symbol,
    /// TTM total revenue.
    #[serde(rename = "Total Revenue")]
    pub total_revenue: f64,
    /// TTM net income.
    #[serde(rename = "Net Income")]
    pub net_income: f64,
    /// Net income divided by total revenue, `0.0` when revenue is zero.
    #[serde(rename = "Net income to total revenue ratio")]
    pub net_income_to_revenue_ratio: f64,
    /// Market capitalization.
    #[serde(rename = "Market Cap")]
    pub market_cap: f64,
    /// Most recent annual free cash flow.
    #[serde(rename = "Free Cash Flow")]
    pub free_cash_flow: f64,
    /// Trailing earnings per share.
    #[serde(rename = "EPS")]
    pub eps: f64,
}

impl TickerRecord {
    /// Creates a record with every metric set to `0.0`.
    #[must_use]
    pub fn new(ticker: Symbol) -> Self {
        Self {
            ticker,
            ..Default::default()
        }
    }

    /// Returns the value of a metric.
    #[must_use]
    pub const fn get(&self, field: MetricField) -> f64 {
        match field {
            MetricField::TotalRevenue => self.total_revenue,
            MetricField::NetIncome => self.net_income,
            MetricField::NetIncomeToRevenueRatio => self.net_income_to_revenue_ratio,
            MetricField::MarketCap => self.market_cap,
            MetricField::FreeCashFlow => self.free_cash_flow,
            MetricField::Eps => self.eps,
        }
    }

    /// Sets the value of a metric.
    pub fn set(&mut self, field: MetricField, value: f64) {
        let slot = match field {
            MetricField::TotalRevenue => &mut self.total_revenue,
            MetricField::NetIncome => &mut self.net_income,
            MetricField::NetIncomeToRevenueRatio => &mut self.net_income_to_revenue_ratio,
            MetricField::MarketCap => &mut self.market_cap,
            MetricField::FreeCashFlow => &mut self.free_cash_flow,
            MetricField::Eps => &mut self.eps,
        };
        *slot = value;
    }

    /// Builder-style [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, field: MetricField, value: f64) -> Self {
        self.set(field, value);
        self
    }

    /// Builds a record from an untyped row.
    ///
    /// Returns `None` when the row has no ticker. Metrics that are missing or
    /// unparsable become `0.0`.
    #[must_use]
    pub fn from_raw(raw: &RawRecord) -> Option<Self> {
        let ticker = Symbol::new(raw.get(TICKER_COLUMN)?.as_str());
        if ticker.is_empty() {
            return None;
        }
        let prior = PriorRow::from_raw(raw);
        let mut record = Self::new(ticker);
        for field in MetricField::ALL {
            record.set(field, prior.get(field).unwrap_or(0.0));
        }
        Some(record)
    }
}

/// Metric values already known for a ticker from an earlier snapshot.
///
/// A value is known only when it is present, non-empty and parses to a
/// non-NaN number. Anything else counts as absent and will be fetched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PriorRow {
    values: [Option<f64>; 6],
}

impl PriorRow {
    /// A prior row with nothing known.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Extracts the known metrics from an untyped row.
    #[must_use]
    pub fn from_raw(raw: &RawRecord) -> Self {
        let mut prior = Self::empty();
        for field in MetricField::ALL {
            prior.values[field.index()] = raw.get(field.column_name()).and_then(|v| parse_known(v));
        }
        prior
    }

    /// Records a known value. NaN is treated as absent.
    #[must_use]
    pub fn with(mut self, field: MetricField, value: f64) -> Self {
        self.values[field.index()] = (!value.is_nan()).then_some(value);
        self
    }

    /// Returns the known value for a metric, if any.
    #[must_use]
    pub const fn get(&self, field: MetricField) -> Option<f64> {
        self.values[field.index()]
    }

    /// Returns true if all six metrics are known.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.values.iter().all(Option::is_some)
    }

    /// Metrics that still need to be fetched, in column order.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<MetricField> {
        MetricField::ALL
            .into_iter()
            .filter(|f| self.get(*f).is_none())
            .collect()
    }
}

impl From<&TickerRecord> for PriorRow {
    fn from(record: &TickerRecord) -> Self {
        MetricField::ALL
            .into_iter()
            .fold(Self::empty(), |prior, f| prior.with(f, record.get(f)))
    }
}

fn parse_known(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    raw.parse::<f64>().ok().filter(|v| !v.is_nan())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(pairs: &[(&str, &str)]) -> RawRecord {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_symbol_normalized() {
        assert_eq!(Symbol::new(" aapl ").as_str(), "AAPL");
        assert!(Symbol::new("   ").is_empty());
    }

    #[test]
    fn test_column_names_follow_header() {
        let names: Vec<_> = MetricField::ALL.iter().map(|f| f.column_name()).collect();
        assert_eq!(names, STORE_HEADER[1..]);
        assert_eq!(
            MetricField::from_column("Net income to total revenue ratio"),
            Some(MetricField::NetIncomeToRevenueRatio)
        );
        assert_eq!(MetricField::from_column("Net income"), None);
    }

    #[test]
    fn test_prior_row_known_values() {
        let prior = PriorRow::from_raw(&raw(&[
            ("Ticker", "MSFT"),
            ("Total Revenue", "100.5"),
            ("Net Income", ""),
            ("Market Cap", "NaN"),
            ("EPS", "abc"),
            ("Free Cash Flow", " 12 "),
        ]));

        assert_eq!(prior.get(MetricField::TotalRevenue), Some(100.5));
        assert_eq!(prior.get(MetricField::FreeCashFlow), Some(12.0));
        assert_eq!(prior.get(MetricField::NetIncome), None);
        assert_eq!(prior.get(MetricField::MarketCap), None);
        assert_eq!(prior.get(MetricField::Eps), None);
        assert!(!prior.is_complete());
        assert_eq!(
            prior.missing_fields(),
            vec![
                MetricField::NetIncome,
                MetricField::NetIncomeToRevenueRatio,
                MetricField::MarketCap,
                MetricField::Eps,
            ]
        );
    }

    #[test]
    fn test_record_from_raw() {
        let record = TickerRecord::from_raw(&raw(&[
            ("Ticker", "ko"),
            ("Total Revenue", "10"),
            ("EPS", "2.5"),
        ]))
        .unwrap();

        assert_eq!(record.ticker, Symbol::new("KO"));
        assert_eq!(record.total_revenue, 10.0);
        assert_eq!(record.eps, 2.5);
        assert_eq!(record.market_cap, 0.0);

        assert!(TickerRecord::from_raw(&raw(&[("Ticker", " ")])).is_none());
        assert!(TickerRecord::from_raw(&raw(&[("EPS", "1")])).is_none());
    }

    #[test]
    fn test_prior_row_from_record_is_complete() {
        let record = TickerRecord::new(Symbol::new("T")).with(MetricField::Eps, 1.5);
        let prior = PriorRow::from(&record);
        assert!(prior.is_complete());
        assert_eq!(prior.get(MetricField::Eps), Some(1.5));
    }
}
