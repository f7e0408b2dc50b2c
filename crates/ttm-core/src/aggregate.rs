//! Trailing-twelve-month aggregation over statement tables.
//!
//! The `try_*` functions report why a value could not be computed; the plain
//! variants collapse any failure to `0.0`.

use thiserror::Error;

use crate::statement::{FieldValue, StatementTable};

/// Line item summed for TTM revenue.
pub const TOTAL_REVENUE: &str = "Total Revenue";

/// Line item summed for TTM net income.
pub const NET_INCOME: &str = "Net Income";

/// Line item read from the cash-flow statement.
pub const FREE_CASH_FLOW: &str = "Free Cash Flow";

/// Number of leading quarters that make up a TTM sum.
pub const TTM_QUARTERS: usize = 4;

/// Why an aggregate fell back to its default.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AggregateError {
    /// The table has no line items at all.
    #[error("statement table is empty")]
    EmptyTable,

    /// The requested line item is not in the table.
    #[error("line item {0:?} not found")]
    MissingLineItem(String),

    /// The line item exists but has no periods.
    #[error("line item {0:?} has no periods")]
    EmptySeries(String),

    /// A period holds a non-numeric value.
    #[error("line item {line_item:?} has non-numeric value {value:?}")]
    TypeMismatch {
        /// Line item with the bad value.
        line_item: String,
        /// The offending raw value.
        value: String,
    },

    /// The most recent period has no value.
    #[error("line item {0:?} has no value for its latest period")]
    MissingValue(String),
}

/// Sums the first [`TTM_QUARTERS`] periods of a line item.
///
/// Periods are taken in the table's existing order. Periods without a value
/// are skipped; a non-numeric value fails the whole sum.
///
/// # Errors
/// Returns an [`AggregateError`] if the table is empty, the line item is absent,
/// or one of the leading periods is not numeric.
pub fn try_ttm_sum(table: &StatementTable, line_item: &str) -> Result<f64, AggregateError> {
    if table.is_empty() {
        return Err(AggregateError::EmptyTable);
    }
    let series = table
        .line_item(line_item)
        .ok_or_else(|| AggregateError::MissingLineItem(line_item.to_string()))?;

    series
        .iter()
        .take(TTM_QUARTERS)
        .try_fold(0.0, |sum, point| match &point.value {
            FieldValue::Number(v) if !v.is_nan() => Ok(sum + v),
            FieldValue::Number(_) | FieldValue::Missing => Ok(sum),
            FieldValue::Invalid(raw) => Err(AggregateError::TypeMismatch {
                line_item: line_item.to_string(),
                value: raw.clone(),
            }),
        })
}

/// TTM sum of a line item, or `0.0` if it cannot be computed.
#[must_use]
pub fn ttm_sum(table: &StatementTable, line_item: &str) -> f64 {
    try_ttm_sum(table, line_item).unwrap_or(0.0)
}

/// Net income over total revenue, `0.0` when revenue is zero.
#[must_use]
pub fn ratio(net_income: f64, total_revenue: f64) -> f64 {
    if total_revenue == 0.0 {
        return 0.0;
    }
    net_income / total_revenue
}

/// Most recent value of the "Free Cash Flow" line item.
///
/// # Errors
/// Returns an [`AggregateError`] if the table is empty, the row is absent, or
/// its latest period is missing or non-numeric.
pub fn try_free_cash_flow(table: &StatementTable) -> Result<f64, AggregateError> {
    if table.is_empty() {
        return Err(AggregateError::EmptyTable);
    }
    let series = table
        .line_item(FREE_CASH_FLOW)
        .ok_or_else(|| AggregateError::MissingLineItem(FREE_CASH_FLOW.to_string()))?;
    let latest = series
        .first()
        .ok_or_else(|| AggregateError::EmptySeries(FREE_CASH_FLOW.to_string()))?;

    match &latest.value {
        FieldValue::Number(v) if !v.is_nan() => Ok(*v),
        FieldValue::Number(_) | FieldValue::Missing => {
            Err(AggregateError::MissingValue(FREE_CASH_FLOW.to_string()))
        }
        FieldValue::Invalid(raw) => Err(AggregateError::TypeMismatch {
            line_item: FREE_CASH_FLOW.to_string(),
            value: raw.clone(),
        }),
    }
}

/// Latest free cash flow, or `0.0` if it cannot be read.
#[must_use]
pub fn free_cash_flow(table: &StatementTable) -> f64 {
    try_free_cash_flow(table).unwrap_or(0.0)
}
