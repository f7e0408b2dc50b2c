//! Threshold screening over a completed store.

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use ttm_core::{MetricField, Result, TICKER_COLUMN, TickerRecord, TtmError};

/// Minimum values a row must strictly exceed to pass the screen.
///
/// The default is a typical large-cap quality screen: positive revenue, net
/// income and free cash flow, a net margin above 5%, market cap above $5B and
/// trailing EPS above 20.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Minimum TTM total revenue.
    pub total_revenue: f64,
    /// Minimum TTM net income.
    pub net_income: f64,
    /// Minimum net income to revenue ratio.
    pub net_income_to_revenue_ratio: f64,
    /// Minimum market capitalization.
    pub market_cap: f64,
    /// Minimum free cash flow.
    pub free_cash_flow: f64,
    /// Minimum trailing EPS.
    pub eps: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.05, 5_000_000_000.0, 0.0, 20.0)
    }
}

impl Thresholds {
    /// Creates thresholds in store column order.
    #[must_use]
    pub const fn new(
        total_revenue: f64,
        net_income: f64,
        net_income_to_revenue_ratio: f64,
        market_cap: f64,
        free_cash_flow: f64,
        eps: f64,
    ) -> Self {
        Self {
            total_revenue,
            net_income,
            net_income_to_revenue_ratio,
            market_cap,
            free_cash_flow,
            eps,
        }
    }

    /// The minimum for a metric.
    #[must_use]
    pub const fn minimum(&self, field: MetricField) -> f64 {
        match field {
            MetricField::TotalRevenue => self.total_revenue,
            MetricField::NetIncome => self.net_income,
            MetricField::NetIncomeToRevenueRatio => self.net_income_to_revenue_ratio,
            MetricField::MarketCap => self.market_cap,
            MetricField::FreeCashFlow => self.free_cash_flow,
            MetricField::Eps => self.eps,
        }
    }

    /// Returns true if every metric of `record` is strictly above its minimum.
    #[must_use]
    pub fn admits(&self, record: &TickerRecord) -> bool {
        MetricField::ALL
            .into_iter()
            .all(|f| record.get(f) > self.minimum(f))
    }

    fn predicate(&self) -> Expr {
        MetricField::ALL.into_iter().fold(lit(true), |acc, field| {
            acc.and(
                col(field.column_name())
                    .cast(DataType::Float64)
                    .gt(lit(self.minimum(field))),
            )
        })
    }
}

/// Column types of a store: the ticker is text even when it looks numeric,
/// every metric is a float.
fn store_schema() -> Schema {
    std::iter::once(Field::new(TICKER_COLUMN.into(), DataType::String))
        .chain(
            MetricField::ALL
                .into_iter()
                .map(|field| Field::new(field.column_name().into(), DataType::Float64)),
        )
        .collect()
}

/// What a filter run produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterOutcome {
    /// The qualifying rows were written to the output file.
    Written {
        /// Number of rows written.
        rows: usize,
    },
    /// No row qualified; the output file was not touched.
    NoMatches,
}

/// Selects store rows that clear every [`Thresholds`] minimum.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ThresholdFilter {
    thresholds: Thresholds,
}

impl ThresholdFilter {
    /// Create a filter with the given thresholds.
    #[must_use]
    pub const fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    /// The thresholds applied by this filter.
    #[must_use]
    pub const fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Filters `input` into `output`.
    ///
    /// Rows pass when all six metrics are strictly greater than their
    /// minimums. Column order and any extra columns are kept. When nothing
    /// passes, `output` is neither created nor overwritten. A missing `input`
    /// is reported and treated as having no rows.
    ///
    /// # Errors
    /// Returns an error if `input` cannot be parsed, lacks a metric column, or
    /// `output` cannot be written.
    #[instrument(skip(self), fields(input = %input.display(), output = %output.display()))]
    pub fn apply(&self, input: &Path, output: &Path) -> Result<FilterOutcome> {
        if !input.is_file() {
            warn!("Error: File {} not found.", input.display());
            return Ok(FilterOutcome::NoMatches);
        }

        let frame = CsvReadOptions::default()
            .with_has_header(true)
            .with_schema_overwrite(Some(Arc::new(store_schema())))
            .try_into_reader_with_file_path(Some(input.to_path_buf()))
            .and_then(|reader| reader.finish())
            .map_err(|e| TtmError::Store(format!("{}: {e}", input.display())))?;

        for field in MetricField::ALL {
            if frame.column(field.column_name()).is_err() {
                return Err(TtmError::MissingColumn(field.column_name().to_string()));
            }
        }

        let mut selected = frame
            .lazy()
            .filter(self.thresholds.predicate())
            .collect()
            .map_err(|e| TtmError::Other(e.to_string()))?;

        if selected.height() == 0 {
            info!("No data met the criteria.");
            return Ok(FilterOutcome::NoMatches);
        }

        let mut file =
            File::create(output).map_err(|e| TtmError::Store(format!("{}: {e}", output.display())))?;
        CsvWriter::new(&mut file)
            .include_header(true)
            .finish(&mut selected)
            .map_err(|e| TtmError::Store(format!("{}: {e}", output.display())))?;

        let rows = selected.height();
        info!(rows, "Filtered data has been written to {}.", output.display());
        Ok(FilterOutcome::Written { rows })
    }
}
