//! Per-ticker metric resolution.
//!
//! [`MetricResolver`] decides, field by field, whether a prior value can be
//! reused or must be fetched. A ticker whose prior row is complete never opens
//! a provider handle.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::{
    aggregate::{self, NET_INCOME, TOTAL_REVENUE},
    error::Result,
    provider::{FundamentalsProvider, TickerSource},
    statement::{FieldValue, InfoMap},
    types::{MetricField, PriorRow, Symbol, TickerRecord},
};

/// Info key holding market capitalization.
pub const MARKET_CAP_KEY: &str = "marketCap";

/// Info key holding trailing EPS.
pub const TRAILING_EPS_KEY: &str = "trailingEps";

/// How a single metric got its value.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldOutcome {
    /// Taken from the prior row.
    Reused(f64),
    /// Fetched from the provider.
    Fetched(f64),
    /// Computed from other resolved metrics.
    Derived(f64),
    /// Could not be resolved; contributes `0.0`.
    Fallback(String),
}

impl FieldOutcome {
    /// The value this outcome contributes to the record.
    #[must_use]
    pub const fn value(&self) -> f64 {
        match self {
            Self::Reused(v) | Self::Fetched(v) | Self::Derived(v) => *v,
            Self::Fallback(_) => 0.0,
        }
    }

    /// Returns true if the value came from a provider lookup, including a
    /// lookup that fell back.
    #[must_use]
    pub const fn is_fresh(&self) -> bool {
        matches!(self, Self::Fetched(_) | Self::Fallback(_))
    }

    fn from_lookup<E: std::fmt::Display>(result: std::result::Result<f64, E>) -> Self {
        match result {
            Ok(v) => Self::Fetched(v),
            Err(e) => Self::Fallback(e.to_string()),
        }
    }
}

/// Result of resolving one ticker.
#[derive(Clone, Debug, PartialEq)]
pub struct Resolution {
    /// The resolved record.
    pub record: TickerRecord,
    /// Per-metric outcome, in column order.
    pub outcomes: Vec<(MetricField, FieldOutcome)>,
    /// True if a provider handle was opened.
    pub refreshed: bool,
}

impl Resolution {
    /// Returns the outcome for a metric.
    #[must_use]
    pub fn outcome(&self, field: MetricField) -> Option<&FieldOutcome> {
        self.outcomes
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, o)| o)
    }

    /// Metrics that fell back to `0.0`.
    #[must_use]
    pub fn fallbacks(&self) -> Vec<MetricField> {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, FieldOutcome::Fallback(_)))
            .map(|(f, _)| *f)
            .collect()
    }
}

/// Resolves a ticker's six metrics from a prior row and a provider.
#[derive(Debug, Clone)]
pub struct MetricResolver {
    provider: Arc<dyn FundamentalsProvider>,
}

impl MetricResolver {
    /// Create a resolver backed by the given provider.
    #[must_use]
    pub fn new(provider: Arc<dyn FundamentalsProvider>) -> Self {
        Self { provider }
    }

    /// The provider used for stale tickers.
    #[must_use]
    pub fn provider(&self) -> &Arc<dyn FundamentalsProvider> {
        &self.provider
    }

    /// Resolves a ticker into a record.
    ///
    /// # Errors
    /// Returns an error only if a provider handle cannot be opened. Missing or
    /// malformed provider data resolves to `0.0`.
    pub async fn resolve(&self, symbol: &Symbol, prior: &PriorRow) -> Result<TickerRecord> {
        Ok(self.resolve_detailed(symbol, prior).await?.record)
    }

    /// Resolves a ticker and reports how each metric was obtained.
    ///
    /// # Errors
    /// Returns an error only if a provider handle cannot be opened.
    #[instrument(skip(self, prior), fields(symbol = %symbol))]
    pub async fn resolve_detailed(&self, symbol: &Symbol, prior: &PriorRow) -> Result<Resolution> {
        if prior.is_complete() {
            info!("{symbol} is up to date.");
            let outcomes = MetricField::ALL
                .into_iter()
                .map(|f| (f, FieldOutcome::Reused(prior.get(f).unwrap_or(0.0))))
                .collect();
            return Ok(build(symbol, outcomes, false));
        }

        info!("{symbol} data is out of date. Retrieving updates now...");
        debug!(missing = ?prior.missing_fields(), provider = self.provider.name(), "Opening ticker handle");
        let source = self.provider.ticker(symbol)?;

        let revenue = match prior.get(MetricField::TotalRevenue) {
            Some(v) => FieldOutcome::Reused(v),
            None => fetch_ttm(source.as_ref(), TOTAL_REVENUE).await,
        };
        let income = match prior.get(MetricField::NetIncome) {
            Some(v) => FieldOutcome::Reused(v),
            None => fetch_ttm(source.as_ref(), NET_INCOME).await,
        };
        let derived = FieldOutcome::Derived(aggregate::ratio(income.value(), revenue.value()));
        let ratio = match prior.get(MetricField::NetIncomeToRevenueRatio) {
            Some(v) if !(revenue.is_fresh() && income.is_fresh()) => FieldOutcome::Reused(v),
            _ => derived,
        };
        let market_cap = match prior.get(MetricField::MarketCap) {
            Some(v) => FieldOutcome::Reused(v),
            None => fetch_info(source.as_ref(), MARKET_CAP_KEY).await,
        };
        let free_cash_flow = match prior.get(MetricField::FreeCashFlow) {
            Some(v) => FieldOutcome::Reused(v),
            None => fetch_free_cash_flow(source.as_ref()).await,
        };
        let eps = match prior.get(MetricField::Eps) {
            Some(v) => FieldOutcome::Reused(v),
            None => fetch_info(source.as_ref(), TRAILING_EPS_KEY).await,
        };
        if let FieldOutcome::Fetched(v) = eps {
            debug!("Trailing EPS for {symbol}: {v}");
        }

        let outcomes = vec![
            (MetricField::TotalRevenue, revenue),
            (MetricField::NetIncome, income),
            (MetricField::NetIncomeToRevenueRatio, ratio),
            (MetricField::MarketCap, market_cap),
            (MetricField::FreeCashFlow, free_cash_flow),
            (MetricField::Eps, eps),
        ];
        for (field, outcome) in &outcomes {
            if let FieldOutcome::Fallback(reason) = outcome {
                debug!(field = %field, reason = %reason, "Falling back to 0.0");
            }
        }
        Ok(build(symbol, outcomes, true))
    }
}

fn build(symbol: &Symbol, outcomes: Vec<(MetricField, FieldOutcome)>, refreshed: bool) -> Resolution {
    let record = outcomes
        .iter()
        .fold(TickerRecord::new(symbol.clone()), |record, (f, o)| {
            record.with(*f, o.value())
        });
    Resolution {
        record,
        outcomes,
        refreshed,
    }
}

async fn fetch_ttm(source: &dyn TickerSource, line_item: &str) -> FieldOutcome {
    match source.quarterly_financials().await {
        Ok(table) => FieldOutcome::from_lookup(aggregate::try_ttm_sum(&table, line_item)),
        Err(e) => FieldOutcome::Fallback(e.to_string()),
    }
}

async fn fetch_free_cash_flow(source: &dyn TickerSource) -> FieldOutcome {
    match source.cashflow().await {
        Ok(table) => FieldOutcome::from_lookup(aggregate::try_free_cash_flow(&table)),
        Err(e) => FieldOutcome::Fallback(e.to_string()),
    }
}

async fn fetch_info(source: &dyn TickerSource, key: &str) -> FieldOutcome {
    match source.info().await {
        Ok(info) => FieldOutcome::from_lookup(info_number(&info, key)),
        Err(e) => FieldOutcome::Fallback(e.to_string()),
    }
}

fn info_number(info: &InfoMap, key: &str) -> std::result::Result<f64, String> {
    match info.get(key) {
        Some(FieldValue::Number(v)) if !v.is_nan() => Ok(*v),
        Some(FieldValue::Invalid(raw)) => Err(format!("{key} is not numeric: {raw:?}")),
        Some(_) | None => Err(format!("{key} not reported")),
    }
}
