//! Provider traits for fetching fundamentals.
//!
//! This module defines the core provider traits:
//!
//! - [`DataProvider`] - Base trait for all data providers
//! - [`FundamentalsProvider`] - Factory that opens a [`TickerSource`] per symbol
//! - [`TickerSource`] - Per-ticker handle exposing statements and info
//!
//! Opening a handle is an explicit call so callers can skip it entirely when
//! nothing needs fetching.

use async_trait::async_trait;
use std::fmt::Debug;

use crate::{
    error::Result,
    statement::{InfoMap, StatementTable},
    types::Symbol,
};

/// Base trait for all data providers.
pub trait DataProvider: Send + Sync + Debug {
    /// Returns the name of this provider (e.g., "Yahoo Finance").
    fn name(&self) -> &str;

    /// Returns a description of this provider.
    fn description(&self) -> &str;
}

/// Per-ticker handle onto a provider.
///
/// Each lookup may fail independently; callers decide how to degrade.
#[async_trait]
pub trait TickerSource: Send + Sync {
    /// The symbol this handle was opened for.
    fn symbol(&self) -> &Symbol;

    /// Quarterly income statement, periods most recent first.
    async fn quarterly_financials(&self) -> Result<StatementTable>;

    /// Cash-flow statement, periods most recent first.
    async fn cashflow(&self) -> Result<StatementTable>;

    /// Descriptive info such as `marketCap` and `trailingEps`.
    async fn info(&self) -> Result<InfoMap>;
}

/// Provider of fundamental data for individual tickers.
///
/// Implement this trait to plug a data source into the resolver.
pub trait FundamentalsProvider: DataProvider {
    /// Opens a handle for a symbol.
    ///
    /// Implementations should not perform network access here; lookups happen
    /// lazily on the returned handle.
    fn ticker(&self, symbol: &Symbol) -> Result<Box<dyn TickerSource>>;
}
