//! In-memory provider implementation.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

use crate::{
    error::{Result, TtmError},
    provider::{DataProvider, FundamentalsProvider, TickerSource},
    statement::{InfoMap, StatementTable},
    types::Symbol,
};

/// Canned provider responses for one ticker.
///
/// Lookups left unset fail with [`TtmError::DataNotAvailable`].
#[derive(Clone, Debug, Default)]
pub struct TickerFixture {
    quarterly: Option<StatementTable>,
    cashflow: Option<StatementTable>,
    info: Option<InfoMap>,
}

impl TickerFixture {
    /// Creates a fixture with no data.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the quarterly income statement.
    #[must_use]
    pub fn with_quarterly(mut self, table: StatementTable) -> Self {
        self.quarterly = Some(table);
        self
    }

    /// Sets the cash-flow statement.
    #[must_use]
    pub fn with_cashflow(mut self, table: StatementTable) -> Self {
        self.cashflow = Some(table);
        self
    }

    /// Sets the descriptive info.
    #[must_use]
    pub fn with_info(mut self, info: InfoMap) -> Self {
        self.info = Some(info);
        self
    }
}

/// Simple in-memory provider for testing and development.
///
/// Serves [`TickerFixture`]s by symbol and counts how many handles were opened
/// and how many lookups were made, so callers can assert that no fetch
/// happened. Unknown symbols open fine but every lookup fails with
/// [`TtmError::SymbolNotFound`]; symbols registered with
/// [`with_failure`](Self::with_failure) fail when the handle is opened.
#[derive(Debug, Default)]
pub struct InMemoryProvider {
    fixtures: HashMap<Symbol, TickerFixture>,
    failing: HashSet<Symbol>,
    handles_opened: AtomicUsize,
    fetch_calls: Arc<AtomicUsize>,
}

impl InMemoryProvider {
    /// Create a new provider with no fixtures.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers canned data for a symbol.
    #[must_use]
    pub fn with_fixture(mut self, symbol: impl Into<Symbol>, fixture: TickerFixture) -> Self {
        self.fixtures.insert(symbol.into(), fixture);
        self
    }

    /// Makes opening a handle for `symbol` fail.
    #[must_use]
    pub fn with_failure(mut self, symbol: impl Into<Symbol>) -> Self {
        self.failing.insert(symbol.into());
        self
    }

    /// Number of handles opened so far.
    #[must_use]
    pub fn handles_opened(&self) -> usize {
        self.handles_opened.load(Ordering::SeqCst)
    }

    /// Number of lookups made through any handle so far.
    #[must_use]
    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }
}

impl DataProvider for InMemoryProvider {
    fn name(&self) -> &str {
        "In-Memory"
    }

    fn description(&self) -> &str {
        "Fixture-backed provider for tests and development"
    }
}

impl FundamentalsProvider for InMemoryProvider {
    fn ticker(&self, symbol: &Symbol) -> Result<Box<dyn TickerSource>> {
        self.handles_opened.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(symbol) {
            return Err(TtmError::Other(format!("Failed to open handle for {symbol}")));
        }
        debug!(symbol = %symbol, known = self.fixtures.contains_key(symbol), "Opening in-memory handle");
        Ok(Box::new(InMemoryTicker {
            symbol: symbol.clone(),
            fixture: self.fixtures.get(symbol).cloned(),
            fetch_calls: Arc::clone(&self.fetch_calls),
        }))
    }
}

struct InMemoryTicker {
    symbol: Symbol,
    fixture: Option<TickerFixture>,
    fetch_calls: Arc<AtomicUsize>,
}

impl InMemoryTicker {
    fn lookup<T: Clone>(
        &self,
        kind: &str,
        select: impl Fn(&TickerFixture) -> &Option<T>,
    ) -> Result<T> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let fixture = self
            .fixture
            .as_ref()
            .ok_or_else(|| TtmError::SymbolNotFound(self.symbol.to_string()))?;
        select(fixture)
            .clone()
            .ok_or_else(|| TtmError::DataNotAvailable {
                symbol: self.symbol.to_string(),
                kind: kind.to_string(),
            })
    }
}

#[async_trait]
impl TickerSource for InMemoryTicker {
    fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    async fn quarterly_financials(&self) -> Result<StatementTable> {
        self.lookup("quarterly financials", |f| &f.quarterly)
    }

    async fn cashflow(&self) -> Result<StatementTable> {
        self.lookup("cash flow", |f| &f.cashflow)
    }

    async fn info(&self) -> Result<InfoMap> {
        self.lookup("info", |f| &f.info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::period::PeriodType;

    #[tokio::test]
    async fn test_memory_provider_counts() {
        let provider = InMemoryProvider::new().with_fixture(
            "AAPL",
            TickerFixture::new().with_info(InfoMap::new().with("marketCap", 1.0)),
        );

        let handle = provider.ticker(&Symbol::new("AAPL")).unwrap();
        assert_eq!(handle.symbol().as_str(), "AAPL");
        assert!(handle.info().await.is_ok());
        assert!(matches!(
            handle.cashflow().await,
            Err(TtmError::DataNotAvailable { .. })
        ));

        assert_eq!(provider.handles_opened(), 1);
        assert_eq!(provider.fetch_calls(), 2);
    }

    #[tokio::test]
    async fn test_memory_provider_unknown_and_failing() {
        let provider = InMemoryProvider::new()
            .with_fixture(
                "MSFT",
                TickerFixture::new().with_quarterly(StatementTable::new(PeriodType::Quarterly)),
            )
            .with_failure("BAD");

        let unknown = provider.ticker(&Symbol::new("NOPE")).unwrap();
        assert!(matches!(
            unknown.quarterly_financials().await,
            Err(TtmError::SymbolNotFound(_))
        ));

        assert!(provider.ticker(&Symbol::new("bad")).is_err());
        assert_eq!(provider.handles_opened(), 2);
    }
}
