//! Batch enrichment of a ticker file.

use std::path::Path;

use tracing::{debug, info, instrument, warn};

use ttm_core::{MetricResolver, PriorRow, Symbol, TICKER_COLUMN};
use ttm_store::{CsvStore, WriteMode};

/// Counts from one batch run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Tickers resolved and written.
    pub processed: usize,
    /// Processed tickers whose prior row was complete.
    pub up_to_date: usize,
    /// Processed tickers that went to the provider.
    pub refreshed: usize,
    /// Rows without a ticker.
    pub skipped: usize,
    /// Tickers that failed, with the error message.
    pub failed: Vec<(Symbol, String)>,
}

impl BatchReport {
    /// Returns true if no ticker failed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Resolves every ticker of an input file and writes one row per ticker.
#[derive(Debug, Clone)]
pub struct BatchProcessor {
    resolver: MetricResolver,
    mode: WriteMode,
}

impl BatchProcessor {
    /// Create a processor that appends rows.
    #[must_use]
    pub fn new(resolver: MetricResolver) -> Self {
        Self {
            resolver,
            mode: WriteMode::default(),
        }
    }

    /// Sets how rows are written to the output store.
    #[must_use]
    pub const fn with_write_mode(mut self, mode: WriteMode) -> Self {
        self.mode = mode;
        self
    }

    /// The resolver used for each ticker.
    #[must_use]
    pub const fn resolver(&self) -> &MetricResolver {
        &self.resolver
    }

    /// Processes `input` into `output`, one ticker at a time in file order.
    ///
    /// Metric columns present in `input` serve as the prior row, so a fully
    /// populated row is copied through without touching the provider. A
    /// failure on one ticker is logged and recorded in the report; the batch
    /// carries on with the next row. A missing `input` yields an empty report.
    #[instrument(skip(self), fields(input = %input.display(), output = %output.display()))]
    pub async fn run(&self, input: &Path, output: &Path) -> BatchReport {
        let rows = CsvStore::new(input).read_all();
        let store = CsvStore::new(output);
        let mut report = BatchReport::default();

        for raw in &rows {
            let symbol = raw
                .get(TICKER_COLUMN)
                .map(|t| Symbol::new(t.as_str()))
                .unwrap_or_default();
            if symbol.is_empty() {
                debug!("Skipping row without a ticker");
                report.skipped += 1;
                continue;
            }

            let prior = PriorRow::from_raw(raw);
            let resolution = match self.resolver.resolve_detailed(&symbol, &prior).await {
                Ok(resolution) => resolution,
                Err(e) => {
                    warn!(symbol = %symbol, error = %e, "Error processing {symbol}: {e}");
                    report.failed.push((symbol, e.to_string()));
                    continue;
                }
            };

            if let Err(e) = store.write(&resolution.record, self.mode) {
                warn!(symbol = %symbol, error = %e, "Failed to write row for {symbol}");
                report.failed.push((symbol, e.to_string()));
                continue;
            }

            report.processed += 1;
            if resolution.refreshed {
                report.refreshed += 1;
            } else {
                report.up_to_date += 1;
            }
        }

        info!(
            processed = report.processed,
            up_to_date = report.up_to_date,
            refreshed = report.refreshed,
            skipped = report.skipped,
            failed = report.failed.len(),
            "Batch complete"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::sync::Arc;
    use ttm_core::aggregate::{FREE_CASH_FLOW, NET_INCOME, TOTAL_REVENUE};
    use ttm_core::resolver::{MARKET_CAP_KEY, TRAILING_EPS_KEY};
    use ttm_core::{
        InMemoryProvider, InfoMap, MetricField, PeriodSeries, PeriodType, StatementTable,
        TickerFixture,
    };

    fn series(values: &[f64]) -> PeriodSeries {
        let mut series = PeriodSeries::new();
        let mut date = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        for v in values {
            series.push(date, *v);
            date = date - chrono::Months::new(3);
        }
        series
    }

    fn fixture(revenue: f64) -> TickerFixture {
        TickerFixture::new()
            .with_quarterly(
                StatementTable::new(PeriodType::Quarterly)
                    .with_line_item(TOTAL_REVENUE, series(&[revenue; 4]))
                    .with_line_item(NET_INCOME, series(&[1.0; 4])),
            )
            .with_cashflow(
                StatementTable::new(PeriodType::Annual)
                    .with_line_item(FREE_CASH_FLOW, series(&[7.0])),
            )
            .with_info(
                InfoMap::new()
                    .with(MARKET_CAP_KEY, 6e9)
                    .with(TRAILING_EPS_KEY, 21.0),
            )
    }

    fn processor(provider: &Arc<InMemoryProvider>) -> BatchProcessor {
        BatchProcessor::new(MetricResolver::new(provider.clone()))
    }

    #[tokio::test]
    async fn test_failing_ticker_does_not_stop_batch() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("tickers.csv");
        std::fs::write(&input, "Ticker\nAAA\nBBB\nCCC\n").unwrap();
        let output = dir.path().join("financial_data.csv");
        let provider = Arc::new(
            InMemoryProvider::new()
                .with_fixture("AAA", fixture(10.0))
                .with_failure("BBB")
                .with_fixture("CCC", fixture(20.0)),
        );

        let report = processor(&provider).run(&input, &output).await;

        assert_eq!(report.processed, 2);
        assert_eq!(report.refreshed, 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, Symbol::new("BBB"));

        let rows = CsvStore::new(&output).read_records();
        let tickers: Vec<_> = rows.iter().map(|r| r.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["AAA", "CCC"]);
        assert_eq!(rows[0].get(MetricField::TotalRevenue), 40.0);
        assert_eq!(rows[1].get(MetricField::TotalRevenue), 80.0);
        assert_eq!(rows[1].get(MetricField::NetIncomeToRevenueRatio), 0.05);
    }

    #[tokio::test]
    async fn test_write_failures_do_not_stop_batch() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("tickers.csv");
        std::fs::write(&input, "Ticker\nAAA\nBBB\nCCC\n").unwrap();
        let output = dir.path().join("not_a_file");
        std::fs::create_dir(&output).unwrap();
        let provider = Arc::new(
            InMemoryProvider::new()
                .with_fixture("AAA", fixture(10.0))
                .with_fixture("BBB", fixture(20.0))
                .with_fixture("CCC", fixture(30.0)),
        );

        let report = processor(&provider).run(&input, &output).await;

        assert_eq!(provider.handles_opened(), 3);
        assert_eq!(report.processed, 0);
        let failed: Vec<_> = report.failed.iter().map(|(s, _)| s.as_str()).collect();
        assert_eq!(failed, vec!["AAA", "BBB", "CCC"]);
    }

    #[tokio::test]
    async fn test_empty_input_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("tickers.csv");
        std::fs::write(&input, "Ticker\n").unwrap();
        let output = dir.path().join("financial_data.csv");
        let provider = Arc::new(InMemoryProvider::new());

        let report = processor(&provider).run(&input, &output).await;

        assert_eq!(report, BatchReport::default());
        assert!(report.is_clean());
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_missing_input_is_empty_batch() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("financial_data.csv");
        let provider = Arc::new(InMemoryProvider::new());

        let report = processor(&provider)
            .run(&dir.path().join("missing.csv"), &output)
            .await;

        assert_eq!(report.processed, 0);
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_complete_rows_are_copied_without_fetching() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("previous.csv");
        std::fs::write(
            &input,
            "Ticker,Total Revenue,Net Income,Net income to total revenue ratio,Market Cap,Free Cash Flow,EPS\n\
             AAA,1,2,3,4,5,6\n\
             ,9,9,9,9,9,9\n\
             CCC,1,2,,4,5,6\n",
        )
        .unwrap();
        let output = dir.path().join("financial_data.csv");
        let provider = Arc::new(InMemoryProvider::new().with_fixture("CCC", fixture(10.0)));

        let report = processor(&provider).run(&input, &output).await;

        assert_eq!(report.processed, 2);
        assert_eq!(report.up_to_date, 1);
        assert_eq!(report.refreshed, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(provider.handles_opened(), 1);

        let rows = CsvStore::new(&output).read_records();
        assert_eq!(rows[0].get(MetricField::Eps), 6.0);
        assert_eq!(rows[0].get(MetricField::NetIncomeToRevenueRatio), 3.0);
        // Known fields are kept; the missing ratio is derived from them.
        assert_eq!(rows[1].get(MetricField::TotalRevenue), 1.0);
        assert_eq!(rows[1].get(MetricField::NetIncomeToRevenueRatio), 2.0);
    }

    #[tokio::test]
    async fn test_upsert_mode_replaces_rows() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("tickers.csv");
        std::fs::write(&input, "Ticker\nAAA\n").unwrap();
        let output = dir.path().join("financial_data.csv");
        let provider = Arc::new(InMemoryProvider::new().with_fixture("AAA", fixture(10.0)));
        let batch = processor(&provider).with_write_mode(WriteMode::Upsert);

        batch.run(&input, &output).await;
        batch.run(&input, &output).await;

        assert_eq!(CsvStore::new(&output).read_records().len(), 1);
    }
}
