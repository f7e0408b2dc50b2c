//! End-to-end enrichment and screening.

use std::sync::Arc;

use tracing::info;

use ttm_core::{FundamentalsProvider, MetricResolver, Result};
use ttm_store::{FilterOutcome, ThresholdFilter};

use crate::batch::{BatchProcessor, BatchReport};
use crate::config::PipelineConfig;

/// What a pipeline run produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineReport {
    /// Batch counts.
    pub batch: BatchReport,
    /// Screening result, if a filtered output was configured.
    pub filter: Option<FilterOutcome>,
}

/// Runs a batch over a ticker file and optionally screens the result.
///
/// # Example
///
/// ```rust,ignore
/// use ttm::{Pipeline, PipelineConfig};
///
/// #[tokio::main]
/// async fn main() -> ttm::Result<()> {
///     let config = PipelineConfig::new("tickers.csv", "financial_data.csv")
///         .with_filtered_output("filtered_financial_data.csv");
///
///     let report = Pipeline::with_yahoo().run(&config).await?;
///     println!("{:?}", report);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Pipeline {
    provider: Arc<dyn FundamentalsProvider>,
}

impl Pipeline {
    /// Create a pipeline that fetches stale tickers from `provider`.
    #[must_use]
    pub fn new(provider: Arc<dyn FundamentalsProvider>) -> Self {
        Self { provider }
    }

    /// Create a pipeline backed by Yahoo Finance.
    #[cfg(feature = "yahoo")]
    #[must_use]
    pub fn with_yahoo() -> Self {
        Self::new(Arc::new(ttm_yahoo::YahooProvider::new()))
    }

    /// The provider used for stale tickers.
    #[must_use]
    pub fn provider(&self) -> &Arc<dyn FundamentalsProvider> {
        &self.provider
    }

    /// Enriches `config.input` into `config.output`, then screens the output
    /// into `config.filtered_output` when one is set.
    ///
    /// # Errors
    /// Returns an error only from screening: an unparsable store, a missing
    /// metric column, or an unwritable filtered output. Per-ticker failures
    /// are reported in [`BatchReport::failed`].
    pub async fn run(&self, config: &PipelineConfig) -> Result<PipelineReport> {
        info!(provider = self.provider.name(), "Starting pipeline");

        let batch = BatchProcessor::new(MetricResolver::new(Arc::clone(&self.provider)))
            .with_write_mode(config.write_mode)
            .run(&config.input, &config.output)
            .await;

        let filter = match &config.filtered_output {
            Some(filtered) => {
                Some(ThresholdFilter::new(config.thresholds).apply(&config.output, filtered)?)
            }
            None => None,
        };

        Ok(PipelineReport { batch, filter })
    }
}
