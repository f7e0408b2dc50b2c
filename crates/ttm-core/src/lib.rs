#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/ttm/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core traits, types and resolution engine for TTM fundamentals.
//!
//! This crate provides the foundational abstractions:
//!
//! - [`FundamentalsProvider`](provider::FundamentalsProvider) - Opens per-ticker handles
//! - [`TickerSource`](provider::TickerSource) - Quarterly financials, cash flow and info
//! - [`MetricResolver`](resolver::MetricResolver) - Reuse-or-fetch resolution per metric
//! - [`aggregate`] - TTM sums, ratio and free cash flow with `0.0` fallbacks
//! - [`InMemoryProvider`](memory::InMemoryProvider) - Fixture-backed provider

/// Trailing-twelve-month aggregation.
pub mod aggregate;
/// Error types for fundamentals operations.
pub mod error;
/// In-memory provider implementation.
pub mod memory;
/// Reporting period definitions.
pub mod period;
/// Provider traits for fetching fundamentals.
pub mod provider;
/// Per-ticker metric resolution.
pub mod resolver;
/// Statement tables and info maps.
pub mod statement;
/// Core data types (Symbol, TickerRecord, PriorRow, etc.).
pub mod types;

// Re-export commonly used items at crate root
pub use aggregate::AggregateError;
pub use error::{Result, TtmError};
pub use memory::{InMemoryProvider, TickerFixture};
pub use period::PeriodType;
pub use provider::{DataProvider, FundamentalsProvider, TickerSource};
pub use resolver::{FieldOutcome, MetricResolver, Resolution};
pub use statement::{FieldValue, InfoMap, PeriodSeries, PeriodValue, StatementTable};
pub use types::{
    MetricField, PriorRow, RawRecord, STORE_HEADER, Symbol, TICKER_COLUMN, TickerRecord,
};
