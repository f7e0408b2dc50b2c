#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/ttm/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Incremental TTM fundamentals enrichment and screening.
//!
//! This crate ties the workspace together. It re-exports the core types and
//! the store, and provides a [`BatchProcessor`] that enriches a ticker file
//! row by row plus a [`Pipeline`] that runs a batch and screens the result.
//!
//! # Features
//!
//! - `yahoo` - Yahoo Finance provider (enabled by default)
//!
//! # Example
//!
//! ```rust,ignore
//! use ttm::{Pipeline, PipelineConfig};
//! use chrono::Local;
//!
//! #[tokio::main]
//! async fn main() -> ttm::Result<()> {
//!     let today = Local::now().date_naive();
//!     let config = PipelineConfig::new(
//!         "financial_data2024-06-01.csv",
//!         PipelineConfig::dated_output("financial_data", today),
//!     )
//!     .with_filtered_output("filtered_financial_data.csv");
//!
//!     let report = Pipeline::with_yahoo().run(&config).await?;
//!     println!("{} tickers, {} failed", report.batch.processed, report.batch.failed.len());
//!
//!     Ok(())
//! }
//! ```

// Core types and traits
pub use ttm_core::*;

// Storage and screening
pub use ttm_store::{CsvStore, FilterOutcome, ThresholdFilter, Thresholds, WriteMode};

// Providers
#[cfg(feature = "yahoo")]
pub use ttm_yahoo::YahooProvider;

mod batch;
mod config;
mod pipeline;

pub use batch::{BatchProcessor, BatchReport};
pub use config::PipelineConfig;
pub use pipeline::{Pipeline, PipelineReport};
