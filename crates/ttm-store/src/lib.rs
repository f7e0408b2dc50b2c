#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/ttm/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! CSV storage and threshold screening for TTM fundamentals.
//!
//! - [`CsvStore`] - Append-only store with a lazily written header
//! - [`ThresholdFilter`] - Selects rows that clear every [`Thresholds`] minimum

/// Append-only CSV store.
pub mod csv_store;
/// Threshold screening.
pub mod filter;

pub use csv_store::{CsvStore, WriteMode};
pub use filter::{FilterOutcome, ThresholdFilter, Thresholds};
