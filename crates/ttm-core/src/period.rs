//! Reporting period definitions for statement tables.

use serde::{Deserialize, Serialize};

/// Period type for fundamental financial data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PeriodType {
    /// Annual reporting period.
    #[default]
    Annual,
    /// Quarterly reporting period.
    Quarterly,
}

impl PeriodType {
    /// Prefix Yahoo-style timeseries keys use for this period (`quarterly`, `annual`).
    #[must_use]
    pub const fn series_prefix(&self) -> &'static str {
        match self {
            Self::Annual => "annual",
            Self::Quarterly => "quarterly",
        }
    }
}
