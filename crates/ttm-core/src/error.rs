//! Error types for fundamentals operations.
//!
//! This module defines [`TtmError`], covering everything that can go wrong while
//! fetching provider data, reading or writing a store, or loading configuration.
//! Missing fundamentals are not errors: they resolve to `0.0` further up.

use thiserror::Error;

/// Errors that can occur while resolving, storing or filtering fundamentals.
#[derive(Error, Debug)]
pub enum TtmError {
    /// Network-related errors (connection failures, timeouts, etc.).
    #[error("Network error: {0}")]
    Network(String),

    /// Rate limit exceeded by a provider.
    #[error("Rate limited by {provider}: retry after {retry_after:?}")]
    RateLimited {
        /// The provider that rate limited the request.
        provider: String,
        /// Suggested time to wait before retrying.
        retry_after: Option<std::time::Duration>,
    },

    /// The requested symbol was not found.
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    /// A provider had no data of the requested kind for a symbol.
    #[error("{kind} not available for {symbol}")]
    DataNotAvailable {
        /// The symbol that was requested.
        symbol: String,
        /// What was requested (e.g. "quarterly financials").
        kind: String,
    },

    /// Error parsing data from a provider.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Error reading or writing a CSV store.
    #[error("Store error: {0}")]
    Store(String),

    /// A tabular input lacks a required column.
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// Configuration could not be loaded or is inconsistent.
    #[error("Config error: {0}")]
    Config(String),

    /// An invalid parameter was provided.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Any other error.
    #[error("{0}")]
    Other(String),
}

/// Result type alias using [`TtmError`].
pub type Result<T> = std::result::Result<T, TtmError>;
