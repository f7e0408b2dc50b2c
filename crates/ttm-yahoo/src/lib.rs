#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/ttm/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Yahoo Finance fundamentals provider.
//!
//! This crate provides a Yahoo Finance implementation of the
//! [`FundamentalsProvider`] capability from `ttm-core`.
//!
//! # Features
//!
//! - Quarterly income statement lines from the fundamentals-timeseries API
//! - Annual cash-flow lines (free cash flow) from the same API
//! - Market cap and trailing EPS from the quote summary API, authenticated
//!   with a session cookie and crumb that are renewed hourly or on HTTP 401
//! - Built-in rate limiting (1 request per second by default)
//! - Each ticker handle fetches every lookup at most once
//!
//! # Example
//!
//! ```no_run
//! use ttm_yahoo::YahooProvider;
//! use ttm_core::{FundamentalsProvider, Symbol};
//!
//! # async fn example() -> ttm_core::Result<()> {
//! let provider = YahooProvider::new();
//! let ticker = provider.ticker(&Symbol::new("AAPL"))?;
//!
//! let financials = ticker.quarterly_financials().await?;
//! println!("{:?}", financials.line_item("Total Revenue"));
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::{Mutex, OnceCell};
use tokio::time::sleep;
use tracing::{debug, warn};
use ttm_core::{
    DataProvider, FieldValue, FundamentalsProvider, InfoMap, PeriodSeries, PeriodType,
    PeriodValue, Result, StatementTable, Symbol, TickerSource, TtmError,
};

/// Yahoo Finance fundamentals timeseries API base URL.
const TIMESERIES_URL: &str =
    "https://query2.finance.yahoo.com/ws/fundamentals-timeseries/v1/finance/timeseries";

/// Yahoo Finance quote summary API base URL.
const QUOTE_SUMMARY_URL: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";

/// Quote summary modules merged into the info map, in precedence order.
const INFO_MODULES: [&str; 3] = ["summaryDetail", "defaultKeyStatistics", "financialData"];

/// Income statement lines requested for `quarterly_financials`.
const QUARTERLY_LINE_ITEMS: [&str; 2] = ["TotalRevenue", "NetIncome"];

/// Cash-flow lines requested for `cashflow`.
const CASHFLOW_LINE_ITEMS: [&str; 1] = ["FreeCashFlow"];

/// Page that sets the Yahoo session cookie.
const COOKIE_URL: &str = "https://fc.yahoo.com";

/// Endpoints that issue a crumb for the current session, tried in order.
const CRUMB_URLS: [&str; 2] = [
    "https://query1.finance.yahoo.com/v1/test/getcrumb",
    "https://query2.finance.yahoo.com/v1/test/getcrumb",
];

/// Referer sent with session requests.
const REFERER: &str = "https://finance.yahoo.com/";

/// How long a crumb is reused before a new session is started.
const CRUMB_TTL: Duration = Duration::from_secs(3600);

/// How far back statement history is requested.
const HISTORY_DAYS: i64 = 5 * 366;

/// Default rate limit delay in milliseconds.
const DEFAULT_RATE_LIMIT_MS: u64 = 1000;

/// User agent for HTTP requests.
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";

/// Yahoo Finance fundamentals provider.
///
/// Cloning is cheap; clones share the HTTP client and rate limiter.
#[derive(Debug, Clone)]
pub struct YahooProvider {
    client: Arc<YahooClient>,
}

impl YahooProvider {
    /// Create a new Yahoo Finance provider with default settings.
    ///
    /// Uses built-in rate limiting of 1 request per second.
    #[must_use]
    pub fn new() -> Self {
        Self::with_rate_limit(Duration::from_millis(DEFAULT_RATE_LIMIT_MS))
    }

    /// Create a new Yahoo Finance provider with a custom HTTP client.
    ///
    /// Uses the provided client for all HTTP requests. Rate limiting
    /// is still applied. Quote summary lookups need a session cookie, so the
    /// client should be built with `cookie_store(true)`.
    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client: Arc::new(YahooClient::new(client, DEFAULT_RATE_LIMIT_MS)),
        }
    }

    /// Create a new Yahoo Finance provider with custom rate limiting.
    ///
    /// If the configured HTTP client cannot be built, a warning is logged and
    /// a plain client is used instead. Use
    /// [`try_with_rate_limit`](Self::try_with_rate_limit) to fail instead.
    #[must_use]
    pub fn with_rate_limit(rate_limit: Duration) -> Self {
        match Self::try_with_rate_limit(rate_limit) {
            Ok(provider) => provider,
            Err(e) => {
                warn!(
                    error = %e,
                    "Using a plain HTTP client without user agent, timeout or cookie store"
                );
                Self {
                    client: Arc::new(YahooClient::new(
                        reqwest::Client::new(),
                        rate_limit.as_millis() as u64,
                    )),
                }
            }
        }
    }

    /// Create a new Yahoo Finance provider with custom rate limiting.
    ///
    /// The HTTP client carries a browser user agent, a 30 second request
    /// timeout and a cookie store for the Yahoo session.
    ///
    /// # Errors
    /// Returns [`TtmError::Config`] if the HTTP client cannot be built.
    pub fn try_with_rate_limit(rate_limit: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .cookie_store(true)
            .build()
            .map_err(|e| TtmError::Config(format!("Yahoo Finance HTTP client: {e}")))?;

        Ok(Self {
            client: Arc::new(YahooClient::new(client, rate_limit.as_millis() as u64)),
        })
    }
}

impl Default for YahooProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl DataProvider for YahooProvider {
    fn name(&self) -> &str {
        "Yahoo Finance"
    }

    fn description(&self) -> &str {
        "Yahoo Finance provider for quarterly financials, cash flow and key statistics"
    }
}

impl FundamentalsProvider for YahooProvider {
    fn ticker(&self, symbol: &Symbol) -> Result<Box<dyn TickerSource>> {
        if symbol.is_empty() {
            return Err(TtmError::InvalidParameter(
                "Cannot open a Yahoo Finance handle for an empty symbol".to_string(),
            ));
        }
        debug!(symbol = %symbol, "Opening Yahoo Finance handle");
        Ok(Box::new(YahooTicker {
            client: Arc::clone(&self.client),
            symbol: symbol.clone(),
            quarterly: OnceCell::new(),
            cashflow: OnceCell::new(),
            info: OnceCell::new(),
        }))
    }
}

/// Shared HTTP state behind every handle of a provider.
#[derive(Debug)]
struct YahooClient {
    http: reqwest::Client,
    rate_limit_ms: u64,
    last_request_time: AtomicU64,
    crumb: Mutex<Option<Crumb>>,
}

/// Session token Yahoo requires on quote summary requests.
#[derive(Debug, Clone)]
struct Crumb {
    value: String,
    fetched_at: Instant,
}

impl Crumb {
    fn is_fresh(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.fetched_at) < CRUMB_TTL
    }
}

impl YahooClient {
    fn new(http: reqwest::Client, rate_limit_ms: u64) -> Self {
        Self {
            http,
            rate_limit_ms,
            last_request_time: AtomicU64::new(0),
            crumb: Mutex::new(None),
        }
    }

    /// Returns the session crumb, starting a new session when none is cached
    /// or the cached one has expired.
    async fn crumb(&self) -> Result<String> {
        let mut cached = self.crumb.lock().await;
        if let Some(crumb) = cached.as_ref().filter(|c| c.is_fresh(Instant::now())) {
            return Ok(crumb.value.clone());
        }

        let value = self.start_session().await?;
        *cached = Some(Crumb {
            value: value.clone(),
            fetched_at: Instant::now(),
        });
        Ok(value)
    }

    async fn invalidate_crumb(&self) {
        *self.crumb.lock().await = None;
    }

    /// Picks up the session cookie, then asks for a crumb bound to it.
    async fn start_session(&self) -> Result<String> {
        self.apply_rate_limit().await;
        debug!("Requesting Yahoo session cookie");
        // The cookie page answers with an error status but still sets the cookie.
        self.http
            .get(COOKIE_URL)
            .header(reqwest::header::REFERER, REFERER)
            .send()
            .await
            .map_err(|e| TtmError::Network(format!("Yahoo session cookie: {e}")))?;

        for url in CRUMB_URLS {
            self.apply_rate_limit().await;
            let response = match self
                .http
                .get(url)
                .header(reqwest::header::REFERER, REFERER)
                .send()
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    debug!(url, error = %e, "Crumb request failed");
                    continue;
                }
            };

            if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
                return Err(rate_limited());
            }
            if !response.status().is_success() {
                debug!(url, status = %response.status(), "Crumb request rejected");
                continue;
            }

            let body = response
                .text()
                .await
                .map_err(|e| TtmError::Network(e.to_string()))?;
            if let Some(crumb) = parse_crumb(&body)? {
                debug!("Started Yahoo session");
                return Ok(crumb);
            }
        }

        Err(TtmError::Network(
            "Failed to obtain a Yahoo Finance crumb".to_string(),
        ))
    }

    /// Apply rate limiting before making a request.
    async fn apply_rate_limit(&self) {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;

        let last = self.last_request_time.load(Ordering::Relaxed);
        let elapsed = now.saturating_sub(last);

        if elapsed < self.rate_limit_ms {
            let wait_time = self.rate_limit_ms - elapsed;
            debug!("Rate limiting: waiting {}ms", wait_time);
            sleep(Duration::from_millis(wait_time)).await;
        }

        self.last_request_time.store(
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis() as u64,
            Ordering::Relaxed,
        );
    }

    /// GET a URL and decode its JSON body.
    async fn get_json<T: DeserializeOwned>(&self, url: &str, symbol: &Symbol) -> Result<T> {
        self.apply_rate_limit().await;
        debug!("Fetching: {}", url);

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| TtmError::Network(e.to_string()))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(rate_limited());
        }

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            warn!(symbol = %symbol, "Yahoo Finance rejected the session, it will be renewed");
            self.invalidate_crumb().await;
            return Err(TtmError::Network(format!(
                "HTTP {} for {}",
                response.status(),
                symbol
            )));
        }

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(TtmError::SymbolNotFound(symbol.to_string()));
        }

        if !response.status().is_success() {
            return Err(TtmError::Network(format!(
                "HTTP {} for {}",
                response.status(),
                symbol
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| TtmError::Parse(e.to_string()))
    }

    async fn fetch_statement(
        &self,
        symbol: &Symbol,
        period_type: PeriodType,
        line_items: &[&str],
    ) -> Result<StatementTable> {
        let url = build_timeseries_url(symbol, period_type, line_items, Utc::now());
        let response: TimeseriesResponse = self.get_json(&url, symbol).await?;
        parse_timeseries(symbol, period_type, response)
    }

    async fn fetch_info(&self, symbol: &Symbol) -> Result<InfoMap> {
        let crumb = self.crumb().await?;
        let url = build_quote_summary_url(symbol, &crumb)?;
        let response: QuoteSummaryResponse = self.get_json(url.as_str(), symbol).await?;
        parse_quote_summary(symbol, response)
    }
}

/// Per-ticker handle; each lookup hits the network at most once.
struct YahooTicker {
    client: Arc<YahooClient>,
    symbol: Symbol,
    quarterly: OnceCell<StatementTable>,
    cashflow: OnceCell<StatementTable>,
    info: OnceCell<InfoMap>,
}

#[async_trait]
impl TickerSource for YahooTicker {
    fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    async fn quarterly_financials(&self) -> Result<StatementTable> {
        self.quarterly
            .get_or_try_init(|| {
                self.client
                    .fetch_statement(&self.symbol, PeriodType::Quarterly, &QUARTERLY_LINE_ITEMS)
            })
            .await
            .cloned()
    }

    async fn cashflow(&self) -> Result<StatementTable> {
        self.cashflow
            .get_or_try_init(|| {
                self.client
                    .fetch_statement(&self.symbol, PeriodType::Annual, &CASHFLOW_LINE_ITEMS)
            })
            .await
            .cloned()
    }

    async fn info(&self) -> Result<InfoMap> {
        self.info
            .get_or_try_init(|| self.client.fetch_info(&self.symbol))
            .await
            .cloned()
    }
}

/// Build the timeseries URL for a symbol's statement lines.
fn build_timeseries_url(
    symbol: &Symbol,
    period_type: PeriodType,
    line_items: &[&str],
    now: DateTime<Utc>,
) -> String {
    let types = line_items
        .iter()
        .map(|item| format!("{}{}", period_type.series_prefix(), item))
        .collect::<Vec<_>>()
        .join(",");
    let period1 = (now - chrono::Duration::days(HISTORY_DAYS)).timestamp();
    let period2 = now.timestamp();

    format!(
        "{}/{}?symbol={}&type={}&period1={}&period2={}",
        TIMESERIES_URL,
        symbol.as_str(),
        symbol.as_str(),
        types,
        period1,
        period2
    )
}

/// Build the quote summary URL for a symbol's info modules.
fn build_quote_summary_url(symbol: &Symbol, crumb: &str) -> Result<reqwest::Url> {
    reqwest::Url::parse_with_params(
        &format!("{}/{}", QUOTE_SUMMARY_URL, symbol.as_str()),
        &[("modules", INFO_MODULES.join(",")), ("crumb", crumb.to_string())],
    )
    .map_err(|e| TtmError::InvalidParameter(format!("{symbol}: {e}")))
}

/// Extracts the crumb from a getcrumb response body.
///
/// Returns `None` for bodies that are not a crumb, such as an HTML error page.
fn parse_crumb(body: &str) -> Result<Option<String>> {
    let body = body.trim();
    if body.to_ascii_lowercase().contains("too many requests") {
        return Err(rate_limited());
    }
    if body.is_empty() || body.len() >= 100 || body.contains(char::is_whitespace) || body.contains('<')
    {
        return Ok(None);
    }
    Ok(Some(body.to_string()))
}

fn rate_limited() -> TtmError {
    TtmError::RateLimited {
        provider: "Yahoo Finance".to_string(),
        retry_after: Some(Duration::from_secs(60)),
    }
}

/// Turns a timeseries key such as `quarterlyTotalRevenue` into `Total Revenue`.
fn line_item_name(series_key: &str, period_type: PeriodType) -> String {
    let stem = series_key
        .strip_prefix(period_type.series_prefix())
        .unwrap_or(series_key);

    let mut name = String::with_capacity(stem.len() + 4);
    let mut prev_lower = false;
    for c in stem.chars() {
        if c.is_ascii_uppercase() && prev_lower {
            name.push(' ');
        }
        prev_lower = c.is_ascii_lowercase();
        name.push(c);
    }
    name
}

/// Parse a timeseries response into a statement table, most recent period first.
fn parse_timeseries(
    symbol: &Symbol,
    period_type: PeriodType,
    response: TimeseriesResponse,
) -> Result<StatementTable> {
    if let Some(error) = response.timeseries.error {
        if error.code == "Not Found" {
            return Err(TtmError::SymbolNotFound(symbol.to_string()));
        }
        return Err(TtmError::Other(format!(
            "{}: {}",
            error.code, error.description
        )));
    }

    let mut table = StatementTable::new(period_type);
    for data in response.timeseries.result.unwrap_or_default() {
        let Some(key) = data.meta.kinds.first() else {
            continue;
        };
        let Some(raw_points) = data.series.get(key) else {
            debug!(symbol = %symbol, series = %key, "No values reported");
            continue;
        };

        let points: Vec<Option<TimeseriesPoint>> = serde_json::from_value(raw_points.clone())
            .map_err(|e| TtmError::Parse(format!("{key}: {e}")))?;

        let mut values: Vec<PeriodValue> = points
            .into_iter()
            .flatten()
            .filter_map(|point| {
                let period_end = NaiveDate::parse_from_str(&point.as_of_date, "%Y-%m-%d").ok()?;
                let value = point
                    .reported_value
                    .map_or(FieldValue::Missing, |v| json_field_value(&v.raw));
                Some(PeriodValue { period_end, value })
            })
            .collect();
        values.sort_by(|a, b| b.period_end.cmp(&a.period_end));

        table.insert(
            line_item_name(key, period_type),
            PeriodSeries::from_points(values),
        );
    }

    Ok(table)
}

/// Parse a quote summary response into a flat info map.
fn parse_quote_summary(symbol: &Symbol, response: QuoteSummaryResponse) -> Result<InfoMap> {
    if let Some(error) = response.quote_summary.error {
        if error.code == "Not Found" {
            return Err(TtmError::SymbolNotFound(symbol.to_string()));
        }
        return Err(TtmError::Other(format!(
            "{}: {}",
            error.code, error.description
        )));
    }

    let modules = response
        .quote_summary
        .result
        .unwrap_or_default()
        .into_iter()
        .next()
        .ok_or_else(|| TtmError::SymbolNotFound(symbol.to_string()))?;

    let mut info = InfoMap::new();
    for module in INFO_MODULES {
        let Some(Value::Object(fields)) = modules.get(module) else {
            continue;
        };
        for (key, value) in fields {
            if let Some(value) = info_field_value(value) {
                info.insert_if_absent(key.clone(), value);
            }
        }
    }

    Ok(info)
}

/// Quote summary fields are either `{"raw": .., "fmt": ..}`, `{}` or scalars.
fn info_field_value(value: &Value) -> Option<FieldValue> {
    match value {
        Value::Object(obj) if obj.is_empty() => Some(FieldValue::Missing),
        Value::Object(obj) => obj.get("raw").map(json_field_value),
        Value::Array(_) => None,
        scalar => Some(json_field_value(scalar)),
    }
}

fn json_field_value(value: &Value) -> FieldValue {
    match value {
        Value::Null => FieldValue::Missing,
        Value::Number(n) => n.as_f64().into(),
        Value::String(s) => s
            .parse::<f64>()
            .map_or_else(|_| FieldValue::Invalid(s.clone()), FieldValue::from),
        other => FieldValue::Invalid(other.to_string()),
    }
}

// ============================================================================
// Yahoo Finance API Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct ApiError {
    code: String,
    description: String,
}

/// Fundamentals timeseries API response.
#[derive(Debug, Deserialize)]
struct TimeseriesResponse {
    timeseries: TimeseriesResult,
}

#[derive(Debug, Deserialize)]
struct TimeseriesResult {
    #[serde(default)]
    result: Option<Vec<TimeseriesData>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct TimeseriesData {
    meta: TimeseriesMeta,
    #[serde(flatten)]
    series: HashMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct TimeseriesMeta {
    #[serde(rename = "type")]
    kinds: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimeseriesPoint {
    as_of_date: String,
    reported_value: Option<ReportedValue>,
}

#[derive(Debug, Deserialize)]
struct ReportedValue {
    raw: Value,
}

/// Quote Summary API response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryResponse {
    quote_summary: QuoteSummaryResult,
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryResult {
    #[serde(default)]
    result: Option<Vec<HashMap<String, Value>>>,
    error: Option<ApiError>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use ttm_core::aggregate;

    const TIMESERIES_JSON: &str = r#"{
        "timeseries": {
            "result": [
                {
                    "meta": {"symbol": ["AAPL"], "type": ["quarterlyTotalRevenue"]},
                    "timestamp": [1696032000, 1703980800, 1711843200, 1719705600, 1727654400],
                    "quarterlyTotalRevenue": [
                        {"asOfDate": "2023-09-30", "periodType": "3M", "reportedValue": {"raw": 50.0, "fmt": "50"}},
                        {"asOfDate": "2023-12-31", "periodType": "3M", "reportedValue": {"raw": 10.0, "fmt": "10"}},
                        null,
                        {"asOfDate": "2024-06-30", "periodType": "3M", "reportedValue": {"raw": 30.0, "fmt": "30"}},
                        {"asOfDate": "2024-09-30", "periodType": "3M", "reportedValue": {"raw": 40.0, "fmt": "40"}},
                        {"asOfDate": "2024-03-31", "periodType": "3M", "reportedValue": {"raw": 20.0, "fmt": "20"}}
                    ]
                },
                {
                    "meta": {"symbol": ["AAPL"], "type": ["quarterlyNetIncome"]},
                    "timestamp": [1727654400],
                    "quarterlyNetIncome": [
                        {"asOfDate": "2024-09-30", "periodType": "3M", "reportedValue": {"raw": "n/a"}}
                    ]
                },
                {
                    "meta": {"symbol": ["AAPL"], "type": ["quarterlyEBITDA"]}
                }
            ],
            "error": null
        }
    }"#;

    const QUOTE_SUMMARY_JSON: &str = r#"{
        "quoteSummary": {
            "result": [
                {
                    "summaryDetail": {
                        "marketCap": {"raw": 3500000000000, "fmt": "3.5T"},
                        "currency": "USD",
                        "trailingPE": {}
                    },
                    "defaultKeyStatistics": {
                        "trailingEps": {"raw": 6.08, "fmt": "6.08"},
                        "marketCap": {"raw": 1, "fmt": "1"}
                    }
                }
            ],
            "error": null
        }
    }"#;

    #[test]
    fn test_parse_timeseries_orders_most_recent_first() {
        let symbol = Symbol::new("AAPL");
        let response: TimeseriesResponse = serde_json::from_str(TIMESERIES_JSON).unwrap();

        let table = parse_timeseries(&symbol, PeriodType::Quarterly, response).unwrap();

        let revenue = table.line_item("Total Revenue").unwrap();
        let dates: Vec<_> = revenue.iter().map(|p| p.period_end.to_string()).collect();
        assert_eq!(
            dates,
            vec!["2024-09-30", "2024-06-30", "2024-03-31", "2023-12-31", "2023-09-30"]
        );
        assert_eq!(aggregate::ttm_sum(&table, "Total Revenue"), 100.0);
        assert!(table.line_item("EBITDA").is_none());
    }

    #[test]
    fn test_parse_timeseries_non_numeric_value() {
        let symbol = Symbol::new("AAPL");
        let response: TimeseriesResponse = serde_json::from_str(TIMESERIES_JSON).unwrap();

        let table = parse_timeseries(&symbol, PeriodType::Quarterly, response).unwrap();

        let income = table.line_item("Net Income").unwrap();
        assert_eq!(
            income.first().map(|p| &p.value),
            Some(&FieldValue::Invalid("n/a".to_string()))
        );
        assert_eq!(aggregate::ttm_sum(&table, "Net Income"), 0.0);
    }

    #[test]
    fn test_parse_timeseries_error() {
        let symbol = Symbol::new("NOPE");
        let response: TimeseriesResponse = serde_json::from_str(
            r#"{"timeseries": {"result": null, "error": {"code": "Not Found", "description": "No data"}}}"#,
        )
        .unwrap();

        assert!(matches!(
            parse_timeseries(&symbol, PeriodType::Quarterly, response),
            Err(TtmError::SymbolNotFound(_))
        ));
    }

    #[test]
    fn test_parse_quote_summary() {
        let symbol = Symbol::new("AAPL");
        let response: QuoteSummaryResponse = serde_json::from_str(QUOTE_SUMMARY_JSON).unwrap();

        let info = parse_quote_summary(&symbol, response).unwrap();

        // summaryDetail takes precedence over defaultKeyStatistics.
        assert_eq!(info.get("marketCap"), Some(&FieldValue::Number(3.5e12)));
        assert_eq!(info.get("trailingEps"), Some(&FieldValue::Number(6.08)));
        assert_eq!(info.get("trailingPE"), Some(&FieldValue::Missing));
        assert_eq!(
            info.get("currency"),
            Some(&FieldValue::Invalid("USD".to_string()))
        );
    }

    #[test]
    fn test_parse_quote_summary_empty_result() {
        let symbol = Symbol::new("NOPE");
        let response: QuoteSummaryResponse =
            serde_json::from_str(r#"{"quoteSummary": {"result": [], "error": null}}"#).unwrap();

        assert!(matches!(
            parse_quote_summary(&symbol, response),
            Err(TtmError::SymbolNotFound(_))
        ));
    }

    #[test]
    fn test_line_item_name() {
        assert_eq!(
            line_item_name("quarterlyTotalRevenue", PeriodType::Quarterly),
            "Total Revenue"
        );
        assert_eq!(
            line_item_name("annualFreeCashFlow", PeriodType::Annual),
            "Free Cash Flow"
        );
        assert_eq!(line_item_name("quarterlyEBITDA", PeriodType::Quarterly), "EBITDA");
    }

    #[test]
    fn test_build_timeseries_url() {
        let symbol = Symbol::new("msft");
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();

        let url = build_timeseries_url(&symbol, PeriodType::Annual, &CASHFLOW_LINE_ITEMS, now);

        assert!(url.starts_with(TIMESERIES_URL));
        assert!(url.contains("/MSFT?symbol=MSFT"));
        assert!(url.contains("type=annualFreeCashFlow&"));
        assert!(url.contains(&format!("period2={}", now.timestamp())));
    }

    #[test]
    fn test_build_quote_summary_url() {
        let url = build_quote_summary_url(&Symbol::new("aapl"), "ab/c.d").unwrap();

        assert_eq!(url.path(), "/v10/finance/quoteSummary/AAPL");
        let param = |name: &str| {
            url.query_pairs()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.into_owned())
        };
        assert_eq!(
            param("modules").as_deref(),
            Some("summaryDetail,defaultKeyStatistics,financialData")
        );
        assert_eq!(param("crumb").as_deref(), Some("ab/c.d"));
        assert!(url.as_str().contains("crumb=ab%2Fc.d"));
    }

    #[test]
    fn test_parse_crumb() {
        assert_eq!(parse_crumb("  AbC.d1/x\n").unwrap(), Some("AbC.d1/x".to_string()));
        assert_eq!(parse_crumb("").unwrap(), None);
        assert_eq!(parse_crumb("<!DOCTYPE html><html></html>").unwrap(), None);
        assert_eq!(parse_crumb("not a crumb").unwrap(), None);
        assert!(matches!(
            parse_crumb("Too Many Requests"),
            Err(TtmError::RateLimited { .. })
        ));
    }

    #[test]
    fn test_crumb_expires() {
        let fetched_at = Instant::now();
        let crumb = Crumb {
            value: "abc".to_string(),
            fetched_at,
        };

        assert!(crumb.is_fresh(fetched_at + Duration::from_secs(60)));
        assert!(!crumb.is_fresh(fetched_at + CRUMB_TTL));
    }

    #[test]
    fn test_try_with_rate_limit() {
        let provider = YahooProvider::try_with_rate_limit(Duration::from_millis(10)).unwrap();
        assert_eq!(provider.name(), "Yahoo Finance");
    }

    #[test]
    fn test_provider_info() {
        let provider = YahooProvider::new();

        assert_eq!(provider.name(), "Yahoo Finance");
        assert!(provider.ticker(&Symbol::new("AAPL")).is_ok());
        assert!(matches!(
            provider.ticker(&Symbol::new(" ")),
            Err(TtmError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_default() {
        let provider = YahooProvider::default();
        assert_eq!(provider.name(), "Yahoo Finance");
    }
}
