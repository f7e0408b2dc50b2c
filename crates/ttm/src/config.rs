//! Pipeline configuration.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use ttm_core::{Result, TtmError};
use ttm_store::{Thresholds, WriteMode};

/// Paths and settings for one pipeline run.
///
/// Loadable from JSON; every field except `input` and `output` may be
/// omitted.
///
/// ```json
/// {
///     "input": "financial_data2024-06-01.csv",
///     "output": "financial_data2024-06-02.csv",
///     "filtered_output": "filtered_financial_data.csv",
///     "thresholds": { "market_cap": 10000000000.0 },
///     "write_mode": "append"
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Ticker file, optionally carrying a previous snapshot's metrics.
    pub input: PathBuf,
    /// Store the resolved rows are written to.
    pub output: PathBuf,
    /// Where to write the screened rows. No screening when absent.
    #[serde(default)]
    pub filtered_output: Option<PathBuf>,
    /// Screen minimums.
    #[serde(default)]
    pub thresholds: Thresholds,
    /// How rows are written to `output`.
    #[serde(default)]
    pub write_mode: WriteMode,
}

impl PipelineConfig {
    /// Create a config that enriches `input` into `output` without screening.
    #[must_use]
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            filtered_output: None,
            thresholds: Thresholds::default(),
            write_mode: WriteMode::default(),
        }
    }

    /// Screens the enriched store into `path` after the batch.
    #[must_use]
    pub fn with_filtered_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.filtered_output = Some(path.into());
        self
    }

    /// Sets the screen minimums.
    #[must_use]
    pub const fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Sets how rows are written to the output store.
    #[must_use]
    pub const fn with_write_mode(mut self, mode: WriteMode) -> Self {
        self.write_mode = mode;
        self
    }

    /// Loads a config from a JSON file.
    ///
    /// # Errors
    /// Returns [`TtmError::Config`] if the file cannot be read or parsed.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| TtmError::Config(format!("{}: {e}", path.display())))?;
        serde_json::from_str(&text)
            .map_err(|e| TtmError::Config(format!("{}: {e}", path.display())))
    }

    /// Daily snapshot file name, e.g. `financial_data2024-06-01.csv`.
    #[must_use]
    pub fn dated_output(prefix: &str, date: NaiveDate) -> PathBuf {
        PathBuf::from(format!("{prefix}{}.csv", date.format("%Y-%m-%d")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dated_output() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert_eq!(
            PipelineConfig::dated_output("financial_data", date),
            PathBuf::from("financial_data2024-06-01.csv")
        );
    }

    #[test]
    fn test_builder() {
        let config = PipelineConfig::new("in.csv", "out.csv")
            .with_filtered_output("filtered.csv")
            .with_write_mode(WriteMode::Upsert);

        assert_eq!(config.filtered_output, Some(PathBuf::from("filtered.csv")));
        assert_eq!(config.write_mode, WriteMode::Upsert);
        assert_eq!(config.thresholds, Thresholds::default());
    }

    #[test]
    fn test_from_json_file_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ttm.json");
        std::fs::write(
            &path,
            r#"{"input": "in.csv", "output": "out.csv", "thresholds": {"eps": 1.5}, "write_mode": "upsert"}"#,
        )
        .unwrap();

        let config = PipelineConfig::from_json_file(&path).unwrap();

        assert_eq!(config.input, PathBuf::from("in.csv"));
        assert_eq!(config.filtered_output, None);
        assert_eq!(config.thresholds.eps, 1.5);
        assert_eq!(config.thresholds.market_cap, 5e9);
        assert_eq!(config.write_mode, WriteMode::Upsert);
    }

    #[test]
    fn test_from_json_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = PipelineConfig::from_json_file(dir.path().join("missing.json"));
        assert!(matches!(missing, Err(TtmError::Config(_))));

        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{"output": "out.csv"}"#).unwrap();
        assert!(matches!(
            PipelineConfig::from_json_file(&path),
            Err(TtmError::Config(_))
        ));
    }
}
