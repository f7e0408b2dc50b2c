//! Append-only CSV store for ticker records.

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument, warn};

use csv::{ReaderBuilder, Trim, WriterBuilder};
use ttm_core::{RawRecord, Result, STORE_HEADER, Symbol, TICKER_COLUMN, TickerRecord, TtmError};

/// How records are written to a store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    /// Append a new row. Reprocessing a ticker leaves duplicate rows.
    #[default]
    Append,
    /// Replace the ticker's existing row, or append if it has none.
    Upsert,
}

/// A CSV file of [`TickerRecord`] rows under a fixed header.
///
/// The header is written once, when the first row is added to a file that does
/// not exist yet. Rows are only ever appended in [`WriteMode::Append`]. There
/// is no locking: one writer per path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CsvStore {
    path: PathBuf,
}

impl CsvStore {
    /// Create a store backed by the file at `path`. Nothing is touched on disk.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if the backing file exists.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Writes `fields` as the header row if the file does not exist.
    ///
    /// Returns `true` if the file was created.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be opened, or cannot be
    /// created.
    #[instrument(skip(self, fields), fields(path = %self.path.display()))]
    pub fn ensure_header(&self, fields: &[&str]) -> Result<bool> {
        match File::open(&self.path) {
            Ok(_) => return Ok(false),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(store_error(&self.path, e)),
        }

        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .from_path(&self.path)
            .map_err(|e| store_error(&self.path, e))?;
        writer
            .write_record(fields)
            .map_err(|e| store_error(&self.path, e))?;
        writer.flush().map_err(|e| store_error(&self.path, e))?;

        debug!(columns = fields.len(), "Created store with header");
        Ok(true)
    }

    /// Appends one record, creating the file with [`STORE_HEADER`] first if needed.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created, opened or written.
    #[instrument(skip(self, record), fields(path = %self.path.display(), symbol = %record.ticker))]
    pub fn append_row(&self, record: &TickerRecord) -> Result<()> {
        self.ensure_header(&STORE_HEADER)?;

        let file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|e| store_error(&self.path, e))?;
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
        writer
            .serialize(record)
            .map_err(|e| store_error(&self.path, e))?;
        writer.flush().map_err(|e| store_error(&self.path, e))?;

        debug!("Appended row");
        Ok(())
    }

    /// Replaces the rows for `record.ticker` with `record`, or appends it.
    ///
    /// The replacement takes the position of the ticker's first row and later
    /// duplicates are dropped. The file is rewritten through a sibling
    /// temporary file and renamed into place.
    ///
    /// # Errors
    /// Returns an error if the existing file cannot be parsed or the rewrite
    /// fails.
    #[instrument(skip(self, record), fields(path = %self.path.display(), symbol = %record.ticker))]
    pub fn upsert_row(&self, record: &TickerRecord) -> Result<()> {
        if !self.exists() {
            return self.append_row(record);
        }

        let existing = self.try_read_all()?;
        let tmp = self.temp_path();
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .from_path(&tmp)
            .map_err(|e| store_error(&tmp, e))?;
        writer
            .write_record(STORE_HEADER)
            .map_err(|e| store_error(&tmp, e))?;

        let mut replaced = 0usize;
        for row in &existing {
            let same_ticker = row
                .get(TICKER_COLUMN)
                .is_some_and(|t| Symbol::new(t.as_str()) == record.ticker);
            if same_ticker {
                if replaced == 0 {
                    writer.serialize(record).map_err(|e| store_error(&tmp, e))?;
                }
                replaced += 1;
                continue;
            }
            writer
                .write_record(
                    STORE_HEADER
                        .iter()
                        .map(|column| row.get(*column).map_or("", String::as_str)),
                )
                .map_err(|e| store_error(&tmp, e))?;
        }
        if replaced == 0 {
            writer.serialize(record).map_err(|e| store_error(&tmp, e))?;
        }
        writer.flush().map_err(|e| store_error(&tmp, e))?;
        drop(writer);

        fs::rename(&tmp, &self.path).map_err(|e| store_error(&self.path, e))?;
        debug!(replaced, "Upserted row");
        Ok(())
    }

    /// Writes a record using the given mode.
    ///
    /// # Errors
    /// See [`append_row`](Self::append_row) and [`upsert_row`](Self::upsert_row).
    pub fn write(&self, record: &TickerRecord, mode: WriteMode) -> Result<()> {
        match mode {
            WriteMode::Append => self.append_row(record),
            WriteMode::Upsert => self.upsert_row(record),
        }
    }

    /// Reads every row as a column-name to value map.
    ///
    /// A missing or unparsable file yields an empty vector and a warning.
    #[must_use]
    pub fn read_all(&self) -> Vec<RawRecord> {
        if !self.exists() {
            warn!(path = %self.path.display(), "Error: File {} not found.", self.path.display());
            return Vec::new();
        }
        match self.try_read_all() {
            Ok(rows) => rows,
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "An error occurred while reading store"
                );
                Vec::new()
            }
        }
    }

    /// Reads every row as a column-name to value map.
    ///
    /// # Errors
    /// Returns an error if the file is missing or not valid CSV.
    pub fn try_read_all(&self) -> Result<Vec<RawRecord>> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_path(&self.path)
            .map_err(|e| store_error(&self.path, e))?;
        let headers = reader
            .headers()
            .map_err(|e| store_error(&self.path, e))?
            .clone();

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result.map_err(|e| store_error(&self.path, e))?;
            rows.push(
                headers
                    .iter()
                    .zip(record.iter())
                    .map(|(column, value)| (column.to_string(), value.to_string()))
                    .collect(),
            );
        }
        Ok(rows)
    }

    /// Reads every row that has a ticker as a [`TickerRecord`].
    #[must_use]
    pub fn read_records(&self) -> Vec<TickerRecord> {
        self.read_all()
            .iter()
            .filter_map(TickerRecord::from_raw)
            .collect()
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

fn store_error(path: &Path, e: impl Display) -> TtmError {
    TtmError::Store(format!("{}: {e}", path.display()))
}
