//! Append-only summary table, one row per processed file.
//!
//! Rows are never deduplicated: processing the same file twice appends two
//! rows with the same filename.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::data::model::{FileSummaryRecord, Variant};
use crate::error::StoreError;

// ---------------------------------------------------------------------------
// Table schema per variant
// ---------------------------------------------------------------------------

/// Column names and number formatting for one variant's table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schema {
    pub columns: [&'static str; 3],
    /// Fixed decimal places, or `None` for default float formatting.
    pub precision: Option<usize>,
}

pub const STRUCTURED_SCHEMA: Schema = Schema {
    columns: [
        "Filename",
        "Average Concentration (uM)",
        "Standard Deviation (uM)",
    ],
    precision: Some(2),
};

pub const DELIMITED_SCHEMA: Schema = Schema {
    columns: [
        "File",
        "Peak Current (µA)",
        "Estimated Concentration (µM)",
    ],
    precision: None,
};

impl Schema {
    pub fn for_variant(variant: Variant) -> Schema {
        match variant {
            Variant::Structured => STRUCTURED_SCHEMA,
            Variant::Delimited => DELIMITED_SCHEMA,
        }
    }

    fn format(&self, value: f64) -> String {
        match self.precision {
            Some(p) => format!("{value:.p$}"),
            None => format!("{value}"),
        }
    }

    fn row(&self, record: &FileSummaryRecord) -> [String; 3] {
        [
            record.filename.clone(),
            self.format(record.metric_a),
            self.format(record.metric_b),
        ]
    }
}

// ---------------------------------------------------------------------------
// SummaryStore
// ---------------------------------------------------------------------------

/// CSV-backed summary table. Share it behind an `Arc`; appends are
/// serialized by an internal lock so concurrent callers never interleave
/// rows or write the header twice.
#[derive(Debug)]
pub struct SummaryStore {
    path: PathBuf,
    variant: Variant,
    schema: Schema,
    write_lock: Mutex<()>,
}

impl SummaryStore {
    pub fn new(path: impl Into<PathBuf>, variant: Variant) -> Self {
        SummaryStore {
            path: path.into(),
            variant,
            schema: Schema::for_variant(variant),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn schema(&self) -> Schema {
        self.schema
    }

    /// Append one row, writing the header first if the table is new or empty.
    pub fn append(&self, record: &FileSummaryRecord) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let needs_header = file.metadata()?.len() == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if needs_header {
            writer.write_record(self.schema.columns)?;
        }
        writer.write_record(self.schema.row(record))?;
        writer.flush()?;

        log::debug!("appended {} to {}", record.filename, self.path.display());
        Ok(())
    }

    /// Read every row back in file order. A missing table reads as empty.
    ///
    /// Does not take the write lock; a concurrent append may or may not be
    /// visible.
    pub fn load_all(&self) -> Result<Vec<FileSummaryRecord>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&self.path)?;

        let found: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
        if found.is_empty() {
            return Ok(Vec::new());
        }
        if found != self.schema.columns {
            return Err(StoreError::Corrupt {
                path: self.path.clone(),
                expected: self.schema.columns.iter().map(|c| c.to_string()).collect(),
                found,
            });
        }

        let mut records = Vec::new();
        for (i, result) in reader.records().enumerate() {
            let row = i + 1;
            let record = result?;
            if record.len() != 3 {
                return Err(self.bad_row(row, format!("expected 3 fields, found {}", record.len())));
            }
            let metric_a = self.parse_metric(&record[1], row)?;
            let metric_b = self.parse_metric(&record[2], row)?;
            records.push(FileSummaryRecord::new(&record[0], metric_a, metric_b));
        }
        Ok(records)
    }

    fn parse_metric(&self, field: &str, row: usize) -> Result<f64, StoreError> {
        field
            .trim()
            .parse::<f64>()
            .map_err(|_| self.bad_row(row, format!("'{field}' is not a number")))
    }

    fn bad_row(&self, row: usize, message: String) -> StoreError {
        StoreError::BadRow {
            path: self.path.clone(),
            row,
            message,
        }
    }
}
