use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Reader errors
// ---------------------------------------------------------------------------

/// Failures while turning raw file bytes into a measurement series.
#[derive(Debug, Error)]
pub enum ReadError {
    /// None of the candidate text encodings accepted the bytes.
    #[error("no text encoding could decode the file (tried {tried})")]
    Decode { tried: String },

    /// Payload present but structurally invalid.
    #[error("{}", describe_parse(.line, .message))]
    Parse { line: Option<usize>, message: String },

    #[error("reading measurement file: {0}")]
    Io(#[from] std::io::Error),
}

fn describe_parse(line: &Option<usize>, message: &str) -> String {
    match line {
        Some(line) => format!("line {line}: {message}"),
        None => message.to_string(),
    }
}

impl ReadError {
    pub(crate) fn parse(message: impl Into<String>) -> Self {
        ReadError::Parse {
            line: None,
            message: message.into(),
        }
    }

    pub(crate) fn parse_at(line: usize, message: impl Into<String>) -> Self {
        ReadError::Parse {
            line: Some(line),
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Calibration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq)]
pub enum CalibrationError {
    /// Calibration constants that would produce infinite or NaN results.
    #[error("invalid calibration constants: {0}")]
    Configuration(String),
}

// ---------------------------------------------------------------------------
// Summary store errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum StoreError {
    /// The table exists but its schema is not the one expected.
    #[error("summary table {} is corrupt: expected header {expected:?}, found {found:?}", .path.display())]
    Corrupt {
        path: PathBuf,
        expected: Vec<String>,
        found: Vec<String>,
    },

    /// A data row that cannot be read back; corrupt like a bad header.
    #[error("summary table {} row {row}: {message}", .path.display())]
    BadRow {
        path: PathBuf,
        row: usize,
        message: String,
    },

    #[error("summary table I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("summary table CSV: {0}")]
    Csv(#[from] csv::Error),
}

impl StoreError {
    /// True for both header and row corruption.
    pub fn is_corrupt(&self) -> bool {
        matches!(self, StoreError::Corrupt { .. } | StoreError::BadRow { .. })
    }
}

// ---------------------------------------------------------------------------
// File processor errors
// ---------------------------------------------------------------------------

/// Everything that can abort the processing of a single file.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("{}: unsupported extension (expected .{expected})", .path.display())]
    UnsupportedExtension { path: PathBuf, expected: String },

    #[error("{}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: ReadError,
    },

    #[error(transparent)]
    Calibration(#[from] CalibrationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing config {}: {source}", .path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error(transparent)]
    Calibration(#[from] CalibrationError),
}

// ---------------------------------------------------------------------------
// Monitor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("watching {}: {source}", .path.display())]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    #[error("spawning monitor worker: {0}")]
    Spawn(#[from] std::io::Error),
}
