use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Variant – which instrument export format a file uses
// ---------------------------------------------------------------------------

/// The two instrument export formats the reporter understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Variant A: JSON session export with time/potential channels.
    Structured,
    /// Variant B: whitespace-delimited voltage/current text export.
    Delimited,
}

impl Variant {
    /// File extension watched/scanned when none is configured.
    pub fn default_extension(self) -> &'static str {
        match self {
            Variant::Structured => "pssession",
            Variant::Delimited => "txt",
        }
    }

    /// Explicit caller choice of variant from a file extension.
    pub fn from_extension(path: &Path) -> Option<Variant> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pssession" => Some(Variant::Structured),
            "txt" | "dat" => Some(Variant::Delimited),
            _ => None,
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Structured => write!(f, "structured"),
            Variant::Delimited => write!(f, "delimited"),
        }
    }
}

// ---------------------------------------------------------------------------
// RawSample / MeasurementSeries – reader output
// ---------------------------------------------------------------------------

/// One instrument reading. Which fields are present depends on the variant.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RawSample {
    pub time: Option<f64>,
    pub voltage: Option<f64>,
    pub current: Option<f64>,
    /// Only `Some(0)` marks a usable reading in structured exports.
    pub status_flag: Option<i64>,
}

impl RawSample {
    /// Time/voltage reading from a structured export.
    pub fn timed(time: f64, voltage: f64, status_flag: i64) -> Self {
        RawSample {
            time: Some(time),
            voltage: Some(voltage),
            current: None,
            status_flag: Some(status_flag),
        }
    }

    /// Voltage/current reading from a delimited export.
    pub fn sweep(voltage: f64, current: f64) -> Self {
        RawSample {
            time: None,
            voltage: Some(voltage),
            current: Some(current),
            status_flag: None,
        }
    }
}

/// Ordered samples decoded from one measurement file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeasurementSeries {
    pub samples: Vec<RawSample>,
}

impl MeasurementSeries {
    pub fn new(samples: Vec<RawSample>) -> Self {
        MeasurementSeries { samples }
    }

    /// Pair two channels, truncating to the shorter one.
    pub fn zip_timed(time: &[f64], voltage: &[f64]) -> Self {
        let n = time.len().min(voltage.len());
        let samples = time[..n]
            .iter()
            .zip(&voltage[..n])
            .map(|(&t, &v)| RawSample::timed(t, v, 0))
            .collect();
        MeasurementSeries { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn times(&self) -> Vec<f64> {
        self.samples.iter().filter_map(|s| s.time).collect()
    }

    pub fn voltages(&self) -> Vec<f64> {
        self.samples.iter().filter_map(|s| s.voltage).collect()
    }

    pub fn currents(&self) -> Vec<f64> {
        self.samples.iter().filter_map(|s| s.current).collect()
    }
}

// ---------------------------------------------------------------------------
// ConcentrationSeries – calibrated output
// ---------------------------------------------------------------------------

/// Concentrations (µM) derived elementwise from a measurement series.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConcentrationSeries {
    /// Time axis, same length as `values`.
    pub time: Vec<f64>,
    pub values: Vec<f64>,
}

impl ConcentrationSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// ---------------------------------------------------------------------------
// FileSummaryRecord – one row of the summary table
// ---------------------------------------------------------------------------

/// Per-file summary.
///
/// * structured: `metric_a` = average concentration, `metric_b` = standard deviation
/// * delimited:  `metric_a` = peak current, `metric_b` = estimated concentration
#[derive(Debug, Clone, PartialEq)]
pub struct FileSummaryRecord {
    pub filename: String,
    pub metric_a: f64,
    pub metric_b: f64,
}

impl FileSummaryRecord {
    pub fn new(filename: impl Into<String>, metric_a: f64, metric_b: f64) -> Self {
        FileSummaryRecord {
            filename: filename.into(),
            metric_a,
            metric_b,
        }
    }
}

// ---------------------------------------------------------------------------
// PlottedSeries – what the chart collaborator receives
// ---------------------------------------------------------------------------

/// A named x/y trace handed to the visualization sink.
#[derive(Debug, Clone, PartialEq)]
pub struct PlottedSeries {
    pub filename: String,
    pub x_label: &'static str,
    pub y_label: &'static str,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}
