//! Electrochemical sensor exports → analyte concentration summaries.
//!
//! ```text
//!  trigger (scan / new file)
//!        │
//!        ▼
//!   FileProcessor ──► FormatReader ──► Calibration ──► SummaryStore
//!                                                          │
//!                                   AggregateReport ◄──────┘
//! ```

pub mod app;
pub mod color;
pub mod config;
pub mod data;
pub mod error;
pub mod monitor;
pub mod processor;
pub mod report;
pub mod state;
pub mod store;
pub mod ui;

pub use config::Config;
pub use data::calibration::{Calibration, CalibrationConfig};
pub use data::model::{FileSummaryRecord, MeasurementSeries, RawSample, Variant};
pub use monitor::Monitor;
pub use processor::{BatchReport, FileProcessor, ProcessOutcome, SeriesCollector, SeriesSink};
pub use report::AggregateReport;
pub use store::SummaryStore;
