use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use walkdir::WalkDir;

use crate::data::calibration::Calibration;
use crate::data::loader::{reader_for, FormatReader};
use crate::data::model::{FileSummaryRecord, MeasurementSeries, PlottedSeries, Variant};
use crate::data::stats;
use crate::error::{CalibrationError, ProcessError, ReadError};
use crate::store::SummaryStore;

// ---------------------------------------------------------------------------
// Visualization sink
// ---------------------------------------------------------------------------

/// Receives each processed trace for display. Failures are logged by the
/// processor and never affect the summary table.
pub trait SeriesSink: Send + Sync {
    fn present(&self, series: &PlottedSeries) -> anyhow::Result<()>;
}

/// Keeps every presented trace in memory for the chart viewer.
#[derive(Debug, Default)]
pub struct SeriesCollector {
    series: Mutex<Vec<PlottedSeries>>,
}

impl SeriesCollector {
    pub fn take(&self) -> Vec<PlottedSeries> {
        std::mem::take(&mut *self.series.lock())
    }
}

impl SeriesSink for SeriesCollector {
    fn present(&self, series: &PlottedSeries) -> anyhow::Result<()> {
        self.series.lock().push(series.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum ProcessOutcome {
    Recorded(FileSummaryRecord),
    /// Parsed fine but nothing survived filtering; no row was written.
    Skipped { filename: String },
}

/// Result of a directory scan. One bad file never stops the scan.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub recorded: Vec<FileSummaryRecord>,
    pub skipped: Vec<String>,
    pub failed: Vec<(PathBuf, String)>,
}

// ---------------------------------------------------------------------------
// FileProcessor
// ---------------------------------------------------------------------------

/// Reader + calibration + summary store for one format variant.
pub struct FileProcessor {
    variant: Variant,
    extension: String,
    reader: Box<dyn FormatReader>,
    calibration: Calibration,
    store: Arc<SummaryStore>,
    sink: Option<Arc<dyn SeriesSink>>,
}

impl FileProcessor {
    pub fn new(
        variant: Variant,
        extension: impl Into<String>,
        calibration: Calibration,
        store: Arc<SummaryStore>,
    ) -> Result<Self, CalibrationError> {
        let expected = match variant {
            Variant::Structured => matches!(calibration, Calibration::LinearVoltage { .. }),
            Variant::Delimited => matches!(calibration, Calibration::CurrentIntercept { .. }),
        };
        if !expected {
            return Err(CalibrationError::Configuration(format!(
                "{calibration:?} does not apply to {variant} files"
            )));
        }
        Ok(FileProcessor {
            variant,
            extension: extension.into().trim_start_matches('.').to_ascii_lowercase(),
            reader: reader_for(variant),
            calibration,
            store,
            sink: None,
        })
    }

    pub fn with_sink(mut self, sink: Arc<dyn SeriesSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn store(&self) -> &Arc<SummaryStore> {
        &self.store
    }

    /// Whether `path` carries the extension this processor handles.
    pub fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(&self.extension))
    }

    /// Process one file and append its summary row.
    pub fn process_file(&self, path: &Path) -> Result<ProcessOutcome, ProcessError> {
        if !self.accepts(path) {
            return Err(ProcessError::UnsupportedExtension {
                path: path.to_path_buf(),
                expected: self.extension.clone(),
            });
        }
        log::info!("Processing file: {}", path.display());

        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let read_err = |source: ReadError| ProcessError::Read {
            path: path.to_path_buf(),
            source,
        };
        let bytes = std::fs::read(path).map_err(|e| read_err(e.into()))?;
        let series = self.reader.read(&bytes).map_err(read_err)?;

        let (outcome, plotted) = match self.variant {
            Variant::Structured => self.summarize_timed(filename, &series),
            Variant::Delimited => self.summarize_sweep(filename, &series),
        };

        if let ProcessOutcome::Recorded(record) = &outcome {
            self.store.append(record)?;
            log::info!(
                "{}: {} = {}, {} = {}",
                record.filename,
                self.store.schema().columns[1],
                record.metric_a,
                self.store.schema().columns[2],
                record.metric_b
            );
        }

        if let (Some(sink), Some(plotted)) = (&self.sink, plotted) {
            if let Err(e) = sink.present(&plotted) {
                log::warn!("{}: could not hand series to viewer: {e:#}", plotted.filename);
            }
        }

        Ok(outcome)
    }

    fn summarize_timed(
        &self,
        filename: String,
        series: &MeasurementSeries,
    ) -> (ProcessOutcome, Option<PlottedSeries>) {
        let conc = self.calibration.apply(series);
        let (Some(avg), Some(sd)) = (
            stats::mean(&conc.values),
            stats::population_std_dev(&conc.values),
        ) else {
            log::warn!("{filename}: no valid voltage readings with S=0, nothing recorded");
            return (ProcessOutcome::Skipped { filename }, None);
        };

        let plotted = PlottedSeries {
            filename: filename.clone(),
            x_label: "Time (s)",
            y_label: "Concentration (µM)",
            x: conc.time,
            y: conc.values,
        };
        (
            ProcessOutcome::Recorded(FileSummaryRecord::new(filename, avg, sd)),
            Some(plotted),
        )
    }

    fn summarize_sweep(
        &self,
        filename: String,
        series: &MeasurementSeries,
    ) -> (ProcessOutcome, Option<PlottedSeries>) {
        let currents = series.currents();
        let Some(peak) = stats::peak_abs(&currents) else {
            log::warn!("{filename}: no data lines found, nothing recorded");
            return (ProcessOutcome::Skipped { filename }, None);
        };
        let concentration = self.calibration.estimate_concentration(peak);

        let plotted = PlottedSeries {
            filename: filename.clone(),
            x_label: "Potential (V)",
            y_label: "Current (µA)",
            x: series.voltages(),
            y: currents,
        };
        (
            ProcessOutcome::Recorded(FileSummaryRecord::new(filename, peak, concentration)),
            Some(plotted),
        )
    }

    /// Process every matching file directly inside `dir`, in name order.
    pub fn process_directory(&self, dir: &Path) -> BatchReport {
        let mut report = BatchReport::default();

        let mut paths = Vec::new();
        for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
            match entry {
                Ok(entry) if entry.file_type().is_file() && self.accepts(entry.path()) => {
                    paths.push(entry.into_path());
                }
                Ok(_) => {}
                Err(e) => {
                    log::error!("Scanning {}: {e}", dir.display());
                    let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| dir.to_path_buf());
                    report.failed.push((path, e.to_string()));
                }
            }
        }

        for path in paths {
            match self.process_file(&path) {
                Ok(ProcessOutcome::Recorded(record)) => report.recorded.push(record),
                Ok(ProcessOutcome::Skipped { filename }) => report.skipped.push(filename),
                Err(e) => {
                    log::error!("Failed to process file: {e}");
                    report.failed.push((path, e.to_string()));
                }
            }
        }

        log::info!(
            "Scan of {} finished: {} recorded, {} skipped, {} failed",
            dir.display(),
            report.recorded.len(),
            report.skipped.len(),
            report.failed.len()
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn structured(dir: &Path) -> FileProcessor {
        let store = Arc::new(SummaryStore::new(dir.join("summary.csv"), Variant::Structured));
        FileProcessor::new(
            Variant::Structured,
            "pssession",
            Calibration::linear_voltage(10_000.0).unwrap(),
            store,
        )
        .unwrap()
    }

    fn delimited(dir: &Path) -> FileProcessor {
        let store = Arc::new(SummaryStore::new(dir.join("summary.csv"), Variant::Delimited));
        FileProcessor::new(
            Variant::Delimited,
            ".TXT",
            Calibration::current_intercept(2.0, 0.2).unwrap(),
            store,
        )
        .unwrap()
    }

    fn session(volts: &[(f64, i64)]) -> String {
        let t: Vec<String> = (0..volts.len()).map(|i| format!("{{\"V\":{i}}}")).collect();
        let v: Vec<String> = volts
            .iter()
            .map(|(v, s)| format!("{{\"V\":{v},\"S\":{s}}}"))
            .collect();
        format!(
            "{{\"Measurements\":[{{\"DataSet\":{{\"Values\":[\
             {{\"Description\":\"time\",\"DataValues\":[{}]}},\
             {{\"Description\":\"potential\",\"DataValues\":[{}]}}]}}}}]}}",
            t.join(","),
            v.join(",")
        )
    }

    #[test]
    fn structured_file_records_mean_and_population_std() {
        let dir = tempfile::tempdir().unwrap();
        let proc = structured(dir.path());
        let path = dir.path().join("run.pssession");
        std::fs::write(&path, session(&[(0.001, 0), (0.002, 0), (0.5, 3), (0.003, 0)])).unwrap();

        let outcome = proc.process_file(&path).unwrap();
        let ProcessOutcome::Recorded(record) = outcome else {
            panic!("expected a record");
        };
        assert_eq!(record.filename, "run.pssession");
        assert!((record.metric_a - 20.0).abs() < 1e-9);
        assert!((record.metric_b - 8.1649658).abs() < 1e-6);

        let text = std::fs::read_to_string(dir.path().join("summary.csv")).unwrap();
        assert!(text.ends_with("run.pssession,20.00,8.16\n"));
    }

    #[test]
    fn empty_structured_series_is_skipped_without_a_row() {
        let dir = tempfile::tempdir().unwrap();
        let proc = structured(dir.path());
        let path = dir.path().join("bad.pssession");
        std::fs::write(&path, session(&[(0.1, 1), (0.2, 2)])).unwrap();

        assert_eq!(
            proc.process_file(&path).unwrap(),
            ProcessOutcome::Skipped {
                filename: "bad.pssession".to_string()
            }
        );
        assert!(!dir.path().join("summary.csv").exists());
    }

    #[test]
    fn malformed_structured_payload_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let proc = structured(dir.path());
        let path = dir.path().join("broken.pssession");
        std::fs::write(&path, "{\"Measurements\": [").unwrap();
        assert!(matches!(
            proc.process_file(&path),
            Ok(ProcessOutcome::Skipped { .. })
        ));
    }

    #[test]
    fn delimited_file_records_peak_and_estimate() {
        let dir = tempfile::tempdir().unwrap();
        let proc = delimited(dir.path());
        let path = dir.path().join("cv.txt");
        std::fs::write(&path, "E(V) i(uA)\n-0.2 -5.2\n0.0 3.1\n0.2 4.9\n").unwrap();

        let ProcessOutcome::Recorded(record) = proc.process_file(&path).unwrap() else {
            panic!("expected a record");
        };
        assert_eq!(record.metric_a, 5.2);
        assert!((record.metric_b - 2.5).abs() < 1e-12);
    }

    #[test]
    fn delimited_parse_error_aborts_only_that_file() {
        let dir = tempfile::tempdir().unwrap();
        let proc = delimited(dir.path());
        let path = dir.path().join("bad.txt");
        std::fs::write(&path, "0.1 0.2\n0.3 oops\n").unwrap();
        let err = proc.process_file(&path).unwrap_err();
        assert!(matches!(err, ProcessError::Read { .. }));
        assert!(!dir.path().join("summary.csv").exists());
    }

    #[test]
    fn wrong_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let proc = structured(dir.path());
        let err = proc.process_file(&dir.path().join("notes.txt")).unwrap_err();
        assert!(matches!(err, ProcessError::UnsupportedExtension { .. }));
    }

    #[test]
    fn mismatched_calibration_is_a_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(SummaryStore::new(dir.path().join("s.csv"), Variant::Delimited));
        let result = FileProcessor::new(
            Variant::Delimited,
            "txt",
            Calibration::linear_voltage(1.0).unwrap(),
            store,
        );
        assert!(result.is_err());
    }

    struct FailingSink;

    impl SeriesSink for FailingSink {
        fn present(&self, _series: &PlottedSeries) -> anyhow::Result<()> {
            anyhow::bail!("window closed")
        }
    }

    #[test]
    fn sink_failure_does_not_fail_the_write() {
        let dir = tempfile::tempdir().unwrap();
        let proc = delimited(dir.path()).with_sink(Arc::new(FailingSink));
        let path = dir.path().join("cv.txt");
        std::fs::write(&path, "0.1 1.0\n").unwrap();
        assert!(proc.process_file(&path).is_ok());
        assert_eq!(proc.store().load_all().unwrap().len(), 1);
    }

    #[test]
    fn collector_receives_plotted_series() {
        let dir = tempfile::tempdir().unwrap();
        let collector = Arc::new(SeriesCollector::default());
        let proc = structured(dir.path()).with_sink(collector.clone());
        let path = dir.path().join("run.pssession");
        std::fs::write(&path, session(&[(0.001, 0), (0.002, 0)])).unwrap();
        proc.process_file(&path).unwrap();

        let plotted = collector.take();
        assert_eq!(plotted.len(), 1);
        assert_eq!(plotted[0].x, vec![0.0, 1.0]);
        assert_eq!(plotted[0].y.len(), 2);
        assert!(collector.take().is_empty());
    }

    #[test]
    fn directory_scan_isolates_failures() {
        let dir = tempfile::tempdir().unwrap();
        let proc = delimited(dir.path());
        std::fs::write(dir.path().join("a.txt"), "0.1 1.0\n").unwrap();
        std::fs::write(dir.path().join("b.txt"), "0.1 nope\n").unwrap();
        std::fs::write(dir.path().join("c.txt"), "only a header\n").unwrap();
        std::fs::write(dir.path().join("d.txt"), "0.1 -3.0\n").unwrap();
        std::fs::write(dir.path().join("ignored.csv"), "0.1 1.0\n").unwrap();

        let report = proc.process_directory(dir.path());
        let names: Vec<&str> = report.recorded.iter().map(|r| r.filename.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "d.txt"]);
        assert_eq!(report.skipped, vec!["c.txt".to_string()]);
        assert_eq!(report.failed.len(), 1);
        assert!(report.failed[0].0.ends_with("b.txt"));
    }
}
