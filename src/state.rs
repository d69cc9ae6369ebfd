use std::collections::BTreeSet;
use std::sync::Arc;

use crate::color::FileColors;
use crate::data::model::PlottedSeries;
use crate::report::AggregateReport;
use crate::store::SummaryStore;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Which chart the central panel shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Summary,
    Series,
}

/// The full viewer state, independent of rendering.
pub struct ViewerState {
    /// Table the summary charts are read from.
    pub store: Arc<SummaryStore>,

    /// Last successful load of the summary table.
    pub report: Option<AggregateReport>,

    /// Traces handed over by the file processor, if any.
    pub series: Vec<PlottedSeries>,

    /// Filenames currently hidden from the charts.
    pub hidden: BTreeSet<String>,

    pub colors: FileColors,

    pub view: View,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl ViewerState {
    pub fn new(store: Arc<SummaryStore>, series: Vec<PlottedSeries>) -> Self {
        let view = if series.is_empty() {
            View::Summary
        } else {
            View::Series
        };
        let mut state = ViewerState {
            store,
            report: None,
            series,
            hidden: BTreeSet::new(),
            colors: FileColors::default(),
            view,
            status_message: None,
        };
        state.reload();
        state
    }

    /// Re-read the summary table; keeps the previous report on failure.
    pub fn reload(&mut self) {
        match self.store.load_all() {
            Ok(rows) => {
                log::info!("Loaded {} summary rows from {}", rows.len(), self.store.path().display());
                self.report = Some(AggregateReport::from_records(rows, self.store.variant()));
                self.status_message = None;
            }
            Err(e) => {
                log::error!("Failed to load summary: {e}");
                self.status_message = Some(format!("Error: {e}"));
            }
        }
        self.rebuild_colors();
    }

    fn rebuild_colors(&mut self) {
        let from_rows = self
            .report
            .iter()
            .flat_map(|r| r.rows.iter().map(|row| row.filename.as_str()));
        let from_series = self.series.iter().map(|s| s.filename.as_str());
        self.colors = FileColors::new(from_rows.chain(from_series));
    }

    /// Every filename known to the viewer, sorted, without duplicates.
    pub fn filenames(&self) -> Vec<String> {
        let mut names: BTreeSet<String> = self.series.iter().map(|s| s.filename.clone()).collect();
        if let Some(report) = &self.report {
            names.extend(report.rows.iter().map(|r| r.filename.clone()));
        }
        names.into_iter().collect()
    }

    pub fn is_visible(&self, filename: &str) -> bool {
        !self.hidden.contains(filename)
    }

    pub fn toggle_file(&mut self, filename: &str) {
        if !self.hidden.remove(filename) {
            self.hidden.insert(filename.to_string());
        }
    }

    pub fn show_all(&mut self) {
        self.hidden.clear();
    }

    pub fn hide_all(&mut self) {
        self.hidden = self.filenames().into_iter().collect();
    }
}
