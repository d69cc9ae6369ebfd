use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, Table};

use crate::data::model::{FileSummaryRecord, Variant};
use crate::data::stats;
use crate::store::Schema;

// ---------------------------------------------------------------------------
// Aggregate report over the summary table
// ---------------------------------------------------------------------------

/// Everything the summary views need, derived from the stored rows.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateReport {
    pub schema: Schema,
    pub rows: Vec<FileSummaryRecord>,
}

impl AggregateReport {
    pub fn from_records(rows: Vec<FileSummaryRecord>, variant: Variant) -> Self {
        AggregateReport {
            schema: Schema::for_variant(variant),
            rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn metric_a(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.metric_a).collect()
    }

    pub fn metric_b(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.metric_b).collect()
    }

    /// Mean of the first metric across all rows.
    pub fn overall_mean(&self) -> Option<f64> {
        stats::mean(&self.metric_a())
    }

    /// Smallest and largest first metric.
    pub fn range(&self) -> Option<(f64, f64)> {
        let values = self.metric_a();
        let first = *values.first()?;
        Some(
            values
                .iter()
                .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v))),
        )
    }

    fn format(&self, value: f64) -> String {
        match self.schema.precision {
            Some(p) => format!("{value:.p$}"),
            None => format!("{value}"),
        }
    }

    /// Text rendering for terminals.
    pub fn render_table(&self) -> String {
        if self.is_empty() {
            return "Summary file is empty.".to_string();
        }

        let mut table = Table::new();
        table.load_preset(UTF8_FULL).set_header(self.schema.columns);
        for row in &self.rows {
            table.add_row(vec![
                Cell::new(&row.filename),
                Cell::new(self.format(row.metric_a)).set_alignment(CellAlignment::Right),
                Cell::new(self.format(row.metric_b)).set_alignment(CellAlignment::Right),
            ]);
        }

        let mut out = table.to_string();
        if let (Some(mean), Some((lo, hi))) = (self.overall_mean(), self.range()) {
            out.push_str(&format!(
                "\n{} files | mean {}: {} | range {} .. {}",
                self.rows.len(),
                self.schema.columns[1],
                self.format(mean),
                self.format(lo),
                self.format(hi)
            ));
        }
        out
    }
}
