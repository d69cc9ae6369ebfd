use eframe::egui::Ui;
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoints};

use crate::state::ViewerState;

// ---------------------------------------------------------------------------
// Summary bar charts (central panel)
// ---------------------------------------------------------------------------

/// One bar chart per summary metric, one bar per row.
pub fn summary_charts(ui: &mut Ui, state: &ViewerState) {
    let report = match &state.report {
        Some(r) if !r.is_empty() => r,
        Some(_) => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("Summary file is empty.");
            });
            return;
        }
        None => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("No summary loaded  (Reload to try again)");
            });
            return;
        }
    };

    let columns = report.schema.columns;
    let half = (ui.available_height() - 8.0).max(120.0) / 2.0;

    for (id, label, values) in [
        ("metric_a", columns[1], report.metric_a()),
        ("metric_b", columns[2], report.metric_b()),
    ] {
        let bars: Vec<Bar> = report
            .rows
            .iter()
            .zip(values)
            .enumerate()
            .filter(|(_, (row, _))| state.is_visible(&row.filename))
            .map(|(i, (row, value))| {
                Bar::new(i as f64, value)
                    .name(&row.filename)
                    .fill(state.colors.color_for(&row.filename))
                    .width(0.7)
            })
            .collect();

        Plot::new(id)
            .height(half)
            .x_axis_label("Row")
            .y_axis_label(label)
            .allow_drag(true)
            .allow_zoom(true)
            .allow_scroll(true)
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(BarChart::new(bars).name(label));
            });
    }
}

// ---------------------------------------------------------------------------
// Per-file trace plot
// ---------------------------------------------------------------------------

/// Traces handed over by the processor (concentration vs time, or current
/// vs potential).
pub fn series_plot(ui: &mut Ui, state: &ViewerState) {
    let Some(first) = state.series.first() else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("No traces in this session  (use --plot with scan/process)");
        });
        return;
    };

    Plot::new("series_plot")
        .legend(Legend::default())
        .x_axis_label(first.x_label)
        .y_axis_label(first.y_label)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for series in state.series.iter().filter(|s| state.is_visible(&s.filename)) {
                let points: PlotPoints = series
                    .x
                    .iter()
                    .zip(&series.y)
                    .map(|(&x, &y)| [x, y])
                    .collect();
                plot_ui.line(
                    Line::new(points)
                        .name(&series.filename)
                        .color(state.colors.color_for(&series.filename))
                        .width(1.5),
                );
            }
        });
}
