use eframe::egui;

use crate::state::ViewerState;
use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct ReporterApp {
    pub state: ViewerState,
}

impl ReporterApp {
    pub fn new(state: ViewerState) -> Self {
        Self { state }
    }
}

impl eframe::App for ReporterApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: toolbar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: file list ----
        egui::SidePanel::left("file_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: charts ----
        egui::CentralPanel::default().show(ctx, |ui| match self.state.view {
            crate::state::View::Summary => plot::summary_charts(ui, &self.state),
            crate::state::View::Series => plot::series_plot(ui, &self.state),
        });
    }
}

/// Open the chart window and block until it is closed.
pub fn run_viewer(state: ViewerState) -> anyhow::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 760.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Concentration Reporter",
        options,
        Box::new(|_cc| Ok(Box::new(ReporterApp::new(state)))),
    )
    .map_err(|e| anyhow::anyhow!("chart window failed: {e}"))
}
