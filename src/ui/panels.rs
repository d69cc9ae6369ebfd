use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::state::{View, ViewerState};

// ---------------------------------------------------------------------------
// Left side panel – file list
// ---------------------------------------------------------------------------

/// Render the left file panel.
pub fn side_panel(ui: &mut Ui, state: &mut ViewerState) {
    ui.heading("Files");
    ui.separator();

    let filenames = state.filenames();
    if filenames.is_empty() {
        ui.label("No files processed yet.");
        return;
    }

    ui.horizontal(|ui: &mut Ui| {
        if ui.small_button("All").clicked() {
            state.show_all();
        }
        if ui.small_button("None").clicked() {
            state.hide_all();
        }
    });

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for name in &filenames {
                let text = RichText::new(name).color(state.colors.color_for(name));
                let mut checked = state.is_visible(name);
                if ui.checkbox(&mut checked, text).changed() {
                    state.toggle_file(name);
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut ViewerState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        if ui.button("Reload").clicked() {
            state.reload();
        }

        ui.separator();

        ui.selectable_value(&mut state.view, View::Summary, "Summary");
        ui.selectable_value(&mut state.view, View::Series, "Traces");

        ui.separator();

        if let Some(report) = &state.report {
            let mut line = format!("{} rows in {}", report.rows.len(), state.store.path().display());
            if let Some(mean) = report.overall_mean() {
                line.push_str(&format!("  |  mean {}: {mean:.2}", report.schema.columns[1]));
            }
            ui.label(line);
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}
