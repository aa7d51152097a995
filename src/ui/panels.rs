use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::color::{BRAND_RED, NOTICE_PINK};
use crate::data::filter::FilterChoice;
use crate::state::{AppState, Page};

// ---------------------------------------------------------------------------
// Top bar – page navigation
// ---------------------------------------------------------------------------

/// Render the page switcher and reload button.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        for page in Page::ALL {
            if ui.selectable_label(state.page == page, page.label()).clicked() {
                state.set_page(page);
            }
        }

        ui.separator();

        if ui.button("⟳ Reload data").clicked() {
            state.reload();
        }

        if let Some(ds) = &state.datasets {
            ui.separator();
            ui.label(format!(
                "{} current rows, {} last FY rows",
                ds.current.len(),
                ds.prior.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::DARK_GREEN));
        }
    });
}

// ---------------------------------------------------------------------------
// Header banner + notice
// ---------------------------------------------------------------------------

pub fn header(ui: &mut Ui, state: &AppState) {
    egui::Frame::default()
        .fill(BRAND_RED)
        .inner_margin(12.0)
        .show(ui, |ui: &mut Ui| {
            ui.horizontal_centered(|ui: &mut Ui| {
                if let Some(bytes) = &state.logo {
                    ui.add(
                        egui::Image::from_bytes("bytes://dashboard-logo.png", bytes.clone())
                            .max_height(50.0),
                    );
                }
                ui.heading(
                    RichText::new(&state.config.title)
                        .color(Color32::WHITE)
                        .strong(),
                );
            });
        });

    egui::Frame::default()
        .fill(NOTICE_PINK)
        .inner_margin(8.0)
        .show(ui, |ui: &mut Ui| {
            ui.label(
                RichText::new(
                    "⚠️ This Dashboard Is Daily Refreshed at 10 AM and 5 PM. \
                     You will be able to extract new updated data only after these times.",
                )
                .color(Color32::BLACK),
            );
        });
    ui.add_space(4.0);
}

// ---------------------------------------------------------------------------
// Startup failure
// ---------------------------------------------------------------------------

pub fn fatal_error(ui: &mut Ui, message: &str) {
    ui.vertical_centered(|ui: &mut Ui| {
        ui.add_space(40.0);
        for (i, line) in message.lines().enumerate() {
            let text = RichText::new(line);
            if i == 0 {
                ui.heading(text.color(Color32::RED));
            } else {
                ui.label(text.monospace());
            }
        }
    });
}

// ---------------------------------------------------------------------------
// Left side panel – selectors and filter widgets
// ---------------------------------------------------------------------------

/// Deferred so the state is not borrowed while widgets are drawn.
enum SideAction {
    Metric(String),
    Month(String),
    Toggle(String, FilterChoice),
    Reset(String),
}

/// Render the left panel: metric or month selector, then one multi-select
/// per filterable column with the ALL entry on top.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    let mut action: Option<SideAction> = None;

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            match state.page {
                Page::CurrentMonth => {
                    ui.strong("Select Metric");
                    let current = state.metric.clone().unwrap_or_default();
                    egui::ComboBox::from_id_salt("metric")
                        .selected_text(&current)
                        .show_ui(ui, |ui: &mut Ui| {
                            for metric in &state.metric_options {
                                if ui.selectable_label(current == *metric, metric).clicked() {
                                    action = Some(SideAction::Metric(metric.clone()));
                                }
                            }
                        });
                }
                Page::YoyComparison => {
                    ui.strong("Select Month for YoY Comparison");
                    let current = state.selected_month.clone().unwrap_or_default();
                    let months = state
                        .datasets
                        .as_ref()
                        .map(|ds| ds.month_options.as_slice())
                        .unwrap_or_default();
                    egui::ComboBox::from_id_salt("month")
                        .selected_text(&current)
                        .show_ui(ui, |ui: &mut Ui| {
                            for month in months {
                                if ui.selectable_label(current == *month, month).clicked() {
                                    action = Some(SideAction::Month(month.clone()));
                                }
                            }
                        });
                }
            }

            ui.separator();
            ui.heading("Filters");

            for options in &state.filter_options {
                let col = &options.column;
                let selected = state.selection(col);
                let summary = if selected.contains(&FilterChoice::All) {
                    "ALL".to_string()
                } else {
                    format!("{} selected", selected.len())
                };

                egui::CollapsingHeader::new(RichText::new(format!("{col}  ({summary})")).strong())
                    .id_salt(col)
                    .default_open(false)
                    .show(ui, |ui: &mut Ui| {
                        if ui.small_button("Reset").clicked() {
                            action = Some(SideAction::Reset(col.clone()));
                        }

                        let entries = std::iter::once(FilterChoice::All)
                            .chain(options.values.iter().cloned().map(FilterChoice::Value));
                        for choice in entries {
                            let mut checked = selected.contains(&choice);
                            if ui.checkbox(&mut checked, choice.to_string()).changed() {
                                action = Some(SideAction::Toggle(col.clone(), choice));
                            }
                        }
                    });
            }
        });

    match action {
        Some(SideAction::Metric(metric)) => state.set_metric(metric),
        Some(SideAction::Month(month)) => state.set_month(month),
        Some(SideAction::Toggle(col, choice)) => state.toggle_choice(&col, choice),
        Some(SideAction::Reset(col)) => state.reset_column(&col),
        None => {}
    }
}

// ---------------------------------------------------------------------------
// Export dialog
// ---------------------------------------------------------------------------

pub fn save_export_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Download filtered data")
        .set_file_name(&state.config.export_file_name)
        .add_filter("CSV", &["csv"])
        .save_file();

    if let Some(path) = file {
        if let Err(e) = state.export_current_view(&path) {
            log::error!("Failed to export: {e:#}");
            state.status_message = Some(format!("Export failed: {e:#}"));
        }
    }
}
