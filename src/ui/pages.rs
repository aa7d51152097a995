use eframe::egui::{self, Color32, RichText, Ui};

use crate::color::{indicator_color, BRAND_RED};
use crate::data::compare::{DiffIndicator, MetricComparison};
use crate::format::format_grouped;
use crate::state::{AppState, Page, DIVISION_COLUMN, STATE_COLUMN};
use crate::ui::{panels, plot, table};

// ---------------------------------------------------------------------------
// Current month page
// ---------------------------------------------------------------------------

/// KPI total, top-N state bars, top-N division donut, filtered rows + export.
pub fn current_month(ui: &mut Ui, state: &mut AppState) {
    ui.heading(Page::CurrentMonth.heading());
    ui.add_space(6.0);

    let mut export_clicked = false;
    let n = state.config.top_n;

    match &state.current_view {
        None => {
            ui.label("No data loaded.");
        }
        Some(Err(e)) => warning(ui, &format!("⚠️ {e}")),
        Some(Ok(view)) => {
            let metric = view.metric.as_deref().unwrap_or("metric");

            match &view.total {
                Ok(total) => kpi_card(ui, &format!("Total {metric}"), &format_grouped(*total, 2)),
                Err(_) => warning(ui, &format!("⚠️ '{metric}' column not found in dataset.")),
            }

            if let Ok(states) = &view.top_states {
                ui.add_space(12.0);
                banner(ui, &format!("Top {n} States by {metric}"));
                plot::top_n_bars(ui, "top_states", states);
            }

            if let Ok(divisions) = &view.top_divisions {
                ui.add_space(12.0);
                banner(ui, &format!("Top {n} Divisions by {metric}"));
                plot::top_n_donut(ui, "top_divisions", divisions);
            }

            for (column, section) in [
                (STATE_COLUMN, &view.top_states),
                (DIVISION_COLUMN, &view.top_divisions),
            ] {
                if let Err(e) = section {
                    ui.label(RichText::new(format!("{column} chart skipped: {e}")).weak());
                }
            }

            ui.add_space(12.0);
            banner(ui, "Filtered Data - All Rows");
            table::data_table(ui, "filtered_rows", &view.rows);

            ui.add_space(6.0);
            if ui.button("⬇ Download filtered data").clicked() {
                export_clicked = true;
            }
        }
    }

    if export_clicked {
        panels::save_export_dialog(state);
    }
}

// ---------------------------------------------------------------------------
// YoY comparison page
// ---------------------------------------------------------------------------

/// Quantity and amount KPIs for the selected month, both periods, plus the
/// rows behind each side.
pub fn yoy_comparison(ui: &mut Ui, state: &AppState) {
    ui.heading(Page::YoyComparison.heading());
    ui.add_space(6.0);

    match &state.yoy_view {
        None => {
            ui.label("No months available in the last FY data.");
        }
        Some(Err(e)) => warning(ui, &format!("⚠️ {e}")),
        Some(Ok(cmp)) => {
            metric_row(ui, "Sales Quantity", "Qty", &cmp.quantity);
            metric_row(ui, "Sales Amount", "Amt", &cmp.amount);

            ui.add_space(12.0);
            egui::CollapsingHeader::new("Show Filtered Current Month Data")
                .id_salt("yoy_current")
                .show(ui, |ui: &mut Ui| {
                    table::data_table(ui, "yoy_current_rows", &cmp.current_rows);
                });
            egui::CollapsingHeader::new(format!("Show Filtered Last FY Data for {}", cmp.month))
                .id_salt("yoy_prior")
                .show(ui, |ui: &mut Ui| {
                    table::data_table(ui, "yoy_prior_rows", &cmp.prior_rows);
                });
        }
    }
}

fn metric_row(ui: &mut Ui, title: &str, short: &str, metric: &MetricComparison) {
    ui.columns(3, |cols: &mut [Ui]| {
        kpi_card(
            &mut cols[0],
            &format!("{title} (Current)"),
            &format_grouped(metric.current, 0),
        );
        kpi_card(
            &mut cols[1],
            &format!("{title} (Last FY)"),
            &format_grouped(metric.prior, 0),
        );
        diff_card(&mut cols[2], &format!("{short} Difference"), metric.indicator());
    });
}

// ---------------------------------------------------------------------------
// Building blocks
// ---------------------------------------------------------------------------

fn kpi_card(ui: &mut Ui, title: &str, value: &str) {
    egui::Frame::default()
        .fill(BRAND_RED)
        .inner_margin(16.0)
        .show(ui, |ui: &mut Ui| {
            ui.vertical_centered(|ui: &mut Ui| {
                ui.label(RichText::new(title).color(Color32::WHITE).size(18.0).strong());
                ui.label(RichText::new(value).color(Color32::WHITE).size(28.0).strong());
            });
        });
}

fn diff_card(ui: &mut Ui, title: &str, indicator: DiffIndicator) {
    egui::Frame::default()
        .inner_margin(16.0)
        .show(ui, |ui: &mut Ui| {
            ui.vertical_centered(|ui: &mut Ui| {
                ui.label(RichText::new(title).size(18.0).strong());
                ui.label(
                    RichText::new(indicator.to_string())
                        .color(indicator_color(indicator))
                        .size(20.0)
                        .strong(),
                );
            });
        });
}

fn banner(ui: &mut Ui, title: &str) {
    egui::Frame::default()
        .fill(BRAND_RED)
        .inner_margin(10.0)
        .show(ui, |ui: &mut Ui| {
            ui.vertical_centered(|ui: &mut Ui| {
                ui.label(RichText::new(title).color(Color32::WHITE).size(18.0).strong());
            });
        });
}

fn warning(ui: &mut Ui, message: &str) {
    ui.label(RichText::new(message).color(Color32::RED));
}
