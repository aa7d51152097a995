use eframe::egui;

use crate::config::DashboardConfig;
use crate::state::{AppState, Page};
use crate::ui::{pages, panels};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct SalesDashboardApp {
    pub state: AppState,
}

impl SalesDashboardApp {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            state: AppState::new(config),
        }
    }
}

impl eframe::App for SalesDashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: navigation, header, refresh notice ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
            panels::header(ui, &self.state);
        });

        // Startup failure: nothing else renders.
        if let Some(msg) = &self.state.fatal_error {
            egui::CentralPanel::default().show(ctx, |ui| {
                panels::fatal_error(ui, msg);
            });
            return;
        }

        // ---- Left side panel: selectors and filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: active page ----
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| match self.state.page {
                    Page::CurrentMonth => pages::current_month(ui, &mut self.state),
                    Page::YoyComparison => pages::yoy_comparison(ui, &self.state),
                });
        });
    }
}
