mod app;
mod cache;
mod color;
mod config;
mod data;
mod error;
mod format;
mod state;
mod ui;

use app::SalesDashboardApp;
use config::DashboardConfig;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let config = match DashboardConfig::load() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {e:#}");
            std::process::exit(1);
        }
    };
    let title = config.title.clone();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        &title,
        options,
        Box::new(|cc| {
            // Install image loaders so egui can render the png logo.
            egui_extras::install_image_loaders(&cc.egui_ctx);
            Ok(Box::new(SalesDashboardApp::new(config)))
        }),
    )
}
