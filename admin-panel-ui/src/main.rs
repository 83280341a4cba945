// Desktop entry point for the admin panel
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app;
mod state_manager;
mod ui;

use admin_panel::{AdminConfig, FileSessionStore, SessionHandle};
use std::sync::Arc;

#[tokio::main]
async fn main() -> eframe::Result<()> {
    env_logger::init();

    log::info!("🚀 Starting Admin Panel");

    let config = match AdminConfig::load() {
        Ok(config) => config,
        Err(e) => {
            log::error!("❌ {}; continuing with defaults", e);
            AdminConfig::default()
        }
    };

    let store = Arc::new(FileSessionStore::new(config.session_path()));
    let session = Arc::new(SessionHandle::open_or_default(store));

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([800.0, 500.0])
            .with_title("Admin Panel"),
        ..Default::default()
    };

    let runtime = tokio::runtime::Handle::current();
    eframe::run_native(
        "Admin Panel",
        native_options,
        Box::new(move |cc| Ok(Box::new(app::AdminApp::new(cc, config, session, runtime)))),
    )
}
