use admin_panel::{AdminConfig, SessionHandle};
use eframe::egui;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;

use crate::state_manager::AdminStateManager;
use crate::ui;

/// Login inputs. Everything but the password survives a restart.
#[derive(Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub email: String,
    #[serde(skip)]
    pub password: String,
    pub server_url: String,
}

pub struct AdminApp {
    state: AdminStateManager,
    login_form: LoginForm,
}

impl AdminApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        config: AdminConfig,
        session: Arc<SessionHandle>,
        runtime: Handle,
    ) -> Self {
        cc.egui_ctx.set_visuals(egui::Visuals::dark());

        let state = AdminStateManager::new(config, session, runtime, cc.egui_ctx.clone());
        let mut login_form: LoginForm = cc
            .storage
            .and_then(|storage| eframe::get_value(storage, eframe::APP_KEY))
            .unwrap_or_default();
        if login_form.server_url.is_empty() {
            login_form.server_url = state.server_url();
        }

        Self { state, login_form }
    }
}

impl eframe::App for AdminApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.state.update_from_async();

        if self.state.panel.logged_in {
            egui::TopBottomPanel::top("table_bar").show(ctx, |ui| {
                ui::tables::top_bar(ui, &mut self.state);
            });
            egui::CentralPanel::default().show(ctx, |ui| {
                ui::tables::content(ui, &mut self.state);
            });
            ui::dialog::show(ctx, &mut self.state);
        } else {
            egui::CentralPanel::default().show(ctx, |ui| {
                ui::login::show(ui, &mut self.login_form, &mut self.state);
            });
        }

        ui::toasts::show(ctx, &self.state.toasts);

        if !self.state.toasts.is_empty() {
            ctx.request_repaint_after(Duration::from_millis(250));
        }
    }

    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        eframe::set_value(storage, eframe::APP_KEY, &self.login_form);
    }
}
