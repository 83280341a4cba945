use eframe::egui;

use crate::app::LoginForm;
use crate::state_manager::AdminStateManager;

pub fn show(ui: &mut egui::Ui, form: &mut LoginForm, state: &mut AdminStateManager) {
    ui.vertical_centered(|ui| {
        ui.add_space(80.0);
        ui.heading("🔐 Admin Login");
        ui.add_space(16.0);

        let mut submitted = false;
        egui::Grid::new("login_grid").num_columns(2).spacing([12.0, 8.0]).show(ui, |ui| {
            ui.label("Email:");
            ui.text_edit_singleline(&mut form.email);
            ui.end_row();

            ui.label("Password:");
            let password = ui.add(egui::TextEdit::singleline(&mut form.password).password(true));
            if password.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                submitted = true;
            }
            ui.end_row();

            ui.label("Server:");
            ui.text_edit_singleline(&mut form.server_url);
            ui.end_row();
        });

        if let Some(error) = &state.panel.login_error {
            ui.add_space(8.0);
            ui.colored_label(egui::Color32::RED, error.as_str());
        }

        ui.add_space(12.0);
        let busy = state.panel.is_loading;
        if ui.add_enabled(!busy, egui::Button::new("Login")).clicked() {
            submitted = true;
        }
        if busy {
            ui.spinner();
        }

        if submitted && !busy {
            state.login(&form.email, &form.password, &form.server_url);
            form.password.clear();
        }
    });
}
