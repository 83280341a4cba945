use admin_panel::Severity;
use eframe::egui;

use crate::state_manager::Toast;

fn severity_color(severity: Severity) -> egui::Color32 {
    match severity {
        Severity::Info => egui::Color32::LIGHT_BLUE,
        Severity::Success => egui::Color32::GREEN,
        Severity::Warning => egui::Color32::YELLOW,
        Severity::Error => egui::Color32::RED,
    }
}

/// Stack of transient messages in the bottom-right corner.
pub fn show(ctx: &egui::Context, toasts: &[Toast]) {
    if toasts.is_empty() {
        return;
    }

    egui::Area::new(egui::Id::new("toasts"))
        .anchor(egui::Align2::RIGHT_BOTTOM, [-12.0, -12.0])
        .order(egui::Order::Foreground)
        .show(ctx, |ui| {
            for toast in toasts {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.colored_label(severity_color(toast.notification.severity), toast.notification.message.as_str());
                });
                ui.add_space(4.0);
            }
        });
}
