use admin_panel::dialog::DialogKind;
use admin_panel::record::field_label;
use eframe::egui;

use crate::state_manager::AdminStateManager;

pub fn show(ctx: &egui::Context, state: &mut AdminStateManager) {
    let Some(kind) = state.panel.dialog.kind() else {
        return;
    };

    let mut open = true;
    let mut submit = false;
    let mut cancel = false;

    egui::Window::new(state.panel.dialog.title())
        .collapsible(false)
        .resizable(true)
        .open(&mut open)
        .show(ctx, |ui| {
            match kind {
                DialogKind::Delete => {
                    ui.label("Are you sure you want to delete this record?");
                }
                DialogKind::Add | DialogKind::Edit => {
                    let fields = state.panel.dialog.fields().to_vec();
                    if fields.is_empty() {
                        ui.label("No editable fields");
                    }
                    egui::Grid::new("dialog_form").num_columns(2).show(ui, |ui| {
                        for key in &fields {
                            ui.label(format!("{}:", field_label(key)));
                            let mut text = state.panel.dialog.field_text(key);
                            if ui.text_edit_singleline(&mut text).changed() {
                                state.panel.set_field(key, text);
                            }
                            ui.end_row();
                        }
                    });
                }
            }

            ui.separator();
            ui.horizontal(|ui| {
                if ui.button("Cancel").clicked() {
                    cancel = true;
                }
                let label = match kind {
                    DialogKind::Add => "Add",
                    DialogKind::Edit => "Save",
                    DialogKind::Delete => "Delete",
                };
                let busy = state.panel.is_loading;
                if ui.add_enabled(!busy, egui::Button::new(label)).clicked() {
                    submit = true;
                }
                if busy {
                    ui.spinner();
                }
            });
        });

    if cancel || !open {
        state.panel.close_dialog();
    } else if submit {
        match kind {
            DialogKind::Delete => state.confirm_delete(),
            DialogKind::Add | DialogKind::Edit => state.submit_dialog(),
        }
    }
}
