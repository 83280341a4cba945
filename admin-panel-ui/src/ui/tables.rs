use admin_panel::record::render_cell;
use admin_panel::Record;
use eframe::egui;

use crate::state_manager::AdminStateManager;

/// Row button pressed in a grid.
enum RowAction {
    Edit(String, Record),
    Delete(String, Record),
}

pub fn top_bar(ui: &mut egui::Ui, state: &mut AdminStateManager) {
    ui.horizontal(|ui| {
        ui.heading("🗂 Admin Panel");
        ui.separator();

        let mut picked = None;
        let selected = state
            .panel
            .selected_table
            .clone()
            .unwrap_or_else(|| "Select a table".to_string());
        egui::ComboBox::from_id_salt("table_select")
            .selected_text(selected)
            .show_ui(ui, |ui| {
                for table in &state.panel.tables {
                    let current = state.panel.selected_table.as_deref() == Some(table.as_str());
                    if ui.selectable_label(current, table.as_str()).clicked() {
                        picked = Some(table.clone());
                    }
                }
            });
        if let Some(table) = picked {
            state.select_table(&table);
        }

        if ui
            .add_enabled(state.panel.can_add(), egui::Button::new("➕ Add"))
            .clicked()
        {
            state.panel.open_add();
        }
        if ui.button("🔄 Reload").clicked() {
            state.reload();
        }
        if ui
            .add_enabled(state.panel.can_run_all(), egui::Button::new("▶ Run All"))
            .clicked()
        {
            state.run_all();
        }

        ui.label(format!(
            "Total: {} | Success: {}",
            state.panel.total_count, state.panel.success_count
        ));
        if state.panel.is_busy() {
            ui.spinner();
        }

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.button("Logout").clicked() {
                state.logout();
            }
        });
    });
}

pub fn content(ui: &mut egui::Ui, state: &mut AdminStateManager) {
    let mut action = None;
    let mut toggled = None;

    egui::ScrollArea::both().auto_shrink([false, false]).show(ui, |ui| {
        let panel = &state.panel;

        match &panel.selected_table {
            Some(table) => {
                ui.heading(table.as_str());
                if panel.rows.is_empty() && !panel.is_loading {
                    ui.label("No rows");
                } else if let Some(a) = records_grid(ui, "selected_grid", table, &panel.columns(), &panel.rows) {
                    action = Some(a);
                }
            }
            None => {
                ui.label("Select a table to view its rows.");
            }
        }

        if !panel.all_rows.is_empty() {
            ui.add_space(16.0);
            ui.separator();
            ui.heading("All tables");
        }

        for (table, rows) in &panel.all_rows {
            let header = egui::CollapsingHeader::new(format!("{} ({} rows)", table, rows.len()))
                .id_salt(("run_all", table.as_str()))
                .open(Some(panel.is_expanded(table)))
                .show(ui, |ui| {
                    if rows.is_empty() {
                        ui.label("No rows");
                        return None;
                    }
                    let columns = panel.rules().columns(rows);
                    records_grid(ui, ("section_grid", table.as_str()), table, &columns, rows)
                });
            if header.header_response.clicked() {
                toggled = Some(table.clone());
            }
            if let Some(Some(a)) = header.body_returned {
                action = Some(a);
            }
        }
    });

    if let Some(table) = toggled {
        state.panel.toggle_expanded(&table);
    }
    match action {
        Some(RowAction::Edit(table, row)) => state.panel.open_edit(&table, &row),
        Some(RowAction::Delete(table, row)) => state.panel.open_delete(&table, &row),
        None => {}
    }
}

fn records_grid(
    ui: &mut egui::Ui,
    id_salt: impl std::hash::Hash,
    table: &str,
    columns: &[String],
    rows: &[Record],
) -> Option<RowAction> {
    let mut action = None;

    egui::Grid::new(id_salt).striped(true).show(ui, |ui| {
        for column in columns {
            ui.label(egui::RichText::new(column).strong());
        }
        ui.label(egui::RichText::new("Actions").strong());
        ui.end_row();

        for row in rows {
            for column in columns {
                let text = row.get(column).map(|v| render_cell(column, v)).unwrap_or_default();
                ui.label(text);
            }
            ui.horizontal(|ui| {
                if ui.small_button("✏ Edit").clicked() {
                    action = Some(RowAction::Edit(table.to_string(), row.clone()));
                }
                if ui.small_button("🗑 Delete").clicked() {
                    action = Some(RowAction::Delete(table.to_string(), row.clone()));
                }
            });
            ui.end_row();
        }
    });

    action
}
