use admin_panel::record::render_cell;
use admin_panel::{AdminPanel, Record, Severity};
use std::fmt::Write;

/// Plain-text grid: one header line, a rule, then one line per row.
pub fn grid(columns: &[String], rows: &[Record]) -> String {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|key| row.get(key).map(|v| render_cell(key, v)).unwrap_or_default())
                .collect()
        })
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, key)| {
            cells
                .iter()
                .map(|line| line[i].chars().count())
                .chain(std::iter::once(key.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    push_line(&mut out, columns, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_line(&mut out, &rule, &widths);
    for line in &cells {
        push_line(&mut out, line, &widths);
    }
    out
}

fn push_line(out: &mut String, cells: &[String], widths: &[usize]) {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
        .collect();
    let _ = writeln!(out, "{}", padded.join("  ").trim_end());
}

pub fn severity_icon(severity: Severity) -> &'static str {
    match severity {
        Severity::Info => "ℹ️",
        Severity::Success => "✅",
        Severity::Warning => "⚠️",
        Severity::Error => "🔥",
    }
}

/// Flush queued notifications to stderr so stdout stays parseable.
pub fn print_notifications(panel: &mut AdminPanel) {
    for note in panel.drain_notifications() {
        eprintln!("{} {}", severity_icon(note.severity), note.message);
    }
}
