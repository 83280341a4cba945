//! View state shared by the command line and desktop front-ends.
//!
//! The panel never performs I/O. A front-end asks it what to request
//! (`begin_*`), performs the request however it likes, and hands the outcome
//! back (`apply_*`). Outcomes are applied in arrival order; a late response
//! simply overwrites a newer one.

use std::collections::HashSet;
use tracing::{error, info, warn};

use crate::dialog::{Dialog, Mutation};
use crate::discovery::discoverable_tables;
use crate::error::{AdminError, Result};
use crate::notify::{Notification, Notifications, Severity};
use crate::record::{FieldRules, Record};
use crate::run_all::RunAllReport;

pub const LOGIN_FAILED: &str = "Invalid username or password";
pub const SESSION_EXPIRED: &str = "Session expired. Please log in again.";
pub const GENERIC_ERROR: &str = "An error occurred";

pub struct AdminPanel {
    rules: FieldRules,

    // ---- Session ----
    pub logged_in: bool,
    pub login_error: Option<String>,

    // ---- Tables ----
    pub tables: Vec<String>,
    pub selected_table: Option<String>,
    pub rows: Vec<Record>,

    // ---- Run all ----
    pub all_rows: Vec<(String, Vec<Record>)>,
    pub expanded: HashSet<String>,
    pub total_count: usize,
    pub success_count: usize,

    pub dialog: Dialog,

    // ---- Loading flags ----
    pub is_loading: bool,
    pub is_fetching_all: bool,

    notifications: Notifications,
}

impl AdminPanel {
    pub fn new(rules: FieldRules, logged_in: bool) -> Self {
        Self {
            rules,
            logged_in,
            login_error: None,
            tables: Vec::new(),
            selected_table: None,
            rows: Vec::new(),
            all_rows: Vec::new(),
            expanded: HashSet::new(),
            total_count: 0,
            success_count: 0,
            dialog: Dialog::Closed,
            is_loading: false,
            is_fetching_all: false,
            notifications: Notifications::default(),
        }
    }

    pub fn rules(&self) -> &FieldRules {
        &self.rules
    }

    pub fn columns(&self) -> Vec<String> {
        self.rules.columns(&self.rows)
    }

    pub fn is_busy(&self) -> bool {
        self.is_loading || self.is_fetching_all
    }

    /// Add needs a target table and no request in flight.
    pub fn can_add(&self) -> bool {
        self.selected_table.is_some() && !self.is_busy()
    }

    pub fn can_run_all(&self) -> bool {
        !self.is_busy()
    }

    // ============================================
    // Notifications
    // ============================================

    pub fn notify(&mut self, message: impl Into<String>, severity: Severity) {
        self.notifications.push(message, severity);
    }

    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        self.notifications.drain()
    }

    pub fn last_notification(&self) -> Option<&Notification> {
        self.notifications.last()
    }

    /// One policy for every failed call: log, tell the operator, log out on 401.
    pub fn handle_error(&mut self, err: &AdminError, context: Option<&str>) {
        error!("{}: {}", context.unwrap_or("Request failed"), err);

        if err.is_unauthorized() {
            self.force_logout();
            self.notify(SESSION_EXPIRED, Severity::Error);
        } else if let Some(message) = err.server_message() {
            self.notify(message.to_string(), Severity::Error);
        } else {
            self.notify(GENERIC_ERROR, Severity::Error);
        }

        if let Some(context) = context {
            self.notify(context.to_string(), Severity::Error);
        }
    }

    fn force_logout(&mut self) {
        self.logged_in = false;
        self.dialog = Dialog::Closed;
    }

    // ============================================
    // Session
    // ============================================

    pub fn begin_login(&mut self) {
        self.is_loading = true;
        self.login_error = None;
    }

    /// Returns true when the operator is now logged in and tables should be fetched.
    pub fn apply_login(&mut self, outcome: Result<String>) -> bool {
        self.is_loading = false;
        match outcome {
            Ok(_) => {
                info!("✅ Login succeeded");
                self.logged_in = true;
                self.login_error = None;
                true
            }
            Err(e) => {
                warn!("❌ Login failed: {}", e);
                let message = e.server_message().unwrap_or(LOGIN_FAILED).to_string();
                self.notify(message.clone(), Severity::Error);
                self.login_error = Some(message);
                false
            }
        }
    }

    /// Local state only; the caller clears the stored token.
    pub fn logout(&mut self) {
        self.force_logout();
        self.tables.clear();
        self.selected_table = None;
        self.rows.clear();
        self.all_rows.clear();
        self.expanded.clear();
        self.total_count = 0;
        self.success_count = 0;
    }

    // ============================================
    // Discovery & listing
    // ============================================

    pub fn begin_tables(&mut self) {
        self.is_loading = true;
    }

    pub fn apply_routes(&mut self, outcome: Result<Vec<String>>) -> bool {
        self.is_loading = false;
        match outcome {
            Ok(routes) => {
                self.tables = discoverable_tables(&routes, &self.rules);
                info!("🧭 {} tables available", self.tables.len());
                true
            }
            Err(e) => {
                self.handle_error(&e, Some("Failed to load routes"));
                false
            }
        }
    }

    /// Returns true when rows for `table` should be fetched now.
    pub fn select_table(&mut self, table: &str) -> bool {
        self.selected_table = Some(table.to_string());
        self.logged_in
    }

    pub fn begin_rows(&mut self) {
        self.is_loading = true;
    }

    pub fn apply_rows(&mut self, table: &str, outcome: Result<Vec<Record>>) -> bool {
        self.is_loading = false;
        match outcome {
            Ok(rows) => {
                self.rows = rows;
                true
            }
            Err(e) => {
                self.handle_error(&e, Some(format!("Failed to load {} data", table).as_str()));
                false
            }
        }
    }

    /// Re-fetched rows after a write: updates the grid and/or the run-all section showing `table`.
    pub fn apply_refresh(&mut self, table: &str, outcome: Result<Vec<Record>>) -> bool {
        self.is_loading = false;
        match outcome {
            Ok(rows) => {
                if let Some((_, section)) = self.all_rows.iter_mut().find(|(t, _)| t == table) {
                    *section = rows.clone();
                }
                if self.selected_table.as_deref() == Some(table) {
                    self.rows = rows;
                }
                true
            }
            Err(e) => {
                self.handle_error(&e, Some(format!("Failed to load {} data", table).as_str()));
                false
            }
        }
    }

    // ============================================
    // Run all
    // ============================================

    /// Tables to fetch, or `None` while a run is already in progress.
    pub fn begin_run_all(&mut self) -> Option<Vec<String>> {
        if self.is_fetching_all {
            return None;
        }
        self.is_fetching_all = true;
        self.all_rows.clear();
        Some(self.tables.clone())
    }

    pub fn apply_run_all(&mut self, report: RunAllReport) {
        self.is_fetching_all = false;
        self.total_count = report.total;
        self.success_count = report.success;

        let summary = report.summary();
        self.all_rows = Vec::with_capacity(report.outcomes.len());
        let mut expired = false;
        for outcome in report.outcomes {
            if let Some(e) = &outcome.error {
                // Once the session has expired every later table fails the same way.
                if !(expired && e.is_unauthorized()) {
                    self.handle_error(e, None);
                }
                expired |= e.is_unauthorized();
            }
            self.all_rows.push((outcome.table, outcome.rows));
        }
        self.notify(summary, Severity::Success);
    }

    pub fn rows_for(&self, table: &str) -> Option<&[Record]> {
        self.all_rows
            .iter()
            .find(|(t, _)| t == table)
            .map(|(_, rows)| rows.as_slice())
    }

    pub fn toggle_expanded(&mut self, table: &str) {
        if !self.expanded.remove(table) {
            self.expanded.insert(table.to_string());
        }
    }

    pub fn is_expanded(&self, table: &str) -> bool {
        self.expanded.contains(table)
    }

    // ============================================
    // Dialog
    // ============================================

    pub fn open_add(&mut self) {
        let Some(table) = self.selected_table.clone() else {
            self.notify(AdminError::NoTableSelected.to_string(), Severity::Warning);
            return;
        };
        self.dialog = Dialog::add(&table, self.rows.first(), &self.rules);
    }

    pub fn open_edit(&mut self, table: &str, row: &Record) {
        match Dialog::edit(table, row, &self.rules) {
            Ok(dialog) => self.dialog = dialog,
            Err(e) => self.notify(e.to_string(), Severity::Error),
        }
    }

    pub fn open_delete(&mut self, table: &str, row: &Record) {
        match Dialog::delete(table, row) {
            Ok(dialog) => self.dialog = dialog,
            Err(e) => self.notify(e.to_string(), Severity::Error),
        }
    }

    pub fn close_dialog(&mut self) {
        self.dialog = Dialog::Closed;
    }

    pub fn set_field(&mut self, key: &str, text: impl Into<String>) {
        self.dialog.set_field(key, text);
    }

    /// The request to send for the open dialog.
    pub fn begin_submit(&mut self) -> Option<Mutation> {
        let mutation = self.dialog.mutation()?;
        self.is_loading = true;
        Some(mutation)
    }

    /// Returns the table to re-fetch after a successful write.
    pub fn apply_mutation(&mut self, mutation: &Mutation, outcome: Result<()>) -> Option<String> {
        self.is_loading = false;
        match outcome {
            Ok(()) => {
                self.notify(mutation.success_message(), Severity::Success);
                self.close_dialog();
                Some(mutation.table().to_string())
            }
            Err(e) => {
                self.handle_error(&e, Some(mutation.failure_message().as_str()));
                None
            }
        }
    }
}
