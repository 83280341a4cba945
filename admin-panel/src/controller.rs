use tracing::info;

use crate::client::AdminHttpClient;
use crate::dialog::DialogKind;
use crate::panel::AdminPanel;
use crate::run_all::run_all;

/// Drives an [`AdminPanel`] against the backend, one awaited request at a time.
pub struct AdminController {
    client: AdminHttpClient,
    pub panel: AdminPanel,
}

impl AdminController {
    pub fn new(client: AdminHttpClient, panel: AdminPanel) -> Self {
        Self { client, panel }
    }

    pub fn client(&self) -> &AdminHttpClient {
        &self.client
    }

    /// Log in and, on success, discover the tables.
    pub async fn login(&mut self, email: &str, password: &str) -> bool {
        self.panel.begin_login();
        let outcome = self.client.login(email, password).await;
        if !self.panel.apply_login(outcome) {
            return false;
        }
        self.refresh_tables().await
    }

    pub fn logout(&mut self) {
        info!("👋 Logging out");
        self.client.tokens().clear_token();
        self.panel.logout();
    }

    pub async fn refresh_tables(&mut self) -> bool {
        self.panel.begin_tables();
        let outcome = self.client.list_routes().await;
        self.panel.apply_routes(outcome)
    }

    pub async fn select_table(&mut self, table: &str) -> bool {
        if !self.panel.select_table(table) {
            return false;
        }
        self.fetch_rows(table).await
    }

    /// Re-fetch the selected table.
    pub async fn reload(&mut self) -> bool {
        match self.panel.selected_table.clone() {
            Some(table) => self.fetch_rows(&table).await,
            None => false,
        }
    }

    async fn fetch_rows(&mut self, table: &str) -> bool {
        self.panel.begin_rows();
        let outcome = self.client.fetch_rows(table).await;
        self.panel.apply_rows(table, outcome)
    }

    pub async fn run_all(&mut self) -> bool {
        let Some(tables) = self.panel.begin_run_all() else {
            return false;
        };
        let report = run_all(&self.client, &tables).await;
        let all_ok = report.success == report.total;
        self.panel.apply_run_all(report);
        all_ok
    }

    /// Send the open dialog's request, then re-fetch the table it touched.
    pub async fn submit_dialog(&mut self) -> bool {
        let Some(mutation) = self.panel.begin_submit() else {
            return false;
        };
        let outcome = mutation.execute(&self.client).await;
        match self.panel.apply_mutation(&mutation, outcome) {
            Some(table) => {
                self.panel.begin_rows();
                let rows = self.client.fetch_rows(&table).await;
                self.panel.apply_refresh(&table, rows);
                true
            }
            None => false,
        }
    }

    /// The operator accepted the delete confirmation.
    pub async fn confirm_delete(&mut self) -> bool {
        if !matches!(self.panel.dialog.kind(), Some(DialogKind::Delete)) {
            return false;
        }
        self.submit_dialog().await
    }
}
