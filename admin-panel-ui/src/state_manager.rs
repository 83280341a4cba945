use admin_panel::dialog::DialogKind;
use admin_panel::{
    run_all, AdminConfig, AdminHttpClient, AdminPanel, Mutation, Notification, Record, RunAllReport,
    SessionHandle, Severity, TokenSource,
};
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::runtime::Handle;

pub const TOAST_DURATION: Duration = Duration::from_secs(6);

/// A finished request, waiting to be applied on the UI thread.
enum AsyncOutcome {
    Login(admin_panel::Result<String>),
    Routes(admin_panel::Result<Vec<String>>),
    Rows {
        table: String,
        outcome: admin_panel::Result<Vec<Record>>,
    },
    RunAll(RunAllReport),
    Mutation {
        mutation: Mutation,
        outcome: admin_panel::Result<()>,
    },
    Refresh {
        table: String,
        outcome: admin_panel::Result<Vec<Record>>,
    },
}

pub struct Toast {
    pub notification: Notification,
    pub shown_at: Instant,
}

/// Owns the panel and runs its requests on the tokio runtime.
pub struct AdminStateManager {
    config: AdminConfig,
    runtime: Handle,
    session: Arc<SessionHandle>,
    client: Option<AdminHttpClient>,
    repaint: egui::Context,

    pub panel: AdminPanel,
    pub toasts: Vec<Toast>,

    // Async state bridge
    inbox: Arc<Mutex<Vec<AsyncOutcome>>>,
}

impl AdminStateManager {
    pub fn new(config: AdminConfig, session: Arc<SessionHandle>, runtime: Handle, repaint: egui::Context) -> Self {
        let server_url = config.resolve_server_url(None, session.server_url().as_deref());
        let client = match AdminHttpClient::new(&server_url, session.clone(), config.timeout()) {
            Ok(client) => Some(client),
            Err(e) => {
                log::error!("❌ [STATE] Failed to build HTTP client for {}: {}", server_url, e);
                None
            }
        };
        let logged_in = client.is_some() && session.is_authenticated();
        let panel = AdminPanel::new(config.field_rules(), logged_in);

        let mut manager = Self {
            config,
            runtime,
            session,
            client,
            repaint,
            panel,
            toasts: Vec::new(),
            inbox: Arc::new(Mutex::new(Vec::new())),
        };

        if logged_in {
            log::info!("🔑 [STATE] Restored session for {}", server_url);
            manager.refresh_tables();
        }
        manager
    }

    /// Server URL the next login will use unless the operator types another.
    pub fn server_url(&self) -> String {
        match &self.client {
            Some(client) => client.base_url().to_string(),
            None => self.config.resolve_server_url(None, self.session.server_url().as_deref()),
        }
    }

    fn spawn<F>(&self, task: F)
    where
        F: Future<Output = AsyncOutcome> + Send + 'static,
    {
        let inbox = self.inbox.clone();
        let repaint = self.repaint.clone();
        self.runtime.spawn(async move {
            let outcome = task.await;
            match inbox.lock() {
                Ok(mut queue) => queue.push(outcome),
                Err(_) => log::error!("❌ [STATE] Failed to acquire inbox lock"),
            }
            repaint.request_repaint();
        });
    }

    fn connected_client(&mut self) -> Option<AdminHttpClient> {
        if self.client.is_none() {
            self.panel.notify("No server configured", Severity::Error);
        }
        self.client.clone()
    }

    // === Session ===

    pub fn login(&mut self, email: &str, password: &str, server_url: &str) {
        if self.panel.is_loading {
            log::warn!("⚠️ [STATE] Login called while a request is in flight - ignoring");
            return;
        }

        let flag = Some(server_url.trim()).filter(|url| !url.is_empty());
        let server_url = self.config.resolve_server_url(flag, None);
        let client = match AdminHttpClient::new(&server_url, self.session.clone(), self.config.timeout()) {
            Ok(client) => client,
            Err(e) => {
                self.panel.notify(e.to_string(), Severity::Error);
                return;
            }
        };
        self.client = Some(client.clone());

        log::info!("🔄 [STATE] Logging in to {}", server_url);
        self.panel.begin_login();
        let email = email.to_string();
        let password = password.to_string();
        self.spawn(async move {
            AsyncOutcome::Login(client.login(&email, &password).await)
        });
    }

    pub fn logout(&mut self) {
        log::info!("👋 [STATE] Logging out");
        self.session.clear_token();
        self.panel.logout();
    }

    // === Tables ===

    pub fn refresh_tables(&mut self) {
        let Some(client) = self.connected_client() else {
            return;
        };
        log::info!("📡 [STATE] Fetching routes");
        self.panel.begin_tables();
        self.spawn(async move { AsyncOutcome::Routes(client.list_routes().await) });
    }

    pub fn select_table(&mut self, table: &str) {
        if !self.panel.select_table(table) {
            return;
        }
        self.fetch_rows(table.to_string());
    }

    pub fn reload(&mut self) {
        if let Some(table) = self.panel.selected_table.clone() {
            self.fetch_rows(table);
        }
    }

    fn fetch_rows(&mut self, table: String) {
        let Some(client) = self.connected_client() else {
            return;
        };
        log::info!("📡 [STATE] Fetching rows for {}", table);
        self.panel.begin_rows();
        self.spawn(async move {
            let outcome = client.fetch_rows(&table).await;
            AsyncOutcome::Rows { table, outcome }
        });
    }

    pub fn run_all(&mut self) {
        let Some(client) = self.client.clone() else {
            return;
        };
        let Some(tables) = self.panel.begin_run_all() else {
            log::warn!("⚠️ [STATE] Run all already in progress - ignoring");
            return;
        };
        log::info!("📡 [STATE] Fetching all {} tables", tables.len());
        self.spawn(async move { AsyncOutcome::RunAll(run_all(&client, &tables).await) });
    }

    // === Dialog ===

    pub fn submit_dialog(&mut self) {
        let Some(client) = self.connected_client() else {
            return;
        };
        let Some(mutation) = self.panel.begin_submit() else {
            return;
        };
        log::info!("📤 [STATE] Sending {} to {}", mutation.kind(), mutation.table());
        self.spawn(async move {
            let outcome = mutation.execute(&client).await;
            AsyncOutcome::Mutation { mutation, outcome }
        });
    }

    pub fn confirm_delete(&mut self) {
        if matches!(self.panel.dialog.kind(), Some(DialogKind::Delete)) {
            self.submit_dialog();
        }
    }

    fn refresh_after_write(&mut self, table: String) {
        let Some(client) = self.client.clone() else {
            return;
        };
        self.panel.begin_rows();
        self.spawn(async move {
            let outcome = client.fetch_rows(&table).await;
            AsyncOutcome::Refresh { table, outcome }
        });
    }

    // === Async bridge ===

    /// Apply finished requests in arrival order, then refresh the toast list.
    pub fn update_from_async(&mut self) {
        let finished = match self.inbox.lock() {
            Ok(mut queue) => std::mem::take(&mut *queue),
            Err(_) => {
                log::error!("❌ [STATE] Failed to acquire inbox lock");
                Vec::new()
            }
        };

        for outcome in finished {
            self.apply(outcome);
        }

        let now = Instant::now();
        for notification in self.panel.drain_notifications() {
            self.toasts.push(Toast {
                notification,
                shown_at: now,
            });
        }
        expire_toasts(&mut self.toasts, now);
    }

    fn apply(&mut self, outcome: AsyncOutcome) {
        match outcome {
            AsyncOutcome::Login(outcome) => {
                if self.panel.apply_login(outcome) {
                    self.refresh_tables();
                }
            }
            AsyncOutcome::Routes(outcome) => {
                self.panel.apply_routes(outcome);
            }
            AsyncOutcome::Rows { table, outcome } => {
                self.panel.apply_rows(&table, outcome);
            }
            AsyncOutcome::RunAll(report) => {
                self.panel.apply_run_all(report);
            }
            AsyncOutcome::Mutation { mutation, outcome } => {
                if let Some(table) = self.panel.apply_mutation(&mutation, outcome) {
                    self.refresh_after_write(table);
                }
            }
            AsyncOutcome::Refresh { table, outcome } => {
                self.panel.apply_refresh(&table, outcome);
            }
        }
    }
}

fn expire_toasts(toasts: &mut Vec<Toast>, now: Instant) {
    toasts.retain(|toast| now.saturating_duration_since(toast.shown_at) < TOAST_DURATION);
}
