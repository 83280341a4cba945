//! Generic admin front-end core.
//!
//! Talks to any backend that exposes its tables as JSON resources behind a
//! bearer-token login, and derives columns and form fields from whatever rows
//! come back.

pub mod client;
pub mod config;
pub mod controller;
pub mod dialog;
pub mod discovery;
pub mod error;
pub mod normalize;
pub mod notify;
pub mod panel;
pub mod record;
pub mod run_all;
pub mod session;

pub use client::AdminHttpClient;
pub use config::AdminConfig;
pub use controller::AdminController;
pub use dialog::{Dialog, DialogKind, Mutation};
pub use discovery::discoverable_tables;
pub use error::{AdminError, Result};
pub use normalize::normalize_payload;
pub use notify::{Notification, Severity};
pub use panel::AdminPanel;
pub use record::{FieldRules, Record};
pub use run_all::{run_all, RunAllReport, TableOutcome};
pub use session::{FileSessionStore, MemorySessionStore, Session, SessionHandle, SessionStore, TokenSource};
