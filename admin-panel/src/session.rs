//! Session state and its persistence.
//!
//! The bearer token and the chosen server URL live in a small key/value store
//! on the operator's machine. Nothing tracks expiry; a stale token is only
//! discovered when the server answers 401.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::Result;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, rename = "serverUrl", skip_serializing_if = "Option::is_none")]
    pub server_url: Option<String>,
}

impl Session {
    pub fn authenticated(self, token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            ..self
        }
    }

    /// Drops the token, keeps the server URL.
    pub fn logged_out(self) -> Self {
        Self { token: None, ..self }
    }

    pub fn with_server_url(self, url: impl Into<String>) -> Self {
        Self {
            server_url: Some(url.into()),
            ..self
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

/// Where a [`Session`] is kept between runs.
pub trait SessionStore: Send + Sync {
    fn load(&self) -> Result<Session>;
    fn save(&self, session: &Session) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    inner: Mutex<Session>,
}

impl MemorySessionStore {
    pub fn new(session: Session) -> Self {
        Self {
            inner: Mutex::new(session),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Session> {
        Ok(self.inner.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn save(&self, session: &Session) -> Result<()> {
        *self.inner.lock().unwrap_or_else(|e| e.into_inner()) = session.clone();
        Ok(())
    }
}

/// JSON file store, e.g. `~/.admin-panel/session.json`.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Session> {
        if !self.path.exists() {
            debug!("No session file at {}", self.path.display());
            return Ok(Session::default());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Session::default());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn save(&self, session: &Session) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        // Owner-only temp file in the same directory, renamed over the old one.
        let mut file = NamedTempFile::new_in(dir)?;
        file.write_all(serde_json::to_string_pretty(session)?.as_bytes())?;
        file.as_file().sync_all()?;
        file.persist(&self.path).map_err(|e| e.error)?;
        debug!("Session written to {}", self.path.display());
        Ok(())
    }
}

/// The current bearer token, as seen by the HTTP client.
pub trait TokenSource: Send + Sync {
    fn bearer_token(&self) -> Option<String>;
    fn store_token(&self, token: String);
    fn clear_token(&self);
    /// Server the token was issued by; recorded on a successful login.
    fn store_server_url(&self, url: String);
}

/// Live session backed by a [`SessionStore`]. Every transition is written through.
pub struct SessionHandle {
    state: RwLock<Session>,
    store: Arc<dyn SessionStore>,
}

impl SessionHandle {
    pub fn open(store: Arc<dyn SessionStore>) -> Result<Self> {
        let session = store.load()?;
        Ok(Self {
            state: RwLock::new(session),
            store,
        })
    }

    /// Like [`open`](Self::open), but an unreadable store starts an empty
    /// session. The next transition overwrites whatever was stored.
    pub fn open_or_default(store: Arc<dyn SessionStore>) -> Self {
        let session = store.load().unwrap_or_else(|e| {
            warn!("⚠️ Could not read stored session ({}); starting logged out", e);
            Session::default()
        });
        Self {
            state: RwLock::new(session),
            store,
        }
    }

    pub fn in_memory() -> Self {
        Self {
            state: RwLock::new(Session::default()),
            store: Arc::new(MemorySessionStore::default()),
        }
    }

    pub fn snapshot(&self) -> Session {
        self.state.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.snapshot().is_authenticated()
    }

    pub fn server_url(&self) -> Option<String> {
        self.snapshot().server_url
    }

    pub fn set_server_url(&self, url: impl Into<String>) {
        let url = url.into();
        self.transition(|s| s.with_server_url(url));
    }

    fn transition(&self, f: impl FnOnce(Session) -> Session) {
        let next = {
            let mut guard = self.state.write().unwrap_or_else(|e| e.into_inner());
            let next = f(guard.clone());
            *guard = next.clone();
            next
        };
        if let Err(e) = self.store.save(&next) {
            warn!("⚠️ Failed to persist session: {}", e);
        }
    }
}

impl TokenSource for SessionHandle {
    fn bearer_token(&self) -> Option<String> {
        self.snapshot().token
    }

    fn store_token(&self, token: String) {
        self.transition(|s| s.authenticated(token));
    }

    fn clear_token(&self) {
        self.transition(Session::logged_out);
    }

    fn store_server_url(&self, url: String) {
        self.set_server_url(url);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions_are_pure() {
        let s = Session::default().with_server_url("http://api").authenticated("t1");
        assert!(s.is_authenticated());
        let out = s.clone().logged_out();
        assert!(!out.is_authenticated());
        assert_eq!(out.server_url.as_deref(), Some("http://api"));
        assert_eq!(s.token.as_deref(), Some("t1"));
    }

    #[test]
    fn file_store_round_trips_and_creates_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("nested").join("session.json"));
        assert_eq!(store.load().unwrap(), Session::default());

        let session = Session::default().authenticated("abc").with_server_url("http://x");
        store.save(&session).unwrap();
        assert_eq!(store.load().unwrap(), session);

        let raw = fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\"serverUrl\""));
    }

    #[cfg(unix)]
    #[test]
    fn file_store_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("session.json"));
        store.save(&Session::default().authenticated("secret")).unwrap();
        store.save(&Session::default().authenticated("rotated")).unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(store.load().unwrap().token.as_deref(), Some("rotated"));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn corrupt_file_starts_logged_out_and_is_repaired() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{not json").unwrap();
        let store = Arc::new(FileSessionStore::new(&path));
        assert!(SessionHandle::open(store.clone()).is_err());

        let handle = SessionHandle::open_or_default(store.clone());
        assert!(!handle.is_authenticated());
        handle.store_token("fresh".into());
        assert_eq!(store.load().unwrap().token.as_deref(), Some("fresh"));
    }

    #[test]
    fn handle_writes_through_to_store() {
        let store = Arc::new(MemorySessionStore::default());
        let handle = SessionHandle::open(store.clone()).unwrap();
        handle.set_server_url("http://backend");
        handle.store_token("tok".into());
        assert_eq!(handle.bearer_token().as_deref(), Some("tok"));
        assert_eq!(store.load().unwrap().token.as_deref(), Some("tok"));

        handle.clear_token();
        let persisted = store.load().unwrap();
        assert!(persisted.token.is_none());
        assert_eq!(persisted.server_url.as_deref(), Some("http://backend"));
    }
}
