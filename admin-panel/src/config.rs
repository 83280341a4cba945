use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{AdminError, Result};
use crate::record::{FieldRules, EXCLUDED_ROUTES, SYSTEM_FIELDS};

pub const DEFAULT_SERVER_URL: &str = "http://localhost:5000";
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Session file; `~/` expands to the home directory.
    pub file: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TablesConfig {
    pub excluded: Vec<String>,
    pub system_fields: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    pub server: ServerConfig,
    pub session: SessionConfig,
    pub tables: TablesConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            url: DEFAULT_SERVER_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            file: "~/.admin-panel/session.json".to_string(),
        }
    }
}

impl Default for TablesConfig {
    fn default() -> Self {
        TablesConfig {
            excluded: EXCLUDED_ROUTES.iter().map(|s| s.to_string()).collect(),
            system_fields: SYSTEM_FIELDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl AdminConfig {
    /// Load `config.toml` from the working directory (defaults if absent),
    /// then apply environment overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(DEFAULT_CONFIG_FILE))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| {
                AdminError::Config(format!("Failed to read {}: {}", path.display(), e))
            })?;
            let parsed = Self::from_toml(&content)?;
            info!("⚙️ Loaded configuration from {}", path.display());
            parsed
        } else {
            debug!("{} not found, using defaults", path.display());
            AdminConfig::default()
        };

        config.apply_env_overrides(|key| env::var(key).ok());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| AdminError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Apply `ADMIN_*` overrides using `lookup` for variable access.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("ADMIN_SERVER_URL") {
            self.server.url = url;
        }
        if let Some(timeout) = lookup("ADMIN_TIMEOUT_SECS") {
            if let Ok(secs) = timeout.parse::<u64>() {
                self.server.timeout_secs = secs;
            }
        }
        if let Some(file) = lookup("ADMIN_SESSION_FILE") {
            self.session.file = file;
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.server.timeout_secs)
    }

    pub fn session_path(&self) -> PathBuf {
        expand_home(&self.session.file)
    }

    pub fn field_rules(&self) -> FieldRules {
        FieldRules {
            excluded: self.tables.excluded.clone(),
            system_fields: self.tables.system_fields.clone(),
        }
    }

    /// Server URL to talk to: explicit flag, then the one stored at login, then config.
    pub fn resolve_server_url(&self, flag: Option<&str>, stored: Option<&str>) -> String {
        let url = flag
            .or(stored)
            .unwrap_or(self.server.url.as_str());
        url.trim_end_matches('/').to_string()
    }
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Ok(home) = env::var("HOME") {
            return Path::new(&home).join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_point_at_local_backend() {
        let config = AdminConfig::default();
        assert_eq!(config.server.url, "http://localhost:5000");
        assert_eq!(config.field_rules(), FieldRules::default());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = AdminConfig::from_toml(
            r#"
            [server]
            url = "https://api.example.com"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.url, "https://api.example.com");
        assert_eq!(config.server.timeout_secs, 30);
        assert_eq!(config.tables.excluded, vec!["auth", "app"]);
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        let err = AdminConfig::from_toml("[server\nurl = 1").unwrap_err();
        assert!(matches!(err, AdminError::Config(_)));
    }

    #[test]
    fn env_overrides_apply() {
        let vars: HashMap<&str, &str> = [
            ("ADMIN_SERVER_URL", "http://env:9000"),
            ("ADMIN_TIMEOUT_SECS", "5"),
            ("ADMIN_SESSION_FILE", "/tmp/s.json"),
        ]
        .into_iter()
        .collect();
        let mut config = AdminConfig::default();
        config.apply_env_overrides(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.server.url, "http://env:9000");
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.session_path(), PathBuf::from("/tmp/s.json"));
    }

    #[test]
    fn bad_timeout_is_ignored() {
        let mut config = AdminConfig::default();
        config.apply_env_overrides(|k| (k == "ADMIN_TIMEOUT_SECS").then(|| "soon".to_string()));
        assert_eq!(config.server.timeout_secs, 30);
    }

    #[test]
    fn server_url_precedence() {
        let config = AdminConfig::default();
        assert_eq!(config.resolve_server_url(Some("http://flag/"), Some("http://stored")), "http://flag");
        assert_eq!(config.resolve_server_url(None, Some("http://stored")), "http://stored");
        assert_eq!(config.resolve_server_url(None, None), "http://localhost:5000");
    }
}
