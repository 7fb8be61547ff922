//! Client configuration from environment variables

use std::path::PathBuf;
use std::time::Duration;

/// Backend the client talks to when `SORI_API_BASE` is empty: the backend
/// served next to the client on the same host.
pub const SAME_HOST_BACKEND: &str = "http://127.0.0.1:8000";

/// Default chat deadline
pub const DEFAULT_CHAT_TIMEOUT: Duration = Duration::from_secs(60);

/// Placeholder admin credentials.
///
/// Unlocks diagnostic views only; this is not an authentication boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminCredentials {
    pub id: String,
    pub password: String,
}

/// Configuration for the client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL; empty means [`SAME_HOST_BACKEND`]
    pub api_base: String,
    pub chat_timeout: Duration,
    /// `None` disables admin login
    pub admin: Option<AdminCredentials>,
    pub log_file: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: String::new(),
            chat_timeout: DEFAULT_CHAT_TIMEOUT,
            admin: None,
            log_file: std::env::temp_dir().join("sori.log"),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup (tests pass a map)
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let chat_timeout = lookup("SORI_CHAT_TIMEOUT_SECS")
            .and_then(|s| s.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map_or(defaults.chat_timeout, Duration::from_secs);

        let admin = match (lookup("SORI_ADMIN_ID"), lookup("SORI_ADMIN_PASSWORD")) {
            (Some(id), Some(password)) if !id.is_empty() && !password.is_empty() => {
                Some(AdminCredentials { id, password })
            }
            _ => None,
        };

        Self {
            api_base: lookup("SORI_API_BASE").unwrap_or_default(),
            chat_timeout,
            admin,
            log_file: lookup("SORI_LOG_FILE").map_or(defaults.log_file, PathBuf::from),
        }
    }

    /// Base URL with any trailing slash removed
    pub fn backend_base(&self) -> String {
        let base = self.api_base.trim();
        if base.is_empty() {
            SAME_HOST_BACKEND.to_string()
        } else {
            base.trim_end_matches('/').to_string()
        }
    }
}
