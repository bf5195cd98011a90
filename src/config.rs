//! Runtime configuration from environment variables.

use std::path::PathBuf;
use std::time::Duration;

/// Settings for the `web` binary.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    /// HOST, e.g. 0.0.0.0
    pub host: String,
    /// PORT, e.g. 8080
    pub port: u16,
    /// API_BASE_URL of the league service.
    pub api_base_url: String,
    /// SESSION_FILE holding the signed-in member and theme.
    pub session_file: PathBuf,
    /// VIEW_IDLE_HOURS before an untouched league view is dropped.
    pub view_idle_timeout: Duration,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_api_base_url() -> String {
    "http://localhost:8200".to_string()
}

fn default_session_file() -> PathBuf {
    PathBuf::from("tennis-session.json")
}

const DEFAULT_VIEW_IDLE_HOURS: u64 = 12;

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            api_base_url: default_api_base_url(),
            session_file: default_session_file(),
            view_idle_timeout: Duration::from_secs(DEFAULT_VIEW_IDLE_HOURS * 3600),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset or unparseable values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            host: non_empty("HOST").unwrap_or(defaults.host),
            port: non_empty("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            api_base_url: non_empty("API_BASE_URL").unwrap_or(defaults.api_base_url),
            session_file: non_empty("SESSION_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.session_file),
            view_idle_timeout: non_empty("VIEW_IDLE_HOURS")
                .and_then(|h| h.parse::<u64>().ok())
                .and_then(|h| h.checked_mul(3600))
                .map(Duration::from_secs)
                .unwrap_or(defaults.view_idle_timeout),
        }
    }
}
