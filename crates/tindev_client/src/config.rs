//! Client config load/save for `~/.tindev/config.yaml`.
//! Sections: api.*, realtime.*, storage.*. Every field is optional; the
//! `effective_*` helpers resolve defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3333";
pub const DEFAULT_SOCKET_PATH: &str = "/socket.io/";
pub const DEFAULT_RECONNECT_ATTEMPTS: u32 = 5;
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 1000;
pub const DEFAULT_MATCH_CAPACITY: usize = 8;

/// API section (base_url, timeout_secs).
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct ApiSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

/// Realtime section (enabled, url, path, reconnect policy, match mailbox size).
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct RealtimeSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reconnect_attempts: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reconnect_delay_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_capacity: Option<usize>,
}

/// Storage section (path of the session file).
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct StorageSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Full config file.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiSection,
    #[serde(default)]
    pub realtime: RealtimeSection,
    #[serde(default)]
    pub storage: StorageSection,
}

impl Config {
    pub fn effective_base_url(&self) -> String {
        self.api
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }

    /// `None` means requests never time out.
    pub fn request_timeout(&self) -> Option<Duration> {
        self.api.timeout_secs.map(Duration::from_secs)
    }

    pub fn realtime_enabled(&self) -> bool {
        self.realtime.enabled.unwrap_or(true)
    }

    /// Realtime server address; derived from the API base URL when unset
    /// (`http` → `ws`, `https` → `wss`).
    pub fn effective_realtime_url(&self) -> String {
        if let Some(url) = &self.realtime.url {
            return url.clone();
        }
        let base = self.effective_base_url();
        if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            base
        }
    }

    pub fn effective_socket_path(&self) -> String {
        self.realtime
            .path
            .clone()
            .unwrap_or_else(|| DEFAULT_SOCKET_PATH.to_string())
    }

    pub fn reconnect_attempts(&self) -> u32 {
        self.realtime
            .reconnect_attempts
            .unwrap_or(DEFAULT_RECONNECT_ATTEMPTS)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(
            self.realtime
                .reconnect_delay_ms
                .unwrap_or(DEFAULT_RECONNECT_DELAY_MS),
        )
    }

    pub fn match_capacity(&self) -> usize {
        self.realtime
            .match_capacity
            .unwrap_or(DEFAULT_MATCH_CAPACITY)
    }

    /// Session file path; `None` only when no home directory is known.
    pub fn effective_storage_path(&self) -> Option<PathBuf> {
        match &self.storage.path {
            Some(p) => Some(PathBuf::from(p)),
            None => Some(home_dir()?.join(".tindev").join("storage.json")),
        }
    }
}

/// Returns the default config file path: `~/.tindev/config.yaml` (platform-specific).
pub fn default_config_path() -> Option<PathBuf> {
    let home = home_dir()?;
    Some(home.join(".tindev").join("config.yaml"))
}

#[cfg(unix)]
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

#[cfg(windows)]
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("USERPROFILE").map(PathBuf::from)
}

#[cfg(not(any(unix, windows)))]
fn home_dir() -> Option<PathBuf> {
    None
}

/// Load config from a YAML file.
pub fn load(path: &Path) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&contents)?)
}

/// Load config, falling back to defaults when the file does not exist.
pub fn load_or_default(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return Ok(Config::default());
    }
    load(path)
}

/// Save config to a YAML file. Creates parent directory if missing.
pub fn save(path: &Path, config: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let contents = serde_yaml::to_string(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

/// Config load/save error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
