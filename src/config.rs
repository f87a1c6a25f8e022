use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("~/.config"))
        .join("taskmaster")
}

/// Backend endpoints and client settings, persisted as JSON under the user
/// config directory.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct TaskmasterConfig {
    /// Base URL of the document database (collections `tasks` and `lists`).
    pub database_url: String,
    /// Base URL of the identity provider.
    pub auth_url: String,
    /// Project API key sent on identity-provider requests.
    pub api_key: String,
    /// Seconds between subscription polls.
    pub poll_interval_secs: u64,
    pub debug_logging: bool,
}

impl Default for TaskmasterConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            auth_url: "https://identitytoolkit.googleapis.com".to_string(),
            api_key: String::new(),
            poll_interval_secs: 3,
            debug_logging: false,
        }
    }
}

impl TaskmasterConfig {
    pub fn path() -> PathBuf {
        default_config_dir().join("config.json")
    }

    /// Load the config file, falling back to defaults when it is missing or
    /// unreadable. A malformed file is logged and ignored, not fatal.
    pub fn load() -> Self {
        let path = Self::path();
        match std::fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(config) => config,
                Err(e) => {
                    log::warn!("ignoring malformed config {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    pub fn save(&self) -> std::io::Result<()> {
        let path = Self::path();
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let text = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, text)
    }
}
