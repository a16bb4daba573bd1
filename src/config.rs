use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const ENV_URL: &str = "DOFLOW_URL";
pub const ENV_ANON_KEY: &str = "DOFLOW_ANON_KEY";

/// Where the backend lives: project URL plus the public anon key. User
/// credentials never go in here, they live in the keyring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoflowConfig {
    pub url: String,
    pub anon_key: String,
}

impl DoflowConfig {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            url: url.trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
        }
    }

    /// Environment first, then the config file. `None` means neither is
    /// set up and the caller should point the user at [`config_path`].
    pub fn load() -> Option<Self> {
        if let (Some(url), Some(anon_key)) = (env_value(ENV_URL), env_value(ENV_ANON_KEY)) {
            return Some(Self::new(url, anon_key));
        }
        read_file(&config_path()?)
    }

    pub fn save(&self) -> Result<(), String> {
        let path = config_path().ok_or("No config directory on this system")?;
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;
        std::fs::write(&path, json).map_err(|e| format!("Failed to save config: {}", e))
    }
}

pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("doflow").join("config.json"))
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn read_file(path: &Path) -> Option<DoflowConfig> {
    let content = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str::<DoflowConfig>(&content) {
        Ok(config) => Some(DoflowConfig::new(config.url, config.anon_key)),
        Err(e) => {
            log::warn!("Ignoring unreadable config at {}: {}", path.display(), e);
            None
        }
    }
}
