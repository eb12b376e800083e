use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{MandiError, Result};

pub const DEFAULT_API_URL: &str = "https://inventory.apnimandi.us/api2";
pub const API_URL_ENV: &str = "MANDI_API_URL";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_export_dir")]
    pub export_dir: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_base_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_export_dir() -> String {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("mandi")
        .join("exports")
        .to_string_lossy()
        .to_string()
}

fn default_page_size() -> u32 {
    10
}

fn default_timeout_secs() -> u64 {
    15
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            export_dir: default_export_dir(),
            page_size: default_page_size(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Settings {
    /// Resolve the API base URL: explicit flag, then `MANDI_API_URL`, then
    /// the stored value. Trailing slashes are dropped.
    pub fn resolve_api_url(&self, flag: Option<&str>) -> String {
        let env = std::env::var(API_URL_ENV).ok().filter(|v| !v.trim().is_empty());
        let url = flag
            .map(str::to_string)
            .or(env)
            .unwrap_or_else(|| self.api_base_url.clone());
        url.trim().trim_end_matches('/').to_string()
    }

    pub fn export_path(&self) -> PathBuf {
        PathBuf::from(shellexpand_path(&self.export_dir))
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("mandi")
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

/// Where log output goes while the interactive viewer owns the terminal.
pub fn log_path() -> PathBuf {
    config_dir().join("mandi.log")
}

pub fn load_settings() -> Settings {
    load_settings_from(&settings_path())
}

pub fn load_settings_from(path: &Path) -> Settings {
    if path.exists() {
        let content = std::fs::read_to_string(path).unwrap_or_default();
        match serde_json::from_str(&content) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("ignoring unreadable settings at {}: {e}", path.display());
                Settings::default()
            }
        }
    } else {
        Settings::default()
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    save_settings_to(settings, &settings_path())
}

pub fn save_settings_to(settings: &Settings, path: &Path) -> Result<()> {
    if settings.page_size == 0 {
        return Err(MandiError::Settings("page size must be at least 1".into()));
    }
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| MandiError::Settings(e.to_string()))?;
    std::fs::write(path, format!("{json}\n"))?;
    Ok(())
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    path.to_string()
}
