use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

fn default_theme() -> String {
    "light".to_string()
}

fn default_refresh_interval_ms() -> u64 {
    600_000 // 10 minutes
}

fn default_list_timeout_secs() -> u64 {
    10
}

fn default_grade_timeout_secs() -> u64 {
    5
}

fn default_shutdown_grace_secs() -> u64 {
    3
}

/// Durable widget settings: Canvas endpoint, API token, theme identifier,
/// and the engine's timing knobs. Stored as JSON in the platform config
/// directory; endpoint and token can be overridden from the environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub api_token: String,
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_refresh_interval_ms")]
    pub refresh_interval_ms: u64,
    #[serde(default = "default_list_timeout_secs")]
    pub list_timeout_secs: u64,
    #[serde(default = "default_grade_timeout_secs")]
    pub grade_timeout_secs: u64,
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_token: String::new(),
            theme: default_theme(),
            refresh_interval_ms: default_refresh_interval_ms(),
            list_timeout_secs: default_list_timeout_secs(),
            grade_timeout_secs: default_grade_timeout_secs(),
            shutdown_grace_secs: default_shutdown_grace_secs(),
        }
    }
}

impl Config {
    /// Explicit configured-or-not check, replacing placeholder-string
    /// comparison against sample config values.
    pub fn is_configured(&self) -> bool {
        !self.base_url.trim().is_empty() && !self.api_token.trim().is_empty()
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    pub fn list_timeout(&self) -> Duration {
        Duration::from_secs(self.list_timeout_secs)
    }

    pub fn grade_timeout(&self) -> Duration {
        Duration::from_secs(self.grade_timeout_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

/// Durable key/value store backing [`Config`]. The settings dialog owns the
/// endpoint and credential keys; the refresh engine re-reads the theme key
/// on every reconciliation tick and writes back only that key.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    /// Store at the platform config directory.
    pub fn open() -> Result<Self> {
        let dirs =
            directories::ProjectDirs::from("com", "canvas-grade-widget", "canvas-grade-widget")
                .context("Could not determine config directory")?;
        Ok(Self {
            path: dirs.config_dir().join("config.json"),
        })
    }

    /// Store at an explicit path.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load settings, then apply `.env`/environment overrides for the
    /// endpoint and token. A missing file yields defaults.
    pub fn load(&self) -> Result<Config> {
        // Load .env file if it exists
        dotenv::dotenv().ok();

        let mut config = self.read()?;
        if let Ok(base_url) = env::var("CANVAS_BASE_URL") {
            config.base_url = base_url;
        }
        if let Ok(api_token) = env::var("CANVAS_API_TOKEN") {
            config.api_token = api_token;
        }
        Ok(config)
    }

    /// Read the file as-is, without environment overrides.
    pub fn read(&self) -> Result<Config> {
        if !self.path.exists() {
            return Ok(Config::default());
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read config file {}", self.path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", self.path.display()))
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(config)?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write config file {}", self.path.display()))
    }

    /// The configured theme identifier, re-read from disk so changes made by
    /// the settings dialog are picked up on the next tick.
    pub fn read_theme(&self) -> Result<String> {
        Ok(self.read()?.theme)
    }

    /// Persist a new theme identifier, preserving every other key.
    pub fn write_theme(&self, theme: &str) -> Result<()> {
        let mut config = self.read()?;
        config.theme = theme.to_string();
        self.save(&config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::at(dir.path().join("config.json"));

        let mut config = Config::default();
        config.base_url = "https://school.instructure.com".to_string();
        config.api_token = "secret".to_string();
        config.theme = "nord".to_string();
        store.save(&config).unwrap();

        let loaded = store.read().unwrap();
        assert_eq!(loaded.base_url, config.base_url);
        assert_eq!(loaded.theme, "nord");
        assert_eq!(loaded.refresh_interval_ms, 600_000);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::at(dir.path().join("config.json"));
        let config = store.read().unwrap();
        assert_eq!(config.theme, "light");
        assert_eq!(config.grade_timeout_secs, 5);
        assert_eq!(config.shutdown_grace_secs, 3);
        assert!(!config.is_configured());
    }

    #[test]
    fn write_theme_preserves_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::at(dir.path().join("config.json"));

        let mut config = Config::default();
        config.base_url = "https://school.instructure.com".to_string();
        config.api_token = "secret".to_string();
        store.save(&config).unwrap();

        store.write_theme("dark").unwrap();
        let loaded = store.read().unwrap();
        assert_eq!(loaded.theme, "dark");
        assert_eq!(loaded.api_token, "secret");
    }

    #[test]
    fn configured_requires_endpoint_and_token() {
        let mut config = Config::default();
        assert!(!config.is_configured());
        config.base_url = "https://school.instructure.com".to_string();
        assert!(!config.is_configured());
        config.api_token = "token".to_string();
        assert!(config.is_configured());
    }
}
