use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::ping::DEFAULT_COUNT;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Packets to send when the caller gives no count.
    pub default_count: u32,
    /// Upper bound on a single run of the utility, in milliseconds. `None`
    /// waits forever.
    pub timeout_ms: Option<u64>,
    /// Pretty-print the JSON outcome.
    pub pretty: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_count: DEFAULT_COUNT,
            timeout_ms: Some(30_000),
            pretty: false,
        }
    }
}

impl AppConfig {
    pub fn get_config_path() -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_dir = dirs::config_dir()
            .ok_or("Could not find config directory")?
            .join("parse-ping");
        Ok(config_dir.join("config.json"))
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// A zero timeout would expire before the utility could answer.
    pub fn set_timeout(&mut self, timeout: Duration) -> Result<(), Box<dyn std::error::Error>> {
        if timeout.is_zero() {
            return Err("Timeout must be greater than zero".into());
        }
        self.timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX).max(1));
        Ok(())
    }

    /// Loads the per-user config, falling back to defaults on any problem.
    pub fn load() -> Self {
        match Self::get_config_path() {
            Ok(path) if path.exists() => Self::load_from(&path).unwrap_or_else(|e| {
                warn!("Ignoring config file {}: {e}", path.display());
                Self::default()
            }),
            Ok(_) => Self::default(),
            Err(e) => {
                warn!("Failed to get config path: {e}");
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        if config.timeout_ms == Some(0) {
            return Err("timeout_ms must be greater than zero".into());
        }
        Ok(config)
    }

    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let path = Self::get_config_path()?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}
