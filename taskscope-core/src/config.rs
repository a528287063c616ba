use crate::error::TaskscopeError;
use config::{Config, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct TaskscopeConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub drive: DriveConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DriveConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.googleapis.com/drive/v3".to_string(),
            timeout_seconds: 30,
        }
    }
}

/// Hosted domains allowed to log in. Empty means any account is accepted.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AuthConfig {
    #[serde(default)]
    pub allowed_domains: Vec<String>,
}

impl TaskscopeConfig {
    /// Load from a TOML file. The file is optional; missing sections fall back
    /// to defaults.
    pub fn load(path: &str) -> Result<Self, TaskscopeError> {
        let s = Config::builder()
            .add_source(File::with_name(path).required(false))
            .build()?;
        Ok(s.try_deserialize()?)
    }
}
