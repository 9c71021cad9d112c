// rest_api/src/config.rs

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Path override for the config file; falls back to `limousine.yaml` in
/// the working directory, and to built-in defaults when neither exists.
pub const CONFIG_PATH_ENV: &str = "LIMOUSINE_CONFIG";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub data_directory: String,
    pub jwt_secret: String,
    pub token_ttl_hours: u64,
    /// Bootstrap admin, created at startup when no user holds the email.
    pub admin_username: String,
    pub admin_email: String,
    pub admin_password: String,
    pub geocode_base_url: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            host: "127.0.0.1".to_string(),
            port: 8082,
            data_directory: "data/limousine".to_string(),
            jwt_secret: "change-me-this-secret-must-be-long-enough".to_string(),
            token_ttl_hours: 24,
            admin_username: "admin".to_string(),
            admin_email: "admin@languagelimousine.local".to_string(),
            admin_password: "admin".to_string(),
            geocode_base_url: "https://nominatim.openstreetmap.org/search".to_string(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("limousine.yaml"));
        if !path.exists() {
            tracing::info!(path = %path.display(), "no config file, using defaults");
            return Ok(AppConfig::default());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: AppConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        Ok(config)
    }
}
