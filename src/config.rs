//! Configuration module for byshare.

use serde::Deserialize;
use std::path::Path;

use crate::{ByshareError, Result};

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Base URL used when building share links.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Allowed CORS origins (empty means allow any).
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            base_url: default_base_url(),
            cors_origins: Vec::new(),
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory for artifact payloads.
    #[serde(default = "default_artifact_path")]
    pub artifact_path: String,
    /// Path to the registry snapshot file.
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: String,
    /// Maximum upload size in megabytes.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size_mb: u64,
}

fn default_artifact_path() -> String {
    "data/storage".to_string()
}

fn default_snapshot_path() -> String {
    "data/database.json".to_string()
}

fn default_max_upload_size() -> u64 {
    100
}

impl StorageConfig {
    /// Maximum upload size in bytes.
    pub fn max_upload_size_bytes(&self) -> u64 {
        self.max_upload_size_mb * 1024 * 1024
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            artifact_path: default_artifact_path(),
            snapshot_path: default_snapshot_path(),
            max_upload_size_mb: default_max_upload_size(),
        }
    }
}

/// Upload limit configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Maximum successful uploads per identity per UTC day.
    #[serde(default = "default_daily_upload_limit")]
    pub daily_upload_limit: u32,
}

fn default_daily_upload_limit() -> u32 {
    5
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            daily_upload_limit: default_daily_upload_limit(),
        }
    }
}

/// Shared admin credential pair.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    /// Admin username.
    #[serde(default = "default_admin_username")]
    pub username: String,
    /// Admin password.
    #[serde(default = "default_admin_password")]
    pub password: String,
}

fn default_admin_username() -> String {
    "admin".to_string()
}

fn default_admin_password() -> String {
    "byshare2024".to_string()
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            username: default_admin_username(),
            password: default_admin_password(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log file path (empty means console only).
    #[serde(default)]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: String::new(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Storage settings.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Upload limits.
    #[serde(default)]
    pub limits: LimitsConfig,
    /// Admin credentials.
    #[serde(default)]
    pub admin: AdminConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        toml::from_str(&content).map_err(|e| ByshareError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.storage.max_upload_size_mb, 100);
        assert_eq!(config.limits.daily_upload_limit, 5);
        assert_eq!(config.admin.username, "admin");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_max_upload_size_bytes() {
        let storage = StorageConfig {
            max_upload_size_mb: 2,
            ..Default::default()
        };
        assert_eq!(storage.max_upload_size_bytes(), 2 * 1024 * 1024);
    }

    #[test]
    fn test_parse_partial_toml() {
        let toml_str = r#"
            [server]
            port = 8080

            [limits]
            daily_upload_limit = 3
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.limits.daily_upload_limit, 3);
        assert_eq!(config.storage.max_upload_size_mb, 100);
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load("/nonexistent/config.toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\nport = 4000\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.server.port, 4000);
    }
}
