use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::persistence::StorageConfig;

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    pub server: Server,
    pub storage: StorageConfig,
    pub cache: CacheConfig,
    pub api: ApiConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Server {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Write-behind flush period in milliseconds
    pub flush_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Period of the API expiry hook in milliseconds
    pub expire_interval_ms: u64,
    /// Creating user recorded when a request does not name one
    pub default_user: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 15600,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            flush_interval_ms: 1000,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            expire_interval_ms: 3_600_000,
            default_user: "createUser".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "json".to_string(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text; missing sections keep defaults
    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        let config: ServerConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the scheduler cannot work with
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.cache.flush_interval_ms == 0 {
            anyhow::bail!("cache.flush_interval_ms must be greater than zero");
        }
        if self.api.expire_interval_ms == 0 {
            anyhow::bail!("api.expire_interval_ms must be greater than zero");
        }
        if self.api.default_user.trim().is_empty() {
            anyhow::bail!("api.default_user must not be blank");
        }
        Ok(())
    }

    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.cache.flush_interval_ms)
    }

    pub fn expire_interval(&self) -> Duration {
        Duration::from_millis(self.api.expire_interval_ms)
    }

    /// Get server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::StorageBackend;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.server_addr(), "0.0.0.0:15600");
        assert_eq!(config.flush_interval(), Duration::from_secs(1));
        assert_eq!(config.expire_interval(), Duration::from_secs(3600));
        assert_eq!(config.storage.backend, StorageBackend::Sqlite);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
server:
  port: 8080
storage:
  backend: memory
cache:
  flush_interval_ms: 250
"#;
        let config = ServerConfig::from_yaml(yaml).unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.flush_interval(), Duration::from_millis(250));
        assert_eq!(config.api.default_user, "createUser");
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let yaml = "cache:\n  flush_interval_ms: 0\n";
        assert!(ServerConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("scribe.yml");
        std::fs::write(&path, "logging:\n  level: debug\n  format: pretty\n").unwrap();

        let config = ServerConfig::from_file(&path).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "pretty");
    }
}
