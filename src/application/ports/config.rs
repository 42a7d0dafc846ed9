//! Configuration port interface

use async_trait::async_trait;
use std::path::PathBuf;

use crate::domain::config::AppConfig;
use crate::domain::error::ConfigError;

/// Port for configuration storage
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Load configuration. A missing file yields an empty config.
    async fn load(&self) -> Result<AppConfig, ConfigError>;

    /// Persist configuration, creating parent directories as needed.
    async fn save(&self, config: &AppConfig) -> Result<(), ConfigError>;

    /// Location of the configuration file
    fn path(&self) -> PathBuf;

    /// Whether the configuration file exists
    fn exists(&self) -> bool;

    /// Write a file holding the defaults; fails if one already exists.
    async fn init(&self) -> Result<(), ConfigError> {
        if self.exists() {
            return Err(ConfigError::AlreadyExists(
                self.path().to_string_lossy().to_string(),
            ));
        }
        self.save(&AppConfig::defaults()).await
    }
}
