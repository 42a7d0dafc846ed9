//! Application configuration value object

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::time::{parse_timeout, Duration};

/// Default tracing filter when neither RUST_LOG nor the config set one
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// File name of the host socket inside the runtime directory
pub const HOST_SOCKET_NAME: &str = "wrist-query-host.sock";

/// Application configuration.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub host_socket: Option<String>,
    pub timeout: Option<String>,
    pub log_level: Option<String>,
    pub icons: Option<bool>,
}

impl AppConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        Self {
            host_socket: None,
            timeout: Some(Duration::default_query_timeout().to_string()),
            log_level: Some(DEFAULT_LOG_LEVEL.to_string()),
            icons: Some(true),
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            host_socket: other.host_socket.or(self.host_socket),
            timeout: other.timeout.or(self.timeout),
            log_level: other.log_level.or(self.log_level),
            icons: other.icons.or(self.icons),
        }
    }

    /// Host socket path, or `$XDG_RUNTIME_DIR/wrist-query-host.sock` (temp dir fallback)
    pub fn host_socket_or_default(&self) -> PathBuf {
        match self.host_socket.as_deref().filter(|s| !s.is_empty()) {
            Some(path) => PathBuf::from(path),
            None => dirs::runtime_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join(HOST_SOCKET_NAME),
        }
    }

    /// Query timeout; `None` means queries may wait indefinitely.
    /// Falls back to the default when unset or invalid.
    pub fn timeout_or_default(&self) -> Option<Duration> {
        match self.timeout.as_deref() {
            Some(s) => parse_timeout(s).unwrap_or(Some(Duration::default_query_timeout())),
            None => Some(Duration::default_query_timeout()),
        }
    }

    /// Tracing filter directive
    pub fn log_level_or_default(&self) -> &str {
        self.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    /// Whether to draw the trigger icon, true if not set
    pub fn icons_or_default(&self) -> bool {
        self.icons.unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_have_expected_values() {
        let config = AppConfig::defaults();
        assert!(config.host_socket.is_none());
        assert_eq!(config.timeout, Some("1m".to_string()));
        assert_eq!(config.log_level, Some("warn".to_string()));
        assert_eq!(config.icons, Some(true));
    }

    #[test]
    fn empty_has_all_none() {
        let config = AppConfig::empty();
        assert!(config.host_socket.is_none());
        assert!(config.timeout.is_none());
        assert!(config.log_level.is_none());
        assert!(config.icons.is_none());
    }

    #[test]
    fn merge_other_takes_precedence() {
        let base = AppConfig {
            host_socket: Some("/tmp/base.sock".to_string()),
            timeout: Some("10s".to_string()),
            ..Default::default()
        };
        let other = AppConfig {
            host_socket: Some("/tmp/other.sock".to_string()),
            timeout: None,
            icons: Some(false),
            ..Default::default()
        };

        let merged = base.merge(other);
        assert_eq!(merged.host_socket, Some("/tmp/other.sock".to_string()));
        assert_eq!(merged.timeout, Some("10s".to_string()));
        assert_eq!(merged.icons, Some(false));
    }

    #[test]
    fn host_socket_configured() {
        let config = AppConfig {
            host_socket: Some("/run/host.sock".to_string()),
            ..Default::default()
        };
        assert_eq!(config.host_socket_or_default(), PathBuf::from("/run/host.sock"));
    }

    #[test]
    fn host_socket_default_name() {
        let path = AppConfig::empty().host_socket_or_default();
        assert!(path.to_string_lossy().ends_with(HOST_SOCKET_NAME));
    }

    #[test]
    fn timeout_parses_and_disables() {
        let config = AppConfig {
            timeout: Some("30s".to_string()),
            ..Default::default()
        };
        assert_eq!(config.timeout_or_default(), Some(Duration::from_secs(30)));

        let config = AppConfig {
            timeout: Some("off".to_string()),
            ..Default::default()
        };
        assert_eq!(config.timeout_or_default(), None);
    }

    #[test]
    fn timeout_falls_back_on_invalid_or_unset() {
        let config = AppConfig {
            timeout: Some("soon".to_string()),
            ..Default::default()
        };
        assert_eq!(config.timeout_or_default(), Some(Duration::from_secs(60)));
        assert_eq!(
            AppConfig::empty().timeout_or_default(),
            Some(Duration::from_secs(60))
        );
    }

    #[test]
    fn scalar_defaults() {
        let config = AppConfig::empty();
        assert_eq!(config.log_level_or_default(), "warn");
        assert!(config.icons_or_default());
    }
}
