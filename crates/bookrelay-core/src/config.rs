//! BookRelay configuration system.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub feed: FeedConfig,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            registry: RegistryConfig::default(),
            gateway: GatewayConfig::default(),
            feed: FeedConfig::default(),
        }
    }
}

impl RelayConfig {
    /// Load config from the default path (~/.bookrelay/config.toml).
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::error::RelayError::Config(format!("Failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| crate::error::RelayError::Config(format!("Failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Save config to the default path.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_path())
    }

    /// Save config to a specific path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::RelayError::Config(format!("Failed to serialize config: {e}")))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".bookrelay")
            .join("config.toml")
    }
}

/// Token registry (realtime database REST) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Database base URL, e.g. `https://myapp.firebaseio.com`.
    #[serde(default)]
    pub base_url: String,
    /// Root path that holds token sets, keyed by role then recipient.
    #[serde(default = "default_tokens_path")]
    pub tokens_path: String,
    /// Optional database secret / access token appended as `auth`.
    #[serde(default)]
    pub auth_token: String,
}

fn default_tokens_path() -> String {
    "notificationTokens".into()
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            tokens_path: default_tokens_path(),
            auth_token: String::new(),
        }
    }
}

/// Push gateway (FCM legacy HTTP) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_gateway_url")]
    pub api_url: String,
    /// Server key sent as `Authorization: key=...`.
    #[serde(default)]
    pub server_key: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_gateway_url() -> String {
    "https://fcm.googleapis.com/fcm/send".into()
}
fn default_timeout_secs() -> u64 {
    10
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_url: default_gateway_url(),
            server_key: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Change-feed (streaming REST) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Database base URL; defaults to the registry URL when empty.
    #[serde(default)]
    pub base_url: String,
    /// Root path of the watched booking tree.
    #[serde(default = "default_bookings_path")]
    pub bookings_path: String,
    /// Seconds to wait before reconnecting a dropped stream.
    #[serde(default = "default_reconnect_secs")]
    pub reconnect_secs: u64,
}

fn default_bookings_path() -> String {
    "bookings".into()
}
fn default_reconnect_secs() -> u64 {
    5
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            bookings_path: default_bookings_path(),
            reconnect_secs: default_reconnect_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RelayConfig::default();
        assert_eq!(config.registry.tokens_path, "notificationTokens");
        assert_eq!(config.feed.bookings_path, "bookings");
        assert_eq!(config.gateway.timeout_secs, 10);
        assert!(config.gateway.api_url.contains("fcm.googleapis.com"));
    }

    #[test]
    fn test_parse_partial_toml() {
        let config: RelayConfig = toml::from_str(
            r#"
            [registry]
            base_url = "https://bookings-demo.firebaseio.com"

            [gateway]
            server_key = "AAAA-test"
            "#,
        )
        .unwrap();
        assert_eq!(config.registry.base_url, "https://bookings-demo.firebaseio.com");
        assert_eq!(config.gateway.server_key, "AAAA-test");
        // Untouched sections keep their defaults
        assert_eq!(config.feed.reconnect_secs, 5);
    }

    #[test]
    fn test_save_then_load() {
        let path = std::env::temp_dir()
            .join(format!("bookrelay-config-{}", std::process::id()))
            .join("config.toml");
        let mut config = RelayConfig::default();
        config.registry.base_url = "https://bookings-demo.firebaseio.com".into();
        config.save_to(&path).unwrap();

        let loaded = RelayConfig::load_from(&path).unwrap();
        assert_eq!(loaded.registry.base_url, config.registry.base_url);
        assert_eq!(loaded.gateway.timeout_secs, 10);

        let _ = std::fs::remove_file(&path);
    }
}
