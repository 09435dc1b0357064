//! Viewer connection configuration

use board_core::{parse_env, AppConfigTrait, ConfigError, ConfigSource};
use std::collections::HashMap;
use std::time::Duration;

/// Default configuration values
pub struct WebSocketDefaults;

impl WebSocketDefaults {
    pub const MAX_MESSAGE_SIZE: usize = 64 * 1024; // handshakes are tiny
    pub const PING_INTERVAL_SECS: u64 = 30;
}

/// WebSocket protocol configuration for viewer connections
#[derive(Debug, Clone, PartialEq)]
pub struct WebSocketConfig {
    /// Maximum inbound message size in bytes
    pub max_message_size: Option<usize>,
    /// Ping interval in seconds; keeps idle transports alive, does not reap viewers
    pub ping_interval: Option<u64>,
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            max_message_size: Some(WebSocketDefaults::MAX_MESSAGE_SIZE),
            ping_interval: Some(WebSocketDefaults::PING_INTERVAL_SECS),
        }
    }
}

impl WebSocketConfig {
    /// Configuration without keep-alive pings
    pub fn without_ping(mut self) -> Self {
        self.ping_interval = None;
        self
    }

    pub fn ping_interval(&self) -> Option<Duration> {
        self.ping_interval.map(Duration::from_secs)
    }
}

impl AppConfigTrait for WebSocketConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let max_message_size = parse_env(
            "WS_MAX_MESSAGE_SIZE",
            "max_message_size",
            WebSocketDefaults::MAX_MESSAGE_SIZE,
            "valid number of bytes",
        )?;

        // 0 disables keep-alive pings
        let ping_interval = parse_env(
            "WS_PING_INTERVAL",
            "ping_interval",
            WebSocketDefaults::PING_INTERVAL_SECS,
            "valid number of seconds",
        )?;

        let config = Self {
            max_message_size: Some(max_message_size),
            ping_interval: (ping_interval > 0).then_some(ping_interval),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_message_size == Some(0) {
            return Err(ConfigError::validation_failed(
                "Maximum WebSocket message size must be greater than 0",
            ));
        }

        Ok(())
    }

    fn config_sources(&self) -> HashMap<String, ConfigSource> {
        let mut sources = HashMap::new();
        sources.insert(
            "max_message_size".to_string(),
            ConfigSource::resolve(
                "WS_MAX_MESSAGE_SIZE",
                WebSocketDefaults::MAX_MESSAGE_SIZE.to_string(),
            ),
        );
        sources.insert(
            "ping_interval".to_string(),
            ConfigSource::resolve(
                "WS_PING_INTERVAL",
                WebSocketDefaults::PING_INTERVAL_SECS.to_string(),
            ),
        );
        sources
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        env::remove_var("WS_MAX_MESSAGE_SIZE");
        env::remove_var("WS_PING_INTERVAL");

        let config = WebSocketConfig::from_env().unwrap();
        assert_eq!(config, WebSocketConfig::default());
        assert_eq!(config.ping_interval(), Some(Duration::from_secs(30)));
    }

    #[test]
    #[serial]
    fn test_zero_ping_interval_disables_pings() {
        env::set_var("WS_PING_INTERVAL", "0");
        let config = WebSocketConfig::from_env().unwrap();
        assert_eq!(config.ping_interval, None);
        env::remove_var("WS_PING_INTERVAL");
    }

    #[test]
    fn test_zero_message_size_rejected() {
        let config = WebSocketConfig {
            max_message_size: Some(0),
            ..WebSocketConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
