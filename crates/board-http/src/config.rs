//! HTTP server configuration

use board_core::{env_or_default, parse_env, AppConfigTrait, ConfigError, ConfigSource};
use std::collections::HashMap;
use std::net::SocketAddr;

/// Default configuration values
pub struct HttpDefaults;

impl HttpDefaults {
    pub const HOST: &'static str = "0.0.0.0";
    pub const PORT: u16 = 3000;
    pub const MAX_REQUEST_SIZE: usize = 20 * 1024 * 1024;
    pub const CORS_ORIGINS: &'static str =
        "http://localhost:5173,http://localhost:8080,http://localhost:3000";
    pub const HEALTH_CHECK_PATH: &'static str = "/health";
    pub const WS_PATH: &'static str = "/ws";
}

/// HTTP server specific configuration
#[derive(Debug, Clone, PartialEq)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
    /// Maximum request body size in bytes
    pub max_request_size: usize,
    /// Origins allowed to call the API from a browser
    pub cors_origins: Vec<String>,
    /// Health check endpoint path
    pub health_check_path: String,
    /// Path accepting viewer WebSocket upgrades
    pub ws_path: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: HttpDefaults::HOST.to_string(),
            port: HttpDefaults::PORT,
            max_request_size: HttpDefaults::MAX_REQUEST_SIZE,
            cors_origins: split_origins(HttpDefaults::CORS_ORIGINS),
            health_check_path: HttpDefaults::HEALTH_CHECK_PATH.to_string(),
            ws_path: HttpDefaults::WS_PATH.to_string(),
        }
    }
}

impl HttpConfig {
    /// Socket address to bind
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ConfigError::invalid_value("host", &self.host, "IP address"))
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_host<T: Into<String>>(mut self, host: T) -> Self {
        self.host = host.into();
        self
    }
}

impl AppConfigTrait for HttpConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let port = parse_env("HTTP_PORT", "port", HttpDefaults::PORT, "valid port number")?;

        let max_request_size = parse_env(
            "HTTP_MAX_REQUEST_SIZE",
            "max_request_size",
            HttpDefaults::MAX_REQUEST_SIZE,
            "valid number of bytes",
        )?;

        let config = HttpConfig {
            host: env_or_default("HTTP_HOST", HttpDefaults::HOST),
            port,
            max_request_size,
            cors_origins: split_origins(&env_or_default(
                "HTTP_CORS_ORIGINS",
                HttpDefaults::CORS_ORIGINS,
            )),
            health_check_path: env_or_default(
                "HTTP_HEALTH_CHECK_PATH",
                HttpDefaults::HEALTH_CHECK_PATH,
            ),
            ws_path: env_or_default("WS_PATH", HttpDefaults::WS_PATH),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr()?;

        if self.max_request_size == 0 {
            return Err(ConfigError::validation_failed(
                "Maximum request size must be greater than 0",
            ));
        }

        if self.health_check_path.is_empty() || !self.health_check_path.starts_with('/') {
            return Err(ConfigError::validation_failed(
                "Health check path must be non-empty and start with '/'",
            ));
        }

        if self.ws_path.is_empty() || !self.ws_path.starts_with('/') {
            return Err(ConfigError::validation_failed(
                "WebSocket path must be non-empty and start with '/'",
            ));
        }

        if self.ws_path == self.health_check_path
            || self.health_check_path == "/"
            || self.ws_path.starts_with("/api/")
        {
            return Err(ConfigError::invalid_value(
                "ws_path",
                &self.ws_path,
                "a path not used by another route",
            ));
        }

        Ok(())
    }

    fn config_sources(&self) -> HashMap<String, ConfigSource> {
        let mut sources = HashMap::new();
        sources.insert(
            "host".to_string(),
            ConfigSource::resolve("HTTP_HOST", HttpDefaults::HOST),
        );
        sources.insert(
            "port".to_string(),
            ConfigSource::resolve("HTTP_PORT", HttpDefaults::PORT.to_string()),
        );
        sources.insert(
            "max_request_size".to_string(),
            ConfigSource::resolve(
                "HTTP_MAX_REQUEST_SIZE",
                HttpDefaults::MAX_REQUEST_SIZE.to_string(),
            ),
        );
        sources.insert(
            "cors_origins".to_string(),
            ConfigSource::resolve("HTTP_CORS_ORIGINS", HttpDefaults::CORS_ORIGINS),
        );
        sources.insert(
            "health_check_path".to_string(),
            ConfigSource::resolve("HTTP_HEALTH_CHECK_PATH", HttpDefaults::HEALTH_CHECK_PATH),
        );
        sources.insert(
            "ws_path".to_string(),
            ConfigSource::resolve("WS_PATH", HttpDefaults::WS_PATH),
        );
        sources
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(String::from)
        .collect()
}
