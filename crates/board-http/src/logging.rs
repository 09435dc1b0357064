//! Structured logging setup

use crate::errors::{HttpError, HttpResult};
use board_core::Environment;
use serde_json::{json, Value};
use std::io;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

/// Logging configuration for the whiteboard service
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "warn")
    pub level: String,
    /// Enable JSON structured logging (vs plain text)
    pub json_format: bool,
    /// Enable pretty printing for development
    pub pretty_print: bool,
    /// Include file and line number information
    pub include_location: bool,
    /// Custom fields logged with the initialization event
    pub global_fields: serde_json::Map<String, Value>,
    /// Environment filter (e.g. "board_share=debug,tower_http=info")
    pub env_filter: Option<String>,
    pub service_name: Option<String>,
    pub service_version: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            pretty_print: true,
            include_location: false,
            global_fields: serde_json::Map::new(),
            env_filter: None,
            service_name: None,
            service_version: None,
        }
    }
}

impl LoggingConfig {
    /// JSON output at info level
    pub fn production() -> Self {
        Self {
            level: "info".to_string(),
            json_format: true,
            pretty_print: false,
            include_location: false,
            global_fields: env_field("production"),
            env_filter: Some(
                "board_server=info,board_http=info,board_share=info,board_store=info,tower_http=warn"
                    .to_string(),
            ),
            service_name: None,
            service_version: None,
        }
    }

    /// Pretty output at debug level with source locations
    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            json_format: false,
            pretty_print: true,
            include_location: true,
            global_fields: env_field("development"),
            env_filter: Some(
                "board_server=debug,board_http=debug,board_share=debug,board_store=debug,tower_http=debug"
                    .to_string(),
            ),
            service_name: None,
            service_version: None,
        }
    }

    /// Minimal output
    pub fn test() -> Self {
        Self {
            level: "error".to_string(),
            json_format: false,
            pretty_print: false,
            include_location: false,
            global_fields: env_field("test"),
            env_filter: Some("error".to_string()),
            service_name: None,
            service_version: None,
        }
    }

    /// Preset matching the deployment environment
    pub fn for_environment(environment: Environment) -> Self {
        match environment {
            Environment::Production => Self::production(),
            Environment::Development => Self::development(),
            Environment::Testing => Self::test(),
        }
    }

    pub fn with_global_field<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.global_fields.insert(key.into(), value.into());
        self
    }

    pub fn with_service(mut self, name: &str, version: &str) -> Self {
        self.service_name = Some(name.to_string());
        self.service_version = Some(version.to_string());
        self
    }

    /// JSON payload of the initialization event
    fn init_event(&self) -> Value {
        let mut event = json!({
            "message": "Structured logging initialized",
            "config": {
                "level": self.level,
                "json_format": self.json_format,
                "pretty_print": self.pretty_print,
                "include_location": self.include_location,
            }
        });

        if let Some(name) = &self.service_name {
            event["service_name"] = json!(name);
        }
        if let Some(version) = &self.service_version {
            event["service_version"] = json!(version);
        }
        for (key, value) in &self.global_fields {
            event[key] = value.clone();
        }

        event
    }
}

fn env_field(env: &str) -> serde_json::Map<String, Value> {
    let mut fields = serde_json::Map::new();
    fields.insert("env".to_string(), json!(env));
    fields
}

/// Install the global subscriber. `RUST_LOG` takes precedence over the preset filter.
pub fn init_logging(config: LoggingConfig) -> HttpResult<()> {
    let directives = config.env_filter.as_deref().unwrap_or(&config.level);
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(directives))
        .map_err(|e| HttpError::config(format!("Invalid log filter: {}", e)))?;

    let fmt_layer = fmt::layer()
        .with_writer(io::stdout)
        .with_file(config.include_location)
        .with_line_number(config.include_location);

    let fmt_layer: Box<dyn Layer<Registry> + Send + Sync> = if config.json_format {
        fmt_layer.json().boxed()
    } else if config.pretty_print {
        fmt_layer.pretty().boxed()
    } else {
        fmt_layer.boxed()
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(filter)
        .try_init()
        .map_err(|e| HttpError::startup(format!("Logging already initialized: {}", e)))?;

    tracing::info!(target: "board::logging", "{}", config.init_event());
    Ok(())
}

/// Log application startup with system information
pub fn log_startup_info(service_name: &str, service_version: &str) {
    let startup_info = json!({
        "event": "application_startup",
        "service": service_name,
        "version": service_version,
        "pid": std::process::id(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "os": std::env::consts::OS,
        "arch": std::env::consts::ARCH,
    });

    tracing::info!(target: "board::startup", "{}", startup_info);
}

/// Log application shutdown
pub fn log_shutdown_info(service_name: &str) {
    let shutdown_info = json!({
        "event": "application_shutdown",
        "service": service_name,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    tracing::info!(target: "board::shutdown", "{}", shutdown_info);
}
