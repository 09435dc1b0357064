use super::{ConfigError, ConfigSource};
use std::collections::HashMap;
use std::env;
use std::str::FromStr;

/// Configuration trait implemented by every component config
pub trait AppConfigTrait: Sized {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self, ConfigError>;

    /// Validate the configuration
    fn validate(&self) -> Result<(), ConfigError>;

    /// Get configuration source information for debugging
    fn config_sources(&self) -> HashMap<String, ConfigSource>;
}

/// Deployment environment, selected through `APP_ENV`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Testing,
    Production,
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "testing" | "test" => Ok(Environment::Testing),
            "production" | "prod" => Ok(Environment::Production),
            _ => Err(ConfigError::invalid_value(
                "environment",
                s,
                "development, testing, or production",
            )),
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let env_str = match self {
            Environment::Development => "development",
            Environment::Testing => "testing",
            Environment::Production => "production",
        };
        write!(f, "{}", env_str)
    }
}

impl Environment {
    /// Read `APP_ENV`, defaulting to development
    pub fn from_env() -> Result<Self, ConfigError> {
        match env::var("APP_ENV") {
            Ok(value) => value.parse(),
            Err(_) => Ok(Environment::Development),
        }
    }

    pub fn is_testing(&self) -> bool {
        matches!(self, Environment::Testing)
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

/// Read an environment variable, falling back to `default`
pub fn env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Read and parse an environment variable, falling back to `default` when unset
pub fn parse_env<T: FromStr>(
    key: &str,
    field: &str,
    default: T,
    expected: &str,
) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::invalid_value(field, raw, expected)),
        Err(_) => Ok(default),
    }
}
