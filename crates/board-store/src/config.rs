//! Store configuration

use board_core::{env_or_default, AppConfigTrait, ConfigError, ConfigSource};
use std::collections::HashMap;
use std::path::PathBuf;

/// Default configuration values
pub struct StoreDefaults;

impl StoreDefaults {
    pub const DATA_FILE: &'static str = "whiteboards.json";
}

/// Document store configuration
#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    /// Path of the JSON file holding every document
    pub data_file: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from(StoreDefaults::DATA_FILE),
        }
    }
}

impl StoreConfig {
    pub fn with_data_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.data_file = path.into();
        self
    }
}

impl AppConfigTrait for StoreConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            data_file: PathBuf::from(env_or_default("STORE_DATA_FILE", StoreDefaults::DATA_FILE)),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.data_file.as_os_str().is_empty() {
            return Err(ConfigError::validation_failed("Data file path must not be empty"));
        }

        if self.data_file.is_dir() {
            return Err(ConfigError::invalid_value(
                "data_file",
                self.data_file.display().to_string(),
                "a file path, not a directory",
            ));
        }

        Ok(())
    }

    fn config_sources(&self) -> HashMap<String, ConfigSource> {
        let mut sources = HashMap::new();
        sources.insert(
            "data_file".to_string(),
            ConfigSource::resolve("STORE_DATA_FILE", StoreDefaults::DATA_FILE),
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
    fn test_from_env() {
        env::remove_var("STORE_DATA_FILE");
        assert_eq!(StoreConfig::from_env().unwrap(), StoreConfig::default());

        env::set_var("STORE_DATA_FILE", "/tmp/boards.json");
        let config = StoreConfig::from_env().unwrap();
        assert_eq!(config.data_file, PathBuf::from("/tmp/boards.json"));
        assert_eq!(
            config.config_sources()["data_file"],
            ConfigSource::EnvVar("STORE_DATA_FILE".to_string())
        );
        env::remove_var("STORE_DATA_FILE");
    }

    #[test]
    fn test_directory_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::default().with_data_file(dir.path());
        assert!(config.validate().is_err());
    }
}
