/// Where a configuration value was loaded from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Value loaded from environment variable
    EnvVar(String),
    /// Default value used
    Default(String),
}

impl ConfigSource {
    /// Describe the source of `key`, which falls back to `default` when unset
    pub fn resolve(key: &str, default: impl Into<String>) -> Self {
        if std::env::var(key).is_ok() {
            ConfigSource::EnvVar(key.to_string())
        } else {
            ConfigSource::Default(default.into())
        }
    }
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::EnvVar(var) => write!(f, "env:{}", var),
            ConfigSource::Default(value) => write!(f, "default:{}", value),
        }
    }
}
