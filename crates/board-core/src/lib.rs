//! # board-core
//!
//! Configuration contract shared by the whiteboard crates: every component
//! config loads itself from the environment, validates itself and can report
//! where each of its values came from.

pub mod config;

pub use config::{env_or_default, parse_env, AppConfigTrait, ConfigError, ConfigSource, Environment};
