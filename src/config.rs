//! Configuration System
//!
//! Store settings layered from defaults, an optional TOML file, and
//! `STATEMUX_*` environment variables. Tests included.

use crate::error::ConfigError;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

mod merge_policy;
mod sources;

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "STATEMUX";

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Delay before the outbound callback fires; 0 means the next tick.
    #[serde(default)]
    pub debounce_ms: u64,

    /// Joins a schema prefix and a key (`pre` + `.` + `bar`).
    #[serde(default = "default_separator")]
    pub separator: String,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

pub(crate) fn default_separator() -> String {
    ".".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 0,
            separator: default_separator(),
            logging: LoggingConfig::default(),
        }
    }
}

impl StoreConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.separator.is_empty() {
            return Err(ConfigError::Invalid(
                "separator cannot be empty".to_string(),
            ));
        }
        self.logging.validate()
    }
}

/// Loads `StoreConfig` through the `config` crate.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Defaults, then `path` (if given, must exist), then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<StoreConfig, ConfigError> {
        let mut builder = merge_policy::builder_with_defaults()?;
        if let Some(path) = path {
            builder = sources::add_file(builder, path)?;
        }
        builder = sources::add_env(builder);

        let config: StoreConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document directly, without file or environment layers.
    pub fn from_toml_str(contents: &str) -> Result<StoreConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?
            .add_source(config::File::from_str(contents, config::FileFormat::Toml));
        let config: StoreConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }
}
