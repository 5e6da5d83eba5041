//! Config sources: an explicit TOML file and `STATEMUX_*` environment variables.

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::{Environment, File, FileFormat};
use std::path::Path;
use tracing::debug;

use super::ENV_PREFIX;

/// Add a required TOML file source.
pub fn add_file(
    builder: ConfigBuilder<DefaultState>,
    path: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.display().to_string()));
    }
    debug!(config_path = %path.display(), "loading store configuration file");
    Ok(builder.add_source(File::from(path).format(FileFormat::Toml).required(true)))
}

/// Add environment overrides: `STATEMUX_DEBOUNCE_MS`, `STATEMUX_LOGGING__LEVEL`, ...
pub fn add_env(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    )
}
