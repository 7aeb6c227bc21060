//! Global config file source: $XDG_CONFIG_HOME/verso/config.toml

use crate::config::paths;
use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::File;
use std::path::Path;
use tracing::debug;

/// Add the global config file to the builder if it exists.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    match paths::global_config_path() {
        Ok(path) if path.exists() => add_file(builder, &path, false),
        Ok(path) => {
            debug!(config_path = %path.display(), "No global configuration file");
            Ok(builder)
        }
        Err(e) => {
            debug!(error = %e, "Global configuration location unavailable");
            Ok(builder)
        }
    }
}

/// Add an explicit config file. `required` files must exist.
pub fn add_file(
    builder: ConfigBuilder<DefaultState>,
    path: &Path,
    required: bool,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(builder.add_source(File::from(path).required(required)))
}
