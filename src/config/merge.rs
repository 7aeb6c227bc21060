//! Merge rules: defaults, override order.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with defaults applied.
///
/// `storage.data_dir` has no default here: it is resolved from XDG paths
/// after deserialization so that tests can redirect it via the environment.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("storage.lock", true)?
        .set_default("storage.on_malformed", "abort")?
        .set_default("diff.tool", "diff")?
        .set_default("diff.context_lines", 3)?
        .set_default("logging.enabled", true)?
        .set_default("logging.level", "warn")?
        .set_default("logging.format", "text")?
        .set_default("logging.output", "stderr")
}
