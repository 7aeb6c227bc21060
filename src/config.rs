//! Configuration System
//!
//! Layered configuration: built-in defaults, then the global config file
//! (or an explicit `--config` file), then `VERSO__*` environment variables.
//! CLI flags are applied on top by the binary.

use crate::error::ApiError;
use crate::logging::LoggingConfig;
use crate::version_log::MalformedPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

mod merge;
pub mod paths;
mod sources;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VersoConfig {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub diff: DiffConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where and how versions are stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the log and the contents; XDG data dir when unset
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Take an exclusive file lock around each commit
    #[serde(default = "default_true")]
    pub lock: bool,

    /// Handling of undecodable log lines at load time
    #[serde(default)]
    pub on_malformed: MalformedPolicy,
}

fn default_true() -> bool {
    true
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            lock: true,
            on_malformed: MalformedPolicy::Abort,
        }
    }
}

impl StorageConfig {
    /// Configured data directory, or `<XDG data home>/verso`.
    pub fn resolve_data_dir(&self) -> Result<PathBuf, ApiError> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => paths::default_data_dir(),
        }
    }
}

/// Which diff implementation renders `verso diff`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffToolKind {
    /// External diff(1)
    #[default]
    Diff,
    /// In-process unified diff
    Builtin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffConfig {
    #[serde(default)]
    pub tool: DiffToolKind,

    /// Context lines around each hunk (builtin tool)
    #[serde(default = "default_context_lines")]
    pub context_lines: usize,
}

fn default_context_lines() -> usize {
    3
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            tool: DiffToolKind::Diff,
            context_lines: default_context_lines(),
        }
    }
}

impl VersoConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ApiError> {
        if let Some(dir) = &self.storage.data_dir {
            if dir.as_os_str().is_empty() {
                return Err(ApiError::ConfigError(
                    "storage.data_dir cannot be empty".to_string(),
                ));
            }
        }
        self.logging
            .validate()
            .map_err(|e| ApiError::ConfigError(format!("logging: {}", e)))?;
        Ok(())
    }

    /// Render as TOML, for `verso config`.
    pub fn to_toml(&self) -> Result<String, ApiError> {
        toml::to_string_pretty(self)
            .map_err(|e| ApiError::ConfigError(format!("Failed to render config: {}", e)))
    }
}

/// Loads [`VersoConfig`] from its layered sources.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Defaults, global config file, environment.
    pub fn load() -> Result<VersoConfig, ApiError> {
        let builder = merge::builder_with_defaults()?;
        let builder = sources::global_file::add_to_builder(builder)?;
        let builder = sources::environment::add_to_builder(builder);
        Self::finish(builder)
    }

    /// Defaults, the given file (must exist), environment.
    pub fn load_from_file(path: &Path) -> Result<VersoConfig, ApiError> {
        let builder = merge::builder_with_defaults()?;
        let builder = sources::global_file::add_file(builder, path, true)?;
        let builder = sources::environment::add_to_builder(builder);
        Self::finish(builder)
    }

    fn finish(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<VersoConfig, ApiError> {
        let config: VersoConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        debug!(?config, "Configuration loaded");
        Ok(config)
    }
}
