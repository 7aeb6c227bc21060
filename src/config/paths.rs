//! XDG-style locations for config and data.
//!
//! `XDG_CONFIG_HOME` / `XDG_DATA_HOME` win when set; otherwise the platform
//! defaults from `directories` are used.

use crate::error::ApiError;
use directories::BaseDirs;
use std::path::PathBuf;

pub const APP_DIR: &str = "verso";

/// Base config directory (`$XDG_CONFIG_HOME` or platform default).
pub fn config_home() -> Result<PathBuf, ApiError> {
    if let Some(dir) = non_empty_env("XDG_CONFIG_HOME") {
        return Ok(dir);
    }
    BaseDirs::new()
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| ApiError::ConfigError("Cannot determine config directory".to_string()))
}

/// Base data directory (`$XDG_DATA_HOME` or platform default).
pub fn data_home() -> Result<PathBuf, ApiError> {
    if let Some(dir) = non_empty_env("XDG_DATA_HOME") {
        return Ok(dir);
    }
    BaseDirs::new()
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| ApiError::ConfigError("Cannot determine data directory".to_string()))
}

/// `<config_home>/verso/config.toml`
pub fn global_config_path() -> Result<PathBuf, ApiError> {
    Ok(config_home()?.join(APP_DIR).join("config.toml"))
}

/// `<data_home>/verso`, where the log and contents live by default.
pub fn default_data_dir() -> Result<PathBuf, ApiError> {
    Ok(data_home()?.join(APP_DIR))
}

fn non_empty_env(key: &str) -> Option<PathBuf> {
    std::env::var_os(key)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}
