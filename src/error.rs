//! Error types for the verso version-tracking engine.

use thiserror::Error;

/// Storage-related errors: the durable log file and the content store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Malformed log line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },

    #[error("Lock error: {0}")]
    LockError(String),

    #[error("Storage I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Errors surfaced by engine operations and the CLI.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid base version {based_on} for {path}: current version is {current}")]
    InvalidBase {
        path: String,
        based_on: u32,
        current: u32,
    },

    #[error("Version {version} not found for {path}")]
    VersionNotFound { path: String, version: u32 },

    #[error("Corrupted content for {path} version {version}: expected crc {expected}, got {actual}")]
    Corrupted {
        path: String,
        version: u32,
        expected: u32,
        actual: u32,
    },

    #[error("Inconsistent log: {path} version {version} is based on missing version {based_on}")]
    InconsistentLog {
        path: String,
        version: u32,
        based_on: u32,
    },

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Working file error for {path}: {source}")]
    WorkingFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Diff failed: {0}")]
    DiffFailed(String),

    #[error("Output error: {0}")]
    OutputError(String),

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl ApiError {
    /// Whether the error came from reading a malformed log at load time.
    pub fn is_load_failure(&self) -> bool {
        matches!(
            self,
            ApiError::StorageError(StorageError::MalformedRecord { .. })
        )
    }
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
