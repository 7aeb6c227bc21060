//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::{ApiError, StorageError};

/// Stable failure category for an error.
pub fn error_kind(e: &ApiError) -> &'static str {
    match e {
        ApiError::StorageError(StorageError::MalformedRecord { .. }) => "load failure",
        ApiError::StorageError(_) => "io failure",
        ApiError::WorkingFile { .. } => "io failure",
        ApiError::InvalidBase { .. } => "invalid base",
        ApiError::VersionNotFound { .. } => "not found",
        ApiError::Corrupted { .. } => "corruption",
        ApiError::InconsistentLog { .. } => "inconsistent log",
        ApiError::InvalidPath(_) => "invalid path",
        ApiError::DiffFailed(_) => "diff failure",
        ApiError::OutputError(_) => "output failure",
        ApiError::ConfigError(_) => "configuration",
    }
}

/// Map domain/service errors to a string for CLI output.
pub fn map_error(e: &ApiError) -> String {
    format!("verso: {}: {}", error_kind(e), e)
}
