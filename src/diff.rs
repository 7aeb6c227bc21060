//! Diff collaborator
//!
//! Renders a unified diff of two byte buffers. The external implementation
//! runs diff(1); its exit status is ignored because 1 only means the inputs
//! differ.

use crate::config::{DiffConfig, DiffToolKind};
use crate::error::ApiError;
use similar::TextDiff;
use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;
use tracing::debug;

/// Produces a unified diff between two labelled buffers.
pub trait DiffTool {
    fn diff(
        &self,
        from: &[u8],
        to: &[u8],
        label_from: &str,
        label_to: &str,
    ) -> Result<Vec<u8>, ApiError>;
}

/// Build the tool selected by configuration.
pub fn from_config(config: &DiffConfig) -> Box<dyn DiffTool> {
    match config.tool {
        DiffToolKind::Diff => Box::new(ExternalDiff::default()),
        DiffToolKind::Builtin => Box::new(BuiltinDiff {
            context_lines: config.context_lines,
        }),
    }
}

/// Runs `diff -u --label A --label B` on two temporary files.
#[derive(Debug, Clone)]
pub struct ExternalDiff {
    pub program: String,
}

impl Default for ExternalDiff {
    fn default() -> Self {
        Self {
            program: "diff".to_string(),
        }
    }
}

impl DiffTool for ExternalDiff {
    fn diff(
        &self,
        from: &[u8],
        to: &[u8],
        label_from: &str,
        label_to: &str,
    ) -> Result<Vec<u8>, ApiError> {
        let from_file = temp_with(from)?;
        let to_file = temp_with(to)?;

        let output = Command::new(&self.program)
            .arg("-u")
            .arg("--label")
            .arg(label_from)
            .arg("--label")
            .arg(label_to)
            .arg(from_file.path())
            .arg(to_file.path())
            .output()
            .map_err(|e| ApiError::DiffFailed(format!("cannot run {}: {}", self.program, e)))?;

        debug!(
            program = %self.program,
            status = ?output.status.code(),
            "External diff finished"
        );
        if !output.stderr.is_empty() {
            let _ = std::io::stderr().write_all(&output.stderr);
        }
        Ok(output.stdout)
    }
}

fn temp_with(data: &[u8]) -> Result<NamedTempFile, ApiError> {
    let mut file = tempfile::Builder::new()
        .prefix("verso")
        .tempfile()
        .map_err(|e| ApiError::DiffFailed(format!("cannot create temp file: {}", e)))?;
    file.write_all(data)
        .and_then(|_| file.flush())
        .map_err(|e| ApiError::DiffFailed(format!("cannot write temp file: {}", e)))?;
    Ok(file)
}

/// In-process unified diff over lines. Inputs that are not UTF-8 are
/// reported the way diff(1) reports binary files.
#[derive(Debug, Clone)]
pub struct BuiltinDiff {
    pub context_lines: usize,
}

impl Default for BuiltinDiff {
    fn default() -> Self {
        Self { context_lines: 3 }
    }
}

impl DiffTool for BuiltinDiff {
    fn diff(
        &self,
        from: &[u8],
        to: &[u8],
        label_from: &str,
        label_to: &str,
    ) -> Result<Vec<u8>, ApiError> {
        if from == to {
            return Ok(Vec::new());
        }
        let (old, new) = match (std::str::from_utf8(from), std::str::from_utf8(to)) {
            (Ok(old), Ok(new)) => (old, new),
            _ => {
                return Ok(format!("Binary files {} and {} differ\n", label_from, label_to)
                    .into_bytes())
            }
        };

        let diff = TextDiff::from_lines(old, new);
        let rendered = diff
            .unified_diff()
            .context_radius(self.context_lines)
            .header(label_from, label_to)
            .to_string();
        Ok(rendered.into_bytes())
    }
}
