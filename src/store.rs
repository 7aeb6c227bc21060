//! Content storage
//!
//! Stores the raw bytes of every committed version on the filesystem, one
//! file per (path signature, version):
//! `{root}/contents/{signature}-{version:04}`

use crate::error::{ApiError, StorageError};
use crate::hasher;
use crate::record::{format_version, VersionRecord};
use crate::version_log::VersionLog;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Outcome of re-checking one stored version against its record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobStatus {
    Intact,
    Missing,
    Corrupted { actual: u32 },
}

/// Filesystem-backed store of version contents.
pub struct ContentStore {
    root: PathBuf,
}

impl ContentStore {
    /// Open (and create if needed) the store rooted at `root`.
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self, StorageError> {
        let root = root.as_ref().to_path_buf();
        let contents_dir = root.join("contents");
        fs::create_dir_all(&contents_dir).map_err(|e| {
            StorageError::IoError(std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to create contents directory at {:?}: {}",
                    contents_dir, e
                ),
            ))
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Durably store the bytes of one version.
    ///
    /// Writes to a temporary file, syncs it, then renames it into place. A
    /// blob already at the target location can only be an orphan left by a
    /// commit that crashed before appending its log entry, so it is replaced.
    pub fn write(&self, signature: &str, version: u32, data: &[u8]) -> Result<(), StorageError> {
        let blob_path = self.blob_path(signature, version);
        let temp_path = blob_path.with_extension("tmp");

        if blob_path.exists() {
            warn!(
                blob = %blob_path.display(),
                "Replacing orphaned content blob"
            );
        }

        let mut file = File::create(&temp_path)?;
        file.write_all(data)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&temp_path, &blob_path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            StorageError::IoError(std::io::Error::new(
                e.kind(),
                format!("Failed to rename temp file to {:?}: {}", blob_path, e),
            ))
        })?;
        sync_dir(&self.root.join("contents"))?;

        debug!(blob = %blob_path.display(), bytes = data.len(), "Content stored");
        Ok(())
    }

    /// Read the stored bytes of one version, without verification.
    pub fn read(&self, signature: &str, version: u32) -> Result<Vec<u8>, StorageError> {
        let blob_path = self.blob_path(signature, version);
        fs::read(&blob_path).map_err(|e| {
            StorageError::IoError(std::io::Error::new(
                e.kind(),
                format!("Failed to read content from {:?}: {}", blob_path, e),
            ))
        })
    }

    /// Whether a blob exists for the given signature and version.
    pub fn exists(&self, signature: &str, version: u32) -> bool {
        self.blob_path(signature, version).exists()
    }

    /// Resolve `path`/`version` in `log`, read the content and verify its
    /// checksum against the record.
    pub fn extract(&self, log: &VersionLog, path: &str, version: u32) -> Result<Vec<u8>, ApiError> {
        let record = log
            .find(path, version)
            .ok_or_else(|| ApiError::VersionNotFound {
                path: path.to_string(),
                version,
            })?;

        let data = self.read(&record.path_signature, record.version)?;
        let actual = hasher::content_checksum(&data);
        if actual != record.content_checksum {
            return Err(ApiError::Corrupted {
                path: path.to_string(),
                version,
                expected: record.content_checksum,
                actual,
            });
        }
        Ok(data)
    }

    /// Re-check the stored content of `record`.
    pub fn check(&self, record: &VersionRecord) -> Result<BlobStatus, StorageError> {
        if !self.exists(&record.path_signature, record.version) {
            return Ok(BlobStatus::Missing);
        }
        let data = self.read(&record.path_signature, record.version)?;
        let actual = hasher::content_checksum(&data);
        if actual == record.content_checksum {
            Ok(BlobStatus::Intact)
        } else {
            Ok(BlobStatus::Corrupted { actual })
        }
    }

    /// Location of the blob for a signature and version.
    pub fn blob_path(&self, signature: &str, version: u32) -> PathBuf {
        self.root
            .join("contents")
            .join(format!("{}-{}", signature, format_version(version)))
    }
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> Result<(), StorageError> {
    File::open(dir)?.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> Result<(), StorageError> {
    Ok(())
}
