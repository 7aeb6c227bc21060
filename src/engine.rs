//! Engine
//!
//! Explicit handle over one data directory: owns the in-memory [`VersionLog`]
//! and the [`ContentStore`] and runs every operation against them.
//!
//! Commit ordering: content is durable in the store before the record is
//! appended to the log. A crash in between leaves an orphaned blob, never a
//! record without content.

use crate::config::StorageConfig;
use crate::diff::DiffTool;
use crate::error::{ApiError, StorageError};
use crate::hasher;
use crate::record::{format_version, VersionRecord};
use crate::store::{BlobStatus, ContentStore};
use crate::tree::VersionForest;
use crate::version_log::{MalformedPolicy, VersionLog};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const LOG_FILE_NAME: &str = "index";
const LOCK_FILE_NAME: &str = "index.lock";

/// Engine behaviour switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Serialize commits across processes with an exclusive file lock
    pub lock: bool,
    pub on_malformed: MalformedPolicy,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            lock: true,
            on_malformed: MalformedPolicy::Abort,
        }
    }
}

impl From<&StorageConfig> for EngineOptions {
    fn from(config: &StorageConfig) -> Self {
        Self {
            lock: config.lock,
            on_malformed: config.on_malformed,
        }
    }
}

/// A tracked path and its signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedFile {
    pub path: String,
    pub signature: String,
}

/// Result of re-checking one stored version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyEntry {
    pub record: VersionRecord,
    pub status: BlobStatus,
}

/// Versioning engine over one data directory.
pub struct Engine {
    data_dir: PathBuf,
    log: VersionLog,
    store: ContentStore,
    options: EngineOptions,
}

impl Engine {
    /// Open the data directory, creating it if needed, and load the log.
    ///
    /// A malformed log line is returned as a load failure
    /// (see [`ApiError::is_load_failure`]); whether that is fatal is up to
    /// the caller.
    pub fn open<P: AsRef<Path>>(data_dir: P, options: EngineOptions) -> Result<Self, ApiError> {
        let data_dir = data_dir.as_ref().to_path_buf();
        fs::create_dir_all(&data_dir).map_err(StorageError::from)?;

        let store = ContentStore::new(&data_dir)?;
        let log = VersionLog::load_with_policy(data_dir.join(LOG_FILE_NAME), options.on_malformed)?;
        info!(
            data_dir = %data_dir.display(),
            records = log.len(),
            "Engine opened"
        );

        Ok(Self {
            data_dir,
            log,
            store,
            options,
        })
    }

    /// Open using the storage section of the configuration.
    pub fn from_config(config: &StorageConfig) -> Result<Self, ApiError> {
        Self::open(config.resolve_data_dir()?, EngineOptions::from(config))
    }

    /// Commit the current content of the file at `path`.
    pub fn commit(
        &mut self,
        path: &Path,
        based_on: u32,
        message: &str,
    ) -> Result<VersionRecord, ApiError> {
        let key = tracked_path(path)?;
        let data = fs::read(path).map_err(|source| ApiError::WorkingFile {
            path: key.clone(),
            source,
        })?;
        self.commit_bytes(&key, &data, based_on, message)
    }

    /// Commit `data` as the next version of `path`.
    ///
    /// Fails with [`ApiError::InvalidBase`] before touching storage when
    /// `based_on` names a version that does not exist yet.
    pub fn commit_bytes(
        &mut self,
        path: &str,
        data: &[u8],
        based_on: u32,
        message: &str,
    ) -> Result<VersionRecord, ApiError> {
        validate_path(path)?;

        let _guard = if self.options.lock {
            let guard = CommitLock::acquire(&self.data_dir.join(LOCK_FILE_NAME))?;
            let appended = self.log.refresh()?;
            if appended > 0 {
                debug!(appended, "Picked up records from another writer");
            }
            Some(guard)
        } else {
            None
        };

        let current = self.log.current_version(path);
        if based_on != 0 && based_on > current {
            return Err(ApiError::InvalidBase {
                path: path.to_string(),
                based_on,
                current,
            });
        }

        let version = current + 1;
        let signature = hasher::path_signature(path);
        let checksum = hasher::content_checksum(data);

        self.store.write(&signature, version, data)?;

        let record = VersionRecord::new(path, version, based_on, signature, checksum, message);
        self.log.append(record.clone())?;

        info!(
            path,
            version,
            based_on,
            checksum,
            bytes = data.len(),
            "Version committed"
        );
        Ok(record)
    }

    /// Bytes of `version` of `path`, verified against the recorded checksum.
    pub fn extract(&self, path: &str, version: u32) -> Result<Vec<u8>, ApiError> {
        let data = self.store.extract(&self.log, path, version)?;
        debug!(path, version, bytes = data.len(), "Version extracted");
        Ok(data)
    }

    /// Distinct tracked paths with their signatures, sorted by path.
    pub fn list(&self) -> Vec<TrackedFile> {
        self.log
            .tracked_paths()
            .into_iter()
            .map(|(path, signature)| TrackedFile {
                path: path.to_string(),
                signature: signature.to_string(),
            })
            .collect()
    }

    /// Records for `path` (or all) in display order.
    pub fn commits(&self, path: Option<&str>) -> Vec<&VersionRecord> {
        self.log.display_order(path)
    }

    /// Version forest for `path` (or all paths).
    pub fn tree(&self, path: Option<&str>) -> Result<VersionForest<'_>, ApiError> {
        VersionForest::build(self.log.filter(path))
    }

    pub fn current_version(&self, path: &str) -> u32 {
        self.log.current_version(path)
    }

    /// Re-check every stored version for `path` (or all paths).
    pub fn verify(&self, path: Option<&str>) -> Result<Vec<VerifyEntry>, ApiError> {
        let mut entries = Vec::new();
        for record in self.log.filter(path) {
            let status = self.store.check(record)?;
            if status != BlobStatus::Intact {
                warn!(
                    path = %record.path,
                    version = record.version,
                    ?status,
                    "Stored version failed verification"
                );
            }
            entries.push(VerifyEntry {
                record: record.clone(),
                status,
            });
        }
        Ok(entries)
    }

    /// Diff two versions of `path`; version 0 is the working file.
    pub fn diff(
        &self,
        path: &str,
        from: u32,
        to: u32,
        tool: &dyn DiffTool,
    ) -> Result<Vec<u8>, ApiError> {
        let (label_from, data_from) = self.resolve_side(path, from)?;
        let (label_to, data_to) = self.resolve_side(path, to)?;
        tool.diff(&data_from, &data_to, &label_from, &label_to)
    }

    fn resolve_side(&self, path: &str, version: u32) -> Result<(String, Vec<u8>), ApiError> {
        if version > 0 {
            let data = self.extract(path, version)?;
            Ok((format!("{} @{}", path, format_version(version)), data))
        } else {
            let data = fs::read(path).map_err(|source| ApiError::WorkingFile {
                path: path.to_string(),
                source,
            })?;
            Ok((path.to_string(), data))
        }
    }

    pub fn log(&self) -> &VersionLog {
        &self.log
    }

    pub fn store(&self) -> &ContentStore {
        &self.store
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

/// Absolute, log-safe string form of a working file path.
///
/// The path is made absolute lexically (symlinks are not resolved): the
/// literal path string is the identity of a tracked file.
pub fn tracked_path(path: &Path) -> Result<String, ApiError> {
    let absolute = std::path::absolute(path)
        .map_err(|e| ApiError::InvalidPath(format!("{}: {}", path.display(), e)))?;
    let key = absolute
        .to_str()
        .ok_or_else(|| ApiError::InvalidPath(format!("{} is not UTF-8", absolute.display())))?
        .to_string();
    validate_path(&key)?;
    Ok(key)
}

fn validate_path(path: &str) -> Result<(), ApiError> {
    if path.is_empty() {
        return Err(ApiError::InvalidPath("empty path".to_string()));
    }
    if path.contains(['\t', '\n', '\r']) {
        return Err(ApiError::InvalidPath(format!(
            "{:?} contains a tab or line break",
            path
        )));
    }
    Ok(())
}

/// Exclusive advisory lock held for the duration of one commit.
struct CommitLock {
    file: File,
}

impl CommitLock {
    fn acquire(lock_path: &Path) -> Result<Self, StorageError> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(lock_path)?;
        FileExt::lock_exclusive(&file).map_err(|e| {
            StorageError::LockError(format!("cannot lock {}: {}", lock_path.display(), e))
        })?;
        Ok(Self { file })
    }
}

impl Drop for CommitLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}
