//! Version Log
//!
//! Durable, append-only sequence of [`VersionRecord`]s for every tracked path.
//! The whole log is read into memory once; queries (current version, filters,
//! tracked paths) are answered from memory.

use crate::error::StorageError;
use crate::record::VersionRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// What to do with a log line that cannot be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedPolicy {
    /// Fail the load, reporting the offending line
    #[default]
    Abort,
    /// Log a warning and continue with the next line
    Skip,
}

/// In-memory view of the durable log file.
#[derive(Debug)]
pub struct VersionLog {
    path: PathBuf,
    policy: MalformedPolicy,
    /// Records in log (append) order
    records: Vec<VersionRecord>,
    /// Bytes of the log file consumed so far
    consumed: u64,
    /// Lines consumed so far, for 1-based error reporting
    lines: usize,
    skipped: Vec<usize>,
    /// Whether the consumed bytes end with a newline (or are empty)
    terminated: bool,
}

impl VersionLog {
    /// Load the log at `path` with the strict (abort) policy.
    ///
    /// The file is created empty if it does not exist.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        Self::load_with_policy(path, MalformedPolicy::Abort)
    }

    /// Load the log at `path`, handling malformed lines per `policy`.
    pub fn load_with_policy<P: AsRef<Path>>(
        path: P,
        policy: MalformedPolicy,
    ) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        OpenOptions::new().create(true).append(true).open(&path)?;

        let mut log = Self {
            path,
            policy,
            records: Vec::new(),
            consumed: 0,
            lines: 0,
            skipped: Vec::new(),
            terminated: true,
        };
        log.refresh()?;
        debug!(
            log = %log.path.display(),
            records = log.records.len(),
            skipped = log.skipped.len(),
            "Version log loaded"
        );
        Ok(log)
    }

    /// Read lines appended to the file since the last load or refresh.
    ///
    /// Returns the number of new records. Only meaningful while holding the
    /// commit lock; otherwise another writer may be mid-append. On error the
    /// in-memory state is left as it was before the call.
    pub fn refresh(&mut self) -> Result<usize, StorageError> {
        let mut file = OpenOptions::new().read(true).open(&self.path)?;
        file.seek(SeekFrom::Start(self.consumed))?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        if bytes.is_empty() {
            return Ok(0);
        }

        let mut chunks: Vec<&[u8]> = bytes.split(|b| *b == b'\n').collect();
        // A terminated chunk splits into a trailing empty piece
        if chunks.last().map_or(false, |c| c.is_empty()) {
            chunks.pop();
        }
        // Another writer may have completed our dangling last line
        if !self.terminated && chunks.first().map_or(false, |c| c.is_empty()) {
            chunks.remove(0);
        }

        let mut records = Vec::with_capacity(chunks.len());
        let mut skipped = Vec::new();
        let mut lines = self.lines;
        for chunk in chunks {
            lines += 1;
            let parsed = std::str::from_utf8(chunk)
                .map_err(|_| "invalid UTF-8".to_string())
                .and_then(|line| line.parse::<VersionRecord>().map_err(|e| e.to_string()));
            match parsed {
                Ok(record) => records.push(record),
                Err(reason) => match self.policy {
                    MalformedPolicy::Abort => {
                        return Err(StorageError::MalformedRecord { line: lines, reason });
                    }
                    MalformedPolicy::Skip => {
                        warn!(
                            log = %self.path.display(),
                            line = lines,
                            %reason,
                            "Skipping malformed log line"
                        );
                        skipped.push(lines);
                    }
                },
            }
        }

        let added = records.len();
        self.records.extend(records);
        self.skipped.extend(skipped);
        self.lines = lines;
        self.consumed += bytes.len() as u64;
        self.terminated = bytes.ends_with(b"\n");
        Ok(added)
    }

    /// Durably append one record to the end of the log.
    ///
    /// Callers must have made the record's content durable first. A last
    /// line left without its newline is terminated before the record.
    pub fn append(&mut self, record: VersionRecord) -> Result<(), StorageError> {
        let mut line = String::new();
        if !self.terminated {
            line.push('\n');
        }
        line.push_str(&record.to_line());
        line.push('\n');

        let mut file = OpenOptions::new().append(true).open(&self.path)?;
        file.write_all(line.as_bytes())?;
        file.sync_all()?;

        self.consumed += line.len() as u64;
        self.lines += 1;
        self.terminated = true;
        self.records.push(record);
        Ok(())
    }

    /// Highest version recorded for `path`, or 0 when untracked.
    pub fn current_version(&self, path: &str) -> u32 {
        self.records
            .iter()
            .filter(|r| r.path == path)
            .map(|r| r.version)
            .max()
            .unwrap_or(0)
    }

    /// Records for `path` in log order; every record when `path` is `None`.
    pub fn filter(&self, path: Option<&str>) -> Vec<&VersionRecord> {
        match path {
            None | Some("") => self.records.iter().collect(),
            Some(p) => self.records.iter().filter(|r| r.path == p).collect(),
        }
    }

    /// First record matching `path` and `version`.
    pub fn find(&self, path: &str, version: u32) -> Option<&VersionRecord> {
        self.records
            .iter()
            .find(|r| r.path == path && r.version == version)
    }

    /// Presentation order: path ascending, then version descending.
    pub fn display_order(&self, path: Option<&str>) -> Vec<&VersionRecord> {
        let mut records = self.filter(path);
        records.sort_by(|a, b| a.path.cmp(&b.path).then(b.version.cmp(&a.version)));
        records
    }

    /// Distinct tracked paths with their signatures, sorted by path.
    pub fn tracked_paths(&self) -> BTreeMap<&str, &str> {
        self.records
            .iter()
            .map(|r| (r.path.as_str(), r.path_signature.as_str()))
            .collect()
    }

    /// All records in log order.
    pub fn records(&self) -> &[VersionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 1-based line numbers dropped under [`MalformedPolicy::Skip`].
    pub fn skipped_lines(&self) -> &[usize] {
        &self.skipped
    }

    /// Location of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
