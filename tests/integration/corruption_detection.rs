//! Integrity checks: tampered contents, missing blobs and malformed logs

use std::fs;
use std::io::Write;
use tempfile::TempDir;
use verso::engine::{Engine, EngineOptions};
use verso::error::{ApiError, StorageError};
use verso::hasher;
use verso::store::BlobStatus;
use verso::version_log::MalformedPolicy;

use crate::integration::{open_engine, store_dir};

#[test]
fn test_tampered_content_is_corruption() {
    let test_dir = TempDir::new().unwrap();
    let mut engine = open_engine(&test_dir);
    engine.commit_bytes("/etc/hosts", b"127.0.0.1 localhost\n", 0, "init").unwrap();

    let blob = engine
        .store()
        .blob_path(&hasher::path_signature("/etc/hosts"), 1);
    fs::write(&blob, b"127.0.0.1 evil\n").unwrap();

    match engine.extract("/etc/hosts", 1) {
        Err(ApiError::Corrupted {
            path,
            version,
            expected,
            actual,
        }) => {
            assert_eq!(path, "/etc/hosts");
            assert_eq!(version, 1);
            assert_eq!(expected, hasher::content_checksum(b"127.0.0.1 localhost\n"));
            assert_eq!(actual, hasher::content_checksum(b"127.0.0.1 evil\n"));
        }
        other => panic!("Expected Corrupted, got {:?}", other),
    }
}

#[test]
fn test_truncated_content_is_corruption() {
    let test_dir = TempDir::new().unwrap();
    let mut engine = open_engine(&test_dir);
    engine.commit_bytes("/p", b"a fairly long payload", 0, "init").unwrap();

    let blob = engine.store().blob_path(&hasher::path_signature("/p"), 1);
    fs::write(&blob, b"a fairly").unwrap();

    assert!(matches!(
        engine.extract("/p", 1),
        Err(ApiError::Corrupted { .. })
    ));
}

#[test]
fn test_missing_blob_is_io_failure_and_reported_by_verify() {
    let test_dir = TempDir::new().unwrap();
    let mut engine = open_engine(&test_dir);
    engine.commit_bytes("/p", b"one", 0, "init").unwrap();
    engine.commit_bytes("/p", b"two", 0, "update").unwrap();

    let blob = engine.store().blob_path(&hasher::path_signature("/p"), 1);
    fs::remove_file(&blob).unwrap();

    assert!(matches!(
        engine.extract("/p", 1),
        Err(ApiError::StorageError(StorageError::IoError(_)))
    ));

    let entries = engine.verify(None).unwrap();
    let statuses: Vec<BlobStatus> = entries.iter().map(|e| e.status).collect();
    assert_eq!(statuses, vec![BlobStatus::Missing, BlobStatus::Intact]);
}

#[test]
fn test_malformed_log_fails_open_with_line_number() {
    let test_dir = TempDir::new().unwrap();
    {
        let mut engine = open_engine(&test_dir);
        engine.commit_bytes("/p", b"one", 0, "init").unwrap();
        engine.commit_bytes("/p", b"two", 0, "update").unwrap();
    }

    let log_path = store_dir(&test_dir).join("index");
    let mut log = fs::OpenOptions::new().append(true).open(&log_path).unwrap();
    writeln!(log, "/p\t2024-05-01T00:00:00Z\t0003\t0000\tsig\tnot-a-crc\t\"x\"").unwrap();

    let result = Engine::open(store_dir(&test_dir), EngineOptions::default());
    match result {
        Err(e) => {
            assert!(e.is_load_failure(), "unexpected error: {}", e);
            match e {
                ApiError::StorageError(StorageError::MalformedRecord { line, reason }) => {
                    assert_eq!(line, 3);
                    assert!(reason.contains("crc"), "unexpected reason: {}", reason);
                }
                other => panic!("Expected MalformedRecord, got {:?}", other),
            }
        }
        Ok(_) => panic!("Expected load failure"),
    }
}

#[test]
fn test_skip_policy_opens_past_malformed_lines() {
    let test_dir = TempDir::new().unwrap();
    {
        let mut engine = open_engine(&test_dir);
        engine.commit_bytes("/p", b"one", 0, "init").unwrap();
    }
    let log_path = store_dir(&test_dir).join("index");
    let mut log = fs::OpenOptions::new().append(true).open(&log_path).unwrap();
    writeln!(log, "only\ttwo").unwrap();

    let options = EngineOptions {
        on_malformed: MalformedPolicy::Skip,
        ..EngineOptions::default()
    };
    let mut engine = Engine::open(store_dir(&test_dir), options).unwrap();
    assert_eq!(engine.log().skipped_lines(), &[2]);
    assert_eq!(engine.extract("/p", 1).unwrap(), b"one");

    let record = engine.commit_bytes("/p", b"two", 1, "after skip").unwrap();
    assert_eq!(record.version, 2);
}

#[test]
fn test_inconsistent_log_surfaces_in_tree() {
    let test_dir = TempDir::new().unwrap();
    {
        let mut engine = open_engine(&test_dir);
        engine.commit_bytes("/p", b"one", 0, "init").unwrap();
    }
    // Hand-written record pointing at a version that never existed
    let log_path = store_dir(&test_dir).join("index");
    let mut log = fs::OpenOptions::new().append(true).open(&log_path).unwrap();
    writeln!(log, "/p\t2024-05-01T00:00:00Z\t0002\t0007\tsig\t0\t\"orphan\"").unwrap();

    let engine = open_engine(&test_dir);
    assert!(matches!(
        engine.tree(Some("/p")),
        Err(ApiError::InconsistentLog {
            version: 2,
            based_on: 7,
            ..
        })
    ));
    // Listing does not depend on parent links
    assert_eq!(engine.commits(Some("/p")).len(), 2);
}

#[test]
fn test_orphaned_blob_does_not_block_commit() {
    let test_dir = TempDir::new().unwrap();
    let mut engine = open_engine(&test_dir);
    engine.commit_bytes("/p", b"one", 0, "init").unwrap();

    // Simulate a crash after the content write of version 2
    let orphan = engine.store().blob_path(&hasher::path_signature("/p"), 2);
    fs::write(&orphan, b"never committed").unwrap();

    let record = engine.commit_bytes("/p", b"two", 0, "update").unwrap();
    assert_eq!(record.version, 2);
    assert_eq!(engine.extract("/p", 2).unwrap(), b"two");
}
