//! End-to-end versioning scenarios against a real data directory

use std::fs;
use tempfile::TempDir;
use verso::error::ApiError;

use crate::integration::{open_engine, stored_blobs, working_file};

/// init → update → branch from v1, with extraction of the first version
#[test]
fn test_commit_update_branch_scenario() {
    let test_dir = TempDir::new().unwrap();
    let mut engine = open_engine(&test_dir);
    let file = working_file(&test_dir, "deploy.sh", "echo one\n");

    let v1 = engine.commit(&file, 0, "init").unwrap();
    assert_eq!((v1.version, v1.based_on), (1, 0));
    assert_eq!(v1.change_description, "init");

    fs::write(&file, "echo two\n").unwrap();
    let v2 = engine.commit(&file, 0, "update").unwrap();
    assert_eq!((v2.version, v2.based_on), (2, 0));

    assert_eq!(engine.extract(&v1.path, 1).unwrap(), b"echo one\n");
    assert_eq!(engine.extract(&v1.path, 2).unwrap(), b"echo two\n");

    fs::write(&file, "echo branch\n").unwrap();
    let v3 = engine.commit(&file, 1, "branch").unwrap();
    assert_eq!((v3.version, v3.based_on), (3, 1));

    let forest = engine.tree(Some(&v1.path)).unwrap();
    let shape: Vec<(usize, u32)> = forest
        .walk()
        .into_iter()
        .map(|(depth, r)| (depth, r.version))
        .collect();
    assert_eq!(shape, vec![(0, 1), (1, 3), (0, 2)]);
}

/// Versions are 1, 2, 3, ... whatever bases are used
#[test]
fn test_monotonic_versions_with_mixed_bases() {
    let test_dir = TempDir::new().unwrap();
    let mut engine = open_engine(&test_dir);

    let bases = [0, 1, 1, 0, 3, 2, 5, 0];
    for (i, base) in bases.iter().enumerate() {
        let record = engine
            .commit_bytes("/srv/app.conf", format!("rev {}", i).as_bytes(), *base, "edit")
            .unwrap();
        assert_eq!(record.version, i as u32 + 1);
    }

    let versions: Vec<u32> = engine
        .log()
        .filter(Some("/srv/app.conf"))
        .iter()
        .map(|r| r.version)
        .collect();
    assert_eq!(versions, (1..=bases.len() as u32).collect::<Vec<_>>());
}

/// Base one past the current version is rejected without any durable write
#[test]
fn test_invalid_base_leaves_storage_untouched() {
    let test_dir = TempDir::new().unwrap();
    let mut engine = open_engine(&test_dir);
    let file = working_file(&test_dir, "notes.txt", "first");
    let record = engine.commit(&file, 0, "init").unwrap();

    let log_before = fs::read(engine.log().path()).unwrap();
    let blobs_before = stored_blobs(&test_dir);

    fs::write(&file, "second").unwrap();
    let next = engine.current_version(&record.path) + 1;
    let result = engine.commit(&file, next, "too far");
    assert!(matches!(result, Err(ApiError::InvalidBase { .. })));

    assert_eq!(fs::read(engine.log().path()).unwrap(), log_before);
    assert_eq!(stored_blobs(&test_dir), blobs_before);
    assert_eq!(engine.log().len(), 1);
}

/// State survives reopening the data directory
#[test]
fn test_reopen_preserves_history() {
    let test_dir = TempDir::new().unwrap();
    {
        let mut engine = open_engine(&test_dir);
        engine.commit_bytes("/a", b"a1", 0, "init a").unwrap();
        engine.commit_bytes("/a", b"a2", 1, "tweak\ta").unwrap();
    }

    let mut engine = open_engine(&test_dir);
    assert_eq!(engine.current_version("/a"), 2);
    assert_eq!(engine.extract("/a", 2).unwrap(), b"a2");
    let record = engine.log().find("/a", 2).unwrap();
    assert_eq!(record.change_description, "tweak\ta");

    let next = engine.commit_bytes("/a", b"a3", 0, "again").unwrap();
    assert_eq!(next.version, 3);
}

/// Two distinct paths listed once each with stable signatures
#[test]
fn test_list_tracked_paths() {
    let test_dir = TempDir::new().unwrap();
    let mut engine = open_engine(&test_dir);
    let b = working_file(&test_dir, "b.txt", "b");
    let a = working_file(&test_dir, "a.txt", "a");
    engine.commit(&b, 0, "b").unwrap();
    engine.commit(&a, 0, "a").unwrap();

    let first = engine.list();
    assert_eq!(first.len(), 2);
    assert!(first[0].path.ends_with("a.txt"));
    assert!(first[1].path.ends_with("b.txt"));
    assert_ne!(first[0].signature, first[1].signature);

    fs::write(&a, "a again").unwrap();
    engine.commit(&a, 1, "a2").unwrap();
    let second = engine.list();
    assert_eq!(first, second);
}

/// Commits listing uses path ascending, version descending
#[test]
fn test_commits_display_order() {
    let test_dir = TempDir::new().unwrap();
    let mut engine = open_engine(&test_dir);
    engine.commit_bytes("/z", b"1", 0, "z1").unwrap();
    engine.commit_bytes("/m", b"1", 0, "m1").unwrap();
    engine.commit_bytes("/z", b"2", 0, "z2").unwrap();

    let order: Vec<(String, u32)> = engine
        .commits(None)
        .iter()
        .map(|r| (r.path.clone(), r.version))
        .collect();
    assert_eq!(
        order,
        vec![
            ("/m".to_string(), 1),
            ("/z".to_string(), 2),
            ("/z".to_string(), 1)
        ]
    );

    let only_z = engine.commits(Some("/z"));
    assert_eq!(only_z.len(), 2);
}

/// Forest over all paths keeps each path's chains separate
#[test]
fn test_tree_over_all_paths() {
    let test_dir = TempDir::new().unwrap();
    let mut engine = open_engine(&test_dir);
    engine.commit_bytes("/p", b"1", 0, "").unwrap();
    engine.commit_bytes("/q", b"1", 0, "").unwrap();
    engine.commit_bytes("/p", b"2", 0, "").unwrap();
    engine.commit_bytes("/p", b"3", 1, "").unwrap();
    engine.commit_bytes("/q", b"2", 1, "").unwrap();

    let forest = engine.tree(None).unwrap();
    assert_eq!(forest.len(), 5);
    assert_eq!(forest.roots().len(), 3);
    let shape: Vec<(usize, String, u32)> = forest
        .walk()
        .into_iter()
        .map(|(d, r)| (d, r.path.clone(), r.version))
        .collect();
    assert_eq!(
        shape,
        vec![
            (0, "/p".to_string(), 1),
            (1, "/p".to_string(), 3),
            (0, "/q".to_string(), 1),
            (1, "/q".to_string(), 2),
            (0, "/p".to_string(), 2),
        ]
    );
}

/// Extracting unknown versions is NotFound
#[test]
fn test_extract_not_found() {
    let test_dir = TempDir::new().unwrap();
    let mut engine = open_engine(&test_dir);
    engine.commit_bytes("/p", b"1", 0, "").unwrap();

    assert!(matches!(
        engine.extract("/p", 9),
        Err(ApiError::VersionNotFound { version: 9, .. })
    ));
    assert!(matches!(
        engine.extract("/untracked", 1),
        Err(ApiError::VersionNotFound { .. })
    ));
}
