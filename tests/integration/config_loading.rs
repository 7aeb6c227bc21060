//! Configuration layering: defaults, global file, environment, CLI flags

use clap::Parser;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use verso::cli::{load_config, Cli};
use verso::config::{ConfigLoader, DiffToolKind};
use verso::error::ApiError;
use verso::version_log::MalformedPolicy;

use crate::integration::with_xdg_env;

fn write_global_config(test_dir: &TempDir, content: &str) -> PathBuf {
    let dir = test_dir.path().join("config").join("verso");
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("config.toml");
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_defaults_without_any_file() {
    let test_dir = TempDir::new().unwrap();
    with_xdg_env(&test_dir, || {
        let config = ConfigLoader::load().unwrap();
        assert!(config.storage.data_dir.is_none());
        assert!(config.storage.lock);
        assert_eq!(config.storage.on_malformed, MalformedPolicy::Abort);
        assert_eq!(config.diff.tool, DiffToolKind::Diff);
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.logging.output, "stderr");

        assert_eq!(
            config.storage.resolve_data_dir().unwrap(),
            test_dir.path().join("data").join("verso")
        );
    });
}

#[test]
fn test_global_file_is_picked_up() {
    let test_dir = TempDir::new().unwrap();
    write_global_config(
        &test_dir,
        "[storage]\non_malformed = \"skip\"\n\n[diff]\ntool = \"builtin\"\ncontext_lines = 1\n",
    );

    with_xdg_env(&test_dir, || {
        let config = ConfigLoader::load().unwrap();
        assert_eq!(config.storage.on_malformed, MalformedPolicy::Skip);
        assert_eq!(config.diff.tool, DiffToolKind::Builtin);
        assert_eq!(config.diff.context_lines, 1);
        // Untouched keys keep their defaults
        assert!(config.storage.lock);
    });
}

#[test]
fn test_environment_overrides_global_file() {
    let test_dir = TempDir::new().unwrap();
    write_global_config(&test_dir, "[storage]\nlock = true\n\n[diff]\ntool = \"builtin\"\n");

    with_xdg_env(&test_dir, || {
        std::env::set_var("VERSO__STORAGE__LOCK", "false");
        std::env::set_var("VERSO__DIFF__TOOL", "diff");
        std::env::set_var("VERSO__STORAGE__DATA_DIR", "/srv/verso-env");

        let config = ConfigLoader::load().unwrap();
        assert!(!config.storage.lock);
        assert_eq!(config.diff.tool, DiffToolKind::Diff);
        assert_eq!(config.storage.data_dir, Some(PathBuf::from("/srv/verso-env")));
    });
}

#[test]
fn test_explicit_config_replaces_global_file() {
    let test_dir = TempDir::new().unwrap();
    write_global_config(&test_dir, "[diff]\ntool = \"builtin\"\n");
    let explicit = test_dir.path().join("explicit.toml");
    fs::write(&explicit, "[storage]\nlock = false\n").unwrap();

    with_xdg_env(&test_dir, || {
        let cli = Cli::try_parse_from(["verso", "--config", explicit.to_str().unwrap(), "list"])
            .unwrap();
        let config = load_config(&cli).unwrap();
        assert!(!config.storage.lock);
        assert_eq!(config.diff.tool, DiffToolKind::Diff);
    });
}

#[test]
fn test_missing_explicit_config_is_error() {
    let test_dir = TempDir::new().unwrap();
    let absent = test_dir.path().join("absent.toml");

    with_xdg_env(&test_dir, || {
        let cli =
            Cli::try_parse_from(["verso", "--config", absent.to_str().unwrap(), "list"]).unwrap();
        assert!(matches!(load_config(&cli), Err(ApiError::ConfigError(_))));
    });
}

#[test]
fn test_cli_flags_override_configuration() {
    let test_dir = TempDir::new().unwrap();
    write_global_config(&test_dir, "[storage]\ndata_dir = \"/srv/from-file\"\n");

    with_xdg_env(&test_dir, || {
        let cli = Cli::try_parse_from(["verso", "--data-dir", "/srv/from-cli", "--verbose", "list"])
            .unwrap();
        let config = load_config(&cli).unwrap();
        assert_eq!(config.storage.data_dir, Some(PathBuf::from("/srv/from-cli")));
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.enabled);

        let cli = Cli::try_parse_from(["verso", "--quiet", "list"]).unwrap();
        let config = load_config(&cli).unwrap();
        assert!(!config.logging.enabled);
        assert_eq!(config.storage.data_dir, Some(PathBuf::from("/srv/from-file")));
    });
}

#[test]
fn test_quiet_conflicts_with_verbose() {
    assert!(Cli::try_parse_from(["verso", "--quiet", "--verbose", "list"]).is_err());
}

#[test]
fn test_file_output_defaults_to_data_dir() {
    let test_dir = TempDir::new().unwrap();
    let data_dir = test_dir.path().join("store");

    with_xdg_env(&test_dir, || {
        let cli = Cli::try_parse_from([
            "verso",
            "--data-dir",
            data_dir.to_str().unwrap(),
            "--log-output",
            "file",
            "list",
        ])
        .unwrap();
        let config = load_config(&cli).unwrap();
        assert_eq!(config.logging.output, "file");
        assert_eq!(config.logging.file, Some(data_dir.join("verso.log")));

        let custom = test_dir.path().join("custom.log");
        let cli = Cli::try_parse_from([
            "verso",
            "--log-output",
            "file+stderr",
            "--log-file",
            custom.to_str().unwrap(),
            "list",
        ])
        .unwrap();
        let config = load_config(&cli).unwrap();
        assert_eq!(config.logging.file, Some(custom.clone()));
    });
}

#[test]
fn test_verbose_adds_stderr_to_file_output() {
    let test_dir = TempDir::new().unwrap();
    write_global_config(&test_dir, "[logging]\noutput = \"file\"\n");

    with_xdg_env(&test_dir, || {
        let cli = Cli::try_parse_from(["verso", "--verbose", "list"]).unwrap();
        let config = load_config(&cli).unwrap();
        assert_eq!(config.logging.output, "file+stderr");
        assert_eq!(
            config.logging.file,
            Some(test_dir.path().join("data").join("verso").join("verso.log"))
        );
    });
}

#[test]
fn test_invalid_cli_log_level_rejected() {
    let test_dir = TempDir::new().unwrap();
    with_xdg_env(&test_dir, || {
        let cli = Cli::try_parse_from(["verso", "--log-level", "loud", "list"]).unwrap();
        assert!(matches!(load_config(&cli), Err(ApiError::ConfigError(_))));
    });
}
