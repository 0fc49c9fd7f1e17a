//! Config file loading and saving against a scratch directory

use navscope::NavConfig;
use navscope::nav::{AnimToken, ContainerId};
use std::fs;
use tempfile::TempDir;

/// Test that a missing file yields defaults
#[test]
fn test_missing_file_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let config = NavConfig::load_from(&dir.path().join("config.toml")).unwrap();
    assert_eq!(config, NavConfig::default());
}

/// Test that save creates parent directories and load reads the same values back
#[test]
fn test_save_then_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("navscope").join("config.toml");
    let config = NavConfig::default()
        .with_root_container(ContainerId(10))
        .with_state_key_prefix("nav")
        .with_default_anims(AnimToken(3), AnimToken(4))
        .with_log_transactions(true);

    config.save_to(&path).unwrap();
    assert!(path.exists());

    let loaded = NavConfig::load_from(&path).unwrap();
    assert_eq!(loaded, config);
}

/// Test that a hand-written partial file fills in the rest
#[test]
fn test_partial_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "state_key_prefix = \"screens\"\n").unwrap();

    let config = NavConfig::load_from(&path).unwrap();
    assert_eq!(config.state_key_prefix, "screens");
    assert_eq!(config.root_container, ContainerId(1));
}

/// Test that a malformed file is an error naming the file
#[test]
fn test_malformed_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "root_container = \"not a number\"").unwrap();

    let err = NavConfig::load_from(&path).unwrap_err();
    assert!(format!("{:#}", err).contains("Failed to parse config file"));
}
