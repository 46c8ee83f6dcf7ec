//! Integration tests for Settings loading.
//!
//! These tests use explicit config files in temp directories, never the
//! user's global config.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use dantalian::application::ApplicationError;
use dantalian::config::Settings;

#[test]
fn given_config_file_with_root_when_load_from_then_root_is_set() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("dantalian.toml");
    fs::write(&path, "root = \"/srv/library\"\n").unwrap();

    // Act
    let settings = Settings::load_from(Some(&path)).expect("load settings");

    // Assert
    assert_eq!(settings.root, Some(PathBuf::from("/srv/library")));
}

#[test]
fn given_empty_config_file_when_load_from_then_defaults() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("dantalian.toml");
    fs::write(&path, "").unwrap();

    let settings = Settings::load_from(Some(&path)).expect("load settings");

    if std::env::var_os("DANTALIAN_ROOT").is_none() {
        assert_eq!(settings, Settings::default());
    }
}

#[test]
fn given_tilde_root_when_load_from_then_expanded() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("dantalian.toml");
    fs::write(&path, "root = \"~/library\"\n").unwrap();

    let settings = Settings::load_from(Some(&path)).expect("load settings");

    if std::env::var_os("DANTALIAN_ROOT").is_none() {
        let root = settings.root.unwrap();
        assert!(!root.to_string_lossy().starts_with('~'));
        assert!(root.ends_with("library"));
    }
}

#[test]
fn given_invalid_toml_when_load_from_then_config_error() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("dantalian.toml");
    fs::write(&path, "root = [unterminated").unwrap();

    let result = Settings::load_from(Some(&path));

    assert!(matches!(result, Err(ApplicationError::Config { .. })));
}

#[test]
fn given_missing_config_file_when_load_from_then_config_error() {
    let temp = TempDir::new().unwrap();

    let result = Settings::load_from(Some(&temp.path().join("absent.toml")));

    assert!(matches!(result, Err(ApplicationError::Config { .. })));
}
