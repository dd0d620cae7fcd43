//! Configuration and graceful degradation tests
//!
//! Uses serial_test to keep environment variable manipulation from racing.

use cmmc_common::config::{
    load_toml_config, write_toml_config, CatalogConfig, CompiledDefaults, LoggingConfig,
    RootFolderInitializer, RootFolderResolver, TomlConfig,
};
use serial_test::serial;
use std::env;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_compiled_defaults_for_current_platform() {
    let defaults = CompiledDefaults::for_current_platform();

    assert!(!defaults.root_folder.as_os_str().is_empty());
    assert!(defaults.root_folder.ends_with("cmmc"));
    assert_eq!(defaults.log_level, "info");
    assert!(defaults.log_file.is_none());
}

#[test]
#[serial]
fn test_resolver_env_var_root_folder() {
    env::remove_var("CMMC_ROOT");
    env::set_var("CMMC_ROOT_FOLDER", "/tmp/cmmc-test-env-folder");

    let root_folder = RootFolderResolver::new("test-module").resolve();
    assert_eq!(root_folder, PathBuf::from("/tmp/cmmc-test-env-folder"));

    env::remove_var("CMMC_ROOT_FOLDER");
}

#[test]
#[serial]
fn test_resolver_alternative_env_var() {
    env::remove_var("CMMC_ROOT_FOLDER");
    env::set_var("CMMC_ROOT", "/tmp/cmmc-test-env-root");

    let root_folder = RootFolderResolver::new("test-module").resolve();
    assert_eq!(root_folder, PathBuf::from("/tmp/cmmc-test-env-root"));

    env::remove_var("CMMC_ROOT");
}

#[test]
#[serial]
fn test_resolver_root_folder_var_takes_precedence() {
    env::set_var("CMMC_ROOT_FOLDER", "/tmp/cmmc-priority-1");
    env::set_var("CMMC_ROOT", "/tmp/cmmc-priority-2");

    let root_folder = RootFolderResolver::new("test-module").resolve();
    assert_eq!(root_folder, PathBuf::from("/tmp/cmmc-priority-1"));

    env::remove_var("CMMC_ROOT_FOLDER");
    env::remove_var("CMMC_ROOT");
}

#[test]
#[serial]
fn test_resolver_missing_config_file_does_not_error() {
    env::remove_var("CMMC_ROOT_FOLDER");
    env::remove_var("CMMC_ROOT");

    // A module name that will never have a config file
    let root_folder = RootFolderResolver::new("nonexistent-test-module-12345").resolve();
    assert_eq!(root_folder, CompiledDefaults::for_current_platform().root_folder);
}

#[test]
fn test_initializer_creates_nested_directory_idempotently() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("level1").join("level2");

    let initializer = RootFolderInitializer::new(root.clone());
    assert!(!initializer.database_exists());

    initializer.ensure_directory_exists().unwrap();
    initializer.ensure_directory_exists().unwrap();

    assert!(root.is_dir());
    assert_eq!(initializer.database_path(), root.join("cmmc.db"));
}

#[test]
fn test_atomic_write_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("cmmc-at.toml");

    let config = TomlConfig {
        root_folder: Some(PathBuf::from("/srv/cmmc")),
        logging: LoggingConfig {
            level: "debug".to_string(),
            file: None,
        },
        catalog: Some(CatalogConfig {
            level1_url: Some("https://example.org/l1.json".to_string()),
            level2_url: None,
        }),
        bind_address: None,
        port: Some(6000),
    };

    write_toml_config(&config, &target).unwrap();
    assert!(target.exists());
    assert!(!temp_dir.path().join("cmmc-at.toml.tmp").exists());

    let loaded = load_toml_config(&target).unwrap();
    assert_eq!(loaded, config);
}

#[cfg(unix)]
#[test]
fn test_atomic_write_sets_owner_only_permissions() {
    use std::os::unix::fs::PermissionsExt;

    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("perm.toml");
    write_toml_config(&TomlConfig::default(), &target).unwrap();

    let mode = std::fs::metadata(&target).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[test]
fn test_sparse_toml_uses_defaults() {
    let config: TomlConfig = toml::from_str(
        r#"
        root_folder = "/srv/cmmc"
        [logging]
        level = "warn"
    "#,
    )
    .unwrap();

    assert_eq!(config.root_folder, Some(PathBuf::from("/srv/cmmc")));
    assert_eq!(config.logging.level, "warn");
    assert!(config.catalog.is_none());
    assert!(config.port.is_none());
}

#[test]
fn test_invalid_toml_is_config_error() {
    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("bad.toml");
    std::fs::write(&target, "port = \"not a number\"").unwrap();

    let err = load_toml_config(&target).unwrap_err();
    assert!(matches!(err, cmmc_common::Error::Config(_)));
}
