//! Precedence tests for MigrationConfig::load
//!
//! These mutate process environment variables and must run serially.

use serial_test::serial;
use std::path::PathBuf;
use tempfile::TempDir;
use vaultlift_config::{ConfigError, ConfigOverrides, MigrationConfig, StorageBackend, TEST_MODE_ENV};

const VARS: &[&str] = &[
    "VAULTLIFT_IMAGE_ROOT",
    "VAULTLIFT_OUTPUT_DIR",
    "VAULTLIFT_CONCURRENCY",
    "VAULTLIFT_TIMEOUT",
    "VAULTLIFT_STORAGE_BACKEND",
    "VAULTLIFT_STORAGE_ENDPOINT",
    "VAULTLIFT_STORAGE_TOKEN",
];

/// Clears vaultlift variables and enables test mode for the test's duration
struct EnvGuard {
    saved: Vec<(String, Option<String>)>,
}

impl EnvGuard {
    fn new() -> Self {
        let mut saved = Vec::new();
        for name in VARS.iter().chain(std::iter::once(&TEST_MODE_ENV)) {
            saved.push((name.to_string(), std::env::var(name).ok()));
            std::env::remove_var(name);
        }
        std::env::set_var(TEST_MODE_ENV, "1");
        Self { saved }
    }

    fn set(&self, name: &str, value: &str) {
        std::env::set_var(name, value);
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (name, value) in &self.saved {
            match value {
                Some(v) => std::env::set_var(name, v),
                None => std::env::remove_var(name),
            }
        }
    }
}

fn write_config(temp: &TempDir, contents: &str) -> PathBuf {
    let path = temp.path().join("config.toml");
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
#[serial]
fn test_defaults_need_an_endpoint() {
    let _env = EnvGuard::new();

    let err = MigrationConfig::load(&ConfigOverrides::default()).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { .. }));
}

#[test]
#[serial]
fn test_env_supplies_endpoint() {
    let env = EnvGuard::new();
    env.set("VAULTLIFT_STORAGE_ENDPOINT", "https://env.example");
    env.set("VAULTLIFT_STORAGE_TOKEN", "tok");

    let config = MigrationConfig::load(&ConfigOverrides::default()).unwrap();
    assert_eq!(config.storage.endpoint.as_deref(), Some("https://env.example"));
    assert_eq!(config.storage.bearer_token.as_deref(), Some("tok"));
}

#[test]
#[serial]
fn test_file_then_env_then_overrides() {
    let env = EnvGuard::new();
    let temp = TempDir::new().unwrap();
    let path = write_config(
        &temp,
        r#"
image_root = "/file/images"
output_dir = "/file/out"
concurrency_limit = 2
timeout_seconds = 30

[storage]
endpoint = "https://file.example"
"#,
    );

    env.set("VAULTLIFT_CONCURRENCY", "5");
    env.set("VAULTLIFT_OUTPUT_DIR", "/env/out");

    let config = MigrationConfig::load(&ConfigOverrides {
        config_file: Some(path),
        output_dir: Some(PathBuf::from("/args/out")),
        ..Default::default()
    })
    .unwrap();

    assert_eq!(config.image_root, PathBuf::from("/file/images"));
    assert_eq!(config.timeout_seconds, 30);
    assert_eq!(config.concurrency_limit, 5);
    assert_eq!(config.output_dir, PathBuf::from("/args/out"));
    assert_eq!(config.storage.endpoint.as_deref(), Some("https://file.example"));
}

#[test]
#[serial]
fn test_invalid_env_number() {
    let env = EnvGuard::new();
    env.set("VAULTLIFT_STORAGE_ENDPOINT", "https://env.example");
    env.set("VAULTLIFT_TIMEOUT", "soon");

    let err = MigrationConfig::load(&ConfigOverrides::default()).unwrap_err();
    assert!(err.to_string().contains("VAULTLIFT_TIMEOUT"));
}

#[test]
#[serial]
fn test_explicit_missing_file_is_an_error() {
    let _env = EnvGuard::new();
    let temp = TempDir::new().unwrap();

    let err = MigrationConfig::load(&ConfigOverrides {
        config_file: Some(temp.path().join("nope.toml")),
        ..Default::default()
    })
    .unwrap_err();

    assert!(matches!(err, ConfigError::Read { .. }));
}

#[test]
#[serial]
fn test_directory_backend_from_overrides() {
    let _env = EnvGuard::new();

    let config = MigrationConfig::load(&ConfigOverrides {
        backend: Some(StorageBackend::Directory),
        storage_directory: Some(PathBuf::from("/srv/img")),
        concurrency_limit: Some(1),
        ..Default::default()
    })
    .unwrap();

    assert_eq!(config.storage.backend, StorageBackend::Directory);
    assert_eq!(config.concurrency_limit, 1);
}

#[test]
#[serial]
fn test_env_selects_backend() {
    let env = EnvGuard::new();
    env.set("VAULTLIFT_STORAGE_BACKEND", "Directory");
    env.set("VAULTLIFT_STORAGE_ENDPOINT", "https://env.example");

    let config = MigrationConfig::resolve(&ConfigOverrides::default()).unwrap();
    assert_eq!(config.storage.backend, StorageBackend::Directory);

    env.set("VAULTLIFT_STORAGE_BACKEND", "ftp");
    let err = MigrationConfig::resolve(&ConfigOverrides::default()).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { .. }));
}
