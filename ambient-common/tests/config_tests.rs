//! Integration tests for config file resolution and graceful degradation
//!
//! Tests that manipulate AMBIENT_CONFIG are marked with #[serial] so they
//! never race on the process environment.

use ambient_common::config::{load_config, resolve_config_path, TomlConfig, CONFIG_ENV_VAR};
use ambient_common::Error;
use serial_test::serial;
use std::env;
use std::fs;
use tempfile::TempDir;

fn write_config(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("Failed to write config file");
    path
}

#[test]
#[serial]
fn test_cli_path_takes_priority_over_env() {
    let dir = TempDir::new().unwrap();
    let cli_path = write_config(&dir, "cli.toml", "port = 6001");
    let env_path = write_config(&dir, "env.toml", "port = 6002");

    env::set_var(CONFIG_ENV_VAR, &env_path);
    let resolved = resolve_config_path(Some(&cli_path));
    env::remove_var(CONFIG_ENV_VAR);

    assert_eq!(resolved, Some(cli_path));
}

#[test]
#[serial]
fn test_env_path_used_without_cli() {
    let dir = TempDir::new().unwrap();
    let env_path = write_config(&dir, "env.toml", "port = 6002");

    env::set_var(CONFIG_ENV_VAR, &env_path);
    let config = load_config(None);
    env::remove_var(CONFIG_ENV_VAR);

    assert_eq!(config.unwrap().port, 6002);
}

#[test]
#[serial]
fn test_missing_file_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("does-not-exist.toml");

    let config = load_config(Some(&missing)).expect("Missing config must not be fatal");
    assert_eq!(config, TomlConfig::default());
}

#[test]
#[serial]
fn test_invalid_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        "bad.toml",
        r#"
        [timing]
        preload_lead_time_ms = 40000
        fallback_duration_ms = 30000
        "#,
    );

    match load_config(Some(&path)) {
        Err(Error::Config(msg)) => assert!(msg.contains("preload_lead_time_ms")),
        other => panic!("Expected config error, got {:?}", other),
    }
}

#[test]
#[serial]
fn test_full_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        "full.toml",
        r#"
        bind_address = "0.0.0.0"
        port = 7000
        default_volume = 0.4

        [logging]
        level = "debug"

        [timing]
        preload_lead_time_ms = 5000
        crossfade_ms = 4000
        crossfade_steps = 100
        max_consecutive_failures = 5
        "#,
    );

    let config = load_config(Some(&path)).unwrap();
    assert_eq!(config.bind_address, "0.0.0.0");
    assert_eq!(config.port, 7000);
    assert_eq!(config.default_volume, 0.4);
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.timing.preload_lead_time_ms, 5000);
    assert_eq!(config.timing.crossfade_steps, 100);
    assert_eq!(config.timing.max_consecutive_failures, 5);
    // Untouched keys keep their defaults
    assert_eq!(config.timing.fade_in_steps, 25);
}
