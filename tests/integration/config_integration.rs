//! Integration tests for configuration loading and its effect on the store

use super::test_utils::{noop, state, with_env};
use parking_lot::Mutex;
use statemux::{ConfigLoader, SchemaConfig, Store, Value, Values};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;

#[test]
fn test_load_without_file_uses_defaults() {
    let config = with_env(&[], || ConfigLoader::load(None)).unwrap();
    assert_eq!(config.debounce_ms, 0);
    assert_eq!(config.separator, ".");
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_env_overrides_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("statemux.toml");
    std::fs::write(
        &config_file,
        r#"
debounce_ms = 10
separator = ":"

[logging]
level = "warn"
"#,
    )
    .unwrap();

    let config = with_env(
        &[
            ("STATEMUX_DEBOUNCE_MS", "250"),
            ("STATEMUX_LOGGING__LEVEL", "debug"),
        ],
        || ConfigLoader::load(Some(&config_file)),
    )
    .unwrap();

    assert_eq!(config.debounce_ms, 250);
    assert_eq!(config.separator, ":");
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn test_invalid_separator_in_file_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("statemux.toml");
    std::fs::write(&config_file, "separator = \"\"\n").unwrap();

    let result = with_env(&[], || ConfigLoader::load(Some(&config_file)));
    assert!(result.is_err());
}

#[test]
fn test_loaded_config_drives_store() {
    let config = ConfigLoader::from_toml_str("debounce_ms = 60000\nseparator = \"/\"\n").unwrap();

    let outbound: Arc<Mutex<Vec<Values>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = outbound.clone();
    let mut store = Store::with_config(&config, move |v: &Values| sink.lock().push(v.clone()));
    let id = store
        .register(SchemaConfig::new().with_prefix("map").field("zoom", 1), noop())
        .unwrap();

    let now = Instant::now();
    store
        .update_provider(id, state(&[("zoom", Value::from(7))]))
        .unwrap();
    store.run_pending_at(now).unwrap();
    assert!(outbound.lock().is_empty());

    store
        .run_pending_at(Instant::now() + Duration::from_secs(61))
        .unwrap();
    let outbound = outbound.lock();
    assert_eq!(outbound.len(), 1);
    assert_eq!(outbound[0].get("map/zoom").map(String::as_str), Some("7"));
}
