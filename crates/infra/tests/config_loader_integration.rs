//! Integration tests for configuration loader
//!
//! Tests the end-to-end behavior of loading configuration from files.

use std::path::PathBuf;

use bunq_domain::{BunqError, RateLimit, ReauthPolicy, StoreConfig};
use bunq_infra::{config, BunqClientBuilder};
use tempfile::TempDir;

#[test]
fn test_load_config_from_json_file() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("bunq.json");
    std::fs::write(
        &path,
        r#"{
            "api_key": "json-key",
            "device_description": "reconciler",
            "persist_session": false,
            "store": {"type": "file", "path": "/var/lib/bunq/state.json"},
            "rate_limits": {"get": {"max_concurrent": 1, "window_ms": 1000}},
            "reauth_policy": "unauthorized_or_forbidden",
            "timeout_secs": 10
        }"#,
    )
    .expect("Failed to write config");

    let config = config::load_from_file(Some(path)).expect("config");

    assert_eq!(config.api_key, "json-key");
    assert_eq!(config.device_description, "reconciler");
    assert!(!config.persist_session);
    assert_eq!(config.store, StoreConfig::File { path: PathBuf::from("/var/lib/bunq/state.json") });
    assert_eq!(config.rate_limits.get, Some(RateLimit::new(1, 1000)));
    assert_eq!(config.rate_limits.post, Some(RateLimit::new(5, 3000)));
    assert_eq!(config.reauth_policy, ReauthPolicy::UnauthorizedOrForbidden);
    assert_eq!(config.timeout().as_secs(), 10);
}

#[test]
fn test_load_config_from_toml_file() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("bunq.toml");
    std::fs::write(
        &path,
        r#"
api_key = "toml-key"
sandbox = true
api_version = "v1"

[rate_limits.delete]
max_concurrent = 1
window_ms = 3000
"#,
    )
    .expect("Failed to write config");

    let config = config::load_from_file(Some(path)).expect("config");

    assert!(config.sandbox);
    assert_eq!(config.base_url(), "https://public-api.sandbox.bunq.com/v1");
    assert_eq!(config.rate_limits.delete, Some(RateLimit::new(1, 3000)));
    assert_eq!(config.store, StoreConfig::Memory);
}

#[test]
fn test_loaded_config_builds_client() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("config.json");
    let store = dir.path().join("state.json");
    std::fs::write(
        &path,
        format!(
            r#"{{"api_key": "k", "store": {{"type": "file", "path": {}}}}}"#,
            serde_json::to_string(&store).expect("path as json")
        ),
    )
    .expect("Failed to write config");

    let config = config::load_from_file(Some(path)).expect("config");
    assert!(BunqClientBuilder::new(config).build().is_ok());
    // Building never touches the store
    assert!(!store.exists());
}

#[test]
fn test_invalid_values_are_config_errors() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("bunq.json");
    std::fs::write(&path, r#"{"api_key": "k", "timeout_secs": 0}"#).expect("write");

    let err = config::load_from_file(Some(path)).unwrap_err();
    assert!(matches!(err, BunqError::Config(msg) if msg.contains("timeout_secs")));
}
