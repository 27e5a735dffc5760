// SPDX-FileCopyrightText: 2026 ClientPing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the ClientPing configuration system.

use clientping_config::diagnostic::ConfigError;
use clientping_config::model::{ClientPingConfig, StorageBackend};
use clientping_config::{load_and_validate_path, load_and_validate_str, load_config_from_str};
use serial_test::serial;

#[test]
fn full_toml_deserializes() {
    let toml = r#"
[server]
host = "0.0.0.0"
port = 9000
api_token = "tok"
request_timeout_secs = 20

[logging]
level = "debug"

[storage]
backend = "sqlite"
database_path = "/tmp/clientping-test.db"
wal_mode = false

[automation]
welcome_message = "Hello {{name}}"
register_default_welcome = false
fallback_message = "oops"
max_history = 10
max_action_delay_ms = 1500

[telegram]
bot_token = "123:ABC"
webhook_secret = "hook"

[whatsapp]
access_token = "EAAG"
phone_number_id = "1099"
verify_token = "verify-me"
app_secret = "meta-secret"
api_base = "http://localhost:9999"

[metrics]
enabled = false
"#;

    let config = load_and_validate_str(toml).expect("valid config");
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 9000);
    assert_eq!(config.server.api_token.as_deref(), Some("tok"));
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.storage.backend, StorageBackend::Sqlite);
    assert!(!config.storage.wal_mode);
    assert_eq!(config.automation.welcome_message, "Hello {{name}}");
    assert!(!config.automation.register_default_welcome);
    assert_eq!(config.automation.max_history, 10);
    assert_eq!(config.automation.max_action_delay_ms, 1500);
    assert_eq!(config.telegram.webhook_secret.as_deref(), Some("hook"));
    assert_eq!(config.whatsapp.phone_number_id.as_deref(), Some("1099"));
    assert_eq!(config.whatsapp.api_base, "http://localhost:9999");
    assert!(!config.metrics.enabled);
}

#[test]
fn empty_toml_gives_defaults() {
    let config = load_config_from_str("").expect("empty config");
    let defaults = ClientPingConfig::default();
    assert_eq!(config.server.port, defaults.server.port);
    assert_eq!(config.storage.backend, StorageBackend::Memory);
    assert_eq!(config.automation.max_history, 50);
    assert!(config.automation.register_default_welcome);
    assert!(config.server.api_token.is_none());
}

#[test]
fn unknown_key_in_automation_suggests_fix() {
    let toml = "[automation]\nwelcom_message = \"hi\"\n";
    let errors = load_and_validate_str(toml).unwrap_err();
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        ConfigError::UnknownKey {
            key, suggestion, ..
        } => {
            assert_eq!(key, "welcom_message");
            assert_eq!(suggestion.as_deref(), Some("welcome_message"));
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

#[test]
fn unknown_section_rejected() {
    let errors = load_and_validate_str("[agent]\nname = \"x\"\n").unwrap_err();
    assert!(matches!(errors[0], ConfigError::UnknownKey { .. }));
}

#[test]
fn wrong_type_reported() {
    let errors = load_and_validate_str("[server]\nport = \"eighty\"\n").unwrap_err();
    assert!(matches!(errors[0], ConfigError::InvalidType { .. }));
}

#[test]
fn bad_storage_backend_rejected() {
    assert!(load_and_validate_str("[storage]\nbackend = \"postgres\"\n").is_err());
}

#[test]
fn validation_runs_after_parse() {
    let errors = load_and_validate_str("[automation]\nmax_history = 0\n").unwrap_err();
    assert!(matches!(errors[0], ConfigError::Validation { .. }));
}

#[test]
#[serial]
fn explicit_file_loads() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clientping.toml");
    std::fs::write(&path, "[server]\nport = 7070\n").unwrap();

    let config = load_and_validate_path(&path).expect("file config");
    assert_eq!(config.server.port, 7070);
}

#[test]
#[serial]
fn env_overrides_file_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clientping.toml");
    std::fs::write(&path, "[server]\nport = 7070\n\n[whatsapp]\napi_base = \"http://file\"\n").unwrap();

    // SAFETY: serialized with every other test that reads the environment.
    unsafe {
        std::env::set_var("CLIENTPING_SERVER_PORT", "9191");
        std::env::set_var("CLIENTPING_WHATSAPP_API_BASE", "http://env");
    }
    let loaded = load_and_validate_path(&path);
    unsafe {
        std::env::remove_var("CLIENTPING_SERVER_PORT");
        std::env::remove_var("CLIENTPING_WHATSAPP_API_BASE");
    }

    let config = loaded.expect("env override config");
    assert_eq!(config.server.port, 9191);
    assert_eq!(config.whatsapp.api_base, "http://env");
}
