// SPDX-FileCopyrightText: 2026 ClientPing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Semantic checks that serde attributes cannot express.
//!
//! All problems are collected; validation does not stop at the first one.

use crate::diagnostic::ConfigError;
use crate::model::{ClientPingConfig, StorageBackend};

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration.
pub fn validate_config(config: &ClientPingConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let host = config.server.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::validation("server.host must not be empty"));
    } else {
        let is_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_ip && !is_hostname {
            errors.push(ConfigError::validation(format!(
                "server.host `{host}` is not a valid IP address or hostname"
            )));
        }
    }

    if config.server.request_timeout_secs == 0 {
        errors.push(ConfigError::validation(
            "server.request_timeout_secs must be at least 1",
        ));
    }

    if let Some(token) = &config.server.api_token
        && token.trim().is_empty()
    {
        errors.push(ConfigError::validation(
            "server.api_token must not be blank; remove it to disable the API",
        ));
    }

    if !LOG_LEVELS.contains(&config.logging.level.to_ascii_lowercase().as_str()) {
        errors.push(ConfigError::validation(format!(
            "logging.level `{}` must be one of: {}",
            config.logging.level,
            LOG_LEVELS.join(", ")
        )));
    }

    if config.storage.backend == StorageBackend::Sqlite
        && config.storage.database_path.trim().is_empty()
    {
        errors.push(ConfigError::validation(
            "storage.database_path must not be empty when storage.backend = \"sqlite\"",
        ));
    }

    if config.automation.max_history == 0 {
        errors.push(ConfigError::validation(
            "automation.max_history must be at least 1",
        ));
    }

    if config.automation.register_default_welcome
        && config.automation.welcome_message.trim().is_empty()
    {
        errors.push(ConfigError::validation(
            "automation.welcome_message must not be empty while register_default_welcome is on",
        ));
    }

    // The whole flow, delays included, has to fit in one request.
    let timeout_ms = config.server.request_timeout_secs.saturating_mul(1000);
    if config.server.request_timeout_secs > 0 && config.automation.max_action_delay_ms >= timeout_ms
    {
        errors.push(ConfigError::validation(format!(
            "automation.max_action_delay_ms ({}) must be below server.request_timeout_secs ({}s)",
            config.automation.max_action_delay_ms, config.server.request_timeout_secs
        )));
    }

    let wa = &config.whatsapp;
    if wa.access_token.is_some() && wa.phone_number_id.is_none() {
        errors.push(ConfigError::validation(
            "whatsapp.phone_number_id is required when whatsapp.access_token is set",
        ));
    }
    if !(wa.api_base.starts_with("https://") || wa.api_base.starts_with("http://")) {
        errors.push(ConfigError::validation(format!(
            "whatsapp.api_base `{}` must be an http(s) URL",
            wa.api_base
        )));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
