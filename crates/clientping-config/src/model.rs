// SPDX-FileCopyrightText: 2026 ClientPing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the ClientPing service.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so a typo fails at
//! startup instead of silently falling back to a default.

use serde::{Deserialize, Serialize};

const REDACTED: &str = "[redacted]";

/// Top-level ClientPing configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ClientPingConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// State backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Automation engine behavior.
    #[serde(default)]
    pub automation: AutomationConfig,

    /// Telegram Bot API credentials.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// WhatsApp Cloud API credentials.
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,

    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl ClientPingConfig {
    /// Copy with every secret replaced, for printing.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        let hide = |v: &mut Option<String>| {
            if v.is_some() {
                *v = Some(REDACTED.to_string());
            }
        };
        hide(&mut copy.server.api_token);
        hide(&mut copy.telegram.bot_token);
        hide(&mut copy.telegram.webhook_secret);
        hide(&mut copy.whatsapp.access_token);
        hide(&mut copy.whatsapp.verify_token);
        hide(&mut copy.whatsapp.app_secret);
        copy
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind. `0` picks a free port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Bearer token for the `/v1` API. `None` rejects every `/v1` request.
    #[serde(default)]
    pub api_token: Option<String>,

    /// Upper bound on handling one inbound message, including action delays.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            api_token: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// trace, debug, info, warn, or error. `RUST_LOG` takes precedence.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Which state backend to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process-local maps; state is lost on restart.
    #[default]
    Memory,
    /// SQLite file at `storage.database_path`.
    Sqlite,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Path to the SQLite database file (sqlite backend only).
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("clientping").join("clientping.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("clientping.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Automation engine configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AutomationConfig {
    /// Text of the built-in welcome flow. Supports the same placeholders as
    /// `send_message` actions.
    #[serde(default = "default_welcome_message")]
    pub welcome_message: String,

    /// Register the built-in welcome flow at startup.
    #[serde(default = "default_register_default_welcome")]
    pub register_default_welcome: bool,

    /// Sent to the chat when a flow fails part-way.
    #[serde(default = "default_fallback_message")]
    pub fallback_message: String,

    /// Messages kept per conversation context.
    #[serde(default = "default_max_history")]
    pub max_history: usize,

    /// Ceiling applied to any action's `delay_ms`.
    #[serde(default = "default_max_action_delay_ms")]
    pub max_action_delay_ms: u64,
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            welcome_message: default_welcome_message(),
            register_default_welcome: default_register_default_welcome(),
            fallback_message: default_fallback_message(),
            max_history: default_max_history(),
            max_action_delay_ms: default_max_action_delay_ms(),
        }
    }
}

fn default_welcome_message() -> String {
    "Hi {{first_name}}! Thanks for reaching out. How can we help you today?".to_string()
}

fn default_register_default_welcome() -> bool {
    true
}

fn default_fallback_message() -> String {
    "Sorry, something went wrong on our side. We'll get back to you shortly.".to_string()
}

fn default_max_history() -> usize {
    50
}

fn default_max_action_delay_ms() -> u64 {
    30_000
}

/// Telegram Bot API configuration. No token disables the channel.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Expected `X-Telegram-Bot-Api-Secret-Token` header on webhook calls.
    #[serde(default)]
    pub webhook_secret: Option<String>,
}

/// WhatsApp Cloud API configuration. No access token disables the channel.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WhatsAppConfig {
    #[serde(default)]
    pub access_token: Option<String>,

    /// Business phone number id messages are sent from.
    #[serde(default)]
    pub phone_number_id: Option<String>,

    /// Token echoed back during Meta's webhook verification handshake.
    #[serde(default)]
    pub verify_token: Option<String>,

    /// App secret for `X-Hub-Signature-256` checks. `None` skips the check.
    #[serde(default)]
    pub app_secret: Option<String>,

    #[serde(default = "default_whatsapp_api_base")]
    pub api_base: String,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            phone_number_id: None,
            verify_token: None,
            app_secret: None,
            api_base: default_whatsapp_api_base(),
        }
    }
}

fn default_whatsapp_api_base() -> String {
    "https://graph.facebook.com/v21.0".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    /// Install the Prometheus recorder and serve `/metrics`.
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
        }
    }
}

fn default_metrics_enabled() -> bool {
    true
}
