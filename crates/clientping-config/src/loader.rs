// SPDX-FileCopyrightText: 2026 ClientPing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading with Figment.
//!
//! Lookup order, later wins: compiled defaults, `/etc/clientping/clientping.toml`,
//! `~/.config/clientping/clientping.toml`, `./clientping.toml`, `CLIENTPING_*`
//! environment variables.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::ClientPingConfig;

/// Config sections, used to map `CLIENTPING_<SECTION>_<KEY>` to `section.key`.
const SECTIONS: &[&str] = &[
    "server",
    "logging",
    "storage",
    "automation",
    "telegram",
    "whatsapp",
    "metrics",
];

pub(crate) const SYSTEM_CONFIG: &str = "/etc/clientping/clientping.toml";
pub(crate) const LOCAL_CONFIG: &str = "clientping.toml";

pub(crate) fn user_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("clientping/clientping.toml"))
        .unwrap_or_default()
}

/// Load configuration from the standard hierarchy with env var overrides.
pub fn load_config() -> Result<ClientPingConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<ClientPingConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ClientPingConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from an explicit file, still honoring env overrides.
pub fn load_config_from_path(path: &Path) -> Result<ClientPingConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ClientPingConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// The Figment behind [`load_config`], before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(ClientPingConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG))
        .merge(Toml::file(user_config_path()))
        .merge(Toml::file(LOCAL_CONFIG))
        .merge(env_provider())
}

/// Maps `CLIENTPING_WHATSAPP_APP_SECRET` to `whatsapp.app_secret`.
///
/// Only the first underscore after a known section name becomes a dot, so
/// keys that contain underscores keep them.
fn env_provider() -> Env {
    Env::prefixed("CLIENTPING_").map(|key| map_env_key(key.as_str()).into())
}

fn map_env_key(key: &str) -> String {
    for section in SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}
