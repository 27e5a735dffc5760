// SPDX-FileCopyrightText: 2026 ClientPing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by channels, stores, and the automation engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Messaging channel a chat lives on.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Channel {
    Telegram,
    Whatsapp,
    /// Messages injected through the REST API. Replies are logged, not delivered.
    Api,
}

/// Where to deliver a reply: a chat on a given channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatRef {
    pub channel: Channel,
    pub chat_id: String,
}

impl ChatRef {
    pub fn new(channel: Channel, chat_id: impl Into<String>) -> Self {
        Self {
            channel,
            chat_id: chat_id.into(),
        }
    }
}

impl std::fmt::Display for ChatRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.channel, self.chat_id)
    }
}

/// A channel-agnostic inbound text message.
///
/// Produced by the webhook parsers and consumed by the contact manager and
/// the automation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundChat {
    pub channel: Channel,
    pub chat_id: String,
    pub text: String,
    pub user_id: String,
    pub user_name: String,
    pub received_at: DateTime<Utc>,
}

impl InboundChat {
    /// Creates an inbound message stamped with the current time.
    pub fn new(
        channel: Channel,
        chat_id: impl Into<String>,
        text: impl Into<String>,
        user_id: impl Into<String>,
        user_name: impl Into<String>,
    ) -> Self {
        Self {
            channel,
            chat_id: chat_id.into(),
            text: text.into(),
            user_id: user_id.into(),
            user_name: user_name.into(),
            received_at: Utc::now(),
        }
    }

    /// Returns where replies to this message should go.
    pub fn chat_ref(&self) -> ChatRef {
        ChatRef::new(self.channel, self.chat_id.clone())
    }
}

/// Health status reported by stores and channel senders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Fully operational.
    Healthy,
    /// Operational but experiencing issues.
    Degraded(String),
    /// Not operational.
    Unhealthy(String),
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Degraded(reason) => write!(f, "degraded: {reason}"),
            HealthStatus::Unhealthy(reason) => write!(f, "unhealthy: {reason}"),
        }
    }
}

/// Generates a fresh entity identifier.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
