// SPDX-FileCopyrightText: 2026 ClientPing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram channel for ClientPing.
//!
//! Inbound traffic arrives on the gateway's webhook route and is parsed by
//! [`webhook`]; replies go out through [`TelegramSender`] via the Bot API.

pub mod webhook;

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::ChatId;
use tracing::debug;

use clientping_config::model::TelegramConfig;
use clientping_core::{Channel, ChannelSender, ClientPingError, HealthStatus};

/// Telegram's hard limit on message text, in characters.
pub const MAX_MESSAGE_CHARS: usize = 4096;

/// Sends replies with `sendMessage`.
pub struct TelegramSender {
    bot: Bot,
}

impl TelegramSender {
    /// Requires `telegram.bot_token`.
    pub fn new(config: &TelegramConfig) -> Result<Self, ClientPingError> {
        let token = config.bot_token.as_deref().ok_or_else(|| {
            ClientPingError::Config("telegram.bot_token is required for the Telegram channel".into())
        })?;
        if token.trim().is_empty() {
            return Err(ClientPingError::Config(
                "telegram.bot_token cannot be empty".into(),
            ));
        }
        Ok(Self {
            bot: Bot::new(token),
        })
    }

    /// Points the bot at a different Bot API server.
    pub fn with_api_url(mut self, url: reqwest::Url) -> Self {
        self.bot = self.bot.set_api_url(url);
        self
    }

    /// Calls `getMe` to confirm the token works.
    pub async fn health_check(&self) -> HealthStatus {
        match self.bot.get_me().await {
            Ok(_) => HealthStatus::Healthy,
            Err(e) => HealthStatus::Unhealthy(format!("Telegram bot unreachable: {e}")),
        }
    }
}

#[async_trait]
impl ChannelSender for TelegramSender {
    fn channel(&self) -> Channel {
        Channel::Telegram
    }

    async fn send_text(&self, chat_id: &str, text: &str) -> Result<(), ClientPingError> {
        let chat = chat_id
            .parse::<i64>()
            .map(ChatId)
            .map_err(|e| ClientPingError::Channel {
                message: format!("invalid Telegram chat id `{chat_id}`"),
                source: Some(Box::new(e)),
            })?;

        let text: String = text.chars().take(MAX_MESSAGE_CHARS).collect();
        self.bot
            .send_message(chat, text)
            .await
            .map_err(|e| ClientPingError::Channel {
                message: format!("Telegram sendMessage to {chat_id} failed"),
                source: Some(Box::new(e)),
            })?;
        debug!(chat_id, "telegram reply sent");
        Ok(())
    }
}
