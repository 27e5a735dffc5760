// SPDX-FileCopyrightText: 2026 ClientPing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound delivery to a messaging provider (Telegram, WhatsApp, etc.).

use async_trait::async_trait;

use crate::error::ClientPingError;
use crate::types::Channel;

/// Sends text replies on one channel.
#[async_trait]
pub trait ChannelSender: Send + Sync + 'static {
    /// The channel this sender delivers to.
    fn channel(&self) -> Channel;

    /// Delivers `text` to `chat_id`. No retries: a provider failure is
    /// returned to the caller as-is.
    async fn send_text(&self, chat_id: &str, text: &str) -> Result<(), ClientPingError>;
}
