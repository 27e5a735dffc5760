// SPDX-FileCopyrightText: 2026 ClientPing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Routes outbound replies to the sender registered for their channel.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::error::ClientPingError;
use crate::traits::ChannelSender;
use crate::types::{Channel, ChatRef};

/// Dispatches `send` calls by [`Channel`].
#[derive(Clone, Default)]
pub struct OutboundRouter {
    senders: HashMap<Channel, Arc<dyn ChannelSender>>,
}

impl OutboundRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a sender, replacing any previous one for the same channel.
    pub fn register(&mut self, sender: Arc<dyn ChannelSender>) {
        self.senders.insert(sender.channel(), sender);
    }

    /// Builder-style [`OutboundRouter::register`].
    pub fn with_sender(mut self, sender: Arc<dyn ChannelSender>) -> Self {
        self.register(sender);
        self
    }

    pub fn has_channel(&self, channel: Channel) -> bool {
        self.senders.contains_key(&channel)
    }

    /// Sends `text` to `chat`.
    pub async fn send(&self, chat: &ChatRef, text: &str) -> Result<(), ClientPingError> {
        let sender = self.senders.get(&chat.channel).ok_or_else(|| {
            ClientPingError::channel(format!("no sender configured for channel {}", chat.channel))
        })?;
        sender.send_text(&chat.chat_id, text).await
    }
}

impl std::fmt::Debug for OutboundRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut channels: Vec<_> = self.senders.keys().map(|c| c.to_string()).collect();
        channels.sort();
        f.debug_struct("OutboundRouter")
            .field("channels", &channels)
            .finish()
    }
}

/// Sender for the `api` channel: replies are logged and dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSender;

#[async_trait]
impl ChannelSender for LogSender {
    fn channel(&self) -> Channel {
        Channel::Api
    }

    async fn send_text(&self, chat_id: &str, text: &str) -> Result<(), ClientPingError> {
        info!(chat_id, chars = text.chars().count(), "api reply (not delivered)");
        Ok(())
    }
}
