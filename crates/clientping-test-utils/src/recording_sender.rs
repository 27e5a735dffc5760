// SPDX-FileCopyrightText: 2026 ClientPing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel sender that records outbound messages instead of delivering them.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use clientping_core::{Channel, ChannelSender, ClientPingError};

/// One captured outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub chat_id: String,
    pub text: String,
}

/// Captures every `send_text` call for assertions.
///
/// Failures can be injected: any message whose text contains a configured
/// marker is rejected with a channel error and not recorded.
#[derive(Clone)]
pub struct RecordingSender {
    channel: Channel,
    sent: Arc<Mutex<Vec<SentMessage>>>,
    fail_marker: Arc<Mutex<Option<String>>>,
}

impl RecordingSender {
    pub fn new(channel: Channel) -> Self {
        Self {
            channel,
            sent: Arc::new(Mutex::new(Vec::new())),
            fail_marker: Arc::new(Mutex::new(None)),
        }
    }

    /// Reject messages containing `marker` from now on.
    pub async fn fail_when_contains(&self, marker: impl Into<String>) {
        *self.fail_marker.lock().await = Some(marker.into());
    }

    pub async fn stop_failing(&self) {
        *self.fail_marker.lock().await = None;
    }

    pub async fn sent_messages(&self) -> Vec<SentMessage> {
        self.sent.lock().await.clone()
    }

    /// Texts sent to one chat, oldest first.
    pub async fn texts_for(&self, chat_id: &str) -> Vec<String> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|m| m.chat_id == chat_id)
            .map(|m| m.text.clone())
            .collect()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    pub async fn clear_sent(&self) {
        self.sent.lock().await.clear();
    }
}

#[async_trait]
impl ChannelSender for RecordingSender {
    fn channel(&self) -> Channel {
        self.channel
    }

    async fn send_text(&self, chat_id: &str, text: &str) -> Result<(), ClientPingError> {
        if let Some(marker) = self.fail_marker.lock().await.as_deref()
            && text.contains(marker)
        {
            return Err(ClientPingError::channel(format!(
                "injected failure sending to {chat_id}"
            )));
        }
        self.sent.lock().await.push(SentMessage {
            chat_id: chat_id.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }
}
