// SPDX-FileCopyrightText: 2026 ClientPing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-chat conversation state kept by the automation engine.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Channel, InboundChat};

/// One inbound message in a chat's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub text: String,
    pub at: DateTime<Utc>,
}

/// Conversation state for a single chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserContext {
    pub chat_id: String,
    pub channel: Channel,
    pub user_id: String,
    pub user_name: String,
    /// Bounded history, oldest first.
    #[serde(default)]
    pub message_history: Vec<HistoryEntry>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub segment: Option<String>,
    #[serde(default)]
    pub variables: BTreeMap<String, String>,
    /// Flow that fired most recently for this chat.
    #[serde(default)]
    pub last_flow_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_message_at: DateTime<Utc>,
}

impl UserContext {
    /// Creates an empty context for the sender of `inbound`.
    ///
    /// The message itself is not recorded; call [`UserContext::record_message`].
    pub fn new(inbound: &InboundChat) -> Self {
        Self {
            chat_id: inbound.chat_id.clone(),
            channel: inbound.channel,
            user_id: inbound.user_id.clone(),
            user_name: inbound.user_name.clone(),
            message_history: Vec::new(),
            tags: BTreeSet::new(),
            segment: None,
            variables: BTreeMap::new(),
            last_flow_id: None,
            created_at: inbound.received_at,
            last_message_at: inbound.received_at,
        }
    }

    /// Appends a message, dropping the oldest entries beyond `max_history`.
    pub fn record_message(&mut self, inbound: &InboundChat, max_history: usize) {
        self.message_history.push(HistoryEntry {
            text: inbound.text.clone(),
            at: inbound.received_at,
        });
        if self.message_history.len() > max_history {
            let excess = self.message_history.len() - max_history;
            self.message_history.drain(..excess);
        }
        self.last_message_at = inbound.received_at;
        if !inbound.user_name.is_empty() {
            self.user_name = inbound.user_name.clone();
        }
    }

    /// First word of the user's display name.
    pub fn first_name(&self) -> &str {
        self.user_name.split_whitespace().next().unwrap_or("")
    }
}
