// SPDX-FileCopyrightText: 2026 ClientPing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook update parsing and secret-token verification.
//!
//! Telegram posts one `Update` per request. Only text messages from humans
//! become [`InboundChat`]s; everything else (edits, stickers, joins, bot
//! traffic) is acknowledged and dropped.

use teloxide::types::{Message, Update, UpdateKind};
use tracing::debug;

use clientping_core::{Channel, ClientPingError, InboundChat, secrets_match};

/// Header Telegram sends when the webhook was registered with a secret.
pub const SECRET_TOKEN_HEADER: &str = "x-telegram-bot-api-secret-token";

/// Parses a webhook body. `Ok(None)` means "valid update, nothing to do".
pub fn parse_update(body: &[u8]) -> Result<Option<InboundChat>, ClientPingError> {
    let update: Update = serde_json::from_slice(body)
        .map_err(|e| ClientPingError::Validation(format!("invalid Telegram update: {e}")))?;

    match update.kind {
        UpdateKind::Message(msg) => Ok(to_inbound(&msg)),
        _ => {
            debug!(update_id = update.id.0, "ignoring non-message update");
            Ok(None)
        }
    }
}

/// Converts a text message into an [`InboundChat`].
pub fn to_inbound(msg: &Message) -> Option<InboundChat> {
    let Some(text) = msg.text() else {
        debug!(msg_id = msg.id.0, "ignoring non-text message");
        return None;
    };
    if msg.from.as_ref().is_some_and(|u| u.is_bot) {
        debug!(msg_id = msg.id.0, "ignoring message from a bot");
        return None;
    }

    let (user_id, user_name) = match msg.from.as_ref() {
        Some(user) => (user.id.0.to_string(), user.full_name()),
        None => (msg.chat.id.0.to_string(), String::new()),
    };

    let mut inbound = InboundChat::new(
        Channel::Telegram,
        msg.chat.id.0.to_string(),
        text,
        user_id,
        user_name,
    );
    inbound.received_at = msg.date;
    Some(inbound)
}

/// Checks the secret-token header. With no secret configured every request
/// passes.
pub fn verify_secret(expected: Option<&str>, received: Option<&str>) -> bool {
    match (expected, received) {
        (None, _) => true,
        (Some(_), None) => false,
        (Some(expected), Some(received)) => secrets_match(received, expected),
    }
}
