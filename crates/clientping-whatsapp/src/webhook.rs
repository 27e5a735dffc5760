// SPDX-FileCopyrightText: 2026 ClientPing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Meta webhook handling: verification handshake, payload signatures, and
//! notification parsing.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use tracing::debug;

use clientping_core::{Channel, ClientPingError, InboundChat, secrets_match};

/// Header carrying `sha256=<hex hmac of the body>`.
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

/// Query parameters of the `GET` verification request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerifyQuery {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

/// Answers Meta's subscription handshake. Returns the challenge to echo when
/// the mode is `subscribe` and the token matches.
pub fn verify_handshake(query: &VerifyQuery, expected_token: Option<&str>) -> Option<String> {
    let expected = expected_token?;
    if query.mode.as_deref() != Some("subscribe") {
        return None;
    }
    let presented = query.verify_token.as_deref()?;
    if !secrets_match(presented, expected) {
        return None;
    }
    query.challenge.clone()
}

/// Checks `X-Hub-Signature-256` against the raw body.
pub fn verify_signature(app_secret: &str, body: &[u8], signature_header: &str) -> bool {
    let Some(hex_sig) = signature_header.strip_prefix("sha256=") else {
        return false;
    };
    let Ok(expected) = hex::decode(hex_sig) else {
        return false;
    };
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(app_secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

#[derive(Debug, Deserialize)]
struct Notification {
    #[serde(default)]
    entry: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    #[serde(default)]
    changes: Vec<Change>,
}

#[derive(Debug, Deserialize)]
struct Change {
    #[serde(default)]
    value: Option<ChangeValue>,
}

#[derive(Debug, Deserialize)]
struct ChangeValue {
    #[serde(default)]
    messages: Vec<WaMessage>,
    #[serde(default)]
    contacts: Vec<WaContact>,
}

#[derive(Debug, Deserialize)]
struct WaMessage {
    #[serde(default)]
    from: String,
    #[serde(default)]
    timestamp: String,
    #[serde(default, rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<WaText>,
}

#[derive(Debug, Deserialize)]
struct WaText {
    #[serde(default)]
    body: String,
}

#[derive(Debug, Deserialize)]
struct WaContact {
    #[serde(default)]
    wa_id: String,
    #[serde(default)]
    profile: Option<WaProfile>,
}

#[derive(Debug, Deserialize)]
struct WaProfile {
    #[serde(default)]
    name: String,
}

/// Extracts every text message from a webhook notification. Status
/// callbacks and media messages yield nothing.
pub fn parse_notification(body: &[u8]) -> Result<Vec<InboundChat>, ClientPingError> {
    let notification: Notification = serde_json::from_slice(body)
        .map_err(|e| ClientPingError::Validation(format!("invalid WhatsApp notification: {e}")))?;

    let mut chats = Vec::new();
    for value in notification
        .entry
        .iter()
        .flat_map(|e| &e.changes)
        .filter_map(|c| c.value.as_ref())
    {
        for msg in &value.messages {
            if msg.kind != "text" {
                debug!(kind = %msg.kind, "ignoring non-text WhatsApp message");
                continue;
            }
            let Some(text) = msg.text.as_ref().map(|t| t.body.as_str()) else {
                continue;
            };
            let from = msg.from.trim();
            if from.is_empty() {
                continue;
            }

            let name = profile_name(&value.contacts, from);
            let mut inbound = InboundChat::new(Channel::Whatsapp, from, text, from, name);
            if let Some(at) = parse_timestamp(&msg.timestamp) {
                inbound.received_at = at;
            }
            chats.push(inbound);
        }
    }
    Ok(chats)
}

/// Name from the contact whose `wa_id` matches, else the first contact.
fn profile_name(contacts: &[WaContact], from: &str) -> String {
    contacts
        .iter()
        .find(|c| c.wa_id == from)
        .or_else(|| contacts.first())
        .and_then(|c| c.profile.as_ref())
        .map(|p| p.name.clone())
        .unwrap_or_default()
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    raw.parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
}
