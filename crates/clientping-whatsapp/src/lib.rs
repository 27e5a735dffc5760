// SPDX-FileCopyrightText: 2026 ClientPing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WhatsApp Cloud API channel for ClientPing.
//!
//! Inbound notifications are parsed by [`webhook`]. Replies are sent with a
//! `POST {api_base}/{phone_number_id}/messages` call.

pub mod webhook;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::debug;

use clientping_config::model::WhatsAppConfig;
use clientping_core::{Channel, ChannelSender, ClientPingError};

/// WhatsApp's limit on text body length, in characters.
pub const MAX_MESSAGE_CHARS: usize = 4096;

/// Sends text messages through the Cloud API.
pub struct WhatsAppSender {
    client: Client,
    endpoint: String,
    access_token: String,
}

impl WhatsAppSender {
    /// Requires `whatsapp.access_token` and `whatsapp.phone_number_id`.
    pub fn new(config: &WhatsAppConfig) -> Result<Self, ClientPingError> {
        let access_token = config.access_token.clone().ok_or_else(|| {
            ClientPingError::Config("whatsapp.access_token is required for the WhatsApp channel".into())
        })?;
        let phone_number_id = config.phone_number_id.as_deref().ok_or_else(|| {
            ClientPingError::Config("whatsapp.phone_number_id is required for the WhatsApp channel".into())
        })?;

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| ClientPingError::Channel {
                message: "failed to build WhatsApp HTTP client".into(),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/{}/messages",
                config.api_base.trim_end_matches('/'),
                phone_number_id
            ),
            access_token,
        })
    }
}

#[async_trait]
impl ChannelSender for WhatsAppSender {
    fn channel(&self) -> Channel {
        Channel::Whatsapp
    }

    async fn send_text(&self, chat_id: &str, text: &str) -> Result<(), ClientPingError> {
        let body: String = text.chars().take(MAX_MESSAGE_CHARS).collect();
        let payload = json!({
            "messaging_product": "whatsapp",
            "recipient_type": "individual",
            "to": chat_id,
            "type": "text",
            "text": { "preview_url": false, "body": body },
        });

        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.access_token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ClientPingError::Channel {
                message: format!("WhatsApp send to {chat_id} failed"),
                source: Some(Box::new(e)),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(ClientPingError::channel(format!(
                "WhatsApp API returned {status}: {detail}"
            )));
        }
        debug!(chat_id, "whatsapp reply sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(api_base: &str) -> WhatsAppConfig {
        WhatsAppConfig {
            access_token: Some("EAAG-token".into()),
            phone_number_id: Some("1099".into()),
            verify_token: None,
            app_secret: None,
            api_base: api_base.into(),
        }
    }

    #[test]
    fn credentials_are_required() {
        let mut cfg = config("https://graph.facebook.com/v21.0");
        cfg.phone_number_id = None;
        assert!(WhatsAppSender::new(&cfg).is_err());
        cfg.access_token = None;
        assert!(WhatsAppSender::new(&cfg).is_err());
    }

    #[tokio::test]
    async fn posts_text_message_with_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/1099/messages"))
            .and(header("authorization", "Bearer EAAG-token"))
            .and(body_partial_json(json!({
                "messaging_product": "whatsapp",
                "to": "15551234567",
                "type": "text",
                "text": {"body": "Thanks!"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "messages": [{"id": "wamid.out"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let sender = WhatsAppSender::new(&config(&server.uri())).unwrap();
        sender.send_text("15551234567", "Thanks!").await.unwrap();
    }

    #[tokio::test]
    async fn api_error_is_a_channel_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad token"))
            .mount(&server)
            .await;

        let sender = WhatsAppSender::new(&config(&server.uri())).unwrap();
        let err = sender.send_text("15551234567", "hi").await.unwrap_err();
        assert!(matches!(err, ClientPingError::Channel { .. }));
        assert!(err.to_string().contains("401"));
    }

    #[tokio::test]
    async fn long_text_is_truncated() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let sender = WhatsAppSender::new(&config(&server.uri())).unwrap();
        sender
            .send_text("1555", &"x".repeat(MAX_MESSAGE_CHARS + 100))
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        let sent: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(
            sent["text"]["body"].as_str().unwrap().chars().count(),
            MAX_MESSAGE_CHARS
        );
    }
}
