// SPDX-FileCopyrightText: 2026 ClientPing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests against a real listening gateway.
//!
//! Each test binds an ephemeral port, serves a TestHarness stack through the
//! gateway, and talks to it over HTTP with reqwest.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use clientping_core::ClientPingError;
use clientping_gateway::{AuthConfig, GatewayState, WebhookConfig};
use clientping_test_utils::TestHarness;

const TOKEN: &str = "e2e-token";

struct Running {
    addr: SocketAddr,
    cancel: CancellationToken,
    server: JoinHandle<Result<(), ClientPingError>>,
}

impl Running {
    fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    async fn stop(self) {
        self.cancel.cancel();
        self.server.await.unwrap().unwrap();
    }
}

async fn start(harness: &TestHarness) -> Running {
    let state = GatewayState::new(Arc::clone(&harness.pipeline), Arc::clone(&harness.store))
        .with_auth(AuthConfig {
            bearer_token: Some(TOKEN.into()),
        })
        .with_webhooks(WebhookConfig {
            telegram_enabled: true,
            ..WebhookConfig::default()
        });

    let listener = clientping_gateway::bind("127.0.0.1", 0).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let cancel = CancellationToken::new();
    let server = tokio::spawn(clientping_gateway::serve(listener, state, cancel.clone()));
    Running {
        addr,
        cancel,
        server,
    }
}

#[tokio::test]
async fn api_round_trip_over_http() {
    let harness = TestHarness::builder()
        .with_welcome_message("Hi {{first_name}}!")
        .build()
        .await
        .unwrap();
    let running = start(&harness).await;
    let client = reqwest::Client::new();

    let health: Value = client
        .get(running.url("/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["data"]["status"], "ok");

    let created = client
        .post(running.url("/v1/flows"))
        .bearer_auth(TOKEN)
        .json(&json!({
            "id": "refunds",
            "name": "Refunds",
            "priority": 3,
            "triggers": [{"type": "keyword", "keywords": ["refund"]}],
            "actions": [
                {"type": "send_message", "text": "Refunds take 5 days, {{first_name}}."},
                {"type": "add_tag", "tag": "refund-request"}
            ]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(created.status(), reqwest::StatusCode::CREATED);

    let send = |text: &'static str| {
        client
            .post(running.url("/v1/messages"))
            .bearer_auth(TOKEN)
            .json(&json!({"chat_id": "web-1", "text": text, "user_name": "Linus Torvalds"}))
            .send()
    };

    let first: Value = send("hello").await.unwrap().json().await.unwrap();
    assert_eq!(first["data"]["automation"]["flow_id"], "default-welcome");

    let second: Value = send("I want a REFUND").await.unwrap().json().await.unwrap();
    assert_eq!(second["data"]["automation"]["flow_id"], "refunds");

    assert_eq!(
        harness.api.texts_for("web-1").await,
        vec!["Hi Linus!", "Refunds take 5 days, Linus."]
    );

    let contact: Value = client
        .get(running.url("/v1/contacts/web-1"))
        .bearer_auth(TOKEN)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(contact["data"]["message_count"], 2);
    assert_eq!(contact["data"]["tags"], json!(["refund-request"]));

    running.stop().await;
}

#[tokio::test]
async fn shutdown_drains_in_flight_webhook_messages() {
    let harness = TestHarness::builder()
        .with_default_welcome(false)
        .build()
        .await
        .unwrap();
    harness
        .engine
        .add_flow(
            serde_json::from_value(json!({
                "id": "slow",
                "name": "Slow greeting",
                "triggers": [{"type": "welcome"}],
                "actions": [{"type": "send_message", "text": "sorry for the wait", "delay_ms": 300}]
            }))
            .unwrap(),
        )
        .await
        .unwrap();
    let running = start(&harness).await;

    let response = reqwest::Client::new()
        .post(running.url("/webhooks/telegram"))
        .json(&json!({
            "update_id": 5,
            "message": {
                "message_id": 1,
                "date": 1700000000i64,
                "chat": {"id": 77i64, "type": "private", "first_name": "Ada"},
                "from": {"id": 77u64, "is_bot": false, "first_name": "Ada"},
                "text": "anyone there?"
            }
        }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    // The webhook answered before the delayed reply went out.
    assert_eq!(harness.telegram.sent_count().await, 0);

    running.stop().await;
    assert_eq!(
        harness.telegram.texts_for("77").await,
        vec!["sorry for the wait"]
    );
}

#[tokio::test]
async fn unauthenticated_api_calls_are_rejected() {
    let harness = TestHarness::builder().build().await.unwrap();
    let running = start(&harness).await;

    let response = reqwest::Client::new()
        .get(running.url("/v1/stats"))
        .timeout(Duration::from_secs(5))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);

    running.stop().await;
}
