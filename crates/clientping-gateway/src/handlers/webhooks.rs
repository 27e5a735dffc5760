// SPDX-FileCopyrightText: 2026 ClientPing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider webhooks. Verified messages are acknowledged immediately and
//! processed in the background.

use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::{debug, warn};

use clientping_telegram::webhook as telegram_webhook;
use clientping_whatsapp::webhook as whatsapp_webhook;

use crate::response::{self, ApiError, ApiResult};
use crate::server::GatewayState;

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn channel_disabled(channel: &str) -> ApiError {
    ApiError::new(
        StatusCode::NOT_FOUND,
        format!("{channel} channel is not configured"),
    )
}

/// POST /webhooks/telegram
pub async fn telegram(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult {
    if !state.webhooks.telegram_enabled {
        return Err(channel_disabled("telegram"));
    }
    let presented = header(&headers, telegram_webhook::SECRET_TOKEN_HEADER);
    if !telegram_webhook::verify_secret(state.webhooks.telegram_secret.as_deref(), presented) {
        warn!("telegram webhook rejected: bad secret token");
        return Err(ApiError::unauthorized("invalid webhook secret"));
    }

    let accepted = match telegram_webhook::parse_update(&body)? {
        Some(inbound) => {
            debug!(chat_id = %inbound.chat_id, "telegram message accepted");
            state.dispatch(vec![inbound]);
            1
        }
        None => 0,
    };
    Ok(response::ok(json!({ "accepted": accepted })))
}

/// GET /webhooks/whatsapp: Meta's subscription handshake. Echoes the
/// challenge as plain text.
pub async fn whatsapp_verify(
    State(state): State<GatewayState>,
    query: Result<Query<whatsapp_webhook::VerifyQuery>, QueryRejection>,
) -> Response {
    let Ok(Query(query)) = query else {
        return ApiError::bad_request("malformed verification query").into_response();
    };
    match whatsapp_webhook::verify_handshake(&query, state.webhooks.whatsapp_verify_token.as_deref())
    {
        Some(challenge) => (StatusCode::OK, challenge).into_response(),
        None => {
            warn!("whatsapp webhook verification failed");
            ApiError::new(StatusCode::FORBIDDEN, "verification failed").into_response()
        }
    }
}

/// POST /webhooks/whatsapp
pub async fn whatsapp(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult {
    if !state.webhooks.whatsapp_enabled {
        return Err(channel_disabled("whatsapp"));
    }
    if let Some(secret) = state.webhooks.whatsapp_app_secret.as_deref() {
        let signature = header(&headers, whatsapp_webhook::SIGNATURE_HEADER).unwrap_or_default();
        if !whatsapp_webhook::verify_signature(secret, &body, signature) {
            warn!("whatsapp webhook rejected: bad signature");
            return Err(ApiError::unauthorized("invalid payload signature"));
        }
    }

    let chats = whatsapp_webhook::parse_notification(&body)?;
    let accepted = chats.len();
    state.dispatch(chats);
    Ok(response::ok(json!({ "accepted": accepted })))
}
