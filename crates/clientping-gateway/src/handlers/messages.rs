// SPDX-FileCopyrightText: 2026 ClientPing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! POST /v1/messages: inject a message on the `api` channel.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use serde::Deserialize;

use clientping_core::{Channel, InboundChat};

use crate::response::{self, ApiError, ApiResult};
use crate::server::GatewayState;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InjectMessage {
    pub chat_id: String,
    pub text: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
}

/// Runs the message through the pipeline and returns what happened.
/// Unlike webhooks this waits for the whole flow, delays included.
pub async fn inject(
    State(state): State<GatewayState>,
    payload: Result<Json<InjectMessage>, JsonRejection>,
) -> ApiResult {
    let Json(body) = payload?;
    if body.chat_id.trim().is_empty() {
        return Err(ApiError::bad_request("chat_id must not be empty"));
    }
    if body.text.trim().is_empty() {
        return Err(ApiError::bad_request("text must not be empty"));
    }

    let user_id = body.user_id.unwrap_or_else(|| body.chat_id.clone());
    let inbound = InboundChat::new(
        Channel::Api,
        body.chat_id,
        body.text,
        user_id,
        body.user_name.unwrap_or_default(),
    );
    let handled = state.pipeline.handle(&inbound).await?;
    Ok(response::ok(handled))
}
