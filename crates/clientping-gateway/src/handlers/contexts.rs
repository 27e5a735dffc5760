// SPDX-FileCopyrightText: 2026 ClientPing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! /v1/contexts

use axum::extract::{Path, State};
use serde_json::json;

use crate::response::{self, ApiResult};
use crate::server::GatewayState;

pub async fn list(State(state): State<GatewayState>) -> ApiResult {
    Ok(response::ok(state.pipeline.engine().list_contexts().await?))
}

pub async fn get(State(state): State<GatewayState>, Path(chat_id): Path<String>) -> ApiResult {
    Ok(response::ok(
        state.pipeline.engine().get_context(&chat_id).await?,
    ))
}

/// Forgets the conversation; the chat's next message counts as a first contact.
pub async fn reset(State(state): State<GatewayState>, Path(chat_id): Path<String>) -> ApiResult {
    state.pipeline.engine().reset_context(&chat_id).await?;
    Ok(response::ok(json!({ "reset": chat_id })))
}
