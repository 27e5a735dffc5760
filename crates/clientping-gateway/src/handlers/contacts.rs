// SPDX-FileCopyrightText: 2026 ClientPing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! /v1/contacts

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use serde_json::json;

use clientping_contacts::ContactFilter;

use crate::response::{self, ApiResult};
use crate::server::GatewayState;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TagBody {
    pub tag: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldBody {
    pub value: String,
}

/// `?tag=…&segment=…&blocked=…`, all optional.
pub async fn list(
    State(state): State<GatewayState>,
    query: Result<Query<ContactFilter>, QueryRejection>,
) -> ApiResult {
    let Query(filter) = query?;
    Ok(response::ok(
        state.pipeline.contacts().list_contacts(&filter).await?,
    ))
}

pub async fn get(State(state): State<GatewayState>, Path(chat_id): Path<String>) -> ApiResult {
    Ok(response::ok(
        state.pipeline.contacts().get_contact(&chat_id).await?,
    ))
}

pub async fn delete(State(state): State<GatewayState>, Path(chat_id): Path<String>) -> ApiResult {
    state.pipeline.contacts().delete_contact(&chat_id).await?;
    Ok(response::ok(json!({ "deleted": chat_id })))
}

pub async fn add_tag(
    State(state): State<GatewayState>,
    Path(chat_id): Path<String>,
    payload: Result<Json<TagBody>, JsonRejection>,
) -> ApiResult {
    let Json(body) = payload?;
    Ok(response::ok(
        state.pipeline.contacts().add_tag(&chat_id, &body.tag).await?,
    ))
}

pub async fn remove_tag(
    State(state): State<GatewayState>,
    Path((chat_id, tag)): Path<(String, String)>,
) -> ApiResult {
    Ok(response::ok(
        state.pipeline.contacts().remove_tag(&chat_id, &tag).await?,
    ))
}

pub async fn set_field(
    State(state): State<GatewayState>,
    Path((chat_id, field)): Path<(String, String)>,
    payload: Result<Json<FieldBody>, JsonRejection>,
) -> ApiResult {
    let Json(body) = payload?;
    Ok(response::ok(
        state
            .pipeline
            .contacts()
            .set_custom_field(&chat_id, &field, &body.value)
            .await?,
    ))
}

pub async fn remove_field(
    State(state): State<GatewayState>,
    Path((chat_id, field)): Path<(String, String)>,
) -> ApiResult {
    Ok(response::ok(
        state
            .pipeline
            .contacts()
            .remove_custom_field(&chat_id, &field)
            .await?,
    ))
}

pub async fn block(State(state): State<GatewayState>, Path(chat_id): Path<String>) -> ApiResult {
    Ok(response::ok(
        state.pipeline.contacts().set_blocked(&chat_id, true).await?,
    ))
}

pub async fn unblock(State(state): State<GatewayState>, Path(chat_id): Path<String>) -> ApiResult {
    Ok(response::ok(
        state.pipeline.contacts().set_blocked(&chat_id, false).await?,
    ))
}
