// SPDX-FileCopyrightText: 2026 ClientPing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! /v1/segments

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use serde_json::json;

use clientping_core::{NewSegment, SegmentPatch};

use crate::response::{self, ApiResult};
use crate::server::GatewayState;

pub async fn list(State(state): State<GatewayState>) -> ApiResult {
    Ok(response::ok(
        state.pipeline.contacts().list_segments().await?,
    ))
}

pub async fn create(
    State(state): State<GatewayState>,
    payload: Result<Json<NewSegment>, JsonRejection>,
) -> ApiResult {
    let Json(new) = payload?;
    let segment = state.pipeline.contacts().create_segment(new).await?;
    Ok(response::created(segment))
}

pub async fn get(State(state): State<GatewayState>, Path(id): Path<String>) -> ApiResult {
    Ok(response::ok(state.pipeline.contacts().get_segment(&id).await?))
}

pub async fn update(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
    payload: Result<Json<SegmentPatch>, JsonRejection>,
) -> ApiResult {
    let Json(patch) = payload?;
    Ok(response::ok(
        state.pipeline.contacts().update_segment(&id, patch).await?,
    ))
}

pub async fn delete(State(state): State<GatewayState>, Path(id): Path<String>) -> ApiResult {
    state.pipeline.contacts().delete_segment(&id).await?;
    Ok(response::ok(json!({ "deleted": id })))
}

/// Members evaluated against the current time.
pub async fn members(State(state): State<GatewayState>, Path(id): Path<String>) -> ApiResult {
    Ok(response::ok(
        state.pipeline.contacts().segment_members(&id).await?,
    ))
}
