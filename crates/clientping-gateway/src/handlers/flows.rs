// SPDX-FileCopyrightText: 2026 ClientPing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! /v1/flows

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use serde_json::json;

use clientping_core::{FlowPatch, NewFlow};

use crate::response::{self, ApiResult};
use crate::server::GatewayState;

pub async fn list(State(state): State<GatewayState>) -> ApiResult {
    Ok(response::ok(state.pipeline.engine().list_flows().await?))
}

pub async fn create(
    State(state): State<GatewayState>,
    payload: Result<Json<NewFlow>, JsonRejection>,
) -> ApiResult {
    let Json(new) = payload?;
    let flow = state.pipeline.engine().add_flow(new).await?;
    Ok(response::created(flow))
}

pub async fn get(State(state): State<GatewayState>, Path(id): Path<String>) -> ApiResult {
    Ok(response::ok(state.pipeline.engine().get_flow(&id).await?))
}

pub async fn update(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
    payload: Result<Json<FlowPatch>, JsonRejection>,
) -> ApiResult {
    let Json(patch) = payload?;
    Ok(response::ok(
        state.pipeline.engine().update_flow(&id, patch).await?,
    ))
}

pub async fn delete(State(state): State<GatewayState>, Path(id): Path<String>) -> ApiResult {
    state.pipeline.engine().delete_flow(&id).await?;
    Ok(response::ok(json!({ "deleted": id })))
}
