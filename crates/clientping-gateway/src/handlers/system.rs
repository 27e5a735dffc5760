// SPDX-FileCopyrightText: 2026 ClientPing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! GET /health, GET /metrics, GET /v1/stats.

use axum::Json;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use clientping_contacts::ContactStats;
use clientping_core::{ContextStore, HealthStatus, StoreAdapter};

use crate::response::{self, ApiResponse, ApiResult};
use crate::server::GatewayState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub store: String,
}

/// 200 when the store answers, 503 otherwise.
pub async fn health(State(state): State<GatewayState>) -> Response {
    let store_status = match state.store.health_check().await {
        Ok(status) => status,
        Err(e) => HealthStatus::Unhealthy(e.to_string()),
    };
    let healthy = store_status.is_healthy();
    let body = HealthResponse {
        status: if healthy { "ok" } else { "unhealthy" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.health.start_time.elapsed().as_secs(),
        store: format!("{} ({store_status})", state.store.name()),
    };
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(ApiResponse::ok(body))).into_response()
}

pub async fn metrics(State(state): State<GatewayState>) -> Response {
    match &state.health.prometheus_render {
        Some(render) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            render(),
        )
            .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::failure("metrics are disabled")),
        )
            .into_response(),
    }
}

#[derive(Debug, Default, Serialize)]
pub struct FlowCounters {
    pub total: usize,
    pub enabled: usize,
    pub triggered: u64,
    pub completed: u64,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub contacts: ContactStats,
    pub flows: FlowCounters,
    pub contexts: usize,
}

pub async fn stats(State(state): State<GatewayState>) -> ApiResult {
    let contacts = state.pipeline.contacts().stats().await?;
    let flows = state.pipeline.engine().list_flows().await?;
    let contexts = state.store.list_contexts().await?.len();

    let counters = flows.iter().fold(
        FlowCounters {
            total: flows.len(),
            ..FlowCounters::default()
        },
        |mut acc, flow| {
            if flow.enabled {
                acc.enabled += 1;
            }
            acc.triggered += flow.stats.triggered;
            acc.completed += flow.stats.completed;
            acc
        },
    );

    Ok(response::ok(StatsResponse {
        contacts,
        flows: counters,
        contexts,
    }))
}
