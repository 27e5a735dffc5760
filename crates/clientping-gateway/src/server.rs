// SPDX-FileCopyrightText: 2026 ClientPing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post, put},
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use clientping_automation::MessagePipeline;
use clientping_config::ClientPingConfig;
use clientping_core::{ClientPingError, InboundChat, StateStore};

use crate::auth::{AuthConfig, auth_middleware};
use crate::handlers;

/// State for the unauthenticated health and metrics endpoints.
#[derive(Clone)]
pub struct HealthState {
    pub start_time: std::time::Instant,
    /// Renders Prometheus text. `None` turns `/metrics` into a 404.
    pub prometheus_render: Option<Arc<dyn Fn() -> String + Send + Sync>>,
}

impl Default for HealthState {
    fn default() -> Self {
        Self {
            start_time: std::time::Instant::now(),
            prometheus_render: None,
        }
    }
}

/// Which webhooks are live and the secrets that guard them.
#[derive(Clone, Default)]
pub struct WebhookConfig {
    pub telegram_enabled: bool,
    pub telegram_secret: Option<String>,
    pub whatsapp_enabled: bool,
    pub whatsapp_verify_token: Option<String>,
    pub whatsapp_app_secret: Option<String>,
}

impl WebhookConfig {
    /// A channel's webhook is enabled when its credentials are configured.
    pub fn from_config(config: &ClientPingConfig) -> Self {
        Self {
            telegram_enabled: config.telegram.bot_token.is_some(),
            telegram_secret: config.telegram.webhook_secret.clone(),
            whatsapp_enabled: config.whatsapp.access_token.is_some(),
            whatsapp_verify_token: config.whatsapp.verify_token.clone(),
            whatsapp_app_secret: config.whatsapp.app_secret.clone(),
        }
    }
}

impl std::fmt::Debug for WebhookConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let hide = |v: &Option<String>| v.as_ref().map(|_| "[redacted]");
        f.debug_struct("WebhookConfig")
            .field("telegram_enabled", &self.telegram_enabled)
            .field("telegram_secret", &hide(&self.telegram_secret))
            .field("whatsapp_enabled", &self.whatsapp_enabled)
            .field("whatsapp_verify_token", &hide(&self.whatsapp_verify_token))
            .field("whatsapp_app_secret", &hide(&self.whatsapp_app_secret))
            .finish()
    }
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub pipeline: Arc<MessagePipeline>,
    pub store: Arc<dyn StateStore>,
    pub auth: AuthConfig,
    pub webhooks: WebhookConfig,
    pub health: HealthState,
    /// Webhook messages processed after the response was sent.
    pub tasks: TaskTracker,
}

impl GatewayState {
    pub fn new(pipeline: Arc<MessagePipeline>, store: Arc<dyn StateStore>) -> Self {
        Self {
            pipeline,
            store,
            auth: AuthConfig::default(),
            webhooks: WebhookConfig::default(),
            health: HealthState::default(),
            tasks: TaskTracker::new(),
        }
    }

    pub fn with_auth(mut self, auth: AuthConfig) -> Self {
        self.auth = auth;
        self
    }

    pub fn with_webhooks(mut self, webhooks: WebhookConfig) -> Self {
        self.webhooks = webhooks;
        self
    }

    pub fn with_prometheus(mut self, render: Arc<dyn Fn() -> String + Send + Sync>) -> Self {
        self.health.prometheus_render = Some(render);
        self
    }

    /// Runs one webhook delivery through the pipeline in the background so
    /// the provider gets its 200 without waiting for flow delays. Messages of
    /// a delivery are handled in the order the provider sent them.
    pub fn dispatch(&self, batch: Vec<InboundChat>) {
        if batch.is_empty() {
            return;
        }
        let pipeline = Arc::clone(&self.pipeline);
        self.tasks.spawn(async move {
            for inbound in &batch {
                if let Err(e) = pipeline.handle(inbound).await {
                    warn!(
                        channel = %inbound.channel,
                        chat_id = %inbound.chat_id,
                        error = %e,
                        "inbound message failed"
                    );
                }
            }
        });
    }
}

/// Builds the full route table.
pub fn build_router(state: GatewayState) -> Router {
    let auth_state = state.auth.clone();

    // Unauthenticated: health, metrics, and provider webhooks (which carry
    // their own verification).
    let public_routes = Router::new()
        .route("/health", get(handlers::system::health))
        .route("/metrics", get(handlers::system::metrics))
        .route("/webhooks/telegram", post(handlers::webhooks::telegram))
        .route(
            "/webhooks/whatsapp",
            get(handlers::webhooks::whatsapp_verify).post(handlers::webhooks::whatsapp),
        )
        .with_state(state.clone());

    let api_routes = Router::new()
        .route("/v1/messages", post(handlers::messages::inject))
        .route(
            "/v1/flows",
            get(handlers::flows::list).post(handlers::flows::create),
        )
        .route(
            "/v1/flows/{id}",
            get(handlers::flows::get)
                .patch(handlers::flows::update)
                .delete(handlers::flows::delete),
        )
        .route("/v1/contacts", get(handlers::contacts::list))
        .route(
            "/v1/contacts/{chat_id}",
            get(handlers::contacts::get).delete(handlers::contacts::delete),
        )
        .route("/v1/contacts/{chat_id}/tags", post(handlers::contacts::add_tag))
        .route(
            "/v1/contacts/{chat_id}/tags/{tag}",
            axum::routing::delete(handlers::contacts::remove_tag),
        )
        .route(
            "/v1/contacts/{chat_id}/fields/{field}",
            put(handlers::contacts::set_field).delete(handlers::contacts::remove_field),
        )
        .route("/v1/contacts/{chat_id}/block", post(handlers::contacts::block))
        .route(
            "/v1/contacts/{chat_id}/unblock",
            post(handlers::contacts::unblock),
        )
        .route(
            "/v1/segments",
            get(handlers::segments::list).post(handlers::segments::create),
        )
        .route(
            "/v1/segments/{id}",
            get(handlers::segments::get)
                .patch(handlers::segments::update)
                .delete(handlers::segments::delete),
        )
        .route(
            "/v1/segments/{id}/members",
            get(handlers::segments::members),
        )
        .route("/v1/contexts", get(handlers::contexts::list))
        .route(
            "/v1/contexts/{chat_id}",
            get(handlers::contexts::get).delete(handlers::contexts::reset),
        )
        .route("/v1/stats", get(handlers::system::stats))
        .route_layer(axum_middleware::from_fn_with_state(
            auth_state,
            auth_middleware,
        ))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Binds the listener for `host:port`.
pub async fn bind(host: &str, port: u16) -> Result<TcpListener, ClientPingError> {
    let addr = format!("{host}:{port}");
    TcpListener::bind(&addr)
        .await
        .map_err(|e| ClientPingError::Channel {
            message: format!("failed to bind gateway to {addr}"),
            source: Some(Box::new(e)),
        })
}

/// Serves until `shutdown` fires, then waits for in-flight webhook work.
pub async fn serve(
    listener: TcpListener,
    state: GatewayState,
    shutdown: CancellationToken,
) -> Result<(), ClientPingError> {
    let tasks = state.tasks.clone();
    let app = build_router(state);

    if let Ok(addr) = listener.local_addr() {
        info!("gateway listening on {addr}");
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| ClientPingError::Channel {
            message: "gateway server error".into(),
            source: Some(Box::new(e)),
        })?;

    tasks.close();
    if !tasks.is_empty() {
        info!(pending = tasks.len(), "waiting for in-flight messages");
    }
    tasks.wait().await;
    Ok(())
}
