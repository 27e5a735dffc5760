// SPDX-FileCopyrightText: 2026 ClientPing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `clientping serve`: wires storage, channels, automation and the gateway.

use std::sync::Arc;

use tracing::{info, warn};

use clientping_automation::{AutomationEngine, EngineSettings, MessagePipeline, PipelineSettings};
use clientping_config::ClientPingConfig;
use clientping_contacts::ContactManager;
use clientping_core::{ClientPingError, LogSender, OutboundRouter, StateStore, StoreAdapter};
use clientping_gateway::{AuthConfig, GatewayState, WebhookConfig};
use clientping_prometheus::PrometheusAdapter;
use clientping_telegram::TelegramSender;
use clientping_whatsapp::WhatsAppSender;

use crate::shutdown;

pub async fn run_serve(config: ClientPingConfig) -> Result<(), ClientPingError> {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        backend = ?config.storage.backend,
        "starting clientping serve"
    );

    let store = clientping_storage::open_store(&config.storage).await?;

    let prometheus = if config.metrics.enabled {
        Some(PrometheusAdapter::new()?)
    } else {
        info!("metrics disabled");
        None
    };

    let outbound = build_outbound(&config).await?;
    let pipeline = build_pipeline(&config, Arc::clone(&store), Arc::new(outbound)).await?;

    let mut state = GatewayState::new(pipeline, Arc::clone(&store))
        .with_auth(AuthConfig {
            bearer_token: config.server.api_token.clone(),
        })
        .with_webhooks(WebhookConfig::from_config(&config));
    if let Some(prometheus) = prometheus {
        let handle = prometheus.handle().clone();
        state = state.with_prometheus(Arc::new(move || handle.render()));
    }
    if config.server.api_token.is_none() {
        warn!("server.api_token is not set; the /v1 API will reject every request");
    }

    let cancel = shutdown::install_signal_handler();
    let listener = clientping_gateway::bind(&config.server.host, config.server.port).await?;
    let served = clientping_gateway::serve(listener, state, cancel).await;

    // In-flight webhook work has drained by now; flush the store last.
    if let Err(e) = store.shutdown().await {
        warn!(error = %e, "state store shutdown failed");
    }
    served?;

    info!("clientping serve shutdown complete");
    Ok(())
}

/// Registers a sender per configured channel. The `api` channel always logs.
pub async fn build_outbound(config: &ClientPingConfig) -> Result<OutboundRouter, ClientPingError> {
    let mut router = OutboundRouter::new().with_sender(Arc::new(LogSender));

    if config.telegram.bot_token.is_some() {
        let sender = TelegramSender::new(&config.telegram)?;
        let health = sender.health_check().await;
        if health.is_healthy() {
            info!("telegram channel enabled");
        } else {
            // Keep the channel: the Bot API may just be briefly unreachable.
            warn!(status = %health, "telegram channel enabled but unhealthy");
        }
        router.register(Arc::new(sender));
    }

    if config.whatsapp.access_token.is_some() {
        router.register(Arc::new(WhatsAppSender::new(&config.whatsapp)?));
        info!("whatsapp channel enabled");
    }

    Ok(router)
}

/// Engine, contact manager and pipeline over `store`.
pub async fn build_pipeline(
    config: &ClientPingConfig,
    store: Arc<dyn StateStore>,
    outbound: Arc<OutboundRouter>,
) -> Result<Arc<MessagePipeline>, ClientPingError> {
    let engine = Arc::new(
        AutomationEngine::new(
            Arc::clone(&store),
            Arc::clone(&outbound),
            EngineSettings::from(&config.automation),
        )
        .await?,
    );
    let contacts = Arc::new(ContactManager::new(store));
    Ok(Arc::new(MessagePipeline::new(
        engine,
        contacts,
        outbound,
        PipelineSettings::from(config),
    )))
}
