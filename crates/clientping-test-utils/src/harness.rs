// SPDX-FileCopyrightText: 2026 ClientPing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` wires a store, the contact manager, the automation engine
//! and the message pipeline together with recording senders on every
//! channel, and offers `send_message()` to drive the whole pipeline.

use std::sync::Arc;

use clientping_automation::{
    AutomationEngine, EngineSettings, HandledMessage, MessagePipeline, PipelineSettings,
};
use clientping_config::model::{StorageBackend, StorageConfig};
use clientping_config::ClientPingConfig;
use clientping_contacts::ContactManager;
use clientping_core::{Channel, ClientPingError, InboundChat, NewFlow, OutboundRouter, StateStore};
use clientping_storage::{MemoryStore, SqliteStore};

use crate::recording_sender::RecordingSender;

/// Builder for [`TestHarness`].
pub struct TestHarnessBuilder {
    config: ClientPingConfig,
    flows: Vec<NewFlow>,
    sqlite: bool,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        let mut config = ClientPingConfig::default();
        // Tests never want to wait on real delays.
        config.automation.max_action_delay_ms = 1_000;
        Self {
            config,
            flows: Vec::new(),
            sqlite: false,
        }
    }

    /// Start from a full configuration.
    pub fn with_config(mut self, config: ClientPingConfig) -> Self {
        self.config = config;
        self
    }

    /// Toggle the built-in welcome flow.
    pub fn with_default_welcome(mut self, enabled: bool) -> Self {
        self.config.automation.register_default_welcome = enabled;
        self
    }

    pub fn with_welcome_message(mut self, message: impl Into<String>) -> Self {
        self.config.automation.welcome_message = message.into();
        self
    }

    pub fn with_fallback_message(mut self, message: impl Into<String>) -> Self {
        self.config.automation.fallback_message = message.into();
        self
    }

    /// Flows added before the harness is returned.
    pub fn with_flows(mut self, flows: Vec<NewFlow>) -> Self {
        self.flows = flows;
        self
    }

    /// Use a temp-file SQLite store instead of the in-memory one.
    pub fn with_sqlite(mut self) -> Self {
        self.sqlite = true;
        self
    }

    pub async fn build(self) -> Result<TestHarness, ClientPingError> {
        let temp_dir = tempfile::TempDir::new().map_err(ClientPingError::storage)?;

        let store: Arc<dyn StateStore> = if self.sqlite {
            let storage = StorageConfig {
                backend: StorageBackend::Sqlite,
                database_path: temp_dir.path().join("test.db").display().to_string(),
                wal_mode: true,
            };
            Arc::new(SqliteStore::open(&storage).await?)
        } else {
            Arc::new(MemoryStore::new())
        };

        let telegram = RecordingSender::new(Channel::Telegram);
        let whatsapp = RecordingSender::new(Channel::Whatsapp);
        let api = RecordingSender::new(Channel::Api);
        let router = Arc::new(
            OutboundRouter::new()
                .with_sender(Arc::new(telegram.clone()))
                .with_sender(Arc::new(whatsapp.clone()))
                .with_sender(Arc::new(api.clone())),
        );

        let engine = Arc::new(
            AutomationEngine::new(
                Arc::clone(&store),
                Arc::clone(&router),
                EngineSettings::from(&self.config.automation),
            )
            .await?,
        );
        for flow in self.flows {
            engine.add_flow(flow).await?;
        }

        let contacts = Arc::new(ContactManager::new(Arc::clone(&store)));
        let pipeline = Arc::new(MessagePipeline::new(
            Arc::clone(&engine),
            Arc::clone(&contacts),
            Arc::clone(&router),
            PipelineSettings::from(&self.config),
        ));

        Ok(TestHarness {
            store,
            engine,
            contacts,
            pipeline,
            router,
            telegram,
            whatsapp,
            api,
            config: self.config,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete ClientPing stack with recording senders.
pub struct TestHarness {
    pub store: Arc<dyn StateStore>,
    pub engine: Arc<AutomationEngine>,
    pub contacts: Arc<ContactManager>,
    pub pipeline: Arc<MessagePipeline>,
    pub router: Arc<OutboundRouter>,
    pub telegram: RecordingSender,
    pub whatsapp: RecordingSender,
    pub api: RecordingSender,
    pub config: ClientPingConfig,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Runs a Telegram message from `chat_id` through the pipeline.
    pub async fn send_message(
        &self,
        chat_id: &str,
        text: &str,
    ) -> Result<HandledMessage, ClientPingError> {
        self.send_on(Channel::Telegram, chat_id, text).await
    }

    pub async fn send_on(
        &self,
        channel: Channel,
        chat_id: &str,
        text: &str,
    ) -> Result<HandledMessage, ClientPingError> {
        let inbound = InboundChat::new(channel, chat_id, text, chat_id, format!("User {chat_id}"));
        self.pipeline.handle(&inbound).await
    }

    /// The recording sender for `channel`.
    pub fn sender(&self, channel: Channel) -> &RecordingSender {
        match channel {
            Channel::Telegram => &self.telegram,
            Channel::Whatsapp => &self.whatsapp,
            Channel::Api => &self.api,
        }
    }
}
