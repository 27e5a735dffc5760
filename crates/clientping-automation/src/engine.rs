// SPDX-FileCopyrightText: 2026 ClientPing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The automation engine: routes each inbound message to at most one flow
//! and runs that flow's actions against the chat's conversation context.
//!
//! Messages for the same chat are handled one at a time (per-chat lock);
//! different chats run concurrently. A chat's first message fires the welcome
//! flow and nothing else; later messages are matched against keyword triggers.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use clientping_config::model::AutomationConfig;
use clientping_core::{
    ActionKind, AutomationFlow, ChatRef, ClientPingError, ContextStore, FlowPatch, FlowStats,
    FlowStore, InboundChat, KeyedLocks, NewFlow, OutboundRouter, StateStore, UserContext,
    normalize_tag,
};

use crate::matcher;
use crate::template;
use crate::welcome::{DEFAULT_WELCOME_FLOW_ID, default_welcome_flow};

/// Engine knobs, taken from `[automation]`.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub welcome_message: String,
    pub register_default_welcome: bool,
    pub max_history: usize,
    pub max_action_delay: Duration,
}

impl From<&AutomationConfig> for EngineSettings {
    fn from(config: &AutomationConfig) -> Self {
        Self {
            welcome_message: config.welcome_message.clone(),
            register_default_welcome: config.register_default_welcome,
            max_history: config.max_history,
            max_action_delay: Duration::from_millis(config.max_action_delay_ms),
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from(&AutomationConfig::default())
    }
}

/// What one executed action did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionEffect {
    MessageSent { text: String },
    TagAdded { tag: String },
    TagRemoved { tag: String },
    SegmentSet { segment: String },
    VariableSet { key: String, value: String },
}

/// Result of [`AutomationEngine::process_message`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AutomationOutcome {
    pub chat_id: String,
    /// True when this message created the conversation context.
    pub is_new_contact: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow_name: Option<String>,
    /// Actions that completed, in order.
    pub actions: Vec<ActionEffect>,
    /// Set when an action failed; later actions did not run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AutomationOutcome {
    pub fn fired(&self) -> bool {
        self.flow_id.is_some()
    }

    pub fn failed(&self) -> bool {
        self.error.is_some()
    }
}

pub struct AutomationEngine {
    store: Arc<dyn StateStore>,
    router: Arc<OutboundRouter>,
    settings: EngineSettings,
    chat_locks: KeyedLocks,
    flow_locks: KeyedLocks,
}

impl AutomationEngine {
    /// Builds the engine and, if enabled, registers the default welcome flow.
    pub async fn new(
        store: Arc<dyn StateStore>,
        router: Arc<OutboundRouter>,
        settings: EngineSettings,
    ) -> Result<Self, ClientPingError> {
        let engine = Self {
            store,
            router,
            settings,
            chat_locks: KeyedLocks::new(),
            flow_locks: KeyedLocks::new(),
        };
        if engine.settings.register_default_welcome {
            engine.register_default_welcome().await?;
        }
        Ok(engine)
    }

    /// Inserts the default welcome flow, or refreshes its text if the stored
    /// copy is out of date. Counters and the enabled flag are preserved.
    async fn register_default_welcome(&self) -> Result<(), ClientPingError> {
        let _guard = self.flow_locks.lock(DEFAULT_WELCOME_FLOW_ID).await;
        let fresh = default_welcome_flow(&self.settings.welcome_message, Utc::now());
        match self.store.get_flow(DEFAULT_WELCOME_FLOW_ID).await? {
            Some(mut existing) => {
                if existing.actions != fresh.actions {
                    existing.actions = fresh.actions;
                    existing.updated_at = fresh.updated_at;
                    self.store.put_flow(&existing).await?;
                    debug!("default welcome flow text refreshed");
                }
            }
            None => {
                self.store.put_flow(&fresh).await?;
                debug!("default welcome flow registered");
            }
        }
        Ok(())
    }

    /// Records `inbound` in its chat's context and fires the matching flow.
    ///
    /// A failing action does not make this return `Err`: the flow stops, the
    /// actions before it stay applied, the context is saved, and the outcome
    /// carries the error. `Err` means the store itself failed.
    pub async fn process_message(
        &self,
        inbound: &InboundChat,
    ) -> Result<AutomationOutcome, ClientPingError> {
        let _guard = self.chat_locks.lock(&inbound.chat_id).await;

        let (mut ctx, is_new) = match self.store.get_context(&inbound.chat_id).await? {
            Some(ctx) => (ctx, false),
            None => (UserContext::new(inbound), true),
        };
        ctx.record_message(inbound, self.settings.max_history);

        let mut outcome = AutomationOutcome {
            chat_id: inbound.chat_id.clone(),
            is_new_contact: is_new,
            ..AutomationOutcome::default()
        };

        let flows = self.store.list_flows().await?;
        let selected = if is_new {
            matcher::select_welcome_flow(&flows)
        } else {
            matcher::select_keyword_flow(&flows, &inbound.text)
        };

        if let Some(flow) = selected {
            ctx.last_flow_id = Some(flow.id.clone());
        }
        // Stored before any action runs: a run cut off by the request timeout
        // must not leave the chat looking brand new to its next message.
        self.store.put_context(&ctx).await?;

        match selected {
            Some(flow) => {
                self.fire(flow, &mut ctx, &mut outcome).await?;
                self.store.put_context(&ctx).await?;
            }
            None => debug!(chat_id = %inbound.chat_id, is_new, "no flow matched"),
        }

        Ok(outcome)
    }

    async fn fire(
        &self,
        flow: &AutomationFlow,
        ctx: &mut UserContext,
        outcome: &mut AutomationOutcome,
    ) -> Result<(), ClientPingError> {
        info!(chat_id = %ctx.chat_id, flow_id = %flow.id, flow = %flow.name, "flow fired");
        clientping_prometheus::record_flow_triggered();
        self.bump_stats(&flow.id, |s| s.triggered += 1).await?;

        outcome.flow_id = Some(flow.id.clone());
        outcome.flow_name = Some(flow.name.clone());

        for (index, action) in flow.actions.iter().enumerate() {
            if let Some(ms) = action.delay_ms {
                let delay = Duration::from_millis(ms).min(self.settings.max_action_delay);
                tokio::time::sleep(delay).await;
            }
            match self.execute(&action.kind, ctx).await {
                Ok(effect) => outcome.actions.push(effect),
                Err(e) => {
                    warn!(
                        chat_id = %ctx.chat_id,
                        flow_id = %flow.id,
                        action = action.kind.name(),
                        index,
                        error = %e,
                        "flow action failed, stopping flow"
                    );
                    clientping_prometheus::record_flow_failure();
                    outcome.error = Some(format!(
                        "action {index} ({}) failed: {e}",
                        action.kind.name()
                    ));
                    return Ok(());
                }
            }
        }

        self.bump_stats(&flow.id, |s| s.completed += 1).await
    }

    async fn execute(
        &self,
        action: &ActionKind,
        ctx: &mut UserContext,
    ) -> Result<ActionEffect, ClientPingError> {
        let effect = match action {
            ActionKind::SendMessage { text } => {
                let text = template::render(text, ctx);
                let chat = ChatRef::new(ctx.channel, ctx.chat_id.clone());
                self.router.send(&chat, &text).await?;
                ActionEffect::MessageSent { text }
            }
            ActionKind::AddTag { tag } => {
                let tag = required_tag(tag)?;
                ctx.tags.insert(tag.clone());
                ActionEffect::TagAdded { tag }
            }
            ActionKind::RemoveTag { tag } => {
                let tag = required_tag(tag)?;
                ctx.tags.remove(&tag);
                ActionEffect::TagRemoved { tag }
            }
            ActionKind::SetSegment { segment } => {
                ctx.segment = Some(segment.clone());
                ActionEffect::SegmentSet {
                    segment: segment.clone(),
                }
            }
            ActionKind::SetVariable { key, value } => {
                let value = template::render(value, ctx);
                ctx.variables.insert(key.clone(), value.clone());
                ActionEffect::VariableSet {
                    key: key.clone(),
                    value,
                }
            }
        };
        Ok(effect)
    }

    /// Read-modify-write of a flow's counters under the flow's lock.
    async fn bump_stats<F>(&self, flow_id: &str, update: F) -> Result<(), ClientPingError>
    where
        F: FnOnce(&mut FlowStats) + Send,
    {
        let _guard = self.flow_locks.lock(flow_id).await;
        // The flow may have been deleted while it ran.
        if let Some(mut flow) = self.store.get_flow(flow_id).await? {
            update(&mut flow.stats);
            self.store.put_flow(&flow).await?;
        }
        Ok(())
    }

    // --- Flows ---

    /// Adds a flow. Fails with `Conflict` if the id is taken.
    pub async fn add_flow(&self, new: NewFlow) -> Result<AutomationFlow, ClientPingError> {
        let flow = new.into_flow(Utc::now());
        flow.validate()?;
        let _guard = self.flow_locks.lock(&flow.id).await;
        if self.store.get_flow(&flow.id).await?.is_some() {
            return Err(ClientPingError::Conflict(format!(
                "flow `{}` already exists",
                flow.id
            )));
        }
        self.store.put_flow(&flow).await?;
        info!(flow_id = %flow.id, name = %flow.name, priority = flow.priority, "flow added");
        Ok(flow)
    }

    /// Adds the flow, or replaces the definition of an existing one with the
    /// same id while keeping its counters and creation time.
    pub async fn upsert_flow(&self, new: NewFlow) -> Result<AutomationFlow, ClientPingError> {
        let now = Utc::now();
        let mut flow = new.into_flow(now);
        flow.validate()?;
        let _guard = self.flow_locks.lock(&flow.id).await;
        if let Some(existing) = self.store.get_flow(&flow.id).await? {
            flow.stats = existing.stats;
            flow.created_at = existing.created_at;
        }
        self.store.put_flow(&flow).await?;
        debug!(flow_id = %flow.id, "flow upserted");
        Ok(flow)
    }

    pub async fn get_flow(&self, id: &str) -> Result<AutomationFlow, ClientPingError> {
        self.store
            .get_flow(id)
            .await?
            .ok_or_else(|| ClientPingError::not_found("flow", id))
    }

    pub async fn update_flow(
        &self,
        id: &str,
        patch: FlowPatch,
    ) -> Result<AutomationFlow, ClientPingError> {
        let _guard = self.flow_locks.lock(id).await;
        let mut flow = self.get_flow(id).await?;
        flow.apply_patch(patch, Utc::now());
        flow.validate()?;
        self.store.put_flow(&flow).await?;
        info!(flow_id = id, "flow updated");
        Ok(flow)
    }

    pub async fn delete_flow(&self, id: &str) -> Result<(), ClientPingError> {
        let _guard = self.flow_locks.lock(id).await;
        if !self.store.delete_flow(id).await? {
            return Err(ClientPingError::not_found("flow", id));
        }
        info!(flow_id = id, "flow deleted");
        Ok(())
    }

    /// All flows in firing order.
    pub async fn list_flows(&self) -> Result<Vec<AutomationFlow>, ClientPingError> {
        let mut flows = self.store.list_flows().await?;
        matcher::sort_by_precedence(&mut flows);
        Ok(flows)
    }

    // --- Contexts ---

    pub async fn get_context(&self, chat_id: &str) -> Result<UserContext, ClientPingError> {
        self.store
            .get_context(chat_id)
            .await?
            .ok_or_else(|| ClientPingError::not_found("context", chat_id))
    }

    pub async fn list_contexts(&self) -> Result<Vec<UserContext>, ClientPingError> {
        self.store.list_contexts().await
    }

    /// Forgets a chat's conversation. Its next message counts as a first
    /// contact again and fires the welcome flow.
    pub async fn reset_context(&self, chat_id: &str) -> Result<(), ClientPingError> {
        let _guard = self.chat_locks.lock(chat_id).await;
        if !self.store.delete_context(chat_id).await? {
            return Err(ClientPingError::not_found("context", chat_id));
        }
        info!(chat_id, "context reset");
        Ok(())
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }
}

fn required_tag(tag: &str) -> Result<String, ClientPingError> {
    normalize_tag(tag).ok_or_else(|| ClientPingError::Validation("tag must not be empty".into()))
}
