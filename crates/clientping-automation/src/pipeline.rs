// SPDX-FileCopyrightText: 2026 ClientPing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound message handling shared by every webhook and the `/v1/messages`
//! endpoint: contact book first, then automation, then the contact-side
//! effects of whatever fired.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{info, warn};

use clientping_config::ClientPingConfig;
use clientping_contacts::{ContactChanges, ContactManager};
use clientping_core::{ChatRef, ClientPingError, InboundChat, OutboundRouter};

use crate::engine::{ActionEffect, AutomationEngine, AutomationOutcome};

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Sent to the chat when automation fails.
    pub fallback_message: String,
    /// Upper bound for one engine run, delays included.
    pub request_timeout: Duration,
}

impl From<&ClientPingConfig> for PipelineSettings {
    fn from(config: &ClientPingConfig) -> Self {
        Self {
            fallback_message: config.automation.fallback_message.clone(),
            request_timeout: Duration::from_secs(config.server.request_timeout_secs),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Blocked,
}

/// What happened to one inbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandledMessage {
    pub chat_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<SkipReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub automation: Option<AutomationOutcome>,
    pub fallback_sent: bool,
}

pub struct MessagePipeline {
    engine: Arc<AutomationEngine>,
    contacts: Arc<ContactManager>,
    router: Arc<OutboundRouter>,
    settings: PipelineSettings,
}

impl MessagePipeline {
    pub fn new(
        engine: Arc<AutomationEngine>,
        contacts: Arc<ContactManager>,
        router: Arc<OutboundRouter>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            engine,
            contacts,
            router,
            settings,
        }
    }

    pub fn engine(&self) -> &Arc<AutomationEngine> {
        &self.engine
    }

    pub fn contacts(&self) -> &Arc<ContactManager> {
        &self.contacts
    }

    /// Runs one inbound message through contacts and automation.
    ///
    /// Blocked contacts are counted but never reach the engine. When the
    /// engine errors or a flow stops on a failed action, the fallback message
    /// is sent to the chat.
    pub async fn handle(&self, inbound: &InboundChat) -> Result<HandledMessage, ClientPingError> {
        let started = Instant::now();
        clientping_prometheus::record_message(&inbound.channel.to_string());

        let contact = self.contacts.record_inbound(inbound).await?;
        if contact.is_blocked {
            clientping_prometheus::record_blocked_skip();
            info!(chat_id = %inbound.chat_id, "blocked contact, automation skipped");
            return Ok(HandledMessage {
                chat_id: inbound.chat_id.clone(),
                skipped: Some(SkipReason::Blocked),
                automation: None,
                fallback_sent: false,
            });
        }

        let run = tokio::time::timeout(
            self.settings.request_timeout,
            self.engine.process_message(inbound),
        )
        .await
        .unwrap_or_else(|_| {
            Err(ClientPingError::Timeout {
                duration: self.settings.request_timeout,
            })
        });

        let outcome = match run {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(chat_id = %inbound.chat_id, error = %e, "automation failed");
                self.send_fallback(&inbound.chat_ref()).await;
                return Err(e);
            }
        };

        let changes = contact_changes(&outcome.actions);
        if !changes.is_empty() {
            self.contacts
                .apply_changes(&inbound.chat_id, &changes)
                .await?;
        }

        let fallback_sent = if outcome.failed() {
            self.send_fallback(&inbound.chat_ref()).await
        } else {
            false
        };

        clientping_prometheus::record_latency(started.elapsed().as_secs_f64());
        Ok(HandledMessage {
            chat_id: inbound.chat_id.clone(),
            skipped: None,
            automation: Some(outcome),
            fallback_sent,
        })
    }

    /// Best effort; returns whether the message went out.
    async fn send_fallback(&self, chat: &ChatRef) -> bool {
        match self.router.send(chat, &self.settings.fallback_message).await {
            Ok(()) => true,
            Err(e) => {
                warn!(chat = %chat, error = %e, "fallback message not delivered");
                false
            }
        }
    }
}

/// Folds executed actions into contact changes; later actions win.
fn contact_changes(effects: &[ActionEffect]) -> ContactChanges {
    let mut changes = ContactChanges::default();
    for effect in effects {
        match effect {
            ActionEffect::TagAdded { tag } => {
                changes.remove_tags.retain(|t| t != tag);
                if !changes.add_tags.contains(tag) {
                    changes.add_tags.push(tag.clone());
                }
            }
            ActionEffect::TagRemoved { tag } => {
                changes.add_tags.retain(|t| t != tag);
                if !changes.remove_tags.contains(tag) {
                    changes.remove_tags.push(tag.clone());
                }
            }
            ActionEffect::VariableSet { key, value } => {
                changes.fields.insert(key.clone(), value.clone());
            }
            ActionEffect::MessageSent { .. } | ActionEffect::SegmentSet { .. } => {}
        }
    }
    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineSettings;
    use clientping_core::{Channel, LogSender, StateStore};
    use clientping_storage::MemoryStore;
    use tracing_test::traced_test;

    #[test]
    fn later_tag_actions_override_earlier_ones() {
        let effects = vec![
            ActionEffect::TagAdded { tag: "lead".into() },
            ActionEffect::TagRemoved { tag: "lead".into() },
            ActionEffect::TagAdded { tag: "vip".into() },
            ActionEffect::VariableSet {
                key: "plan".into(),
                value: "pro".into(),
            },
            ActionEffect::MessageSent { text: "hi".into() },
        ];
        let changes = contact_changes(&effects);
        assert_eq!(changes.add_tags, vec!["vip"]);
        assert_eq!(changes.remove_tags, vec!["lead"]);
        assert_eq!(changes.fields.get("plan").map(String::as_str), Some("pro"));
    }

    #[test]
    fn messages_only_change_nothing() {
        let effects = vec![ActionEffect::MessageSent { text: "hi".into() }];
        assert!(contact_changes(&effects).is_empty());
    }

    #[tokio::test]
    #[traced_test]
    async fn blocked_contact_skips_automation() {
        let store: Arc<dyn StateStore> = Arc::new(MemoryStore::new());
        let router = Arc::new(OutboundRouter::new().with_sender(Arc::new(LogSender)));
        let engine = Arc::new(
            AutomationEngine::new(
                Arc::clone(&store),
                Arc::clone(&router),
                EngineSettings::default(),
            )
            .await
            .unwrap(),
        );
        let contacts = Arc::new(ContactManager::new(store));
        let pipeline = MessagePipeline::new(
            engine,
            Arc::clone(&contacts),
            router,
            PipelineSettings {
                fallback_message: "oops".into(),
                request_timeout: Duration::from_secs(5),
            },
        );

        let first = InboundChat::new(Channel::Api, "b1", "hi", "b1", "Bob");
        assert!(pipeline.handle(&first).await.unwrap().automation.is_some());

        contacts.set_blocked("b1", true).await.unwrap();
        let again = InboundChat::new(Channel::Api, "b1", "hello?", "b1", "Bob");
        let handled = pipeline.handle(&again).await.unwrap();
        assert_eq!(handled.skipped, Some(SkipReason::Blocked));
        assert!(handled.automation.is_none());
        assert!(logs_contain("blocked contact, automation skipped"));

        // Still counted in the contact book.
        assert_eq!(contacts.get_contact("b1").await.unwrap().message_count, 2);
    }
}
