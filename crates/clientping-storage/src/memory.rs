// SPDX-FileCopyrightText: 2026 ClientPing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process-local state store on concurrent maps. Nothing survives a restart.

use async_trait::async_trait;
use dashmap::DashMap;

use clientping_core::{
    AutomationFlow, ClientPingError, Contact, ContactSegment, ContactStore, ContextStore,
    FlowStore, HealthStatus, SegmentStore, StoreAdapter, UserContext,
};

#[derive(Debug, Default)]
pub struct MemoryStore {
    contexts: DashMap<String, UserContext>,
    flows: DashMap<String, AutomationFlow>,
    contacts: DashMap<String, Contact>,
    segments: DashMap<String, ContactSegment>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Clones every value, ordered by key to match the SQLite store.
fn sorted_values<V: Clone>(map: &DashMap<String, V>) -> Vec<V> {
    let mut entries: Vec<(String, V)> = map
        .iter()
        .map(|e| (e.key().clone(), e.value().clone()))
        .collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    entries.into_iter().map(|(_, v)| v).collect()
}

#[async_trait]
impl StoreAdapter for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn health_check(&self) -> Result<HealthStatus, ClientPingError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl ContextStore for MemoryStore {
    async fn get_context(&self, chat_id: &str) -> Result<Option<UserContext>, ClientPingError> {
        Ok(self.contexts.get(chat_id).map(|c| c.clone()))
    }

    async fn put_context(&self, context: &UserContext) -> Result<(), ClientPingError> {
        self.contexts
            .insert(context.chat_id.clone(), context.clone());
        Ok(())
    }

    async fn delete_context(&self, chat_id: &str) -> Result<bool, ClientPingError> {
        Ok(self.contexts.remove(chat_id).is_some())
    }

    async fn list_contexts(&self) -> Result<Vec<UserContext>, ClientPingError> {
        Ok(sorted_values(&self.contexts))
    }
}

#[async_trait]
impl FlowStore for MemoryStore {
    async fn get_flow(&self, id: &str) -> Result<Option<AutomationFlow>, ClientPingError> {
        Ok(self.flows.get(id).map(|f| f.clone()))
    }

    async fn put_flow(&self, flow: &AutomationFlow) -> Result<(), ClientPingError> {
        self.flows.insert(flow.id.clone(), flow.clone());
        Ok(())
    }

    async fn delete_flow(&self, id: &str) -> Result<bool, ClientPingError> {
        Ok(self.flows.remove(id).is_some())
    }

    async fn list_flows(&self) -> Result<Vec<AutomationFlow>, ClientPingError> {
        Ok(sorted_values(&self.flows))
    }
}

#[async_trait]
impl ContactStore for MemoryStore {
    async fn get_contact(&self, chat_id: &str) -> Result<Option<Contact>, ClientPingError> {
        Ok(self.contacts.get(chat_id).map(|c| c.clone()))
    }

    async fn put_contact(&self, contact: &Contact) -> Result<(), ClientPingError> {
        self.contacts
            .insert(contact.chat_id.clone(), contact.clone());
        Ok(())
    }

    async fn delete_contact(&self, chat_id: &str) -> Result<bool, ClientPingError> {
        Ok(self.contacts.remove(chat_id).is_some())
    }

    async fn list_contacts(&self) -> Result<Vec<Contact>, ClientPingError> {
        Ok(sorted_values(&self.contacts))
    }
}

#[async_trait]
impl SegmentStore for MemoryStore {
    async fn get_segment(&self, id: &str) -> Result<Option<ContactSegment>, ClientPingError> {
        Ok(self.segments.get(id).map(|s| s.clone()))
    }

    async fn put_segment(&self, segment: &ContactSegment) -> Result<(), ClientPingError> {
        self.segments.insert(segment.id.clone(), segment.clone());
        Ok(())
    }

    async fn delete_segment(&self, id: &str) -> Result<bool, ClientPingError> {
        Ok(self.segments.remove(id).is_some())
    }

    async fn list_segments(&self) -> Result<Vec<ContactSegment>, ClientPingError> {
        Ok(sorted_values(&self.segments))
    }
}
