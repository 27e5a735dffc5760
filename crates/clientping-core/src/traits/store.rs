// SPDX-FileCopyrightText: 2026 ClientPing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage traits for conversation contexts, flows, contacts, and segments.
//!
//! Every entity is keyed by a string id. `put_*` is an upsert; `delete_*`
//! reports whether something was removed.

use async_trait::async_trait;

use crate::contact::{Contact, ContactSegment};
use crate::context::UserContext;
use crate::error::ClientPingError;
use crate::flow::AutomationFlow;
use crate::types::HealthStatus;

/// Identity and health of a storage backend.
#[async_trait]
pub trait StoreAdapter: Send + Sync + 'static {
    /// Backend name, e.g. "memory" or "sqlite".
    fn name(&self) -> &str;

    async fn health_check(&self) -> Result<HealthStatus, ClientPingError>;

    /// Flushes anything buffered before the process exits.
    async fn shutdown(&self) -> Result<(), ClientPingError> {
        Ok(())
    }
}

#[async_trait]
pub trait ContextStore: StoreAdapter {
    async fn get_context(&self, chat_id: &str) -> Result<Option<UserContext>, ClientPingError>;
    async fn put_context(&self, context: &UserContext) -> Result<(), ClientPingError>;
    async fn delete_context(&self, chat_id: &str) -> Result<bool, ClientPingError>;
    async fn list_contexts(&self) -> Result<Vec<UserContext>, ClientPingError>;
}

#[async_trait]
pub trait FlowStore: StoreAdapter {
    async fn get_flow(&self, id: &str) -> Result<Option<AutomationFlow>, ClientPingError>;
    async fn put_flow(&self, flow: &AutomationFlow) -> Result<(), ClientPingError>;
    async fn delete_flow(&self, id: &str) -> Result<bool, ClientPingError>;
    async fn list_flows(&self) -> Result<Vec<AutomationFlow>, ClientPingError>;
}

#[async_trait]
pub trait ContactStore: StoreAdapter {
    async fn get_contact(&self, chat_id: &str) -> Result<Option<Contact>, ClientPingError>;
    async fn put_contact(&self, contact: &Contact) -> Result<(), ClientPingError>;
    async fn delete_contact(&self, chat_id: &str) -> Result<bool, ClientPingError>;
    async fn list_contacts(&self) -> Result<Vec<Contact>, ClientPingError>;
}

#[async_trait]
pub trait SegmentStore: StoreAdapter {
    async fn get_segment(&self, id: &str) -> Result<Option<ContactSegment>, ClientPingError>;
    async fn put_segment(&self, segment: &ContactSegment) -> Result<(), ClientPingError>;
    async fn delete_segment(&self, id: &str) -> Result<bool, ClientPingError>;
    async fn list_segments(&self) -> Result<Vec<ContactSegment>, ClientPingError>;
}

/// Everything the service persists. Implemented automatically for any type
/// that implements the four entity stores.
pub trait StateStore: ContextStore + FlowStore + ContactStore + SegmentStore {}

impl<T> StateStore for T where T: ContextStore + FlowStore + ContactStore + SegmentStore {}
