// SPDX-FileCopyrightText: 2026 ClientPing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the state store traits.

use async_trait::async_trait;
use tracing::debug;

use clientping_config::model::StorageConfig;
use clientping_core::{
    AutomationFlow, ClientPingError, Contact, ContactSegment, ContactStore, ContextStore,
    FlowStore, HealthStatus, SegmentStore, StoreAdapter, UserContext,
};

use crate::database::{Database, map_tr_err};
use crate::documents::{self, Table};

/// SQLite-backed state store.
///
/// Contexts and contacts are keyed by chat id, flows and segments by their
/// own id. Each row holds the entity serialized as JSON.
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    /// Opens the database described by `config`.
    pub async fn open(config: &StorageConfig) -> Result<Self, ClientPingError> {
        let db = Database::open(&config.database_path, config.wal_mode).await?;
        debug!(path = %config.database_path, "SQLite store ready");
        Ok(Self { db })
    }

    /// A throwaway in-memory store.
    pub async fn in_memory() -> Result<Self, ClientPingError> {
        Ok(Self {
            db: Database::open_in_memory().await?,
        })
    }
}

#[async_trait]
impl StoreAdapter for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn health_check(&self) -> Result<HealthStatus, ClientPingError> {
        self.db
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    /// Checkpoints the WAL into the main database file.
    async fn shutdown(&self) -> Result<(), ClientPingError> {
        self.db.checkpoint().await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

#[async_trait]
impl ContextStore for SqliteStore {
    async fn get_context(&self, chat_id: &str) -> Result<Option<UserContext>, ClientPingError> {
        documents::get(&self.db, Table::Contexts, chat_id).await
    }

    async fn put_context(&self, context: &UserContext) -> Result<(), ClientPingError> {
        documents::put(&self.db, Table::Contexts, &context.chat_id, context).await
    }

    async fn delete_context(&self, chat_id: &str) -> Result<bool, ClientPingError> {
        documents::delete(&self.db, Table::Contexts, chat_id).await
    }

    async fn list_contexts(&self) -> Result<Vec<UserContext>, ClientPingError> {
        documents::list(&self.db, Table::Contexts).await
    }
}

#[async_trait]
impl FlowStore for SqliteStore {
    async fn get_flow(&self, id: &str) -> Result<Option<AutomationFlow>, ClientPingError> {
        documents::get(&self.db, Table::Flows, id).await
    }

    async fn put_flow(&self, flow: &AutomationFlow) -> Result<(), ClientPingError> {
        documents::put(&self.db, Table::Flows, &flow.id, flow).await
    }

    async fn delete_flow(&self, id: &str) -> Result<bool, ClientPingError> {
        documents::delete(&self.db, Table::Flows, id).await
    }

    async fn list_flows(&self) -> Result<Vec<AutomationFlow>, ClientPingError> {
        documents::list(&self.db, Table::Flows).await
    }
}

#[async_trait]
impl ContactStore for SqliteStore {
    async fn get_contact(&self, chat_id: &str) -> Result<Option<Contact>, ClientPingError> {
        documents::get(&self.db, Table::Contacts, chat_id).await
    }

    async fn put_contact(&self, contact: &Contact) -> Result<(), ClientPingError> {
        documents::put(&self.db, Table::Contacts, &contact.chat_id, contact).await
    }

    async fn delete_contact(&self, chat_id: &str) -> Result<bool, ClientPingError> {
        documents::delete(&self.db, Table::Contacts, chat_id).await
    }

    async fn list_contacts(&self) -> Result<Vec<Contact>, ClientPingError> {
        documents::list(&self.db, Table::Contacts).await
    }
}

#[async_trait]
impl SegmentStore for SqliteStore {
    async fn get_segment(&self, id: &str) -> Result<Option<ContactSegment>, ClientPingError> {
        documents::get(&self.db, Table::Segments, id).await
    }

    async fn put_segment(&self, segment: &ContactSegment) -> Result<(), ClientPingError> {
        documents::put(&self.db, Table::Segments, &segment.id, segment).await
    }

    async fn delete_segment(&self, id: &str) -> Result<bool, ClientPingError> {
        documents::delete(&self.db, Table::Segments, id).await
    }

    async fn list_segments(&self) -> Result<Vec<ContactSegment>, ClientPingError> {
        documents::list(&self.db, Table::Segments).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clientping_core::{Channel, InboundChat};

    #[tokio::test]
    async fn health_check_is_healthy() {
        let store = SqliteStore::in_memory().await.unwrap();
        assert_eq!(store.name(), "sqlite");
        assert_eq!(store.health_check().await.unwrap(), HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn context_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            backend: clientping_config::StorageBackend::Sqlite,
            database_path: dir.path().join("state.db").display().to_string(),
            wal_mode: true,
        };

        let msg = InboundChat::new(Channel::Telegram, "99", "hello", "99", "Ada");
        let mut ctx = UserContext::new(&msg);
        ctx.record_message(&msg, 10);
        ctx.tags.insert("lead".into());

        {
            let store = SqliteStore::open(&config).await.unwrap();
            store.put_context(&ctx).await.unwrap();
            store.shutdown().await.unwrap();
        }

        let store = SqliteStore::open(&config).await.unwrap();
        let loaded = store.get_context("99").await.unwrap().unwrap();
        assert_eq!(loaded, ctx);
    }

    #[tokio::test]
    async fn shutdown_checkpoints_wal_while_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wal.db");
        let config = StorageConfig {
            backend: clientping_config::StorageBackend::Sqlite,
            database_path: path.display().to_string(),
            wal_mode: true,
        };
        let store = SqliteStore::open(&config).await.unwrap();
        let msg = InboundChat::new(Channel::Telegram, "5", "hello", "5", "Lin");
        store.put_context(&UserContext::new(&msg)).await.unwrap();

        store.shutdown().await.unwrap();

        let wal = dir.path().join("wal.db-wal");
        let wal_len = std::fs::metadata(&wal).map(|m| m.len()).unwrap_or(0);
        assert_eq!(wal_len, 0);
    }

    #[tokio::test]
    async fn put_replaces_existing_document() {
        let store = SqliteStore::in_memory().await.unwrap();
        let msg = InboundChat::new(Channel::Whatsapp, "1555", "hi", "1555", "Grace");
        let mut contact = Contact::from_inbound(&msg);
        store.put_contact(&contact).await.unwrap();

        contact.message_count = 7;
        store.put_contact(&contact).await.unwrap();

        let all = store.list_contacts().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].message_count, 7);
    }

    #[tokio::test]
    async fn delete_reports_whether_row_existed() {
        let store = SqliteStore::in_memory().await.unwrap();
        assert!(!store.delete_flow("missing").await.unwrap());
        assert!(store.get_flow("missing").await.unwrap().is_none());
    }
}
