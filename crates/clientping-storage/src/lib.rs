// SPDX-FileCopyrightText: 2026 ClientPing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! State persistence for the ClientPing automation service.
//!
//! Two backends implement the same store traits: [`MemoryStore`] for
//! development and tests, and [`SqliteStore`] (WAL-mode SQLite with embedded
//! migrations, single writer via `tokio-rusqlite`) for anything that must
//! survive a restart.

pub mod database;
mod documents;
pub mod memory;
pub mod migrations;
pub mod sqlite;

use std::sync::Arc;

use clientping_config::model::{StorageBackend, StorageConfig};
use clientping_core::{ClientPingError, StateStore, StoreAdapter};
use tracing::info;

pub use database::Database;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Opens the backend selected by `storage.backend`.
pub async fn open_store(config: &StorageConfig) -> Result<Arc<dyn StateStore>, ClientPingError> {
    let store: Arc<dyn StateStore> = match config.backend {
        StorageBackend::Memory => Arc::new(MemoryStore::new()),
        StorageBackend::Sqlite => Arc::new(SqliteStore::open(config).await?),
    };
    info!(backend = store.name(), "state store opened");
    Ok(store)
}
