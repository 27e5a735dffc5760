// SPDX-FileCopyrightText: 2026 ClientPing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON document CRUD shared by every table.

use rusqlite::{OptionalExtension, params};
use serde::Serialize;
use serde::de::DeserializeOwned;

use clientping_core::ClientPingError;

use crate::database::{Database, map_tr_err};

/// Document tables created by the migrations.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Table {
    Contexts,
    Flows,
    Contacts,
    Segments,
}

impl Table {
    fn name(self) -> &'static str {
        match self {
            Table::Contexts => "contexts",
            Table::Flows => "flows",
            Table::Contacts => "contacts",
            Table::Segments => "segments",
        }
    }
}

pub(crate) async fn get<T: DeserializeOwned>(
    db: &Database,
    table: Table,
    id: &str,
) -> Result<Option<T>, ClientPingError> {
    let id = id.to_string();
    let sql = format!("SELECT doc FROM {} WHERE id = ?1", table.name());
    let doc: Option<String> = db
        .connection()
        .call(move |conn| -> Result<Option<String>, rusqlite::Error> {
            conn.query_row(&sql, params![id], |row| row.get(0))
                .optional()
        })
        .await
        .map_err(map_tr_err)?;
    doc.map(|d| serde_json::from_str(&d).map_err(ClientPingError::from))
        .transpose()
}

/// Insert or replace the document stored under `id`.
pub(crate) async fn put<T: Serialize>(
    db: &Database,
    table: Table,
    id: &str,
    value: &T,
) -> Result<(), ClientPingError> {
    let id = id.to_string();
    let doc = serde_json::to_string(value)?;
    let sql = format!(
        "INSERT INTO {} (id, doc, updated_at) VALUES (?1, ?2, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
         ON CONFLICT(id) DO UPDATE SET doc = excluded.doc, updated_at = excluded.updated_at",
        table.name()
    );
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(&sql, params![id, doc])?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Returns whether a row was removed.
pub(crate) async fn delete(db: &Database, table: Table, id: &str) -> Result<bool, ClientPingError> {
    let id = id.to_string();
    let sql = format!("DELETE FROM {} WHERE id = ?1", table.name());
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            Ok(conn.execute(&sql, params![id])? > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// All documents in the table, ordered by id.
pub(crate) async fn list<T: DeserializeOwned>(
    db: &Database,
    table: Table,
) -> Result<Vec<T>, ClientPingError> {
    let sql = format!("SELECT doc FROM {} ORDER BY id", table.name());
    let docs = db
        .connection()
        .call(move |conn| -> Result<Vec<String>, rusqlite::Error> {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map([], |row| row.get(0))?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)?;
    docs.iter()
        .map(|d| serde_json::from_str(d).map_err(ClientPingError::from))
        .collect()
}
