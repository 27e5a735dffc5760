// SPDX-FileCopyrightText: 2026 ClientPing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `clientping flows import <file>`: load flow definitions into the store.

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use clientping_automation::{AutomationEngine, EngineSettings};
use clientping_config::ClientPingConfig;
use clientping_core::{ClientPingError, NewFlow, OutboundRouter, StateStore, StoreAdapter};

/// Parses a JSON array of flows.
pub fn parse_flows(content: &str) -> Result<Vec<NewFlow>, ClientPingError> {
    serde_json::from_str(content)
        .map_err(|e| ClientPingError::Validation(format!("invalid flows file: {e}")))
}

/// Upserts every flow in `path`; existing flows keep their counters.
pub async fn import_flows(
    config: &ClientPingConfig,
    path: &Path,
) -> Result<usize, ClientPingError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        ClientPingError::Validation(format!("cannot read {}: {e}", path.display()))
    })?;
    let flows = parse_flows(&content)?;

    let store = clientping_storage::open_store(&config.storage).await?;
    let imported = import_into(config, Arc::clone(&store), flows).await;
    store.shutdown().await?;
    imported
}

pub async fn import_into(
    config: &ClientPingConfig,
    store: Arc<dyn StateStore>,
    flows: Vec<NewFlow>,
) -> Result<usize, ClientPingError> {
    // Importing never sends anything, so no channels are needed.
    let engine = AutomationEngine::new(
        store,
        Arc::new(OutboundRouter::new()),
        EngineSettings::from(&config.automation),
    )
    .await?;

    let mut imported = 0;
    for flow in flows {
        let flow = engine.upsert_flow(flow).await?;
        info!(flow_id = %flow.id, name = %flow.name, "flow imported");
        imported += 1;
    }
    Ok(imported)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clientping_storage::MemoryStore;

    const FLOWS: &str = r#"[
        {
            "id": "pricing",
            "name": "Pricing",
            "priority": 10,
            "triggers": [{"type": "keyword", "keywords": ["price", "cost"]}],
            "actions": [{"type": "send_message", "text": "Plans start at $9."}]
        },
        {
            "id": "hours",
            "name": "Opening hours",
            "triggers": [{"type": "keyword", "keywords": ["open"]}],
            "actions": [
                {"type": "send_message", "text": "We're open 9-5."},
                {"type": "add_tag", "tag": "asked-hours", "delay_ms": 100}
            ]
        }
    ]"#;

    #[test]
    fn parses_flow_array() {
        let flows = parse_flows(FLOWS).unwrap();
        assert_eq!(flows.len(), 2);
        assert_eq!(flows[0].priority, 10);
        assert_eq!(flows[1].actions[1].delay_ms, Some(100));
    }

    #[test]
    fn rejects_unknown_fields() {
        let err = parse_flows(r#"[{"name": "x", "trigers": [], "actions": []}]"#).unwrap_err();
        assert!(matches!(err, ClientPingError::Validation(_)));
    }

    #[tokio::test]
    async fn import_is_idempotent() {
        let config = ClientPingConfig::default();
        let store: Arc<dyn StateStore> = Arc::new(MemoryStore::new());

        let n = import_into(&config, Arc::clone(&store), parse_flows(FLOWS).unwrap())
            .await
            .unwrap();
        assert_eq!(n, 2);
        import_into(&config, Arc::clone(&store), parse_flows(FLOWS).unwrap())
            .await
            .unwrap();

        use clientping_core::FlowStore;
        // Two imported flows plus the built-in welcome flow.
        assert_eq!(store.list_flows().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn import_from_file_persists_in_sqlite() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("flows.json");
        std::fs::write(&file, FLOWS).unwrap();

        let mut config = ClientPingConfig::default();
        config.storage.backend = clientping_config::StorageBackend::Sqlite;
        config.storage.database_path = dir.path().join("import.db").display().to_string();

        assert_eq!(import_flows(&config, &file).await.unwrap(), 2);

        use clientping_core::FlowStore;
        let reopened = clientping_storage::open_store(&config.storage).await.unwrap();
        assert_eq!(reopened.list_flows().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn missing_file_is_a_validation_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = import_flows(&ClientPingConfig::default(), &dir.path().join("nope.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientPingError::Validation(_)));
    }

    #[tokio::test]
    async fn invalid_flow_aborts_import() {
        let config = ClientPingConfig::default();
        let store: Arc<dyn StateStore> = Arc::new(MemoryStore::new());
        let flows = parse_flows(r#"[{"name": "empty", "triggers": [{"type": "welcome"}], "actions": []}]"#)
            .unwrap();
        let err = import_into(&config, store, flows).await.unwrap_err();
        assert!(matches!(err, ClientPingError::Validation(_)));
    }
}
