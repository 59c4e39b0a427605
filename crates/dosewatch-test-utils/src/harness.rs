// SPDX-FileCopyrightText: 2026 Dosewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared fixtures for tests that need a real schedule store.

use std::sync::Arc;

use dosewatch_config::model::StorageConfig;
use dosewatch_core::types::NewEntry;
use dosewatch_core::ScheduleStore;
use dosewatch_storage::SqliteScheduleStore;
use tempfile::TempDir;

/// Open an initialized store backed by a temp directory.
///
/// The TempDir must be kept alive for the duration of the test.
pub async fn open_temp_store() -> (Arc<SqliteScheduleStore>, TempDir) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let db_path = dir.path().join("dosewatch-test.db");
    let store = SqliteScheduleStore::new(StorageConfig {
        database_path: db_path.to_string_lossy().into_owned(),
        wal_mode: true,
    });
    store.initialize().await.expect("initialize store");
    (Arc::new(store), dir)
}

/// Build a `NewEntry` from HH:MM slot strings.
pub fn entry(name: &str, dosage: &str, slots: &[&str]) -> NewEntry {
    NewEntry {
        name: name.to_string(),
        dosage: dosage.to_string(),
        times: slots.iter().map(|s| s.parse().expect("valid slot")).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn temp_store_is_ready_for_writes() {
        let (store, _dir) = open_temp_store().await;
        let id = store
            .insert_entry("u1", &entry("Paracetamol", "500mg", &["14:45"]))
            .await
            .unwrap();
        assert!(store.entry_deliverable(id).await.unwrap());
    }
}
