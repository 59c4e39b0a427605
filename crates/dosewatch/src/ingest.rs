// SPDX-FileCopyrightText: 2026 Dosewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `dosewatch ingest` command: load an extracted prescription from disk.
//!
//! OCR and text understanding run outside this binary; this command takes
//! their JSON output (a `medicines` array) and replaces the user's schedule.

use std::path::Path;
use std::sync::Arc;

use dosewatch_config::model::DosewatchConfig;
use dosewatch_core::{DosewatchError, ScheduleStore};
use dosewatch_ingest::{ingest_prescription, parse_extraction};
use dosewatch_storage::SqliteScheduleStore;

pub async fn run_ingest(
    config: DosewatchConfig,
    user: &str,
    file: &Path,
) -> Result<(), DosewatchError> {
    let json = std::fs::read_to_string(file).map_err(|e| DosewatchError::Ingestion {
        message: format!("cannot read {}: {e}", file.display()),
    })?;
    let records = parse_extraction(&json)?;

    let store = Arc::new(SqliteScheduleStore::new(config.storage.clone()));
    store.initialize().await?;

    let ids = ingest_prescription(store.as_ref(), user, &records).await?;
    println!("ingested {} medication(s) for {user}", ids.len());
    for entry in store.list_entries(user).await? {
        let times: Vec<String> = entry.times.iter().map(|t| t.to_string()).collect();
        println!("  {} {} at {}", entry.name, entry.dosage, times.join(", "));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ingest_command_populates_schedule_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let json_path = dir.path().join("extraction.json");
        std::fs::write(
            &json_path,
            r#"{"medicines": [
                {"name": "Paracetamol", "dosage": "500mg", "timing": "15:15"},
                {"name": "Cetirizine", "dosage": "10mg", "timing": "bedtime"}
            ]}"#,
        )
        .unwrap();

        let mut config = DosewatchConfig::default();
        config.storage.database_path = dir
            .path()
            .join("ingest-cmd.db")
            .to_string_lossy()
            .into_owned();

        run_ingest(config.clone(), "u1", &json_path).await.unwrap();

        let store = SqliteScheduleStore::new(config.storage.clone());
        store.initialize().await.unwrap();
        let entries = store.list_entries("u1").await.unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[tokio::test]
    async fn missing_file_is_an_ingestion_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = DosewatchConfig::default();
        config.storage.database_path = dir
            .path()
            .join("unused.db")
            .to_string_lossy()
            .into_owned();

        let err = run_ingest(config, "u1", Path::new("/nonexistent/extraction.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, DosewatchError::Ingestion { .. }));
    }
}
