// SPDX-FileCopyrightText: 2026 Dosewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ingestion of extracted prescription records into the schedule store.
//!
//! The OCR + text-understanding pipeline is an external producer; it hands
//! over a JSON document with a `medicines` array. Everything here validates
//! structural shape and normalizes timings; extraction correctness is not
//! re-checked. Validation happens for the whole batch before any store
//! mutation, so a bad record never half-replaces a schedule.

use serde::{Deserialize, Serialize};
use tracing::info;

use dosewatch_core::types::{EntryId, NewEntry};
use dosewatch_core::{DosewatchError, ScheduleStore};

use crate::normalize::normalize_timing;

/// One record as produced by the external extraction pipeline.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ExtractedMedication {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub dosage: String,
    #[serde(default)]
    pub timing: String,
}

#[derive(Debug, Deserialize)]
struct ExtractionDocument {
    #[serde(default)]
    medicines: Vec<ExtractedMedication>,
}

/// Parse the extractor's JSON output into records.
pub fn parse_extraction(json: &str) -> Result<Vec<ExtractedMedication>, DosewatchError> {
    let document: ExtractionDocument =
        serde_json::from_str(json).map_err(|e| DosewatchError::Ingestion {
            message: format!("malformed extraction payload: {e}"),
        })?;
    Ok(document.medicines)
}

/// Validate and normalize a batch of extracted records.
///
/// Every record must carry a non-blank name, dosage, and timing; the timing
/// is resolved to concrete slots here. The first invalid record fails the
/// whole batch.
pub fn normalize_records(
    records: &[ExtractedMedication],
) -> Result<Vec<NewEntry>, DosewatchError> {
    let mut entries = Vec::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        let name = record.name.trim();
        let dosage = record.dosage.trim();
        let timing = record.timing.trim();
        if name.is_empty() || dosage.is_empty() || timing.is_empty() {
            return Err(DosewatchError::Ingestion {
                message: format!(
                    "record {index} is missing required fields (name/dosage/timing)"
                ),
            });
        }
        let times = normalize_timing(timing)?;
        entries.push(NewEntry {
            name: name.to_string(),
            dosage: dosage.to_string(),
            times,
        });
    }
    Ok(entries)
}

/// Ingest a prescription for a user: validate the whole batch, then replace
/// the user's schedule in one transaction.
///
/// On any validation error the store is untouched.
pub async fn ingest_prescription(
    store: &dyn ScheduleStore,
    user_id: &str,
    records: &[ExtractedMedication],
) -> Result<Vec<EntryId>, DosewatchError> {
    let entries = normalize_records(records)?;
    let ids = store.replace_entries(user_id, &entries).await?;
    info!(user = user_id, count = ids.len(), "prescription ingested");
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dosewatch_test_utils::open_temp_store;

    fn record(name: &str, dosage: &str, timing: &str) -> ExtractedMedication {
        ExtractedMedication {
            name: name.to_string(),
            dosage: dosage.to_string(),
            timing: timing.to_string(),
        }
    }

    #[test]
    fn parse_extraction_reads_medicines_array() {
        let records = parse_extraction(
            r#"{"medicines": [
                {"name": "Paracetamol", "dosage": "500mg", "timing": "15:15"},
                {"name": "Cetirizine", "dosage": "10mg", "timing": "bedtime"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].timing, "bedtime");
    }

    #[test]
    fn parse_extraction_rejects_non_json() {
        let err = parse_extraction("I could not read this prescription").unwrap_err();
        assert!(matches!(err, DosewatchError::Ingestion { .. }));
    }

    #[test]
    fn missing_fields_are_rejected_by_index() {
        let err = normalize_records(&[
            record("Paracetamol", "500mg", "15:15"),
            record("Amoxicillin", "", "15:10"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("record 1"));
    }

    #[test]
    fn timings_resolve_to_sorted_slots() {
        let entries = normalize_records(&[record("Amoxicillin", "250mg", "evening, morning")])
            .unwrap();
        assert_eq!(
            entries[0].times,
            vec!["10:00".parse().unwrap(), "21:00".parse().unwrap()]
        );
    }

    #[tokio::test]
    async fn ingest_replaces_schedule_atomically() {
        let (store, _dir) = open_temp_store().await;
        ingest_prescription(
            store.as_ref(),
            "u1",
            &[record("Old-Med", "1mg", "09:00")],
        )
        .await
        .unwrap();

        let ids = ingest_prescription(
            store.as_ref(),
            "u1",
            &[
                record("Paracetamol", "500mg", "15:15"),
                record("Cetirizine", "10mg", "bedtime"),
            ],
        )
        .await
        .unwrap();
        assert_eq!(ids.len(), 2);

        let entries = store.list_entries("u1").await.unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.name != "Old-Med"));
    }

    #[tokio::test]
    async fn failed_batch_leaves_store_untouched() {
        let (store, _dir) = open_temp_store().await;
        ingest_prescription(
            store.as_ref(),
            "u1",
            &[record("Keep-Me", "1mg", "09:00")],
        )
        .await
        .unwrap();

        let result = ingest_prescription(
            store.as_ref(),
            "u1",
            &[
                record("Paracetamol", "500mg", "15:15"),
                record("Broken", "10mg", "whenever it rains"),
            ],
        )
        .await;
        assert!(result.is_err());

        let entries = store.list_entries("u1").await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "Keep-Me");
    }
}
