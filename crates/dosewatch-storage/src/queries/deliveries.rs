// SPDX-FileCopyrightText: 2026 Dosewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Append-only delivery log operations.
//!
//! The log is the dedup authority for "exactly one notification per
//! occurrence": a partial unique index allows at most one `delivered` row
//! per (medication, date, slot). Rows are never updated or deleted here;
//! housekeeping truncation is an external concern.

use chrono::NaiveDate;
use dosewatch_core::DosewatchError;
use rusqlite::params;

use crate::database::Database;
use crate::models::{DeliveryOutcome, DeliveryRecord, DoseTime, DueDose, EntryId};
use crate::queries::medications::parse_slot;

/// True when a successful delivery is already recorded for the occurrence.
pub async fn has_delivery(
    db: &Database,
    id: EntryId,
    date: NaiveDate,
    slot: DoseTime,
) -> Result<bool, DosewatchError> {
    let date_str = date.format("%Y-%m-%d").to_string();
    let slot = slot.to_string();
    db.connection()
        .call(move |conn| {
            let found: i64 = conn.query_row(
                "SELECT EXISTS(
                     SELECT 1 FROM delivery_log
                     WHERE medication_id = ?1 AND occurred_on = ?2 AND slot = ?3
                       AND outcome = 'delivered'
                 )",
                params![id.0, date_str, slot],
                |row| row.get(0),
            )?;
            Ok(found != 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Append a delivery record for one attempt. Returns the 1-based attempt
/// ordinal within the (entry, date, slot) occurrence.
pub async fn record_delivery(
    db: &Database,
    id: EntryId,
    date: NaiveDate,
    slot: DoseTime,
    outcome: DeliveryOutcome,
) -> Result<u32, DosewatchError> {
    let date_str = date.format("%Y-%m-%d").to_string();
    let slot = slot.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let prior: u32 = tx.query_row(
                "SELECT COUNT(*) FROM delivery_log
                 WHERE medication_id = ?1 AND occurred_on = ?2 AND slot = ?3",
                params![id.0, date_str, slot],
                |row| row.get(0),
            )?;
            let attempt = prior + 1;
            tx.execute(
                "INSERT INTO delivery_log (medication_id, occurred_on, slot, outcome, attempt)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id.0, date_str, slot, outcome.to_string(), attempt],
            )?;
            tx.commit()?;
            Ok(attempt)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Occurrences on `date` whose recorded attempts are all transient failures
/// and still under `max_attempts`, eligible for same-day retry. Cancelled
/// entries are excluded; deleted entries drop out via the join.
pub async fn list_retryable(
    db: &Database,
    user_id: &str,
    date: NaiveDate,
    max_attempts: u32,
) -> Result<Vec<DueDose>, DosewatchError> {
    let user_id = user_id.to_string();
    let date_str = date.format("%Y-%m-%d").to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT m.id, m.user_id, m.name, m.dosage, d.slot, COUNT(*) AS attempts
                 FROM delivery_log d
                 JOIN medications m ON m.id = d.medication_id
                 WHERE m.user_id = ?1 AND d.occurred_on = ?2 AND m.status <> 'cancelled'
                 GROUP BY d.medication_id, d.slot
                 HAVING SUM(CASE WHEN d.outcome <> 'transient_failure' THEN 1 ELSE 0 END) = 0
                    AND COUNT(*) < ?3
                 ORDER BY m.name, d.slot",
            )?;
            let rows = stmt.query_map(params![user_id, date_str, max_attempts], |row| {
                let slot: String = row.get(4)?;
                Ok(DueDose {
                    entry_id: EntryId(row.get(0)?),
                    user_id: row.get(1)?,
                    name: row.get(2)?,
                    dosage: row.get(3)?,
                    slot: parse_slot(4, &slot)?,
                    occurred_on: date,
                    prior_attempts: row.get(5)?,
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// All delivery records for a calendar date, newest first.
pub async fn list_deliveries_on(
    db: &Database,
    date: NaiveDate,
) -> Result<Vec<DeliveryRecord>, DosewatchError> {
    let date_str = date.format("%Y-%m-%d").to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, medication_id, slot, outcome, attempt, attempted_at
                 FROM delivery_log
                 WHERE occurred_on = ?1
                 ORDER BY attempted_at DESC, id DESC",
            )?;
            let rows = stmt.query_map(params![date_str], |row| {
                let slot: String = row.get(2)?;
                let outcome: String = row.get(3)?;
                Ok(DeliveryRecord {
                    id: row.get(0)?,
                    entry_id: EntryId(row.get(1)?),
                    occurred_on: date,
                    slot: parse_slot(2, &slot)?,
                    outcome: outcome.parse().map_err(|e: strum::ParseError| {
                        rusqlite::Error::FromSqlConversionFailure(
                            3,
                            rusqlite::types::Type::Text,
                            Box::new(e),
                        )
                    })?,
                    attempt: row.get(4)?,
                    attempted_at: row.get(5)?,
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}
