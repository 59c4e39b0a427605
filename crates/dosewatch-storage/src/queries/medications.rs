// SPDX-FileCopyrightText: 2026 Dosewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! CRUD and due-occurrence queries for medication entries.

use chrono::NaiveDate;
use dosewatch_core::DosewatchError;
use rusqlite::params;

use crate::database::Database;
use crate::models::{DoseTime, DueDose, EntryId, EntryStatus, MedicationEntry, NewEntry};

/// Replace a user's whole schedule in one transaction (delete-then-reinsert).
///
/// Prescription ingestion always supersedes the previous schedule; partial
/// failure rolls the old schedule back intact.
pub async fn replace_entries(
    db: &Database,
    user_id: &str,
    entries: &[NewEntry],
) -> Result<Vec<EntryId>, DosewatchError> {
    let user_id = user_id.to_string();
    let entries = entries.to_vec();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "DELETE FROM medications WHERE user_id = ?1",
                params![user_id],
            )?;
            let mut ids = Vec::with_capacity(entries.len());
            for entry in &entries {
                ids.push(EntryId(insert_one(&tx, &user_id, entry)?));
            }
            tx.commit()?;
            Ok(ids)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Insert a single entry with status `scheduled`. Returns its id.
pub async fn insert_entry(
    db: &Database,
    user_id: &str,
    entry: &NewEntry,
) -> Result<EntryId, DosewatchError> {
    let user_id = user_id.to_string();
    let entry = entry.clone();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let id = insert_one(&tx, &user_id, &entry)?;
            tx.commit()?;
            Ok(EntryId(id))
        })
        .await
        .map_err(crate::database::map_tr_err)
}

fn insert_one(
    conn: &rusqlite::Connection,
    user_id: &str,
    entry: &NewEntry,
) -> Result<i64, rusqlite::Error> {
    conn.execute(
        "INSERT INTO medications (user_id, name, dosage, status) VALUES (?1, ?2, ?3, ?4)",
        params![
            user_id,
            entry.name,
            entry.dosage,
            EntryStatus::Scheduled.to_string()
        ],
    )?;
    let id = conn.last_insert_rowid();
    for (position, slot) in entry.times.iter().enumerate() {
        conn.execute(
            "INSERT OR IGNORE INTO medication_times (medication_id, slot, position)
             VALUES (?1, ?2, ?3)",
            params![id, slot.to_string(), position as i64],
        )?;
    }
    Ok(id)
}

/// Delete by (user, name, dosage, slot) match, the manual-removal semantics.
/// Returns whether a medication row went away.
pub async fn delete_entry(
    db: &Database,
    user_id: &str,
    name: &str,
    dosage: &str,
    slot: DoseTime,
) -> Result<bool, DosewatchError> {
    let user_id = user_id.to_string();
    let name = name.to_string();
    let dosage = dosage.to_string();
    let slot = slot.to_string();
    db.connection()
        .call(move |conn| {
            let deleted = conn.execute(
                "DELETE FROM medications WHERE id IN (
                     SELECT m.id FROM medications m
                     JOIN medication_times t ON t.medication_id = m.id
                     WHERE m.user_id = ?1 AND m.name = ?2 AND m.dosage = ?3 AND t.slot = ?4
                 )",
                params![user_id, name, dosage, slot],
            )?;
            Ok(deleted > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Update only the lifecycle status of an entry.
pub async fn set_status(
    db: &Database,
    id: EntryId,
    status: EntryStatus,
) -> Result<(), DosewatchError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE medications SET status = ?1 WHERE id = ?2",
                params![status.to_string(), id.0],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List a user's entries with their dose times, ascending by (name, id).
pub async fn list_entries(
    db: &Database,
    user_id: &str,
) -> Result<Vec<MedicationEntry>, DosewatchError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT m.id, m.user_id, m.name, m.dosage, m.status, t.slot
                 FROM medications m
                 LEFT JOIN medication_times t ON t.medication_id = m.id
                 WHERE m.user_id = ?1
                 ORDER BY m.name, m.id, t.position",
            )?;
            let mut rows = stmt.query(params![user_id])?;

            let mut entries: Vec<MedicationEntry> = Vec::new();
            while let Some(row) = rows.next()? {
                let id = EntryId(row.get(0)?);
                let slot: Option<String> = row.get(5)?;
                if entries.last().map(|e| e.id) != Some(id) {
                    entries.push(MedicationEntry {
                        id,
                        user_id: row.get(1)?,
                        name: row.get(2)?,
                        dosage: row.get(3)?,
                        times: Vec::new(),
                        status: parse_status(4, row.get(4)?)?,
                    });
                }
                if let Some(slot) = slot {
                    let entry = entries.last_mut().expect("pushed above");
                    entry.times.push(parse_slot(5, &slot)?);
                }
            }
            Ok(entries)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// True when the entry exists and is not cancelled. The dispatch scheduler
/// calls this immediately before a delivery attempt.
pub async fn entry_deliverable(db: &Database, id: EntryId) -> Result<bool, DosewatchError> {
    db.connection()
        .call(move |conn| {
            let status: Option<String> = conn
                .query_row(
                    "SELECT status FROM medications WHERE id = ?1",
                    params![id.0],
                    |row| row.get(0),
                )
                .map(Some)
                .or_else(|e| match e {
                    rusqlite::Error::QueryReturnedNoRows => Ok(None),
                    other => Err(other),
                })?;
            Ok(match status {
                Some(s) => parse_status(0, s)? != EntryStatus::Cancelled,
                None => false,
            })
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Due occurrences for one user whose slot falls within `[from, to]`
/// (inclusive, zero-padded text comparison), excluding cancelled entries,
/// ascending by (name, slot). `prior_attempts` counts delivery records
/// already logged for the occurrence on `date`.
pub async fn list_due(
    db: &Database,
    user_id: &str,
    date: NaiveDate,
    from: DoseTime,
    to: DoseTime,
) -> Result<Vec<DueDose>, DosewatchError> {
    let user_id = user_id.to_string();
    let date_str = date.format("%Y-%m-%d").to_string();
    let from = from.to_string();
    let to = to.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT m.id, m.user_id, m.name, m.dosage, t.slot,
                        (SELECT COUNT(*) FROM delivery_log d
                          WHERE d.medication_id = m.id
                            AND d.occurred_on = ?4 AND d.slot = t.slot) AS prior_attempts
                 FROM medications m
                 JOIN medication_times t ON t.medication_id = m.id
                 WHERE m.user_id = ?1 AND m.status <> 'cancelled'
                   AND t.slot >= ?2 AND t.slot <= ?3
                 ORDER BY m.name, t.slot",
            )?;
            let rows = stmt.query_map(params![user_id, from, to, date_str], |row| {
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

pub(crate) fn parse_status(idx: usize, s: String) -> Result<EntryStatus, rusqlite::Error> {
    s.parse().map_err(|e: strum::ParseError| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

pub(crate) fn parse_slot(idx: usize, s: &str) -> Result<DoseTime, rusqlite::Error> {
    s.parse().map_err(|e: dosewatch_core::DosewatchError| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("meds.db");
        let db = Database::open(db_path.to_str().unwrap(), true).await.unwrap();
        (db, dir)
    }

    fn entry(name: &str, dosage: &str, slots: &[&str]) -> NewEntry {
        NewEntry {
            name: name.to_string(),
            dosage: dosage.to_string(),
            times: slots.iter().map(|s| s.parse().unwrap()).collect(),
        }
    }

    fn slot(s: &str) -> DoseTime {
        s.parse().unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn insert_and_list_round_trip() {
        let (db, _dir) = setup_db().await;

        let id = insert_entry(&db, "u1", &entry("Paracetamol", "500mg", &["14:45"]))
            .await
            .unwrap();
        assert!(id.0 > 0);

        let entries = list_entries(&db, "u1").await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "Paracetamol");
        assert_eq!(entries[0].dosage, "500mg");
        assert_eq!(entries[0].times, vec![slot("14:45")]);
        assert_eq!(entries[0].status, EntryStatus::Scheduled);
    }

    #[tokio::test]
    async fn replace_supersedes_previous_schedule() {
        let (db, _dir) = setup_db().await;

        insert_entry(&db, "u1", &entry("Old", "1mg", &["09:00"]))
            .await
            .unwrap();
        let ids = replace_entries(
            &db,
            "u1",
            &[
                entry("Amoxicillin", "250mg", &["08:00", "20:00"]),
                entry("Ibuprofen", "400mg", &["13:00"]),
            ],
        )
        .await
        .unwrap();
        assert_eq!(ids.len(), 2);

        let entries = list_entries(&db, "u1").await.unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.name != "Old"));
        // Multi-dose times come back in position order.
        assert_eq!(entries[0].times, vec![slot("08:00"), slot("20:00")]);
    }

    #[tokio::test]
    async fn replace_does_not_touch_other_users() {
        let (db, _dir) = setup_db().await;

        insert_entry(&db, "u1", &entry("Mine", "1mg", &["09:00"]))
            .await
            .unwrap();
        insert_entry(&db, "u2", &entry("Theirs", "2mg", &["10:00"]))
            .await
            .unwrap();
        replace_entries(&db, "u1", &[]).await.unwrap();

        assert!(list_entries(&db, "u1").await.unwrap().is_empty());
        assert_eq!(list_entries(&db, "u2").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_by_triple_removes_entry_and_times() {
        let (db, _dir) = setup_db().await;

        insert_entry(&db, "u1", &entry("Paracetamol", "500mg", &["14:45"]))
            .await
            .unwrap();

        // Wrong dosage: nothing happens.
        let removed = delete_entry(&db, "u1", "Paracetamol", "250mg", slot("14:45"))
            .await
            .unwrap();
        assert!(!removed);

        let removed = delete_entry(&db, "u1", "Paracetamol", "500mg", slot("14:45"))
            .await
            .unwrap();
        assert!(removed);
        assert!(list_entries(&db, "u1").await.unwrap().is_empty());

        // Cascade removed the dose slot rows too.
        let orphans: i64 = db
            .connection()
            .call(|conn| -> Result<i64, rusqlite::Error> {
                conn.query_row("SELECT COUNT(*) FROM medication_times", [], |row| row.get(0))
            })
            .await
            .unwrap();
        assert_eq!(orphans, 0);
    }

    #[tokio::test]
    async fn due_window_matches_inclusive_text_range() {
        let (db, _dir) = setup_db().await;

        insert_entry(&db, "u1", &entry("A-first", "1mg", &["08:00"]))
            .await
            .unwrap();
        insert_entry(&db, "u1", &entry("B-second", "2mg", &["08:01"]))
            .await
            .unwrap();
        insert_entry(&db, "u1", &entry("C-later", "3mg", &["09:30"]))
            .await
            .unwrap();

        let due = list_due(&db, "u1", date("2026-03-01"), slot("08:00"), slot("08:59"))
            .await
            .unwrap();
        assert_eq!(due.len(), 2);
        // Deterministic ascending (name, slot) order.
        assert_eq!(due[0].name, "A-first");
        assert_eq!(due[1].name, "B-second");
        assert_eq!(due[0].prior_attempts, 0);
    }

    #[tokio::test]
    async fn cancelled_entries_are_not_due_and_not_deliverable() {
        let (db, _dir) = setup_db().await;

        let id = insert_entry(&db, "u1", &entry("Warfarin", "5mg", &["18:00"]))
            .await
            .unwrap();
        assert!(entry_deliverable(&db, id).await.unwrap());

        set_status(&db, id, EntryStatus::Cancelled).await.unwrap();
        assert!(!entry_deliverable(&db, id).await.unwrap());

        let due = list_due(&db, "u1", date("2026-03-01"), slot("00:00"), slot("23:59"))
            .await
            .unwrap();
        assert!(due.is_empty());
    }

    #[tokio::test]
    async fn deliverable_is_false_for_missing_entry() {
        let (db, _dir) = setup_db().await;
        assert!(!entry_deliverable(&db, EntryId(9999)).await.unwrap());
    }
}
